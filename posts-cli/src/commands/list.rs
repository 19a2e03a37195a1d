//! List the posts of the current partition.

use anyhow::Result;
use postsync_core::Screen;
use std::path::Path;

use crate::commands::{open_provider, render_row};

/// Run the list command.
pub async fn run(data_dir: &Path, partition: Option<&str>, screen: Screen) -> Result<()> {
    if !screen.mounts_provider() {
        anyhow::bail!("{} does not show posts", screen);
    }
    let provider = open_provider(data_dir, partition, screen).await?;
    let snapshot = provider.snapshot();

    if snapshot.is_empty() {
        println!("No posts.");
    }
    for post in &snapshot {
        println!("{}", render_row(post));
    }

    provider.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn list_requires_login() {
        let dir = tempdir().unwrap();
        let result = run(dir.path(), None, Screen::Feed).await;
        assert!(result.unwrap_err().to_string().contains("Not logged in"));
    }

    #[tokio::test]
    async fn list_rejects_screen_without_posts() {
        let dir = tempdir().unwrap();
        crate::commands::login::run(dir.path(), "alice", None)
            .await
            .unwrap();
        assert!(run(dir.path(), None, Screen::Home).await.is_err());
    }

    #[tokio::test]
    async fn list_empty_partition() {
        let dir = tempdir().unwrap();
        crate::commands::login::run(dir.path(), "alice", None)
            .await
            .unwrap();
        assert!(run(dir.path(), None, Screen::Friends).await.is_ok());
    }
}
