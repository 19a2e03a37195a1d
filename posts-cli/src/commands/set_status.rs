//! Change a post's status.

use anyhow::Result;
use postsync_core::Screen;
use std::path::Path;

use crate::commands::{find_post, open_provider};

/// Run the set-status command.
pub async fn run(data_dir: &Path, partition: Option<&str>, id: &str, status: &str) -> Result<()> {
    let provider = open_provider(data_dir, partition, Screen::Feed).await?;
    let post = find_post(&provider, id)?;

    provider.set_status_named(&post, status).await?;
    println!("{} is now {}", post.name, status);

    provider.close().await;
    Ok(())
}
