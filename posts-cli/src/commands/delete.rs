//! Delete a post.

use anyhow::Result;
use postsync_core::Screen;
use std::path::Path;

use crate::commands::{find_post, open_provider};

/// Run the delete command.
pub async fn run(data_dir: &Path, partition: Option<&str>, id: &str) -> Result<()> {
    let provider = open_provider(data_dir, partition, Screen::Feed).await?;
    let post = find_post(&provider, id)?;

    provider.delete(&post).await?;
    println!("Deleted {} ({})", post.name, post.id.short());

    provider.close().await;
    Ok(())
}
