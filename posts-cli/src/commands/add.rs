//! Create a post, then return to the feed.

use anyhow::Result;
use postsync_client::{FileStore, PostsProvider};
use postsync_core::{History, Navigator, Screen};
use postsync_types::PostId;
use std::path::Path;

use crate::commands::{open_provider, render_row};

/// Run the add command.
pub async fn run(
    data_dir: &Path,
    partition: Option<&str>,
    name: &str,
    description: &str,
) -> Result<()> {
    let mut history = History::new();
    history.navigate(Screen::CreatePost);
    let provider = open_provider(data_dir, partition, Screen::CreatePost).await?;
    let id = submit(&provider, &mut history, name, description).await?;

    let snapshot = provider.snapshot();
    if let Some(post) = snapshot.get(&id) {
        println!("Created {} ({})", post.name, id.short());
    }
    if history.current() == Some(Screen::Feed) {
        println!();
        println!("{}:", Screen::Feed);
        for post in &snapshot {
            println!("{}", render_row(post));
        }
    }

    provider.close().await;
    Ok(())
}

/// Create the post and navigate to the feed. Nothing navigates on failure.
async fn submit<N: Navigator>(
    provider: &PostsProvider<FileStore>,
    navigator: &mut N,
    name: &str,
    description: &str,
) -> Result<PostId> {
    let id = provider.create(name, description).await?;
    navigator.navigate(Screen::Feed);
    Ok(id)
}
