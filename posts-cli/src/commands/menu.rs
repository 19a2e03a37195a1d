//! Show a post's action menu, optionally selecting an entry.

use anyhow::{Context, Result};
use postsync_client::dispatch;
use postsync_core::{ActionMenu, PostAction, Screen};
use std::path::Path;

use crate::commands::{find_post, open_provider, render_row};

/// Run the menu command.
pub async fn run(
    data_dir: &Path,
    partition: Option<&str>,
    id: &str,
    select: Option<&str>,
) -> Result<()> {
    let provider = open_provider(data_dir, partition, Screen::Feed).await?;
    let post = find_post(&provider, id)?;
    let menu = ActionMenu::for_post(&post);

    match select {
        None => {
            println!("{}", render_row(&post));
            println!();
            for entry in menu.entries() {
                println!("  {}", entry.title);
            }
        }
        Some(title) => {
            let entry = menu
                .find(title)
                .with_context(|| format!("No menu entry '{}' for this post", title))?;
            dispatch(&provider, &post, entry.action).await?;
            match entry.action {
                PostAction::Cancel => println!("Cancelled."),
                _ => println!("{}: {}", entry.title, post.name),
            }
        }
    }

    provider.close().await;
    Ok(())
}
