//! CLI command implementations.

pub mod add;
pub mod delete;
pub mod list;
pub mod login;
pub mod logout;
pub mod menu;
pub mod set_status;
pub mod status;

use anyhow::{Context, Result};
use postsync_client::{AuthProvider, FileStore, PostsProvider, SessionAuth};
use postsync_core::{PostRow, Screen};
use postsync_types::Post;
use std::path::Path;

use crate::config::{load_settings, store_dir, SessionConfig};

/// Open a provider on the signed-in user's partition for `screen`.
///
/// Fails with a hint to log in when the screen is gated.
pub async fn open_provider(
    data_dir: &Path,
    partition: Option<&str>,
    screen: Screen,
) -> Result<PostsProvider<FileStore>> {
    let stored = SessionConfig::load(data_dir).await?;
    let auth = match &stored {
        Some(s) => SessionAuth::signed_in(s.identity()?),
        None => SessionAuth::new(),
    };

    let route = auth.route(screen);
    let session = match (&stored, route.is_gated()) {
        (Some(s), false) => s.session(partition)?,
        _ => anyhow::bail!("Not logged in. Run 'posts-cli login --user <name>' first."),
    };
    tracing::debug!(screen = %route.screen, partition = %session.partition, "mounting provider");

    let settings = load_settings(data_dir)?;
    let provider = PostsProvider::from_settings(FileStore::new(store_dir(data_dir)), &settings);
    provider
        .open_session(Some(session))
        .await
        .context("Failed to open partition")?;
    Ok(provider)
}

/// Find the single post whose id starts with `prefix`.
pub fn find_post(provider: &PostsProvider<FileStore>, prefix: &str) -> Result<Post> {
    provider
        .snapshot()
        .find_by_prefix(prefix)
        .cloned()
        .with_context(|| format!("No unique post matches '{}'", prefix))
}

/// One-line rendering of a post, followed by its description if any.
pub fn render_row(post: &Post) -> String {
    let row = PostRow::from_post(post);
    let mut line = format!("{}  {}", row.id.short(), row.title);
    if let Some(badge) = row.badge {
        line.push_str(&format!("  [{}]", badge));
    }
    if !row.subtitle.is_empty() {
        line.push_str(&format!("\n          {}", row.subtitle));
    }
    line
}
