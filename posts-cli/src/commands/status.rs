//! Show who is signed in and what the provider sees.

use anyhow::Result;
use postsync_client::{AuthProvider, SessionAuth};
use postsync_core::Route;
use postsync_types::PostStatus;
use std::path::Path;

use crate::commands::open_provider;
use crate::config::{load_settings, store_dir, SessionConfig};

/// Run the status command.
pub async fn run(data_dir: &Path, partition: Option<&str>) -> Result<()> {
    println!("postsync status");
    println!("===============");
    println!();
    println!("Data dir: {}", data_dir.display());
    println!("Store:    {}", store_dir(data_dir).display());

    let settings = load_settings(data_dir)?;
    println!(
        "Open:     timeout {}s, {} retries, {}ms delay",
        settings.open.timeout_secs, settings.open.retries, settings.open.retry_delay_ms
    );
    println!();

    let session = match SessionConfig::load(data_dir).await? {
        Some(session) => session,
        None => {
            let route = SessionAuth::new().route(Route::INITIAL);
            println!("Session: NOT LOGGED IN");
            println!("Screen:  {}", route.screen);
            println!();
            println!("Run 'posts-cli login --user <name>'");
            return Ok(());
        }
    };

    println!("Session:");
    println!("  User:      {}", session.user);
    println!("  Partition: {}", session.partition(partition)?);
    println!();

    let provider = open_provider(data_dir, partition, Route::INITIAL).await?;
    let snapshot = provider.snapshot();
    let count = |status: PostStatus| snapshot.iter().filter(|p| p.status == status).count();

    println!("Posts: {}", snapshot.len());
    println!("  {:<12} {}", PostStatus::Open.label(), count(PostStatus::Open));
    println!(
        "  {:<12} {}",
        PostStatus::InProgress.label(),
        count(PostStatus::InProgress)
    );
    println!(
        "  {:<12} {}",
        PostStatus::Complete.label(),
        count(PostStatus::Complete)
    );

    provider.close().await;
    Ok(())
}
