//! Sign in as a user.

use anyhow::{Context, Result};
use postsync_types::{Identity, Partition};
use std::path::Path;

use crate::config::SessionConfig;

/// Run the login command.
pub async fn run(data_dir: &Path, user: &str, partition: Option<&str>) -> Result<()> {
    let identity = Identity::new(user).context("Invalid user name")?;
    let partition = partition
        .map(Partition::new)
        .transpose()
        .context("Invalid partition")?;

    if let Some(previous) = SessionConfig::load(data_dir).await? {
        if previous.user != identity.as_str() {
            println!("Signed out {}", previous.user);
        }
    }

    let session = SessionConfig::new(&identity, partition.as_ref());
    session.save(data_dir).await?;

    println!("Logged in as {}", identity);
    println!("  Partition: {}", session.partition(None)?);

    Ok(())
}
