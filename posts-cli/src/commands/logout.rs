//! Sign out.

use anyhow::Result;
use postsync_client::{AuthProvider, SessionAuth};
use std::path::Path;

use crate::config::SessionConfig;

/// Run the logout command.
pub async fn run(data_dir: &Path) -> Result<()> {
    let auth = match SessionConfig::load(data_dir).await? {
        Some(session) => SessionAuth::signed_in(session.identity()?),
        None => {
            println!("Not logged in.");
            return Ok(());
        }
    };

    let user = auth.current_user();
    auth.log_out();
    SessionConfig::clear(data_dir).await?;

    if let Some(user) = user {
        println!("Logged out {}", user);
    }
    Ok(())
}
