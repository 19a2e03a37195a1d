//! Local state for posts-cli.
//!
//! The data directory holds:
//! - `session.json`: the signed-in user (0600 on Unix)
//! - `posts.toml`: optional settings
//! - `store/`: one record file per partition

use anyhow::{Context, Result};
use postsync_client::{Settings, SETTINGS_FILE};
use postsync_core::Session;
use postsync_types::{Identity, Partition, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";
const STORE_DIR: &str = "store";

/// Signed-in user stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Identity of the signed-in user.
    pub user: String,
    /// Partition to use instead of the user's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// When the user logged in (ms since epoch).
    pub logged_in_at: u64,
}

impl SessionConfig {
    /// Create a session for `user`.
    pub fn new(user: &Identity, partition: Option<&Partition>) -> Self {
        Self {
            user: user.as_str().to_string(),
            partition: partition.map(|p| p.as_str().to_string()),
            logged_in_at: Timestamp::now().as_millis(),
        }
    }

    /// Load the session, or `None` when nobody is logged in.
    pub async fn load(data_dir: &Path) -> Result<Option<Self>> {
        let path = data_dir.join(SESSION_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Failed to read session file")?;
        let session = serde_json::from_str(&contents).context("Invalid session file")?;
        Ok(Some(session))
    }

    /// Save the session to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .context("Failed to create data directory")?;
        set_dir_permissions_0700(data_dir).await?;

        let path = data_dir.join(SESSION_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save session")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Remove the session file. Returns false if nobody was logged in.
    pub async fn clear(data_dir: &Path) -> Result<bool> {
        let path = data_dir.join(SESSION_FILE);
        if !path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(&path)
            .await
            .context("Failed to remove session file")?;
        Ok(true)
    }

    /// Identity of the stored user.
    pub fn identity(&self) -> Result<Identity> {
        Identity::new(self.user.as_str()).context("Invalid user in session file")
    }

    /// Partition to open: `override_partition`, then the stored override,
    /// then the user's own partition.
    pub fn partition(&self, override_partition: Option<&str>) -> Result<Partition> {
        match override_partition.or(self.partition.as_deref()) {
            Some(name) => Partition::new(name).context("Invalid partition"),
            None => Ok(Partition::for_identity(&self.identity()?)),
        }
    }

    /// Provider session for this user.
    pub fn session(&self, override_partition: Option<&str>) -> Result<Session> {
        Ok(Session::new(
            self.identity()?,
            self.partition(override_partition)?,
        ))
    }
}

/// Directory holding the partition record files.
pub fn store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_DIR)
}

/// Load `posts.toml` from the data directory, defaults if absent.
pub fn load_settings(data_dir: &Path) -> Result<Settings> {
    Settings::load_or_default(&data_dir.join(SETTINGS_FILE)).context("Failed to load settings")
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Set directory permissions to 0700 (owner only) on Unix.
/// No-op on non-Unix platforms.
async fn set_dir_permissions_0700(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .context("Failed to set directory permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn alice() -> Identity {
        Identity::new("alice").unwrap()
    }

    #[tokio::test]
    async fn session_roundtrip() {
        let dir = tempdir().unwrap();
        let session = SessionConfig::new(&alice(), None);
        session.save(dir.path()).await.unwrap();

        let loaded = SessionConfig::load(dir.path()).await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn missing_session_loads_none() {
        let dir = tempdir().unwrap();
        assert!(SessionConfig::load(dir.path()).await.unwrap().is_none());
        assert!(!SessionConfig::clear(dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_session() {
        let dir = tempdir().unwrap();
        SessionConfig::new(&alice(), None)
            .save(dir.path())
            .await
            .unwrap();

        assert!(SessionConfig::clear(dir.path()).await.unwrap());
        assert!(SessionConfig::load(dir.path()).await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        SessionConfig::new(&alice(), None)
            .save(dir.path())
            .await
            .unwrap();

        let mode = std::fs::metadata(dir.path().join(SESSION_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn partition_precedence() {
        let own = SessionConfig::new(&alice(), None);
        assert_eq!(own.partition(None).unwrap().as_str(), "alice");
        assert_eq!(own.partition(Some("team")).unwrap().as_str(), "team");

        let stored = SessionConfig::new(&alice(), Some(&Partition::new("shared").unwrap()));
        assert_eq!(stored.partition(None).unwrap().as_str(), "shared");
        assert_eq!(stored.partition(Some("team")).unwrap().as_str(), "team");
    }

    #[test]
    fn blank_override_is_rejected() {
        let own = SessionConfig::new(&alice(), None);
        assert!(own.partition(Some("  ")).is_err());
    }
}
