//! Identity and ordering types for postsync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::PostError;

/// A unique identifier for a post.
///
/// UUID v4 format (16 bytes), generated client-side at creation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(uuid::Uuid);

impl PostId {
    /// Create a new random PostId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a PostId from its hyphenated string form.
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short display form (first 8 hex chars) for listings.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostId({})", self.0)
    }
}

/// The logical collection a post belongs to.
///
/// A provider only ever observes posts whose partition equals its own.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition(String);

impl Partition {
    /// Create a partition, rejecting empty or whitespace-only values.
    pub fn new(value: impl Into<String>) -> Result<Self, PostError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(PostError::InvalidPartition(value));
        }
        Ok(Self(value))
    }

    /// The default partition of a user: their own identity.
    pub fn for_identity(identity: &Identity) -> Self {
        Self(identity.as_str().to_string())
    }

    /// Get the partition value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Partition({})", self.0)
    }
}

/// An authenticated user identity, as handed out by the auth capability.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity, rejecting empty or whitespace-only values.
    pub fn new(value: impl Into<String>) -> Result<Self, PostError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(PostError::InvalidIdentity(value));
        }
        Ok(Self(value))
    }

    /// Get the identity value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

/// Milliseconds since the UNIX epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a Timestamp from a millisecond value.
    pub fn from_millis(value: u64) -> Self {
        Self(value)
    }

    /// The current wall-clock time.
    ///
    /// Clocks set before the epoch read as zero.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Get the millisecond value.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Get the value truncated to whole seconds.
    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_id_is_uuid_v4() {
        let id = PostId::new();
        assert_eq!(id.as_uuid().as_bytes().len(), 16);
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn post_ids_are_unique() {
        let a = PostId::new();
        let b = PostId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn post_id_parses_display_form() {
        let id = PostId::new();
        assert_eq!(PostId::parse(&id.to_string()), Some(id));
        assert!(PostId::parse("not-a-uuid").is_none());
    }

    #[test]
    fn post_id_short_is_prefix_of_simple_form() {
        let id = PostId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(id.as_uuid().simple().to_string().starts_with(&short));
    }

    #[test]
    fn partition_rejects_blank() {
        assert!(matches!(
            Partition::new(""),
            Err(PostError::InvalidPartition(_))
        ));
        assert!(matches!(
            Partition::new("   "),
            Err(PostError::InvalidPartition(_))
        ));
        assert_eq!(Partition::new("project-1").unwrap().as_str(), "project-1");
    }

    #[test]
    fn identity_rejects_blank() {
        assert!(matches!(
            Identity::new(""),
            Err(PostError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn default_partition_is_identity() {
        let user = Identity::new("user-42").unwrap();
        assert_eq!(Partition::for_identity(&user).as_str(), "user-42");
    }

    #[test]
    fn partition_serializes_as_plain_string() {
        let p = Partition::new("alpha").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"alpha\"");
    }

    #[test]
    fn timestamp_now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(Timestamp::now().as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn timestamp_secs_truncates() {
        assert_eq!(Timestamp::from_millis(1_999).as_secs(), 1);
    }
}
