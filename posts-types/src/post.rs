//! The synced item.

use serde::{Deserialize, Serialize};

use crate::{Partition, PostError, PostId, PostStatus, Timestamp};

/// Placeholder name given to posts created without one.
pub const DEFAULT_POST_NAME: &str = "New Post";

/// A post in a shared list.
///
/// Stored as one record per post, keyed by `_id` and filtered by `_partition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Primary key, immutable.
    #[serde(rename = "_id")]
    pub id: PostId,
    /// Owning partition, immutable.
    #[serde(rename = "_partition")]
    pub partition: Partition,
    /// Display name.
    pub name: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Workflow status.
    pub status: PostStatus,
    /// Creation time, immutable.
    pub date_published: Timestamp,
}

impl Post {
    /// Build a new post in `partition` with a fresh id and the current time.
    ///
    /// A blank `name` falls back to [`DEFAULT_POST_NAME`].
    pub fn new(partition: Partition, name: &str, description: &str) -> Self {
        let name = if name.trim().is_empty() {
            DEFAULT_POST_NAME.to_string()
        } else {
            name.to_string()
        };
        Self {
            id: PostId::new(),
            partition,
            name,
            description: description.to_string(),
            status: PostStatus::Open,
            date_published: Timestamp::now(),
        }
    }
}

/// Encode a whole partition's records, preserving order.
pub fn encode_records(posts: &[Post]) -> Result<Vec<u8>, PostError> {
    rmp_serde::to_vec_named(posts).map_err(PostError::Serialization)
}

/// Decode a partition's records.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<Post>, PostError> {
    rmp_serde::from_slice(bytes).map_err(PostError::Deserialization)
}
