//! Error types for postsync.

use thiserror::Error;

/// Errors that can occur when building or decoding posts.
#[derive(Debug, Error)]
pub enum PostError {
    /// Status name is not one of the known statuses
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Partition value is empty
    #[error("invalid partition: {0:?}")]
    InvalidPartition(String),

    /// Identity value is empty
    #[error("invalid identity: {0:?}")]
    InvalidIdentity(String),

    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),
}
