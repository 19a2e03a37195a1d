//! Atomic write batches.
//!
//! A [`Transaction`] is an ordered list of writes applied all-or-nothing to
//! one partition's records. Stores call [`Transaction::apply`] on the current
//! records and commit the result only when it returns `Ok`.

use postsync_types::{Partition, Post, PostId, PostStatus};
use thiserror::Error;

/// Why a transaction was rejected. Nothing is committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// A post with this id already exists.
    #[error("post {0} already exists")]
    DuplicateId(PostId),

    /// The post does not exist in the partition.
    #[error("post {0} not found")]
    NotFound(PostId),

    /// The post belongs to another partition.
    #[error("post {id} belongs to partition {found}, not {expected}")]
    PartitionMismatch {
        /// Offending post.
        id: PostId,
        /// Partition the transaction targets.
        expected: Partition,
        /// Partition on the post.
        found: Partition,
    },
}

/// A single write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert a new post.
    Create(Post),
    /// Change a post's status.
    SetStatus {
        /// Target post.
        id: PostId,
        /// New status.
        status: PostStatus,
    },
    /// Remove a post.
    Delete(PostId),
}

/// Ordered batch of writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    ops: Vec<WriteOp>,
}

impl Transaction {
    /// Create an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a create.
    pub fn create(mut self, post: Post) -> Self {
        self.ops.push(WriteOp::Create(post));
        self
    }

    /// Append a status change.
    pub fn set_status(mut self, id: PostId, status: PostStatus) -> Self {
        self.ops.push(WriteOp::SetStatus { id, status });
        self
    }

    /// Append a delete.
    pub fn delete(mut self, id: PostId) -> Self {
        self.ops.push(WriteOp::Delete(id));
        self
    }

    /// The queued writes.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Check if the transaction has no writes.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every write to a copy of `records`.
    ///
    /// Returns the new record list, or the first error with `records`
    /// untouched. New posts are appended, preserving store order.
    pub fn apply(&self, partition: &Partition, records: &[Post]) -> Result<Vec<Post>, TransactionError> {
        let mut next = records.to_vec();

        for op in &self.ops {
            match op {
                WriteOp::Create(post) => {
                    if &post.partition != partition {
                        return Err(TransactionError::PartitionMismatch {
                            id: post.id,
                            expected: partition.clone(),
                            found: post.partition.clone(),
                        });
                    }
                    if next.iter().any(|p| p.id == post.id) {
                        return Err(TransactionError::DuplicateId(post.id));
                    }
                    next.push(post.clone());
                }
                WriteOp::SetStatus { id, status } => {
                    let post = next
                        .iter_mut()
                        .find(|p| p.id == *id)
                        .ok_or(TransactionError::NotFound(*id))?;
                    post.status = *status;
                }
                WriteOp::Delete(id) => {
                    let index = next
                        .iter()
                        .position(|p| p.id == *id)
                        .ok_or(TransactionError::NotFound(*id))?;
                    next.remove(index);
                }
            }
        }

        Ok(next)
    }
}
