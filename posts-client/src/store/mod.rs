//! Sync store abstraction for postsync.
//!
//! This module models the external managed sync service as a capability:
//! the provider only ever talks to it through [`SyncStore`] and
//! [`Connection`], never to a concrete backend.
//!
//! # Design
//!
//! The store is connection-oriented:
//! - `open()` resolves to a live connection scoped to one partition
//! - `objects()` reads the partition's current records
//! - `add_listener()` registers a change callback fired after every commit
//! - `write()` applies a [`Transaction`] all-or-nothing
//! - `remove_all_listeners()` then `close()` tear the connection down
//!
//! # Example
//!
//! ```ignore
//! let store = MockStore::new();
//! let conn = store.open(&OpenConfig::new(user, partition)).await?;
//! conn.add_listener(Arc::new(|posts| println!("{} posts", posts.len())));
//! conn.write(Transaction::new().create(post)).await?;
//! conn.remove_all_listeners();
//! conn.close().await?;
//! ```

mod file;
mod listeners;
mod mock;

pub use file::FileStore;
pub use mock::MockStore;

use async_trait::async_trait;
use postsync_core::{Session, Transaction, TransactionError};
use postsync_types::{Identity, Partition, Post, PostError};
use std::sync::Arc;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Open request failed.
    #[error("open failed: {0}")]
    OpenFailed(String),

    /// Open request did not resolve in time.
    #[error("open timed out")]
    Timeout,

    /// Connection already closed.
    #[error("connection closed")]
    Closed,

    /// Write rejected by the store; nothing was committed.
    #[error("write rejected: {0}")]
    WriteRejected(String),

    /// Write rejected because the transaction does not apply.
    #[error("write rejected: {0}")]
    Transaction(#[from] TransactionError),

    /// Record encoding failed.
    #[error("record error: {0}")]
    Record(#[from] PostError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the store needs to open a partition for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenConfig {
    /// Authenticated user.
    pub identity: Identity,
    /// Partition whose objects the connection exposes.
    pub partition: Partition,
}

impl OpenConfig {
    /// Create an open config.
    pub fn new(identity: Identity, partition: Partition) -> Self {
        Self {
            identity,
            partition,
        }
    }
}

impl From<&Session> for OpenConfig {
    fn from(session: &Session) -> Self {
        Self::new(session.identity.clone(), session.partition.clone())
    }
}

/// Callback fired with the partition's full record list after each change.
pub type ChangeListener = Arc<dyn Fn(&[Post]) + Send + Sync>;

/// External synced store.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Open a connection to one partition.
    async fn open(&self, config: &OpenConfig) -> Result<Arc<dyn Connection>, StoreError>;
}

/// Live session to one partition of the store.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Partition this connection is scoped to.
    fn partition(&self) -> &Partition;

    /// Current records of the partition, in store order.
    fn objects(&self) -> Vec<Post>;

    /// Register a change listener.
    ///
    /// Listeners fire in registration order after every committed write
    /// that touches the partition, including writes from other connections.
    fn add_listener(&self, listener: ChangeListener);

    /// Unregister every listener this connection registered.
    fn remove_all_listeners(&self);

    /// Number of listeners registered through this connection.
    fn listener_count(&self) -> usize;

    /// Apply a transaction atomically.
    async fn write(&self, tx: Transaction) -> Result<(), StoreError>;

    /// Close the connection. Idempotent.
    async fn close(&self) -> Result<(), StoreError>;

    /// Check if the connection is closed.
    fn is_closed(&self) -> bool;
}
