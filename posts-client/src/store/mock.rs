//! Mock sync store for testing.
//!
//! Keeps every partition in memory, lets tests seed server-side records,
//! force failures, park open requests until released, and inspect how many
//! connections and listeners are alive.

use super::listeners::ListenerTable;
use super::{ChangeListener, Connection, OpenConfig, StoreError, SyncStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use postsync_core::Transaction;
use postsync_types::{Partition, Post};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Mock sync store for testing.
///
/// Clones share state, so a test can keep one handle while the provider
/// owns another.
#[derive(Debug, Default, Clone)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    partitions: HashMap<Partition, Vec<Post>>,
    listeners: ListenerTable,
    next_connection: u64,
    open_requests: Vec<OpenConfig>,
    opened: usize,
    closed: usize,
    committed_writes: usize,
    fail_next_open: Option<String>,
    fail_opens: usize,
    fail_next_write: Option<String>,
    hold_opens: bool,
    parked: VecDeque<oneshot::Sender<()>>,
}

impl MockStore {
    /// Create a new mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put records into a partition without notifying anyone.
    pub fn seed(&self, partition: &Partition, posts: Vec<Post>) {
        let mut inner = self.inner.lock();
        inner.partitions.insert(partition.clone(), posts);
    }

    /// Commit a write as if another device made it, notifying listeners.
    pub fn remote_write(&self, partition: &Partition, tx: Transaction) -> Result<(), StoreError> {
        commit(&self.inner, partition, tx)
    }

    /// Server-side records of a partition.
    pub fn posts(&self, partition: &Partition) -> Vec<Post> {
        let inner = self.inner.lock();
        inner.partitions.get(partition).cloned().unwrap_or_default()
    }

    /// Cause the next open() to fail with the given error.
    pub fn fail_next_open(&self, error: &str) {
        let mut inner = self.inner.lock();
        inner.fail_next_open = Some(error.to_string());
    }

    /// Cause the next `count` opens to fail.
    pub fn fail_opens(&self, count: usize) {
        let mut inner = self.inner.lock();
        inner.fail_opens = count;
    }

    /// Cause the next write() to be rejected with the given error.
    pub fn fail_next_write(&self, error: &str) {
        let mut inner = self.inner.lock();
        inner.fail_next_write = Some(error.to_string());
    }

    /// Park every subsequent open() until released.
    pub fn hold_opens(&self) {
        let mut inner = self.inner.lock();
        inner.hold_opens = true;
    }

    /// Resolve the oldest parked open. Returns false if none was parked.
    pub fn release_next_open(&self) -> bool {
        let sender = {
            let mut inner = self.inner.lock();
            inner.parked.pop_front()
        };
        match sender {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Number of opens currently parked.
    pub fn parked_opens(&self) -> usize {
        let inner = self.inner.lock();
        inner.parked.len()
    }

    /// Yield until at least `count` opens are parked.
    pub async fn wait_for_parked(&self, count: usize) {
        while self.parked_opens() < count {
            tokio::task::yield_now().await;
        }
    }

    /// Every open request received, in order.
    pub fn open_requests(&self) -> Vec<OpenConfig> {
        let inner = self.inner.lock();
        inner.open_requests.clone()
    }

    /// Connections successfully opened.
    pub fn opened_count(&self) -> usize {
        self.inner.lock().opened
    }

    /// Connections closed.
    pub fn closed_count(&self) -> usize {
        self.inner.lock().closed
    }

    /// Connections opened and not yet closed.
    pub fn live_connections(&self) -> usize {
        let inner = self.inner.lock();
        inner.opened - inner.closed
    }

    /// Listeners registered across all connections.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Writes committed (local and remote).
    pub fn committed_writes(&self) -> usize {
        self.inner.lock().committed_writes
    }
}

/// Apply a transaction to the partition, then fire its listeners.
///
/// Listeners run after the lock is released so they may call back in.
fn commit(
    inner: &Mutex<MockStoreInner>,
    partition: &Partition,
    tx: Transaction,
) -> Result<(), StoreError> {
    let (listeners, records) = {
        let mut inner = inner.lock();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(StoreError::WriteRejected(error));
        }
        let current = inner.partitions.get(partition).cloned().unwrap_or_default();
        let next = tx.apply(partition, &current)?;
        inner.partitions.insert(partition.clone(), next.clone());
        inner.committed_writes += 1;
        (inner.listeners.for_partition(partition), next)
    };

    for listener in listeners {
        listener(&records);
    }
    Ok(())
}

#[async_trait]
impl SyncStore for MockStore {
    async fn open(&self, config: &OpenConfig) -> Result<Arc<dyn Connection>, StoreError> {
        let parked = {
            let mut inner = self.inner.lock();
            inner.open_requests.push(config.clone());
            if inner.hold_opens {
                let (tx, rx) = oneshot::channel();
                inner.parked.push_back(tx);
                Some(rx)
            } else {
                None
            }
        };

        if let Some(rx) = parked {
            rx.await
                .map_err(|_| StoreError::OpenFailed("open abandoned".into()))?;
        }

        let mut inner = self.inner.lock();

        // Check for forced failure
        if let Some(error) = inner.fail_next_open.take() {
            return Err(StoreError::OpenFailed(error));
        }
        if inner.fail_opens > 0 {
            inner.fail_opens -= 1;
            return Err(StoreError::OpenFailed("forced failure".into()));
        }

        inner.next_connection += 1;
        inner.opened += 1;
        Ok(Arc::new(MockConnection {
            id: inner.next_connection,
            partition: config.partition.clone(),
            store: Arc::clone(&self.inner),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Connection handed out by [`MockStore`].
struct MockConnection {
    id: u64,
    partition: Partition,
    store: Arc<Mutex<MockStoreInner>>,
    closed: AtomicBool,
}

#[async_trait]
impl Connection for MockConnection {
    fn partition(&self) -> &Partition {
        &self.partition
    }

    fn objects(&self) -> Vec<Post> {
        let inner = self.store.lock();
        inner
            .partitions
            .get(&self.partition)
            .cloned()
            .unwrap_or_default()
    }

    fn add_listener(&self, listener: ChangeListener) {
        let mut inner = self.store.lock();
        inner.listeners.add(self.id, &self.partition, listener);
    }

    fn remove_all_listeners(&self) {
        let mut inner = self.store.lock();
        inner.listeners.remove_connection(self.id);
    }

    fn listener_count(&self) -> usize {
        let inner = self.store.lock();
        inner.listeners.count_for_connection(self.id)
    }

    async fn write(&self, tx: Transaction) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        commit(&self.store, &self.partition, tx)
    }

    async fn close(&self) -> Result<(), StoreError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut inner = self.store.lock();
            inner.closed += 1;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
