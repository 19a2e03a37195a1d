//! Sync store backed by one MessagePack file per partition.
//!
//! This is the store the CLI runs against. Each partition lives in
//! `<root>/<partition>.posts`; a write rereads the file, applies the
//! transaction and atomically replaces the file (tmp + rename), so
//! separate processes sharing a data directory see each other's writes
//! the next time they open.

use super::listeners::ListenerTable;
use super::{ChangeListener, Connection, OpenConfig, StoreError, SyncStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use postsync_core::Transaction;
use postsync_types::{decode_records, encode_records, Partition, Post};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// File extension of a partition file.
const EXTENSION: &str = "posts";

/// Sync store persisting partitions under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    shared: Arc<FileShared>,
}

#[derive(Debug)]
struct FileShared {
    root: PathBuf,
    state: Mutex<FileState>,
    write_lock: tokio::sync::Mutex<()>,
}

#[derive(Debug, Default)]
struct FileState {
    records: HashMap<Partition, Vec<Post>>,
    listeners: ListenerTable,
    next_connection: u64,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            shared: Arc::new(FileShared {
                root: root.into(),
                state: Mutex::new(FileState::default()),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Directory holding the partition files.
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    /// Path of the file holding `partition`.
    pub fn partition_path(&self, partition: &Partition) -> PathBuf {
        self.shared.partition_path(partition)
    }
}

impl FileShared {
    fn partition_path(&self, partition: &Partition) -> PathBuf {
        self.root
            .join(format!("{}.{}", file_stem(partition), EXTENSION))
    }

    async fn load(&self, partition: &Partition) -> Result<Vec<Post>, StoreError> {
        match tokio::fs::read(self.partition_path(partition)).await {
            Ok(bytes) => Ok(decode_records(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, partition: &Partition, posts: &[Post]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.partition_path(partition);
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        tokio::fs::write(&tmp, encode_records(posts)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Filesystem-safe name for a partition.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte is
/// written as `%XX`.
fn file_stem(partition: &Partition) -> String {
    let mut out = String::with_capacity(partition.as_str().len());
    for byte in partition.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[async_trait]
impl SyncStore for FileStore {
    async fn open(&self, config: &OpenConfig) -> Result<Arc<dyn Connection>, StoreError> {
        let posts = self.shared.load(&config.partition).await?;
        tracing::debug!(
            partition = %config.partition,
            records = posts.len(),
            "opened partition file"
        );

        let mut state = self.shared.state.lock();
        state.records.insert(config.partition.clone(), posts);
        state.next_connection += 1;
        Ok(Arc::new(FileConnection {
            id: state.next_connection,
            partition: config.partition.clone(),
            shared: Arc::clone(&self.shared),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Connection handed out by [`FileStore`].
struct FileConnection {
    id: u64,
    partition: Partition,
    shared: Arc<FileShared>,
    closed: AtomicBool,
}

#[async_trait]
impl Connection for FileConnection {
    fn partition(&self) -> &Partition {
        &self.partition
    }

    fn objects(&self) -> Vec<Post> {
        let state = self.shared.state.lock();
        state
            .records
            .get(&self.partition)
            .cloned()
            .unwrap_or_default()
    }

    fn add_listener(&self, listener: ChangeListener) {
        let mut state = self.shared.state.lock();
        state.listeners.add(self.id, &self.partition, listener);
    }

    fn remove_all_listeners(&self) {
        let mut state = self.shared.state.lock();
        state.listeners.remove_connection(self.id);
    }

    fn listener_count(&self) -> usize {
        let state = self.shared.state.lock();
        state.listeners.count_for_connection(self.id)
    }

    async fn write(&self, tx: Transaction) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let _guard = self.shared.write_lock.lock().await;
        let current = self.shared.load(&self.partition).await?;
        let next = tx.apply(&self.partition, &current)?;
        self.shared.persist(&self.partition, &next).await?;

        let listeners = {
            let mut state = self.shared.state.lock();
            state.records.insert(self.partition.clone(), next.clone());
            state.listeners.for_partition(&self.partition)
        };
        tracing::debug!(partition = %self.partition, records = next.len(), "committed write");

        for listener in listeners {
            listener(&next);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postsync_core::TransactionError;
    use postsync_types::{Identity, PostStatus};
    use tempfile::TempDir;

    fn config(partition: &str) -> OpenConfig {
        OpenConfig::new(
            Identity::new("alice").unwrap(),
            Partition::new(partition).unwrap(),
        )
    }

    #[test]
    fn file_stem_escapes_unsafe_bytes() {
        let p = Partition::new("user=alice/../x").unwrap();
        assert_eq!(file_stem(&p), "user%3Dalice%2F%2E%2E%2Fx");
        assert_eq!(file_stem(&Partition::new("plain-name_1").unwrap()), "plain-name_1");
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let conn = store.open(&config("alice")).await.unwrap();
        assert!(conn.objects().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let post = Post::new(Partition::new("alice").unwrap(), "hello", "world");

        {
            let store = FileStore::new(dir.path());
            let conn = store.open(&config("alice")).await.unwrap();
            conn.write(Transaction::new().create(post.clone()))
                .await
                .unwrap();
            conn.write(Transaction::new().set_status(post.id, PostStatus::InProgress))
                .await
                .unwrap();
        }

        let store = FileStore::new(dir.path());
        let conn = store.open(&config("alice")).await.unwrap();
        let posts = conn.objects();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].name, "hello");
        assert_eq!(posts[0].status, PostStatus::InProgress);
        assert!(store.partition_path(&Partition::new("alice").unwrap()).exists());
    }

    #[tokio::test]
    async fn failed_transaction_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let conn = store.open(&config("alice")).await.unwrap();
        let post = Post::new(Partition::new("alice").unwrap(), "a", "");
        conn.write(Transaction::new().create(post.clone()))
            .await
            .unwrap();

        let result = conn
            .write(
                Transaction::new()
                    .delete(post.id)
                    .delete(postsync_types::PostId::new()),
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Transaction(TransactionError::NotFound(_)))
        ));
        assert_eq!(conn.objects(), vec![post]);
    }

    #[tokio::test]
    async fn listener_fires_after_commit() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let conn = store.open(&config("alice")).await.unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        conn.add_listener(Arc::new(move |posts| sink.lock().push(posts.len())));

        conn.write(Transaction::new().create(Post::new(
            Partition::new("alice").unwrap(),
            "a",
            "",
        )))
        .await
        .unwrap();

        assert_eq!(*seen.lock(), vec![1]);
        conn.remove_all_listeners();
        assert_eq!(conn.listener_count(), 0);
    }

    #[tokio::test]
    async fn partitions_use_separate_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let a = store.open(&config("alice")).await.unwrap();
        let b = store.open(&config("bob")).await.unwrap();

        a.write(Transaction::new().create(Post::new(
            Partition::new("alice").unwrap(),
            "a",
            "",
        )))
        .await
        .unwrap();

        assert_eq!(a.objects().len(), 1);
        assert!(b.objects().is_empty());
    }

    #[tokio::test]
    async fn write_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let conn = store.open(&config("alice")).await.unwrap();
        conn.close().await.unwrap();
        conn.close().await.unwrap();
        let result = conn.write(Transaction::new()).await;
        assert!(matches!(result, Err(StoreError::Closed)));
    }
}
