//! Listener bookkeeping shared by the store implementations.

use postsync_types::Partition;

use super::ChangeListener;

struct Entry {
    connection: u64,
    partition: Partition,
    listener: ChangeListener,
}

/// Change listeners of every open connection of one store.
#[derive(Default)]
pub(crate) struct ListenerTable {
    entries: Vec<Entry>,
}

impl ListenerTable {
    pub(crate) fn add(
        &mut self,
        connection: u64,
        partition: &Partition,
        listener: ChangeListener,
    ) {
        self.entries.push(Entry {
            connection,
            partition: partition.clone(),
            listener,
        });
    }

    pub(crate) fn remove_connection(&mut self, connection: u64) {
        self.entries.retain(|e| e.connection != connection);
    }

    pub(crate) fn count_for_connection(&self, connection: u64) -> usize {
        self.entries
            .iter()
            .filter(|e| e.connection == connection)
            .count()
    }

    /// Listeners to fire for a change in `partition`, in registration order.
    pub(crate) fn for_partition(&self, partition: &Partition) -> Vec<ChangeListener> {
        self.entries
            .iter()
            .filter(|e| &e.partition == partition)
            .map(|e| e.listener.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerTable")
            .field("listeners", &self.entries.len())
            .finish()
    }
}
