//! Snapshot observers with scoped registration.

use parking_lot::Mutex;
use postsync_core::Snapshot;
use std::sync::{Arc, Weak};

/// Callback invoked with every new snapshot.
pub type Observer = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    inner: Mutex<Registered>,
}

#[derive(Default)]
struct Registered {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
}

impl ObserverRegistry {
    pub(crate) fn register(self: &Arc<Self>, observer: Observer) -> Subscription {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.observers.push((id, observer));
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn unregister(&self, id: u64) {
        self.inner.lock().observers.retain(|(i, _)| *i != id);
    }

    /// Call every observer in registration order.
    ///
    /// Runs outside the registry lock so observers may subscribe or drop
    /// their own subscription.
    pub(crate) fn notify(&self, snapshot: &Snapshot) {
        let observers: Vec<Observer> = self
            .inner
            .lock()
            .observers
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer(snapshot);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().observers.len()
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

/// Registration guard returned by `PostsProvider::subscribe`.
///
/// The observer stays registered until the guard is dropped.
#[must_use = "dropping a Subscription unregisters the observer"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<ObserverRegistry>,
}

impl Subscription {
    /// Unregister now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_registered_observers() {
        let registry = Arc::new(ObserverRegistry::default());
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        let _sub = registry.register(Arc::new(move |_| *sink.lock() += 1));

        registry.notify(&Snapshot::empty());
        registry.notify(&Snapshot::empty());

        assert_eq!(*hits.lock(), 2);
    }

    #[test]
    fn drop_unregisters() {
        let registry = Arc::new(ObserverRegistry::default());
        let a = registry.register(Arc::new(|_| {}));
        let b = registry.register(Arc::new(|_| {}));
        assert_eq!(registry.len(), 2);

        drop(a);
        assert_eq!(registry.len(), 1);
        b.unsubscribe();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let registry = Arc::new(ObserverRegistry::default());
        let sub = registry.register(Arc::new(|_| {}));
        drop(registry);
        drop(sub);
    }
}
