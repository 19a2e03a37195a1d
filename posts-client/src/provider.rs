//! The posts provider.
//!
//! Owns at most one connection to the sync store, scoped to the signed-in
//! user's partition, and keeps a live snapshot of that partition's posts.
//! Lifecycle decisions come from [`Lifecycle`]; this module only performs
//! the I/O those decisions ask for.

use crate::config::Settings;
use crate::observer::{ObserverRegistry, Subscription};
use crate::store::{Connection, OpenConfig, StoreError, SyncStore};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use postsync_core::{
    Action, Event, Generation, Lifecycle, OpenPolicy, ProviderEvent, ProviderState, Session,
    Snapshot, Transaction,
};
use postsync_types::{Identity, Partition, Post, PostId, PostStatus};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Capacity of the provider event channel.
const EVENT_CAPACITY: usize = 64;

/// Provider errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No connection is installed.
    #[error("not connected")]
    NotConnected,

    /// Status name is not one of the known statuses.
    #[error("invalid status: {0:?}")]
    InvalidStatus(String),

    /// No user or no partition to open.
    #[error("no session: sign in first")]
    NoSession,

    /// A newer session replaced this open before it completed.
    #[error("superseded by a newer session")]
    Superseded,

    /// The same session is still being opened by an earlier call.
    #[error("already connecting to this session")]
    AlreadyConnecting,

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The connection currently backing the provider.
struct Active {
    generation: Generation,
    connection: Arc<dyn Connection>,
}

struct Shared {
    lifecycle: tokio::sync::Mutex<Lifecycle>,
    active: Mutex<Option<Active>>,
    snapshot: RwLock<Snapshot>,
    /// Held while a snapshot is stored and delivered, so teardown cannot
    /// interleave with a listener firing. Lock order: publish, active, snapshot.
    publish: ReentrantMutex<()>,
    observers: Arc<ObserverRegistry>,
    events: broadcast::Sender<ProviderEvent>,
}

impl Shared {
    /// Replace the snapshot with `posts` if `generation` is still installed.
    fn refresh(&self, generation: Generation, partition: &Partition, posts: Vec<Post>) {
        let _publish = self.publish.lock();
        let snapshot = {
            let active = self.active.lock();
            if active.as_ref().map(|a| a.generation) != Some(generation) {
                tracing::debug!(%generation, "ignoring change from stale connection");
                return;
            }
            let snapshot = Snapshot::for_partition(generation, partition, posts);
            *self.snapshot.write() = snapshot.clone();
            snapshot
        };
        self.observers.notify(&snapshot);
    }

    /// Uninstall the connection and publish the empty snapshot.
    ///
    /// Once this returns no listener of the old connection can change the
    /// snapshot or reach an observer.
    fn take_active(&self) -> Option<Active> {
        let _publish = self.publish.lock();
        let taken = {
            let mut active = self.active.lock();
            let taken = active.take();
            if taken.is_some() {
                *self.snapshot.write() = Snapshot::empty();
            }
            taken
        };
        if taken.is_some() {
            self.observers.notify(&Snapshot::empty());
        }
        taken
    }

    fn emit(&self, event: ProviderEvent) {
        match &event {
            ProviderEvent::Connecting {
                generation,
                partition,
            } => tracing::debug!(%generation, %partition, "opening partition"),
            ProviderEvent::Connected {
                generation,
                partition,
            } => tracing::info!(%generation, %partition, "connected"),
            ProviderEvent::ConnectionFailed { generation, error } => {
                tracing::warn!(%generation, "open failed: {}", error)
            }
            ProviderEvent::StaleConnectionDiscarded { generation } => {
                tracing::warn!(%generation, "discarding stale connection")
            }
            ProviderEvent::Closed { reason } => tracing::info!("closed: {}", reason),
        }
        // No receivers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.connection.remove_all_listeners();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = active.connection.close().await;
                });
            }
        }
    }
}

/// Live view of one partition plus the mutations on it.
///
/// Clones share the same connection and snapshot.
pub struct PostsProvider<S: SyncStore + 'static> {
    store: Arc<S>,
    policy: OpenPolicy,
    default_name: Option<String>,
    shared: Arc<Shared>,
}

impl<S: SyncStore + 'static> Clone for PostsProvider<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
            default_name: self.default_name.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: SyncStore + 'static> std::fmt::Debug for PostsProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostsProvider")
            .field("policy", &self.policy)
            .field("posts", &self.shared.snapshot.read().len())
            .field("observers", &self.shared.observers)
            .finish()
    }
}

impl<S: SyncStore + 'static> PostsProvider<S> {
    /// Create an idle provider over `store` with the default open policy.
    pub fn new(store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(store),
            policy: OpenPolicy::new(),
            default_name: None,
            shared: Arc::new(Shared {
                lifecycle: tokio::sync::Mutex::new(Lifecycle::new()),
                active: Mutex::new(None),
                snapshot: RwLock::new(Snapshot::empty()),
                publish: ReentrantMutex::new(()),
                observers: Arc::new(ObserverRegistry::default()),
                events,
            }),
        }
    }

    /// Create a provider configured from `settings`.
    pub fn from_settings(store: S, settings: &Settings) -> Self {
        let mut provider = Self::new(store).with_policy(settings.open_policy());
        provider.default_name = settings.default_name().map(str::to_string);
        provider
    }

    /// Set the open policy.
    pub fn with_policy(mut self, policy: OpenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The store this provider opens connections on.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ===========================================
    // Lifecycle
    // ===========================================

    /// Point the provider at a new (user, partition) pair and wait for the
    /// connection.
    ///
    /// Any previous connection is released first. With no session nothing
    /// is opened and `NoSession` is returned.
    pub async fn open_session(&self, session: Option<Session>) -> Result<(), ProviderError> {
        let opens = self.handle(Event::SessionChanged { session }, None).await;
        if opens.is_empty() {
            let lifecycle = self.shared.lifecycle.lock().await;
            return match lifecycle.session() {
                // Same session requested again
                Some(_) if lifecycle.is_connected() => Ok(()),
                // Still being opened by an earlier call
                Some(_) => Err(ProviderError::AlreadyConnecting),
                None => Err(ProviderError::NoSession),
            };
        }

        let mut result = Ok(());
        for (generation, session) in opens {
            result = self.connect(generation, session).await;
        }
        result
    }

    /// Like [`open_session`](Self::open_session) but runs in the background.
    ///
    /// Both inputs must be present for a connection to be opened.
    pub fn set_session(
        &self,
        identity: Option<Identity>,
        partition: Option<Partition>,
    ) -> JoinHandle<Result<(), ProviderError>> {
        let provider = self.clone();
        let session = Session::from_parts(identity, partition);
        tokio::spawn(async move {
            let result = provider.open_session(session).await;
            match &result {
                Ok(()) => {}
                Err(
                    ProviderError::NoSession
                    | ProviderError::Superseded
                    | ProviderError::AlreadyConnecting,
                ) => {
                    tracing::debug!("session not opened: {:?}", result)
                }
                Err(e) => tracing::warn!("session open failed: {}", e),
            }
            result
        })
    }

    /// Release the connection and unregister its listener.
    pub async fn close(&self) {
        self.handle(Event::TeardownRequested, None).await;
    }

    /// Current lifecycle phase.
    pub async fn state(&self) -> ProviderState {
        self.shared.lifecycle.lock().await.state()
    }

    /// Generation of the latest connect attempt.
    pub async fn generation(&self) -> Generation {
        self.shared.lifecycle.lock().await.generation()
    }

    /// Partition of the installed connection.
    pub fn partition(&self) -> Option<Partition> {
        self.shared
            .active
            .lock()
            .as_ref()
            .map(|a| a.connection.partition().clone())
    }

    /// Check if a connection is installed.
    pub fn is_connected(&self) -> bool {
        self.shared.active.lock().is_some()
    }

    async fn connect(&self, generation: Generation, session: Session) -> Result<(), ProviderError> {
        let config = OpenConfig::from(&session);
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(self.policy.timeout, self.store.open(&config))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout),
            };

            let error = match result {
                Ok(connection) => {
                    self.handle(Event::OpenSucceeded { generation }, Some(connection))
                        .await;
                    let installed = self.shared.active.lock().as_ref().map(|a| a.generation);
                    return if installed == Some(generation) {
                        Ok(())
                    } else {
                        Err(ProviderError::Superseded)
                    };
                }
                Err(e) => e,
            };

            if !self.is_current(generation).await {
                return Err(ProviderError::Superseded);
            }

            if attempt >= self.policy.max_attempts() {
                self.handle(
                    Event::OpenFailed {
                        generation,
                        error: error.to_string(),
                    },
                    None,
                )
                .await;
                return Err(error.into());
            }

            let delay = self.policy.delay_before(attempt);
            tracing::warn!(
                %generation,
                attempt,
                "open failed: {}, retrying in {:?}",
                error,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;

            if !self.is_current(generation).await {
                return Err(ProviderError::Superseded);
            }
        }
    }

    async fn is_current(&self, generation: Generation) -> bool {
        let lifecycle = self.shared.lifecycle.lock().await;
        lifecycle.is_connecting() && lifecycle.generation() == generation
    }

    /// Run one event through the state machine and execute its actions.
    ///
    /// Returns the open requests the caller has to issue. Connections to
    /// close are closed after the lifecycle lock is released.
    async fn handle(
        &self,
        event: Event,
        mut opened: Option<Arc<dyn Connection>>,
    ) -> Vec<(Generation, Session)> {
        let mut opens = Vec::new();
        let mut to_close: Vec<Arc<dyn Connection>> = Vec::new();

        {
            let mut lifecycle = self.shared.lifecycle.lock().await;
            tracing::debug!(?event, state = ?lifecycle.state(), "lifecycle event");
            let (next, actions) = lifecycle.clone().on_event(event);
            *lifecycle = next;

            for action in actions {
                match action {
                    Action::Open {
                        generation,
                        session,
                    } => opens.push((generation, session)),
                    Action::InstallConnection { generation } => {
                        if let Some(connection) = opened.take() {
                            self.install(generation, connection);
                        }
                    }
                    Action::DiscardConnection { .. } => {
                        if let Some(connection) = opened.take() {
                            to_close.push(connection);
                        }
                    }
                    Action::ReleaseConnection => {
                        if let Some(active) = self.shared.take_active() {
                            to_close.push(active.connection);
                        }
                    }
                    Action::EmitEvent(event) => self.shared.emit(event),
                }
            }
        }

        for connection in to_close {
            connection.remove_all_listeners();
            if let Err(e) = connection.close().await {
                tracing::warn!("failed to close connection: {}", e);
            }
        }

        opens
    }

    /// Register the change listener and take the initial snapshot.
    fn install(&self, generation: Generation, connection: Arc<dyn Connection>) {
        let partition = connection.partition().clone();
        let weak = Arc::downgrade(&self.shared);
        let listener_partition = partition.clone();
        connection.add_listener(Arc::new(move |posts: &[Post]| {
            if let Some(shared) = weak.upgrade() {
                shared.refresh(generation, &listener_partition, posts.to_vec());
            }
        }));

        *self.shared.active.lock() = Some(Active {
            generation,
            connection: Arc::clone(&connection),
        });
        self.shared
            .refresh(generation, &partition, connection.objects());
    }

    // ===========================================
    // Reads
    // ===========================================

    /// Current snapshot. Empty while not connected.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot.read().clone()
    }

    /// Current posts, in store order.
    pub fn items(&self) -> Vec<Post> {
        self.snapshot().posts().to_vec()
    }

    /// Call `observer` with every new snapshot until the returned guard is dropped.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.shared.observers.register(Arc::new(observer))
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.shared.observers.len()
    }

    /// Receive lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.shared.events.subscribe()
    }

    // ===========================================
    // Mutations
    // ===========================================

    fn connection(&self) -> Result<Arc<dyn Connection>, ProviderError> {
        self.shared
            .active
            .lock()
            .as_ref()
            .map(|a| Arc::clone(&a.connection))
            .ok_or(ProviderError::NotConnected)
    }

    /// Create a post in the provider's partition.
    ///
    /// A blank name falls back to the configured default name.
    pub async fn create(&self, name: &str, description: &str) -> Result<PostId, ProviderError> {
        let connection = self.connection()?;
        let name = match &self.default_name {
            Some(default) if name.trim().is_empty() => default.as_str(),
            _ => name,
        };
        let post = Post::new(connection.partition().clone(), name, description);
        let id = post.id;
        connection.write(Transaction::new().create(post)).await?;
        tracing::debug!(id = %id.short(), "created post");
        Ok(id)
    }

    /// Change a post's status.
    pub async fn set_status(&self, post: &Post, status: PostStatus) -> Result<(), ProviderError> {
        let connection = self.connection()?;
        connection
            .write(Transaction::new().set_status(post.id, status))
            .await?;
        tracing::debug!(id = %post.id.short(), %status, "status changed");
        Ok(())
    }

    /// Change a post's status by name.
    ///
    /// The name is validated before anything else; an unknown name fails
    /// with `InvalidStatus` even when not connected.
    pub async fn set_status_named(&self, post: &Post, status: &str) -> Result<(), ProviderError> {
        let status: PostStatus = status
            .parse()
            .map_err(|_| ProviderError::InvalidStatus(status.to_string()))?;
        self.set_status(post, status).await
    }

    /// Delete a post.
    pub async fn delete(&self, post: &Post) -> Result<(), ProviderError> {
        let connection = self.connection()?;
        connection.write(Transaction::new().delete(post.id)).await?;
        tracing::debug!(id = %post.id.short(), "deleted post");
        Ok(())
    }
}
