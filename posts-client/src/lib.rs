//! # postsync-client
//!
//! Posts provider for postsync: keeps one connection to a synced store,
//! scoped to the signed-in user's partition, and exposes a live snapshot of
//! that partition's posts plus create/set-status/delete.
//!
//! ## Features
//!
//! - **Store Abstraction**: Pluggable sync store (file-backed, mock)
//! - **Generation Counter**: Late open results are closed, never installed
//! - **Scoped Observers**: `subscribe` returns a guard that unregisters on drop
//! - **Pure State Machine**: Uses postsync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use postsync_client::{FileStore, PostsProvider};
//! use postsync_core::Session;
//!
//! let provider = PostsProvider::new(FileStore::new("data"));
//! provider.open_session(Some(Session::new(user, partition))).await?;
//!
//! let id = provider.create("Groceries", "milk, eggs").await?;
//! for post in provider.items() {
//!     println!("{} {}", post.id.short(), post.name);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actions;
pub mod auth;
pub mod config;
pub mod observer;
pub mod provider;
pub mod store;

pub use actions::dispatch;
pub use auth::{AuthProvider, SessionAuth};
pub use config::{ConfigError, OpenSettings, PostsSettings, Settings, SETTINGS_FILE};
pub use observer::{Observer, Subscription};
pub use provider::{PostsProvider, ProviderError};
pub use store::{
    ChangeListener, Connection, FileStore, MockStore, OpenConfig, StoreError, SyncStore,
};
