//! # posts-core
//!
//! Pure logic for postsync (no I/O, instant tests).
//!
//! This crate implements the provider lifecycle state machine and the
//! view-level wiring for the posts list without any network or disk I/O,
//! enabling fast unit tests.
//!
//! ## Layout
//!
//! - [`lifecycle`]: connection lifecycle as events in, actions out
//! - [`transaction`]: all-or-nothing write batches over a record list
//! - [`snapshot`]: immutable views handed to observers
//! - [`menu`], [`row`], [`nav`]: what the views show and where they route
//!
//! Opening connections and writing to the store happen in `posts-client`,
//! which executes the [`Action`]s the lifecycle returns.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lifecycle;
pub mod menu;
pub mod nav;
pub mod policy;
pub mod row;
pub mod snapshot;
pub mod transaction;

pub use lifecycle::{Action, Event, Generation, Lifecycle, ProviderEvent, ProviderState, Session};
pub use menu::{ActionMenu, MenuEntry, PostAction};
pub use nav::{History, Navigator, Route, Screen};
pub use policy::OpenPolicy;
pub use row::{PostRow, COMPLETE_BADGE};
pub use snapshot::Snapshot;
pub use transaction::{Transaction, TransactionError, WriteOp};
