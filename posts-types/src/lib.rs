//! # posts-types
//!
//! Item schema for the postsync shared posts list.
//!
//! This crate provides the foundational types used across all postsync crates:
//! - [`Post`] - The synced item, keyed by [`PostId`] and scoped to a [`Partition`]
//! - [`PostStatus`] - The closed set of item statuses
//! - [`Identity`], [`Timestamp`] - Authenticated user and creation time
//! - [`PostError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod post;
mod status;

pub use error::PostError;
pub use ids::{Identity, Partition, PostId, Timestamp};
pub use post::{decode_records, encode_records, Post, DEFAULT_POST_NAME};
pub use status::PostStatus;
