//! List-row presentation of a post.

use postsync_types::{Post, PostId, PostStatus};

/// Check mark shown on completed posts.
pub const COMPLETE_BADGE: &str = "\u{2714}";

/// What a list renders for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    /// Post the row stands for.
    pub id: PostId,
    /// Post name.
    pub title: String,
    /// Post description.
    pub subtitle: String,
    /// Status marker; Open posts carry none.
    pub badge: Option<&'static str>,
}

impl PostRow {
    /// Build the row for `post`.
    pub fn from_post(post: &Post) -> Self {
        let badge = match post.status {
            PostStatus::Complete => Some(COMPLETE_BADGE),
            PostStatus::InProgress => Some("In Progress"),
            PostStatus::Open => None,
        };
        Self {
            id: post.id,
            title: post.name.clone(),
            subtitle: post.description.clone(),
            badge,
        }
    }
}
