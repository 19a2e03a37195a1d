//! Post status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PostError;

/// Workflow status of a post.
///
/// Serialized by its canonical name (`"Open"`, `"InProgress"`, `"Complete"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PostStatus {
    /// Newly created, not started.
    #[default]
    Open,
    /// Being worked on.
    InProgress,
    /// Done.
    Complete,
}

impl PostStatus {
    /// Every status, in menu order.
    pub const ALL: [PostStatus; 3] = [Self::Open, Self::InProgress, Self::Complete];

    /// Canonical stored name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "InProgress",
            Self::Complete => "Complete",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Complete => "Complete",
        }
    }

    /// The two statuses a post in this status can move to.
    pub fn others(self) -> impl Iterator<Item = PostStatus> {
        Self::ALL.into_iter().filter(move |s| *s != self)
    }
}

impl FromStr for PostStatus {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "InProgress" => Ok(Self::InProgress),
            "Complete" => Ok(Self::Complete),
            other => Err(PostError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
