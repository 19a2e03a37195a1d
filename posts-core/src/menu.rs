//! Action menu shown when a post is selected.
//!
//! The menu offers deletion plus a move to each of the two statuses the post
//! is not currently in, then a trailing cancel entry.

use postsync_types::{Post, PostStatus};

/// What selecting a menu entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    /// Delete the post.
    Delete,
    /// Move the post to a status.
    SetStatus(PostStatus),
    /// Close the menu.
    Cancel,
}

impl PostAction {
    /// Menu title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Delete => "Delete",
            Self::SetStatus(PostStatus::Open) => "Mark Open",
            Self::SetStatus(PostStatus::InProgress) => "Mark In Progress",
            Self::SetStatus(PostStatus::Complete) => "Mark Complete",
            Self::Cancel => "Cancel",
        }
    }
}

/// A titled menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    /// Title shown to the user.
    pub title: &'static str,
    /// Action triggered on selection.
    pub action: PostAction,
}

/// Menu for a single post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMenu {
    entries: Vec<MenuEntry>,
}

impl ActionMenu {
    /// Build the menu for `post`.
    pub fn for_post(post: &Post) -> Self {
        let actions = std::iter::once(PostAction::Delete)
            .chain(post.status.others().map(PostAction::SetStatus))
            .chain(std::iter::once(PostAction::Cancel));

        Self {
            entries: actions
                .map(|action| MenuEntry {
                    title: action.title(),
                    action,
                })
                .collect(),
        }
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Find an entry by title (case-insensitive).
    pub fn find(&self, title: &str) -> Option<&MenuEntry> {
        self.entries
            .iter()
            .find(|e| e.title.eq_ignore_ascii_case(title.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postsync_types::Partition;

    fn post_with(status: PostStatus) -> Post {
        let mut post = Post::new(Partition::new("p").unwrap(), "a", "");
        post.status = status;
        post
    }

    fn titles(menu: &ActionMenu) -> Vec<&'static str> {
        menu.entries().iter().map(|e| e.title).collect()
    }

    #[test]
    fn open_post_menu() {
        let menu = ActionMenu::for_post(&post_with(PostStatus::Open));
        assert_eq!(
            titles(&menu),
            vec!["Delete", "Mark In Progress", "Mark Complete", "Cancel"]
        );
    }

    #[test]
    fn in_progress_post_menu() {
        let menu = ActionMenu::for_post(&post_with(PostStatus::InProgress));
        assert_eq!(
            titles(&menu),
            vec!["Delete", "Mark Open", "Mark Complete", "Cancel"]
        );
    }

    #[test]
    fn complete_post_menu() {
        let menu = ActionMenu::for_post(&post_with(PostStatus::Complete));
        assert_eq!(
            titles(&menu),
            vec!["Delete", "Mark Open", "Mark In Progress", "Cancel"]
        );
    }

    #[test]
    fn never_offers_current_status() {
        for status in PostStatus::ALL {
            let menu = ActionMenu::for_post(&post_with(status));
            assert!(!menu
                .entries()
                .iter()
                .any(|e| e.action == PostAction::SetStatus(status)));
        }
    }

    #[test]
    fn find_by_title() {
        let menu = ActionMenu::for_post(&post_with(PostStatus::Open));
        assert_eq!(
            menu.find("mark complete").map(|e| e.action),
            Some(PostAction::SetStatus(PostStatus::Complete))
        );
        assert!(menu.find("Mark Open").is_none());
    }
}
