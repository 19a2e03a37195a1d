//! Screens and auth-gated routing.
//!
//! Every screen except the login screen requires a signed-in user. The
//! routing decision is pure; the navigation framework itself sits behind
//! the [`Navigator`] trait.

use std::fmt;
use std::str::FromStr;

use postsync_types::Identity;

/// Application screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Posts of the user's own partition.
    Feed,
    /// Posts list reached from the friends tab.
    Friends,
    /// Form for a new post.
    CreatePost,
    /// Profile landing page.
    Home,
    /// Shown whenever no user is signed in.
    LogIn,
}

impl Screen {
    /// Screens reachable from the footer, in footer order.
    pub const FOOTER: [Screen; 4] = [Self::Feed, Self::Home, Self::Friends, Self::CreatePost];

    /// Route name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Feed => "Feed",
            Self::Friends => "Friends",
            Self::CreatePost => "Create Post",
            Self::Home => "Home",
            Self::LogIn => "Log In",
        }
    }

    /// Whether this screen needs a mounted posts provider.
    pub fn mounts_provider(&self) -> bool {
        matches!(self, Self::Feed | Self::Friends | Self::CreatePost)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Feed,
            Self::Friends,
            Self::CreatePost,
            Self::Home,
            Self::LogIn,
        ]
        .into_iter()
        .find(|screen| screen.name().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown screen: {s}"))
    }
}

/// Outcome of routing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Screen actually shown.
    pub screen: Screen,
    /// Screen that was asked for.
    pub requested: Screen,
}

impl Route {
    /// Initial screen of the app.
    pub const INITIAL: Screen = Screen::Feed;

    /// Gate `requested` on the presence of a user.
    pub fn resolve(current_user: Option<&Identity>, requested: Screen) -> Self {
        let screen = match current_user {
            Some(_) => requested,
            None => Screen::LogIn,
        };
        Self { screen, requested }
    }

    /// Check if the user was redirected to the login screen.
    pub fn is_gated(&self) -> bool {
        self.screen == Screen::LogIn && self.requested != Screen::LogIn
    }
}

/// Navigation capability.
pub trait Navigator {
    /// Switch to `screen`.
    fn navigate(&mut self, screen: Screen);
}

/// Navigator that records every navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    visited: Vec<Screen>,
}

impl History {
    /// Start at the initial screen.
    pub fn new() -> Self {
        Self {
            visited: vec![Route::INITIAL],
        }
    }

    /// Current screen.
    pub fn current(&self) -> Option<Screen> {
        self.visited.last().copied()
    }

    /// All visited screens, oldest first.
    pub fn visited(&self) -> &[Screen] {
        &self.visited
    }
}

impl Navigator for History {
    fn navigate(&mut self, screen: Screen) {
        self.visited.push(screen);
    }
}
