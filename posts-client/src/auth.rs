//! Authentication capability.
//!
//! Authentication itself is external; the provider only needs to know who
//! is signed in and to be able to sign them out.

use parking_lot::RwLock;
use postsync_core::{Route, Screen};
use postsync_types::Identity;

/// Source of the signed-in user.
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<Identity>;

    /// Sign the current user out.
    fn log_out(&self);

    /// Route `requested` through the login gate.
    fn route(&self, requested: Screen) -> Route {
        Route::resolve(self.current_user().as_ref(), requested)
    }
}

/// In-memory auth state.
#[derive(Debug, Default)]
pub struct SessionAuth {
    user: RwLock<Option<Identity>>,
}

impl SessionAuth {
    /// Start signed out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start signed in as `user`.
    pub fn signed_in(user: Identity) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    /// Sign in as `user`, replacing any current user.
    pub fn log_in(&self, user: Identity) {
        *self.user.write() = Some(user);
    }
}

impl AuthProvider for SessionAuth {
    fn current_user(&self) -> Option<Identity> {
        self.user.read().clone()
    }

    fn log_out(&self) {
        *self.user.write() = None;
    }
}
