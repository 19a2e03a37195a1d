//! Provider lifecycle state machine for postsync.
//!
//! This module provides a pure, side-effect-free state machine for managing
//! the connection lifecycle of a posts provider. The state machine takes
//! events as input and produces a new state plus a list of actions to execute.
//!
//! Every connect attempt is tagged with a [`Generation`]. Only an open result
//! carrying the current generation is installed; anything older is handed
//! back as [`Action::DiscardConnection`] so the caller closes it on arrival.
//!
//! The actual I/O (opening, closing, registering listeners) is performed by
//! posts-client, not by this module.

use std::fmt;

use postsync_types::{Identity, Partition};

/// Monotonically increasing tag of a connect attempt.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Create a Generation with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The generation after this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation({})", self.0)
    }
}

/// The (user, partition) pair a provider is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    /// Authenticated user.
    pub identity: Identity,
    /// Partition to observe.
    pub partition: Partition,
}

impl Session {
    /// Create a session.
    pub fn new(identity: Identity, partition: Partition) -> Self {
        Self {
            identity,
            partition,
        }
    }

    /// Build a session only when both inputs are present.
    pub fn from_parts(identity: Option<Identity>, partition: Option<Partition>) -> Option<Self> {
        Some(Self::new(identity?, partition?))
    }
}

/// Externally visible lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// No user or no partition yet.
    Idle,
    /// Open request in flight.
    Connecting,
    /// Connection installed and cache kept live.
    Connected,
    /// Torn down.
    Closed,
}

/// Lifecycle state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    state: ProviderState,
    generation: Generation,
    session: Option<Session>,
}

impl Lifecycle {
    /// Create a new state machine in the Idle state at generation zero.
    pub fn new() -> Self {
        Self {
            state: ProviderState::Idle,
            generation: Generation::default(),
            session: None,
        }
    }

    /// Current phase.
    pub fn state(&self) -> ProviderState {
        self.state
    }

    /// Generation of the latest connect attempt.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Session the machine was last asked to serve.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.state == ProviderState::Connected
    }

    /// Check if an open request is in flight.
    pub fn is_connecting(&self) -> bool {
        self.state == ProviderState::Connecting
    }

    fn is_active(&self) -> bool {
        matches!(
            self.state,
            ProviderState::Connecting | ProviderState::Connected
        )
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (posts-client)
    /// is responsible for executing the returned actions in order.
    pub fn on_event(mut self, event: Event) -> (Self, Vec<Action>) {
        let mut actions = Vec::new();

        match event {
            Event::SessionChanged { session } => {
                if self.is_active() && session.is_some() && session == self.session {
                    return (self, actions);
                }

                if self.is_active() {
                    self.leave_active(&mut actions, "session changed");
                }

                match session {
                    Some(session) => {
                        self.generation = self.generation.next();
                        self.state = ProviderState::Connecting;
                        actions.push(Action::Open {
                            generation: self.generation,
                            session: session.clone(),
                        });
                        actions.push(Action::EmitEvent(ProviderEvent::Connecting {
                            generation: self.generation,
                            partition: session.partition.clone(),
                        }));
                        self.session = Some(session);
                    }
                    None => {
                        self.session = None;
                    }
                }
            }

            Event::OpenSucceeded { generation } => {
                if self.state == ProviderState::Connecting && generation == self.generation {
                    self.state = ProviderState::Connected;
                    actions.push(Action::InstallConnection { generation });
                    if let Some(session) = &self.session {
                        actions.push(Action::EmitEvent(ProviderEvent::Connected {
                            generation,
                            partition: session.partition.clone(),
                        }));
                    }
                } else {
                    actions.push(Action::DiscardConnection { generation });
                    actions.push(Action::EmitEvent(ProviderEvent::StaleConnectionDiscarded {
                        generation,
                    }));
                }
            }

            Event::OpenFailed { generation, error } => {
                if self.state == ProviderState::Connecting && generation == self.generation {
                    self.state = ProviderState::Idle;
                    actions.push(Action::EmitEvent(ProviderEvent::ConnectionFailed {
                        generation,
                        error,
                    }));
                }
            }

            Event::TeardownRequested => {
                if self.is_active() {
                    self.leave_active(&mut actions, "teardown requested");
                }
                self.state = ProviderState::Closed;
                self.session = None;
            }
        }

        (self, actions)
    }

    /// Leave Connecting/Connected. Bumps the generation so any in-flight
    /// open resolves as stale.
    fn leave_active(&mut self, actions: &mut Vec<Action>, reason: &str) {
        if self.state == ProviderState::Connected {
            actions.push(Action::ReleaseConnection);
        }
        self.generation = self.generation.next();
        self.state = ProviderState::Closed;
        actions.push(Action::EmitEvent(ProviderEvent::Closed {
            reason: reason.to_string(),
        }));
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur in the provider lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Identity and/or partition changed (None when either is absent).
    SessionChanged {
        /// The new session, if complete.
        session: Option<Session>,
    },
    /// An open request resolved with a connection.
    OpenSucceeded {
        /// Generation the request was issued under.
        generation: Generation,
    },
    /// An open request failed (after any retries).
    OpenFailed {
        /// Generation the request was issued under.
        generation: Generation,
        /// Error message describing the failure.
        error: String,
    },
    /// The owning scope is being torn down.
    TeardownRequested,
}

/// Actions to be executed by posts-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Issue an open request for the session.
    Open {
        /// Generation tag for the request.
        generation: Generation,
        /// Session to open.
        session: Session,
    },
    /// Install the just-opened connection as active and register the listener.
    InstallConnection {
        /// Generation of the connection.
        generation: Generation,
    },
    /// Close a just-opened connection without installing it.
    DiscardConnection {
        /// Generation of the stale connection.
        generation: Generation,
    },
    /// Unregister listeners on the active connection, then close it.
    ReleaseConnection,
    /// Emit an event to the application.
    EmitEvent(ProviderEvent),
}

/// Events emitted to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Open request issued.
    Connecting {
        /// Generation of the request.
        generation: Generation,
        /// Partition being opened.
        partition: Partition,
    },
    /// Connection installed.
    Connected {
        /// Generation of the connection.
        generation: Generation,
        /// Partition now observed.
        partition: Partition,
    },
    /// Open failed; provider is Idle.
    ConnectionFailed {
        /// Generation of the failed request.
        generation: Generation,
        /// Error message describing the failure.
        error: String,
    },
    /// A late open result was closed instead of installed.
    StaleConnectionDiscarded {
        /// Generation of the discarded connection.
        generation: Generation,
    },
    /// Active or pending connection torn down.
    Closed {
        /// Reason for the teardown.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user: &str, partition: &str) -> Session {
        Session::new(
            Identity::new(user).unwrap(),
            Partition::new(partition).unwrap(),
        )
    }

    fn connecting(s: Session) -> Lifecycle {
        let (lc, _) = Lifecycle::new().on_event(Event::SessionChanged { session: Some(s) });
        lc
    }

    fn connected(s: Session) -> Lifecycle {
        let lc = connecting(s);
        let generation = lc.generation();
        let (lc, _) = lc.on_event(Event::OpenSucceeded { generation });
        lc
    }

    #[test]
    fn starts_idle() {
        let lc = Lifecycle::new();
        assert_eq!(lc.state(), ProviderState::Idle);
        assert_eq!(lc.generation(), Generation::new(0));
        assert!(lc.session().is_none());
    }

    #[test]
    fn incomplete_session_stays_idle() {
        let (lc, actions) = Lifecycle::new().on_event(Event::SessionChanged { session: None });
        assert_eq!(lc.state(), ProviderState::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn session_from_parts_requires_both() {
        let user = Identity::new("u").unwrap();
        let partition = Partition::new("p").unwrap();
        assert!(Session::from_parts(Some(user.clone()), None).is_none());
        assert!(Session::from_parts(None, Some(partition.clone())).is_none());
        assert!(Session::from_parts(Some(user), Some(partition)).is_some());
    }

    #[test]
    fn session_transitions_to_connecting() {
        let s = session("alice", "alice");
        let (lc, actions) = Lifecycle::new().on_event(Event::SessionChanged {
            session: Some(s.clone()),
        });

        assert_eq!(lc.state(), ProviderState::Connecting);
        assert_eq!(lc.generation(), Generation::new(1));
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::Open { generation, session } if *generation == Generation::new(1) && *session == s
        )));
    }

    #[test]
    fn current_open_success_installs() {
        let lc = connecting(session("alice", "alice"));
        let generation = lc.generation();
        let (lc, actions) = lc.on_event(Event::OpenSucceeded { generation });

        assert_eq!(lc.state(), ProviderState::Connected);
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::InstallConnection { generation: g } if *g == generation)));
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::EmitEvent(ProviderEvent::Connected { .. }))));
    }

    #[test]
    fn stale_open_success_is_discarded() {
        let lc = connecting(session("alice", "p1"));
        let stale = lc.generation();

        // Partition switches while the first open is pending
        let (lc, _) = lc.on_event(Event::SessionChanged {
            session: Some(session("alice", "p2")),
        });
        assert_eq!(lc.generation(), stale.next().next());

        let (lc, actions) = lc.on_event(Event::OpenSucceeded { generation: stale });

        assert_eq!(lc.state(), ProviderState::Connecting);
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::DiscardConnection { generation } if *generation == stale)));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, Action::InstallConnection { .. })));
    }

    #[test]
    fn open_success_after_teardown_is_discarded() {
        let lc = connecting(session("alice", "alice"));
        let generation = lc.generation();
        let (lc, _) = lc.on_event(Event::TeardownRequested);
        let (lc, actions) = lc.on_event(Event::OpenSucceeded { generation });

        assert_eq!(lc.state(), ProviderState::Closed);
        assert!(matches!(
            actions[0],
            Action::DiscardConnection { generation: g } if g == generation
        ));
    }

    #[test]
    fn same_session_is_no_op_while_active() {
        let s = session("alice", "alice");
        let lc = connected(s.clone());
        let before = lc.generation();
        let (lc, actions) = lc.on_event(Event::SessionChanged { session: Some(s) });

        assert_eq!(lc.state(), ProviderState::Connected);
        assert_eq!(lc.generation(), before);
        assert!(actions.is_empty());
    }

    #[test]
    fn partition_change_releases_then_reopens() {
        let lc = connected(session("alice", "p1"));
        let (lc, actions) = lc.on_event(Event::SessionChanged {
            session: Some(session("alice", "p2")),
        });

        assert_eq!(lc.state(), ProviderState::Connecting);
        let release = actions
            .iter()
            .position(|a| matches!(a, Action::ReleaseConnection))
            .expect("release");
        let open = actions
            .iter()
            .position(|a| matches!(a, Action::Open { .. }))
            .expect("open");
        assert!(release < open, "old connection must be released first");
        assert_eq!(lc.session().unwrap().partition.as_str(), "p2");
    }

    #[test]
    fn identity_change_releases_then_reopens() {
        let lc = connected(session("alice", "shared"));
        let (lc, actions) = lc.on_event(Event::SessionChanged {
            session: Some(session("bob", "shared")),
        });
        assert_eq!(lc.state(), ProviderState::Connecting);
        assert!(actions.contains(&Action::ReleaseConnection));
    }

    #[test]
    fn logout_closes_connected() {
        let lc = connected(session("alice", "alice"));
        let (lc, actions) = lc.on_event(Event::SessionChanged { session: None });

        assert_eq!(lc.state(), ProviderState::Closed);
        assert!(actions.contains(&Action::ReleaseConnection));
        assert!(lc.session().is_none());
    }

    #[test]
    fn logout_while_connecting_has_nothing_to_release() {
        let lc = connecting(session("alice", "alice"));
        let (lc, actions) = lc.on_event(Event::SessionChanged { session: None });

        assert_eq!(lc.state(), ProviderState::Closed);
        assert!(!actions.contains(&Action::ReleaseConnection));
    }

    #[test]
    fn teardown_from_connected() {
        let lc = connected(session("alice", "alice"));
        let (lc, actions) = lc.on_event(Event::TeardownRequested);

        assert_eq!(lc.state(), ProviderState::Closed);
        assert!(actions.contains(&Action::ReleaseConnection));
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::EmitEvent(ProviderEvent::Closed { .. }))));
    }

    #[test]
    fn teardown_from_idle_is_quiet() {
        let (lc, actions) = Lifecycle::new().on_event(Event::TeardownRequested);
        assert_eq!(lc.state(), ProviderState::Closed);
        assert!(actions.is_empty());
    }

    #[test]
    fn closed_can_reconnect() {
        let (lc, _) = connected(session("alice", "alice")).on_event(Event::TeardownRequested);
        let (lc, actions) = lc.on_event(Event::SessionChanged {
            session: Some(session("alice", "alice")),
        });
        assert_eq!(lc.state(), ProviderState::Connecting);
        assert!(actions.iter().any(|a| matches!(a, Action::Open { .. })));
    }

    #[test]
    fn current_open_failure_returns_to_idle() {
        let lc = connecting(session("alice", "alice"));
        let generation = lc.generation();
        let (lc, actions) = lc.on_event(Event::OpenFailed {
            generation,
            error: "unreachable".into(),
        });

        assert_eq!(lc.state(), ProviderState::Idle);
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::EmitEvent(ProviderEvent::ConnectionFailed { error, .. }) if error == "unreachable"
        )));
    }

    #[test]
    fn same_session_after_failure_retries() {
        let s = session("alice", "alice");
        let lc = connecting(s.clone());
        let generation = lc.generation();
        let (lc, _) = lc.on_event(Event::OpenFailed {
            generation,
            error: "x".into(),
        });
        let (lc, actions) = lc.on_event(Event::SessionChanged { session: Some(s) });

        assert_eq!(lc.state(), ProviderState::Connecting);
        assert_eq!(lc.generation(), generation.next());
        assert!(actions.iter().any(|a| matches!(a, Action::Open { .. })));
    }

    #[test]
    fn stale_open_failure_is_ignored() {
        let lc = connecting(session("alice", "p1"));
        let stale = lc.generation();
        let (lc, _) = lc.on_event(Event::SessionChanged {
            session: Some(session("alice", "p2")),
        });
        let (lc, actions) = lc.on_event(Event::OpenFailed {
            generation: stale,
            error: "late".into(),
        });

        assert_eq!(lc.state(), ProviderState::Connecting);
        assert!(actions.is_empty());
    }

    #[test]
    fn generations_strictly_increase() {
        let mut lc = Lifecycle::new();
        let mut seen = Vec::new();
        for p in ["a", "b", "c", "d"] {
            let (next, _) = lc.on_event(Event::SessionChanged {
                session: Some(session("u", p)),
            });
            seen.push(next.generation());
            lc = next;
        }
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn generation_next_saturates() {
        assert_eq!(
            Generation::new(u64::MAX).next(),
            Generation::new(u64::MAX)
        );
    }
}
