//! The authoritative session state machine.

use strum::{Display, EnumString};

use crate::user::UserRecord;

mod controller;
mod registration;

pub use controller::SessionController;
pub use registration::RegistrationForm;

/// States of the session lifecycle.
///
/// `Unknown` is the initial state before restoration has been attempted.
/// `Restoring`, `Authenticating`, and `Registering` are transient and
/// resolve to either `Authenticated` or `Anonymous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    /// Process start; restoration has not run yet.
    Unknown,
    /// A stored token is being revalidated against the identity service.
    Restoring,
    /// A login call is in flight.
    Authenticating,
    /// A registration call is in flight.
    Registering,
    /// A token and user record are established.
    Authenticated,
    /// No session.
    Anonymous,
}

/// A point-in-time copy of the session.
///
/// `user` is trustworthy only while `token` is present; the reverse is
/// not required (a token may exist with no cached user, pending
/// validation). Identity-bearing responses overwrite the fields
/// wholesale, and teardown clears them together.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current lifecycle state.
    pub state: SessionState,
    /// The bearer token, if any.
    pub token: Option<String>,
    /// The current user record, if any.
    pub user: Option<UserRecord>,
    /// True while a session-changing operation is in flight.
    pub loading: bool,
    /// Message from the most recent failed operation.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// The empty, signed-out snapshot.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            token: None,
            user: None,
            loading: false,
            last_error: None,
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Unknown,
            token: None,
            user: None,
            loading: false,
            last_error: None,
        }
    }
}
