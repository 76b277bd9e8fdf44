//! Verification challenge between a navigation request and its execution.
//!
//! Sensitive destinations are reached only through the gate: a request
//! parks the destination, the host collects a verification code, and the
//! stored navigation fires only on an exact allow-list match.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::navigate::{NavigationFlags, Navigator};

/// Codes the gate accepts. Demo fixture; a production deployment would
/// verify server-side.
pub const VALID_VERIFICATION_CODES: [&str; 3] = ["123456", "654321", "112233"];

/// Shown when the submitted code is blank.
pub const EMPTY_CODE_MESSAGE: &str = "Please enter a verification code";
/// Shown when the submitted code matches no allow-list entry.
pub const INVALID_CODE_MESSAGE: &str = "Invalid verification code";

/// Whether the gate is waiting for a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No challenge in progress.
    Idle,
    /// A navigation is parked awaiting a verification code.
    Challenging,
}

/// The navigation parked behind the active challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNavigation {
    /// Destination to navigate to once verified.
    pub target_path: String,
    /// Whether the destination should open its detail view on arrival.
    pub open: bool,
}

/// The latest code submission and its rejection message, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationAttempt {
    /// The code as submitted, after trimming.
    pub submitted_code: String,
    /// Why the code was rejected; `None` after acceptance.
    pub error_message: Option<String>,
}

/// Result of a code submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The code matched; navigation to the contained path was issued.
    Navigated(String),
    /// The code was rejected; the gate remains in `Challenging`.
    Rejected,
}

struct GateInner {
    state: GateState,
    pending: Option<PendingNavigation>,
    attempt: Option<VerificationAttempt>,
}

/// Gates navigation to sensitive destinations behind a verification code.
///
/// Only one challenge is active at a time; a new request while
/// challenging replaces the parked destination, so the most recent
/// request wins.
pub struct NavigationGate {
    navigator: Arc<dyn Navigator>,
    inner: Mutex<GateInner>,
}

impl NavigationGate {
    /// Creates an idle gate over the host navigator.
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            inner: Mutex::new(GateInner {
                state: GateState::Idle,
                pending: None,
                attempt: None,
            }),
        }
    }

    /// Parks a navigation behind a verification challenge.
    ///
    /// Replaces any previously parked destination and clears the record
    /// of earlier attempts.
    pub fn request_navigation(&self, target_path: &str, open: bool) {
        let mut inner = self.lock_inner();
        inner.state = GateState::Challenging;
        inner.pending = Some(PendingNavigation {
            target_path: target_path.to_string(),
            open,
        });
        inner.attempt = None;
    }

    /// Submits a verification code for the active challenge.
    ///
    /// The code is trimmed before matching. A blank or unrecognized code
    /// records a rejection and leaves the gate challenging; a match
    /// navigates to the parked destination and resets the gate to idle.
    /// Submitting while idle is a no-op rejection.
    pub fn submit(&self, code: &str) -> SubmitOutcome {
        let code = code.trim();
        let mut inner = self.lock_inner();

        if inner.state != GateState::Challenging {
            return SubmitOutcome::Rejected;
        }

        if code.is_empty() {
            inner.attempt = Some(VerificationAttempt {
                submitted_code: String::new(),
                error_message: Some(EMPTY_CODE_MESSAGE.to_string()),
            });
            return SubmitOutcome::Rejected;
        }

        if !VALID_VERIFICATION_CODES.contains(&code) {
            log::debug!("verification code rejected");
            inner.attempt = Some(VerificationAttempt {
                submitted_code: code.to_string(),
                error_message: Some(INVALID_CODE_MESSAGE.to_string()),
            });
            return SubmitOutcome::Rejected;
        }

        let Some(pending) = inner.pending.take() else {
            inner.state = GateState::Idle;
            return SubmitOutcome::Rejected;
        };
        inner.state = GateState::Idle;
        inner.attempt = None;
        drop(inner);

        self.navigator.navigate(
            &pending.target_path,
            NavigationFlags { show_login: false },
        );
        SubmitOutcome::Navigated(pending.target_path)
    }

    /// Abandons the active challenge without navigating.
    pub fn cancel(&self) {
        let mut inner = self.lock_inner();
        inner.state = GateState::Idle;
        inner.pending = None;
        inner.attempt = None;
    }

    /// Whether the gate is currently challenging.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.lock_inner().state
    }

    /// The parked navigation, if a challenge is active.
    #[must_use]
    pub fn pending(&self) -> Option<PendingNavigation> {
        self.lock_inner().pending.clone()
    }

    /// The most recent rejected attempt, if any.
    #[must_use]
    pub fn last_attempt(&self) -> Option<VerificationAttempt> {
        self.lock_inner().attempt.clone()
    }

    fn lock_inner(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
