//! Route guard: redirects unauthenticated visitors away from protected
//! paths.

use std::sync::Arc;

use crate::navigate::{NavigationFlags, Navigator};
use crate::storage::CredentialVault;

/// Where unauthenticated visitors are sent.
pub const LANDING_PATH: &str = "/";

/// Paths reachable without a session.
///
/// `/reset-password` matches by prefix because reset links carry the
/// token as a path segment.
pub const AUTH_ENTRY_PATHS: [&str; 4] = [
    "/register",
    "/forgot-password",
    "/reset-password",
    "/recover-username",
];

/// Outcome of evaluating a route against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The visitor may stay.
    Allow,
    /// The visitor must be redirected.
    Redirect {
        /// Destination of the redirect.
        to: String,
        /// Ask the host to surface its login UI on arrival.
        show_login: bool,
    },
}

/// Evaluates whether `path` is reachable given the session.
///
/// While `loading` is true no decision is forced: redirecting mid-restore
/// would bounce a user whose stored session is about to validate.
#[must_use]
pub fn evaluate_route(path: &str, authenticated: bool, loading: bool) -> RouteDecision {
    if loading || authenticated {
        return RouteDecision::Allow;
    }
    if path == LANDING_PATH || is_auth_entry(path) {
        return RouteDecision::Allow;
    }
    RouteDecision::Redirect {
        to: LANDING_PATH.to_string(),
        show_login: true,
    }
}

fn is_auth_entry(path: &str) -> bool {
    AUTH_ENTRY_PATHS.iter().any(|entry| {
        if *entry == "/reset-password" {
            path == *entry || path.starts_with("/reset-password/")
        } else {
            path == *entry
        }
    })
}

/// Enforces [`evaluate_route`] through the host navigator.
///
/// Authentication is read from durable storage rather than in-memory
/// state, so the answer is reload-safe and independent of any operation
/// currently suspended at a network call.
pub struct RouteGuard {
    vault: Arc<CredentialVault>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    /// Creates a guard over the vault and host navigator.
    #[must_use]
    pub fn new(vault: Arc<CredentialVault>, navigator: Arc<dyn Navigator>) -> Self {
        Self { vault, navigator }
    }

    /// Checks `path` and performs the redirect when one is required.
    ///
    /// Returns the decision so hosts can also cancel their own pending
    /// render.
    pub fn check(&self, path: &str, loading: bool) -> RouteDecision {
        let decision = evaluate_route(path, self.vault.has_credentials(), loading);
        if let RouteDecision::Redirect { to, show_login } = &decision {
            log::info!("redirecting unauthenticated visit to {path}");
            self.navigator.navigate(to, NavigationFlags {
                show_login: *show_login,
            });
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::navigate::test_support::RecordingNavigator;
    use crate::storage::MemoryStore;
    use crate::user::UserRecord;

    #[test_case("/", false; "landing is public")]
    #[test_case("/register", false; "register is public")]
    #[test_case("/forgot-password", false; "forgot password is public")]
    #[test_case("/recover-username", false; "recover username is public")]
    #[test_case("/reset-password/abc123", false; "reset link with token is public")]
    #[test_case("/accounts", true; "accounts is protected")]
    #[test_case("/profile", true; "profile is protected")]
    #[test_case("/register/extra", true; "entry paths do not prefix-match")]
    fn test_unauthenticated_route_decisions(path: &str, redirected: bool) {
        let decision = evaluate_route(path, false, false);
        assert_eq!(
            matches!(decision, RouteDecision::Redirect { .. }),
            redirected
        );
    }

    #[test]
    fn test_authenticated_visitor_is_never_redirected() {
        for path in ["/", "/accounts", "/profile", "/register"] {
            assert_eq!(evaluate_route(path, true, false), RouteDecision::Allow);
        }
    }

    #[test]
    fn test_loading_session_defers_the_decision() {
        assert_eq!(evaluate_route("/accounts", false, true), RouteDecision::Allow);
    }

    #[test]
    fn test_guard_redirects_through_the_navigator_with_login_flag() {
        let vault = Arc::new(CredentialVault::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        ));
        let navigator = Arc::new(RecordingNavigator::default());
        let guard = RouteGuard::new(vault.clone(), navigator.clone());

        guard.check("/accounts", false);
        let (path, flags) = navigator.last().expect("redirect");
        assert_eq!(path, LANDING_PATH);
        assert!(flags.show_login);

        // once credentials exist the same path passes
        let user = UserRecord::from_value(serde_json::json!({ "_id": "u1" }))
            .expect("object");
        vault.store_credentials("tok", &user).expect("store");
        assert_eq!(guard.check("/accounts", false), RouteDecision::Allow);
        assert_eq!(navigator.calls().len(), 1);
    }
}
