//! Fixed storage keys used by the credential vault.
//!
//! External observers (the host UI, devtools) see exactly these keys; they
//! are part of the crate's storage contract and must not be renamed
//! casually.

/// Durable: the bearer token for the active session.
pub const AUTH_TOKEN: &str = "tellerbank:token";

/// Durable: primary cached copy of the signed-in user's profile.
pub const PRIMARY_PROFILE: &str = "tellerbank:user";

/// Durable: secondary cached profile snapshot kept in lockstep with the
/// primary one.
pub const SECONDARY_PROFILE: &str = "tellerbank:profile";

/// Durable: cached account list for the signed-in user.
pub const ACCOUNT_CACHE: &str = "tellerbank:accounts";

/// Durable: login name remembered across sessions when the user opts in.
pub const REMEMBERED_LOGIN: &str = "tellerbank:remembered-login";

/// Ephemeral: tab-scoped mirror of the signed-in user's profile.
pub const SESSION_USER: &str = "tellerbank:session-user";

/// Ephemeral: marker that a session was established in this tab.
pub const SESSION_MARKER: &str = "tellerbank:session-active";

/// Every key the vault manages as part of session credentials, in both
/// stores. `clear_credentials` removes all of these together.
pub(super) const DURABLE_CREDENTIAL_KEYS: &[&str] =
    &[AUTH_TOKEN, PRIMARY_PROFILE, SECONDARY_PROFILE, ACCOUNT_CACHE];

pub(super) const EPHEMERAL_CREDENTIAL_KEYS: &[&str] = &[SESSION_USER, SESSION_MARKER];
