//! Orchestrates login, registration, logout, profile updates, and
//! session restoration. Owns the authoritative "current user" and token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;

use super::{SessionSnapshot, SessionState};
use crate::api::{AuthApi, SessionValidation};
use crate::error::TellerKitError;
use crate::storage::CredentialVault;
use crate::user::{normalize_phone, UserRecord};

struct Inner {
    snapshot: SessionSnapshot,
    /// Monotonic counter tagging session-changing operations. A
    /// completion is applied only while its number is still the latest
    /// issued; superseded completions are discarded, so the most recent
    /// request always wins.
    generation: u64,
}

/// The source of truth for identity state.
///
/// Every other component is an observer layered on top: the profile
/// projection derives from it, the route guard reads the storage-based
/// predicate, and hosts subscribe to snapshot changes via [`subscribe`].
///
/// [`subscribe`]: SessionController::subscribe
pub struct SessionController {
    vault: Arc<CredentialVault>,
    api: AuthApi,
    inner: Mutex<Inner>,
    watch_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Creates a controller over a credential vault and API client.
    ///
    /// The session starts in [`SessionState::Unknown`]; call
    /// [`restore`](Self::restore) once at process start.
    #[must_use]
    pub fn new(vault: Arc<CredentialVault>, api: AuthApi) -> Self {
        let snapshot = SessionSnapshot::default();
        let (watch_tx, _) = watch::channel(snapshot.clone());
        Self {
            vault,
            api,
            inner: Mutex::new(Inner {
                snapshot,
                generation: 0,
            }),
            watch_tx,
        }
    }

    /// Restores the session from storage at process start.
    ///
    /// An absent token resolves to `Anonymous` immediately. A present
    /// token optimistically adopts any cached profile (so the UI shows an
    /// authenticated state without a loading flash), then revalidates
    /// against the identity service: a fresh record supersedes the cache;
    /// an invalid result tears down every credential atomically.
    ///
    /// # Errors
    ///
    /// Returns an error only if the credential store itself fails;
    /// validation outcomes are not errors.
    pub async fn restore(&self) -> Result<(), TellerKitError> {
        let generation = self.begin(SessionState::Restoring);

        let token = match self.vault.token() {
            Ok(token) => token,
            Err(err) => {
                self.settle(generation, |snapshot| {
                    *snapshot = SessionSnapshot::anonymous();
                });
                return Err(err.into());
            }
        };
        let Some(token) = token else {
            self.settle(generation, |snapshot| {
                *snapshot = SessionSnapshot::anonymous();
            });
            return Ok(());
        };

        // Optimistic adoption of the cached profile while validation runs.
        let cached = self.vault.cached_user().unwrap_or_else(|err| {
            log::warn!("cached profile unavailable during restore: {err}");
            None
        });
        let adopted_token = token.clone();
        self.apply_if_current(generation, move |snapshot| {
            snapshot.state = if cached.is_some() {
                SessionState::Authenticated
            } else {
                SessionState::Restoring
            };
            snapshot.token = Some(adopted_token);
            snapshot.user = cached;
        });

        match self.api.validate(&token).await {
            SessionValidation::Valid(user) => {
                if self.is_current(generation) {
                    if let Err(err) = self.vault.store_user(&user) {
                        log::warn!("failed to refresh cached profile: {err}");
                    }
                }
                self.settle(generation, move |snapshot| {
                    snapshot.state = SessionState::Authenticated;
                    snapshot.token = Some(token);
                    snapshot.user = Some(user);
                });
            }
            SessionValidation::Invalid => {
                log::info!("stored token rejected, tearing down session");
                if self.is_current(generation) {
                    if let Err(err) = self.vault.clear_credentials() {
                        log::warn!("credential clear reported {err}, continuing");
                    }
                }
                self.settle(generation, |snapshot| {
                    *snapshot = SessionSnapshot::anonymous();
                });
            }
        }
        Ok(())
    }

    /// Exchanges credentials for a session.
    ///
    /// On success the token and user are written to storage as one unit
    /// and the state becomes `Authenticated`. On remote failure the state
    /// returns to `Anonymous` with no partial credentials retained, and
    /// the surfaced message is the server's when present.
    ///
    /// `remember` controls whether the login name is persisted across
    /// sessions under the remembered-login key.
    ///
    /// # Errors
    ///
    /// [`TellerKitError::Validation`] for empty inputs (no network call),
    /// [`TellerKitError::RemoteRejection`] / [`TellerKitError::Transport`]
    /// for remote failures.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<UserRecord, TellerKitError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(TellerKitError::validation("username", "Username is required"));
        }
        if password.is_empty() {
            return Err(TellerKitError::validation("password", "Password is required"));
        }

        let generation = self.begin(SessionState::Authenticating);
        match self.api.login(username, password).await {
            Ok(payload) => {
                if self.is_current(generation) {
                    if let Err(err) =
                        self.vault.store_credentials(&payload.token, &payload.user)
                    {
                        // The vault rolled its partial writes back already.
                        let err = TellerKitError::from(err);
                        let message = err.user_message();
                        self.settle(generation, move |snapshot| {
                            *snapshot = SessionSnapshot::anonymous();
                            snapshot.last_error = Some(message);
                        });
                        return Err(err);
                    }
                    self.apply_remember_choice(username, remember);
                }
                let user = payload.user.clone();
                self.settle(generation, move |snapshot| {
                    snapshot.state = SessionState::Authenticated;
                    snapshot.token = Some(payload.token);
                    snapshot.user = Some(payload.user);
                });
                Ok(user)
            }
            Err(err) => {
                if self.is_current(generation) {
                    if let Err(clear_err) = self.vault.clear_credentials() {
                        log::warn!("credential clear reported {clear_err}, continuing");
                    }
                }
                let message = err.user_message();
                self.settle(generation, move |snapshot| {
                    *snapshot = SessionSnapshot::anonymous();
                    snapshot.last_error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Registers a new user and establishes a session.
    ///
    /// Any credentials present when the attempt starts are cleared first;
    /// on failure they remain cleared. A form that fails local validation
    /// never issues a network call and never mutates stored credentials.
    ///
    /// # Errors
    ///
    /// [`TellerKitError::Validation`] for an incomplete form, remote
    /// failures as for [`login`](Self::login).
    pub async fn register(
        &self,
        form: &super::RegistrationForm,
    ) -> Result<UserRecord, TellerKitError> {
        let payload = form.validate()?;

        let generation = self.begin(SessionState::Registering);
        if let Err(err) = self.vault.clear_credentials() {
            log::warn!("credential clear reported {err}, continuing");
        }

        match self.api.register(&payload).await {
            Ok(payload) => {
                if self.is_current(generation) {
                    if let Err(err) =
                        self.vault.store_credentials(&payload.token, &payload.user)
                    {
                        let err = TellerKitError::from(err);
                        let message = err.user_message();
                        self.settle(generation, move |snapshot| {
                            *snapshot = SessionSnapshot::anonymous();
                            snapshot.last_error = Some(message);
                        });
                        return Err(err);
                    }
                }
                let user = payload.user.clone();
                self.settle(generation, move |snapshot| {
                    snapshot.state = SessionState::Authenticated;
                    snapshot.token = Some(payload.token);
                    snapshot.user = Some(payload.user);
                });
                Ok(user)
            }
            Err(err) => {
                let message = err.user_message();
                self.settle(generation, move |snapshot| {
                    *snapshot = SessionSnapshot::anonymous();
                    snapshot.last_error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Ends the session unconditionally.
    ///
    /// Every credential key is cleared from both stores and the state
    /// resets to `Anonymous`. Logout always succeeds: a storage error is
    /// logged but cannot leave the session intact, and the generation
    /// bump makes sure no in-flight operation can resurrect it.
    pub fn logout(&self) {
        if let Err(err) = self.vault.clear_credentials() {
            log::warn!("logout: credential clear reported {err}, continuing");
        }
        let mut inner = self.lock_inner();
        inner.generation += 1;
        inner.snapshot = SessionSnapshot::anonymous();
        self.watch_tx.send_replace(inner.snapshot.clone());
    }

    /// Sends a partial profile update to the server.
    ///
    /// The phone number, when present, is normalized to digits first. On
    /// success the server's returned record replaces every cached copy
    /// and the in-memory user. On failure the previous record remains
    /// authoritative and only `last_error` changes; the attempted merge
    /// is kept as a best-effort offline snapshot.
    ///
    /// # Errors
    ///
    /// [`TellerKitError::NotAuthenticated`] without a session, remote
    /// failures as for [`login`](Self::login).
    pub async fn update_profile(
        &self,
        mut partial: Value,
    ) -> Result<UserRecord, TellerKitError> {
        let token = self
            .vault
            .token()?
            .ok_or(TellerKitError::NotAuthenticated)?;

        if let Some(phone) = partial.get("phone").and_then(Value::as_str) {
            let digits = normalize_phone(phone);
            partial["phone"] = Value::String(digits);
        }

        let generation = {
            let mut inner = self.lock_inner();
            inner.generation += 1;
            inner.snapshot.loading = true;
            inner.snapshot.last_error = None;
            self.watch_tx.send_replace(inner.snapshot.clone());
            inner.generation
        };

        match self.api.update_profile(&token, &partial).await {
            Ok(user) => {
                if self.is_current(generation) {
                    if let Err(err) = self.vault.store_user(&user) {
                        log::warn!("failed to refresh cached profile: {err}");
                    }
                }
                let out = user.clone();
                self.settle(generation, move |snapshot| {
                    snapshot.user = Some(user);
                });
                Ok(out)
            }
            Err(err) => {
                if self.is_current(generation) {
                    let attempted = self
                        .current_user()
                        .zip(UserRecord::from_value(partial))
                        .map(|(current, partial)| current.merged_with(&partial));
                    if let Some(attempted) = attempted {
                        self.vault.store_user_snapshot(&attempted);
                    }
                }
                let message = err.user_message();
                self.settle(generation, move |snapshot| {
                    snapshot.last_error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Requests a password-reset email. Never touches stored credentials.
    ///
    /// # Errors
    ///
    /// Remote failures as for [`login`](Self::login).
    pub async fn forgot_password(&self, email: &str) -> Result<(), TellerKitError> {
        self.api.forgot_password(email).await
    }

    /// Completes a password reset. Never touches stored credentials.
    ///
    /// # Errors
    ///
    /// Remote failures as for [`login`](Self::login).
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), TellerKitError> {
        self.api.reset_password(reset_token, new_password).await
    }

    /// Emails the user their login name. Never touches stored credentials.
    ///
    /// # Errors
    ///
    /// Remote failures as for [`login`](Self::login).
    pub async fn recover_username(&self, email: &str) -> Result<(), TellerKitError> {
        self.api.recover_username(email).await
    }

    /// Storage-based auth predicate: true iff both a token and a cached
    /// profile are simultaneously present in durable storage.
    ///
    /// Deliberately independent of in-memory state so the route guard and
    /// navigation gate get a synchronous, reload-safe answer while an
    /// operation is suspended at a network call.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.vault.has_credentials()
    }

    /// A copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_inner().snapshot.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock_inner().snapshot.state
    }

    /// The current user record, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserRecord> {
        self.lock_inner().snapshot.user.clone()
    }

    /// Message from the most recent failed operation, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock_inner().snapshot.last_error.clone()
    }

    /// Subscribes to session snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.watch_tx.subscribe()
    }

    /// The credential vault backing this controller.
    #[must_use]
    pub fn vault(&self) -> &Arc<CredentialVault> {
        &self.vault
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        // No code path panics while holding this lock; recover rather
        // than poison-cascade.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a session-changing operation: bumps the generation, enters
    /// the transient state, and marks the session loading.
    fn begin(&self, state: SessionState) -> u64 {
        let mut inner = self.lock_inner();
        inner.generation += 1;
        inner.snapshot.state = state;
        inner.snapshot.loading = true;
        inner.snapshot.last_error = None;
        self.watch_tx.send_replace(inner.snapshot.clone());
        inner.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock_inner().generation == generation
    }

    /// Applies an intermediate mutation without finishing the operation,
    /// if it has not been superseded.
    fn apply_if_current(
        &self,
        generation: u64,
        apply: impl FnOnce(&mut SessionSnapshot),
    ) -> bool {
        let mut inner = self.lock_inner();
        if inner.generation != generation {
            return false;
        }
        apply(&mut inner.snapshot);
        self.watch_tx.send_replace(inner.snapshot.clone());
        true
    }

    /// Finishes an operation: applies the outcome and clears `loading`,
    /// unless a newer operation was issued in the meantime.
    fn settle(&self, generation: u64, apply: impl FnOnce(&mut SessionSnapshot)) -> bool {
        let mut inner = self.lock_inner();
        if inner.generation != generation {
            log::debug!("discarding superseded session operation #{generation}");
            return false;
        }
        apply(&mut inner.snapshot);
        inner.snapshot.loading = false;
        self.watch_tx.send_replace(inner.snapshot.clone());
        true
    }

    fn apply_remember_choice(&self, username: &str, remember: bool) {
        let result = if remember {
            self.vault.remember_login(username)
        } else {
            self.vault.forget_login()
        };
        if let Err(err) = result {
            log::warn!("remembered-login update failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    struct Fixture {
        controller: SessionController,
        durable: Arc<MemoryStore>,
        server: mockito::ServerGuard,
    }

    async fn fixture() -> Fixture {
        let server = mockito::Server::new_async().await;
        let durable = Arc::new(MemoryStore::new());
        let vault = Arc::new(CredentialVault::new(
            durable.clone(),
            Arc::new(MemoryStore::new()),
        ));
        let controller =
            SessionController::new(vault, AuthApi::with_base_url(&server.url()));
        Fixture {
            controller,
            durable,
            server,
        }
    }

    fn login_success_body() -> String {
        json!({
            "success": true,
            "token": "tok-1",
            "user": { "_id": "u1", "firstName": "Alice" }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_login_then_logout_leaves_no_credentials() {
        let mut fx = fixture().await;
        fx.server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(login_success_body())
            .create_async()
            .await;

        fx.controller
            .login("alice", "hunter2", false)
            .await
            .expect("login");
        assert!(fx.controller.is_authenticated());
        assert_eq!(fx.controller.state(), SessionState::Authenticated);

        fx.controller.logout();
        assert!(!fx.controller.is_authenticated());
        assert_eq!(fx.controller.state(), SessionState::Anonymous);
        assert!(fx
            .controller
            .vault()
            .token()
            .expect("token read")
            .is_none());
        assert!(fx
            .controller
            .vault()
            .cached_user()
            .expect("user read")
            .is_none());
    }

    #[tokio::test]
    async fn test_login_rejection_leaves_anonymous_with_server_message() {
        let mut fx = fixture().await;
        fx.server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(
                json!({ "success": false, "error": "Invalid credentials" }).to_string(),
            )
            .create_async()
            .await;

        let err = fx
            .controller
            .login("bob", "wrongpw", false)
            .await
            .expect_err("rejection");
        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(fx.controller.state(), SessionState::Anonymous);
        assert_eq!(
            fx.controller.last_error().as_deref(),
            Some("Invalid credentials")
        );
        assert!(!fx.controller.is_authenticated());
        assert!(fx.controller.vault().token().expect("token").is_none());
    }

    #[tokio::test]
    async fn test_login_with_blank_input_never_hits_network() {
        let fx = fixture().await;
        let mut server = fx.server;
        let mock = server
            .mock("POST", "/auth/login")
            .expect(0)
            .create_async()
            .await;

        let err = fx
            .controller
            .login("bob", "", false)
            .await
            .expect_err("validation");
        assert!(matches!(err, TellerKitError::Validation { .. }));
        // state untouched: restoration has not even run
        assert_eq!(fx.controller.state(), SessionState::Unknown);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_with_blank_field_never_hits_network_or_storage() {
        let mut fx = fixture().await;
        let mock = fx
            .server
            .mock("POST", "/auth/register")
            .expect(0)
            .create_async()
            .await;

        // pre-existing credentials must survive a failed validation
        let user = UserRecord::from_value(json!({ "_id": "u0" })).expect("object");
        fx.controller
            .vault()
            .store_credentials("tok-0", &user)
            .expect("seed credentials");

        let form = super::super::RegistrationForm {
            first_name: "Alice".into(),
            ..Default::default()
        };
        let err = fx.controller.register(&form).await.expect_err("validation");
        assert!(matches!(err, TellerKitError::Validation { .. }));
        assert_eq!(
            fx.controller.vault().token().expect("token").as_deref(),
            Some("tok-0")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_restore_without_token_is_anonymous() {
        let fx = fixture().await;
        fx.controller.restore().await.expect("restore");
        assert_eq!(fx.controller.state(), SessionState::Anonymous);
        assert!(!fx.controller.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_refreshes_cached_user_from_validator() {
        let mut fx = fixture().await;
        let stale = UserRecord::from_value(json!({ "_id": "u1", "firstName": "A" }))
            .expect("object");
        fx.controller
            .vault()
            .store_credentials("T1", &stale)
            .expect("seed credentials");

        fx.server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer T1")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "data": { "_id": "u1", "firstName": "Alice" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        fx.controller.restore().await.expect("restore");
        assert_eq!(fx.controller.state(), SessionState::Authenticated);
        let user = fx.controller.current_user().expect("user");
        assert_eq!(user.get("firstName"), Some(&json!("Alice")));

        // stored primary profile updated to match the authoritative record
        let cached = fx
            .controller
            .vault()
            .cached_user()
            .expect("read")
            .expect("present");
        assert_eq!(cached.get("firstName"), Some(&json!("Alice")));
    }

    #[tokio::test]
    async fn test_restore_with_invalid_token_clears_every_key_atomically() {
        let mut fx = fixture().await;
        let user = UserRecord::from_value(json!({ "_id": "u1" })).expect("object");
        fx.controller
            .vault()
            .store_credentials("T1", &user)
            .expect("seed credentials");

        fx.server
            .mock("GET", "/auth/me")
            .with_status(401)
            .with_body(json!({ "success": false, "error": "Unauthorized" }).to_string())
            .create_async()
            .await;

        fx.controller.restore().await.expect("restore");
        assert_eq!(fx.controller.state(), SessionState::Anonymous);

        // token, primary, and secondary all absent simultaneously
        use crate::storage::keys;
        assert!(fx.durable.get(keys::AUTH_TOKEN).expect("get").is_none());
        assert!(fx
            .durable
            .get(keys::PRIMARY_PROFILE)
            .expect("get")
            .is_none());
        assert!(fx
            .durable
            .get(keys::SECONDARY_PROFILE)
            .expect("get")
            .is_none());
    }

    #[tokio::test]
    async fn test_register_success_establishes_session() {
        let mut fx = fixture().await;
        fx.server
            .mock("POST", "/auth/register")
            .with_status(200)
            .with_body(login_success_body())
            .create_async()
            .await;

        let form = crate::session::RegistrationForm {
            first_name: "Alice".into(),
            last_name: "Example".into(),
            email: "alice@example.com".into(),
            phone: "5551234567".into(),
            date_of_birth: "1990-01-02".into(),
            government_id: "123-45-6789".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip: "62701".into(),
            security_question: "First pet?".into(),
            security_answer: "Rex".into(),
        };
        let user = fx.controller.register(&form).await.expect("register");
        assert_eq!(user.id(), Some("u1"));
        assert!(fx.controller.is_authenticated());
        assert_eq!(fx.controller.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_update_profile_failure_keeps_previous_user() {
        let mut fx = fixture().await;
        fx.server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(login_success_body())
            .create_async()
            .await;
        fx.server
            .mock("PUT", "/auth/updateprofile")
            .with_status(200)
            .with_body(
                json!({ "success": false, "error": "Update rejected" }).to_string(),
            )
            .create_async()
            .await;

        fx.controller
            .login("alice", "hunter2", false)
            .await
            .expect("login");

        let err = fx
            .controller
            .update_profile(json!({ "firstName": "Mallory" }))
            .await
            .expect_err("rejection");
        assert_eq!(err.user_message(), "Update rejected");

        // previous record remains authoritative
        let user = fx.controller.current_user().expect("user");
        assert_eq!(user.get("firstName"), Some(&json!("Alice")));
        assert_eq!(fx.controller.state(), SessionState::Authenticated);
        assert_eq!(
            fx.controller.last_error().as_deref(),
            Some("Update rejected")
        );
    }

    #[tokio::test]
    async fn test_update_profile_success_overwrites_cached_copies() {
        let mut fx = fixture().await;
        fx.server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(login_success_body())
            .create_async()
            .await;
        fx.server
            .mock("PUT", "/auth/updateprofile")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "data": { "_id": "u1", "firstName": "Alicia", "phone": "5559876543" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        fx.controller
            .login("alice", "hunter2", false)
            .await
            .expect("login");
        let user = fx
            .controller
            .update_profile(json!({ "firstName": "Alicia", "phone": "(555) 987-6543" }))
            .await
            .expect("update");
        assert_eq!(user.get("firstName"), Some(&json!("Alicia")));

        let cached = fx
            .controller
            .vault()
            .cached_user()
            .expect("read")
            .expect("present");
        assert_eq!(cached.get("firstName"), Some(&json!("Alicia")));
    }

    #[tokio::test]
    async fn test_update_profile_requires_a_session() {
        let fx = fixture().await;
        let err = fx
            .controller
            .update_profile(json!({ "firstName": "X" }))
            .await
            .expect_err("no session");
        assert!(matches!(err, TellerKitError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_remembered_login_follows_the_remember_flag() {
        let mut fx = fixture().await;
        fx.server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(login_success_body())
            .expect_at_least(2)
            .create_async()
            .await;

        fx.controller
            .login("alice", "hunter2", true)
            .await
            .expect("login");
        assert_eq!(
            fx.controller
                .vault()
                .remembered_login()
                .expect("read")
                .as_deref(),
            Some("alice")
        );

        fx.controller
            .login("alice", "hunter2", false)
            .await
            .expect("login");
        assert!(fx
            .controller
            .vault()
            .remembered_login()
            .expect("read")
            .is_none());
    }

    #[tokio::test]
    async fn test_superseded_completion_is_discarded() {
        let fx = fixture().await;

        // An operation begins, then the user logs out before it settles.
        let generation = fx.controller.begin(SessionState::Authenticating);
        fx.controller.logout();

        let applied = fx.controller.settle(generation, |snapshot| {
            snapshot.state = SessionState::Authenticated;
            snapshot.token = Some("stale".to_string());
        });
        assert!(!applied);
        assert_eq!(fx.controller.state(), SessionState::Anonymous);
        assert!(fx.controller.snapshot().token.is_none());
    }

    #[tokio::test]
    async fn test_newer_operation_supersedes_older_one() {
        let fx = fixture().await;

        let first = fx.controller.begin(SessionState::Authenticating);
        let second = fx.controller.begin(SessionState::Authenticating);

        assert!(!fx.controller.apply_if_current(first, |snapshot| {
            snapshot.token = Some("old".to_string());
        }));
        assert!(fx.controller.settle(second, |snapshot| {
            snapshot.state = SessionState::Authenticated;
            snapshot.token = Some("new".to_string());
        }));
        assert_eq!(fx.controller.snapshot().token.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_subscribers_observe_state_changes() {
        let mut fx = fixture().await;
        fx.server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(login_success_body())
            .create_async()
            .await;

        let rx = fx.controller.subscribe();
        fx.controller
            .login("alice", "hunter2", false)
            .await
            .expect("login");
        assert_eq!(rx.borrow().state, SessionState::Authenticated);
        assert!(!rx.borrow().loading);
    }
}
