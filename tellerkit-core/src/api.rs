//! Client for the remote identity/profile endpoints.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{TellerKitError, GENERIC_FAILURE_MESSAGE};
use crate::http_request::Request;
use crate::user::UserRecord;
use crate::Environment;

/// Response envelope shared by every identity endpoint:
/// `{ success, data|user, token?, error? }`.
#[derive(Deserialize, Debug)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Token and user returned by an identity-bearing endpoint.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    /// The bearer token for the new session.
    pub token: String,
    /// The authoritative user record.
    pub user: UserRecord,
}

/// Outcome of a token validation call.
///
/// `Invalid` is a normal outcome requiring session teardown, not an
/// exceptional one: transport failures, non-success envelopes, and
/// malformed payloads all land here.
#[derive(Debug)]
pub enum SessionValidation {
    /// The token is still accepted; the fresh record supersedes any cache.
    Valid(UserRecord),
    /// The token is no longer accepted (or could not be verified).
    Invalid,
}

/// Identity/profile API client.
pub struct AuthApi {
    request: Request,
    base_url: String,
}

impl AuthApi {
    /// Creates a client for the given environment.
    #[must_use]
    pub fn new(environment: &Environment) -> Self {
        let base_url = match environment {
            Environment::Staging => "https://api.stage.tellerbank.app",
            Environment::Production => "https://api.tellerbank.app",
        }
        .to_string();
        Self {
            request: Request::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Confirms a token is still accepted by the identity service.
    ///
    /// Single-shot, no retry: one invalid result is session-ending for
    /// callers, so a transient blip and a genuine rejection are
    /// indistinguishable here (a known limitation of the protocol).
    pub async fn validate(&self, token: &str) -> SessionValidation {
        match self.me(token).await {
            Ok(user) => SessionValidation::Valid(user),
            Err(err) => {
                log::debug!("token validation failed: {err}");
                SessionValidation::Invalid
            }
        }
    }

    /// Fetches the authoritative user record for a token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success envelope, or
    /// a malformed payload.
    pub async fn me(&self, token: &str) -> Result<UserRecord, TellerKitError> {
        let url = self.url("/auth/me");
        let builder = self.request.get(&url).bearer_auth(token);
        let response = self.request.handle(builder).await?;
        let envelope = parse_envelope(&url, response).await?;
        user_from_envelope(&url, envelope)
    }

    /// Exchanges a username and password for a token and user record.
    ///
    /// # Errors
    ///
    /// Returns [`TellerKitError::RemoteRejection`] with the server's
    /// message when credentials are refused, [`TellerKitError::Transport`]
    /// on network or parse failure.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthPayload, TellerKitError> {
        let url = self.url("/auth/login");
        let body = json!({ "username": username, "password": password });
        let builder = self.request.post(&url).json(&body);
        let response = self.request.handle(builder).await?;
        let envelope = parse_envelope(&url, response).await?;
        auth_payload_from_envelope(&url, envelope)
    }

    /// Registers a new user from an already-validated profile payload.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`login`](Self::login).
    pub async fn register(&self, profile: &Value) -> Result<AuthPayload, TellerKitError> {
        let url = self.url("/auth/register");
        let builder = self.request.post(&url).json(profile);
        let response = self.request.handle(builder).await?;
        let envelope = parse_envelope(&url, response).await?;
        auth_payload_from_envelope(&url, envelope)
    }

    /// Sends a partial profile update, returning the server's record.
    ///
    /// # Errors
    ///
    /// Returns an error on rejection or transport failure; the caller's
    /// previous record remains authoritative in that case.
    pub async fn update_profile(
        &self,
        token: &str,
        partial: &Value,
    ) -> Result<UserRecord, TellerKitError> {
        let url = self.url("/auth/updateprofile");
        let builder = self.request.put(&url).bearer_auth(token).json(partial);
        let response = self.request.handle(builder).await?;
        let envelope = parse_envelope(&url, response).await?;
        user_from_envelope(&url, envelope)
    }

    /// Requests a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns an error on rejection or transport failure.
    pub async fn forgot_password(&self, email: &str) -> Result<(), TellerKitError> {
        let url = self.url("/auth/forgotpassword");
        let builder = self.request.post(&url).json(&json!({ "email": email }));
        let response = self.request.handle(builder).await?;
        parse_envelope(&url, response).await.map(|_| ())
    }

    /// Completes a password reset with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns an error on rejection or transport failure.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), TellerKitError> {
        let url = self.url(&format!("/auth/resetpassword/{reset_token}"));
        let builder = self
            .request
            .put(&url)
            .json(&json!({ "password": new_password }));
        let response = self.request.handle(builder).await?;
        parse_envelope(&url, response).await.map(|_| ())
    }

    /// Emails the user their login name.
    ///
    /// # Errors
    ///
    /// Returns an error on rejection or transport failure.
    pub async fn recover_username(&self, email: &str) -> Result<(), TellerKitError> {
        let url = self.url("/auth/recoverusername");
        let builder = self.request.post(&url).json(&json!({ "email": email }));
        let response = self.request.handle(builder).await?;
        parse_envelope(&url, response).await.map(|_| ())
    }
}

#[cfg(test)]
impl AuthApi {
    /// Creates a client with a custom base URL (for testing).
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            request: Request::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

async fn parse_envelope(
    url: &str,
    response: reqwest::Response,
) -> Result<ApiEnvelope, TellerKitError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| TellerKitError::Transport {
            url: url.to_string(),
            error: format!("failed to read response body: {err}"),
        })?;

    if !status.is_success() {
        // Surface the server's message when the error body is well-formed.
        let message = serde_json::from_str::<ApiEnvelope>(&text)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        return Err(TellerKitError::RemoteRejection { message });
    }

    let envelope = serde_json::from_str::<ApiEnvelope>(&text).map_err(|err| {
        TellerKitError::Transport {
            url: url.to_string(),
            error: format!("malformed response payload: {err}"),
        }
    })?;

    if !envelope.success {
        return Err(TellerKitError::RemoteRejection {
            message: envelope
                .error
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
        });
    }
    Ok(envelope)
}

fn user_from_envelope(
    url: &str,
    envelope: ApiEnvelope,
) -> Result<UserRecord, TellerKitError> {
    envelope
        .user
        .or(envelope.data)
        .and_then(UserRecord::from_value)
        .ok_or_else(|| TellerKitError::Transport {
            url: url.to_string(),
            error: "successful response is missing a user payload".to_string(),
        })
}

fn auth_payload_from_envelope(
    url: &str,
    envelope: ApiEnvelope,
) -> Result<AuthPayload, TellerKitError> {
    let token = envelope.token.clone();
    let user = user_from_envelope(url, envelope)?;
    let token = token.ok_or_else(|| TellerKitError::Transport {
        url: url.to_string(),
        error: "successful response is missing a token".to_string(),
    })?;
    Ok(AuthPayload { token, user })
}
