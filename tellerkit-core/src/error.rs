//! Error outputs from `TellerKit`.

use thiserror::Error;

use crate::storage::StorageError;

/// Generic message substituted whenever a transport-level failure has no
/// server-supplied text to surface.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Error outputs from `TellerKit`.
///
/// Failures are reported to callers as values, never thrown: validation
/// errors are detected before any network call, remote rejections carry
/// the server's message verbatim, and unexpected transport errors are
/// caught at the boundary and converted into [`Transport`].
///
/// [`Transport`]: TellerKitError::Transport
#[derive(Debug, Error)]
pub enum TellerKitError {
    /// The presented input is not valid for the requested operation. No
    /// network call was made and no session state was touched.
    #[error("invalid {attribute}: {reason}")]
    Validation {
        /// The offending input attribute.
        attribute: String,
        /// Human-readable reason suitable for display next to the field.
        reason: String,
    },

    /// The server answered with `success: false` or a non-2xx status.
    #[error("{message}")]
    RemoteRejection {
        /// Server-supplied message when present, generic text otherwise.
        message: String,
    },

    /// Network connection or response-parsing failure.
    #[error("transport failure for {url}: {error}")]
    Transport {
        /// The request URL.
        url: String,
        /// Underlying error detail, for logs only.
        error: String,
    },

    /// Unexpected error serializing information.
    #[error("serialization error: {error}")]
    Serialization {
        /// Underlying error detail.
        error: String,
    },

    /// The operation requires an authenticated session and none exists.
    #[error("no active session")]
    NotAuthenticated,

    /// Errors coming from the credential storage layer.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TellerKitError {
    /// Short human-readable message for the UI.
    ///
    /// Remote rejections surface the server's message verbatim; transport
    /// and serialization failures substitute [`GENERIC_FAILURE_MESSAGE`]
    /// so raw error chains never reach the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { reason, .. } => reason.clone(),
            Self::RemoteRejection { message } => message.clone(),
            Self::Transport { .. } | Self::Serialization { .. } | Self::Storage(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            Self::NotAuthenticated => "Please sign in first.".to_string(),
        }
    }

    pub(crate) fn validation(attribute: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}
