//! Derived profile projection.
//!
//! The displayed profile is never stored: it is recomputed on demand
//! from its three sources, so it can never drift from them. Later
//! sources win field-by-field.

use std::sync::Arc;

use serde_json::Value;

use crate::session::SessionController;
use crate::storage::CredentialVault;
use crate::user::UserRecord;

/// Merges the profile sources in precedence order.
///
/// `snapshot` is the durable offline copy, `session_user` the
/// controller's authoritative record, `local` any unsubmitted edits.
/// A field present in a later source overrides the same field from an
/// earlier one; fields only one source knows about are all retained.
/// Returns `None` when every source is absent.
#[must_use]
pub fn combined_user(
    snapshot: Option<&UserRecord>,
    session_user: Option<&UserRecord>,
    local: Option<&UserRecord>,
) -> Option<UserRecord> {
    let mut combined: Option<UserRecord> = None;
    for source in [snapshot, session_user, local].into_iter().flatten() {
        combined = Some(match combined {
            Some(base) => base.merged_with(source),
            None => source.clone(),
        });
    }
    combined
}

/// Merges a cached account list with a freshly fetched one.
///
/// Two accounts are the same account when any one of `_id`, `id`, or
/// `accountNumber` is present on both and equal. Fresh entries are
/// authoritative; cached entries matching no fresh entry are appended so
/// an account missing from a partial response is not dropped. Cached
/// entries carrying none of the identity keys are discarded.
#[must_use]
pub fn merge_accounts(cached: &[Value], fresh: &[Value]) -> Vec<Value> {
    let mut merged: Vec<Value> = fresh.to_vec();
    for entry in cached {
        if !has_account_identity(entry) {
            continue;
        }
        let duplicate = merged
            .iter()
            .any(|existing| accounts_match(existing, entry));
        if !duplicate {
            merged.push(entry.clone());
        }
    }
    merged
}

const ACCOUNT_IDENTITY_KEYS: [&str; 3] = ["_id", "id", "accountNumber"];

fn has_account_identity(account: &Value) -> bool {
    ACCOUNT_IDENTITY_KEYS
        .iter()
        .any(|key| account.get(*key).is_some())
}

fn accounts_match(a: &Value, b: &Value) -> bool {
    ACCOUNT_IDENTITY_KEYS.iter().any(|key| {
        match (a.get(*key), b.get(*key)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    })
}

/// Reads the projection's sources from the live components.
///
/// Holds no profile state of its own; every call recomputes from the
/// vault and controller.
pub struct ProfileProjection {
    vault: Arc<CredentialVault>,
    controller: Arc<SessionController>,
}

impl ProfileProjection {
    /// Creates a projection over the vault and controller.
    #[must_use]
    pub fn new(vault: Arc<CredentialVault>, controller: Arc<SessionController>) -> Self {
        Self { vault, controller }
    }

    /// The merged profile, with `local` as the highest-precedence source.
    #[must_use]
    pub fn current(&self, local: Option<&UserRecord>) -> Option<UserRecord> {
        let snapshot = self.vault.cached_user().unwrap_or_else(|err| {
            log::warn!("cached profile unavailable for projection: {err}");
            None
        });
        let session_user = self.controller.current_user();
        combined_user(snapshot.as_ref(), session_user.as_ref(), local)
    }
}
