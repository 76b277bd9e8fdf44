//! Typed facade over the durable and ephemeral credential stores.

use std::sync::Arc;

use serde_json::Value;

use super::error::{StorageError, StorageResult};
use super::keys;
use super::traits::KeyValueStore;
use crate::user::UserRecord;

/// Owns the two backing stores and enforces the multi-key write/clear
/// discipline: the token, primary profile, secondary profile, and the
/// ephemeral mirror are always written or cleared together. A token
/// without a matching profile (or vice versa) must never persist.
pub struct CredentialVault {
    durable: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
}

impl CredentialVault {
    /// Creates a vault over a durable and an ephemeral store.
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, ephemeral }
    }

    /// The stored bearer token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store read fails.
    pub fn token(&self) -> StorageResult<Option<String>> {
        self.durable.get(keys::AUTH_TOKEN)
    }

    /// The cached primary profile snapshot, if present and well-formed.
    ///
    /// A malformed snapshot is treated as absent (and logged): the cache
    /// is a fallback source, never authoritative.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store read fails.
    pub fn cached_user(&self) -> StorageResult<Option<UserRecord>> {
        let Some(raw) = self.durable.get(keys::PRIMARY_PROFILE)? else {
            return Ok(None);
        };
        match serde_json::from_str::<UserRecord>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                log::warn!("discarding malformed cached profile: {err}");
                Ok(None)
            }
        }
    }

    /// Writes the full credential set as one logical unit: token, primary
    /// and secondary profile snapshots, the ephemeral mirror, and the
    /// session marker.
    ///
    /// If any individual write fails, everything already written is
    /// cleared again so no partial credential set can be observed.
    ///
    /// # Errors
    ///
    /// Returns the first write error after rolling back.
    pub fn store_credentials(&self, token: &str, user: &UserRecord) -> StorageResult<()> {
        let result = self
            .durable
            .set(keys::AUTH_TOKEN, token)
            .and_then(|()| self.write_user_keys(user));
        if let Err(err) = result {
            self.clear_credentials().ok();
            return Err(err);
        }
        Ok(())
    }

    /// Overwrites the cached profile copies (primary, secondary, and the
    /// ephemeral mirror) without touching the token.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or a store write fails.
    pub fn store_user(&self, user: &UserRecord) -> StorageResult<()> {
        self.write_user_keys(user)
    }

    fn write_user_keys(&self, user: &UserRecord) -> StorageResult<()> {
        let raw = serde_json::to_string(user)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.durable.set(keys::PRIMARY_PROFILE, &raw)?;
        self.durable.set(keys::SECONDARY_PROFILE, &raw)?;
        self.ephemeral.set(keys::SESSION_USER, &raw)?;
        self.ephemeral.set(keys::SESSION_MARKER, "1")?;
        Ok(())
    }

    /// Best-effort snapshot write used when a remote profile write fails.
    ///
    /// This is a degraded/offline cache, not the authoritative record: it
    /// may diverge from server truth and is only ever read back as a
    /// fallback. Failures are logged, never surfaced.
    pub fn store_user_snapshot(&self, user: &UserRecord) {
        let raw = match serde_json::to_string(user) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("snapshot fallback serialization failed: {err}");
                return;
            }
        };
        if let Err(err) = self.durable.set(keys::PRIMARY_PROFILE, &raw) {
            log::warn!("snapshot fallback write failed: {err}");
        }
    }

    /// Removes every credential key from both stores.
    ///
    /// All keys are attempted even when one removal fails, so the clear
    /// can never stop halfway; the first error is reported afterwards.
    /// The remembered login name is deliberately not part of the set.
    ///
    /// # Errors
    ///
    /// Returns the first removal error, after all keys were attempted.
    pub fn clear_credentials(&self) -> StorageResult<()> {
        let mut first_err = None;
        for key in keys::DURABLE_CREDENTIAL_KEYS {
            if let Err(err) = self.durable.remove(key) {
                first_err.get_or_insert(err);
            }
        }
        for key in keys::EPHEMERAL_CREDENTIAL_KEYS {
            if let Err(err) = self.ephemeral.remove(key) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Synchronous, reload-safe auth predicate: true iff both a token and
    /// a cached profile are simultaneously present in durable storage.
    ///
    /// Deliberately storage-based rather than state-based so that route
    /// guarding gets a consistent answer while the session state machine
    /// is still restoring. Read errors count as unauthenticated.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        let token = self.durable.get(keys::AUTH_TOKEN).ok().flatten();
        let profile = self.durable.get(keys::PRIMARY_PROFILE).ok().flatten();
        token.is_some() && profile.is_some()
    }

    /// The cached account list, if present and well-formed.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store read fails.
    pub fn cached_accounts(&self) -> StorageResult<Option<Vec<Value>>> {
        let Some(raw) = self.durable.get(keys::ACCOUNT_CACHE)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(accounts) => Ok(Some(accounts)),
            Err(err) => {
                log::warn!("discarding malformed account cache: {err}");
                Ok(None)
            }
        }
    }

    /// Replaces the cached account list.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub fn store_accounts(&self, accounts: &[Value]) -> StorageResult<()> {
        let raw = serde_json::to_string(accounts)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.durable.set(keys::ACCOUNT_CACHE, &raw)
    }

    /// The remembered login name, if the user opted in.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store read fails.
    pub fn remembered_login(&self) -> StorageResult<Option<String>> {
        self.durable.get(keys::REMEMBERED_LOGIN)
    }

    /// Persists the login name across sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store write fails.
    pub fn remember_login(&self, username: &str) -> StorageResult<()> {
        self.durable.set(keys::REMEMBERED_LOGIN, username)
    }

    /// Forgets a previously remembered login name.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store removal fails.
    pub fn forget_login(&self) -> StorageResult<()> {
        self.durable.remove(keys::REMEMBERED_LOGIN)
    }
}
