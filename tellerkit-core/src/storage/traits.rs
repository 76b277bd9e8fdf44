//! Platform interfaces for client-side credential storage.

use super::error::StorageResult;

/// String key/value store provided by the host platform.
///
/// Two instances back the [`CredentialVault`](super::CredentialVault): a
/// durable store that survives restarts (scoped to the app origin) and an
/// ephemeral store cleared at the end of the tab/process lifetime. No
/// validation or typing is enforced at this layer; callers own
/// serialization. Writes are synchronous and immediately visible to every
/// other consumer of the same store.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the value stored under `key`. Removing an absent key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
