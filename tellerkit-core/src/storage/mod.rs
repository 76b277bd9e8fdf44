//! Client-side credential storage: key/value seams, fixed keys, and the
//! vault facade that keeps the credential set consistent.

pub mod error;
pub mod keys;
mod memory;
mod traits;
mod vault;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
pub use vault::CredentialVault;
