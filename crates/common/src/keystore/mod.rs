//! Persistence for issued key material.
//!
//! A twin keeps its own key pair, the edge keeps its re-encryption table.
//! Both are written once after provisioning and read back at startup, so
//! the store is a plain synchronous port that each role is handed
//! explicitly.

mod file;
mod memory;

pub use file::{FileKeyStore, KEY_FILE_NAME, REKEYS_FILE_NAME};
pub use memory::MemoryKeyStore;

use crate::crypto::{CryptoError, KeyPair};
use crate::registry::{RegistryError, ReKeyTable};

#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid key material: {0}")]
    Crypto(#[from] CryptoError),
    #[error("invalid re-encryption table: {0}")]
    Registry(#[from] RegistryError),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("key store error: {0}")]
    Internal(String),
}

pub trait KeyStore: Send + Sync + std::fmt::Debug {
    /// Load this principal's key pair
    ///
    /// # Returns
    /// * `Ok(None)` - Nothing has been provisioned yet
    /// * `Ok(Some(KeyPair))` - The stored pair, public key re-derived from the scalar
    fn load_key_pair(&self) -> Result<Option<KeyPair>, KeyStoreError>;

    /// Persist a key pair, replacing any previous one
    fn store_key_pair(&self, pair: &KeyPair) -> Result<(), KeyStoreError>;

    /// Load the edge's re-encryption table, `Ok(None)` if never provisioned
    fn load_rekeys(&self) -> Result<Option<ReKeyTable>, KeyStoreError>;

    /// Persist the re-encryption table, replacing any previous one
    fn store_rekeys(&self, table: &ReKeyTable) -> Result<(), KeyStoreError>;
}
