use std::sync::{Arc, RwLock};

use super::{KeyStore, KeyStoreError};
use crate::crypto::KeyPair;
use crate::registry::ReKeyTable;

/// In-memory key store, for tests and ephemeral runs
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    inner: Arc<RwLock<MemoryKeyStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryKeyStoreInner {
    key_pair: Option<KeyPair>,
    rekeys: Option<ReKeyTable>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_pair(pair: KeyPair) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.write() {
            inner.key_pair = Some(pair);
        }
        store
    }

    pub fn with_rekeys(table: ReKeyTable) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.write() {
            inner.rekeys = Some(table);
        }
        store
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> KeyStoreError {
    KeyStoreError::Internal(format!("failed to acquire lock: {}", e))
}

impl KeyStore for MemoryKeyStore {
    fn load_key_pair(&self) -> Result<Option<KeyPair>, KeyStoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.key_pair.clone())
    }

    fn store_key_pair(&self, pair: &KeyPair) -> Result<(), KeyStoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.key_pair = Some(pair.clone());
        Ok(())
    }

    fn load_rekeys(&self) -> Result<Option<ReKeyTable>, KeyStoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.rekeys.clone())
    }

    fn store_rekeys(&self, table: &ReKeyTable) -> Result<(), KeyStoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.rekeys = Some(table.clone());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pre::KeyGenerator;
    use crate::registry::{Identity, Route};

    #[test]
    fn test_empty_store() {
        let store = MemoryKeyStore::new();
        assert!(store.load_key_pair().unwrap().is_none());
        assert!(store.load_rekeys().unwrap().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryKeyStore::new();
        let handle = store.clone();
        let pair = KeyPair::generate().unwrap();
        store.store_key_pair(&pair).unwrap();
        assert_eq!(handle.load_key_pair().unwrap(), Some(pair));
    }

    #[test]
    fn test_rekeys() {
        let ids = [Identity::from("DT_1"), Identity::from("DT_2")];
        let issuance = KeyGenerator.issue(&ids).unwrap();
        let store = MemoryKeyStore::with_rekeys(issuance.rekeys);

        let table = store.load_rekeys().unwrap().unwrap();
        assert!(table.get(&Route::new("DT_2".into(), "DT_1".into())).is_ok());
    }
}
