use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{KeyStore, KeyStoreError};
use crate::crypto::{KeyPair, ReEncryptionKey, ScalarKey};
use crate::protocol::decimal;
use crate::registry::{Identity, ReKeyTable, Route};

pub const KEY_FILE_NAME: &str = "key.pem";
pub const REKEYS_FILE_NAME: &str = "rekeys.toml";

/// On-disk layout of `rekeys.toml`. TOML integers are 64-bit, so keys are
/// kept as decimal strings.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredReKeys {
    #[serde(default)]
    reenc_keys: Vec<StoredReKey>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredReKey {
    from: Identity,
    to: Identity,
    rk: String,
}

/// Key store backed by a state directory:
/// `key.pem` for a twin's private scalar, `rekeys.toml` for the edge.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE_NAME)
    }

    pub fn rekeys_path(&self) -> PathBuf {
        self.dir.join(REKEYS_FILE_NAME)
    }
}

impl KeyStore for FileKeyStore {
    fn load_key_pair(&self) -> Result<Option<KeyPair>, KeyStoreError> {
        let path = self.key_path();
        if !path.exists() {
            return Ok(None);
        }
        let pem = fs::read_to_string(&path)?;
        let secret = ScalarKey::from_pem(&pem)?;
        Ok(Some(KeyPair::from_secret(secret)))
    }

    fn store_key_pair(&self, pair: &KeyPair) -> Result<(), KeyStoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.key_path(), pair.secret().to_pem())?;
        tracing::debug!(path = %self.key_path().display(), "stored key pair");
        Ok(())
    }

    fn load_rekeys(&self) -> Result<Option<ReKeyTable>, KeyStoreError> {
        let path = self.rekeys_path();
        if !path.exists() {
            return Ok(None);
        }
        let stored: StoredReKeys = toml::from_str(&fs::read_to_string(&path)?)?;

        let mut table = ReKeyTable::new();
        for entry in stored.reenc_keys {
            let n = decimal::parse(&entry.rk).map_err(KeyStoreError::Internal)?;
            let rk = ReEncryptionKey::from_integer(&n)?;
            table.insert(Route::new(entry.from, entry.to), rk)?;
        }
        Ok(Some(table))
    }

    fn store_rekeys(&self, table: &ReKeyTable) -> Result<(), KeyStoreError> {
        let stored = StoredReKeys {
            reenc_keys: table
                .entries()
                .into_iter()
                .map(|(route, rk)| StoredReKey {
                    from: route.from.clone(),
                    to: route.to.clone(),
                    rk: rk.to_integer().to_str_radix(10),
                })
                .collect(),
        };
        fs::create_dir_all(&self.dir)?;
        fs::write(self.rekeys_path(), toml::to_string_pretty(&stored)?)?;
        tracing::debug!(
            path = %self.rekeys_path().display(),
            count = stored.reenc_keys.len(),
            "stored re-encryption keys"
        );
        Ok(())
    }
}
