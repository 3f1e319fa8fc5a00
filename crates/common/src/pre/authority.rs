use std::collections::BTreeMap;

use super::error::PreError;
use crate::crypto::{CryptoError, KeyPair, ReEncryptionKey, Scalar, ScalarKey};
use crate::registry::{Identity, ReKeyTable, Route};

/// Key material produced by one provisioning run
#[derive(Debug, Clone)]
pub struct Issuance {
    pub key_pairs: BTreeMap<Identity, KeyPair>,
    pub rekeys: ReKeyTable,
}

/// Trusted authority key generation
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator;

impl KeyGenerator {
    pub fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        KeyPair::generate()
    }

    pub fn derive_reencryption_key(
        &self,
        sk_origin: &ScalarKey,
        sk_dest: &ScalarKey,
    ) -> Result<ReEncryptionKey, CryptoError> {
        ReEncryptionKey::derive(sk_origin, sk_dest)
    }

    /// Derivation for scalars that have not been validated as keys yet
    pub fn derive_from_scalars(
        &self,
        sk_origin: &Scalar,
        sk_dest: &Scalar,
    ) -> Result<ReEncryptionKey, CryptoError> {
        ReEncryptionKey::from_scalars(sk_origin, sk_dest)
    }

    /// Fresh key pair per identity and a re-encryption key for every
    /// ordered pair of distinct identities.
    pub fn issue<'a>(
        &self,
        identities: impl IntoIterator<Item = &'a Identity>,
    ) -> Result<Issuance, PreError> {
        let mut key_pairs = BTreeMap::new();
        for id in identities {
            key_pairs.insert(id.clone(), self.generate_key_pair()?);
        }

        let mut rekeys = ReKeyTable::new();
        for (from, origin) in &key_pairs {
            for (to, destination) in &key_pairs {
                if from == to {
                    continue;
                }
                let rk = self.derive_reencryption_key(origin.secret(), destination.secret())?;
                rekeys.insert(Route::new(from.clone(), to.clone()), rk)?;
            }
        }

        Ok(Issuance { key_pairs, rekeys })
    }
}
