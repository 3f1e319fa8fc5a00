use super::ciphertext::{Ciphertext, Freshness, ReEncryptedCiphertext, Timestamp};
use super::error::PreError;
use crate::crypto::{ReEncryptionKey, CURVE};
use crate::registry::{ReKeyTable, Route};

/// Edge side of the scheme. Holds no private key material; it only
/// transforms `c_t` with the key for the requested route.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReEncryptor {
    freshness: Freshness,
}

impl ReEncryptor {
    pub fn new(freshness: Freshness) -> Self {
        Self { freshness }
    }

    pub fn reencrypt(
        &self,
        ciphertext: &Ciphertext,
        rk: &ReEncryptionKey,
    ) -> Result<ReEncryptedCiphertext, PreError> {
        self.reencrypt_at(ciphertext, rk, Timestamp::now())
    }

    /// Check freshness of the originator's timestamp, then apply `rk`.
    pub fn reencrypt_at(
        &self,
        ciphertext: &Ciphertext,
        rk: &ReEncryptionKey,
        now: Timestamp,
    ) -> Result<ReEncryptedCiphertext, PreError> {
        self.freshness.check(ciphertext.origin_timestamp, now)?;
        Ok(Self::transform(ciphertext, rk, now))
    }

    /// Freshness first, then the key for `route`. A stale message is
    /// reported as stale even when the pair is also unknown.
    pub fn reencrypt_route_at(
        &self,
        ciphertext: &Ciphertext,
        route: &Route,
        table: &ReKeyTable,
        now: Timestamp,
    ) -> Result<ReEncryptedCiphertext, PreError> {
        self.freshness.check(ciphertext.origin_timestamp, now)?;
        let rk = table.get(route)?;
        Ok(Self::transform(ciphertext, rk, now))
    }

    /// The bare transformation, without the freshness gate
    pub fn transform(
        ciphertext: &Ciphertext,
        rk: &ReEncryptionKey,
        now: Timestamp,
    ) -> ReEncryptedCiphertext {
        ReEncryptedCiphertext {
            c_t_prime: CURVE.scalar_mul(rk.as_scalar(), &ciphertext.c_t),
            c_m: ciphertext.c_m,
            integrity_tag: ciphertext.integrity_tag,
            proxy_timestamp: now,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::pre::Encryptor;

    fn fixture() -> (KeyPair, KeyPair, ReEncryptionKey) {
        let origin = KeyPair::generate().unwrap();
        let destination = KeyPair::generate().unwrap();
        let rk = ReEncryptionKey::derive(origin.secret(), destination.secret()).unwrap();
        (origin, destination, rk)
    }

    #[test]
    fn test_reencrypt_moves_c_t_to_destination_key() {
        let (origin, destination, rk) = fixture();
        let ct = Encryptor::new(*origin.public()).encrypt(b"payload").unwrap();
        let rct = ReEncryptor::default().reencrypt(&ct, &rk).unwrap();

        // rk * r * sk_o * P == r * sk_d * P, so sk_d^{-1} * c_t' == r * P
        let inv = CURVE.mod_inverse(destination.secret().as_scalar()).unwrap();
        let origin_inv = CURVE.mod_inverse(origin.secret().as_scalar()).unwrap();
        assert_eq!(
            CURVE.scalar_mul(&inv, &rct.c_t_prime),
            CURVE.scalar_mul(&origin_inv, &ct.c_t)
        );
        assert_eq!(rct.c_m, ct.c_m);
        assert_eq!(rct.integrity_tag, ct.integrity_tag);
    }

    #[test]
    fn test_stale_ciphertext_rejected() {
        let (origin, _, rk) = fixture();
        let now = Timestamp::now();
        let ct = Encryptor::new(*origin.public())
            .encrypt_at(b"late", now.offset(-11.0))
            .unwrap();
        let result = ReEncryptor::default().reencrypt_at(&ct, &rk, now);
        assert!(matches!(result, Err(PreError::StaleMessage { .. })));
    }

    #[test]
    fn test_proxy_timestamp_is_fresh() {
        let (origin, _, rk) = fixture();
        let stamped = Timestamp::from_secs(1_000.0);
        let ct = Encryptor::new(*origin.public())
            .encrypt_at(b"x", stamped)
            .unwrap();
        let now = stamped.offset(3.0);
        let rct = ReEncryptor::default().reencrypt_at(&ct, &rk, now).unwrap();
        assert_eq!(rct.proxy_timestamp, now);
    }

    #[test]
    fn test_unknown_route() {
        let (origin, _, _) = fixture();
        let ct = Encryptor::new(*origin.public()).encrypt(b"x").unwrap();
        let route = Route::new("DT_1".into(), "DT_3".into());
        let table = ReKeyTable::new();
        let result =
            ReEncryptor::default().reencrypt_route_at(&ct, &route, &table, Timestamp::now());
        assert!(matches!(result, Err(PreError::UnknownKeyPair(_))));
    }
}
