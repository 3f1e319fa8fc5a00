use super::ciphertext::{Freshness, ReEncryptedCiphertext, Timestamp};
use super::error::PreError;
use crate::crypto::{IntegrityTag, Point, ScalarKey, CURVE};

/// Outcome of a decryption that passed the freshness gate
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// The recovered message point matches the carried integrity tag
    Verified(Point),
    IntegrityFailure,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }

    pub fn into_verified(self) -> Result<Point, PreError> {
        match self {
            Verification::Verified(point) => Ok(point),
            Verification::IntegrityFailure => Err(PreError::IntegrityFailure),
        }
    }
}

/// Destination side of the scheme
#[derive(Debug, Clone)]
pub struct Decryptor {
    secret: ScalarKey,
    freshness: Freshness,
}

impl Decryptor {
    pub fn new(sk_dest: ScalarKey) -> Self {
        Self::with_freshness(sk_dest, Freshness::default())
    }

    pub fn with_freshness(sk_dest: ScalarKey, freshness: Freshness) -> Self {
        Self {
            secret: sk_dest,
            freshness,
        }
    }

    pub fn decrypt(&self, ciphertext: &ReEncryptedCiphertext) -> Result<Verification, PreError> {
        self.decrypt_at(ciphertext, Timestamp::now())
    }

    /// Recover `M' = c_m - sk_dest^{-1} * c_t_prime` and compare its tag.
    ///
    /// A stale proxy timestamp is an error. A tag mismatch is not: it is
    /// reported as [`Verification::IntegrityFailure`].
    pub fn decrypt_at(
        &self,
        ciphertext: &ReEncryptedCiphertext,
        now: Timestamp,
    ) -> Result<Verification, PreError> {
        self.freshness.check(ciphertext.proxy_timestamp, now)?;

        let sk_inv = CURVE.mod_inverse(self.secret.as_scalar())?;
        let blinding = CURVE.scalar_mul(&sk_inv, &ciphertext.c_t_prime);
        let recovered = CURVE.add(&ciphertext.c_m, &CURVE.negate(&blinding));

        // a recovered identity has no encoding and cannot match any tag
        let Ok(tag) = IntegrityTag::of_point(&recovered) else {
            return Ok(Verification::IntegrityFailure);
        };

        if ciphertext.integrity_tag.verify(&tag) {
            Ok(Verification::Verified(recovered))
        } else {
            Ok(Verification::IntegrityFailure)
        }
    }
}
