use super::ciphertext::{Ciphertext, Timestamp};
use super::error::PreError;
use crate::crypto::{message_point, random_nonzero_scalar, IntegrityTag, PointKey, CURVE};

/// Originator side of the scheme: encrypts under the originator's own public key.
#[derive(Debug, Clone)]
pub struct Encryptor {
    public: PointKey,
}

impl Encryptor {
    pub fn new(pk_origin: PointKey) -> Self {
        Self { public: pk_origin }
    }

    pub fn encrypt(&self, message: &[u8]) -> Result<Ciphertext, PreError> {
        self.encrypt_at(message, Timestamp::now())
    }

    /// Encrypt `message`, stamping the ciphertext with `now`.
    ///
    /// A fresh `r` is drawn on every call; it is never stored or reused.
    pub fn encrypt_at(&self, message: &[u8], now: Timestamp) -> Result<Ciphertext, PreError> {
        let r = random_nonzero_scalar()?;
        let m = message_point(message);

        let c_t = CURVE.scalar_mul(r.as_ref(), self.public.point());
        let c_m = CURVE.add(&CURVE.scalar_mul(r.as_ref(), &CURVE.generator()), &m);
        let integrity_tag = IntegrityTag::of_point(&m)?;

        Ok(Ciphertext {
            c_t,
            c_m,
            integrity_tag,
            origin_timestamp: now,
        })
    }
}
