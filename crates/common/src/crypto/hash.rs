use k256::elliptic_curve::ops::Reduce;
use k256::{FieldBytes, Scalar, U256};
use sha2::{Digest, Sha256};
use subtle::{Choice, ConstantTimeEq};

use super::curve::{Point, CURVE};
use super::error::CryptoError;

/// Size of a SHA-256 digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// `H(message) mod q`, the digest read as a big-endian integer
pub fn hash_to_scalar(message: &[u8]) -> Scalar {
    let digest: [u8; DIGEST_SIZE] = Sha256::digest(message).into();
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(digest))
}

/// The point a message is carried as: `M = H(message) * P`
pub fn message_point(message: &[u8]) -> Point {
    CURVE.scalar_mul(&hash_to_scalar(message), &CURVE.generator())
}

/// SHA-256 over the fixed-width encoding of a message point.
///
/// Equality is constant time; `PartialEq` goes through [`ConstantTimeEq`].
#[derive(Clone, Copy, Eq)]
pub struct IntegrityTag([u8; DIGEST_SIZE]);

impl IntegrityTag {
    /// Tag the encoding of `point`. Fails for the identity.
    pub fn of_point(point: &Point) -> Result<Self, CryptoError> {
        let encoded = point.encode()?;
        let mut tag = [0u8; DIGEST_SIZE];
        tag.copy_from_slice(&Sha256::digest(encoded));
        Ok(Self(tag))
    }

    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let mut buff = [0u8; DIGEST_SIZE];
        hex::decode_to_slice(hex, &mut buff)?;
        Ok(Self(buff))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Constant-time comparison against a recomputed tag
    pub fn verify(&self, other: &IntegrityTag) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl From<[u8; DIGEST_SIZE]> for IntegrityTag {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }
}

impl ConstantTimeEq for IntegrityTag {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for IntegrityTag {
    fn eq(&self, other: &Self) -> bool {
        self.verify(other)
    }
}

impl std::fmt::Debug for IntegrityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IntegrityTag({})", self.to_hex())
    }
}
