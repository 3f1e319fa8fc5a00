use std::ops::Deref;

use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, NonZeroScalar, Scalar};
use num_bigint::BigUint;
use subtle::ConstantTimeEq;

use super::curve::{field_bytes, Point, CURVE};
use super::error::CryptoError;
use super::random::random_nonzero_scalar;

/// Size of a serialised scalar key in bytes
pub const SCALAR_KEY_SIZE: usize = 32;
/// PEM tag used when persisting a private scalar
pub const PEM_TAG: &str = "PRIVATE KEY";

/// A scalar in `[1, q-1]`: a private key or a re-encryption key.
///
/// Zero cannot be represented. Integers entering from the wire or from disk
/// are range checked, not reduced, so out-of-range key material is an error
/// rather than a silently different key.
#[derive(Clone, Copy)]
pub struct ScalarKey(NonZeroScalar);

impl ScalarKey {
    /// Generate a new key uniformly from `[1, q-1]` using the OS CSPRNG
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self(random_nonzero_scalar()?))
    }

    /// Wrap a field element, rejecting zero
    pub fn from_scalar(scalar: Scalar) -> Result<Self, CryptoError> {
        Option::<NonZeroScalar>::from(NonZeroScalar::new(scalar))
            .map(Self)
            .ok_or_else(|| CryptoError::InvalidScalar("scalar key must not be zero".to_string()))
    }

    /// Parse an integer that must already lie in `[1, q-1]`
    pub fn from_integer(n: &BigUint) -> Result<Self, CryptoError> {
        let bytes = field_bytes(n).ok_or_else(|| {
            CryptoError::InvalidScalar("scalar key exceeds 32 bytes".to_string())
        })?;
        Self::from_field_bytes(bytes)
    }

    pub fn to_integer(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_bytes())
    }

    pub fn as_scalar(&self) -> &Scalar {
        self.0.as_ref()
    }

    /// Derive the public point `sk * P`
    pub fn public(&self) -> PointKey {
        PointKey(CURVE.scalar_mul(self.as_scalar(), &CURVE.generator()))
    }

    /// `sk^{-1} mod q`
    pub fn invert(&self) -> Result<ScalarKey, CryptoError> {
        Self::from_scalar(CURVE.mod_inverse(self.as_scalar())?)
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_KEY_SIZE] {
        let mut bytes = [0u8; SCALAR_KEY_SIZE];
        bytes.copy_from_slice(&self.0.to_repr());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SCALAR_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidScalar(format!(
                "invalid scalar key size, expected {}, got {}",
                SCALAR_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Self::from_field_bytes(FieldBytes::from(array))
    }

    fn from_field_bytes(bytes: FieldBytes) -> Result<Self, CryptoError> {
        let scalar = Option::<Scalar>::from(Scalar::from_repr(bytes)).ok_or_else(|| {
            CryptoError::InvalidScalar("scalar key is not below the curve order".to_string())
        })?;
        Self::from_scalar(scalar)
    }

    /// Parse a scalar key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0u8; SCALAR_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)?;
        Self::from_bytes(&buff)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Encode in PEM format for on-disk storage
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new(PEM_TAG, self.to_bytes());
        pem::encode(&pem)
    }

    /// Parse a scalar key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PRIVATE KEY"
    /// - The body is not a 32-byte scalar in `[1, q-1]`
    pub fn from_pem(pem_str: &str) -> Result<Self, CryptoError> {
        let pem = pem::parse(pem_str).map_err(|e| CryptoError::Pem(e.to_string()))?;
        if pem.tag() != PEM_TAG {
            return Err(CryptoError::Pem(format!(
                "invalid PEM tag, expected {}",
                PEM_TAG
            )));
        }
        Self::from_bytes(pem.contents())
    }
}

impl PartialEq for ScalarKey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.as_scalar().ct_eq(other.as_scalar()))
    }
}

impl Eq for ScalarKey {}

impl std::fmt::Debug for ScalarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ScalarKey(<redacted>)")
    }
}

/// A public key `sk * P`. Never the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointKey(Point);

impl Deref for PointKey {
    type Target = Point;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PointKey {
    pub fn from_point(point: Point) -> Result<Self, CryptoError> {
        if point.is_identity() {
            return Err(CryptoError::InvalidPoint(
                "public key cannot be the point at infinity".to_string(),
            ));
        }
        Ok(Self(point))
    }

    pub fn from_coordinates(x: &BigUint, y: &BigUint) -> Result<Self, CryptoError> {
        Self::from_point(Point::from_coordinates(x, y)?)
    }

    pub fn point(&self) -> &Point {
        &self.0
    }
}

/// A principal's key pair. Issued by the trusted authority, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    private: ScalarKey,
    public: PointKey,
}

impl KeyPair {
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self::from_secret(ScalarKey::generate()?))
    }

    pub fn from_secret(private: ScalarKey) -> Self {
        let public = private.public();
        Self { private, public }
    }

    /// Rebuild a pair received from elsewhere, checking `public == private * P`
    pub fn from_parts(private: ScalarKey, public: PointKey) -> Result<Self, CryptoError> {
        if private.public() != public {
            return Err(CryptoError::KeyPairMismatch);
        }
        Ok(Self { private, public })
    }

    pub fn secret(&self) -> &ScalarKey {
        &self.private
    }

    pub fn public(&self) -> &PointKey {
        &self.public
    }
}

/// Unidirectional proxy key `rk = sk_origin^{-1} * sk_dest mod q`.
///
/// Only the trusted authority, holding both private keys, can derive one.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ReEncryptionKey(ScalarKey);

impl ReEncryptionKey {
    pub fn derive(origin: &ScalarKey, destination: &ScalarKey) -> Result<Self, CryptoError> {
        Self::from_scalars(origin.as_scalar(), destination.as_scalar())
    }

    /// Same derivation over raw field elements. Fails with `InvalidScalar`
    /// when either scalar is zero.
    pub fn from_scalars(origin: &Scalar, destination: &Scalar) -> Result<Self, CryptoError> {
        let origin_inv = CURVE.mod_inverse(origin)?;
        Ok(Self(ScalarKey::from_scalar(origin_inv * destination)?))
    }

    pub fn from_integer(n: &BigUint) -> Result<Self, CryptoError> {
        Ok(Self(ScalarKey::from_integer(n)?))
    }

    pub fn to_integer(&self) -> BigUint {
        self.0.to_integer()
    }

    pub fn as_scalar(&self) -> &Scalar {
        self.0.as_scalar()
    }
}

impl From<ScalarKey> for ReEncryptionKey {
    fn from(key: ScalarKey) -> Self {
        Self(key)
    }
}

impl std::fmt::Debug for ReEncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReEncryptionKey(<redacted>)")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let pair = KeyPair::generate().unwrap();
        assert_eq!(pair.secret().public(), *pair.public());
        assert!(!pair.public().is_identity());

        // Test round-trip conversion
        let hex = pair.secret().to_hex();
        let recovered = ScalarKey::from_hex(&hex).unwrap();
        assert_eq!(pair.secret(), &recovered);
    }

    #[test]
    fn test_pem_serialization() {
        let key = ScalarKey::generate().unwrap();
        let pem = key.to_pem();
        let recovered = ScalarKey::from_pem(&pem).unwrap();
        assert_eq!(key, recovered);
        assert_eq!(key.public(), recovered.public());
    }

    #[test]
    fn test_pem_wrong_tag_rejected() {
        let pem = pem::encode(&pem::Pem::new("PUBLIC KEY", [1u8; SCALAR_KEY_SIZE]));
        assert!(matches!(ScalarKey::from_pem(&pem), Err(CryptoError::Pem(_))));
    }

    #[test]
    fn test_zero_and_order_rejected() {
        let zero = BigUint::from(0u32);
        assert!(matches!(
            ScalarKey::from_integer(&zero),
            Err(CryptoError::InvalidScalar(_))
        ));

        let q = CURVE.order();
        assert!(matches!(
            ScalarKey::from_integer(&q),
            Err(CryptoError::InvalidScalar(_))
        ));

        let q_minus_one = &q - 1u32;
        assert!(ScalarKey::from_integer(&q_minus_one).is_ok());

        assert!(ScalarKey::from_scalar(Scalar::ZERO).is_err());
        assert!(ScalarKey::from_bytes(&[0u8; SCALAR_KEY_SIZE]).is_err());
    }

    #[test]
    fn test_scalar_bytes_must_be_field_width() {
        let key = ScalarKey::generate().unwrap();
        let bytes = key.to_bytes();
        assert_eq!(ScalarKey::from_bytes(&bytes).unwrap(), key);
        assert!(matches!(
            ScalarKey::from_bytes(&bytes[1..]),
            Err(CryptoError::InvalidScalar(_))
        ));
        let mut long = bytes.to_vec();
        long.push(0);
        assert!(ScalarKey::from_bytes(&long).is_err());
    }

    #[test]
    fn test_integer_roundtrip() {
        let key = ScalarKey::generate().unwrap();
        let n = key.to_integer();
        assert_eq!(ScalarKey::from_integer(&n).unwrap(), key);
    }

    #[test]
    fn test_from_parts_checks_consistency() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        assert!(KeyPair::from_parts(*a.secret(), *a.public()).is_ok());
        assert!(matches!(
            KeyPair::from_parts(*a.secret(), *b.public()),
            Err(CryptoError::KeyPairMismatch)
        ));
    }

    #[test]
    fn test_public_key_rejects_identity() {
        assert!(PointKey::from_point(Point::identity()).is_err());
    }

    #[test]
    fn test_reencryption_key_algebra() {
        let origin = ScalarKey::generate().unwrap();
        let destination = ScalarKey::generate().unwrap();
        let rk = ReEncryptionKey::derive(&origin, &destination).unwrap();
        // rk * sk_origin == sk_dest
        assert_eq!(
            *rk.as_scalar() * origin.as_scalar(),
            *destination.as_scalar()
        );
    }

    #[test]
    fn test_reencryption_key_is_directional() {
        let a = ScalarKey::generate().unwrap();
        let b = ScalarKey::generate().unwrap();
        let ab = ReEncryptionKey::derive(&a, &b).unwrap();
        let ba = ReEncryptionKey::derive(&b, &a).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let key = ScalarKey::generate().unwrap();
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains(&key.to_hex()));
    }
}
