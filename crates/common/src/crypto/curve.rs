use std::ops::{Add, Neg, Sub};

use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar, U256};
use num_bigint::BigUint;

use super::error::CryptoError;

/// Name of the curve as it appears in the `curve` field of every message
pub const CURVE_NAME: &str = "secp256k1";
/// Width of one big-endian affine coordinate
pub const COORDINATE_SIZE: usize = 32;
/// Width of an encoded point: x || y, no SEC1 tag byte
pub const ENCODED_POINT_SIZE: usize = 2 * COORDINATE_SIZE;

/// The process-wide curve context. Immutable, nothing to initialise.
pub static CURVE: CurveContext = CurveContext;

/// Group operations over secp256k1.
///
/// Every scalar handed to these operations is already an element of the
/// scalar field, so reduction mod `q` happens when integers enter the system
/// (see [`CurveContext::reduce`]), not on each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveContext;

impl CurveContext {
    pub fn name(&self) -> &'static str {
        CURVE_NAME
    }

    /// The base point `P`
    pub fn generator(&self) -> Point {
        Point(ProjectivePoint::GENERATOR)
    }

    /// The scalar field order `q`
    pub fn order(&self) -> BigUint {
        // q - 1 is the largest canonical scalar
        BigUint::from_bytes_be(&(-Scalar::ONE).to_repr()) + 1u32
    }

    pub fn add(&self, a: &Point, b: &Point) -> Point {
        *a + *b
    }

    pub fn scalar_mul(&self, k: &Scalar, p: &Point) -> Point {
        Point(p.0 * k)
    }

    pub fn negate(&self, p: &Point) -> Point {
        -*p
    }

    /// Reduce an arbitrary non-negative integer mod `q`
    pub fn reduce(&self, n: &BigUint) -> Scalar {
        let reduced = n % self.order();
        // reduced < q, so it always fits the field width
        let mut bytes = FieldBytes::default();
        let be = reduced.to_bytes_be();
        bytes[COORDINATE_SIZE - be.len()..].copy_from_slice(&be);
        <Scalar as Reduce<U256>>::reduce_bytes(&bytes)
    }

    /// `k^{-1} mod q`. Zero has no inverse.
    pub fn mod_inverse(&self, k: &Scalar) -> Result<Scalar, CryptoError> {
        Option::<Scalar>::from(k.invert())
            .ok_or_else(|| CryptoError::InvalidScalar("zero has no inverse mod q".to_string()))
    }
}

/// Left-pad a non-negative integer into a 32-byte big-endian field element
pub(crate) fn field_bytes(n: &BigUint) -> Option<FieldBytes> {
    let be = n.to_bytes_be();
    if be.len() > COORDINATE_SIZE {
        return None;
    }
    let mut bytes = FieldBytes::default();
    bytes[COORDINATE_SIZE - be.len()..].copy_from_slice(&be);
    Some(bytes)
}

/// A point on secp256k1, possibly the identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point(pub(crate) ProjectivePoint);

impl Point {
    pub fn identity() -> Self {
        Point(ProjectivePoint::IDENTITY)
    }

    pub fn is_identity(&self) -> bool {
        bool::from(self.0.is_identity())
    }

    /// Fixed-width encoding `x || y`, each coordinate 32 bytes big-endian.
    ///
    /// The identity has no affine coordinates and cannot be encoded.
    pub fn encode(&self) -> Result<[u8; ENCODED_POINT_SIZE], CryptoError> {
        let encoded = self.0.to_affine().to_encoded_point(false);
        let (x, y) = match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(CryptoError::InvalidPoint(
                    "point at infinity has no affine encoding".to_string(),
                ))
            }
        };
        let mut out = [0u8; ENCODED_POINT_SIZE];
        out[..COORDINATE_SIZE].copy_from_slice(x);
        out[COORDINATE_SIZE..].copy_from_slice(y);
        Ok(out)
    }

    /// Parse the fixed-width `x || y` encoding produced by [`Point::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != ENCODED_POINT_SIZE {
            return Err(CryptoError::InvalidPoint(format!(
                "expected {} bytes, got {}",
                ENCODED_POINT_SIZE,
                bytes.len()
            )));
        }
        let mut x = FieldBytes::default();
        let mut y = FieldBytes::default();
        AsMut::<[u8]>::as_mut(&mut x).copy_from_slice(&bytes[..COORDINATE_SIZE]);
        AsMut::<[u8]>::as_mut(&mut y).copy_from_slice(&bytes[COORDINATE_SIZE..]);
        Self::from_field_bytes(&x, &y)
    }

    /// Affine coordinates as integers, for the decimal wire format
    pub fn coordinates(&self) -> Result<(BigUint, BigUint), CryptoError> {
        let encoded = self.encode()?;
        Ok((
            BigUint::from_bytes_be(&encoded[..COORDINATE_SIZE]),
            BigUint::from_bytes_be(&encoded[COORDINATE_SIZE..]),
        ))
    }

    /// Build a point from integer coordinates, checking it lies on the curve
    pub fn from_coordinates(x: &BigUint, y: &BigUint) -> Result<Self, CryptoError> {
        let x = field_bytes(x)
            .ok_or_else(|| CryptoError::InvalidPoint("x coordinate exceeds 32 bytes".to_string()))?;
        let y = field_bytes(y)
            .ok_or_else(|| CryptoError::InvalidPoint("y coordinate exceeds 32 bytes".to_string()))?;
        Self::from_field_bytes(&x, &y)
    }

    fn from_field_bytes(x: &FieldBytes, y: &FieldBytes) -> Result<Self, CryptoError> {
        let encoded = EncodedPoint::from_affine_coordinates(x, y, false);
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| {
                CryptoError::InvalidPoint("coordinates are not on secp256k1".to_string())
            })?;
        Ok(Point(ProjectivePoint::from(affine)))
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point(self.0 + rhs.0)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point(self.0 - rhs.0)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point(-self.0)
    }
}
