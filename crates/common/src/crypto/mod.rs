//! Cryptographic primitives for twinrelay
//!
//! This module provides the group arithmetic and key material the proxy
//! re-encryption scheme is built from:
//!
//! - **Curve**: secp256k1 point and scalar operations ([`CurveContext`])
//! - **Keys**: non-zero scalar keys, public points, key pairs and the
//!   unidirectional re-encryption key
//! - **Hashing**: message-to-scalar hashing and the integrity tag carried
//!   alongside every ciphertext
//!
//! # Key Model
//!
//! The trusted authority draws every private key uniformly from `[1, q-1]`
//! using the OS CSPRNG. A public key is always derived as `sk * P`; it is
//! never accepted on its own without the scalar that produced it.
//!
//! The re-encryption key for the ordered pair (origin, destination) is
//! `rk = sk_origin^{-1} * sk_dest mod q`. Holding `rk` alone reveals neither
//! private key, and `rk(A -> B)` differs from `rk(B -> A)`.
//!
//! # Encodings
//!
//! Points are hashed over a fixed 64-byte `x || y` big-endian encoding so the
//! integrity tag is unambiguous regardless of leading zero bytes.

mod curve;
mod error;
mod hash;
mod keys;
mod random;

pub use curve::{CurveContext, Point, COORDINATE_SIZE, CURVE, CURVE_NAME, ENCODED_POINT_SIZE};
pub use error::CryptoError;
pub use hash::{hash_to_scalar, message_point, IntegrityTag, DIGEST_SIZE};
pub use keys::{KeyPair, PointKey, ReEncryptionKey, ScalarKey, SCALAR_KEY_SIZE};
pub use random::random_nonzero_scalar;

pub use k256::Scalar;
