//! Proxy re-encryption over secp256k1
//!
//! Three parties touch a message on its way from one digital twin to
//! another:
//!
//! 1. The **originator** encodes the message as `M = H(m) * P`, picks a
//!    fresh `r` and produces `c_t = r * pk_origin`, `c_m = r*P + M` plus the
//!    integrity tag `SHA256(x || y of M)`.
//! 2. The **edge** checks the originator's timestamp and rewrites
//!    `c_t' = rk * c_t` with the key for the (origin, destination) pair.
//!    It never sees `M` and holds no private key.
//! 3. The **destination** checks the proxy timestamp, recovers
//!    `M' = c_m - sk_dest^{-1} * c_t'` and compares the tag of `M'` in
//!    constant time.
//!
//! Only a hash of the message travels. The destination learns that the
//! sender committed to a specific message, not the message bytes.

mod authority;
mod ciphertext;
mod decrypt;
mod encrypt;
mod error;
mod reencrypt;

pub use authority::{Issuance, KeyGenerator};
pub use ciphertext::{
    Ciphertext, Freshness, ReEncryptedCiphertext, Timestamp, FRESHNESS_WINDOW_SECS,
};
pub use decrypt::{Decryptor, Verification};
pub use encrypt::Encryptor;
pub use error::PreError;
pub use reencrypt::ReEncryptor;
