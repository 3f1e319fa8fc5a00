/**
 * Curve arithmetic and key material.
 *  - secp256k1 points and scalars
 *  - Key pairs and re-encryption keys
 */
pub mod crypto;
/**
 * Persistence for provisioned key material,
 *  in memory or in a state directory.
 */
pub mod keystore;
/**
 * The proxy re-encryption scheme itself:
 *  encrypt at the originator, re-encrypt at
 *  the edge, decrypt and verify at the destination.
 */
pub mod pre;
/**
 * Wire schema and newline framing shared
 *  by every principal.
 */
pub mod protocol;
/**
 * Identities, their network endpoints and
 *  the edge's re-encryption key table.
 */
pub mod registry;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{CryptoError, KeyPair, PointKey, ReEncryptionKey, ScalarKey};
    pub use crate::keystore::{FileKeyStore, KeyStore, KeyStoreError, MemoryKeyStore};
    pub use crate::pre::{
        Decryptor, Encryptor, Freshness, KeyGenerator, PreError, ReEncryptor, Timestamp,
        Verification,
    };
    pub use crate::protocol::{
        decode_frame, encode_frame, EncryptedPayload, KeyIssue, ProtocolError,
        ReEncryptedPayload, ReKeyBundle,
    };
    pub use crate::registry::{Endpoint, Identity, ReKeyTable, Registry, Route};
    pub use crate::version::build_info;
}
