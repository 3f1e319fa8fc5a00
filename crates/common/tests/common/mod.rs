//! Shared test utilities for the re-encryption integration tests
#![allow(dead_code)]

use common::crypto::{KeyPair, ReEncryptionKey};
use common::pre::{Ciphertext, Encryptor, KeyGenerator, ReEncryptedCiphertext, ReEncryptor};

/// An originator, a destination and the re-encryption key between them
pub struct Parties {
    pub origin: KeyPair,
    pub destination: KeyPair,
    pub rk: ReEncryptionKey,
}

pub fn setup_parties() -> Parties {
    let origin = KeyGenerator.generate_key_pair().unwrap();
    let destination = KeyGenerator.generate_key_pair().unwrap();
    let rk = KeyGenerator
        .derive_reencryption_key(origin.secret(), destination.secret())
        .unwrap();
    Parties {
        origin,
        destination,
        rk,
    }
}

/// Encrypt `message` for the origin and push it through the edge
pub fn relay(parties: &Parties, message: &[u8]) -> (Ciphertext, ReEncryptedCiphertext) {
    let ct = Encryptor::new(*parties.origin.public())
        .encrypt(message)
        .unwrap();
    let rct = ReEncryptor::default().reencrypt(&ct, &parties.rk).unwrap();
    (ct, rct)
}
