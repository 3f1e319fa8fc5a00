//! Integration tests for the full encrypt -> re-encrypt -> decrypt path

mod common;

use ::common::crypto::{hash_to_scalar, message_point, KeyPair, Point, CURVE};
use ::common::pre::{
    Decryptor, Encryptor, Freshness, PreError, ReEncryptor, Timestamp, Verification,
};

#[test]
fn test_hello_scenario() {
    let parties = common::setup_parties();
    let (_, rct) = common::relay(&parties, b"hello");

    let outcome = Decryptor::new(*parties.destination.secret())
        .decrypt(&rct)
        .unwrap();

    let expected = CURVE.scalar_mul(&hash_to_scalar(b"hello"), &CURVE.generator());
    assert_eq!(outcome, Verification::Verified(expected));
}

#[test]
fn test_roundtrip_many_messages() {
    let parties = common::setup_parties();
    let decryptor = Decryptor::new(*parties.destination.secret());

    for i in 0..32u32 {
        let message = format!("reading #{} from sensor", i);
        let (_, rct) = common::relay(&parties, message.as_bytes());
        let recovered = decryptor.decrypt(&rct).unwrap().into_verified().unwrap();
        assert_eq!(recovered, message_point(message.as_bytes()));
    }
}

#[test]
fn test_empty_and_binary_messages() {
    let parties = common::setup_parties();
    let decryptor = Decryptor::new(*parties.destination.secret());

    let binary: Vec<u8> = (0..=255u8).collect();
    for message in [&b""[..], &binary[..], &[0u8; 1024][..]] {
        let (_, rct) = common::relay(&parties, message);
        assert!(decryptor.decrypt(&rct).unwrap().is_verified());
    }
}

#[test]
fn test_rk_for_other_pair_does_not_decrypt() {
    let a = common::setup_parties();
    let b = common::setup_parties();

    // a's ciphertext through b's re-encryption key
    let ct = Encryptor::new(*a.origin.public()).encrypt(b"hello").unwrap();
    let rct = ReEncryptor::default().reencrypt(&ct, &b.rk).unwrap();

    let outcome = Decryptor::new(*b.destination.secret()).decrypt(&rct).unwrap();
    assert_eq!(outcome, Verification::IntegrityFailure);
}

#[test]
fn test_edge_cannot_recover_message_point() {
    // without sk_dest the best the edge can do with c_t' is c_m - c_t'
    let parties = common::setup_parties();
    let (ct, rct) = common::relay(&parties, b"hello");
    let guess: Point = rct.c_m - rct.c_t_prime;
    assert_ne!(guess, message_point(b"hello"));
    assert_ne!(ct.c_m - ct.c_t, message_point(b"hello"));
}

#[test]
fn test_stale_at_either_hop() {
    let parties = common::setup_parties();
    let now = Timestamp::now();

    let stale = Encryptor::new(*parties.origin.public())
        .encrypt_at(b"hello", now.offset(-30.0))
        .unwrap();
    assert!(matches!(
        ReEncryptor::default().reencrypt_at(&stale, &parties.rk, now),
        Err(PreError::StaleMessage { .. })
    ));

    let fresh = Encryptor::new(*parties.origin.public())
        .encrypt_at(b"hello", now)
        .unwrap();
    let rct = ReEncryptor::default()
        .reencrypt_at(&fresh, &parties.rk, now)
        .unwrap();
    let decryptor = Decryptor::with_freshness(*parties.destination.secret(), Freshness::default());
    assert!(matches!(
        decryptor.decrypt_at(&rct, now.offset(10.5)),
        Err(PreError::StaleMessage { .. })
    ));
    assert!(decryptor.decrypt_at(&rct, now.offset(9.5)).unwrap().is_verified());
}

#[test]
fn test_reused_destination_key_pair() {
    // one destination, two originators
    let destination = KeyPair::generate().unwrap();
    let decryptor = Decryptor::new(*destination.secret());

    for _ in 0..2 {
        let origin = KeyPair::generate().unwrap();
        let rk = ::common::crypto::ReEncryptionKey::derive(origin.secret(), destination.secret())
            .unwrap();
        let ct = Encryptor::new(*origin.public()).encrypt(b"hi").unwrap();
        let rct = ReEncryptor::default().reencrypt(&ct, &rk).unwrap();
        assert!(decryptor.decrypt(&rct).unwrap().is_verified());
    }
}
