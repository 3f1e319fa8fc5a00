use std::net::SocketAddr;

use common::crypto::ScalarKey;
use common::pre::{Decryptor, Freshness, Timestamp, Verification};
use common::protocol::ReEncryptedPayload;
use common::registry::Identity;

use super::RoleError;
use crate::transport::FrameHandler;

/// One decrypted arrival, published to whoever is watching the twin
#[derive(Debug, Clone)]
pub struct Delivery {
    pub peer: SocketAddr,
    pub received_at: Timestamp,
    pub verification: Verification,
}

/// Receiving side of a twin
#[derive(Debug)]
pub struct Destination {
    identity: Identity,
    decryptor: Decryptor,
    outcomes: Option<flume::Sender<Delivery>>,
}

impl Destination {
    pub fn new(identity: Identity, sk_dest: ScalarKey, freshness: Freshness) -> Self {
        Self {
            identity,
            decryptor: Decryptor::with_freshness(sk_dest, freshness),
            outcomes: None,
        }
    }

    /// Also publish every outcome on `tx`
    pub fn with_outcomes(mut self, tx: flume::Sender<Delivery>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    pub fn receive_at(
        &self,
        payload: &ReEncryptedPayload,
        now: Timestamp,
    ) -> Result<Verification, RoleError> {
        let ciphertext = payload.to_ciphertext()?;
        Ok(self.decryptor.decrypt_at(&ciphertext, now)?)
    }
}

#[async_trait::async_trait]
impl FrameHandler for Destination {
    type Message = ReEncryptedPayload;
    type Error = RoleError;

    async fn handle(&self, payload: ReEncryptedPayload, peer: SocketAddr) -> Result<(), RoleError> {
        let now = Timestamp::now();
        let verification = self.receive_at(&payload, now)?;

        // a failed check is reported, not treated as a transport error
        match &verification {
            Verification::Verified(_) => {
                tracing::info!(twin = %self.identity, %peer, "message integrity verified")
            }
            Verification::IntegrityFailure => {
                tracing::warn!(twin = %self.identity, %peer, "integrity check failed")
            }
        }

        if let Some(tx) = &self.outcomes {
            let delivery = Delivery {
                peer,
                received_at: now,
                verification,
            };
            if tx.send_async(delivery).await.is_err() {
                tracing::debug!("no one is listening for deliveries");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::crypto::{message_point, KeyPair, ReEncryptionKey};
    use common::pre::{Encryptor, PreError, ReEncryptor};

    fn payload_for(destination: &KeyPair, proxy_time: Timestamp) -> ReEncryptedPayload {
        let origin = KeyPair::generate().unwrap();
        let rk = ReEncryptionKey::derive(origin.secret(), destination.secret()).unwrap();
        let ct = Encryptor::new(*origin.public())
            .encrypt_at(b"hello", proxy_time)
            .unwrap();
        let rct = ReEncryptor::transform(&ct, &rk, proxy_time);
        ReEncryptedPayload::seal(&rct).unwrap()
    }

    #[tokio::test]
    async fn test_handle_publishes_outcome() {
        let pair = KeyPair::generate().unwrap();
        let (tx, rx) = flume::unbounded();
        let destination =
            Destination::new("DT_2".into(), *pair.secret(), Freshness::default()).with_outcomes(tx);

        let payload = payload_for(&pair, Timestamp::now());
        destination
            .handle(payload, "127.0.0.1:9".parse().unwrap())
            .await
            .unwrap();

        let delivery = rx.recv_async().await.unwrap();
        assert_eq!(
            delivery.verification,
            Verification::Verified(message_point(b"hello"))
        );
    }

    #[tokio::test]
    async fn test_integrity_failure_is_not_an_error() {
        let pair = KeyPair::generate().unwrap();
        let stranger = KeyPair::generate().unwrap();
        let (tx, rx) = flume::unbounded();
        let destination = Destination::new("DT_2".into(), *stranger.secret(), Freshness::default())
            .with_outcomes(tx);

        let payload = payload_for(&pair, Timestamp::now());
        destination
            .handle(payload, "127.0.0.1:9".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(
            rx.recv_async().await.unwrap().verification,
            Verification::IntegrityFailure
        );
    }

    #[test]
    fn test_stale_proxy_timestamp() {
        let pair = KeyPair::generate().unwrap();
        let destination = Destination::new("DT_2".into(), *pair.secret(), Freshness::default());
        let now = Timestamp::now();
        let payload = payload_for(&pair, now.offset(-12.0));
        assert!(matches!(
            destination.receive_at(&payload, now),
            Err(RoleError::Pre(PreError::StaleMessage { .. }))
        ));
    }
}
