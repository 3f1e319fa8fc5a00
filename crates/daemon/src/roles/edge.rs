use std::net::SocketAddr;
use std::time::Duration;

use common::pre::{ReEncryptor, Timestamp};
use common::protocol::{EncryptedPayload, ReEncryptedPayload};
use common::registry::{ReKeyTable, Registry};

use super::RoleError;
use crate::transport::{send_frame, FrameHandler};

/// The proxy. Holds only re-encryption keys, never a private key.
#[derive(Debug)]
pub struct Edge {
    rekeys: ReKeyTable,
    registry: Registry,
    reencryptor: ReEncryptor,
    connect_timeout: Duration,
}

impl Edge {
    pub fn new(
        rekeys: ReKeyTable,
        registry: Registry,
        reencryptor: ReEncryptor,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            rekeys,
            registry,
            reencryptor,
            connect_timeout,
        }
    }

    /// Re-encrypt one payload and resolve where it goes, without sending.
    ///
    /// Checks in order: well-formed payload, freshness, a key for the
    /// (source, destination) pair, a known destination address.
    pub fn process_at(
        &self,
        payload: &EncryptedPayload,
        now: Timestamp,
    ) -> Result<(SocketAddr, ReEncryptedPayload), RoleError> {
        let route = payload.route();
        let ciphertext = payload.to_ciphertext()?;
        let reencrypted = self
            .reencryptor
            .reencrypt_route_at(&ciphertext, &route, &self.rekeys, now)?;
        let dest = self.registry.destination(&route.to)?;
        Ok((dest, ReEncryptedPayload::seal(&reencrypted)?))
    }
}

#[async_trait::async_trait]
impl FrameHandler for Edge {
    type Message = EncryptedPayload;
    type Error = RoleError;

    async fn handle(&self, payload: EncryptedPayload, peer: SocketAddr) -> Result<(), RoleError> {
        let route = payload.route();
        let (dest, forward) = self.process_at(&payload, Timestamp::now())?;

        send_frame(dest, &forward, self.connect_timeout)
            .await
            .map_err(|source| RoleError::ForwardFailed {
                dest: route.to.to_string(),
                source,
            })?;
        tracing::info!(%route, %peer, %dest, "forwarded re-encrypted message");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::pre::{Encryptor, KeyGenerator, PreError};
    use common::registry::{Endpoint, Identity};

    fn setup() -> (Edge, common::pre::Issuance) {
        let registry = Registry::default();
        let issuance = KeyGenerator.issue(registry.identities()).unwrap();
        let edge = Edge::new(
            issuance.rekeys.clone(),
            registry,
            ReEncryptor::default(),
            Duration::from_secs(1),
        );
        (edge, issuance)
    }

    fn payload(
        issuance: &common::pre::Issuance,
        from: &str,
        to: &str,
        now: Timestamp,
    ) -> EncryptedPayload {
        let pair = &issuance.key_pairs[&Identity::from(from)];
        let ct = Encryptor::new(*pair.public()).encrypt_at(b"hello", now).unwrap();
        EncryptedPayload::seal(from.into(), to.into(), &ct).unwrap()
    }

    #[test]
    fn test_process_routes_to_destination() {
        let (edge, issuance) = setup();
        let now = Timestamp::now();
        let (dest, forward) = edge
            .process_at(&payload(&issuance, "DT_1", "DT_2", now), now)
            .unwrap();
        assert_eq!(dest.port(), 8090);
        assert_eq!(forward.t_proxy, now.as_secs());
    }

    #[test]
    fn test_stale_payload_dropped() {
        let (edge, issuance) = setup();
        let now = Timestamp::now();
        let stale = payload(&issuance, "DT_1", "DT_2", now.offset(-10.5));
        assert!(matches!(
            edge.process_at(&stale, now),
            Err(RoleError::Pre(PreError::StaleMessage { .. }))
        ));
    }

    #[test]
    fn test_unknown_pair_dropped() {
        let (edge, issuance) = setup();
        let now = Timestamp::now();
        let self_addressed = payload(&issuance, "DT_1", "DT_1", now);
        assert!(matches!(
            edge.process_at(&self_addressed, now),
            Err(RoleError::Pre(PreError::UnknownKeyPair(_)))
        ));
    }

    #[test]
    fn test_unknown_destination_dropped() {
        // a key exists for the pair but the registry has no address for it
        let registry = Registry::new(Endpoint::loopback(8084, 8083))
            .with_twin("DT_1".into(), Endpoint::loopback(8085, 8081));
        let ids = [Identity::from("DT_1"), Identity::from("DT_2")];
        let issuance = KeyGenerator.issue(&ids).unwrap();
        let edge = Edge::new(
            issuance.rekeys.clone(),
            registry,
            ReEncryptor::default(),
            Duration::from_secs(1),
        );

        let now = Timestamp::now();
        assert!(matches!(
            edge.process_at(&payload(&issuance, "DT_1", "DT_2", now), now),
            Err(RoleError::Pre(PreError::UnknownDestination(_)))
        ));
    }
}
