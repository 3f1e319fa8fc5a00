use std::net::SocketAddr;
use std::time::Duration;

use common::crypto::KeyPair;
use common::pre::Encryptor;
use common::protocol::EncryptedPayload;
use common::registry::Identity;

use super::RoleError;
use crate::transport::send_frame;

/// Sending side of a twin
#[derive(Debug, Clone)]
pub struct Originator {
    identity: Identity,
    encryptor: Encryptor,
    edge: SocketAddr,
    connect_timeout: Duration,
}

impl Originator {
    pub fn new(
        identity: Identity,
        key_pair: &KeyPair,
        edge: SocketAddr,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            encryptor: Encryptor::new(*key_pair.public()),
            edge,
            connect_timeout,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Encrypt `message` under our own key, addressed to `dest`
    pub fn seal(&self, dest: &Identity, message: &[u8]) -> Result<EncryptedPayload, RoleError> {
        let ciphertext = self.encryptor.encrypt(message)?;
        Ok(EncryptedPayload::seal(
            self.identity.clone(),
            dest.clone(),
            &ciphertext,
        )?)
    }

    /// Seal and hand to the edge. Nothing comes back: delivery failures
    /// past the edge are only visible in the edge's log.
    pub async fn send(
        &self,
        dest: &Identity,
        message: &[u8],
    ) -> Result<EncryptedPayload, RoleError> {
        let payload = self.seal(dest, message)?;
        send_frame(self.edge, &payload, self.connect_timeout)
            .await
            .map_err(RoleError::EdgeUnavailable)?;
        tracing::info!(
            from = %self.identity,
            to = %dest,
            edge = %self.edge,
            "sent encrypted message"
        );
        Ok(payload)
    }
}
