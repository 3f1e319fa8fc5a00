//! The four principals of the relay.
//!
//! - [`TrustedAuthority`] issues every key and hands them out once
//! - [`Originator`] seals a message for a destination and sends it to the edge
//! - [`Edge`] re-encrypts toward the destination and forwards
//! - [`Destination`] decrypts and checks integrity
//!
//! A digital twin is both an originator (via `send`) and a destination
//! (its data listener).

mod authority;
mod destination;
mod edge;
mod originator;
mod provision;

pub use authority::{ProvisioningReport, TrustedAuthority};
pub use destination::{Delivery, Destination};
pub use edge::Edge;
pub use originator::Originator;
pub use provision::{await_key_pair, await_rekeys};

use common::crypto::CryptoError;
use common::keystore::KeyStoreError;
use common::pre::PreError;
use common::protocol::ProtocolError;

use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error(transparent)]
    Pre(#[from] PreError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
    #[error("edge server not available: {0}")]
    EdgeUnavailable(#[source] TransportError),
    #[error("failed to forward to {dest}: {source}")]
    ForwardFailed {
        dest: String,
        #[source]
        source: TransportError,
    },
    #[error("{0} is not in the registry")]
    UnknownIdentity(String),
    #[error("shut down while waiting for {0}")]
    Interrupted(&'static str),
}

impl From<CryptoError> for RoleError {
    fn from(e: CryptoError) -> Self {
        RoleError::Pre(PreError::Crypto(e))
    }
}
