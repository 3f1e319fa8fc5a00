use crate::crypto::CryptoError;
use crate::registry::{Identity, RegistryError, Route};

/// Failures of the re-encryption protocol.
///
/// `Crypto` errors are invariant violations and abort the operation.
/// The remaining variants are local policy decisions: the message is
/// dropped and the service keeps running.
#[derive(Debug, thiserror::Error)]
pub enum PreError {
    #[error("stale message: timestamp is {age:.3}s away from now, window is {window}s")]
    StaleMessage { age: f64, window: f64 },
    #[error("no re-encryption key for {0}")]
    UnknownKeyPair(Route),
    #[error("unknown destination: {0}")]
    UnknownDestination(Identity),
    #[error("integrity check failed")]
    IntegrityFailure,
    #[error("freshness window must be a positive number of seconds, got {0}")]
    InvalidWindow(f64),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
