use crate::crypto::CryptoError;
use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty frame")]
    EmptyFrame,
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("key issue must carry exactly one of sk_org/pk_org or sk_dst/pk_dst")]
    AmbiguousKeyIssue,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
