/// Errors raised by curve arithmetic and key handling.
///
/// `InvalidScalar` and `Entropy` are fatal for the operation that raised
/// them: callers must propagate, never substitute a fallback value.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid scalar: {0}")]
    InvalidScalar(String),
    #[error("secure random source unavailable: {0}")]
    Entropy(String),
    #[error("invalid point: {0}")]
    InvalidPoint(String),
    #[error("public key does not match private key")]
    KeyPairMismatch,
    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("pem error: {0}")]
    Pem(String),
}
