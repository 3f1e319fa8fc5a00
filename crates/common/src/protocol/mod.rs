//! Wire schema shared by every principal.
//!
//! Each message is one JSON object on one line. Field names are part of the
//! contract and match the deployed twins exactly (`hM`, `Torg`, `Tproxy`,
//! `reenc_keys`, ...). Coordinates and scalars are decimal integers of
//! arbitrary size, `hM` is 64 hex characters.

pub mod decimal;
mod error;
mod messages;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use error::ProtocolError;
pub use messages::{
    EncryptedPayload, KeyIssue, ReEncryptedPayload, ReKeyBundle, ReKeyEntry, WirePoint,
};

/// Records are separated by a single newline
pub const FRAME_DELIMITER: u8 = b'\n';

/// Serialise `message` as one newline-terminated record
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    let mut frame = serde_json::to_vec(message)?;
    frame.push(FRAME_DELIMITER);
    Ok(frame)
}

/// Parse one record. Surrounding whitespace, including the delimiter, is ignored.
pub fn decode_frame<T: DeserializeOwned>(frame: &[u8]) -> Result<T, ProtocolError> {
    let trimmed = frame.trim_ascii();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }
    Ok(serde_json::from_slice(trimmed)?)
}
