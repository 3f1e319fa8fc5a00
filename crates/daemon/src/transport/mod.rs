//! Newline-framed JSON over TCP.
//!
//! Every connection carries exactly one record: the sender connects,
//! writes a single frame and closes. There is no reply channel, so a
//! receiver that rejects a message only logs it.

mod listener;

use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use common::protocol::{decode_frame, encode_frame, ProtocolError, FRAME_DELIMITER};

pub use listener::{FrameHandler, Listener, ListenerConfig};

/// Largest record accepted on any port, delimiter included
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Upper bound on concurrent connections per listener
pub const MAX_CONNECTIONS_LIMIT: usize = 4096;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("frame exceeds {0} bytes")]
    FrameTooLarge(usize),
    #[error("connection closed before a frame arrived")]
    ConnectionClosed,
    #[error("timed out after {0:?} waiting to {1}")]
    Timeout(Duration, &'static str),
}

/// Read one record: everything up to the first newline, or up to EOF when
/// the sender closes without a trailing delimiter.
pub async fn read_frame<R>(reader: R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader.take(MAX_FRAME_SIZE as u64 + 1));
    let mut frame = Vec::new();
    reader.read_until(FRAME_DELIMITER, &mut frame).await?;

    if frame.is_empty() {
        return Err(TransportError::ConnectionClosed);
    }
    if frame.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(MAX_FRAME_SIZE));
    }
    Ok(frame)
}

pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode one record, bounded by `read_timeout`
pub async fn read_message<R, T>(reader: R, read_timeout: Duration) -> Result<T, TransportError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let frame = timeout(read_timeout, read_frame(reader))
        .await
        .map_err(|_| TransportError::Timeout(read_timeout, "read a frame"))??;
    Ok(decode_frame(&frame)?)
}

/// Connect, write one frame, close
pub async fn send_frame<T: Serialize>(
    addr: SocketAddr,
    message: &T,
    connect_timeout: Duration,
) -> Result<(), TransportError> {
    let mut stream = timeout(connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| TransportError::Timeout(connect_timeout, "connect"))??;
    write_frame(&mut stream, message).await?;
    stream.shutdown().await?;
    tracing::debug!(%addr, "sent frame");
    Ok(())
}

/// Accept connections on `listener` until one delivers a well-formed
/// record. Connections carrying garbage are logged and skipped.
pub async fn receive_once<T: DeserializeOwned>(
    listener: &TcpListener,
    read_timeout: Duration,
) -> Result<(T, SocketAddr), TransportError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        match read_message(stream, read_timeout).await {
            Ok(message) => return Ok((message, peer)),
            Err(e) => tracing::warn!(%peer, "ignoring malformed frame: {}", e),
        }
    }
}
