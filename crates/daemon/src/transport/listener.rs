use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch::Receiver as WatchReceiver;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use super::{read_message, TransportError, DEFAULT_READ_TIMEOUT, MAX_CONNECTIONS_LIMIT};

/// How long in-flight connections get to finish once shutdown is signalled
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that consumes one decoded record per connection
#[async_trait::async_trait]
pub trait FrameHandler: Send + Sync + 'static {
    type Message: DeserializeOwned + Send;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn handle(&self, message: Self::Message, peer: SocketAddr) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy)]
pub struct ListenerConfig {
    /// connections served concurrently; further accepts wait for a slot.
    /// Clamped to `1..=MAX_CONNECTIONS_LIMIT`.
    pub max_connections: usize,
    /// bound on the wait for a complete frame
    pub read_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            max_connections: 64,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Accept loop with one task per connection
pub struct Listener<H> {
    name: &'static str,
    listener: TcpListener,
    handler: Arc<H>,
    config: ListenerConfig,
}

impl ListenerConfig {
    /// Concurrent connection slots actually handed out
    pub fn connection_slots(&self) -> u32 {
        let slots = self.max_connections.clamp(1, MAX_CONNECTIONS_LIMIT);
        u32::try_from(slots).unwrap_or(u32::MAX)
    }
}

impl<H: FrameHandler> Listener<H> {
    pub async fn bind(
        name: &'static str,
        addr: SocketAddr,
        handler: H,
        config: ListenerConfig,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            name,
            listener,
            handler: Arc::new(handler),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown_rx` fires, then give open connections a short
    /// grace period.
    pub async fn run(self, mut shutdown_rx: WatchReceiver<()>) -> Result<(), TransportError> {
        let max = self.config.connection_slots();
        let slots = Arc::new(Semaphore::new(max as usize));
        tracing::info!(
            listener = self.name,
            addr = %self.local_addr()?,
            max_connections = max,
            "listening"
        );

        loop {
            let permit = tokio::select! {
                _ = shutdown_rx.changed() => break,
                permit = slots.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                _ = shutdown_rx.changed() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(listener = self.name, "failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            let handler = self.handler.clone();
            let read_timeout = self.config.read_timeout;
            let name = self.name;
            tokio::spawn(async move {
                let _permit = permit;
                serve_connection(name, stream, peer, handler.as_ref(), read_timeout).await;
            });
        }

        // every permit back means every connection task has finished
        if timeout(DRAIN_TIMEOUT, slots.acquire_many(max))
            .await
            .is_err()
        {
            tracing::warn!(
                listener = self.name,
                "connections still open after {} seconds, abandoning them",
                DRAIN_TIMEOUT.as_secs()
            );
        }
        tracing::info!(listener = self.name, "stopped");
        Ok(())
    }
}

async fn serve_connection<H: FrameHandler>(
    name: &'static str,
    stream: TcpStream,
    peer: SocketAddr,
    handler: &H,
    read_timeout: Duration,
) {
    tracing::debug!(listener = name, %peer, "connection accepted");

    // NOTE: one record per connection, capped at MAX_FRAME_SIZE
    let message: H::Message = match read_message(stream, read_timeout).await {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(listener = name, %peer, "dropping message: {}", e);
            return;
        }
    };

    if let Err(e) = handler.handle(message, peer).await {
        tracing::warn!(listener = name, %peer, "dropping message: {}", e);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::{send_frame, DEFAULT_CONNECT_TIMEOUT};
    use common::protocol::ReKeyBundle;
    use tokio::sync::watch;

    #[derive(Debug, thiserror::Error)]
    #[error("rejected")]
    struct Rejected;

    struct Collect {
        tx: flume::Sender<ReKeyBundle>,
    }

    #[async_trait::async_trait]
    impl FrameHandler for Collect {
        type Message = ReKeyBundle;
        type Error = Rejected;

        async fn handle(&self, message: ReKeyBundle, _peer: SocketAddr) -> Result<(), Rejected> {
            if message.reenc_keys.len() > 1 {
                return Err(Rejected);
            }
            let _ = self.tx.send_async(message).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_listener_serves_until_shutdown() {
        let (tx, rx) = flume::unbounded();
        let listener = Listener::bind(
            "test",
            "127.0.0.1:0".parse().unwrap(),
            Collect { tx },
            ListenerConfig::default(),
        )
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let handle = tokio::spawn(listener.run(shutdown_rx));

        for _ in 0..3 {
            send_frame(addr, &ReKeyBundle::default(), DEFAULT_CONNECT_TIMEOUT)
                .await
                .unwrap();
        }
        for _ in 0..3 {
            let bundle = timeout(Duration::from_secs(5), rx.recv_async())
                .await
                .unwrap()
                .unwrap();
            assert!(bundle.reenc_keys.is_empty());
        }

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[test]
    fn test_connection_slots_clamped() {
        let slots = |max_connections| {
            ListenerConfig {
                max_connections,
                ..ListenerConfig::default()
            }
            .connection_slots()
        };
        assert_eq!(slots(0), 1);
        assert_eq!(slots(64), 64);
        assert_eq!(slots(MAX_CONNECTIONS_LIMIT), MAX_CONNECTIONS_LIMIT as u32);
        assert_eq!(slots(usize::MAX), MAX_CONNECTIONS_LIMIT as u32);
    }

    #[tokio::test]
    async fn test_oversized_limit_still_serves() {
        let (tx, rx) = flume::unbounded();
        let listener = Listener::bind(
            "test",
            "127.0.0.1:0".parse().unwrap(),
            Collect { tx },
            ListenerConfig {
                max_connections: usize::MAX,
                ..ListenerConfig::default()
            },
        )
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let handle = tokio::spawn(listener.run(shutdown_rx));

        send_frame(addr, &ReKeyBundle::default(), DEFAULT_CONNECT_TIMEOUT)
            .await
            .unwrap();
        let bundle = timeout(Duration::from_secs(5), rx.recv_async())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bundle, ReKeyBundle::default());

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bad_frame_does_not_stop_listener() {
        use tokio::io::AsyncWriteExt;

        let (tx, rx) = flume::unbounded();
        let listener = Listener::bind(
            "test",
            "127.0.0.1:0".parse().unwrap(),
            Collect { tx },
            ListenerConfig {
                max_connections: 1,
                read_timeout: Duration::from_millis(200),
            },
        )
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let handle = tokio::spawn(listener.run(shutdown_rx));

        let mut junk = TcpStream::connect(addr).await.unwrap();
        junk.write_all(b"{\"nope\":").await.unwrap();
        junk.shutdown().await.unwrap();

        send_frame(addr, &ReKeyBundle::default(), DEFAULT_CONNECT_TIMEOUT)
            .await
            .unwrap();
        let bundle = timeout(Duration::from_secs(5), rx.recv_async())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bundle, ReKeyBundle::default());

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
