use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tokio::sync::watch::Receiver as WatchReceiver;

use common::crypto::KeyPair;
use common::keystore::KeyStore;
use common::protocol::{KeyIssue, ReKeyBundle};
use common::registry::ReKeyTable;

use super::RoleError;
use crate::transport::{receive_once, TransportError};

/// A twin's key pair: from the store if present, otherwise wait for the
/// trusted authority on `addr` and persist what it sends.
pub async fn await_key_pair(
    store: &dyn KeyStore,
    addr: SocketAddr,
    read_timeout: Duration,
    shutdown_rx: WatchReceiver<()>,
) -> Result<KeyPair, RoleError> {
    if let Some(pair) = store.load_key_pair()? {
        tracing::info!("using stored key pair");
        return Ok(pair);
    }

    tracing::info!(%addr, "waiting for key pair from trusted authority");
    let issue: KeyIssue = wait_for(addr, read_timeout, shutdown_rx, "a key pair").await?;
    // bad key material halts startup
    let pair = issue.to_key_pair()?;
    store.store_key_pair(&pair)?;
    tracing::info!("key pair received and stored");
    Ok(pair)
}

/// The edge's re-encryption table, from the store or from the trusted authority
pub async fn await_rekeys(
    store: &dyn KeyStore,
    addr: SocketAddr,
    read_timeout: Duration,
    shutdown_rx: WatchReceiver<()>,
) -> Result<ReKeyTable, RoleError> {
    if let Some(table) = store.load_rekeys()? {
        tracing::info!(count = table.len(), "using stored re-encryption keys");
        return Ok(table);
    }

    tracing::info!(%addr, "waiting for re-encryption keys from trusted authority");
    let bundle: ReKeyBundle =
        wait_for(addr, read_timeout, shutdown_rx, "re-encryption keys").await?;
    let table = bundle.to_table()?;
    store.store_rekeys(&table)?;
    tracing::info!(count = table.len(), "re-encryption keys received and stored");
    Ok(table)
}

async fn wait_for<T: DeserializeOwned>(
    addr: SocketAddr,
    read_timeout: Duration,
    mut shutdown_rx: WatchReceiver<()>,
    what: &'static str,
) -> Result<T, RoleError> {
    let listener = TcpListener::bind(addr).await.map_err(TransportError::from)?;
    tokio::select! {
        _ = shutdown_rx.changed() => Err(RoleError::Interrupted(what)),
        received = receive_once::<T>(&listener, read_timeout) => {
            let (message, peer) = received?;
            tracing::debug!(%peer, "provisioning message received");
            Ok(message)
        }
    }
}
