use clap::Args;

use common::keystore::{KeyStore, KeyStoreError};
use common::registry::Identity;
use twinrelay_daemon::state::{AppState, Role, StateError};
use twinrelay_daemon::{Originator, RoleError};

/// Encrypt a message and hand it to the edge for delivery
#[derive(Args, Debug, Clone)]
pub struct SendMessage {
    /// Destination twin (e.g. DT_2)
    #[arg(long)]
    pub to: Identity,

    /// Plaintext to send
    #[arg(long, short)]
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),

    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error("only twins send messages, this directory is the {0}")]
    NotATwin(Role),

    #[error("no key pair yet; start the daemon and provision first")]
    NotProvisioned,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SendMessage {
    type Error = SendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        if state.config.role != Role::Twin {
            return Err(SendError::NotATwin(state.config.role));
        }

        let pair = state
            .key_store()
            .load_key_pair()?
            .ok_or(SendError::NotProvisioned)?;

        let edge = state.config.registry.edge.data;
        let originator = Originator::new(
            state.config.identity.clone(),
            &pair,
            edge,
            state.config.connect_timeout(),
        );
        let payload = originator.send(&self.to, self.message.as_bytes()).await?;

        Ok(format!(
            "Sent {} -> {} via edge at {} (hM {})",
            payload.src_dt_id, payload.dest_dt_id, edge, payload.h_m
        ))
    }
}
