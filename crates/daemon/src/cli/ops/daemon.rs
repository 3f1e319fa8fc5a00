use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use twinrelay_daemon::spawn_service;
use twinrelay_daemon::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Directory for log files (overrides config)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),

    #[error("daemon failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;

        let mut config = state.to_service_config(self.log_level)?;
        if self.log_dir.is_some() {
            config.log_dir = self.log_dir.clone();
        }

        spawn_service(&config, Arc::new(state.key_store()))
            .await
            .map_err(|e| DaemonError::Failed(e.to_string()))?;
        Ok(format!("{} daemon ended", config.role))
    }
}
