use std::path::PathBuf;

use clap::Args;

use common::registry::Identity;
use twinrelay_daemon::state::{AppConfig, AppState, Role, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Which principal this directory belongs to
    #[arg(long, value_enum)]
    pub role: Role,

    /// Twin identity as named in the registry (e.g. DT_1)
    #[arg(long, default_value = "DT_1")]
    pub identity: Identity,

    /// Maximum accepted message age in seconds
    #[arg(long, default_value_t = common::pre::FRESHNESS_WINDOW_SECS)]
    pub freshness_window: f64,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::new(self.identity.clone(), self.role);
        config.freshness_window_secs = self.freshness_window;
        config.log_dir = self.log_dir.clone();

        let state = AppState::init(ctx.config_path.clone(), config)?;

        let mut output = format!(
            "Initialized twinrelay directory at: {}\n\
             - Config: {}\n\
             - Role: {}",
            state.dir.display(),
            state.config_path.display(),
            state.config.role,
        );
        if state.config.role == Role::Twin {
            output.push_str(&format!("\n- Identity: {}", state.config.identity));
        }
        Ok(output)
    }
}
