use clap::Args;

use twinrelay_daemon::state::{AppState, StateError};
use twinrelay_daemon::{RoleError, TrustedAuthority};

/// Issue fresh keys for every registered twin and deliver them
#[derive(Args, Debug, Clone)]
pub struct Provision;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error("provisioning incomplete:\n{report}\n{hint}")]
    Incomplete { report: String, hint: String },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Provision {
    type Error = ProvisionError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let authority =
            TrustedAuthority::new(state.config.registry.clone(), state.config.connect_timeout());

        let report = authority.provision().await?;
        if let Some(hint) = report.recovery_hint() {
            return Err(ProvisionError::Incomplete {
                report: report.to_string(),
                hint,
            });
        }
        Ok(format!("Provisioned:\n{}", report))
    }
}
