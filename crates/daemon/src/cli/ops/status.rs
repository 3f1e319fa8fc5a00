use clap::Args;

use common::keystore::KeyStore;
use twinrelay_daemon::state::{AppState, Role};

/// Show the state directory, its role and what has been provisioned
#[derive(Args, Debug, Clone)]
pub struct Status;

#[async_trait::async_trait]
impl crate::cli::op::Op for Status {
    type Error = std::convert::Infallible;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        lines.push("Config:".to_string());
        let state = match AppState::load(ctx.config_path.clone()) {
            Ok(state) => state,
            Err(e) => {
                lines.push(format!("  error: {}", e));
                return Ok(lines.join("\n"));
            }
        };
        lines.push(format!("  directory:  {}", state.dir.display()));
        lines.push(format!("  role:       {}", state.config.role));
        if state.config.role == Role::Twin {
            lines.push(format!("  identity:   {}", state.config.identity));
        }
        lines.push(format!(
            "  freshness:  {}s",
            state.config.freshness_window_secs
        ));

        let store = state.key_store();
        lines.push(String::new());
        lines.push("Keys:".to_string());
        match state.config.role {
            Role::Twin => match store.load_key_pair() {
                Ok(Some(_)) => lines.push("  key.pem:     OK".to_string()),
                Ok(None) => lines.push("  key.pem:     NOT PROVISIONED".to_string()),
                Err(e) => lines.push(format!("  key.pem:     ERROR ({})", e)),
            },
            Role::Edge => match store.load_rekeys() {
                Ok(Some(table)) => {
                    lines.push(format!("  rekeys.toml: OK ({} routes)", table.len()))
                }
                Ok(None) => lines.push("  rekeys.toml: NOT PROVISIONED".to_string()),
                Err(e) => lines.push(format!("  rekeys.toml: ERROR ({})", e)),
            },
            Role::Authority => lines.push("  (issued on provision, never stored)".to_string()),
        }

        let registry = &state.config.registry;
        lines.push(String::new());
        lines.push("Registry:".to_string());
        lines.push(format!(
            "  edge     data {}  provision {}",
            registry.edge.data, registry.edge.provision
        ));
        for (id, endpoint) in &registry.twins {
            lines.push(format!(
                "  {:<8} data {}  provision {}",
                id, endpoint.data, endpoint.provision
            ));
        }

        Ok(lines.join("\n"))
    }
}
