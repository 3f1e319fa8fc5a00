use std::fmt;
use std::time::Duration;

use common::keystore::{KEY_FILE_NAME, REKEYS_FILE_NAME};
use common::pre::{Issuance, KeyGenerator};
use common::protocol::{KeyIssue, ReKeyBundle};
use common::registry::Registry;

use super::RoleError;
use crate::transport::send_frame;

/// Who received their key material and who did not
#[derive(Debug, Default)]
pub struct ProvisioningReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ProvisioningReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// What an operator has to do before provisioning again. Peers that
    /// already stored their keys keep them, and a rerun issues new ones.
    pub fn recovery_hint(&self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        Some(format!(
            "delivered keys will not match a new issuance: remove {} from every twin's \
             state directory and {} from the edge's, restart them, then run provision again",
            KEY_FILE_NAME, REKEYS_FILE_NAME
        ))
    }
}

impl fmt::Display for ProvisioningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for peer in &self.delivered {
            writeln!(f, "  {:<8} delivered", peer)?;
        }
        for (peer, reason) in &self.failed {
            writeln!(f, "  {:<8} FAILED: {}", peer, reason)?;
        }
        write!(
            f,
            "{} delivered, {} failed",
            self.delivered.len(),
            self.failed.len()
        )
    }
}

/// Issues a key pair per twin and a re-encryption key per ordered pair,
/// then pushes each to its owner's provisioning port.
#[derive(Debug, Clone)]
pub struct TrustedAuthority {
    registry: Registry,
    connect_timeout: Duration,
}

impl TrustedAuthority {
    pub fn new(registry: Registry, connect_timeout: Duration) -> Self {
        Self {
            registry,
            connect_timeout,
        }
    }

    pub fn issue(&self) -> Result<Issuance, RoleError> {
        Ok(KeyGenerator.issue(self.registry.identities())?)
    }

    /// Deliver `issuance`. An unreachable peer is recorded in the report and
    /// the rest are still attempted.
    pub async fn distribute(&self, issuance: &Issuance) -> Result<ProvisioningReport, RoleError> {
        let mut report = ProvisioningReport::default();

        for (id, pair) in &issuance.key_pairs {
            let endpoint = self
                .registry
                .twin(id)
                .ok_or_else(|| RoleError::UnknownIdentity(id.to_string()))?;
            let message = KeyIssue::originator(pair)?;

            match send_frame(endpoint.provision, &message, self.connect_timeout).await {
                Ok(()) => {
                    tracing::info!(twin = %id, addr = %endpoint.provision, "key pair delivered");
                    report.delivered.push(id.to_string());
                }
                Err(e) => {
                    tracing::warn!(
                        twin = %id,
                        addr = %endpoint.provision,
                        "key pair not delivered: {}",
                        e
                    );
                    report.failed.push((id.to_string(), e.to_string()));
                }
            }
        }

        let bundle = ReKeyBundle::from_table(&issuance.rekeys);
        let edge = self.registry.edge.provision;
        match send_frame(edge, &bundle, self.connect_timeout).await {
            Ok(()) => {
                tracing::info!(
                    addr = %edge,
                    count = bundle.reenc_keys.len(),
                    "re-encryption keys delivered"
                );
                report.delivered.push("edge".to_string());
            }
            Err(e) => {
                tracing::warn!(addr = %edge, "re-encryption keys not delivered: {}", e);
                report.failed.push(("edge".to_string(), e.to_string()));
            }
        }

        Ok(report)
    }

    pub async fn provision(&self) -> Result<ProvisioningReport, RoleError> {
        let issuance = self.issue()?;
        tracing::info!(
            twins = issuance.key_pairs.len(),
            routes = issuance.rekeys.len(),
            "issued key material"
        );
        self.distribute(&issuance).await
    }
}
