use std::path::PathBuf;
use std::time::Duration;

use common::pre::Freshness;
use common::registry::{Identity, Registry};

use crate::state::Role;
use crate::transport::ListenerConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // who we are
    /// our name in the registry; only twins look it up
    pub identity: Identity,
    /// decides which listeners get spawned
    pub role: Role,
    /// addresses of the edge and every twin
    pub registry: Registry,

    // network configuration
    /// connections served concurrently per listener
    pub max_connections: usize,
    /// bound on waiting for a complete frame from a peer
    pub read_timeout: Duration,
    /// bound on connecting to the next hop
    pub connect_timeout: Duration,

    // protocol configuration
    /// maximum accepted age of origin and proxy timestamps
    pub freshness: Freshness,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            max_connections: self.max_connections,
            read_timeout: self.read_timeout,
        }
    }
}
