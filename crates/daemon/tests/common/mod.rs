//! Shared helpers for running principals over loopback
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use ::common::pre::Freshness;
use ::common::registry::{Endpoint, Identity, Registry};
use twinrelay_daemon::{Role, ServiceConfig};

/// Ports nobody is listening on right now
pub fn free_ports(n: usize) -> Vec<u16> {
    // keep every listener open until all ports are collected
    let listeners: Vec<_> = (0..n)
        .map(|_| std::net::TcpListener::bind("127.0.0.1:0").unwrap())
        .collect();
    listeners
        .iter()
        .map(|l| l.local_addr().unwrap().port())
        .collect()
}

/// An edge plus DT_1 and DT_2, all on fresh loopback ports
pub fn loopback_registry() -> Registry {
    let ports = free_ports(6);
    Registry::new(Endpoint::loopback(ports[0], ports[1]))
        .with_twin("DT_1".into(), Endpoint::loopback(ports[2], ports[3]))
        .with_twin("DT_2".into(), Endpoint::loopback(ports[4], ports[5]))
}

pub fn service_config(registry: &Registry, identity: &str, role: Role) -> ServiceConfig {
    ServiceConfig {
        identity: Identity::from(identity),
        role,
        registry: registry.clone(),
        max_connections: 8,
        read_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        freshness: Freshness::default(),
        log_level: tracing::Level::DEBUG,
        log_dir: None,
    }
}

/// Wait until something accepts connections on `addr`.
///
/// The check connection carries no frame, which every listener skips.
pub async fn wait_for_listener(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on {}", addr);
}
