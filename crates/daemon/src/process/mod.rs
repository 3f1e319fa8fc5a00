pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use common::keystore::KeyStore;
use common::pre::ReEncryptor;

use crate::roles::{
    await_key_pair, await_rekeys, Delivery, Destination, Edge, RoleError, TrustedAuthority,
};
use crate::state::Role;
use crate::transport::Listener;
use crate::ServiceConfig;

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle for gracefully shutting down a running principal.
pub struct ShutdownHandle {
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Block until the service shuts down (via signal or explicit shutdown).
    pub async fn wait(self) {
        shutdown_and_join(self.graceful_waiter, self.handles).await;
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    // Stdout layer
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    if let Some(log_dir) = &service_config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_name = format!("twinrelay-{}.log", service_config.role);
        let file_appender = tracing_appender::rolling::daily(log_dir, file_name);
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(service_config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info(&service_config.role.to_string());

    guards
}

/// Wait for shutdown and join all handles with timeout.
async fn shutdown_and_join(
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}

/// Provision once, then serve re-encryption on the edge's data port.
async fn run_edge(
    config: ServiceConfig,
    store: Arc<dyn KeyStore>,
    shutdown_rx: watch::Receiver<()>,
) -> Result<(), RoleError> {
    let endpoint = config.registry.edge;
    let rekeys = await_rekeys(
        store.as_ref(),
        endpoint.provision,
        config.read_timeout,
        shutdown_rx.clone(),
    )
    .await?;

    let edge = Edge::new(
        rekeys,
        config.registry.clone(),
        ReEncryptor::new(config.freshness),
        config.connect_timeout,
    );
    let listener = Listener::bind("edge", endpoint.data, edge, config.listener_config()).await?;
    listener.run(shutdown_rx).await?;
    Ok(())
}

/// Provision once, then decrypt whatever the edge forwards to us.
async fn run_twin(
    config: ServiceConfig,
    store: Arc<dyn KeyStore>,
    outcomes: Option<flume::Sender<Delivery>>,
    shutdown_rx: watch::Receiver<()>,
) -> Result<(), RoleError> {
    let endpoint = *config
        .registry
        .twin(&config.identity)
        .ok_or_else(|| RoleError::UnknownIdentity(config.identity.to_string()))?;
    let pair = await_key_pair(
        store.as_ref(),
        endpoint.provision,
        config.read_timeout,
        shutdown_rx.clone(),
    )
    .await?;

    let mut destination =
        Destination::new(config.identity.clone(), *pair.secret(), config.freshness);
    if let Some(tx) = outcomes {
        destination = destination.with_outcomes(tx);
    }
    let listener = Listener::bind(
        "destination",
        endpoint.data,
        destination,
        config.listener_config(),
    )
    .await?;
    listener.run(shutdown_rx).await?;
    Ok(())
}

/// Issue and distribute every key, then stop.
async fn run_authority(config: ServiceConfig) -> Result<(), RoleError> {
    let authority = TrustedAuthority::new(config.registry, config.connect_timeout);
    let report = authority.provision().await?;
    match report.recovery_hint() {
        None => tracing::info!("provisioning complete: {}", report),
        Some(hint) => tracing::warn!("provisioning incomplete: {}. {}", report, hint),
    }
    Ok(())
}

/// Spawn the tasks for `config.role`, returning once they are running.
///
/// Twins and the edge first wait on their provisioning port for key
/// material unless `store` already holds it. `outcomes`, when given,
/// receives every decrypted arrival at a twin.
pub fn start_service(
    config: &ServiceConfig,
    store: Arc<dyn KeyStore>,
    outcomes: Option<flume::Sender<Delivery>>,
) -> std::io::Result<ShutdownHandle> {
    let (graceful_waiter, shutdown_tx, shutdown_rx) = utils::graceful_shutdown_blocker()?;

    let role = config.role;
    let task_config = config.clone();
    let stop_tx = shutdown_tx.clone();
    let handle = tokio::spawn(async move {
        let result = match role {
            Role::Edge => run_edge(task_config, store, shutdown_rx).await,
            Role::Twin => run_twin(task_config, store, outcomes, shutdown_rx).await,
            Role::Authority => run_authority(task_config).await,
        };

        match result {
            Ok(()) => tracing::info!(%role, "service finished"),
            Err(RoleError::Interrupted(what)) => {
                tracing::info!(%role, "stopped while waiting for {}", what)
            }
            Err(e) => tracing::error!(%role, "service error: {}", e),
        }
        // nothing else runs in this process
        let _ = stop_tx.send(());
    });

    tracing::info!(%role, identity = %config.identity, "running");

    Ok(ShutdownHandle {
        graceful_waiter,
        handles: vec![handle],
        shutdown_tx,
    })
}

/// Runs one principal until it finishes or a shutdown signal arrives.
/// Use for CLI binary usage.
pub async fn spawn_service(
    service_config: &ServiceConfig,
    store: Arc<dyn KeyStore>,
) -> anyhow::Result<()> {
    let _guards = init_logging(service_config);
    let handle = start_service(service_config, store, None)?;
    handle.wait().await;
    Ok(())
}
