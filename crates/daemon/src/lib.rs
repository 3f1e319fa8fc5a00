// Service modules (daemon functionality)
pub mod process;
pub mod roles;
pub mod service_config;
pub mod transport;

// App state (configuration, paths)
pub mod state;

// Re-exports for consumers
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use roles::{Delivery, Destination, Edge, Originator, RoleError, TrustedAuthority};
pub use service_config::Config as ServiceConfig;
pub use state::{AppConfig, AppState, Role, StateError};
