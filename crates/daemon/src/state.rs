//! On-disk state for a twinrelay principal
//!
//! Each principal (trusted authority, edge, or twin) owns a state
//! directory (`~/.twinrelay` or a custom path) holding its `config.toml`
//! and whatever key material it has been provisioned with.

use std::fmt;
use std::time::Duration;
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use common::keystore::FileKeyStore;
use common::pre::{Freshness, FRESHNESS_WINDOW_SECS};
use common::registry::{Identity, Registry};

use crate::service_config::Config as ServiceConfig;
use crate::transport::MAX_CONNECTIONS_LIMIT;

pub const APP_NAME: &str = "twinrelay";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Which principal a state directory belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Authority,
    Edge,
    Twin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Authority => "authority",
            Role::Edge => "edge",
            Role::Twin => "twin",
        };
        write!(f, "{}", name)
    }
}

fn default_freshness_window() -> f64 {
    FRESHNESS_WINDOW_SECS
}

fn default_max_connections() -> usize {
    64
}

fn default_read_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    5
}

/// Configuration stored in config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Our name in the registry. Meaningful for twins only.
    pub identity: Identity,
    pub role: Role,
    /// Maximum accepted age of a timestamp, in seconds
    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: f64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Directory for log files (stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Everyone's addresses
    #[serde(default)]
    pub registry: Registry,
}

impl AppConfig {
    pub fn new(identity: Identity, role: Role) -> Self {
        Self {
            identity,
            role,
            freshness_window_secs: default_freshness_window(),
            max_connections: default_max_connections(),
            read_timeout_secs: default_read_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            log_dir: None,
            registry: Registry::default(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// The freshness window as the protocol uses it
    pub fn freshness(&self) -> Result<Freshness, StateError> {
        Freshness::new(self.freshness_window_secs)
            .map_err(|e| StateError::InvalidConfig(e.to_string()))
    }

    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> Result<(), StateError> {
        self.freshness()?;
        if self.max_connections == 0 || self.max_connections > MAX_CONNECTIONS_LIMIT {
            return Err(StateError::InvalidConfig(format!(
                "max_connections must be between 1 and {}, got {}",
                MAX_CONNECTIONS_LIMIT, self.max_connections
            )));
        }
        Ok(())
    }
}

/// Application state representing a twinrelay state directory
#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.twinrelay or custom)
    pub dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.twinrelay)
    pub fn dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory. Key material is not created here;
    /// it arrives from the trusted authority at first start.
    pub fn init(custom_path: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let dir = Self::dir(custom_path)?;

        if dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        config.validate()?;
        if config.role == Role::Twin && config.registry.twin(&config.identity).is_none() {
            return Err(StateError::UnknownIdentity(config.identity.to_string()));
        }

        fs::create_dir_all(&dir)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = Self::dir(custom_path)?;

        if !dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        config.validate()?;

        Ok(Self {
            dir,
            config_path,
            config,
        })
    }

    /// Load or initialize state, writing `default_config` if nothing is there yet
    pub fn load_or_init(
        custom_path: Option<PathBuf>,
        default_config: AppConfig,
    ) -> Result<Self, StateError> {
        match Self::load(custom_path.clone()) {
            Ok(state) => Ok(state),
            Err(StateError::NotInitialized) => Self::init(custom_path, default_config),
            Err(e) => Err(e),
        }
    }

    /// Where provisioned keys live
    pub fn key_store(&self) -> FileKeyStore {
        FileKeyStore::new(&self.dir)
    }

    /// Convert to ServiceConfig for the daemon
    pub fn to_service_config(
        &self,
        log_level: tracing::Level,
    ) -> Result<ServiceConfig, StateError> {
        Ok(ServiceConfig {
            identity: self.config.identity.clone(),
            role: self.config.role,
            registry: self.config.registry.clone(),
            max_connections: self.config.max_connections,
            read_timeout: self.config.read_timeout(),
            connect_timeout: self.config.connect_timeout(),
            freshness: self.config.freshness()?,
            log_level,
            log_dir: self.config.log_dir.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("twinrelay directory not initialized. Run 'twinrelay init' first or use --config-path")]
    NotInitialized,

    #[error("twinrelay directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("identity {0} has no entry in the registry")]
    UnknownIdentity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
