//! Server configuration.
//!
//! Settings come from `~/.config/timetable/config.toml` (or `--config`),
//! then command-line flags and environment variables override them.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use timetable_core::{TracingConfig, TracingOutputFormat};
use timetable_feed::FetchConfig;

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DATABASE_FILE_NAME: &str = "timetable.sqlite";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    pub port: u16,

    /// SQLite database file. Defaults to the user data directory.
    pub database_path: Option<PathBuf>,

    /// Feed download limits.
    pub fetch: FetchSettings,

    pub log_format: TracingOutputFormat,

    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: None,
            fetch: FetchSettings::default(),
            log_format: TracingOutputFormat::default(),
            debug: false,
        }
    }
}

/// Limits for downloading a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub max_bytes: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: FetchConfig::DEFAULT_TIMEOUT_SECS,
            max_bytes: FetchConfig::DEFAULT_MAX_BYTES,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the default path, or defaults if it is absent.
    pub fn load() -> ServerResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ServerError::config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("timetable")
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("timetable")
    }

    /// The database file to open: the configured one or the default.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Parses `host` and `port` into a bind address.
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ServerError::config(format!("invalid host address: {}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .with_timeout(Duration::from_secs(self.fetch.timeout_secs))
            .with_max_bytes(self.fetch.max_bytes)
    }

    pub fn tracing_config(&self) -> TracingConfig {
        let base = if self.debug {
            TracingConfig::debug()
        } else {
            TracingConfig::server()
        };
        base.with_format(self.log_format)
    }

    /// Builder: set the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder: set the database file.
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }
}
