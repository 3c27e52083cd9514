//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

use timetable_core::TracingOutputFormat;

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// timetable-server - iCal feed import and manual timetable entries over HTTP
#[derive(Debug, Parser)]
#[command(name = "timetable-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "TIMETABLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, short, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "TIMETABLE_HOST")]
    pub host: Option<String>,

    /// SQLite database file
    #[arg(long, env = "TIMETABLE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Feed download timeout in seconds
    #[arg(long)]
    pub fetch_timeout: Option<u64>,

    /// Maximum feed size in bytes
    #[arg(long)]
    pub max_feed_bytes: Option<usize>,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "TIMETABLE_LOG_FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

impl Cli {
    /// Loads the config file, then applies flag and environment overrides.
    pub fn load_config(&self) -> ServerResult<ServerConfig> {
        let config = match self.config {
            Some(ref path) => ServerConfig::load_from(path)?,
            None => ServerConfig::load()?,
        };
        Ok(self.apply(config))
    }

    pub fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(ref database) = self.database {
            config.database_path = Some(database.clone());
        }
        if let Some(timeout) = self.fetch_timeout {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(max_bytes) = self.max_feed_bytes {
            config.fetch.max_bytes = max_bytes;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        config.debug |= self.debug;
        config
    }
}
