//! Configuration for the echo server and client.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::connection::Endpoint;
use crate::delay::ProcessingDelay;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "reverb")]
#[command(version = "0.1.0")]
#[command(about = "A concurrent uppercase-reverse echo server and client", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub role: Role,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to or connect to (e.g., 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to or connect to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum bytes handed out by a single read call
    #[arg(long)]
    pub read_cap: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Which side of the protocol this process runs.
#[derive(Subcommand, Debug, Clone)]
pub enum Role {
    /// Run the echo server
    Serve {
        /// Upper bound of the random processing delay in milliseconds
        /// (0 disables the delay)
        #[arg(long)]
        max_delay_ms: Option<u64>,
    },
    /// Run the interactive client
    Connect,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to or connect to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to or connect to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum bytes handed out by a single read call
    #[serde(default = "default_read_cap")]
    pub read_cap: usize,
    /// Lower bound of the random processing delay in milliseconds
    #[serde(default)]
    pub min_delay_ms: u64,
    /// Upper bound of the random processing delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_cap: default_read_cap(),
            min_delay_ms: 0,
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7770
}

fn default_read_cap() -> usize {
    1024
}

fn default_max_delay_ms() -> u64 {
    // Matches the reference behavior of sleeping up to two seconds.
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which role the resolved configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Connect,
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub host: String,
    pub port: u16,
    pub read_cap: usize,
    pub delay: ProcessingDelay,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Self::resolve(cli, toml_config)
    }

    /// Merge CLI args with TOML config (CLI takes precedence).
    fn resolve(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let (mode, cli_max_delay) = match cli.role {
            Role::Serve { max_delay_ms } => (Mode::Serve, max_delay_ms),
            Role::Connect => (Mode::Connect, None),
        };

        let min_delay_ms = toml_config.server.min_delay_ms;
        let max_delay_ms = cli_max_delay.unwrap_or(toml_config.server.max_delay_ms);
        if min_delay_ms > max_delay_ms {
            return Err(ConfigError::DelayBounds {
                min_ms: min_delay_ms,
                max_ms: max_delay_ms,
            });
        }

        let read_cap = cli.read_cap.unwrap_or(toml_config.server.read_cap);
        if read_cap == 0 {
            return Err(ConfigError::ZeroReadCap);
        }

        let delay = if max_delay_ms == 0 {
            ProcessingDelay::None
        } else {
            ProcessingDelay::Uniform {
                min_ms: min_delay_ms,
                max_ms: max_delay_ms,
            }
        };

        Ok(Config {
            mode,
            host: cli.host.unwrap_or(toml_config.server.host),
            port: cli.port.unwrap_or(toml_config.server.port),
            read_cap,
            delay,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }

    /// The endpoint this configuration binds or connects to.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    DelayBounds { min_ms: u64, max_ms: u64 },
    ZeroReadCap,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::DelayBounds { min_ms, max_ms } => {
                write!(
                    f,
                    "min_delay_ms ({min_ms}) must not exceed max_delay_ms ({max_ms})"
                )
            }
            ConfigError::ZeroReadCap => {
                write!(f, "read_cap must be at least 1 byte")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
