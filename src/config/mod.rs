//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::util::rate_limit::INPUT_RATE_LIMIT;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory holding the static web client
    pub public_dir: PathBuf,
    /// Allowed client origins for CORS; empty means any origin
    pub client_origins: Vec<String>,
    /// Fixed seed for spawn and respawn randomness
    pub arena_seed: Option<u64>,
    /// Inbound messages allowed per connection per second
    pub input_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let client_origins = lookup("CLIENT_ORIGIN")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let arena_seed = lookup("ARENA_SEED")
            .map(|s| s.parse::<u64>().map_err(|_| ConfigError::InvalidNumber("ARENA_SEED")))
            .transpose()?;

        let input_rate_limit = lookup("INPUT_RATE_LIMIT")
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|_| ConfigError::InvalidNumber("INPUT_RATE_LIMIT"))
            })
            .transpose()?
            .unwrap_or(INPUT_RATE_LIMIT);

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            public_dir: lookup("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),

            client_origins,
            arena_seed,
            input_rate_limit,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid number in environment variable: {0}")]
    InvalidNumber(&'static str),
}
