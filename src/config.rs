//! Application configuration.
//!
//! Values are resolved once at startup with priority
//! `config.toml` > environment (`.env` loaded via dotenvy) > default.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::attendance::network::NetworkPrefix;
use crate::paths;

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: u16 = 5332;

// ==================== Config File ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    admin: Option<AdminSection>,
    network: Option<NetworkSection>,
    storage: Option<StorageSection>,
    server: Option<ServerSection>,
}

#[derive(Debug, Deserialize)]
struct AdminSection {
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NetworkSection {
    allowed_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StorageSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ADMIN_PASSWORD is not set")]
    MissingAdminPassword,

    #[error("invalid allowed network prefix {0:?}")]
    InvalidPrefix(String),

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("config.toml: {0}")]
    File(#[from] toml::de::Error),
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Password the reserved `admin` account is seeded with
    pub admin_password: String,
    /// Network check-ins must originate from; `None` accepts any address
    pub allowed_prefix: Option<NetworkPrefix>,
    /// Base directory for snapshots, uploads and exports
    pub data_dir: PathBuf,
    pub port: u16,
}

impl Config {
    /// Load configuration from config.toml, .env and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file = match std::fs::read_to_string("config.toml") {
            Ok(contents) => {
                tracing::info!("Using config.toml");
                toml::from_str(&contents)?
            }
            Err(_) => FileConfig::default(),
        };

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let admin_password = file
            .admin
            .and_then(|a| a.password)
            .or_else(|| env("ADMIN_PASSWORD"))
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingAdminPassword)?;

        // ALLOWED_SUBNET takes a dotted prefix ("192.168"); the older
        // VALID_IP_ADDR_1 / VALID_IP_ADDR_2 pair names the two octets.
        let prefix_source = file
            .network
            .and_then(|n| n.allowed_prefix)
            .or_else(|| env("ALLOWED_SUBNET"))
            .or_else(|| match (env("VALID_IP_ADDR_1"), env("VALID_IP_ADDR_2")) {
                (Some(a), Some(b)) => Some(format!("{}.{}", a, b)),
                _ => None,
            })
            .filter(|p| !p.trim().is_empty());
        let allowed_prefix = prefix_source
            .map(|p| p.parse().map_err(|_| ConfigError::InvalidPrefix(p)))
            .transpose()?;

        let data_dir = file
            .storage
            .and_then(|s| s.path)
            .or_else(|| env("APP_DB_PATH"))
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(paths::DEFAULT_DATA_DIR));

        let port = match file.server.and_then(|s| s.port) {
            Some(port) => port,
            None => match env("PORT") {
                Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
                None => DEFAULT_PORT,
            },
        };

        Ok(Self {
            admin_password,
            allowed_prefix,
            data_dir,
            port,
        })
    }

    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", SERVER_ADDR, self.port)
    }
}
