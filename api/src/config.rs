//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `FORMDESK__`-prefixed environment variables
//! (`FORMDESK__STORAGE__BACKEND=sqlite`).

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use formdesk_forms::{AnalyticsConfig, PatternPolicy};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "FORMDESK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "formdesk.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitSettings,
    pub limits: LimitsConfig,
    pub validation: ValidationConfig,
    pub analytics: AnalyticsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            environment: "development".into(),
            storage: StorageConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitSettings::default(),
            limits: LimitsConfig::default(),
            validation: ValidationConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the file named by `FORMDESK_CONFIG` (default `formdesk.toml`)
    /// and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(path)
    }

    /// A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("FORMDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: String,
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Memory, path: "formdesk.db".into(), busy_timeout_ms: 5_000 }
    }
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: vec!["http://localhost:3000".into(), "http://localhost:3001".into()] }
    }
}

/// Per-client request budget: `max_requests` per `window_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { window_secs: 900, max_requests: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { body_bytes: 10 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub pattern_policy: PatternPolicy,
}
