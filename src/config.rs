use serde::Deserialize;

use crate::error::CollectorError;

pub const DEFAULT_LOG_FILE: &str = "collector.log";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub register_endpoint: String,
    pub metrics_endpoint: String,
}

/// Identity overrides; each field is either a literal or the sentinel "auto".
/// `name` may be omitted entirely (synthesized from the hostname).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub hostname: String,
    pub ip_address: String,
    pub os_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_seconds() -> u64 {
    2
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            retry_attempts: default_retry_attempts(),
            retry_delay_seconds: default_retry_delay_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Append-only log sink, written alongside console output.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl AppConfig {
    /// Load from CONFIG_FILE (default config.toml). Missing file and
    /// malformed content are distinct fatal errors; no network activity
    /// happens before this succeeds.
    pub fn load() -> Result<Self, CollectorError> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CollectorError::ConfigNotFound(path.clone())
            } else {
                CollectorError::ConfigInvalid(format!("{}: {}", path, e))
            }
        })?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self, CollectorError> {
        let config: AppConfig =
            toml::from_str(s).map_err(|e| CollectorError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CollectorError> {
        ensure(!self.backend.url.is_empty(), "backend.url must be non-empty")?;
        ensure(
            !self.backend.register_endpoint.is_empty(),
            "backend.register_endpoint must be non-empty",
        )?;
        ensure(
            !self.backend.metrics_endpoint.is_empty(),
            "backend.metrics_endpoint must be non-empty",
        )?;
        ensure(
            !self.server.hostname.is_empty(),
            "server.hostname must be non-empty (use \"auto\" to detect)",
        )?;
        ensure(
            !self.server.ip_address.is_empty(),
            "server.ip_address must be non-empty (use \"auto\" to detect)",
        )?;
        ensure(
            !self.server.os_type.is_empty(),
            "server.os_type must be non-empty (use \"auto\" to detect)",
        )?;
        ensure(
            self.collection.interval_seconds > 0,
            "collection.interval_seconds must be > 0",
        )?;
        ensure(
            self.collection.retry_attempts > 0,
            "collection.retry_attempts must be > 0",
        )?;
        ensure(!self.logging.file.is_empty(), "logging.file must be non-empty")?;
        Ok(())
    }
}

fn ensure(cond: bool, msg: &str) -> Result<(), CollectorError> {
    if cond {
        Ok(())
    } else {
        Err(CollectorError::ConfigInvalid(msg.into()))
    }
}
