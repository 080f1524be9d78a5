use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::trace;

/// Durable alert history backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory history (lost on restart)
    Memory,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./alert_history.db")
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub space: SpaceConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiSettings,
}

/// Settings for the shared space: rolling window, spike detection, alert TTL
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SpaceConfig {
    #[serde(default = "default_price_window_minutes")]
    pub price_window_minutes: u32,

    #[serde(default = "default_alert_ttl_seconds")]
    pub alert_ttl_seconds: u64,

    #[serde(default = "default_spike_threshold_multiplier")]
    pub spike_threshold_multiplier: f64,

    /// Upper bound for a single shared store call
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            price_window_minutes: default_price_window_minutes(),
            alert_ttl_seconds: default_alert_ttl_seconds(),
            spike_threshold_multiplier: default_spike_threshold_multiplier(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl SpaceConfig {
    pub fn window_duration_ms(&self) -> i64 {
        i64::from(self.price_window_minutes) * 60 * 1000
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_secs(self.alert_ttl_seconds)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Multiplier as a decimal; `None` if it is not a finite number.
    pub fn threshold_multiplier(&self) -> Option<Decimal> {
        Decimal::from_f64(self.spike_threshold_multiplier)
    }
}

fn default_price_window_minutes() -> u32 {
    15
}

fn default_alert_ttl_seconds() -> u64 {
    300
}

fn default_spike_threshold_multiplier() -> f64 {
    2.0
}

fn default_operation_timeout_ms() -> u64 {
    2000
}

/// Settings for the alert history drain worker
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl PersistenceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_poll_interval_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiSettings {
    #[serde(default = "crate::util::get_default_bind_addr")]
    pub bind_addr: SocketAddr,

    pub auth_token: Option<String>,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind_addr: crate::util::get_default_bind_addr(),
            auth_token: None,
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_enable_cors() -> bool {
    true
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.space.price_window_minutes == 0 {
            anyhow::bail!("space.price_window_minutes must be positive");
        }
        if self.space.alert_ttl_seconds == 0 {
            anyhow::bail!("space.alert_ttl_seconds must be positive");
        }
        match self.space.threshold_multiplier() {
            Some(multiplier) if multiplier > Decimal::ZERO => {}
            _ => anyhow::bail!(
                "space.spike_threshold_multiplier must be a positive number, got {}",
                self.space.spike_threshold_multiplier
            ),
        }
        if self.space.operation_timeout_ms == 0 {
            anyhow::bail!("space.operation_timeout_ms must be positive");
        }
        if self.persistence.batch_size == 0 {
            anyhow::bail!("persistence.batch_size must be positive");
        }
        if self.persistence.poll_interval_ms == 0 {
            anyhow::bail!("persistence.poll_interval_ms must be positive");
        }
        Ok(())
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;
    config.validate()?;
    trace!("loaded config: {config:?}");
    Ok(config)
}
