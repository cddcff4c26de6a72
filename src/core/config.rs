//! # Configuration Module
//!
//! Configuration structures and loading for the reconciler daemon.
//!
//! ## Key Features
//! - YAML/JSON configuration parsing with serde
//! - Environment variable override support (`RECONCILER_*`)
//! - Human-readable durations ("1m", "5m", "10s") via humantime
//! - Validation that collects every problem into one error message

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::InstanceUrl;

/// Top-level reconciler configuration
///
/// The `fleet` and `store` sections select and parameterize the concrete
/// adapters; `maintenance` and `observability` are optional and fall back to
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Fleet membership provider selection
    pub fleet: FleetConfig,

    /// Configuration store selection
    pub store: StoreConfig,

    /// Pass cadence and timeout policy
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Logging and metrics settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl ReconcilerConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> ReconcilerResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReconcilerError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: ReconcilerConfig = serde_yaml::from_str(&content)
            .map_err(|e| ReconcilerError::config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub async fn load_from_json<P: AsRef<Path>>(path: P) -> ReconcilerResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReconcilerError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: ReconcilerConfig = serde_json::from_str(&content)
            .map_err(|e| ReconcilerError::config(format!("Failed to parse JSON config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a path, dispatching on the file extension
    pub async fn load<P: AsRef<Path>>(path: P) -> ReconcilerResult<Self> {
        if path.as_ref().extension().and_then(|s| s.to_str()) == Some("json") {
            Self::load_from_json(path).await
        } else {
            Self::load_from_file(path).await
        }
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Environment variables follow the pattern: RECONCILER_<FIELD>
    /// For example: RECONCILER_RECURRING_DELAY=2m
    pub fn apply_env_overrides(&mut self) -> ReconcilerResult<()> {
        use std::env;

        if let Ok(delay) = env::var("RECONCILER_BOOTSTRAP_DELAY") {
            self.maintenance.bootstrap_delay = humantime::parse_duration(&delay)
                .map_err(|e| {
                    ReconcilerError::config(format!("Invalid RECONCILER_BOOTSTRAP_DELAY: {}", e))
                })?;
        }

        if let Ok(delay) = env::var("RECONCILER_RECURRING_DELAY") {
            self.maintenance.recurring_delay = humantime::parse_duration(&delay)
                .map_err(|e| {
                    ReconcilerError::config(format!("Invalid RECONCILER_RECURRING_DELAY: {}", e))
                })?;
        }

        if let Ok(timeout) = env::var("RECONCILER_CALL_TIMEOUT") {
            self.maintenance.call_timeout = humantime::parse_duration(&timeout)
                .map_err(|e| {
                    ReconcilerError::config(format!("Invalid RECONCILER_CALL_TIMEOUT: {}", e))
                })?;
        }

        if let Ok(jitter) = env::var("RECONCILER_TICK_JITTER") {
            self.maintenance.tick_jitter = humantime::parse_duration(&jitter)
                .map_err(|e| {
                    ReconcilerError::config(format!("Invalid RECONCILER_TICK_JITTER: {}", e))
                })?;
        }

        if let Ok(drain) = env::var("RECONCILER_DRAIN_ON_SHUTDOWN") {
            self.maintenance.drain_on_shutdown = drain.parse().map_err(|e| {
                ReconcilerError::config(format!("Invalid RECONCILER_DRAIN_ON_SHUTDOWN: {}", e))
            })?;
        }

        if let Ok(level) = env::var("RECONCILER_LOG_LEVEL") {
            self.observability.logging.level = level;
        }

        if let Ok(format) = env::var("RECONCILER_LOG_FORMAT") {
            self.observability.logging.format = format;
        }

        if let Ok(enabled) = env::var("RECONCILER_METRICS_ENABLED") {
            self.observability.metrics.enabled = enabled.parse().map_err(|e| {
                ReconcilerError::config(format!("Invalid RECONCILER_METRICS_ENABLED: {}", e))
            })?;
        }

        if let Ok(addr) = env::var("RECONCILER_METRICS_LISTEN_ADDRESS") {
            self.observability.metrics.listen_address = addr;
        }

        Ok(())
    }

    /// Configuration validation with detailed error messages
    ///
    /// Collects every problem before failing so a bad file is fixed in one
    /// round trip.
    pub fn validate(&self) -> ReconcilerResult<()> {
        let mut errors = Vec::new();

        // Validate cadence values
        if self.maintenance.recurring_delay.is_zero() {
            errors.push("recurring_delay must be greater than 0".to_string());
        }

        if self.maintenance.call_timeout.is_zero() {
            errors.push("call_timeout must be greater than 0".to_string());
        }

        if !self.maintenance.tick_jitter.is_zero()
            && self.maintenance.tick_jitter >= self.maintenance.recurring_delay
        {
            errors.push(format!(
                "tick_jitter ({:?}) must be smaller than recurring_delay ({:?})",
                self.maintenance.tick_jitter, self.maintenance.recurring_delay
            ));
        }

        // Validate fleet provider configuration
        match &self.fleet {
            FleetConfig::Static { instances, self_address } => {
                for instance in instances {
                    if let Err(e) = InstanceUrl::parse(instance) {
                        errors.push(format!("Invalid static fleet instance '{}': {}", instance, e));
                    }
                }
                if let Some(addr) = self_address {
                    if let Err(e) = InstanceUrl::parse(addr) {
                        errors.push(format!("Invalid static fleet self_address '{}': {}", addr, e));
                    }
                }
            }
            FleetConfig::Dns { service_host, port, self_address } => {
                if service_host.is_empty() {
                    errors.push("DNS fleet service_host cannot be empty".to_string());
                }
                if *port == 0 {
                    errors.push("DNS fleet port must be greater than 0".to_string());
                }
                if let Some(addr) = self_address {
                    if let Err(e) = InstanceUrl::parse(addr) {
                        errors.push(format!("Invalid DNS fleet self_address '{}': {}", addr, e));
                    }
                }
            }
            FleetConfig::Http { endpoint } => {
                if let Err(e) = url::Url::parse(endpoint) {
                    errors.push(format!("Invalid HTTP fleet endpoint '{}': {}", endpoint, e));
                }
            }
        }

        // Validate store configuration
        match &self.store {
            StoreConfig::Memory { initial } => {
                for entry in initial {
                    if let Err(e) = InstanceUrl::parse(entry) {
                        errors.push(format!("Invalid initial store entry '{}': {}", entry, e));
                    }
                }
            }
            StoreConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    errors.push("File store path cannot be empty".to_string());
                }
            }
            StoreConfig::HttpAdmin { base_url, .. } => {
                if let Err(e) = url::Url::parse(base_url) {
                    errors.push(format!("Invalid HTTP admin store base_url '{}': {}", base_url, e));
                }
            }
        }

        // Validate observability configuration
        match self.observability.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => errors.push(format!("Invalid log level: {}", self.observability.logging.level)),
        }

        match self.observability.logging.format.to_lowercase().as_str() {
            "json" | "text" => {}
            _ => errors.push(format!("Invalid log format: {}", self.observability.logging.format)),
        }

        if self.observability.metrics.enabled {
            if let Err(e) = self.observability.metrics.listen_address.parse::<SocketAddr>() {
                errors.push(format!(
                    "Invalid metrics listen_address '{}': {}",
                    self.observability.metrics.listen_address, e
                ));
            }
        }

        if !errors.is_empty() {
            return Err(ReconcilerError::config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )));
        }

        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            fleet: FleetConfig::Static {
                instances: Vec::new(),
                self_address: None,
            },
            store: StoreConfig::Memory { initial: Vec::new() },
            maintenance: MaintenanceConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Fleet membership provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FleetConfig {
    /// Fixed list of instance URLs
    Static {
        instances: Vec<String>,
        #[serde(default)]
        self_address: Option<String>,
    },

    /// Resolve a service hostname (headless DNS record) to instance addresses
    Dns {
        service_host: String,
        port: u16,
        #[serde(default)]
        self_address: Option<String>,
    },

    /// Query a platform metadata endpoint for the fleet snapshot
    Http { endpoint: String },
}

/// Configuration store selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Process-local store, lost on restart
    Memory {
        #[serde(default)]
        initial: Vec<String>,
    },

    /// JSON document on disk, replaced atomically
    File { path: PathBuf },

    /// Load-balancer admin REST endpoint
    HttpAdmin {
        base_url: String,
        #[serde(default)]
        auth_token: Option<String>,
    },
}

/// Pass cadence and timeout policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Delay before the first scheduled pass after startup
    #[serde(with = "humantime_serde")]
    pub bootstrap_delay: Duration,

    /// Interval between recurring passes
    #[serde(with = "humantime_serde")]
    pub recurring_delay: Duration,

    /// Upper bound on any single fleet/store call
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,

    /// Random extra delay per tick, spreading concurrent writers
    /// (zero disables jitter)
    #[serde(with = "humantime_serde", default)]
    pub tick_jitter: Duration,

    /// Run a final self-excluding pass when the process shuts down
    #[serde(default = "default_drain_on_shutdown")]
    pub drain_on_shutdown: bool,
}

fn default_drain_on_shutdown() -> bool {
    true
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            bootstrap_delay: Duration::from_secs(60),
            recurring_delay: Duration::from_secs(300),
            call_timeout: Duration::from_secs(10),
            tick_jitter: Duration::ZERO,
            drain_on_shutdown: true,
        }
    }
}

/// Logging and metrics settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter
    pub enabled: bool,

    /// Listen address for the Prometheus scrape endpoint
    pub listen_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: "0.0.0.0:9090".to_string(),
        }
    }
}
