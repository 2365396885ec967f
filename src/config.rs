//! WolfGate Configuration
//!
//! This module provides configuration structures for the WolfGate
//! coordination gateway.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main WolfGate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WolfGateConfig {
    /// Cluster node list and probe tuning
    pub cluster: ClusterConfig,

    /// Lamport clock simulation configuration
    #[serde(default)]
    pub clocks: ClocksConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// File proxy configuration
    #[serde(default)]
    pub files: FilesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cluster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Ordered list of storage node addresses (host:port).
    /// Position in the list is the node's discovery priority.
    pub nodes: Vec<String>,

    /// Health + leader polling interval in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-node timeout for leader-identity probes in seconds
    #[serde(default = "default_leader_probe_timeout_secs")]
    pub leader_probe_timeout_secs: u64,

    /// Per-node timeout for liveness probes in seconds
    #[serde(default = "default_health_probe_timeout_secs")]
    pub health_probe_timeout_secs: u64,

    /// Liveness endpoint path on each node
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Leader-identity endpoint path on each node
    #[serde(default = "default_leader_path")]
    pub leader_path: String,
}

/// Lamport clock simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClocksConfig {
    /// Participant identifiers (fixed for the process lifetime)
    #[serde(default = "default_participants")]
    pub participants: Vec<String>,

    /// Local-event tick interval in seconds
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable HTTP API
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// HTTP API bind address
    #[serde(default = "default_api_address")]
    pub bind_address: String,

    /// Enable CORS (the reference consumer is a browser UI)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// File proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Enable leader-routed file operations
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Timeout for proxied file requests in seconds
    #[serde(default = "default_file_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log to file path (optional)
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_poll_interval_secs() -> u64 {
    5
}

fn default_leader_probe_timeout_secs() -> u64 {
    3
}

fn default_health_probe_timeout_secs() -> u64 {
    2
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_leader_path() -> String {
    "/leader".to_string()
}

fn default_participants() -> Vec<String> {
    vec!["A".to_string(), "B".to_string()]
}

fn default_tick_interval_secs() -> u64 {
    3
}

fn default_true() -> bool {
    true
}

fn default_api_address() -> String {
    "0.0.0.0:9100".to_string()
}

fn default_file_timeout_secs() -> u64 {
    30
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ClocksConfig {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_api_address(),
            cors_enabled: true,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_timeout_secs: default_file_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl WolfGateConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WolfGateConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: WolfGateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.cluster.nodes.is_empty() {
            return Err(crate::Error::Config("cluster.nodes cannot be empty".into()));
        }

        let mut seen = HashSet::new();
        for node in &self.cluster.nodes {
            if node.is_empty() {
                return Err(crate::Error::Config(
                    "cluster.nodes cannot contain empty addresses".into(),
                ));
            }
            if !seen.insert(node.as_str()) {
                return Err(crate::Error::Config(format!(
                    "cluster.nodes contains duplicate address: {}",
                    node
                )));
            }
        }

        if self.cluster.poll_interval_secs == 0 {
            return Err(crate::Error::Config(
                "cluster.poll_interval_secs must be greater than zero".into(),
            ));
        }

        if self.clocks.participants.is_empty() {
            return Err(crate::Error::Config(
                "clocks.participants cannot be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for participant in &self.clocks.participants {
            if !seen.insert(participant.as_str()) {
                return Err(crate::Error::Config(format!(
                    "clocks.participants contains duplicate id: {}",
                    participant
                )));
            }
        }

        if self.clocks.tick_interval_secs == 0 {
            return Err(crate::Error::Config(
                "clocks.tick_interval_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Get the health + leader polling interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.cluster.poll_interval_secs)
    }

    /// Get the leader probe timeout as Duration
    pub fn leader_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.cluster.leader_probe_timeout_secs)
    }

    /// Get the health probe timeout as Duration
    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.cluster.health_probe_timeout_secs)
    }

    /// Get the clock tick interval as Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.clocks.tick_interval_secs)
    }

    /// Get the file proxy request timeout as Duration
    pub fn file_request_timeout(&self) -> Duration {
        Duration::from_secs(self.files.request_timeout_secs)
    }
}
