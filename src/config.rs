//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the active policy version.
pub const POLICY_VERSION_ENV: &str = "GATEKEEPER_POLICY_VERSION";

/// Configuration for the gatekeeper engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The policy version served to evaluations
    #[serde(default = "default_policy_version")]
    pub policy_version: String,
    /// Store collaborator settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Telemetry settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Parse configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        serde_yaml::from_str(yaml).map_err(crate::Error::from)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Apply environment overrides (`GATEKEEPER_POLICY_VERSION`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(version) = std::env::var(POLICY_VERSION_ENV) {
            if !version.is_empty() {
                self.policy_version = version;
            }
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy_version: default_policy_version(),
            store: StoreConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

fn default_policy_version() -> String {
    "v0".to_string()
}

/// Settings for the HTTP store collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl StoreConfig {
    /// The request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    2_000
}

/// Telemetry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether telemetry collection is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Service name reported with telemetry
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: default_service_name(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_service_name() -> String {
    "gatekeeper-engine".to_string()
}
