//! Configuration structures for the certificate pipeline and scanner.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration for zoocert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoocertConfig {
    /// Pre-extraction schema scoring.
    pub schema: SchemaConfig,

    /// Post-extraction certificate validation.
    pub validation: ValidationConfig,

    /// Acquisition strategies and orchestrator.
    pub scanner: ScannerConfig,
}

/// Schema scorer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Minimum weighted score (before capping at 100) to accept text as a certificate.
    pub min_score: u32,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self { min_score: 90 }
    }
}

/// Certificate validator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Warn when the certificate expires within this many days.
    pub expiry_warning_days: i64,

    /// Score deducted when no vehicle is given.
    pub vehicle_penalty: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expiry_warning_days: 3,
            vehicle_penalty: 5,
        }
    }
}

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Timeout for camera strategies.
    pub camera_timeout_secs: u64,

    /// Timeout for clipboard auto-detection.
    pub clipboard_timeout_secs: u64,

    /// Interval between clipboard reads.
    pub clipboard_poll_interval_ms: u64,

    /// Largest payload file accepted by the file strategy.
    pub max_file_size_bytes: u64,

    /// Payload file extensions accepted by the file strategy.
    pub allowed_file_extensions: Vec<String>,

    /// Buffered events per subscriber.
    pub event_capacity: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            camera_timeout_secs: 30,
            clipboard_timeout_secs: 60,
            clipboard_poll_interval_ms: 1000,
            max_file_size_bytes: 10 * 1024 * 1024,
            allowed_file_extensions: ["txt", "text", "json", "csv"]
                .into_iter()
                .map(String::from)
                .collect(),
            event_capacity: 32,
        }
    }
}

impl ScannerConfig {
    pub fn camera_timeout(&self) -> Duration {
        Duration::from_secs(self.camera_timeout_secs)
    }

    pub fn clipboard_timeout(&self) -> Duration {
        Duration::from_secs(self.clipboard_timeout_secs)
    }

    pub fn clipboard_poll_interval(&self) -> Duration {
        Duration::from_millis(self.clipboard_poll_interval_ms)
    }
}

impl ZoocertConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.min_score > 100 {
            return Err(ConfigError::Invalid(format!(
                "schema.min_score must be at most 100, got {}",
                self.schema.min_score
            )));
        }
        if self.validation.expiry_warning_days < 0 {
            return Err(ConfigError::Invalid(
                "validation.expiry_warning_days must not be negative".to_string(),
            ));
        }

        let scanner = &self.scanner;
        if scanner.camera_timeout_secs == 0 || scanner.clipboard_timeout_secs == 0 {
            return Err(ConfigError::Invalid("scanner timeouts must be positive".to_string()));
        }
        if scanner.clipboard_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scanner.clipboard_poll_interval_ms must be positive".to_string(),
            ));
        }
        if scanner.clipboard_poll_interval() > scanner.clipboard_timeout() {
            return Err(ConfigError::Invalid(
                "scanner.clipboard_poll_interval_ms exceeds the clipboard timeout".to_string(),
            ));
        }
        if scanner.event_capacity == 0 {
            return Err(ConfigError::Invalid("scanner.event_capacity must be positive".to_string()));
        }

        Ok(())
    }
}
