//! Error types for the zoocert-core library.

use std::time::Duration;

use thiserror::Error;

use crate::models::scan::{Platform, ScanMethod};

/// Main error type for the zoocert library.
#[derive(Error, Debug)]
pub enum ZoocertError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scan orchestration error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the scan orchestrator.
///
/// Only [`ScanError::Concurrency`] is ever returned as an `Err` from the
/// orchestrator's public methods. The other variants are rendered into
/// `ScanResult::error` through their `Display` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A scan was requested while another one is still in flight.
    #[error("Ya hay un escaneo en progreso")]
    Concurrency,

    /// The acquisition strategy failed; the message is the strategy's own.
    #[error("{0}")]
    Acquisition(String),

    /// Acquired text is not a valid certificate.
    #[error("{0}")]
    ContentValidation(String),

    /// The method is not available on the current platform.
    #[error("Método de escaneo '{method}' no disponible en la plataforma '{platform}'")]
    UnsupportedMethod { method: ScanMethod, platform: Platform },
}

/// Failures reported by acquisition strategies.
///
/// The `Display` output is passed verbatim to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    /// The scan was cancelled before it produced any text.
    #[error("Escaneo cancelado")]
    Cancelled,

    /// The strategy did not produce text in time.
    #[error("Tiempo de espera agotado después de {}s", .after.as_secs())]
    TimedOut { after: Duration },

    /// The user or the OS refused access to the device.
    #[error("Permiso denegado: {0}")]
    PermissionDenied(String),

    /// The source had nothing to read.
    #[error("{0}")]
    Empty(String),

    /// The selected file cannot be used.
    #[error("Archivo no soportado: {0}")]
    UnsupportedFile(String),

    /// Any other strategy failure.
    #[error("{0}")]
    Failed(String),
}

impl From<AcquisitionError> for ScanError {
    fn from(err: AcquisitionError) -> Self {
        ScanError::Acquisition(err.to_string())
    }
}

/// Errors related to configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for the zoocert library.
pub type Result<T> = std::result::Result<T, ZoocertError>;
