//! Core library for zoosanitary certificate QR processing.
//!
//! This crate provides:
//! - Text normalization and weighted schema scoring of scanned QR text
//! - Certificate field extraction and post-extraction validation
//! - A scan orchestrator with pluggable acquisition strategies (feature `scanner`)

pub mod certificate;
pub mod error;
pub mod models;
#[cfg(feature = "scanner")]
pub mod scanner;

pub use certificate::{parse_qr_to_certificate, CertificateParser};
pub use error::{AcquisitionError, ConfigError, Result, ScanError, ZoocertError};
pub use models::certificate::{Certificate, ManualCertificateInput, ParseResult, ValidationResult};
pub use models::config::ZoocertConfig;
pub use models::scan::{Platform, ScanEvent, ScanEventKind, ScanMethod, ScanOptions, ScanResult};

#[cfg(feature = "scanner")]
pub use scanner::{AcquisitionStrategy, CancelToken, QrScanner};
