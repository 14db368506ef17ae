//! Scan request, result and event models.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::certificate::Certificate;

/// How the raw QR text was (or will be) acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMethod {
    /// Native barcode scanner on iOS/Android.
    CameraNative,
    /// Browser camera stream with a QR decoder.
    CameraWeb,
    /// Picked image or payload file.
    FileUpload,
    /// OS clipboard polled while the app returns to the foreground.
    ClipboardAuto,
    /// Clipboard read on explicit user request.
    ClipboardManual,
    /// Text typed or pasted by the user.
    ManualInput,
}

impl ScanMethod {
    pub const ALL: [ScanMethod; 6] = [
        ScanMethod::CameraNative,
        ScanMethod::CameraWeb,
        ScanMethod::FileUpload,
        ScanMethod::ClipboardAuto,
        ScanMethod::ClipboardManual,
        ScanMethod::ManualInput,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMethod::CameraNative => "camera-native",
            ScanMethod::CameraWeb => "camera-web",
            ScanMethod::FileUpload => "file-upload",
            ScanMethod::ClipboardAuto => "clipboard-auto",
            ScanMethod::ClipboardManual => "clipboard-manual",
            ScanMethod::ManualInput => "manual-input",
        }
    }
}

impl fmt::Display for ScanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        ScanMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("unknown scan method: {}", s))
    }
}

/// Runtime platform of the host application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Web,
    Ios,
    Android,
}

/// Capability table: the methods each platform offers, in presentation order.
const WEB_METHODS: &[ScanMethod] = &[
    ScanMethod::CameraWeb,
    ScanMethod::FileUpload,
    ScanMethod::ClipboardManual,
    ScanMethod::ManualInput,
];

const NATIVE_METHODS: &[ScanMethod] = &[
    ScanMethod::CameraNative,
    ScanMethod::ClipboardAuto,
    ScanMethod::FileUpload,
    ScanMethod::ClipboardManual,
    ScanMethod::ManualInput,
];

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }

    pub fn is_native(&self) -> bool {
        !matches!(self, Platform::Web)
    }

    /// Acquisition methods available on this platform.
    pub fn available_methods(&self) -> &'static [ScanMethod] {
        if self.is_native() {
            NATIVE_METHODS
        } else {
            WEB_METHODS
        }
    }

    /// Method used when the caller has no (usable) preference.
    pub fn default_method(&self) -> ScanMethod {
        self.available_methods()[0]
    }

    pub fn supports(&self, method: ScanMethod) -> bool {
        self.available_methods().contains(&method)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "web" => Ok(Platform::Web),
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Options for a single scan request.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Method to use when available on the current platform.
    pub preferred_method: Option<ScanMethod>,

    /// Text for [`ScanMethod::ManualInput`].
    pub manual_text: Option<String>,

    /// Payload file for [`ScanMethod::FileUpload`].
    pub file_path: Option<PathBuf>,

    /// Overrides the strategy's own timeout.
    pub timeout: Option<Duration>,
}

impl ScanOptions {
    pub fn with_preferred_method(mut self, method: ScanMethod) -> Self {
        self.preferred_method = Some(method);
        self
    }

    pub fn with_manual_text(mut self, text: impl Into<String>) -> Self {
        self.manual_text = Some(text.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of one scan attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Certificate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub method: ScanMethod,

    pub timestamp: DateTime<Utc>,
}

impl ScanResult {
    pub fn succeeded(method: ScanMethod, certificate: Certificate, raw_data: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(certificate),
            raw_data,
            error: None,
            method,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(method: ScanMethod, error: impl Into<String>, raw_data: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            raw_data,
            error: Some(error.into()),
            method,
            timestamp: Utc::now(),
        }
    }
}

/// Lifecycle stage reported on the scan event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanEventKind {
    Start,
    Success,
    Error,
    Cancel,
}

impl ScanEventKind {
    /// Success, error and cancel close an attempt.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanEventKind::Start)
    }
}

/// Informational scan lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    #[serde(rename = "type")]
    pub kind: ScanEventKind,

    pub method: ScanMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Certificate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanEvent {
    pub fn start(method: ScanMethod) -> Self {
        Self { kind: ScanEventKind::Start, method, data: None, error: None }
    }

    pub fn success(method: ScanMethod, certificate: Certificate) -> Self {
        Self { kind: ScanEventKind::Success, method, data: Some(certificate), error: None }
    }

    pub fn error(method: ScanMethod, error: impl Into<String>) -> Self {
        Self { kind: ScanEventKind::Error, method, data: None, error: Some(error.into()) }
    }

    pub fn cancel(method: ScanMethod) -> Self {
        Self { kind: ScanEventKind::Cancel, method, data: None, error: None }
    }
}
