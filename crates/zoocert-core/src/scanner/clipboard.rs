//! Clipboard acquisition strategies.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::AcquisitionError;
use crate::models::config::ScannerConfig;
use crate::models::scan::ScanOptions;

use super::cancel::CancelToken;
use super::strategy::{AcquisitionResult, AcquisitionStrategy};

pub const EMPTY_CLIPBOARD: &str = "El portapapeles está vacío";

/// Read access to the host clipboard.
#[async_trait]
pub trait ClipboardSource: Send + Sync {
    /// Current clipboard text, `None` when the clipboard holds no text.
    async fn read_text(&self) -> Result<Option<String>, AcquisitionError>;
}

#[async_trait]
impl<T: ClipboardSource + ?Sized> ClipboardSource for Arc<T> {
    async fn read_text(&self) -> Result<Option<String>, AcquisitionError> {
        (**self).read_text().await
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}

/// Reads the clipboard once, on explicit user request.
pub struct ClipboardManualStrategy<S> {
    source: S,
}

impl<S: ClipboardSource> ClipboardManualStrategy<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: ClipboardSource> AcquisitionStrategy for ClipboardManualStrategy<S> {
    async fn scan(&self, _options: &ScanOptions, cancel: CancelToken) -> AcquisitionResult {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AcquisitionError::Cancelled),
            read = self.source.read_text() => {
                non_empty(read?).ok_or_else(|| AcquisitionError::Empty(EMPTY_CLIPBOARD.to_string()))
            }
        }
    }
}

/// Polls the clipboard until its content changes.
///
/// The clipboard is snapshotted when the scan starts; the first different,
/// non-empty text wins. The poll loop races the timeout, the orchestrator's
/// token and [`AcquisitionStrategy::cancel_scan`].
pub struct ClipboardAutoStrategy<S> {
    source: S,
    timeout: Duration,
    poll_interval: Duration,
    active: Mutex<Option<CancelToken>>,
}

impl<S: ClipboardSource> ClipboardAutoStrategy<S> {
    pub fn new(source: S) -> Self {
        Self::from_config(source, &ScannerConfig::default())
    }

    pub fn from_config(source: S, config: &ScannerConfig) -> Self {
        Self {
            source,
            timeout: config.clipboard_timeout(),
            poll_interval: config.clipboard_poll_interval(),
            active: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn set_active(&self, token: Option<CancelToken>) {
        if let Ok(mut active) = self.active.lock() {
            *active = token;
        }
    }

    async fn poll_for_change(&self, baseline: Option<String>) -> AcquisitionResult {
        let mut interval = tokio::time::interval(self.poll_interval);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Some(text) = non_empty(self.source.read_text().await?) {
                if baseline.as_deref() != Some(text.as_str()) {
                    info!("Detected new clipboard content ({} chars)", text.len());
                    return Ok(text);
                }
            }
        }
    }
}

#[async_trait]
impl<S: ClipboardSource> AcquisitionStrategy for ClipboardAutoStrategy<S> {
    async fn scan(&self, options: &ScanOptions, cancel: CancelToken) -> AcquisitionResult {
        let local = CancelToken::new();
        self.set_active(Some(local.clone()));

        let timeout = options.timeout.unwrap_or(self.timeout);
        debug!(
            "Watching clipboard every {:?} for up to {:?}",
            self.poll_interval, timeout
        );

        // The baseline read counts against the timeout too.
        let watch = async {
            let baseline = non_empty(self.source.read_text().await?);
            self.poll_for_change(baseline).await
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AcquisitionError::Cancelled),
            _ = local.cancelled() => Err(AcquisitionError::Cancelled),
            polled = tokio::time::timeout(timeout, watch) => {
                polled.unwrap_or(Err(AcquisitionError::TimedOut { after: timeout }))
            }
        };

        self.set_active(None);
        outcome
    }

    fn cancel_scan(&self) {
        if let Ok(active) = self.active.lock() {
            if let Some(token) = active.as_ref() {
                token.cancel();
            }
        }
    }
}
