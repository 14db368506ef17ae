//! Manual text entry strategy.

use async_trait::async_trait;

use crate::error::AcquisitionError;
use crate::models::scan::ScanOptions;

use super::cancel::CancelToken;
use super::strategy::{AcquisitionResult, AcquisitionStrategy};

/// Yields text the user typed or pasted into [`ScanOptions::manual_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualInputStrategy;

#[async_trait]
impl AcquisitionStrategy for ManualInputStrategy {
    async fn scan(&self, options: &ScanOptions, cancel: CancelToken) -> AcquisitionResult {
        if cancel.is_cancelled() {
            return Err(AcquisitionError::Cancelled);
        }
        options
            .manual_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| AcquisitionError::Empty("No se ingresó texto".to_string()))
    }
}
