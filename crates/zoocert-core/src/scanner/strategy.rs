//! Acquisition strategy seam.
//!
//! A strategy turns a scan request into raw QR text, or fails with an
//! [`AcquisitionError`]. Camera strategies live in the host application;
//! this crate bundles manual input, payload files and clipboard polling.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AcquisitionError;
use crate::models::scan::{ScanMethod, ScanOptions};

use super::cancel::CancelToken;

/// Raw text produced by a strategy.
pub type AcquisitionResult = Result<String, AcquisitionError>;

/// Source of raw QR text.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    /// Acquire raw text, observing `cancel` cooperatively.
    async fn scan(&self, options: &ScanOptions, cancel: CancelToken) -> AcquisitionResult;

    /// Stop an in-flight acquisition, e.g. tear down a stream or a poll loop.
    fn cancel_scan(&self) {}
}

/// Race an acquisition against a timeout and a cancellation token.
///
/// Whichever finishes first decides the outcome.
pub async fn race_acquisition<F>(
    acquisition: F,
    timeout: Duration,
    cancel: &CancelToken,
) -> AcquisitionResult
where
    F: Future<Output = AcquisitionResult>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AcquisitionError::Cancelled),
        outcome = tokio::time::timeout(timeout, acquisition) => {
            outcome.unwrap_or_else(|_| {
                debug!("Acquisition timed out after {:?}", timeout);
                Err(AcquisitionError::TimedOut { after: timeout })
            })
        }
    }
}

/// Gives an externally supplied strategy a timeout and cancellation race.
pub struct TimedStrategy<S> {
    inner: S,
    timeout: Duration,
}

impl<S: AcquisitionStrategy> TimedStrategy<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: AcquisitionStrategy> AcquisitionStrategy for TimedStrategy<S> {
    async fn scan(&self, options: &ScanOptions, cancel: CancelToken) -> AcquisitionResult {
        let timeout = options.timeout.unwrap_or(self.timeout);
        race_acquisition(self.inner.scan(options, cancel.clone()), timeout, &cancel).await
    }

    fn cancel_scan(&self) {
        self.inner.cancel_scan();
    }
}

/// Strategies keyed by the method they implement.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<ScanMethod, Arc<dyn AcquisitionStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the strategy for a method.
    pub fn register(&mut self, method: ScanMethod, strategy: Arc<dyn AcquisitionStrategy>) {
        self.strategies.insert(method, strategy);
    }

    pub fn get(&self, method: ScanMethod) -> Option<Arc<dyn AcquisitionStrategy>> {
        self.strategies.get(&method).cloned()
    }

    pub fn contains(&self, method: ScanMethod) -> bool {
        self.strategies.contains_key(&method)
    }

    pub fn methods(&self) -> Vec<ScanMethod> {
        ScanMethod::ALL
            .into_iter()
            .filter(|method| self.contains(*method))
            .collect()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
