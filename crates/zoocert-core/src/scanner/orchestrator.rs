//! Scan orchestration: method selection, single-flight, lifecycle events.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDateTime};
use futures_util::FutureExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::certificate::CertificateParser;
use crate::error::{AcquisitionError, ScanError};
use crate::models::certificate::{Certificate, ManualCertificateInput};
use crate::models::config::ZoocertConfig;
use crate::models::scan::{Platform, ScanEvent, ScanMethod, ScanOptions, ScanResult};

use super::cancel::CancelToken;
use super::file::FileUploadStrategy;
use super::manual::ManualInputStrategy;
use super::platform::{FixedPlatform, HostPlatform, PlatformDetector};
use super::strategy::{AcquisitionStrategy, StrategyRegistry, TimedStrategy};

/// Reported when parsing rejects the text without naming a reason.
pub const INVALID_QR_CONTENT: &str = "Contenido QR inválido";

/// Orchestrator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Idle,
    Acquiring { method: ScanMethod, attempt: u64 },
    Done { method: ScanMethod, success: bool },
}

struct ActiveScan {
    attempt: u64,
    method: ScanMethod,
    cancel: CancelToken,
    strategy: Option<Arc<dyn AcquisitionStrategy>>,
}

#[derive(Default)]
struct Inner {
    state: ScanState,
    active: Option<ActiveScan>,
    last_event: Option<ScanEvent>,
}

/// Acquires raw QR text through a strategy and turns it into a [`ScanResult`].
///
/// At most one scan is in flight at a time. Every attempt emits `start`
/// followed by exactly one of `success`, `error` or `cancel`.
pub struct QrScanner {
    platform: Arc<dyn PlatformDetector>,
    strategies: StrategyRegistry,
    parser: CertificateParser,
    inner: Mutex<Inner>,
    events: broadcast::Sender<ScanEvent>,
    next_attempt: AtomicU64,
}

impl QrScanner {
    pub fn builder() -> QrScannerBuilder {
        QrScannerBuilder::new()
    }

    pub fn get_platform(&self) -> Platform {
        self.platform.platform()
    }

    pub fn get_available_methods(&self) -> Vec<ScanMethod> {
        self.get_platform().available_methods().to_vec()
    }

    pub fn parser(&self) -> &CertificateParser {
        &self.parser
    }

    pub fn state(&self) -> ScanState {
        self.lock().state
    }

    pub fn is_scanning(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Most recent lifecycle event, if any scan has run.
    pub fn last_event(&self) -> Option<ScanEvent> {
        self.lock().last_event.clone()
    }

    /// Receive lifecycle events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Scan with the preferred method when the platform offers it, else the
    /// platform default.
    pub async fn scan_qr(&self, options: &ScanOptions) -> Result<ScanResult, ScanError> {
        if self.is_scanning() {
            warn!("Scan requested while another scan is in progress");
            return Err(ScanError::Concurrency);
        }

        let platform = self.get_platform();
        let method = options
            .preferred_method
            .filter(|method| platform.supports(*method))
            .unwrap_or_else(|| platform.default_method());

        self.scan_with_method(method, options).await
    }

    /// Scan with an explicit method.
    ///
    /// Only a concurrent scan is reported as `Err`; every other failure is a
    /// `ScanResult` with `success == false`.
    pub async fn scan_with_method(
        &self,
        method: ScanMethod,
        options: &ScanOptions,
    ) -> Result<ScanResult, ScanError> {
        let attempt = self.begin(method)?;

        let platform = self.get_platform();
        if !platform.supports(method) {
            let err = ScanError::UnsupportedMethod { method, platform };
            return Ok(attempt.finish(ScanResult::failed(method, err.to_string(), None)));
        }

        let Some(strategy) = self.strategies.get(method) else {
            let err = AcquisitionError::Failed(format!(
                "No hay una estrategia registrada para '{}'",
                method
            ));
            return Ok(attempt.finish(ScanResult::failed(method, err.to_string(), None)));
        };
        attempt.attach(strategy.clone());

        let acquisition = AssertUnwindSafe(strategy.scan(options, attempt.cancel.clone())).catch_unwind();
        // A strategy that ignores its token must not hold the caller after cancel_scan.
        let outcome = tokio::select! {
            biased;
            _ = attempt.cancel.cancelled() => Err(AcquisitionError::Cancelled),
            caught = acquisition => caught.unwrap_or_else(|_| {
                error!("Acquisition strategy for {} panicked", method);
                Err(AcquisitionError::Failed(
                    "Error inesperado durante el escaneo".to_string(),
                ))
            }),
        };

        let result = match outcome {
            Ok(raw) => self.interpret(method, raw),
            Err(err) => {
                info!("Acquisition via {} failed: {}", method, err);
                ScanResult::failed(method, ScanError::from(err).to_string(), None)
            }
        };

        Ok(attempt.finish(result))
    }

    /// Cancel the scan in flight. A no-op when nothing is running.
    pub fn cancel_scan(&self) {
        let active = {
            let mut inner = self.lock();
            let Some(active) = inner.active.take() else {
                debug!("Cancel requested with no scan in progress");
                return;
            };
            inner.state = ScanState::Idle;
            self.emit(&mut inner, ScanEvent::cancel(active.method));
            active
        };

        info!("Cancelling scan attempt {} via {}", active.attempt, active.method);
        active.cancel.cancel();
        if let Some(strategy) = active.strategy {
            strategy.cancel_scan();
        }
    }

    /// Build a certificate from form fields, skipping schema scoring.
    pub fn create_certificate_from_manual_input(&self, input: &ManualCertificateInput) -> ScanResult {
        self.create_certificate_from_manual_input_at(input, Local::now().naive_local())
    }

    pub fn create_certificate_from_manual_input_at(
        &self,
        input: &ManualCertificateInput,
        now: NaiveDateTime,
    ) -> ScanResult {
        let method = ScanMethod::ManualInput;
        let required = [
            ("número de certificado", &input.certificate_number),
            ("autorizado a", &input.authorized_to),
            ("código de área de origen", &input.origin_area_code),
            ("código de área de destino", &input.destination_area_code),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return ScanResult::failed(
                method,
                format!("Campos requeridos faltantes: {}", missing.join(", ")),
                None,
            );
        }

        let field = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
        let certificate = Certificate {
            id: None,
            certificate_number: field(&input.certificate_number),
            authorized_to: field(&input.authorized_to),
            origin_area_code: field(&input.origin_area_code),
            destination_area_code: field(&input.destination_area_code),
            total_products: input.total_products.unwrap_or(1),
            valid_until: Some(input.valid_until.unwrap_or(now)),
            vehicle: field(&input.vehicle),
        };

        let validation = self.parser.validator().validate_at(&certificate, now.date());
        if validation.is_valid {
            ScanResult::succeeded(method, certificate, None)
        } else {
            let message = validation
                .error_message()
                .unwrap_or_else(|| INVALID_QR_CONTENT.to_string());
            ScanResult::failed(method, message, None)
        }
    }

    fn interpret(&self, method: ScanMethod, raw: String) -> ScanResult {
        let parsed = self.parser.parse(&raw);
        match parsed.certificate {
            Some(certificate) if parsed.validation.is_valid => {
                ScanResult::succeeded(method, certificate, Some(raw))
            }
            _ => {
                let message = parsed
                    .validation
                    .error_message()
                    .unwrap_or_else(|| INVALID_QR_CONTENT.to_string());
                ScanResult::failed(method, ScanError::ContentValidation(message).to_string(), Some(raw))
            }
        }
    }

    fn begin(&self, method: ScanMethod) -> Result<Attempt<'_>, ScanError> {
        let mut inner = self.lock();
        if inner.active.is_some() {
            warn!("Scan via {} rejected: another scan is in progress", method);
            return Err(ScanError::Concurrency);
        }

        let id = self.next_attempt.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancelToken::new();
        inner.active = Some(ActiveScan {
            attempt: id,
            method,
            cancel: cancel.clone(),
            strategy: None,
        });
        inner.state = ScanState::Acquiring { method, attempt: id };
        self.emit(&mut inner, ScanEvent::start(method));
        info!("Scan attempt {} started via {}", id, method);

        Ok(Attempt {
            scanner: self,
            id,
            method,
            cancel,
            finished: false,
        })
    }

    fn emit(&self, inner: &mut Inner, event: ScanEvent) {
        inner.last_event = Some(event.clone());
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for QrScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrScanner")
            .field("platform", &self.get_platform())
            .field("strategies", &self.strategies)
            .field("state", &self.state())
            .finish()
    }
}

/// One in-flight scan. Releases the single-flight slot when finished or dropped.
struct Attempt<'a> {
    scanner: &'a QrScanner,
    id: u64,
    method: ScanMethod,
    cancel: CancelToken,
    finished: bool,
}

impl Attempt<'_> {
    fn attach(&self, strategy: Arc<dyn AcquisitionStrategy>) {
        let mut inner = self.scanner.lock();
        if let Some(active) = inner.active.as_mut().filter(|active| active.attempt == self.id) {
            active.strategy = Some(strategy);
        }
    }

    fn finish(mut self, result: ScanResult) -> ScanResult {
        self.finished = true;
        let mut inner = self.scanner.lock();

        let current = inner.active.as_ref().is_some_and(|active| active.attempt == self.id);
        if !current {
            debug!("Scan attempt {} completed after cancellation", self.id);
            return ScanResult::failed(
                self.method,
                AcquisitionError::Cancelled.to_string(),
                result.raw_data,
            );
        }

        inner.active = None;
        inner.state = ScanState::Done {
            method: self.method,
            success: result.success,
        };

        let event = match (&result.data, &result.error) {
            (Some(certificate), _) if result.success => {
                ScanEvent::success(self.method, certificate.clone())
            }
            (_, error) => ScanEvent::error(
                self.method,
                error.clone().unwrap_or_else(|| INVALID_QR_CONTENT.to_string()),
            ),
        };
        self.scanner.emit(&mut inner, event);
        info!(
            "Scan attempt {} via {} finished (success: {})",
            self.id, self.method, result.success
        );

        result
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut inner = self.scanner.lock();
        if inner.active.as_ref().is_some_and(|active| active.attempt == self.id) {
            warn!("Scan attempt {} abandoned before completion", self.id);
            inner.active = None;
            inner.state = ScanState::Idle;
            self.cancel.cancel();
            self.scanner.emit(&mut inner, ScanEvent::cancel(self.method));
        }
    }
}

/// Builder for [`QrScanner`].
pub struct QrScannerBuilder {
    platform: Arc<dyn PlatformDetector>,
    strategies: StrategyRegistry,
    config: ZoocertConfig,
    parser: Option<CertificateParser>,
}

impl QrScannerBuilder {
    pub fn new() -> Self {
        Self {
            platform: Arc::new(HostPlatform),
            strategies: StrategyRegistry::new(),
            config: ZoocertConfig::default(),
            parser: None,
        }
    }

    pub fn with_platform(self, platform: Platform) -> Self {
        self.with_platform_detector(FixedPlatform(platform))
    }

    pub fn with_platform_detector(mut self, detector: impl PlatformDetector + 'static) -> Self {
        self.platform = Arc::new(detector);
        self
    }

    pub fn with_config(mut self, config: ZoocertConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the parser otherwise derived from the config.
    pub fn with_parser(mut self, parser: CertificateParser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_strategy(mut self, method: ScanMethod, strategy: impl AcquisitionStrategy + 'static) -> Self {
        self.strategies.register(method, Arc::new(strategy));
        self
    }

    pub fn with_shared_strategy(mut self, method: ScanMethod, strategy: Arc<dyn AcquisitionStrategy>) -> Self {
        self.strategies.register(method, strategy);
        self
    }

    /// Registers a host camera strategy bounded by the configured camera
    /// timeout. Call after [`with_config`](Self::with_config).
    pub fn with_camera_strategy(self, method: ScanMethod, strategy: impl AcquisitionStrategy + 'static) -> Self {
        let timeout = self.config.scanner.camera_timeout();
        self.with_strategy(method, TimedStrategy::new(strategy, timeout))
    }

    /// Registers manual input and file upload.
    pub fn with_default_strategies(self) -> Self {
        let file = FileUploadStrategy::from_config(&self.config.scanner);
        self.with_strategy(ScanMethod::ManualInput, ManualInputStrategy)
            .with_strategy(ScanMethod::FileUpload, file)
    }

    pub fn build(self) -> QrScanner {
        let (events, _) = broadcast::channel(self.config.scanner.event_capacity.max(1));
        let parser = self
            .parser
            .unwrap_or_else(|| CertificateParser::from_config(&self.config));

        QrScanner {
            platform: self.platform,
            strategies: self.strategies,
            parser,
            inner: Mutex::new(Inner::default()),
            events,
            next_attempt: AtomicU64::new(0),
        }
    }
}

impl Default for QrScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::LINK_CONTENT_ERROR;
    use crate::models::scan::ScanEventKind;
    use crate::scanner::strategy::AcquisitionResult;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    const CERTIFICATE: &str = "CZPM N°: 2023-05-9765837433\n\
        AUTORIZADO A: 0801921727\n\
        CÓDIGO ÁREA ORIGEN: 03-0062-00436-00374833\n\
        CÓDIGO ÁREA DESTINO: 03-0062-00438-00160206\n\
        TOTAL PRODUCTOS: 4\n\
        VÁLIDO HASTA: 2099-01-01 00:00:00\n\
        VEHÍCULO: JBE0076";

    /// Blocks until released; counts invocations and cancel requests.
    #[derive(Default)]
    struct Gate {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
        cancels: AtomicUsize,
        honour_cancel: bool,
    }

    impl Gate {
        fn cooperative() -> Arc<Self> {
            Arc::new(Self { honour_cancel: true, ..Self::default() })
        }

        fn stubborn() -> Arc<Self> {
            Arc::new(Self::default())
        }
    }

    #[async_trait]
    impl AcquisitionStrategy for Gate {
        async fn scan(&self, _options: &ScanOptions, cancel: CancelToken) -> AcquisitionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            if self.honour_cancel {
                tokio::select! {
                    _ = cancel.cancelled() => Err(AcquisitionError::Cancelled),
                    _ = self.release.notified() => Ok(CERTIFICATE.to_string()),
                }
            } else {
                self.release.notified().await;
                Ok(CERTIFICATE.to_string())
            }
        }

        fn cancel_scan(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicking;

    #[async_trait]
    impl AcquisitionStrategy for Panicking {
        async fn scan(&self, _options: &ScanOptions, _cancel: CancelToken) -> AcquisitionResult {
            panic!("camera driver crashed")
        }
    }

    fn web_scanner() -> QrScannerBuilder {
        QrScanner::builder()
            .with_platform(Platform::Web)
            .with_default_strategies()
    }

    fn drain(receiver: &mut broadcast::Receiver<ScanEvent>) -> Vec<ScanEventKind> {
        std::iter::from_fn(|| receiver.try_recv().ok())
            .map(|event| event.kind)
            .collect()
    }

    #[tokio::test]
    async fn test_successful_scan_emits_start_then_success() {
        let scanner = web_scanner().build();
        let mut events = scanner.subscribe();

        let options = ScanOptions::default().with_manual_text(CERTIFICATE);
        let result = scanner
            .scan_with_method(ScanMethod::ManualInput, &options)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.method, ScanMethod::ManualInput);
        assert_eq!(result.data.unwrap().certificate_number, "2023-05-9765837433");
        assert_eq!(result.raw_data.as_deref(), Some(CERTIFICATE));
        assert_eq!(drain(&mut events), vec![ScanEventKind::Start, ScanEventKind::Success]);
        assert_eq!(
            scanner.state(),
            ScanState::Done { method: ScanMethod::ManualInput, success: true }
        );
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn test_invalid_content_reports_validation_errors() {
        let scanner = web_scanner().build();
        let mut events = scanner.subscribe();

        let options = ScanOptions::default().with_manual_text("https://example.com");
        let result = scanner
            .scan_with_method(ScanMethod::ManualInput, &options)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.data, None);
        assert_eq!(result.error.as_deref(), Some(LINK_CONTENT_ERROR));
        assert_eq!(result.raw_data.as_deref(), Some("https://example.com"));
        assert_eq!(drain(&mut events), vec![ScanEventKind::Start, ScanEventKind::Error]);
        assert_eq!(scanner.last_event().unwrap().error.as_deref(), Some(LINK_CONTENT_ERROR));
    }

    #[tokio::test]
    async fn test_acquisition_error_passes_through() {
        let scanner = web_scanner().build();
        let result = scanner
            .scan_with_method(ScanMethod::FileUpload, &ScanOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("No se seleccionó ningún archivo"));
        assert_eq!(result.raw_data, None);
    }

    #[tokio::test]
    async fn test_unsupported_method_on_web() {
        let scanner = web_scanner().build();
        let result = scanner
            .scan_with_method(ScanMethod::ClipboardAuto, &ScanOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Método de escaneo 'clipboard-auto' no disponible en la plataforma 'web'")
        );
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn test_scan_qr_falls_back_to_platform_default() {
        let scanner = web_scanner().build();
        let options = ScanOptions::default().with_preferred_method(ScanMethod::CameraNative);
        let result = scanner.scan_qr(&options).await.unwrap();

        // No camera strategy is registered in tests.
        assert_eq!(result.method, ScanMethod::CameraWeb);
        assert!(!result.success);

        let options = ScanOptions::default()
            .with_preferred_method(ScanMethod::ManualInput)
            .with_manual_text(CERTIFICATE);
        let result = scanner.scan_qr(&options).await.unwrap();
        assert_eq!(result.method, ScanMethod::ManualInput);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_available_methods_follow_platform() {
        let scanner = QrScanner::builder().with_platform(Platform::Ios).build();
        assert_eq!(scanner.get_platform(), Platform::Ios);
        assert_eq!(scanner.get_available_methods()[0], ScanMethod::CameraNative);
        assert!(scanner.get_available_methods().contains(&ScanMethod::ClipboardAuto));
    }

    #[tokio::test]
    async fn test_second_scan_rejected_without_invoking_strategy() {
        let gate = Gate::stubborn();
        let scanner = web_scanner()
            .with_shared_strategy(ScanMethod::CameraWeb, gate.clone())
            .build();
        let options = ScanOptions::default();

        let first = scanner.scan_with_method(ScanMethod::CameraWeb, &options);
        let second = async {
            gate.entered.notified().await;
            assert!(scanner.is_scanning());
            let second = scanner.scan_with_method(ScanMethod::CameraWeb, &options).await;
            let via_scan_qr = scanner.scan_qr(&options).await;
            gate.release.notify_one();
            (second, via_scan_qr)
        };

        let (first, (second, via_scan_qr)) = tokio::join!(first, second);
        assert!(first.unwrap().success);
        assert_eq!(second, Err(ScanError::Concurrency));
        assert_eq!(via_scan_qr, Err(ScanError::Concurrency));
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);

        // The slot is free again once the first scan resolved.
        let result = scanner
            .scan_with_method(ScanMethod::ManualInput, &ScanOptions::default().with_manual_text(CERTIFICATE))
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let gate = Gate::cooperative();
        let scanner = web_scanner()
            .with_shared_strategy(ScanMethod::CameraWeb, gate.clone())
            .build();
        let mut events = scanner.subscribe();

        // Nothing in flight: no event.
        scanner.cancel_scan();

        let options = ScanOptions::default();
        let scan = scanner.scan_with_method(ScanMethod::CameraWeb, &options);
        let cancel = async {
            gate.entered.notified().await;
            scanner.cancel_scan();
            scanner.cancel_scan();
            assert!(!scanner.is_scanning());
        };

        let (result, _) = tokio::join!(scan, cancel);
        let result = result.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Escaneo cancelado"));

        scanner.cancel_scan();
        assert_eq!(drain(&mut events), vec![ScanEventKind::Start, ScanEventKind::Cancel]);
        assert_eq!(gate.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(scanner.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_late_completion_does_not_disturb_newer_scan() {
        let gate = Gate::stubborn();
        let scanner = web_scanner()
            .with_shared_strategy(ScanMethod::CameraWeb, gate.clone())
            .build();
        let mut events = scanner.subscribe();
        let options = ScanOptions::default();
        let manual = ScanOptions::default().with_manual_text(CERTIFICATE);

        let stale = scanner.scan_with_method(ScanMethod::CameraWeb, &options);
        let newer = async {
            gate.entered.notified().await;
            scanner.cancel_scan();
            let newer = scanner.scan_with_method(ScanMethod::ManualInput, &manual).await;
            gate.release.notify_one();
            newer
        };

        let (stale, newer) = tokio::join!(stale, newer);
        let stale = stale.unwrap();
        assert!(!stale.success);
        assert_eq!(stale.error.as_deref(), Some("Escaneo cancelado"));
        assert!(newer.unwrap().success);

        assert_eq!(
            drain(&mut events),
            vec![
                ScanEventKind::Start,
                ScanEventKind::Cancel,
                ScanEventKind::Start,
                ScanEventKind::Success,
            ]
        );
        assert_eq!(
            scanner.state(),
            ScanState::Done { method: ScanMethod::ManualInput, success: true }
        );
    }

    #[tokio::test]
    async fn test_cancel_resolves_scan_with_unresponsive_strategy() {
        let gate = Gate::stubborn();
        let scanner = web_scanner()
            .with_shared_strategy(ScanMethod::CameraWeb, gate.clone())
            .build();
        let mut events = scanner.subscribe();

        let options = ScanOptions::default();
        let scan = scanner.scan_with_method(ScanMethod::CameraWeb, &options);
        let cancel = async {
            gate.entered.notified().await;
            scanner.cancel_scan();
        };

        // The gate is never released.
        let (result, _) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(scan, cancel)
        })
        .await
        .expect("scan should resolve once cancelled");

        let result = result.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Escaneo cancelado"));
        assert_eq!(drain(&mut events), vec![ScanEventKind::Start, ScanEventKind::Cancel]);
        assert_eq!(gate.cancels.load(Ordering::SeqCst), 1);
        assert!(!scanner.is_scanning());
    }

    struct Unanswered;

    #[async_trait]
    impl AcquisitionStrategy for Unanswered {
        async fn scan(&self, _options: &ScanOptions, _cancel: CancelToken) -> AcquisitionResult {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_strategy_uses_configured_timeout() {
        let mut config = ZoocertConfig::default();
        config.scanner.camera_timeout_secs = 7;
        let scanner = web_scanner()
            .with_config(config)
            .with_camera_strategy(ScanMethod::CameraWeb, Unanswered)
            .build();

        let result = scanner
            .scan_with_method(ScanMethod::CameraWeb, &ScanOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Tiempo de espera agotado después de 7s"));
        assert_eq!(scanner.state(), ScanState::Done { method: ScanMethod::CameraWeb, success: false });
    }

    #[tokio::test]
    async fn test_panicking_strategy_is_contained() {
        let scanner = web_scanner()
            .with_strategy(ScanMethod::CameraWeb, Panicking)
            .build();

        let result = scanner
            .scan_with_method(ScanMethod::CameraWeb, &ScanOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Error inesperado durante el escaneo"));
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn test_dropped_scan_releases_slot() {
        let gate = Gate::stubborn();
        let scanner = web_scanner()
            .with_shared_strategy(ScanMethod::CameraWeb, gate.clone())
            .build();
        let mut events = scanner.subscribe();

        let options = ScanOptions::default();
        tokio::select! {
            _ = scanner.scan_with_method(ScanMethod::CameraWeb, &options) => unreachable!(),
            _ = gate.entered.notified() => {}
        }

        assert!(!scanner.is_scanning());
        assert_eq!(drain(&mut events), vec![ScanEventKind::Start, ScanEventKind::Cancel]);
    }

    #[test]
    fn test_manual_input_requires_all_fields() {
        let scanner = web_scanner().build();
        let input = ManualCertificateInput {
            vehicle: Some("ABC123".to_string()),
            ..Default::default()
        };

        let result = scanner.create_certificate_from_manual_input(&input);
        assert!(!result.success);
        assert_eq!(result.method, ScanMethod::ManualInput);
        assert_eq!(
            result.error.as_deref(),
            Some(
                "Campos requeridos faltantes: número de certificado, autorizado a, \
                 código de área de origen, código de área de destino"
            )
        );
    }

    #[test]
    fn test_manual_input_applies_defaults() {
        let scanner = web_scanner().build();
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        let input = ManualCertificateInput {
            certificate_number: Some("2024-03-123".to_string()),
            authorized_to: Some("0801921727".to_string()),
            origin_area_code: Some("03-0062".to_string()),
            destination_area_code: Some("03-0063".to_string()),
            ..Default::default()
        };

        let result = scanner.create_certificate_from_manual_input_at(&input, now);
        assert!(result.success);
        let certificate = result.data.unwrap();
        assert_eq!(certificate.total_products, 1);
        assert_eq!(certificate.valid_until, Some(now));
        assert_eq!(certificate.vehicle, "");
    }

    #[test]
    fn test_manual_input_runs_field_validation() {
        let scanner = web_scanner().build();
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let input = ManualCertificateInput {
            certificate_number: Some("2024-03-123".to_string()),
            authorized_to: Some("0801921727".to_string()),
            origin_area_code: Some("03-0062".to_string()),
            destination_area_code: Some("03-0063".to_string()),
            total_products: Some(0),
            ..Default::default()
        };

        let result = scanner.create_certificate_from_manual_input_at(&input, now);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Total de productos debe ser mayor a 0"));
    }
}
