//! QR acquisition: strategies, cancellation and the scan orchestrator.

mod cancel;
mod clipboard;
mod file;
mod manual;
mod orchestrator;
mod platform;
mod strategy;

pub use cancel::CancelToken;
pub use clipboard::{ClipboardAutoStrategy, ClipboardManualStrategy, ClipboardSource, EMPTY_CLIPBOARD};
pub use file::FileUploadStrategy;
pub use manual::ManualInputStrategy;
pub use orchestrator::{QrScanner, QrScannerBuilder, ScanState, INVALID_QR_CONTENT};
pub use platform::{FixedPlatform, HostPlatform, PlatformDetector};
pub use strategy::{race_acquisition, AcquisitionResult, AcquisitionStrategy, StrategyRegistry, TimedStrategy};
