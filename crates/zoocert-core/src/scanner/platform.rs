//! Platform detection.

use crate::models::scan::Platform;

/// Reports the platform the host application runs on.
pub trait PlatformDetector: Send + Sync {
    fn platform(&self) -> Platform;
}

/// Always reports the same platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPlatform(pub Platform);

impl PlatformDetector for FixedPlatform {
    fn platform(&self) -> Platform {
        self.0
    }
}

/// Platform derived from the compilation target.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPlatform;

impl PlatformDetector for HostPlatform {
    fn platform(&self) -> Platform {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else {
            Platform::Web
        }
    }
}
