//! Decoded QR payload files.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AcquisitionError;
use crate::models::config::ScannerConfig;
use crate::models::scan::ScanOptions;

use super::cancel::CancelToken;
use super::strategy::{AcquisitionResult, AcquisitionStrategy};

/// Reads the text payload of a file picked by the user.
#[derive(Debug, Clone)]
pub struct FileUploadStrategy {
    max_size: u64,
    allowed_extensions: Vec<String>,
}

impl FileUploadStrategy {
    pub fn new() -> Self {
        Self::from_config(&ScannerConfig::default())
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            max_size: config.max_file_size_bytes,
            allowed_extensions: config
                .allowed_file_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    fn check_extension(&self, path: &Path) -> Result<(), AcquisitionError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        if self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            Ok(())
        } else {
            Err(AcquisitionError::UnsupportedFile(format!(
                "tipo '{}' no permitido ({})",
                extension,
                self.allowed_extensions.join(", ")
            )))
        }
    }
}

impl Default for FileUploadStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AcquisitionStrategy for FileUploadStrategy {
    async fn scan(&self, options: &ScanOptions, cancel: CancelToken) -> AcquisitionResult {
        let path = options
            .file_path
            .as_deref()
            .ok_or_else(|| AcquisitionError::Failed("No se seleccionó ningún archivo".to_string()))?;

        self.check_extension(path)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            warn!("Cannot stat {}: {}", path.display(), e);
            AcquisitionError::Failed(format!("No se pudo leer el archivo: {}", e))
        })?;

        if metadata.len() > self.max_size {
            return Err(AcquisitionError::UnsupportedFile(format!(
                "el archivo supera el tamaño máximo de {} bytes",
                self.max_size
            )));
        }

        if cancel.is_cancelled() {
            return Err(AcquisitionError::Cancelled);
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AcquisitionError::Failed(format!("No se pudo leer el archivo: {}", e)))?;

        if text.trim().is_empty() {
            return Err(AcquisitionError::Empty("El archivo está vacío".to_string()));
        }

        debug!("Read {} bytes from {}", text.len(), path.display());
        Ok(text)
    }
}
