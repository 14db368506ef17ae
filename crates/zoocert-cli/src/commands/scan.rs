//! Scan command - drive the scan orchestrator with the bundled strategies.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::oneshot;
use tracing::{debug, info};

use zoocert_core::error::AcquisitionError;
use zoocert_core::models::scan::{Platform, ScanEventKind, ScanMethod, ScanOptions, ScanResult};
use zoocert_core::scanner::{ClipboardManualStrategy, ClipboardSource, QrScanner};

use super::parse::{format_certificate_text, OutputFormat};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Scan method (file-upload, manual-input, clipboard-manual)
    #[arg(short, long, default_value = "file-upload")]
    method: ScanMethod,

    /// Payload file for file-upload
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Text for manual-input
    #[arg(short, long)]
    text: Option<String>,

    /// Acquisition timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

/// Clipboard stand-in for terminals: the pasted text arrives on stdin.
///
/// The read runs on a detached thread so a cancelled scan can exit without
/// waiting for stdin to close.
struct StdinClipboard;

#[async_trait]
impl ClipboardSource for StdinClipboard {
    async fn read_text(&self) -> Result<Option<String>, AcquisitionError> {
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let mut text = String::new();
            let read = std::io::stdin().read_to_string(&mut text).map(|_| text);
            let _ = tx.send(read);
        });

        let read = rx
            .await
            .map_err(|_| AcquisitionError::Failed("No se pudo leer el portapapeles".to_string()))?;
        let text = read
            .map_err(|e| AcquisitionError::Failed(format!("No se pudo leer el portapapeles: {}", e)))?;
        Ok(Some(text))
    }
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let scanner = Arc::new(
        QrScanner::builder()
            .with_platform(Platform::Web)
            .with_config(config)
            .with_default_strategies()
            .with_strategy(ScanMethod::ClipboardManual, ClipboardManualStrategy::new(StdinClipboard))
            .build(),
    );

    let mut options = ScanOptions::default().with_preferred_method(args.method);
    if let Some(text) = args.text {
        options = options.with_manual_text(text);
    }
    if let Some(path) = args.input {
        options = options.with_file_path(path);
    }
    if let Some(secs) = args.timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut events = scanner.subscribe();
    let progress = {
        let spinner = spinner.clone();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                debug!("Scan event: {:?} via {}", event.kind, event.method);
                match event.kind {
                    ScanEventKind::Start => spinner.set_message(format!("Scanning via {}...", event.method)),
                    ScanEventKind::Cancel => spinner.set_message("Cancelled"),
                    _ => break,
                }
            }
        })
    };

    let canceller = {
        let scanner = scanner.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling scan");
                scanner.cancel_scan();
            }
        })
    };

    let result = scanner.scan_with_method(args.method, &options).await?;

    canceller.abort();
    progress.abort();
    spinner.finish_and_clear();

    println!("{}", format_scan_result(&result, args.format)?);

    match result.error {
        Some(error) if !result.success => anyhow::bail!("{}", error),
        _ => {
            eprintln!("{} Scanned via {}", style("✓").green(), result.method);
            Ok(())
        }
    }
}

/// Render a scan result; text output reuses the certificate layout.
pub fn format_scan_result(result: &ScanResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["method", "success", "certificate_number", "timestamp", "error"])?;
            let record: [&str; 5] = [
                result.method.as_str(),
                &result.success.to_string(),
                result.data.as_ref().map(|c| c.certificate_number.as_str()).unwrap_or(""),
                &result.timestamp.to_rfc3339(),
                result.error.as_deref().unwrap_or(""),
            ];
            wtr.write_record(record)?;
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => {
            let mut output = format_certificate_text(result.data.as_ref());
            output.push('\n');
            match &result.error {
                Some(error) => output.push_str(&format!("Failed via {}: {}\n", result.method, error)),
                None => output.push_str(&format!("Scanned via {}\n", result.method)),
            }
            Ok(output)
        }
    }
}
