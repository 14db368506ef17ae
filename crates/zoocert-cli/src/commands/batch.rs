//! Batch command - parse many QR payload files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use zoocert_core::certificate::CertificateParser;
use zoocert_core::models::certificate::ParseResult;

use super::parse::{format_parse_result, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    parsed: Option<ParseResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let allowed = &config.scanner.allowed_file_extensions;
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
            allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = CertificateParser::from_config(&config);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &parser);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(parsed) => results.push(FileResult {
                path,
                parsed: Some(parsed),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        parsed: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        progress.inc(1);
    }

    progress.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Some(parsed) = &result.parsed {
                let stem = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("certificate");
                let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));
                fs::write(&output_path, format_parse_result(parsed, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// A file counts as processed only if it yields an accepted certificate.
fn process_single_file(path: &Path, parser: &CertificateParser) -> anyhow::Result<ParseResult> {
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        anyhow::bail!("File is empty");
    }

    let parsed = parser.parse(&raw);
    if !parsed.is_accepted() {
        anyhow::bail!(
            "{}",
            parsed
                .validation
                .error_message()
                .unwrap_or_else(|| "no certificate found".to_string())
        );
    }
    Ok(parsed)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "certificate_number",
        "authorized_to",
        "valid_until",
        "score",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let time = result.processing_time_ms.to_string();

        match result.parsed.as_ref().and_then(|p| p.certificate.as_ref().map(|c| (p, c))) {
            Some((parsed, certificate)) => {
                let valid_until = certificate
                    .valid_until
                    .map(|d| d.date().to_string())
                    .unwrap_or_default();
                let record: [&str; 9] = [
                    filename,
                    "success",
                    &certificate.certificate_number,
                    &certificate.authorized_to,
                    &valid_until,
                    &parsed.validation.score.to_string(),
                    &parsed.validation.warnings.join("; "),
                    &time,
                    "",
                ];
                wtr.write_record(record)?;
            }
            None => {
                let record: [&str; 9] = [
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &time,
                    result.error.as_deref().unwrap_or(""),
                ];
                wtr.write_record(record)?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
