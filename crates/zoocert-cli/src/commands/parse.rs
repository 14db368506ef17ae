//! Parse command - run the certificate pipeline on one QR payload.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use zoocert_core::certificate::CertificateParser;
use zoocert_core::models::certificate::{Certificate, ParseResult, ValidationResult};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// File holding the decoded QR text, or "-" for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fail when the certificate is missing, incomplete or expired
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let raw = read_input(&args.input)?;
    info!("Parsing {} chars of QR text", raw.len());

    let parser = CertificateParser::from_config(&config);
    let result = parser.parse(&raw);

    let output = format_parse_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    report_validation(&result.validation);
    debug!("Total processing time: {:?}", start.elapsed());

    if args.strict && !result.is_accepted() {
        anyhow::bail!(
            "Certificate rejected: {}",
            result
                .validation
                .error_message()
                .unwrap_or_else(|| "no certificate found".to_string())
        );
    }

    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    Ok(fs::read_to_string(input)?)
}

/// Print validation errors and warnings to stderr.
pub fn report_validation(validation: &ValidationResult) {
    if !validation.errors.is_empty() {
        eprintln!("{}", style("Validation errors:").red());
        for error in &validation.errors {
            eprintln!("  - {}", error);
        }
    }
    if !validation.warnings.is_empty() {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &validation.warnings {
            eprintln!("  - {}", warning);
        }
    }
}

pub fn format_parse_result(result: &ParseResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result.certificate.as_ref(), &result.validation),
        OutputFormat::Text => Ok(format_text(result.certificate.as_ref(), &result.validation)),
    }
}

fn valid_until(certificate: &Certificate) -> String {
    certificate
        .valid_until
        .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn format_csv(
    certificate: Option<&Certificate>,
    validation: &ValidationResult,
) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "certificate_number",
        "authorized_to",
        "origin_area_code",
        "destination_area_code",
        "total_products",
        "valid_until",
        "vehicle",
        "is_valid",
        "score",
        "errors",
    ])?;

    let empty = Certificate::default();
    let certificate = certificate.unwrap_or(&empty);
    let record: [&str; 10] = [
        &certificate.certificate_number,
        &certificate.authorized_to,
        &certificate.origin_area_code,
        &certificate.destination_area_code,
        &certificate.total_products.to_string(),
        &valid_until(certificate),
        &certificate.vehicle,
        &validation.is_valid.to_string(),
        &validation.score.to_string(),
        &validation.errors.join("; "),
    ];
    wtr.write_record(record)?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub fn format_text(certificate: Option<&Certificate>, validation: &ValidationResult) -> String {
    let mut output = format_certificate_text(certificate);

    output.push('\n');
    output.push_str(&format!(
        "Status: {} (score {})\n",
        if validation.is_valid { "valid" } else { "invalid" },
        validation.score
    ));

    output
}

pub fn format_certificate_text(certificate: Option<&Certificate>) -> String {
    let mut output = String::new();

    match certificate {
        Some(certificate) => {
            output.push_str(&format!("Certificate: {}\n", certificate.certificate_number));
            output.push_str(&format!("Authorized to: {}\n", certificate.authorized_to));
            output.push_str(&format!("Origin area: {}\n", certificate.origin_area_code));
            output.push_str(&format!("Destination area: {}\n", certificate.destination_area_code));
            output.push_str(&format!("Total products: {}\n", certificate.total_products));
            output.push_str(&format!("Valid until: {}\n", valid_until(certificate)));
            if !certificate.vehicle.is_empty() {
                output.push_str(&format!("Vehicle: {}\n", certificate.vehicle));
            }
        }
        None => output.push_str("No certificate extracted\n"),
    }

    output
}
