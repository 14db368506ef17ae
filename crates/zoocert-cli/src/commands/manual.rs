//! Manual command - build a certificate from individual fields.

use clap::Args;
use console::style;

use zoocert_core::certificate::try_parse_date;
use zoocert_core::models::certificate::ManualCertificateInput;
use zoocert_core::scanner::QrScanner;

use super::parse::OutputFormat;
use super::scan::format_scan_result;

/// Arguments for the manual command.
#[derive(Args)]
pub struct ManualArgs {
    /// Certificate number (YYYY-NN-digits)
    #[arg(long)]
    certificate_number: Option<String>,

    /// Identifier of the authorized party
    #[arg(long)]
    authorized_to: Option<String>,

    /// Origin area code
    #[arg(long)]
    origin: Option<String>,

    /// Destination area code
    #[arg(long)]
    destination: Option<String>,

    /// Number of products (default: 1)
    #[arg(long)]
    total_products: Option<u32>,

    /// Expiry date, e.g. 2024-12-31 or 2024-12-31 18:00:00 (default: now)
    #[arg(long)]
    valid_until: Option<String>,

    /// Vehicle plate
    #[arg(long)]
    vehicle: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: ManualArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let valid_until = match args.valid_until.as_deref() {
        Some(text) => Some(
            try_parse_date(text).ok_or_else(|| anyhow::anyhow!("Invalid date: {}", text))?,
        ),
        None => None,
    };

    let input = ManualCertificateInput {
        certificate_number: args.certificate_number,
        authorized_to: args.authorized_to,
        origin_area_code: args.origin,
        destination_area_code: args.destination,
        total_products: args.total_products,
        valid_until,
        vehicle: args.vehicle,
    };

    let scanner = QrScanner::builder().with_config(config).build();
    let result = scanner.create_certificate_from_manual_input(&input);

    println!("{}", format_scan_result(&result, args.format)?);

    match result.error {
        Some(error) if !result.success => anyhow::bail!("{}", error),
        _ => {
            eprintln!("{} Certificate created", style("✓").green());
            Ok(())
        }
    }
}
