//! Field extraction from normalized certificate text.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::models::certificate::Certificate;

use super::dates::parse_date_at;
use super::rules::{
    first_capture, FieldPattern, AUTHORIZED_TO, CERTIFICATE_NUMBER, DESTINATION_AREA_CODE, ORIGIN_AREA_CODE,
    TOTAL_PRODUCTS, VALID_UNTIL, VEHICLE,
};

/// Best-effort certificate extractor.
///
/// Each field runs its own fallback chain, so a missing field never blocks
/// another one. Missing strings stay empty and a missing product count
/// defaults to 1; the validator reports what is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateExtractor;

impl CertificateExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Certificate {
        self.extract_at(text, Local::now().naive_local())
    }

    /// Extract with an explicit "now" used when the validity date is unparseable.
    pub fn extract_at(&self, text: &str, now: NaiveDateTime) -> Certificate {
        let field = |chain: &[FieldPattern]| first_capture(chain, text).unwrap_or_default();

        let total_products = first_capture(&TOTAL_PRODUCTS, text)
            .map(|value| {
                // Captures are digit runs, so a parse failure means overflow.
                value.parse::<u32>().unwrap_or_else(|_| {
                    warn!("Product count {} out of range, saturating", value);
                    u32::MAX
                })
            })
            .unwrap_or(1);

        let valid_until_text = field(&VALID_UNTIL);
        let valid_until = parse_date_at(&valid_until_text, now);

        let certificate = Certificate {
            id: None,
            certificate_number: field(&CERTIFICATE_NUMBER),
            authorized_to: field(&AUTHORIZED_TO),
            origin_area_code: field(&ORIGIN_AREA_CODE),
            destination_area_code: field(&DESTINATION_AREA_CODE),
            total_products,
            valid_until: Some(valid_until),
            vehicle: field(&VEHICLE),
        };

        debug!(
            "Extracted certificate {:?} (products {}, valid until {})",
            certificate.certificate_number, certificate.total_products, valid_until
        );

        certificate
    }
}

/// Extract a certificate from normalized text.
pub fn extract(text: &str) -> Certificate {
    CertificateExtractor::new().extract(text)
}
