//! Certificate parser facade: normalize, score, extract, validate.

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::models::certificate::ParseResult;
use crate::models::config::ZoocertConfig;

use super::extractor::CertificateExtractor;
use super::normalizer::normalize;
use super::schema::SchemaValidator;
use super::validator::CertificateValidator;

/// Runs the full parsing pipeline over scanned text.
#[derive(Debug, Clone, Default)]
pub struct CertificateParser {
    schema: SchemaValidator,
    extractor: CertificateExtractor,
    validator: CertificateValidator,
}

impl CertificateParser {
    /// Create a parser with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ZoocertConfig) -> Self {
        Self {
            schema: SchemaValidator::from_config(&config.schema),
            extractor: CertificateExtractor::new(),
            validator: CertificateValidator::from_config(&config.validation),
        }
    }

    pub fn with_schema(mut self, schema: SchemaValidator) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_validator(mut self, validator: CertificateValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn validator(&self) -> &CertificateValidator {
        &self.validator
    }

    /// Parse scanned text into a certificate.
    pub fn parse(&self, raw: &str) -> ParseResult {
        self.parse_at(raw, Local::now().naive_local())
    }

    /// Parse with an explicit "now".
    ///
    /// The certificate is returned whenever the schema scorer accepts the
    /// text, even if final validation fails, so callers can show the
    /// partially extracted data next to the errors.
    pub fn parse_at(&self, raw: &str, now: NaiveDateTime) -> ParseResult {
        let normalized = normalize(raw);

        let schema = self.schema.score(&normalized);
        if !schema.is_valid {
            warn!(
                "Scanned content rejected by schema scorer (score {}): {}",
                schema.score,
                schema.errors.join("; ")
            );
            return ParseResult {
                certificate: None,
                validation: schema,
                raw_data: raw.to_string(),
            };
        }

        let certificate = self.extractor.extract_at(&normalized, now);
        let validation = self.validator.validate_at(&certificate, now.date());

        info!(
            "Parsed certificate {} (valid: {}, score {})",
            certificate.certificate_number, validation.is_valid, validation.score
        );

        ParseResult {
            certificate: Some(certificate),
            validation,
            raw_data: raw.to_string(),
        }
    }
}

/// Parse scanned text with the default configuration.
pub fn parse_qr_to_certificate(raw: &str) -> ParseResult {
    CertificateParser::new().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::schema::LINK_CONTENT_ERROR;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    fn certificate_text(valid_until: &str, vehicle: Option<&str>) -> String {
        let mut lines = vec![
            "CZPM N°: 2023-05-9765837433".to_string(),
            "AUTORIZADO A: 0801921727".to_string(),
            "CÓDIGO ÁREA ORIGEN: 03-0062-00436-00374833".to_string(),
            "CÓDIGO ÁREA DESTINO: 03-0062-00438-00160206".to_string(),
            "TOTAL PRODUCTOS: 4".to_string(),
            format!("VÁLIDO HASTA: {}", valid_until),
        ];
        if let Some(vehicle) = vehicle {
            lines.push(format!("VEHÍCULO: {}", vehicle));
        }
        lines.join("\r\n")
    }

    fn relative_date(days: i64) -> String {
        (Local::now().date_naive() + Duration::days(days))
            .format("%Y-%m-%d 00:00:00")
            .to_string()
    }

    #[test]
    fn test_round_trip_well_formed() {
        let raw = certificate_text("2099-01-01 00:00:00", Some("JBE0076"));
        let result = parse_qr_to_certificate(&raw);

        assert!(result.validation.is_valid);
        assert_eq!(result.raw_data, raw);

        let cert = result.certificate.unwrap();
        assert_eq!(cert.certificate_number, "2023-05-9765837433");
        assert_eq!(cert.authorized_to, "0801921727");
        assert_eq!(cert.origin_area_code, "03-0062-00436-00374833");
        assert_eq!(cert.destination_area_code, "03-0062-00438-00160206");
        assert_eq!(cert.total_products, 4);
        assert_eq!(
            cert.valid_until,
            NaiveDate::from_ymd_opt(2099, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(cert.vehicle, "JBE0076");
    }

    #[test]
    fn test_expired_certificate_still_returned() {
        let result = parse_qr_to_certificate(&certificate_text(&relative_date(-1), Some("JBE0076")));

        assert!(!result.validation.is_valid);
        assert!(result.validation.errors.iter().any(|e| e.contains("expirado")));
        assert!(result.certificate.is_some());
        assert!(!result.is_accepted());
    }

    #[test]
    fn test_near_expiry_is_warning() {
        let result = parse_qr_to_certificate(&certificate_text(&relative_date(2), Some("JBE0076")));

        assert!(result.validation.is_valid);
        assert!(result.validation.warnings.iter().any(|w| w.contains("2 día")));
    }

    #[test]
    fn test_link_is_rejected_without_certificate() {
        let result = parse_qr_to_certificate("https://example.com/promo");

        assert_eq!(result.certificate, None);
        assert!(!result.validation.is_valid);
        assert_eq!(result.validation.errors, vec![LINK_CONTENT_ERROR]);
        assert_eq!(result.raw_data, "https://example.com/promo");
    }

    #[test]
    fn test_missing_certificate_number_passes_schema_but_fails_validation() {
        let raw = certificate_text("2099-01-01", Some("JBE0076")).replace("CZPM N°: 2023-05-9765837433", "");
        let result = parse_qr_to_certificate(&raw);

        let cert = result.certificate.expect("schema accepts five of six fields");
        assert_eq!(cert.certificate_number, "");
        assert!(!result.validation.is_valid);
        assert_eq!(result.validation.errors, vec!["Número de certificado requerido"]);
        assert_eq!(result.validation.score, 70);
    }

    #[test]
    fn test_config_threshold_is_applied() {
        let mut config = ZoocertConfig::default();
        config.schema.min_score = 100;
        let parser = CertificateParser::from_config(&config);

        let raw = certificate_text("2099-01-01", None)
            .replace("TOTAL PRODUCTOS: 4", "")
            .replace("CÓDIGO ÁREA ORIGEN: 03-0062-00436-00374833", "");
        let result = parser.parse(&raw);

        assert!(result.certificate.is_none());
        assert_eq!(result.validation.score, 95);
    }
}
