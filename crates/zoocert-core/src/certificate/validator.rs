//! Post-extraction certificate validation.

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::models::certificate::{Certificate, ValidationResult};
use crate::models::config::ValidationConfig;

use super::rules::{AREA_CODE_FORMAT, CERTIFICATE_NUMBER_FORMAT, NUMERIC_ID_FORMAT};

const CERTIFICATE_NUMBER_PENALTY: u32 = 30;
const AUTHORIZED_TO_PENALTY: u32 = 25;
const AREA_CODE_PENALTY: u32 = 20;
const TOTAL_PRODUCTS_PENALTY: u32 = 15;
const EXPIRED_PENALTY: u32 = 20;

/// Validates required fields and the expiry rule of an extracted certificate.
#[derive(Debug, Clone)]
pub struct CertificateValidator {
    expiry_warning_days: i64,
    vehicle_penalty: u32,
}

/// Running deductions for one certificate.
struct Findings {
    score: u32,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn new() -> Self {
        Self { score: 100, errors: Vec::new(), warnings: Vec::new() }
    }

    fn error(&mut self, message: impl Into<String>, penalty: u32) {
        self.errors.push(message.into());
        self.score = self.score.saturating_sub(penalty);
    }

    fn warning(&mut self, message: impl Into<String>, penalty: u32) {
        self.warnings.push(message.into());
        self.score = self.score.saturating_sub(penalty);
    }

    fn finish(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            score: self.score,
        }
    }
}

impl CertificateValidator {
    pub fn new() -> Self {
        Self::from_config(&ValidationConfig::default())
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            expiry_warning_days: config.expiry_warning_days,
            vehicle_penalty: config.vehicle_penalty,
        }
    }

    /// Set the near-expiry warning window in days.
    pub fn with_expiry_warning_days(mut self, days: i64) -> Self {
        self.expiry_warning_days = days;
        self
    }

    /// Validate against the local calendar date.
    pub fn validate(&self, certificate: &Certificate) -> ValidationResult {
        self.validate_at(certificate, Local::now().date_naive())
    }

    /// Validate against an explicit "today".
    pub fn validate_at(&self, certificate: &Certificate, today: NaiveDate) -> ValidationResult {
        let mut findings = Findings::new();

        if certificate.certificate_number.is_empty() {
            findings.error("Número de certificado requerido", CERTIFICATE_NUMBER_PENALTY);
        } else if !CERTIFICATE_NUMBER_FORMAT.is_match(&certificate.certificate_number) {
            findings.warning(
                format!(
                    "Formato de número de certificado inusual: {}",
                    certificate.certificate_number
                ),
                0,
            );
        }

        if certificate.authorized_to.is_empty() {
            findings.error("Autorizado a requerido", AUTHORIZED_TO_PENALTY);
        } else if !NUMERIC_ID_FORMAT.is_match(&certificate.authorized_to) {
            findings.warning(
                format!("Identificación de autorizado no numérica: {}", certificate.authorized_to),
                0,
            );
        }

        check_area_code(
            &mut findings,
            &certificate.origin_area_code,
            "Código de área de origen requerido",
            "origen",
        );
        check_area_code(
            &mut findings,
            &certificate.destination_area_code,
            "Código de área de destino requerido",
            "destino",
        );

        if certificate.total_products < 1 {
            findings.error("Total de productos debe ser mayor a 0", TOTAL_PRODUCTS_PENALTY);
        }

        match certificate.days_until_expiry(today) {
            Some(days) if days < 0 => {
                let expired_on = certificate
                    .valid_until
                    .map(|valid_until| valid_until.date().to_string())
                    .unwrap_or_default();
                findings.error(
                    format!("El certificado ha expirado (válido hasta {})", expired_on),
                    EXPIRED_PENALTY,
                );
            }
            Some(days) if days <= self.expiry_warning_days => {
                findings.warning(format!("El certificado expira en {} día(s)", days), 0);
            }
            Some(_) => {}
            None => findings.warning("Fecha de validez no especificada", 0),
        }

        if certificate.vehicle.trim().is_empty() {
            findings.warning("Vehículo no especificado", self.vehicle_penalty);
        }

        let result = findings.finish();
        debug!(
            "Validated certificate {:?}: score {}, {} errors, {} warnings",
            certificate.certificate_number,
            result.score,
            result.errors.len(),
            result.warnings.len()
        );
        result
    }
}

impl Default for CertificateValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_area_code(findings: &mut Findings, code: &str, missing: &str, label: &str) {
    if code.is_empty() {
        findings.error(missing, AREA_CODE_PENALTY);
    } else if !AREA_CODE_FORMAT.is_match(code) {
        findings.warning(format!("Formato de código de área de {} inusual: {}", label, code), 0);
    }
}

/// Validate a certificate with the default rules.
pub fn validate(certificate: &Certificate) -> ValidationResult {
    CertificateValidator::new().validate(certificate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn valid_certificate() -> Certificate {
        Certificate {
            id: None,
            certificate_number: "2023-05-9765837433".to_string(),
            authorized_to: "0801921727".to_string(),
            origin_area_code: "03-0062-00436-00374833".to_string(),
            destination_area_code: "03-0062-00438-00160206".to_string(),
            total_products: 4,
            valid_until: NaiveDate::from_ymd_opt(2099, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
            vehicle: "JBE0076".to_string(),
        }
    }

    fn expiring(days: i64) -> Certificate {
        Certificate {
            valid_until: (today() + chrono::Duration::days(days)).and_hms_opt(8, 0, 0),
            ..valid_certificate()
        }
    }

    #[test]
    fn test_valid_certificate() {
        let result = CertificateValidator::new().validate_at(&valid_certificate(), today());
        assert_eq!(
            result,
            ValidationResult { is_valid: true, errors: vec![], warnings: vec![], score: 100 }
        );
    }

    #[test]
    fn test_empty_certificate_deductions() {
        let cert = Certificate { total_products: 0, ..Certificate::default() };
        let result = CertificateValidator::new().validate_at(&cert, today());

        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec![
                "Número de certificado requerido",
                "Autorizado a requerido",
                "Código de área de origen requerido",
                "Código de área de destino requerido",
                "Total de productos debe ser mayor a 0",
            ]
        );
        assert_eq!(
            result.warnings,
            vec!["Fecha de validez no especificada", "Vehículo no especificado"]
        );
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_expired_yesterday() {
        let result = CertificateValidator::new().validate_at(&expiring(-1), today());
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["El certificado ha expirado (válido hasta 2024-05-31)"]);
        assert_eq!(result.score, 80);
    }

    #[test]
    fn test_expiring_today_is_warning() {
        let result = CertificateValidator::new().validate_at(&expiring(0), today());
        assert!(result.is_valid);
        assert_eq!(result.warnings, vec!["El certificado expira en 0 día(s)"]);
    }

    #[test]
    fn test_near_expiry_warning() {
        let result = CertificateValidator::new().validate_at(&expiring(2), today());
        assert!(result.is_valid);
        assert_eq!(result.score, 100);
        assert!(result.warnings.iter().any(|w| w.contains("2 día")));
    }

    #[test]
    fn test_warning_window_is_inclusive() {
        let validator = CertificateValidator::new();
        assert_eq!(validator.validate_at(&expiring(3), today()).warnings.len(), 1);
        assert!(validator.validate_at(&expiring(4), today()).warnings.is_empty());
        assert!(
            validator
                .with_expiry_warning_days(7)
                .validate_at(&expiring(4), today())
                .warnings
                .len()
                == 1
        );
    }

    #[test]
    fn test_missing_vehicle_is_penalized_warning() {
        let cert = Certificate { vehicle: String::new(), ..valid_certificate() };
        let result = CertificateValidator::new().validate_at(&cert, today());
        assert!(result.is_valid);
        assert_eq!(result.score, 95);
        assert_eq!(result.warnings, vec!["Vehículo no especificado"]);
    }

    #[test]
    fn test_unusual_formats_warn_without_deduction() {
        let cert = Certificate {
            certificate_number: "ABC".to_string(),
            authorized_to: "08019X".to_string(),
            origin_area_code: "030062".to_string(),
            ..valid_certificate()
        };
        let result = CertificateValidator::new().validate_at(&cert, today());
        assert!(result.is_valid);
        assert_eq!(result.score, 100);
        assert_eq!(result.warnings.len(), 3);
    }
}
