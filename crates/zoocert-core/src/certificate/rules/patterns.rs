//! Regex tables for zoosanitary certificate text.
//!
//! All patterns run against normalized text: upper-cased, single spaces and
//! no line breaks.

use lazy_static::lazy_static;

use super::{FieldPattern, ScoredPattern};

/// Markers of content that is a link rather than a certificate.
pub const EXCLUDED_MARKERS: &[&str] = &[
    "HTTP://",
    "HTTPS://",
    "WWW.",
    "FACEBOOK.COM",
    "INSTAGRAM.COM",
    "TWITTER.COM",
    "TIKTOK.COM",
    "YOUTUBE.COM",
    "YOUTU.BE",
    "LINKEDIN.COM",
    "WA.ME/",
];

/// A date with optional time, year first or day first.
const DATE_VALUE: &str = r"(\d{4}[-/]\d{1,2}[-/]\d{1,2}(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?|\d{1,2}[-/]\d{1,2}[-/]\d{4}(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?)";

lazy_static! {
    // Schema scoring: required fields. Weights sum to 130.
    pub static ref REQUIRED_FIELDS: Vec<ScoredPattern> = vec![
        ScoredPattern::new(
            "número de certificado",
            30,
            r"(?:CZPM|CERTIFICADO)[^0-9]{0,40}\d{4}-\d{2}-\d+|\b\d{4}-\d{2}-\d{6,}\b",
        ),
        ScoredPattern::new("autorizado a", 25, r"AUTORIZADO[^0-9]{0,30}\d+"),
        ScoredPattern::new("código de área de origen", 20, r"ORIGEN[^0-9]{0,30}\d+(?:-\d+)+"),
        ScoredPattern::new("código de área de destino", 20, r"DESTINO[^0-9]{0,30}\d+(?:-\d+)+"),
        ScoredPattern::new("total de productos", 15, r"(?:PRODUCTOS|CANTIDAD)[^0-9]{0,20}\d+"),
        ScoredPattern::new(
            "válido hasta",
            20,
            r"(?:V[AÁ]LIDO\s+HASTA|VIGENCIA|VENCE|VENCIMIENTO|CADUCA|CADUCIDAD|HASTA)[^0-9]{0,20}\d{1,4}[-/]\d{1,2}[-/]\d{1,4}",
        ),
    ];

    // Schema scoring: optional fields.
    pub static ref OPTIONAL_FIELDS: Vec<ScoredPattern> = vec![
        ScoredPattern::new("vehículo", 10, r"VEH[IÍ]CULO|PLACA"),
    ];

    // Field extraction chains, strict first.
    pub static ref CERTIFICATE_NUMBER: Vec<FieldPattern> = vec![
        FieldPattern::new(r"(?:CZPM|CERTIFICADO)[^0-9]{0,40}?(\d{4}-\d{2}-\d+)", 1),
        FieldPattern::new(r"N(?:[°º]|O\.?|RO\.?|[ÚU]MERO)\s*:?\s*(\d{4}-\d{2}-\d+)", 1),
        FieldPattern::new(r"\b(\d{4}-\d{2}-\d{6,})\b", 1),
    ];

    pub static ref AUTHORIZED_TO: Vec<FieldPattern> = vec![
        FieldPattern::new(r"AUTORIZADO\s+A\s*:?\s*(\d{10,13})\b", 1),
        FieldPattern::new(r"AUTORIZADO[^0-9]{0,30}(\d+)", 1),
        FieldPattern::new(r"(?:C[EÉ]DULA|RUC|C\.I\.)\s*:?\s*(\d{10,13})\b", 1),
    ];

    pub static ref ORIGIN_AREA_CODE: Vec<FieldPattern> = vec![
        FieldPattern::new(
            r"(?:C[OÓ]DIGO\s+(?:DE\s+)?)?[AÁ]REA\s+(?:DE\s+)?ORIGEN\s*:?\s*(\d+(?:-\d+)+)",
            1,
        ),
        FieldPattern::new(r"ORIGEN[^0-9]{0,30}(\d+(?:-\d+)+)", 1),
    ];

    pub static ref DESTINATION_AREA_CODE: Vec<FieldPattern> = vec![
        FieldPattern::new(
            r"(?:C[OÓ]DIGO\s+(?:DE\s+)?)?[AÁ]REA\s+(?:DE\s+)?DESTINO\s*:?\s*(\d+(?:-\d+)+)",
            1,
        ),
        FieldPattern::new(r"DESTINO[^0-9]{0,30}(\d+(?:-\d+)+)", 1),
    ];

    pub static ref TOTAL_PRODUCTS: Vec<FieldPattern> = vec![
        FieldPattern::new(r"TOTAL\s+(?:DE\s+)?PRODUCTOS\s*:?\s*(\d+)", 1),
        FieldPattern::new(r"PRODUCTOS[^0-9]{0,20}(\d+)", 1),
        FieldPattern::new(r"CANTIDAD(?:\s+TOTAL)?\s*:?\s*(\d+)", 1),
    ];

    pub static ref VALID_UNTIL: Vec<FieldPattern> = vec![
        FieldPattern::new(&format!(r"V[AÁ]LIDO\s+HASTA\s*:?\s*{}", DATE_VALUE), 1),
        FieldPattern::new(
            &format!(r"(?:VIGENCIA|VENCE|VENCIMIENTO|CADUCA|CADUCIDAD)[^0-9]{{0,20}}{}", DATE_VALUE),
            1,
        ),
        FieldPattern::new(&format!(r"HASTA\s*:?\s*{}", DATE_VALUE), 1),
    ];

    pub static ref VEHICLE: Vec<FieldPattern> = vec![
        FieldPattern::new(r"VEH[IÍ]CULO\s*:?\s*(?:PLACA\s*:?\s*)?([A-Z]{3}-?\d{3,4})\b", 1),
        FieldPattern::new(r"PLACA\s*:?\s*([A-Z]{3}-?\d{3,4})\b", 1),
        FieldPattern::new(r"VEH[IÍ]CULO\s*:?\s*([A-Z0-9][A-Z0-9-]{2,})", 1),
    ];

    // Shapes from the certificate data model.
    pub static ref CERTIFICATE_NUMBER_FORMAT: regex::Regex =
        regex::Regex::new(r"^\d{4}-\d{2}-\d+$").unwrap();

    pub static ref AREA_CODE_FORMAT: regex::Regex =
        regex::Regex::new(r"^\d+(?:-\d+)+$").unwrap();

    pub static ref NUMERIC_ID_FORMAT: regex::Regex =
        regex::Regex::new(r"^\d+$").unwrap();
}
