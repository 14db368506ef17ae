//! Zoosanitary certificate data models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A zoosanitary mobilization certificate read from a QR code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Identifier assigned by the persistence layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Certificate number (`YYYY-NN-<digits>`).
    pub certificate_number: String,

    /// Numeric identifier of the holder the certificate is issued to.
    pub authorized_to: String,

    /// Dash-delimited code of the origin area.
    pub origin_area_code: String,

    /// Dash-delimited code of the destination area.
    pub destination_area_code: String,

    /// Number of products covered by the certificate.
    pub total_products: u32,

    /// Expiry of the certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDateTime>,

    /// Transport vehicle plate.
    #[serde(default)]
    pub vehicle: String,
}

impl Certificate {
    /// All four required string fields are present and at least one product is declared.
    pub fn is_structurally_valid(&self) -> bool {
        !self.certificate_number.is_empty()
            && !self.authorized_to.is_empty()
            && !self.origin_area_code.is_empty()
            && !self.destination_area_code.is_empty()
            && self.total_products >= 1
    }

    /// Days from `today` until the expiry date, ignoring the time of day.
    ///
    /// Negative when the certificate already expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.valid_until
            .map(|valid_until| (valid_until.date() - today).num_days())
    }

    /// Whether the expiry date lies strictly before `today`.
    pub fn is_expired_at(&self, today: NaiveDate) -> bool {
        self.days_until_expiry(today).is_some_and(|days| days < 0)
    }

    /// Structurally valid and not expired.
    pub fn is_usable_at(&self, today: NaiveDate) -> bool {
        self.is_structurally_valid() && !self.is_expired_at(today)
    }
}

/// Outcome of a validation pass.
///
/// Both the pre-extraction schema scorer and the post-extraction certificate
/// validator produce this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Score in the range 0 - 100.
    pub score: u32,
}

impl ValidationResult {
    /// A failed validation with a single error and zero score.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
            score: 0,
        }
    }

    /// Errors joined into a single user-facing message.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.join("; "))
        }
    }
}

/// Result of running the full parsing pipeline over scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    /// Extracted certificate, present once the schema scorer accepted the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,

    /// Final validation outcome.
    pub validation: ValidationResult,

    /// The text exactly as it was scanned.
    pub raw_data: String,
}

impl ParseResult {
    /// A certificate was extracted and passed validation.
    pub fn is_accepted(&self) -> bool {
        self.certificate.is_some() && self.validation.is_valid
    }
}

/// Certificate fields typed in by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualCertificateInput {
    pub certificate_number: Option<String>,
    pub authorized_to: Option<String>,
    pub origin_area_code: Option<String>,
    pub destination_area_code: Option<String>,
    pub total_products: Option<u32>,
    pub valid_until: Option<NaiveDateTime>,
    pub vehicle: Option<String>,
}
