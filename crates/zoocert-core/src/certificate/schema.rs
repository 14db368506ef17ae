//! Pre-extraction schema scoring.
//!
//! Decides whether normalized text plausibly is a zoosanitary certificate
//! before any field is extracted from it.

use tracing::{debug, warn};

use crate::models::certificate::ValidationResult;
use crate::models::config::SchemaConfig;

use super::rules::{ScoredPattern, EXCLUDED_MARKERS, OPTIONAL_FIELDS, REQUIRED_FIELDS};

pub const LINK_CONTENT_ERROR: &str =
    "El contenido parece ser un enlace, no un certificado zoosanitario";
pub const EMPTY_CONTENT_ERROR: &str = "El código QR no contiene texto";

/// Weighted schema scorer.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    min_score: u32,
}

/// Accumulated score of a pass over the pattern tables.
#[derive(Debug, Default)]
struct Tally {
    score: u32,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Tally {
    fn required(mut self, pattern: &ScoredPattern, text: &str) -> Self {
        if pattern.matches(text) {
            self.score += pattern.weight;
        } else {
            self.errors.push(format!("Campo requerido no encontrado: {}", pattern.field));
        }
        self
    }

    fn optional(mut self, pattern: &ScoredPattern, text: &str) -> Self {
        if pattern.matches(text) {
            self.score += pattern.weight;
        } else {
            self.warnings.push(format!("Campo opcional no encontrado: {}", pattern.field));
        }
        self
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::from_config(&SchemaConfig::default())
    }

    pub fn from_config(config: &SchemaConfig) -> Self {
        Self { min_score: config.min_score }
    }

    /// Set the minimum score.
    pub fn with_min_score(mut self, min_score: u32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    /// Score normalized text against the certificate schema.
    ///
    /// The threshold applies to the raw weighted sum; the reported score is
    /// capped at 100.
    pub fn score(&self, text: &str) -> ValidationResult {
        if let Some(marker) = excluded_marker(text) {
            warn!("Rejected scanned content containing link marker {}", marker);
            return ValidationResult::rejected(LINK_CONTENT_ERROR);
        }

        if text.trim().is_empty() {
            return ValidationResult::rejected(EMPTY_CONTENT_ERROR);
        }

        let tally = REQUIRED_FIELDS
            .iter()
            .fold(Tally::default(), |tally, pattern| tally.required(pattern, text));
        let tally = OPTIONAL_FIELDS
            .iter()
            .fold(tally, |tally, pattern| tally.optional(pattern, text));

        let is_valid = tally.score >= self.min_score;
        debug!(
            "Schema score {} (threshold {}), {} missing required fields",
            tally.score,
            self.min_score,
            tally.errors.len()
        );

        ValidationResult {
            is_valid,
            errors: tally.errors,
            warnings: tally.warnings,
            score: tally.score.min(100),
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Score normalized text with the default threshold.
pub fn score_schema(text: &str) -> ValidationResult {
    SchemaValidator::new().score(text)
}

fn excluded_marker(text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    EXCLUDED_MARKERS
        .iter()
        .copied()
        .find(|marker| upper.contains(marker))
}
