//! Zoosanitary certificate parsing pipeline.
//!
//! Normalizer, schema scorer, field extractor, date parser and validator,
//! composed by [`CertificateParser`]. Every function here is total: bad input
//! produces a failed [`ValidationResult`](crate::models::certificate::ValidationResult),
//! never an error.

pub mod dates;
mod extractor;
mod normalizer;
mod parser;
pub mod rules;
mod schema;
mod validator;

pub use dates::{parse_date, parse_date_at, try_parse_date};
pub use extractor::{extract, CertificateExtractor};
pub use normalizer::normalize;
pub use parser::{parse_qr_to_certificate, CertificateParser};
pub use schema::{score_schema, SchemaValidator, EMPTY_CONTENT_ERROR, LINK_CONTENT_ERROR};
pub use validator::{validate, CertificateValidator};
