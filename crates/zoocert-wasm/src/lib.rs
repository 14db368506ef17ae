//! WASM bindings for zoosanitary certificate QR parsing.
//!
//! The browser decodes the QR image; these bindings take the decoded text.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use zoocert_core::certificate;
use zoocert_core::models::certificate::Certificate;
use zoocert_core::models::config::ZoocertConfig;
use zoocert_core::models::scan::Platform;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Normalize scanned text: unify whitespace and upper-case.
#[wasm_bindgen]
pub fn normalize_text(text: &str) -> String {
    certificate::normalize(text)
}

/// Run the full pipeline and return a `ParseResult`.
#[wasm_bindgen]
pub fn parse_certificate(text: &str) -> Result<JsValue, JsValue> {
    to_js(&certificate::parse_qr_to_certificate(text))
}

/// Score raw scanned text against the certificate schema.
#[wasm_bindgen]
pub fn score_schema(text: &str) -> Result<JsValue, JsValue> {
    to_js(&certificate::score_schema(&certificate::normalize(text)))
}

/// Validate a certificate object, e.g. one corrected by the user.
#[wasm_bindgen]
pub fn validate_certificate(value: JsValue) -> Result<JsValue, JsValue> {
    let certificate: Certificate = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("invalid certificate: {}", e)))?;
    to_js(&certificate::validate(&certificate))
}

/// Parse a date; unparseable input yields the current time.
#[wasm_bindgen]
pub fn parse_date(text: &str) -> String {
    certificate::parse_date(text)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Scan methods offered on `web`, `ios` or `android`.
#[wasm_bindgen]
pub fn available_methods(platform: &str) -> Result<js_sys::Array, JsValue> {
    let platform: Platform = platform.parse().map_err(|e: String| JsValue::from_str(&e))?;
    Ok(platform
        .available_methods()
        .iter()
        .map(|method| JsValue::from_str(method.as_str()))
        .collect())
}

/// Configurable certificate parser for browser use.
#[wasm_bindgen(js_name = CertificateParser)]
pub struct WasmCertificateParser {
    config: ZoocertConfig,
    parser: certificate::CertificateParser,
}

#[wasm_bindgen(js_class = CertificateParser)]
impl WasmCertificateParser {
    /// Create a parser with default thresholds.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let config = ZoocertConfig::default();
        Self {
            parser: certificate::CertificateParser::from_config(&config),
            config,
        }
    }

    /// Minimum schema score (0 - 100) for text to count as a certificate.
    #[wasm_bindgen]
    pub fn set_min_score(&mut self, min_score: u32) -> Result<(), JsValue> {
        let mut config = self.config.clone();
        config.schema.min_score = min_score;
        self.apply(config)
    }

    /// Days before expiry that trigger a warning.
    #[wasm_bindgen]
    pub fn set_expiry_warning_days(&mut self, days: i32) -> Result<(), JsValue> {
        let mut config = self.config.clone();
        config.validation.expiry_warning_days = i64::from(days);
        self.apply(config)
    }

    /// Parse scanned text into a `ParseResult`.
    #[wasm_bindgen]
    pub fn parse(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text))
    }

    /// Validate a certificate object with this parser's thresholds.
    #[wasm_bindgen]
    pub fn validate(&self, value: JsValue) -> Result<JsValue, JsValue> {
        let certificate: Certificate = serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsValue::from_str(&format!("invalid certificate: {}", e)))?;
        to_js(&self.parser.validator().validate(&certificate))
    }

    /// Swap in a new configuration; an invalid one leaves the parser unchanged.
    fn apply(&mut self, config: ZoocertConfig) -> Result<(), JsValue> {
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.parser = certificate::CertificateParser::from_config(&config);
        self.config = config;
        Ok(())
    }
}

impl Default for WasmCertificateParser {
    fn default() -> Self {
        Self::new()
    }
}
