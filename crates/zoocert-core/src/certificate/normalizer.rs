//! Canonical form of scanned text for pattern matching.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize raw scanned text.
///
/// Line endings are unified, tabs and whitespace runs collapse to a single
/// space, the result is trimmed and upper-cased.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n").replace('\t', " ");
    let collapsed = WHITESPACE_RUN.replace_all(&unified, " ");
    collapsed.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize("  czpm n°:\t2023-05-1\r\nautorizado a:  0801\r vehículo \n"),
            "CZPM N°: 2023-05-1 AUTORIZADO A: 0801 VEHÍCULO"
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\r\n "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "abc",
            "  Válido hasta:\t2099-01-01\r\n00:00 ",
            "straße\u{00a0}\u{2003}mixed\n\nlines",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
