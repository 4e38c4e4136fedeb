//! Locale-aware parsing of monetary amounts from free-form page text.

use serde::{Deserialize, Serialize};

/// Numeric formatting convention used by a storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    /// Comma thousands separator, dot decimal (1,234.56).
    #[default]
    Us,
    /// Dot thousands separator, comma decimal (1.234,56).
    Eu,
    /// Comma thousands separator, no decimal subunit (1,234).
    Jp,
}

/// Extracts a non-negative amount from raw order-total text.
///
/// Unparseable input yields `0.0` rather than an error: a page with odd
/// total markup must contribute nothing, not abort the whole scrape.
pub fn parse_amount(text: &str, format: NumberFormat) -> f64 {
    let cleaned: String =
        text.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    let normalized = match format {
        NumberFormat::Eu => normalize_eu(&cleaned),
        // Comma is always a thousands separator in these formats.
        NumberFormat::Us | NumberFormat::Jp => cleaned.replace(',', ""),
    };

    let amount: f64 = normalized.parse().unwrap_or(0.0);
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Normalizes an EU-formatted number to a parseable dot-decimal string.
fn normalize_eu(cleaned: &str) -> String {
    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    if has_dot && has_comma {
        // 1.234,56 -> 1234.56
        cleaned.replace('.', "").replace(',', ".")
    } else if has_comma {
        // 45,00 -> 45.00
        cleaned.replace(',', ".")
    } else if has_dot && is_thousands_grouping(cleaned) {
        // 1.234 / 1.234.567 -> grouped thousands, strip the dots
        cleaned.replace('.', "")
    } else {
        // Single ambiguous dot: treat as a decimal point.
        cleaned.to_string()
    }
}

/// Whether a dot-only string looks like thousands grouping: a leading group
/// of 1-3 digits followed by exact groups of 3 (no trailing fraction).
fn is_thousands_grouping(s: &str) -> bool {
    let mut parts = s.split('.');

    match parts.next() {
        Some(h) if !h.is_empty() && h.len() <= 3 && h.chars().all(|c| c.is_ascii_digit()) => {}
        _ => return false,
    }

    let mut groups = 0;
    for part in parts {
        if part.len() != 3 || !part.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        groups += 1;
    }

    groups > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_eu() {
        assert_eq!(parse_amount("1.234,56 €", NumberFormat::Eu), 1234.56);
        assert_eq!(parse_amount("45,00", NumberFormat::Eu), 45.00);
        assert_eq!(parse_amount("999", NumberFormat::Eu), 999.0);
        assert_eq!(parse_amount("Totale ordine: 29,99 €", NumberFormat::Eu), 29.99);
    }

    #[test]
    fn test_parse_amount_eu_dot_only() {
        // Grouped thousands
        assert_eq!(parse_amount("1.234", NumberFormat::Eu), 1234.0);
        assert_eq!(parse_amount("1.234.567", NumberFormat::Eu), 1234567.0);
        // Ambiguous single dot falls back to decimal point
        assert_eq!(parse_amount("12.5", NumberFormat::Eu), 12.5);
        assert_eq!(parse_amount("0.99", NumberFormat::Eu), 0.99);
    }

    #[test]
    fn test_parse_amount_us() {
        assert_eq!(parse_amount("$1,234.56", NumberFormat::Us), 1234.56);
        assert_eq!(parse_amount("Order total: $29.99", NumberFormat::Us), 29.99);
        assert_eq!(parse_amount("$10", NumberFormat::Us), 10.0);
    }

    #[test]
    fn test_parse_amount_jp() {
        assert_eq!(parse_amount("¥2,999", NumberFormat::Jp), 2999.0);
        assert_eq!(parse_amount("合計 ¥12,300", NumberFormat::Jp), 12300.0);
    }

    #[test]
    fn test_parse_amount_garbage_is_zero() {
        assert_eq!(parse_amount("", NumberFormat::Eu), 0.0);
        assert_eq!(parse_amount("abc", NumberFormat::Eu), 0.0);
        assert_eq!(parse_amount("...", NumberFormat::Us), 0.0);
        assert_eq!(parse_amount(",,", NumberFormat::Eu), 0.0);
        assert_eq!(parse_amount("N/A", NumberFormat::Us), 0.0);
    }

    #[test]
    fn test_parse_amount_zero_stays_zero() {
        assert_eq!(parse_amount("0,00 €", NumberFormat::Eu), 0.0);
        assert_eq!(parse_amount("$0.00", NumberFormat::Us), 0.0);
    }

    #[test]
    fn test_thousands_grouping_detection() {
        assert!(is_thousands_grouping("1.234"));
        assert!(is_thousands_grouping("123.456.789"));
        assert!(!is_thousands_grouping("1.2345"));
        assert!(!is_thousands_grouping("12.5"));
        assert!(!is_thousands_grouping("1234"));
        assert!(!is_thousands_grouping(".234"));
        assert!(!is_thousands_grouping("1."));
    }
}
