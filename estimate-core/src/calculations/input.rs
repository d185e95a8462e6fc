//! Lenient parsing of numbers typed into the estimate.
//!
//! Numeric entry never fails: blank input reads as zero and anything that
//! cannot be read keeps the previous value.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid number '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Trims whitespace and drops currency symbols and thousands separators.
fn normalize_decimal_input(s: &str) -> String {
    s.trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
        .collect()
}

/// Parses a user-entered number such as `"1,350"` or `"$45.99"`.
///
/// Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| ParseDecimalError {
        input: s.to_string(),
        source: e,
    })
}

/// Parses `s`, keeping `previous` when the text is not a number.
pub fn parse_decimal_or(
    s: &str,
    previous: Decimal,
) -> Decimal {
    parse_decimal(s).unwrap_or_else(|error| {
        warn!(%error, %previous, "keeping previous value");
        previous
    })
}

/// Parses an optional number; blank or malformed input yields `None`.
pub fn parse_optional_decimal(s: &str) -> Option<Decimal> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse().map_or_else(
        |e| {
            warn!(input = %s, "invalid optional number: {}", e);
            None
        },
        Some,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_decimal_accepts_thousands_separator_and_currency() {
        assert_eq!(parse_decimal("1,350").unwrap(), dec!(1350));
        assert_eq!(parse_decimal(" $45.99 ").unwrap(), dec!(45.99));
        assert_eq!(parse_decimal("1 234.5").unwrap(), dec!(1234.5));
    }

    #[test]
    fn parse_decimal_empty_is_zero() {
        assert_eq!(parse_decimal("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("   ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_decimal_rejects_text() {
        assert!(parse_decimal("twelve").is_err());
        assert!(parse_decimal("12..5").is_err());
    }

    #[test]
    fn parse_decimal_or_keeps_previous_on_garbage() {
        assert_eq!(parse_decimal_or("abc", dec!(68)), dec!(68));
        assert_eq!(parse_decimal_or("", dec!(68)), Decimal::ZERO);
        assert_eq!(parse_decimal_or("70", dec!(68)), dec!(70));
    }

    #[test]
    fn parse_optional_decimal_handles_blank_and_garbage() {
        assert_eq!(parse_optional_decimal("1,350.5"), Some(dec!(1350.5)));
        assert_eq!(parse_optional_decimal(""), None);
        assert_eq!(parse_optional_decimal("n/a"), None);
    }
}
