//! Numeric token helpers shared by the format parsers

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Signed integer or decimal, anywhere on a line
static NUMERIC_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").unwrap());

/// A coordinate or derived measurement.
///
/// Whole values are always held as `Int` so they serialize as `100`
/// rather than `100.0`; the generated equipment files depend on that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Normalize a float: whole numbers become `Int`
    pub fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Number::Int(value as i64)
        } else {
            Number::Float(value)
        }
    }

    /// Parse a numeric token, returning None for anything that is not a finite number
    pub fn parse(token: &str) -> Option<Self> {
        let value: f64 = token.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Self::from_f64(value))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// All numeric tokens on a line, in order
pub fn numeric_tokens(line: &str) -> Vec<&str> {
    NUMERIC_TOKEN.find_iter(line).map(|m| m.as_str()).collect()
}

/// The last two numeric tokens on a line as an (x, y) pair
pub fn last_two_numbers(line: &str) -> Option<(Number, Number)> {
    let tokens = numeric_tokens(line);
    if tokens.len() < 2 {
        return None;
    }
    let x = Number::parse(tokens[tokens.len() - 2])?;
    let y = Number::parse(tokens[tokens.len() - 1])?;
    Some((x, y))
}

/// First capture group of `pattern` in `text`, trimmed, or empty
pub fn labeled_field(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_normalization() {
        assert_eq!(Number::parse("100"), Some(Number::Int(100)));
        assert_eq!(Number::parse("100.0"), Some(Number::Int(100)));
        assert_eq!(Number::parse("-12.5"), Some(Number::Float(-12.5)));
        assert_eq!(Number::parse("abc"), None);
        assert_eq!(Number::from_f64(-50.0), Number::Int(-50));
    }

    #[test]
    fn test_number_serializes_without_fraction_when_whole() {
        assert_eq!(serde_json::to_string(&Number::Int(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Number::Float(-50.5)).unwrap(), "-50.5");
    }

    #[test]
    fn test_last_two_numbers_ignores_trailing_text() {
        let (x, y) = last_two_numbers("`MOD1` some text 100 200 extra").unwrap();
        assert_eq!(x, Number::Int(100));
        assert_eq!(y, Number::Int(200));
    }

    #[test]
    fn test_last_two_numbers_needs_two_tokens() {
        assert!(last_two_numbers("ALIGN only 42").is_none());
        assert!(last_two_numbers("").is_none());
    }

    #[test]
    fn test_non_ascii_digits_are_not_tokens() {
        // Arabic-Indic digits would match a Unicode \d but never parse as f64
        assert_eq!(numeric_tokens("M1 10 20 \u{0661}\u{0662}"), vec!["10", "20"]);
        let (x, y) = last_two_numbers("M1 10 20 \u{0661}\u{0662}").unwrap();
        assert_eq!(x, Number::Int(10));
        assert_eq!(y, Number::Int(20));
    }

    #[test]
    fn test_numeric_tokens_signed_and_decimal() {
        assert_eq!(numeric_tokens("a -3 4.25 x7"), vec!["-3", "4.25", "7"]);
    }
}
