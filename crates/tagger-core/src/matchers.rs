//! Shared text matchers: amount shapes, day-of-month anchors, stoplists.
//!
//! Bank-specific date regexes live with their classifiers; this module holds
//! the matchers more than one layout relies on.

use once_cell::sync::Lazy;
use regex::Regex;

/// Currency-amount shape: digits grouped by thousands separators ending in
/// two decimal digits, e.g. `1,000.00`, `500.00`, `0.00`.
static AMOUNT_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:[,\.\s]\d{3})*[,\.\s]\d{2}").unwrap());

/// Strict cents suffix: rejects page numbers and years like `2021`.
static CENTS_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\d{2}$").unwrap());

/// True if the text contains an amount-shaped substring.
pub fn has_amount_shape(text: &str) -> bool {
    AMOUNT_SHAPE.is_match(text)
}

/// True if the token parses as a number and ends with exactly two cents
/// digits (`20.00`, `+400,000.00`, `-50.00`).
pub fn is_strict_amount(text: &str) -> bool {
    let trimmed = text.trim();
    let clean: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | '+' | '-'))
        .collect();
    clean.parse::<f64>().is_ok() && CENTS_SUFFIX.is_match(trimmed)
}

/// Parse a financial amount, tolerant of currency noise.
///
/// Returns `None` for tokens without a decimal/thousands separator, for
/// long separator-free digit runs (reference numbers), and for zero.
pub fn parse_amount(text: &str) -> Option<f64> {
    let clean: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if !clean.contains('.') && !clean.contains(',') {
        return None;
    }
    if clean.len() > 9 && !clean.contains(',') && !clean.contains('.') {
        return None;
    }

    let val: f64 = clean.replace(',', "").parse().ok()?;
    if val == 0.0 {
        return None;
    }
    Some(val)
}

/// Parse any comma-grouped decimal, zero included. Used where a literal
/// `0.00` is itself the target (zero-balance convention).
pub fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', "").trim().parse::<f64>().ok()
}

/// True if the token looks like a day of month (1-31), tolerating OCR
/// noise: stray punctuation, `O` read for `0`, `12/DIC` style suffixes.
/// Longer digit runs are truncated to their first two digits, so `150.00`
/// reads as day 15.
pub fn is_valid_day(text: &str) -> bool {
    let mut clean: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ' '))
        .collect::<String>()
        .to_uppercase()
        .replace('O', "0");

    if let Some(pos) = clean.find('/') {
        clean.truncate(pos);
    }
    let digits: String = clean
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .take(2)
        .collect();
    if digits.is_empty() {
        return false;
    }
    matches!(digits.parse::<u32>(), Ok(d) if (1..=31).contains(&d))
}

/// True if the upper-cased text contains any of the keywords.
pub fn contains_any(upper_text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| upper_text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_shape() {
        assert!(has_amount_shape("1,000.00"));
        assert!(has_amount_shape("500.00"));
        assert!(has_amount_shape("0.00"));
        assert!(has_amount_shape("PAGO 1,500.00 SPEI"));
        assert!(!has_amount_shape("FECHA OPER"));
    }

    #[test]
    fn test_strict_amount() {
        assert!(is_strict_amount("20.00"));
        assert!(is_strict_amount("1,234.56"));
        assert!(is_strict_amount("+400,000.00"));
        assert!(is_strict_amount("-50.00"));
        // years and page numbers must not pass
        assert!(!is_strict_amount("2021"));
        assert!(!is_strict_amount("7"));
        assert!(!is_strict_amount("REF123"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,500.00"), Some(1500.0));
        assert_eq!(parse_amount("2,000.00"), Some(2000.0));
        // no separator at all: reference number or plain integer
        assert_eq!(parse_amount("20240101"), None);
        // zero is never a transaction amount here
        assert_eq!(parse_amount("0.00"), None);
        assert_eq!(parse_amount("ABC"), None);
    }

    #[test]
    fn test_parse_number_accepts_zero() {
        assert_eq!(parse_number("0.00"), Some(0.0));
        assert_eq!(parse_number("2,000.00"), Some(2000.0));
        assert_eq!(parse_number("x"), None);
    }

    #[test]
    fn test_valid_day() {
        assert!(is_valid_day("12"));
        assert!(is_valid_day("1"));
        assert!(is_valid_day("31"));
        assert!(is_valid_day("O5")); // OCR noise: O for 0
        assert!(is_valid_day("12/DIC"));
        assert!(is_valid_day("02."));
        // extra digits truncate to the leading two
        assert!(is_valid_day("150.00"));
        assert!(!is_valid_day("420.00"));
        assert!(!is_valid_day("32"));
        assert!(!is_valid_day("0"));
        assert!(!is_valid_day("ENE"));
        assert!(!is_valid_day(""));
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("SALDO FINAL 1,234.56", &["TOTAL", "SALDO FINAL"]));
        assert!(!contains_any("PAGO TARJETA", &["TOTAL", "SALDO"]));
    }
}
