//! Rendered price repair
//!
//! Checkout pages occasionally render a price twice into the same text node
//! ("180180 ₽") or glue a stale prefix onto the real amount ("1806984").
//! [`PriceTextReconciler::repair`] recognises those two shapes and rewrites the
//! first number in place; anything else is returned untouched.

use crate::config::PriceTextConfig;
use tracing::debug;

/// Minimum digit count before corruption patterns are considered
const MIN_SUSPECT_DIGITS: usize = 6;
/// Prefix width for the concatenation pattern
const CONCAT_PREFIX_DIGITS: usize = 3;
/// Suffix must be at least this many times the prefix
const CONCAT_MIN_RATIO: u64 = 10;

#[derive(Debug, Clone, Default)]
pub struct PriceTextReconciler {
    config: PriceTextConfig,
}

impl PriceTextReconciler {
    pub fn new(config: PriceTextConfig) -> Self {
        Self { config }
    }

    /// Returns `text` with a duplicated or concatenated leading number
    /// corrected, or unchanged when no pattern matches.
    pub fn repair(&self, text: &str) -> String {
        let Some((start, end)) = first_digit_run(text) else {
            return text.to_string();
        };
        let main_number = &text[start..end];

        match self.correct(main_number) {
            Some(corrected) => {
                debug!(original = main_number, corrected, "repaired price text");
                format!("{}{}{}", &text[..start], corrected, &text[end..])
            }
            None => text.to_string(),
        }
    }

    /// Repairs `text` and returns the first decimal number in it, or `0.0`.
    pub fn extract_numeric(&self, text: &str) -> f64 {
        first_decimal(&self.repair(text)).unwrap_or(0.0)
    }

    fn correct<'a>(&self, digits: &'a str) -> Option<&'a str> {
        if digits.len() < MIN_SUSPECT_DIGITS {
            return None;
        }

        if let Some(half) = duplicated_half(digits) {
            return Some(half);
        }

        // Runs too long for u64 are never inside the band
        let in_band = digits
            .parse::<u64>()
            .map(|n| (self.config.plausible_min..=self.config.plausible_max).contains(&n))
            .unwrap_or(false);
        if in_band {
            return None;
        }

        concatenated_suffix(digits)
    }
}

/// Byte range of the first maximal ASCII digit run
fn first_digit_run(text: &str) -> Option<(usize, usize)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let len = text[start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len() - start);
    Some((start, start + len))
}

fn duplicated_half(digits: &str) -> Option<&str> {
    if digits.len() % 2 != 0 {
        return None;
    }
    let (first, second) = digits.split_at(digits.len() / 2);
    (first.len() >= 2 && first == second).then_some(first)
}

fn concatenated_suffix(digits: &str) -> Option<&str> {
    let (prefix, suffix) = digits.split_at(CONCAT_PREFIX_DIGITS);
    let prefix_value: u64 = prefix.parse().ok()?;
    let suffix_value: u64 = suffix.parse().ok()?;
    if prefix_value == 0 || suffix_value == 0 {
        return None;
    }
    (suffix_value / prefix_value >= CONCAT_MIN_RATIO).then_some(suffix)
}

/// First number with an optional `.` or `,` fraction
fn first_decimal(text: &str) -> Option<f64> {
    let (start, end) = first_digit_run(text)?;
    let mut number = text[start..end].to_string();

    let rest = &text[end..];
    let mut chars = rest.chars();
    if let Some('.' | ',') = chars.next() {
        let fraction: String = chars.take_while(|c| c.is_ascii_digit()).collect();
        if !fraction.is_empty() {
            number.push('.');
            number.push_str(&fraction);
        }
    }

    number.parse().ok()
}

/// Repairs `text` with the default plausible-total band.
pub fn repair(text: &str) -> String {
    PriceTextReconciler::default().repair(text)
}

/// Extracts a number from `text` with the default plausible-total band.
pub fn extract_numeric(text: &str) -> f64 {
    PriceTextReconciler::default().extract_numeric(text)
}
