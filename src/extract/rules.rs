//! Pattern rule tables for threshold, supplier, and category detection.
//!
//! Each detector is an ordered list of patterns where the first match wins.
//! The tables are data, not control flow, so each rule can be unit-tested
//! and the priority order is explicit.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

// ── Threshold ─────────────────────────────────────────────────────────────────

/// Ordered threshold patterns; capture group 1 is the number.
static THRESHOLD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:under|below|less than|fewer than)\s+(\d+)\b",
        r"(?i)\b(\d+)\s+or\s+(?:less|fewer)\b",
        r"(?i)\b(\d+)\s+(?:units|items)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("threshold pattern must compile"))
    .collect()
});

/// Detect a numeric quantity threshold ("under 30", "30 units or fewer").
/// Must be a positive integer; the first matching pattern wins.
pub fn detect_threshold(text: &str) -> Option<u64> {
    for pattern in THRESHOLD_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(n) = caps[1].parse::<u64>() {
                if n > 0 {
                    return Some(n);
                }
            }
        }
    }
    None
}

// ── Supplier ──────────────────────────────────────────────────────────────────

/// A capitalized phrase ending in a legal-entity suffix.
static SUPPLIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b([A-Z][A-Za-z&'-]*(?:\s+[A-Z][A-Za-z&'-]*)*\s+(?:Co\.|Corp\.|Inc\.|Ltd\.?|LLC|Company))",
    )
    .expect("supplier pattern must compile")
});

/// Detect a supplier name ("Fresh Dairy Co.", "Acme Corp."). Returns the
/// matched name and its byte span, so category detection can exclude hits
/// that are really part of the supplier name.
pub fn detect_supplier(text: &str) -> Option<(String, Range<usize>)> {
    SUPPLIER_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| (m.as_str().to_string(), m.range()))
}

// ── Category ──────────────────────────────────────────────────────────────────

/// Fixed product-category vocabulary. Matches are exact substrings,
/// case-insensitive.
pub const CATEGORY_VOCAB: &[&str] = &[
    "dairy",
    "meat",
    "fruits",
    "vegetables",
    "beverages",
    "bakery",
];

/// Detect a product category mention, skipping occurrences that lie inside
/// the supplier span ("Dairy Co" must not set category = Dairy).
pub fn detect_category(text: &str, supplier_span: Option<&Range<usize>>) -> Option<String> {
    let lowered = text.to_lowercase();
    for vocab in CATEGORY_VOCAB {
        for (pos, _) in lowered.match_indices(vocab) {
            let span = pos..pos + vocab.len();
            let inside_supplier = supplier_span
                .is_some_and(|s| span.start >= s.start && span.end <= s.end);
            if !inside_supplier {
                return Some(capitalize(vocab));
            }
        }
    }
    None
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_keyword_forms() {
        assert_eq!(detect_threshold("products under 30 units"), Some(30));
        assert_eq!(detect_threshold("fewer than 12 left"), Some(12));
        assert_eq!(detect_threshold("stock of 5 or less"), Some(5));
        assert_eq!(detect_threshold("15 items in the warehouse"), Some(15));
        assert_eq!(detect_threshold("plenty of stock"), None);
    }

    #[test]
    fn threshold_rejects_zero() {
        assert_eq!(detect_threshold("under 0 units"), None);
    }

    #[test]
    fn supplier_legal_suffixes() {
        let (name, _) = detect_supplier("invoices from Fresh Dairy Co. today").unwrap();
        assert_eq!(name, "Fresh Dairy Co.");

        let (name, _) = detect_supplier("Northwind Traders Ltd shipment").unwrap();
        assert_eq!(name, "Northwind Traders Ltd");

        assert!(detect_supplier("no supplier mentioned here").is_none());
    }

    #[test]
    fn category_from_vocabulary() {
        assert_eq!(detect_category("show me dairy products", None), Some("Dairy".into()));
        assert_eq!(detect_category("compare beverages sales", None), Some("Beverages".into()));
        assert_eq!(detect_category("show me everything", None), None);
    }

    #[test]
    fn category_excluded_inside_supplier_name() {
        let text = "products from Fresh Dairy Co.";
        let (_, span) = detect_supplier(text).unwrap();
        assert_eq!(detect_category(text, Some(&span)), None);

        // A second, independent mention still counts.
        let text = "dairy products from Fresh Dairy Co.";
        let (_, span) = detect_supplier(text).unwrap();
        assert_eq!(detect_category(text, Some(&span)), Some("Dairy".into()));
    }
}
