//! Deterministic parameter extraction from free-text queries.
//!
//! Derives structured arguments — date range, category, supplier, numeric
//! threshold — using layered pattern rules ([`rules`]), multilingual
//! calendar arithmetic ([`dates`]), and a merge discipline where later
//! sources only fill keys earlier sources left absent. This extractor is
//! advisory: its output sits beneath model-proposed parameters and never
//! overrides an already-present key.

pub mod dates;
pub mod rules;

use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};

use dates::DateRange;

/// Recognized parameter keys, as the backend expects them on the wire.
pub const KEY_START_DATE: &str = "startDate";
pub const KEY_END_DATE: &str = "endDate";
pub const KEY_CATEGORY: &str = "category";
pub const KEY_SUPPLIER: &str = "supplier";
pub const KEY_THRESHOLD: &str = "threshold";

/// Transport-only keys that must never reach the tool invoker.
const TRANSPORT_KEYS: &[&str] = &["query", "originalUserInput"];

/// Structured arguments for a tool call: the recognized keys plus
/// passthrough entries from the model. Never contains transport keys or
/// null/empty values once [`clean`](ExtractedParams::clean) has run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedParams(Map<String, Value>);

impl ExtractedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.insert(KEY_START_DATE, Value::String(format_date(range.start)));
        self.insert(KEY_END_DATE, Value::String(format_date(range.end)));
    }

    pub fn has_date_range(&self) -> bool {
        self.contains(KEY_START_DATE) || self.contains(KEY_END_DATE)
    }

    /// Fill every key of `other` that is absent here. Existing keys win.
    pub fn fill_from(&mut self, other: &ExtractedParams) {
        for (key, value) in other.as_map() {
            if !self.0.contains_key(key) {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Strip transport-only keys and null/empty values.
    pub fn clean(&mut self) {
        self.0.retain(|key, value| {
            if TRANSPORT_KEYS.contains(&key.as_str()) {
                return false;
            }
            match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            }
        });
    }
}

/// Extract structured parameters from free text, using today as "now".
pub fn extract(text: &str, default_range_days: i64) -> ExtractedParams {
    extract_with_now(text, Local::now().date_naive(), default_range_days)
}

/// Extraction with an injectable "now" for deterministic date arithmetic.
///
/// Rules apply independently — threshold, supplier, category, and date
/// range each fire on their own — except that a category hit inside the
/// supplier span is suppressed, and the default sales window only applies
/// when no explicit range phrase matched.
pub fn extract_with_now(text: &str, now: NaiveDate, default_range_days: i64) -> ExtractedParams {
    let mut params = ExtractedParams::new();

    if let Some(threshold) = rules::detect_threshold(text) {
        params.insert(KEY_THRESHOLD, Value::from(threshold));
    }

    let supplier = rules::detect_supplier(text);
    if let Some((name, _)) = &supplier {
        params.insert(KEY_SUPPLIER, Value::String(name.clone()));
    }

    if let Some(category) = rules::detect_category(text, supplier.as_ref().map(|(_, span)| span)) {
        params.insert(KEY_CATEGORY, Value::String(category));
    }

    if let Some(range) = dates::detect_date_range(text, now) {
        params.set_date_range(range);
    } else if dates::mentions_sales_topic(text) {
        params.set_date_range(DateRange::trailing(default_range_days.max(0) as u64, now));
    }

    params
}

/// Merge parameter layers in increasing priority order of absence-filling:
/// the first layer is authoritative, later layers only contribute keys the
/// earlier ones lack. The merged result is cleaned before being returned.
pub fn merge_layers(layers: &[&ExtractedParams]) -> ExtractedParams {
    let mut merged = ExtractedParams::new();
    for layer in layers {
        merged.fill_from(layer);
    }
    merged.clean();
    merged
}

/// Inject a default trailing date range when the tool's category implies
/// one and no range is present yet. Returns whether a range was injected,
/// so the formatter can note the silent default in its summary.
pub fn ensure_date_range(
    params: &mut ExtractedParams,
    tool_needs_range: bool,
    default_range_days: i64,
    now: NaiveDate,
) -> bool {
    if tool_needs_range && !params.has_date_range() {
        params.set_date_range(DateRange::trailing(default_range_days.max(0) as u64, now));
        return true;
    }
    false
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn threshold_only_query_has_no_dates() {
        let params = extract_with_now("products under 30 units", fixed_now(), 30);
        assert_eq!(params.get(KEY_THRESHOLD), Some(&json!(30)));
        assert!(!params.contains(KEY_START_DATE));
        assert!(!params.contains(KEY_END_DATE));
    }

    #[test]
    fn sales_query_gets_default_window() {
        let params = extract_with_now("how are sales doing", fixed_now(), 30);
        assert_eq!(params.get_str(KEY_START_DATE), Some("2024-02-14"));
        assert_eq!(params.get_str(KEY_END_DATE), Some("2024-03-15"));
    }

    #[test]
    fn explicit_range_beats_default_window() {
        let params = extract_with_now("sales last week", fixed_now(), 30);
        assert_eq!(params.get_str(KEY_START_DATE), Some("2024-03-08"));
        assert_eq!(params.get_str(KEY_END_DATE), Some("2024-03-15"));
    }

    #[test]
    fn full_query_extracts_all_three() {
        let params = extract_with_now(
            "Show me all dairy products from Fresh Dairy Co. under 30 units in stock",
            fixed_now(),
            30,
        );
        assert_eq!(params.get_str(KEY_CATEGORY), Some("Dairy"));
        assert_eq!(params.get_str(KEY_SUPPLIER), Some("Fresh Dairy Co."));
        assert_eq!(params.get(KEY_THRESHOLD), Some(&json!(30)));
    }

    #[test]
    fn merge_earlier_layers_win() {
        let mut model = ExtractedParams::new();
        model.insert(KEY_CATEGORY, json!("Meat"));

        let mut fallback = ExtractedParams::new();
        fallback.insert(KEY_CATEGORY, json!("Dairy"));
        fallback.insert(KEY_THRESHOLD, json!(10));

        let merged = merge_layers(&[&model, &fallback]);
        assert_eq!(merged.get_str(KEY_CATEGORY), Some("Meat"));
        assert_eq!(merged.get(KEY_THRESHOLD), Some(&json!(10)));
    }

    #[test]
    fn clean_strips_transport_and_empty_values() {
        let mut params = ExtractedParams::new();
        params.insert("query", json!("dairy sales"));
        params.insert("originalUserInput", json!("show me dairy sales"));
        params.insert(KEY_CATEGORY, json!("Dairy"));
        params.insert(KEY_SUPPLIER, json!(""));
        params.insert("note", Value::Null);

        params.clean();
        assert_eq!(params.as_map().len(), 1);
        assert_eq!(params.get_str(KEY_CATEGORY), Some("Dairy"));
    }

    #[test]
    fn ensure_date_range_reports_injection() {
        let mut params = ExtractedParams::new();
        assert!(ensure_date_range(&mut params, true, 30, fixed_now()));
        assert!(params.has_date_range());
        // Second call must not overwrite.
        assert!(!ensure_date_range(&mut params, true, 7, fixed_now()));
        assert_eq!(params.get_str(KEY_START_DATE), Some("2024-02-14"));
    }
}
