//! Response classification and formatting.
//!
//! Turns a normalized [`McpResult`] plus the original query into exactly
//! one [`FormattedResponse`]. The decision sequence:
//!
//! 1. An error result → text.
//! 2. Array data → empty-set text, or an aggregate summary table for
//!    summary-minded sales queries, or a full table with a descriptive
//!    header.
//! 3. A single object → document (inspectable JSON tree).
//! 4. Anything else → document.
//!
//! Query-phrase overrides beat shape analysis when both views are
//! plausible; a requested supplier that the backend ignored produces a
//! warning note, never silent row-dropping.

pub mod shape;
pub mod viz;

use serde_json::Value;

use crate::extract::{ExtractedParams, KEY_CATEGORY, KEY_END_DATE, KEY_START_DATE, KEY_SUPPLIER, KEY_THRESHOLD};
use crate::text::has_any_phrase;
use crate::types::{FormattedResponse, McpResult, RecommendedView};

/// Aggregate keywords that ask for a summary rather than itemized rows.
const SUMMARY_WORDS: &[&str] = &[
    "total",
    "overall",
    "sum",
    "revenue",
    "how much",
    "combined",
    "altogether",
];

/// Detail keywords that override the summary intent.
const DETAIL_WORDS: &[&str] = &[
    "breakdown",
    "each",
    "individual",
    "transaction",
    "transactions",
    "itemized",
    "all sales",
    "every",
];

/// Query words that force the document view.
const DOCUMENT_WORDS: &[&str] = &["json", "document", "raw", "structure"];

/// Query words that force the table view.
const TABLE_WORDS: &[&str] = &["table", "list", "summary", "report"];

/// Field names treated as monetary totals in sales-shaped records.
const MONEY_FIELDS: &[&str] = &[
    "total",
    "total_amount",
    "totalamount",
    "total_price",
    "totalprice",
    "revenue",
    "amount",
];

/// Field names treated as dates when computing a summary's time span.
const DATE_FIELDS: &[&str] = &["date", "sale_date", "saledate", "created_at", "createdat", "timestamp"];

/// Inputs the formatter needs besides the result itself.
pub struct FormatContext<'a> {
    pub tool_name: &'a str,
    pub params: &'a ExtractedParams,
    pub query: &'a str,
    /// Whether the date range was injected silently rather than requested.
    pub date_defaulted: bool,
}

/// Classify and format one tool result.
pub fn format_response(result: &McpResult, ctx: &FormatContext<'_>) -> FormattedResponse {
    // 1. Errors are terminal text.
    if let Some(error) = &result.error {
        return FormattedResponse::text(error.clone());
    }

    match &result.data {
        Some(Value::Array(records)) => format_records(records, result, ctx),
        Some(Value::Object(_)) => FormattedResponse::Document {
            summary: format!("Structured result from {}", ctx.tool_name),
            json_data: result.data.clone().unwrap_or(Value::Null),
            tool_name: ctx.tool_name.to_string(),
        },
        Some(other) => FormattedResponse::Document {
            summary: format!("Result from {}", ctx.tool_name),
            json_data: other.clone(),
            tool_name: ctx.tool_name.to_string(),
        },
        None => FormattedResponse::text(format!(
            "{} returned no usable payload.",
            ctx.tool_name
        )),
    }
}

fn format_records(
    records: &[Value],
    result: &McpResult,
    ctx: &FormatContext<'_>,
) -> FormattedResponse {
    if records.is_empty() {
        let filters = describe_filters(ctx.params);
        return FormattedResponse::text(if filters.is_empty() {
            "No data found for this query.".to_string()
        } else {
            format!("No data found for this query ({filters}).")
        });
    }

    // Summary-vs-detail branch for sales-shaped data.
    if wants_summary(ctx.query) && is_sales_shaped(records, ctx.tool_name) && !is_category_breakdown(records)
    {
        return FormattedResponse::Table {
            summary: aggregate_summary(records, ctx),
            table_data: None,
            tool_name: ctx.tool_name.to_string(),
        };
    }

    // View preference: query phrasing wins, then shape analysis. Envelope
    // results (an explicit success marker) always present as a table.
    let analysis = shape::analyze(records);
    let preferred = query_view_preference(ctx.query);
    let enveloped = result.success.is_some();

    let view = match preferred {
        Some(view) => view,
        None if enveloped => RecommendedView::Table,
        None => analysis.recommended_view,
    };

    match view {
        RecommendedView::Json => FormattedResponse::Document {
            summary: format!(
                "{} record(s) from {} (nested structure)",
                records.len(),
                ctx.tool_name
            ),
            json_data: Value::Array(records.to_vec()),
            tool_name: ctx.tool_name.to_string(),
        },
        RecommendedView::Table => FormattedResponse::Table {
            summary: detail_summary(records, ctx),
            table_data: Some(records.to_vec()),
            tool_name: ctx.tool_name.to_string(),
        },
        RecommendedView::Mixed => {
            let flattened: Vec<Value> = records
                .iter()
                .map(|r| match r.as_object() {
                    Some(obj) => Value::Object(shape::flatten_record(obj)),
                    None => r.clone(),
                })
                .collect();
            let mut summary = detail_summary(records, ctx);
            summary.push_str(" Nested fields were flattened for the table view.");
            FormattedResponse::Table {
                summary,
                table_data: Some(flattened),
                tool_name: ctx.tool_name.to_string(),
            }
        }
    }
}

/// Presence of aggregate keywords, unless detail keywords override them.
pub fn wants_summary(query: &str) -> bool {
    has_any_phrase(query, SUMMARY_WORDS) && !has_any_phrase(query, DETAIL_WORDS)
}

/// Explicit view preference from query phrasing. Both kinds present ⇒
/// no preference (shape analysis decides).
fn query_view_preference(query: &str) -> Option<RecommendedView> {
    let wants_document = has_any_phrase(query, DOCUMENT_WORDS);
    let wants_table = has_any_phrase(query, TABLE_WORDS);
    match (wants_document, wants_table) {
        (true, false) => Some(RecommendedView::Json),
        (false, true) => Some(RecommendedView::Table),
        _ => None,
    }
}

/// Sales-shaped: a monetary total field in the records, or a sales-ish
/// tool name.
fn is_sales_shaped(records: &[Value], tool_name: &str) -> bool {
    if tool_name.to_lowercase().contains("sales") {
        return true;
    }
    records
        .first()
        .and_then(Value::as_object)
        .is_some_and(|o| o.keys().any(|k| MONEY_FIELDS.contains(&k.to_lowercase().as_str())))
}

/// A category breakdown (one row per category, no per-event dates) must
/// not collapse into a single aggregate figure.
fn is_category_breakdown(records: &[Value]) -> bool {
    let objects: Vec<_> = records.iter().filter_map(Value::as_object).collect();
    if objects.is_empty() {
        return false;
    }
    let all_have_category = objects.iter().all(|o| o.contains_key("category"));
    let any_has_date = objects
        .iter()
        .any(|o| o.keys().any(|k| DATE_FIELDS.contains(&k.to_lowercase().as_str())));
    all_have_category && !any_has_date
}

/// Aggregate summary: monetary sum, record count, date span, active filters.
fn aggregate_summary(records: &[Value], ctx: &FormatContext<'_>) -> String {
    let money_field = records
        .first()
        .and_then(Value::as_object)
        .and_then(|o| {
            o.keys()
                .find(|k| MONEY_FIELDS.contains(&k.to_lowercase().as_str()))
                .cloned()
        });

    let total: f64 = money_field
        .as_ref()
        .map(|field| {
            records
                .iter()
                .filter_map(|r| r.get(field))
                .filter_map(money_value)
                .sum()
        })
        .unwrap_or(0.0);

    let mut summary = format!(
        "Total: ${total:.2} across {} record(s).",
        records.len()
    );

    if let Some((min, max)) = date_span(records) {
        summary.push_str(&format!(" Date range: {min} to {max}."));
    }

    let filters = describe_filters(ctx.params);
    if !filters.is_empty() {
        summary.push_str(&format!(" Filters: {filters}."));
    }
    if ctx.date_defaulted {
        summary.push_str(" (Date range defaulted to the configured trailing window.)");
    }

    summary
}

/// Header for the full-table variant: record count, filters, silent-default
/// note, and the supplier-mismatch warning.
fn detail_summary(records: &[Value], ctx: &FormatContext<'_>) -> String {
    let mut summary = format!("{} record(s) from {}.", records.len(), ctx.tool_name);

    let filters = describe_filters(ctx.params);
    if !filters.is_empty() {
        summary.push_str(&format!(" Filters: {filters}."));
    }
    if ctx.date_defaulted {
        summary.push_str(" (Date range defaulted to the configured trailing window.)");
    }
    if let Some(warning) = supplier_mismatch_warning(records, ctx.params) {
        summary.push(' ');
        summary.push_str(&warning);
    }

    summary
}

/// Diagnostic only: when a supplier filter was requested but the backend
/// returned rows for other suppliers too, warn instead of dropping rows.
fn supplier_mismatch_warning(records: &[Value], params: &ExtractedParams) -> Option<String> {
    let supplier = params.get_str(KEY_SUPPLIER)?;
    let wanted = supplier.to_lowercase();

    let matching = records
        .iter()
        .filter_map(Value::as_object)
        .filter(|o| {
            o.values().any(|v| {
                v.as_str()
                    .is_some_and(|s| s.to_lowercase().contains(&wanted))
            })
        })
        .count();

    if matching < records.len() {
        Some(format!(
            "Warning: only {matching} of {} row(s) match supplier '{supplier}' — the backend may not have applied the filter.",
            records.len()
        ))
    } else {
        None
    }
}

/// Human-readable list of the active recognized filters.
pub fn describe_filters(params: &ExtractedParams) -> String {
    let mut parts = Vec::new();
    if let Some(category) = params.get_str(KEY_CATEGORY) {
        parts.push(format!("category {category}"));
    }
    if let Some(supplier) = params.get_str(KEY_SUPPLIER) {
        parts.push(format!("supplier {supplier}"));
    }
    if let Some(threshold) = params.get(KEY_THRESHOLD).and_then(Value::as_u64) {
        parts.push(format!("threshold {threshold}"));
    }
    match (params.get_str(KEY_START_DATE), params.get_str(KEY_END_DATE)) {
        (Some(start), Some(end)) => parts.push(format!("{start} to {end}")),
        (Some(start), None) => parts.push(format!("from {start}")),
        (None, Some(end)) => parts.push(format!("until {end}")),
        (None, None) => {}
    }
    parts.join(", ")
}

fn money_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim_start_matches('$').replace(',', "").parse().ok(),
        _ => None,
    }
}

fn date_span(records: &[Value]) -> Option<(String, String)> {
    let mut dates: Vec<&str> = Vec::new();
    for record in records {
        if let Some(obj) = record.as_object() {
            for (key, value) in obj {
                if DATE_FIELDS.contains(&key.to_lowercase().as_str()) {
                    if let Some(s) = value.as_str() {
                        dates.push(s);
                    }
                }
            }
        }
    }
    // ISO dates sort lexically.
    let min = dates.iter().min()?;
    let max = dates.iter().max()?;
    Some((min.to_string(), max.to_string()))
}
