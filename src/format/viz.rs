//! Chart selection from data shape and query phrasing.
//!
//! Ordered rule list, first hit wins:
//!
//! 1. Table-only phrasing suppresses the chart entirely.
//! 2. An explicit chart-type word selects that type (pie > line > bar).
//! 3. A generic visualization request auto-selects from the data shape.
//! 4. Without any visualization request, a chart appears only for
//!    analytic-context queries.
//!
//! "chart only"/"no table" phrasing additionally suppresses the table. The
//! common "chat" typo for "chart" is tolerated as a generic request word.

use serde::Serialize;
use serde_json::Value;

use crate::extract::rules;
use crate::text::{has_any_phrase, has_phrase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    None,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::None => "none",
        }
    }

    pub fn from_config(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "line" => Self::Line,
            "pie" => Self::Pie,
            _ => Self::Bar,
        }
    }
}

/// The visualization decision for one response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartChoice {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub show_chart: bool,
    pub show_table: bool,
    pub title: String,
}

impl ChartChoice {
    pub fn none() -> Self {
        Self {
            chart_type: ChartType::None,
            show_chart: false,
            show_table: true,
            title: String::new(),
        }
    }
}

const TABLE_ONLY: &[&str] = &[
    "table only",
    "no chart",
    "no graph",
    "just the table",
    "just a table",
    "just table",
    "only table",
    "only the table",
    "without a chart",
    "without chart",
];

const CHART_ONLY: &[&str] = &[
    "chart only",
    "graph only",
    "just the chart",
    "just a chart",
    "just chart",
    "no table",
    "without the table",
];

const PIE_WORDS: &[&str] = &["pie"];
const LINE_WORDS: &[&str] = &["line", "trend", "trends", "over time"];
const BAR_WORDS: &[&str] = &["bar", "compare", "comparison"];

/// Generic request words, including the common "chat" typo for "chart".
const VIZ_WORDS: &[&str] = &["chart", "charts", "graph", "graphs", "visualize", "visualise", "plot", "chat"];

/// Analytic phrasing that earns a chart even without an explicit request.
const ANALYTIC_WORDS: &[&str] = &[
    "distribution",
    "breakdown",
    "analysis",
    "performance",
    "comparison",
    "trends",
    "pattern",
];

const TIME_FIELD_HINTS: &[&str] = &["date", "time", "month", "day", "week", "created", "timestamp"];
const NAME_FIELD_HINTS: &[&str] = &["name", "category", "label", "product", "supplier", "type"];

/// Decide the chart for `records` given the query phrasing.
pub fn choose_chart(
    records: &[Value],
    query: &str,
    default_type: ChartType,
    max_pie_slices: usize,
) -> ChartChoice {
    if has_any_phrase(query, TABLE_ONLY) {
        return ChartChoice::none();
    }

    let show_table = !has_any_phrase(query, CHART_ONLY);

    // Explicit type words, highest specificity first.
    let explicit = if has_any_phrase(query, PIE_WORDS) {
        Some(ChartType::Pie)
    } else if has_any_phrase(query, LINE_WORDS) {
        Some(ChartType::Line)
    } else if has_any_phrase(query, BAR_WORDS) {
        Some(ChartType::Bar)
    } else {
        None
    };

    if let Some(chart_type) = explicit {
        return ChartChoice {
            chart_type,
            show_chart: true,
            show_table,
            title: chart_title(query, chart_type),
        };
    }

    let generic_request = has_any_phrase(query, VIZ_WORDS)
        || (has_phrase(query, "distribution")
            && (has_any_phrase(query, VIZ_WORDS)
                || has_phrase(query, "just")
                || has_phrase(query, "only")));
    let analytic_context = has_any_phrase(query, ANALYTIC_WORDS);

    if !generic_request && !analytic_context {
        return ChartChoice::none();
    }

    let chart_type = auto_select(records, default_type, max_pie_slices);
    ChartChoice {
        chart_type,
        show_chart: chart_type != ChartType::None,
        show_table,
        title: chart_title(query, chart_type),
    }
}

/// Auto-selection from data shape: time-like field ⇒ line; categorical name
/// plus numeric value ⇒ pie for small sets, bar otherwise; else the
/// configured default.
fn auto_select(records: &[Value], default_type: ChartType, max_pie_slices: usize) -> ChartType {
    let Some(first) = records.first().and_then(Value::as_object) else {
        return default_type;
    };

    let has_time_field = first
        .keys()
        .any(|k| field_matches(k, TIME_FIELD_HINTS));
    if has_time_field {
        return ChartType::Line;
    }

    let has_name_field = first.keys().any(|k| field_matches(k, NAME_FIELD_HINTS));
    let has_numeric_field = first.values().any(Value::is_number);
    if has_name_field && has_numeric_field {
        return if records.len() <= max_pie_slices {
            ChartType::Pie
        } else {
            ChartType::Bar
        };
    }

    default_type
}

fn field_matches(field: &str, hints: &[&str]) -> bool {
    let lowered = field.to_lowercase();
    hints.iter().any(|h| lowered.contains(h))
}

/// Title = domain phrase crossed with chart type, plus a detected category
/// or supplier suffix.
fn chart_title(query: &str, chart_type: ChartType) -> String {
    let base = if has_any_phrase(query, &["sales", "revenue", "sold", "turnover"]) {
        "Sales"
    } else if has_any_phrase(query, &["stock", "inventory"]) {
        "Inventory"
    } else if has_phrase(query, "products") || has_phrase(query, "product") {
        "Products"
    } else {
        "Data"
    };

    let mut title = match chart_type {
        ChartType::Pie => format!("{base} Distribution"),
        ChartType::Line => format!("{base} Trend"),
        ChartType::Bar => format!("{base} Comparison"),
        ChartType::None => base.to_string(),
    };

    let supplier = rules::detect_supplier(query);
    if let Some(category) = rules::detect_category(query, supplier.as_ref().map(|(_, s)| s)) {
        title.push_str(&format!(" — {category}"));
    } else if let Some((name, _)) = supplier {
        title.push_str(&format!(" — {name}"));
    }

    title
}
