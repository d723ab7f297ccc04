//! Data-shape analysis: is a record array table-worthy or a document tree?
//!
//! A record array is "tabular" when every record has the same field set
//! and at most ~30% of fields hold nested values. Nesting deeper than two
//! levels, or a nested object with more than three keys, counts as
//! complex. Complex or non-homogeneous data recommends the JSON view,
//! fully flat data the table view, and partial nesting a mixed view whose
//! table side flattens nested fields to dotted paths.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::types::{DataShapeAnalysis, RecommendedView};

/// Share of nested fields above which a record set stops being tabular.
const COMPLEX_FIELD_RATIO: f64 = 0.3;
/// Nesting beyond this depth marks the data as complex.
const MAX_SIMPLE_DEPTH: usize = 2;
/// Nested objects with more keys than this mark the data as complex.
const MAX_SIMPLE_NESTED_KEYS: usize = 3;

/// Analyze the shape of a record array.
pub fn analyze(records: &[Value]) -> DataShapeAnalysis {
    let objects: Vec<&Map<String, Value>> =
        records.iter().filter_map(Value::as_object).collect();

    if objects.is_empty() || objects.len() != records.len() {
        // Scalar or mixed-kind arrays are documents, not tables.
        return DataShapeAnalysis {
            is_tabular: false,
            is_homogeneous: false,
            has_complex_nesting: false,
            record_count: records.len(),
            field_count: 0,
            complex_field_count: 0,
            recommended_view: RecommendedView::Json,
        };
    }

    let first_fields: BTreeSet<&String> = objects[0].keys().collect();
    let is_homogeneous = objects
        .iter()
        .all(|o| o.keys().collect::<BTreeSet<_>>() == first_fields);

    let field_count = first_fields.len();
    let complex_field_count = objects[0]
        .values()
        .filter(|v| matches!(v, Value::Object(_) | Value::Array(_)))
        .count();

    let has_complex_nesting = objects.iter().any(|o| {
        o.values().any(|v| {
            depth_of(v) > MAX_SIMPLE_DEPTH
                || matches!(v, Value::Object(m) if m.len() > MAX_SIMPLE_NESTED_KEYS)
        })
    });

    let ratio = if field_count == 0 {
        0.0
    } else {
        complex_field_count as f64 / field_count as f64
    };
    let is_tabular = is_homogeneous && ratio <= COMPLEX_FIELD_RATIO && !has_complex_nesting;

    let recommended_view = if has_complex_nesting || !is_homogeneous {
        RecommendedView::Json
    } else if complex_field_count == 0 {
        RecommendedView::Table
    } else {
        RecommendedView::Mixed
    };

    DataShapeAnalysis {
        is_tabular,
        is_homogeneous,
        has_complex_nesting,
        record_count: records.len(),
        field_count,
        complex_field_count,
        recommended_view,
    }
}

/// Nesting depth of a value: scalars are 0, an object/array of scalars is 1.
fn depth_of(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(depth_of).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(depth_of).max().unwrap_or(0),
        _ => 0,
    }
}

/// Flatten a record for the mixed-view table: nested objects become
/// dotted-path entries up to two levels, anything deeper or array-valued
/// becomes a summarized string.
pub fn flatten_record(record: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    for (key, value) in record {
        flatten_into(&mut flat, key, value, 1);
    }
    flat
}

fn flatten_into(out: &mut Map<String, Value>, path: &str, value: &Value, level: usize) {
    match value {
        Value::Object(map) if level < MAX_SIMPLE_DEPTH => {
            for (key, nested) in map {
                flatten_into(out, &format!("{path}.{key}"), nested, level + 1);
            }
        }
        Value::Object(map) => {
            out.insert(path.to_string(), Value::String(format!("{{{} fields}}", map.len())));
        }
        Value::Array(items) => {
            let summary = if items.iter().all(|i| !i.is_object() && !i.is_array()) {
                items
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                format!("[{} items]", items.len())
            };
            out.insert(path.to_string(), Value::String(summary));
        }
        scalar => {
            out.insert(path.to_string(), scalar.clone());
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
