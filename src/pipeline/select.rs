//! Tool selection: pick exactly one descriptor from the search candidates.
//!
//! Ordered precedence, first satisfied branch wins:
//!
//! 1. Query names a product category → a candidate advertising category
//!    filtering.
//! 2. General inventory/stock query (and not a low-stock one) → the
//!    canonical list-products tool with category support, else any
//!    inventory/product-named candidate that is not a low-stock tool, else
//!    the first candidate with both name and endpoint.
//! 3. First candidate with both name and endpoint (best-ranked result).
//! 4. Fail, naming whichever precondition broke.

use thiserror::Error;

use crate::extract::rules;
use crate::text::{has_any_phrase, has_phrase};
use crate::types::ToolDescriptor;

/// Canonical name of the list-products tool the backend exposes.
pub const LIST_PRODUCTS_TOOL: &str = "GetProducts";

const GENERAL_INVENTORY_PHRASES: &[&str] =
    &["all", "current stock", "inventory", "detailed", "stock levels"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no matching tool was found for this query")]
    NoCandidates,
    #[error("tool '{name}' matched but has no endpoint configured")]
    MissingEndpoint { name: String },
}

/// Low-stock queries get the dedicated low-stock tool ranking, never the
/// general inventory override.
pub fn is_low_stock_query(query: &str) -> bool {
    has_phrase(query, "low stock") || has_phrase(query, "under") || has_phrase(query, "below")
}

fn is_general_inventory_query(query: &str) -> bool {
    !is_low_stock_query(query) && has_any_phrase(query, GENERAL_INVENTORY_PHRASES)
}

/// Select exactly one tool for `query` from `candidates`.
pub fn select_tool<'a>(
    candidates: &'a [ToolDescriptor],
    query: &str,
) -> Result<&'a ToolDescriptor, SelectError> {
    let active: Vec<&ToolDescriptor> = candidates.iter().filter(|t| t.is_active).collect();

    // 1. Category-specific queries prefer a category-capable tool.
    let supplier_span = rules::detect_supplier(query).map(|(_, span)| span);
    if rules::detect_category(query, supplier_span.as_ref()).is_some() {
        if let Some(tool) = active
            .iter()
            .copied()
            .find(|t| t.is_invocable() && mentions_category_support(t))
        {
            return Ok(tool);
        }
    }

    // 2. General inventory queries prefer the canonical listing tool.
    if is_general_inventory_query(query) {
        if let Some(tool) = active.iter().copied().find(|t| {
            t.function_name == LIST_PRODUCTS_TOOL
                && t.is_invocable()
                && t.parameters_spec.to_lowercase().contains("category")
        }) {
            return Ok(tool);
        }
        if let Some(tool) = active.iter().copied().find(|t| {
            let name = t.function_name.to_lowercase();
            t.is_invocable()
                && (name.contains("inventory") || name.contains("product"))
                && !name.contains("low")
        }) {
            return Ok(tool);
        }
        if let Some(tool) = active.iter().copied().find(|t| t.is_invocable()) {
            return Ok(tool);
        }
    }

    // 3. Best-ranked usable candidate.
    if let Some(tool) = active.iter().copied().find(|t| t.is_invocable()) {
        return Ok(tool);
    }

    // 4. Nothing usable — name the closest partial candidate.
    match active
        .iter()
        .find(|t| !t.function_name.is_empty() && t.endpoint.is_empty())
    {
        Some(partial) => Err(SelectError::MissingEndpoint {
            name: partial.function_name.clone(),
        }),
        None => Err(SelectError::NoCandidates),
    }
}

fn mentions_category_support(tool: &ToolDescriptor) -> bool {
    tool.function_name.to_lowercase().contains("category")
        || tool.description.to_lowercase().contains("category")
        || tool.parameters_spec.to_lowercase().contains("category")
}
