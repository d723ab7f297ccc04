//! Tool invocation and result-envelope normalization.
//!
//! Strips transport-only keys, dispatches through the [`ToolTransport`],
//! converts non-2xx statuses into error results (never a propagated
//! failure), and unwraps nested `data` envelopes so the formatter always
//! sees the effective payload.

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::backend::ToolTransport;
use crate::extract::ExtractedParams;
use crate::types::{McpResult, ToolDescriptor};

pub struct ToolInvoker {
    transport: Arc<dyn ToolTransport>,
}

impl ToolInvoker {
    pub fn new(transport: Arc<dyn ToolTransport>) -> Self {
        Self { transport }
    }

    /// Invoke `tool` with `params` and normalize the outcome.
    ///
    /// Every failure mode resolves to an [`McpResult`] carrying an error
    /// message and the tool's description as context — nothing is thrown
    /// past this boundary.
    pub async fn invoke(&self, tool: &ToolDescriptor, params: &ExtractedParams) -> McpResult {
        let mut cleaned = params.clone();
        cleaned.clean();

        let reply = match self.transport.invoke(tool, cleaned.as_map()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(tool = %tool.function_name, error = %e, "tool transport failure");
                return McpResult::from_error(format!(
                    "{} could not be reached ({}): {e}",
                    tool.function_name, tool.description
                ));
            }
        };

        if !reply.is_success() {
            warn!(tool = %tool.function_name, status = reply.status, "tool returned error status");
            return McpResult::from_error(format!(
                "{} returned HTTP {} — {}",
                tool.function_name, reply.status, tool.description
            ));
        }

        normalize_result(reply.body)
    }
}

/// Map a raw 2xx payload onto the normalized envelope.
///
/// - object with a `data` key → envelope fields are lifted, and a nested
///   `data.data` value becomes the effective payload
/// - bare array → treated as the data itself
/// - anything else → kept as the payload for document rendering
pub fn normalize_result(body: Value) -> McpResult {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            let mut data = map.remove("data");
            // One level of nested envelope is unwrapped.
            if let Some(Value::Object(inner)) = &mut data {
                if let Some(nested) = inner.remove("data") {
                    data = Some(nested);
                }
            }
            McpResult {
                success: map.get("success").and_then(Value::as_bool),
                error: map
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                count: map.get("count").and_then(Value::as_u64),
                timestamp: map
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                data,
            }
        }
        // `success` stays unset for bare arrays: only an explicit envelope
        // claims it, and the formatter uses its presence to skip shape
        // analysis.
        Value::Array(items) => McpResult {
            count: Some(items.len() as u64),
            data: Some(Value::Array(items)),
            ..Default::default()
        },
        other => McpResult {
            data: Some(other),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_fields_are_lifted() {
        let result = normalize_result(json!({
            "success": true,
            "count": 2,
            "timestamp": "2024-03-15T10:00:00Z",
            "data": [{"id": 1}, {"id": 2}]
        }));
        assert_eq!(result.success, Some(true));
        assert_eq!(result.count, Some(2));
        assert_eq!(result.data, Some(json!([{"id": 1}, {"id": 2}])));
    }

    #[test]
    fn nested_data_envelope_is_unwrapped() {
        let result = normalize_result(json!({
            "data": {"data": [{"id": 1}], "meta": "x"}
        }));
        assert_eq!(result.data, Some(json!([{"id": 1}])));
    }

    #[test]
    fn bare_array_becomes_data_without_envelope_marker() {
        let result = normalize_result(json!([{"name": "Milk"}]));
        assert_eq!(result.success, None, "only an explicit envelope sets success");
        assert_eq!(result.count, Some(1));
        assert!(result.data.is_some());
    }

    #[test]
    fn scalar_payload_is_preserved() {
        let result = normalize_result(json!({"status": "ok"}));
        assert_eq!(result.data, Some(json!({"status": "ok"})));
        assert_eq!(result.success, None);
    }
}
