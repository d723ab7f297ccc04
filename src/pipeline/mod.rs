//! Query-resolution pipeline.
//!
//! [`ChatPipeline::answer`] runs one user question end to end:
//!
//! 1. Search for candidate tools (cached).
//! 2. Resolve intent via [`IntentResolver`] (schema questions never reach
//!    the model).
//! 3. Select one tool, merge model arguments over deterministic extraction,
//!    and inject a default date range where the tool implies one.
//! 4. Invoke the tool (cached by name plus canonical arguments).
//! 5. Format the result and choose a chart.
//!
//! Every stage failure degrades to a text response; `answer` itself never
//! fails.

pub mod invoke;
pub mod select;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{SearchBackend, ToolTransport};
use crate::cache::{self, QueryCache};
use crate::config::ConfigHandle;
use crate::extract::{self, ExtractedParams};
use crate::format::{self, viz, FormatContext};
use crate::intent::{IntentResolver, Resolution};
use crate::types::{ChatMessage, FormattedResponse, McpResult, ToolDescriptor, Usage};

pub use invoke::ToolInvoker;
pub use select::{select_tool, SelectError};

/// Everything the caller needs to render one answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub response: FormattedResponse,
    pub chart: viz::ChartChoice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Reply {
    fn text(message: impl Into<String>) -> Self {
        Self {
            response: FormattedResponse::text(message),
            chart: viz::ChartChoice::none(),
            ai_message: None,
            usage: None,
            tool_name: None,
        }
    }
}

pub struct ChatPipeline {
    search: Arc<dyn SearchBackend>,
    invoker: ToolInvoker,
    resolver: IntentResolver,
    cache: Arc<Mutex<QueryCache>>,
    config: ConfigHandle,
}

impl ChatPipeline {
    pub fn new(
        search: Arc<dyn SearchBackend>,
        transport: Arc<dyn ToolTransport>,
        resolver: IntentResolver,
        cache: Arc<Mutex<QueryCache>>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            search,
            invoker: ToolInvoker::new(transport),
            resolver,
            cache,
            config,
        }
    }

    /// Answer one user question. Infrastructure failures surface as text
    /// responses rather than errors.
    pub async fn answer(
        &self,
        user_text: &str,
        history: &[ChatMessage],
        session_id: &str,
    ) -> Reply {
        match self.run(user_text, history, session_id).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, query = %user_text, "pipeline stage failed");
                Reply::text(format!("Something went wrong answering that: {e}"))
            }
        }
    }

    async fn run(
        &self,
        user_text: &str,
        history: &[ChatMessage],
        session_id: &str,
    ) -> Result<Reply> {
        let config = self.config.current();

        // 1. Candidate tools for the system prompt.
        let mut tools = self.cached_search(user_text).await?;

        // 2. Intent resolution.
        let resolution = self
            .resolver
            .resolve(user_text, history, session_id, &tools)
            .await?;

        let (intent, ai_message, usage) = match resolution {
            Resolution::Schema { text } => return Ok(Reply::text(text)),
            Resolution::Intent {
                intent,
                ai_message,
                usage,
            } => (intent, ai_message, usage),
        };

        // The model may have narrowed the query; refresh the snapshot so
        // selection sees tools for what it actually asked for.
        if let Some(refined) = intent.search_query() {
            if refined != user_text && refined != "*" {
                tools = self.cached_search(refined).await?;
            }
        }

        // 3. Tool selection and parameter assembly.
        let tool = match select_tool(&tools, user_text) {
            Ok(tool) => tool,
            Err(e) => {
                info!(error = %e, "no tool selected, answering conversationally");
                return Ok(Reply {
                    response: FormattedResponse::text(if ai_message.is_empty() {
                        e.to_string()
                    } else {
                        ai_message.clone()
                    }),
                    chart: viz::ChartChoice::none(),
                    ai_message: Some(ai_message),
                    usage,
                    tool_name: None,
                });
            }
        };

        let now = Local::now().date_naive();
        let model_params = ExtractedParams::from_map(intent.arguments());
        let deterministic =
            extract::extract(user_text, config.pipeline.default_date_range_days);
        // A secondary extraction layer can slot in between these two.
        let mut params = extract::merge_layers(&[&model_params, &deterministic]);

        // A range is "defaulted" when it was injected rather than asked for,
        // whether by the sales-topic default or by the tool needing one.
        let explicit_range = model_params.has_date_range()
            || extract::dates::detect_date_range(user_text, now).is_some();
        let injected = extract::ensure_date_range(
            &mut params,
            tool_wants_dates(tool),
            config.pipeline.default_date_range_days,
            now,
        );
        let date_defaulted = injected || (params.has_date_range() && !explicit_range);

        if config.pipeline.detailed_logging {
            let param_snapshot = Value::Object(params.as_map().clone());
            info!(
                tool = %tool.function_name,
                params = %param_snapshot,
                date_defaulted,
                "invoking tool"
            );
        }

        // 4. Invocation, cached by name plus canonical arguments.
        let result = self.cached_invoke(tool, &params, &config).await;

        // 5. Presentation.
        let ctx = FormatContext {
            tool_name: &tool.function_name,
            params: &params,
            query: user_text,
            date_defaulted,
        };
        let response = format::format_response(&result, &ctx);

        let chart = match &response {
            FormattedResponse::Table {
                table_data: Some(records),
                ..
            } => viz::choose_chart(
                records,
                user_text,
                viz::ChartType::from_config(&config.visualization.default_chart_type),
                config.visualization.max_pie_slices,
            ),
            _ => viz::ChartChoice::none(),
        };

        Ok(Reply {
            response,
            chart,
            ai_message: Some(ai_message),
            usage,
            tool_name: Some(tool.function_name.clone()),
        })
    }

    async fn cached_search(&self, query: &str) -> Result<Vec<ToolDescriptor>> {
        let config = self.config.current();
        let key = cache::search_key(query, &Value::Null);

        if let Some(hit) = self.lock_cache().get(&key) {
            if let Ok(tools) = serde_json::from_value::<Vec<ToolDescriptor>>(hit) {
                debug!(query = %query, "tool search served from cache");
                return Ok(tools);
            }
        }

        let mut tools = self.search.search(query).await?;
        tools.truncate(config.pipeline.max_search_results);
        if let Ok(value) = serde_json::to_value(&tools) {
            self.lock_cache().set(
                key,
                value,
                Some(Duration::from_secs(config.cache.search_ttl_secs)),
            );
        }
        Ok(tools)
    }

    async fn cached_invoke(
        &self,
        tool: &ToolDescriptor,
        params: &ExtractedParams,
        config: &crate::config::StocktalkConfig,
    ) -> McpResult {
        let key = cache::tool_key(&tool.function_name, params.as_map());

        if let Some(hit) = self.lock_cache().get(&key) {
            if let Ok(result) = serde_json::from_value::<McpResult>(hit) {
                debug!(tool = %tool.function_name, "tool result served from cache");
                return result;
            }
        }

        let result = self.invoker.invoke(tool, params).await;

        // Only successful results are worth caching.
        if result.error.is_none() {
            if let Ok(value) = serde_json::to_value(&result) {
                let ttl = ttl_for_tool(&tool.function_name, &config.cache);
                self.lock_cache().set(key, value, Some(ttl));
            }
        }
        result
    }

    /// Cache-stats snapshot for the HTTP surface and the CLI.
    pub fn cache_stats(&self) -> cache::CacheStats {
        self.lock_cache().stats()
    }

    fn lock_cache(&self) -> MutexGuard<'_, QueryCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Whether a tool implies a date window: sales/revenue tools, or any tool
/// whose documented parameters mention one.
fn tool_wants_dates(tool: &ToolDescriptor) -> bool {
    let name = tool.function_name.to_lowercase();
    if name.contains("sales") || name.contains("revenue") {
        return true;
    }
    let spec = tool.parameters_spec.to_lowercase();
    spec.contains("startdate") || spec.contains("daterange")
}

/// Result freshness depends on what the tool reads: live stock levels go
/// stale fast, catalogs barely move.
fn ttl_for_tool(name: &str, cache: &crate::config::CacheConfig) -> Duration {
    let lower = name.to_lowercase();
    if lower.contains("inventory") || lower.contains("stock") || lower.contains("low") {
        Duration::from_secs(cache.fresh_ttl_secs)
    } else if lower.contains("product") || lower.contains("catalog") || lower.contains("supplier") {
        Duration::from_secs(cache.catalog_ttl_secs)
    } else {
        Duration::from_secs(cache.search_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn tool(name: &str, spec: &str) -> ToolDescriptor {
        ToolDescriptor {
            function_name: name.to_string(),
            description: String::new(),
            endpoint: "/api/test".to_string(),
            http_method: crate::types::HttpMethod::Get,
            parameters_spec: spec.to_string(),
            category: None,
            is_active: true,
        }
    }

    #[test]
    fn sales_tools_want_dates() {
        assert!(tool_wants_dates(&tool("GetSalesData", "")));
        assert!(tool_wants_dates(&tool("GetRevenueReport", "")));
        assert!(!tool_wants_dates(&tool("GetProducts", "category: string")));
    }

    #[test]
    fn documented_date_parameters_want_dates() {
        assert!(tool_wants_dates(&tool(
            "GetDeliveries",
            "startDate: string, endDate: string"
        )));
    }

    #[test]
    fn ttl_tiers_by_tool_category() {
        let cache = CacheConfig::default();
        assert_eq!(
            ttl_for_tool("GetLowStockItems", &cache),
            Duration::from_secs(cache.fresh_ttl_secs)
        );
        assert_eq!(
            ttl_for_tool("GetProducts", &cache),
            Duration::from_secs(cache.catalog_ttl_secs)
        );
        assert_eq!(
            ttl_for_tool("GetSalesData", &cache),
            Duration::from_secs(cache.search_ttl_secs)
        );
    }
}
