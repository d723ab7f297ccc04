#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use stocktalk::backend::{ModelBackend, SearchBackend, ToolReply, ToolTransport};
use stocktalk::cache::QueryCache;
use stocktalk::config::{ConfigHandle, StocktalkConfig};
use stocktalk::intent::IntentResolver;
use stocktalk::pipeline::ChatPipeline;
use stocktalk::types::{
    ChatMessage, FunctionCall, HttpMethod, IndexSchema, IntentResponse, ToolDescriptor,
};

/// Build a tool descriptor with an endpoint, active by default.
pub fn tool(name: &str, description: &str, spec: &str) -> ToolDescriptor {
    ToolDescriptor {
        function_name: name.to_string(),
        description: description.to_string(),
        endpoint: format!("/tools/{name}"),
        http_method: HttpMethod::Post,
        parameters_spec: spec.to_string(),
        category: None,
        is_active: true,
    }
}

/// The canonical product-listing tool with category support.
pub fn products_tool() -> ToolDescriptor {
    tool(
        "GetProducts",
        "List products with optional filters",
        "category: string, supplier: string, threshold: number",
    )
}

/// A sales tool that implies a date range.
pub fn sales_tool() -> ToolDescriptor {
    tool(
        "GetSalesData",
        "Sales records for a date range",
        "startDate: string, endDate: string, category: string",
    )
}

pub fn low_stock_tool() -> ToolDescriptor {
    tool(
        "GetLowStockItems",
        "Products below a stock threshold",
        "threshold: number",
    )
}

/// Search backend serving a fixed tool list and optional schema.
pub struct FakeSearch {
    pub tools: Vec<ToolDescriptor>,
    pub schema: Option<IndexSchema>,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            schema: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, _query: &str) -> Result<Vec<ToolDescriptor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tools.clone())
    }

    async fn fetch_schema(&self) -> Result<Option<IndexSchema>> {
        Ok(self.schema.clone())
    }
}

/// Model backend replaying one canned response.
pub struct FakeModel {
    pub response: IntentResponse,
    pub calls: AtomicUsize,
}

impl FakeModel {
    /// A model that answers with a native structured call.
    pub fn native(tool_name: &str, arguments: Value) -> Self {
        Self {
            response: IntentResponse {
                ai_message: "Here is what I found.".to_string(),
                function_calls: Some(vec![FunctionCall {
                    name: tool_name.to_string(),
                    arguments,
                }]),
                usage: None,
                model: Some("fake-model".to_string()),
            },
            calls: AtomicUsize::new(0),
        }
    }

    /// A model that answers conversationally with no structured call.
    pub fn text_reply(message: &str) -> Self {
        Self {
            response: IntentResponse {
                ai_message: message.to_string(),
                function_calls: None,
                usage: None,
                model: Some("fake-model".to_string()),
            },
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ModelBackend for FakeModel {
    async fn resolve_intent(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _prior_messages: &[ChatMessage],
        _session_id: &str,
    ) -> Result<IntentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Transport replaying one canned HTTP reply and recording every call.
pub struct FakeTransport {
    pub status: u16,
    pub body: Value,
    pub calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl FakeTransport {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Parameters of call `i`, panicking when it never happened.
    pub fn call_params(&self, i: usize) -> Map<String, Value> {
        self.calls.lock().unwrap()[i].1.clone()
    }
}

#[async_trait]
impl ToolTransport for FakeTransport {
    async fn invoke(
        &self,
        tool: &ToolDescriptor,
        params: &Map<String, Value>,
    ) -> Result<ToolReply> {
        self.calls
            .lock()
            .unwrap()
            .push((tool.function_name.clone(), params.clone()));
        Ok(ToolReply {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Wire fakes into a full pipeline with a fresh cache and default config.
pub fn pipeline_with(
    search: Arc<FakeSearch>,
    model: Arc<FakeModel>,
    transport: Arc<FakeTransport>,
) -> ChatPipeline {
    pipeline_with_config(search, model, transport, StocktalkConfig::default())
}

/// Same wiring with a caller-supplied configuration.
pub fn pipeline_with_config(
    search: Arc<FakeSearch>,
    model: Arc<FakeModel>,
    transport: Arc<FakeTransport>,
    config: StocktalkConfig,
) -> ChatPipeline {
    let config = ConfigHandle::new(config);
    let cache = Arc::new(Mutex::new(QueryCache::new(64, Duration::from_secs(60))));
    let resolver = IntentResolver::new(
        model,
        search.clone(),
        cache.clone(),
        config.clone(),
    );
    ChatPipeline::new(search, transport, resolver, cache, config)
}

/// A handful of dairy inventory records shaped like the product backend's
/// envelope payloads.
pub fn dairy_records() -> Value {
    json!([
        {"name": "Whole Milk", "category": "Dairy", "supplier": "Fresh Dairy Co.", "stock": 12},
        {"name": "Butter", "category": "Dairy", "supplier": "Fresh Dairy Co.", "stock": 25},
        {"name": "Yogurt", "category": "Dairy", "supplier": "Fresh Dairy Co.", "stock": 8}
    ])
}
