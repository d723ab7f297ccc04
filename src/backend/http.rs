//! HTTP implementations of the collaborator traits, over reqwest.
//!
//! Wire contracts:
//! - `POST {base}{search_path}` body `{"query": ...}` → `{"results": [ToolDescriptor]}`
//! - `GET  {base}{schema_path}` → `IndexSchema` or 404
//! - `POST {base}{chat_path}` body `{message, history, sessionId, systemPrompt}`
//!   → `IntentResponse`
//! - tool invocation: GET with non-empty params as query-string pairs, or
//!   POST with the parameter object as the JSON body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::types::{ChatMessage, HttpMethod, IndexSchema, IntentResponse, ToolDescriptor};

use super::{ModelBackend, SearchBackend, ToolReply, ToolTransport};

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    search_path: String,
    chat_path: String,
    schema_path: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ToolDescriptor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatMessage],
    session_id: &'a str,
    system_prompt: &'a str,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_path: config.search_path.clone(),
            chat_path: config.chat_path.clone(),
            schema_path: config.schema_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, query: &str) -> Result<Vec<ToolDescriptor>> {
        let url = self.url(&self.search_path);
        debug!(%url, %query, "tool search");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query })
            .send()
            .await
            .context("search backend unreachable")?
            .error_for_status()
            .context("search backend returned an error status")?;

        let parsed: SearchResponse = response
            .json()
            .await
            .context("search response was not valid JSON")?;
        Ok(parsed.results)
    }

    async fn fetch_schema(&self) -> Result<Option<IndexSchema>> {
        let url = self.url(&self.schema_path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("schema backend unreachable")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .context("schema backend returned an error status")?;
        let schema: IndexSchema = response
            .json()
            .await
            .context("schema response was not valid JSON")?;
        Ok(Some(schema))
    }
}

#[async_trait]
impl ModelBackend for HttpBackend {
    async fn resolve_intent(
        &self,
        system_prompt: &str,
        user_text: &str,
        prior_messages: &[ChatMessage],
        session_id: &str,
    ) -> Result<IntentResponse> {
        let url = self.url(&self.chat_path);
        debug!(%url, session = %session_id, "model call");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                message: user_text,
                history: prior_messages,
                session_id,
                system_prompt,
            })
            .send()
            .await
            .context("model backend unreachable")?
            .error_for_status()
            .context("model backend returned an error status")?;

        response
            .json()
            .await
            .context("model response was not valid JSON")
    }
}

#[async_trait]
impl ToolTransport for HttpBackend {
    async fn invoke(
        &self,
        tool: &ToolDescriptor,
        params: &Map<String, Value>,
    ) -> Result<ToolReply> {
        let url = self.url(&tool.endpoint);
        debug!(tool = %tool.function_name, method = %tool.http_method, %url, "tool invocation");

        let request = match tool.http_method {
            HttpMethod::Get => {
                let pairs: Vec<(String, String)> = params
                    .iter()
                    .filter_map(|(k, v)| query_value(v).map(|s| (k.clone(), s)))
                    .collect();
                self.client.get(&url).query(&pairs)
            }
            HttpMethod::Post => self.client.post(&url).json(&Value::Object(params.clone())),
        };

        let response = request.send().await.with_context(|| {
            format!("tool '{}' endpoint unreachable", tool.function_name)
        })?;

        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(Value::Null);
        Ok(ToolReply { status, body })
    }
}

/// Scalar rendering for GET query pairs; empty strings and composites are
/// dropped rather than serialized.
fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
