//! External collaborator interfaces: search, model, and tool transport.
//!
//! The pipeline only ever talks to the outside world through these three
//! traits, so tests can swap in in-memory fakes. [`http::HttpBackend`] is
//! the production implementation, created via [`create_backends`] from
//! configuration.

pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::BackendConfig;
use crate::types::{ChatMessage, IndexSchema, IntentResponse, ToolDescriptor};

/// Full-text tool discovery and schema lookup.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search the tool index for capabilities matching `query`.
    async fn search(&self, query: &str) -> Result<Vec<ToolDescriptor>>;

    /// Fetch the search-index schema, or `None` when the backend has none.
    async fn fetch_schema(&self) -> Result<Option<IndexSchema>>;
}

/// The language-model backend, consumed as a single operation.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send the user's text plus context and get the model's reply, which
    /// may carry native structured function calls.
    async fn resolve_intent(
        &self,
        system_prompt: &str,
        user_text: &str,
        prior_messages: &[ChatMessage],
        session_id: &str,
    ) -> Result<IntentResponse>;
}

/// Raw HTTP reply from a tool endpoint, before envelope normalization.
#[derive(Debug, Clone)]
pub struct ToolReply {
    pub status: u16,
    pub body: Value,
}

impl ToolReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one tool call against its endpoint.
///
/// Implementations return `Ok` for any HTTP response (the invoker turns
/// non-2xx statuses into error results) and `Err` only for transport
/// failures that never produced a response.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    async fn invoke(
        &self,
        tool: &ToolDescriptor,
        params: &Map<String, Value>,
    ) -> Result<ToolReply>;
}

/// Create the production HTTP backend from config. The one returned value
/// implements all three collaborator traits.
pub fn create_backends(config: &BackendConfig) -> Result<Arc<http::HttpBackend>> {
    Ok(Arc::new(http::HttpBackend::new(config)?))
}
