//! Intent resolution against the language-model backend.
//!
//! [`IntentResolver::resolve`] sends the user's text plus conversation
//! context to the model and parses the reply through the tiered parser.
//! A schema/capability question short-circuits resolution entirely: the
//! answer is built from a cached schema snapshot and the model is never
//! called.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::backend::{ModelBackend, SearchBackend};
use crate::cache::{self, QueryCache};
use crate::config::ConfigHandle;
use crate::text::has_any_phrase;
use crate::types::{ChatMessage, IndexSchema, ParsedIntent, ToolDescriptor, Usage};

use super::parser;

/// Phrases that make a question about the system itself rather than the
/// data, answered from the schema snapshot without a model round-trip.
const SCHEMA_KEYWORDS: &[&str] = &[
    "schema",
    "what tools",
    "which tools",
    "available tools",
    "capabilities",
    "what can you do",
    "what fields",
    "index fields",
];

/// Outcome of intent resolution.
#[derive(Debug)]
pub enum Resolution {
    /// Schema/capability short-circuit; the pipeline stops here.
    Schema { text: String },
    /// A parsed intent plus the model's conversational reply.
    Intent {
        intent: ParsedIntent,
        ai_message: String,
        usage: Option<Usage>,
    },
}

pub struct IntentResolver {
    model: Arc<dyn ModelBackend>,
    search: Arc<dyn SearchBackend>,
    cache: Arc<Mutex<QueryCache>>,
    config: ConfigHandle,
}

impl IntentResolver {
    pub fn new(
        model: Arc<dyn ModelBackend>,
        search: Arc<dyn SearchBackend>,
        cache: Arc<Mutex<QueryCache>>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            model,
            search,
            cache,
            config,
        }
    }

    /// Resolve the user's text into a [`Resolution`].
    ///
    /// `tools` is the current search snapshot, enumerated in the system
    /// prompt so the model knows what it may call. Backend errors propagate
    /// as recoverable errors; the caller converts them to a text response.
    pub async fn resolve(
        &self,
        user_text: &str,
        prior_messages: &[ChatMessage],
        session_id: &str,
        tools: &[ToolDescriptor],
    ) -> Result<Resolution> {
        if is_schema_query(user_text) {
            info!(query = %user_text, "schema short-circuit");
            let schema = self.cached_schema().await?;
            return Ok(Resolution::Schema {
                text: describe_schema(schema.as_ref(), tools),
            });
        }

        let system_prompt = self.build_system_prompt(tools);
        let response = self
            .model
            .resolve_intent(&system_prompt, user_text, prior_messages, session_id)
            .await?;

        let intent = parser::parse_intent(&response);
        debug!(?intent, "intent parsed");

        Ok(Resolution::Intent {
            intent,
            ai_message: response.ai_message,
            usage: response.usage,
        })
    }

    fn build_system_prompt(&self, tools: &[ToolDescriptor]) -> String {
        let config = self.config.current();
        let mut prompt = String::from(
            "You are a business-data assistant. Answer questions about inventory, \
             sales, and suppliers by calling exactly one backend tool.\n\
             Available tools:\n",
        );
        for tool in tools.iter().filter(|t| t.is_active) {
            prompt.push_str(&format!(
                "- {}: {} (parameters: {})\n",
                tool.function_name,
                tool.description,
                if tool.parameters_spec.is_empty() {
                    "none documented"
                } else {
                    &tool.parameters_spec
                }
            ));
        }
        prompt.push_str(
            "\nIf you cannot use native function calling, reply with exactly:\n\
             Function: <tool name>\n\
             Parameters: <JSON object>\n",
        );
        if !config.pipeline.custom_prompt_addition.is_empty() {
            prompt.push('\n');
            prompt.push_str(&config.pipeline.custom_prompt_addition);
        }
        prompt
    }

    async fn cached_schema(&self) -> Result<Option<IndexSchema>> {
        let key = cache::schema_key();
        if let Some(hit) = self.lock_cache().get(key) {
            return Ok(serde_json::from_value(hit).ok());
        }

        let schema = self.search.fetch_schema().await?;
        if let Some(ref s) = schema {
            let ttl = Duration::from_secs(self.config.current().cache.schema_ttl_secs);
            if let Ok(value) = serde_json::to_value(s) {
                self.lock_cache().set(key, value, Some(ttl));
            }
        }
        Ok(schema)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, QueryCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Literal keyword pre-check for schema/capability questions.
pub fn is_schema_query(text: &str) -> bool {
    has_any_phrase(text, SCHEMA_KEYWORDS)
}

/// Human-readable capability answer from the schema snapshot and the
/// current tool list.
fn describe_schema(schema: Option<&IndexSchema>, tools: &[ToolDescriptor]) -> String {
    let mut out = String::new();

    match schema {
        Some(schema) => {
            out.push_str(&format!(
                "Search index '{}' with {} field(s):\n",
                schema.index_name,
                schema.fields.len()
            ));
            for field in &schema.fields {
                let mut flags = Vec::new();
                if field.key == Some(true) {
                    flags.push("key");
                }
                if field.searchable == Some(true) {
                    flags.push("searchable");
                }
                if field.filterable == Some(true) {
                    flags.push("filterable");
                }
                if field.sortable == Some(true) {
                    flags.push("sortable");
                }
                out.push_str(&format!(
                    "  - {} ({}){}\n",
                    field.name,
                    field.field_type,
                    if flags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", flags.join(", "))
                    }
                ));
            }
        }
        None => out.push_str("No search-index schema is available.\n"),
    }

    let active: Vec<&ToolDescriptor> = tools.iter().filter(|t| t.is_active).collect();
    if !active.is_empty() {
        out.push_str(&format!("\n{} tool(s) available:\n", active.len()));
        for tool in active {
            out.push_str(&format!("  - {}: {}\n", tool.function_name, tool.description));
        }
    }

    out
}
