//! Shared data model for the query-resolution pipeline.
//!
//! Defines [`ToolDescriptor`] (a backend capability), [`ParsedIntent`] (the
//! tiered result of intent parsing), [`McpResult`] (a normalized tool
//! invocation envelope), and [`FormattedResponse`] (the presentation-ready
//! answer handed to whatever renders it).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP method a tool is invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(format!("unsupported HTTP method: {s}")),
        }
    }
}

/// A named backend capability discovered via the search backend.
///
/// Multiple descriptors may match a query; the selector picks exactly one
/// per request. Read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub function_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub http_method: HttpMethod,
    /// Free-text parameter documentation from the search index.
    #[serde(default)]
    pub parameters_spec: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ToolDescriptor {
    /// A descriptor is usable only when both a name and an endpoint exist.
    pub fn is_invocable(&self) -> bool {
        !self.function_name.is_empty() && !self.endpoint.is_empty()
    }
}

/// The user's inferred goal, one variant per parsing tier.
///
/// Tiers are tried in declaration order: a native structured call from the
/// model beats the `Function:`/`Parameters:` text grammar, which beats
/// keyword extraction from the free-text reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedIntent {
    /// The model used native function calling.
    NativeCall {
        name: String,
        arguments: Map<String, Value>,
    },
    /// The model answered in the textual `Function:` / `Parameters:` grammar.
    TextGrammarCall {
        name: String,
        arguments: Map<String, Value>,
    },
    /// No structured form found; a search query scraped from the reply.
    KeywordFallback { query: String },
}

impl ParsedIntent {
    /// Tool name the model asked for, if a structured form was found.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::NativeCall { name, .. } | Self::TextGrammarCall { name, .. } => Some(name),
            Self::KeywordFallback { .. } => None,
        }
    }

    /// The model-proposed arguments, empty for the keyword fallback.
    pub fn arguments(&self) -> Map<String, Value> {
        match self {
            Self::NativeCall { arguments, .. } | Self::TextGrammarCall { arguments, .. } => {
                arguments.clone()
            }
            Self::KeywordFallback { .. } => Map::new(),
        }
    }

    /// The search query to feed the tool-discovery backend.
    ///
    /// Prefers an explicit `query` argument, then the fallback query text.
    pub fn search_query(&self) -> Option<&str> {
        match self {
            Self::NativeCall { arguments, .. } | Self::TextGrammarCall { arguments, .. } => {
                arguments.get("query").and_then(Value::as_str)
            }
            Self::KeywordFallback { query } => Some(query),
        }
    }
}

/// Normalized tool invocation output. Created fresh per call, consumed
/// immediately by the formatter, never retained.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct McpResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl McpResult {
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// The presentation-ready answer for one request. Exactly one variant,
/// chosen deterministically from the result shape and the query intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormattedResponse {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        summary: String,
        /// `None` in summary mode — only the aggregate text is shown.
        #[serde(skip_serializing_if = "Option::is_none")]
        table_data: Option<Vec<Value>>,
        tool_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Document {
        summary: String,
        json_data: Value,
        tool_name: String,
    },
}

impl FormattedResponse {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text {
            text: message.into(),
        }
    }
}

/// Presentation recommendation derived from a record array's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedView {
    /// Flat homogeneous records — a plain table.
    Table,
    /// Complex or non-homogeneous data — an inspectable JSON tree.
    Json,
    /// Partially nested — both views, nested fields flattened for the table.
    Mixed,
}

impl RecommendedView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Mixed => "mixed",
        }
    }
}

/// Read-only shape analysis of a result's record array.
#[derive(Debug, Clone, Serialize)]
pub struct DataShapeAnalysis {
    pub is_tabular: bool,
    pub is_homogeneous: bool,
    pub has_complex_nesting: bool,
    pub record_count: usize,
    pub field_count: usize,
    pub complex_field_count: usize,
    pub recommended_view: RecommendedView,
}

/// Role of a chat message in the conversation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One prior conversation turn, passed to the intent resolver as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A native structured function call emitted by the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Token accounting reported by the model backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Reply envelope from the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    #[serde(default)]
    pub ai_message: String,
    #[serde(default)]
    pub function_calls: Option<Vec<FunctionCall>>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub model: Option<String>,
}

/// One field of the search backend's index schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub key: Option<bool>,
    #[serde(default)]
    pub searchable: Option<bool>,
    #[serde(default)]
    pub filterable: Option<bool>,
    #[serde(default)]
    pub sortable: Option<bool>,
}

/// The search backend's index schema, used for capability answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    pub index_name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}
