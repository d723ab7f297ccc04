//! Parses model backend replies into a [`ParsedIntent`].
//!
//! One parsing tier per fallback level, tried in order:
//!
//! 1. Native structured function call (first call matching a known entry
//!    point; a parallel multi-tool wrapper is unwrapped to its first
//!    sub-call).
//! 2. The textual grammar `Function: <name>` / `Parameters: <json>`.
//! 3. Salvage of a single `"query": "..."` field from broken JSON.
//! 4. Keyword extraction from the reply text (quoted phrase > gated phrase
//!    pattern > top-3 non-stopword tokens > `"*"` wildcard).
//!
//! Parse failures never block the pipeline; the worst case is a wildcard
//! search intent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::text::tokenize;
use crate::types::{FunctionCall, IntentResponse, ParsedIntent};

/// Canonical aggregation/search entry points a native call may target.
const ENTRY_POINTS: &[&str] = &["search", "search_tools", "aggregate_query", "query_index"];

/// OpenAI-style wrapper emitted when the model batches several calls.
const PARALLEL_WRAPPER: &str = "multi_tool_use.parallel";

static FUNCTION_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*Function:\s*([A-Za-z0-9_.\-]+)\s*$").expect("grammar pattern must compile")
});

static QUERY_SALVAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""query"\s*:\s*"([^"]+)""#).expect("salvage pattern must compile")
});

static QUOTED_PHRASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]{3,80})"|'([^']{3,80})'"#).expect("quote pattern must compile"));

static GATED_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:find|show|list|search for|looking for|information about)\s+(?:me\s+)?(?:all\s+)?([A-Za-z0-9][A-Za-z0-9 \-]{2,60})",
    )
    .expect("gated pattern must compile")
});

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "for", "to", "in", "on", "at", "and", "or", "is", "are", "was",
    "were", "be", "i", "we", "you", "me", "my", "our", "it", "this", "that", "what", "which",
    "how", "much", "many", "can", "could", "please", "show", "give", "get", "do", "does",
    "with", "from", "about", "all", "some", "any",
];

/// Parse a model reply into an intent, walking the fallback tiers.
pub fn parse_intent(response: &IntentResponse) -> ParsedIntent {
    if let Some(calls) = &response.function_calls {
        for call in calls {
            if let Some(intent) = native_intent(call) {
                return intent;
            }
        }
    }

    if let Some(intent) = parse_text_grammar(&response.ai_message) {
        return intent;
    }

    ParsedIntent::KeywordFallback {
        query: fallback_query(&response.ai_message),
    }
}

// ── Tier 1: native calls ──────────────────────────────────────────────────────

fn native_intent(call: &FunctionCall) -> Option<ParsedIntent> {
    if call.name == PARALLEL_WRAPPER {
        return unwrap_parallel(&call.arguments);
    }
    if !is_entry_point(&call.name) {
        return None;
    }
    Some(ParsedIntent::NativeCall {
        name: call.name.clone(),
        arguments: value_to_map(&call.arguments),
    })
}

fn is_entry_point(name: &str) -> bool {
    let bare = name.strip_prefix("functions.").unwrap_or(name);
    ENTRY_POINTS.contains(&bare)
}

/// Unwrap `multi_tool_use.parallel` to its first sub-call whose recipient
/// matches a known entry point.
fn unwrap_parallel(arguments: &Value) -> Option<ParsedIntent> {
    let uses = arguments.get("tool_uses")?.as_array()?;
    for tool_use in uses {
        let recipient = tool_use.get("recipient_name")?.as_str()?;
        let bare = recipient.strip_prefix("functions.").unwrap_or(recipient);
        if is_entry_point(bare) {
            let params = tool_use.get("parameters").cloned().unwrap_or(Value::Null);
            return Some(ParsedIntent::NativeCall {
                name: bare.to_string(),
                arguments: value_to_map(&params),
            });
        }
    }
    None
}

fn value_to_map(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        // Some backends ship arguments as a JSON-encoded string.
        Value::String(s) => serde_json::from_str::<Map<String, Value>>(s).unwrap_or_default(),
        _ => Map::new(),
    }
}

// ── Tier 2/3: text grammar and query salvage ──────────────────────────────────

/// Parse the strict textual grammar from free text. A broken parameters
/// object degrades to the `"query"` salvage regex before giving up.
pub fn parse_text_grammar(text: &str) -> Option<ParsedIntent> {
    let name = FUNCTION_LINE_RE.captures(text)?.get(1)?.as_str().to_string();

    let arguments = match extract_parameters_json(text) {
        Some(Ok(map)) => map,
        Some(Err(raw)) => {
            // JSON failed to parse; salvage a lone query field if present.
            let mut map = Map::new();
            if let Some(caps) = QUERY_SALVAGE_RE.captures(&raw) {
                map.insert("query".into(), Value::String(caps[1].to_string()));
            }
            map
        }
        None => Map::new(),
    };

    Some(ParsedIntent::TextGrammarCall { name, arguments })
}

/// Find the `Parameters:` line and scan a brace-balanced JSON object from
/// it. Returns the parsed map, or the raw slice when parsing failed.
fn extract_parameters_json(text: &str) -> Option<Result<Map<String, Value>, String>> {
    let marker = text.find("Parameters:")?;
    let after = &text[marker + "Parameters:".len()..];
    let open = after.find('{')?;
    let raw = balanced_object(&after[open..])?;
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(map) => Some(Ok(map)),
        Err(_) => Some(Err(raw.to_string())),
    }
}

/// The longest brace-balanced prefix of `s`, respecting JSON strings.
fn balanced_object(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    // Unterminated object — hand back what we saw for salvage.
    Some(s)
}

// ── Tier 4: keyword fallback ──────────────────────────────────────────────────

/// Scrape a search query from free text: quoted phrase, then a gated
/// phrase pattern, then the top-3 non-stopword tokens, then `"*"`.
pub fn fallback_query(text: &str) -> String {
    if let Some(caps) = QUOTED_PHRASE_RE.captures(text) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            return m.as_str().trim().to_string();
        }
    }

    if let Some(caps) = GATED_PHRASE_RE.captures(text) {
        let phrase = caps[1].trim();
        if !phrase.is_empty() {
            return phrase.to_string();
        }
    }

    let tokens: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|t| t.len() > 2 && !STOPWORDS.contains(&t.as_str()))
        .take(3)
        .collect();
    if !tokens.is_empty() {
        return tokens.join(" ");
    }

    "*".to_string()
}
