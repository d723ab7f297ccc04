//! Intent resolution: model prompting, tiered reply parsing, and the
//! schema-question short-circuit.

pub mod parser;
pub mod resolver;

pub use parser::{fallback_query, parse_intent, parse_text_grammar};
pub use resolver::{is_schema_query, IntentResolver, Resolution};
