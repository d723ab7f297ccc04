//! Natural-language analytics over inventory and sales backends.
//!
//! Stocktalk turns a free-text business question ("show me all dairy
//! products from Fresh Dairy Co. under 30 units in stock") into one backend
//! tool call and a presentation-ready answer. The pipeline:
//!
//! 1. **Search** — find candidate tools for the question (cached).
//! 2. **Resolve** — ask the model backend for intent; parse its reply
//!    through tiered fallbacks (native call, text grammar, keyword scrape).
//!    Schema/capability questions are answered locally without the model.
//! 3. **Extract** — pull thresholds, suppliers, categories, and date ranges
//!    from the question deterministically, in English, French, and Dutch.
//! 4. **Select & invoke** — pick exactly one tool, merge model arguments
//!    over extracted ones, call the tool over HTTP, normalize the envelope.
//! 5. **Format** — classify the result into text, table, or document, and
//!    choose a chart from data shape plus query phrasing.
//!
//! # Modules
//!
//! - [`config`] — Configuration from TOML files and environment variables,
//!   published to subscribers through a watch channel
//! - [`backend`] — HTTP client traits and the reqwest implementation
//! - [`cache`] — TTL cache with FIFO eviction and canonical cache keys
//! - [`extract`] — Deterministic multilingual parameter extraction
//! - [`intent`] — Model-backed intent resolution and tiered reply parsing
//! - [`pipeline`] — Orchestration: selection, invocation, the full answer path
//! - [`format`] — Response classification, shape analysis, chart selection

pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod extract;
pub mod format;
pub mod intent;
pub mod pipeline;
pub mod server;
pub mod text;
pub mod types;
