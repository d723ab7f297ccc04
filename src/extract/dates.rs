//! Date-range inference: phrase-keyed calendar arithmetic.
//!
//! Phrases in English, French, and Dutch all map to the same arithmetic.
//! Evaluation order matters and is encoded as data: the explicit
//! "last N days" pattern first, then the fixed-phrase table, first hit
//! stops inference. A query with no range phrase but a sales/performance
//! topic gets a default trailing window instead.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::has_any_phrase;

/// Inclusive calendar-day range, formatted `%Y-%m-%d` on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Trailing window of `days` calendar days ending at `now`.
    pub fn trailing(days: u64, now: NaiveDate) -> Self {
        Self {
            start: now - Days::new(days),
            end: now,
        }
    }

    /// A single day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }
}

/// "last/past N days" in the three supported languages; capture group 1 is N.
static LAST_N_DAYS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:last|past)\s+(\d+)\s+days?\b",
        r"(?i)\b(?:les\s+)?(\d+)\s+derniers\s+jours\b",
        r"(?i)\b(?:de\s+)?(?:afgelopen|laatste)\s+(\d+)\s+dagen\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("date pattern must compile"))
    .collect()
});

/// Single-day phrases, highest priority after "last N days".
const YESTERDAY: &[&str] = &["yesterday", "hier", "gisteren"];
const TODAY: &[&str] = &["today", "aujourd'hui", "vandaag"];

/// Fixed trailing-window phrases, in evaluation order. Two-month phrases
/// precede one-month phrases so the longer window wins when both apply.
const WINDOW_PHRASES: &[(&[&str], u64)] = &[
    (
        &[
            "last week",
            "past week",
            "la semaine dernière",
            "semaine dernière",
            "semaine passée",
            "vorige week",
            "afgelopen week",
        ],
        7,
    ),
    (
        &[
            "last two months",
            "past two months",
            "les deux derniers mois",
            "deux derniers mois",
            "afgelopen twee maanden",
            "laatste twee maanden",
        ],
        60,
    ),
    (
        &[
            "last month",
            "past month",
            "le mois dernier",
            "mois dernier",
            "mois passé",
            "vorige maand",
            "afgelopen maand",
        ],
        30,
    ),
];

/// Topic keywords that imply a sales/performance question and therefore a
/// default trailing window when no explicit range phrase is present.
const SALES_TOPIC: &[&str] = &[
    "sales",
    "revenue",
    "sold",
    "turnover",
    "performance",
    "ventes",
    "vendu",
    "chiffre d'affaires",
    "performances",
    "verkoop",
    "verkocht",
    "omzet",
    "prestaties",
];

/// Infer an explicit date range from phrasing. First hit stops inference.
pub fn detect_date_range(text: &str, now: NaiveDate) -> Option<DateRange> {
    for pattern in LAST_N_DAYS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(days) = caps[1].parse::<u64>() {
                if days > 0 {
                    return Some(DateRange::trailing(days, now));
                }
            }
        }
    }

    if has_any_phrase(text, YESTERDAY) {
        return Some(DateRange::single(now - Days::new(1)));
    }
    if has_any_phrase(text, TODAY) {
        return Some(DateRange::single(now));
    }

    for (phrases, days) in WINDOW_PHRASES {
        if has_any_phrase(text, phrases) {
            return Some(DateRange::trailing(*days, now));
        }
    }

    None
}

/// True when the query semantically concerns sales or category performance,
/// even without an explicit range phrase.
pub fn mentions_sales_topic(text: &str) -> bool {
    has_any_phrase(text, SALES_TOPIC)
}
