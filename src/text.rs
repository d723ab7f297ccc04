//! Word-boundary text matching shared by the keyword rule tables.
//!
//! Every heuristic in this crate (date phrases, chart keywords, category
//! detection, tool-selection overrides) matches against lowercased user
//! text. Plain `contains` is too loose — "hier" (French "yesterday") must
//! not fire inside "hierarchy" — so matches require non-alphanumeric
//! characters on both sides of the phrase.

/// True when `phrase` occurs in `text` with word boundaries on both ends.
///
/// Both inputs are compared lowercased. Multi-word phrases match literally,
/// so internal whitespace must agree.
pub fn has_phrase(text: &str, phrase: &str) -> bool {
    let haystack = text.to_lowercase();
    let needle = phrase.to_lowercase();
    if needle.is_empty() {
        return false;
    }

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let start = from + pos;
        let end = start + needle.len();
        let left_ok = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let right_ok = end == haystack.len()
            || !haystack[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }
        from = end;
    }
    false
}

/// True when any of `phrases` matches per [`has_phrase`].
pub fn has_any_phrase(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| has_phrase(text, p))
}

/// Lowercased alphanumeric tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
