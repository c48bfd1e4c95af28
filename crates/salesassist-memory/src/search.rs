//! Keyword matching for the in-process memory store.

use std::collections::HashSet;

/// Lowercased alphanumeric words of `text`.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Number of distinct query words that occur in `text`.
pub fn keyword_score(query: &HashSet<String>, text: &str) -> usize {
    if query.is_empty() {
        return 0;
    }
    tokenize(text).intersection(query).count()
}
