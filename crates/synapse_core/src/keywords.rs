//! Keyword extraction for streaming transcripts.
//!
//! Partial transcripts arrive many times per second, so this stays a plain
//! function over the fixed stopword list.

use crate::lexicon;
use std::collections::HashSet;

/// Minimum keyword length, counted in characters.
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Split text on letter/digit boundaries, keeping input casing.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Lowercased, deduplicated, order-preserving keywords of at least three
/// characters that are not stopwords.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for token in tokenize(text) {
        let word = token.to_lowercase();
        if word.chars().count() < MIN_KEYWORD_CHARS || lexicon::is_stopword(&word) {
            continue;
        }
        if seen.insert(word.clone()) {
            keywords.push(word);
        }
    }

    keywords
}
