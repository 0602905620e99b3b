//! Query simplification.
//!
//! Reduces a long natural-language claim to a short keyword query that search providers with
//! input limits will accept: capitalized entity runs first, then content words.
//!
//! The transform is pure and a fixed point: `simplify(simplify(x)) == simplify(x)`. Key terms
//! are only drawn from tokens that are not part of an entity run, which keeps entity words
//! from reappearing as lowercase terms on a second pass.


use std::collections::HashSet;

use crate::constants::MAX_SIMPLIFIED_TERMS;

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did", "does",
    "doing", "down", "during", "each", "even", "every", "few", "for", "from", "further", "had",
    "has", "have", "having", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "into", "its", "itself", "just", "more", "most", "much", "must", "not", "now", "off", "once",
    "only", "other", "our", "ours", "ourselves", "out", "over", "own", "really", "said", "same",
    "say", "says", "she", "should", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "too",
    "under", "until", "very", "was", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Reduces `text` to at most six search terms.
///
/// Returns an empty string when nothing survives. Callers compare the result against the
/// trimmed input and treat equality (or emptiness) as "no simplification happened"; see
/// [`simplified_form`].
pub fn simplify(text: &str) -> String {
    let cleaned = strip_punctuation(text);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut terms: Vec<String> = Vec::new();

    for entity in entity_runs(&tokens) {
        if seen.insert(entity.to_lowercase()) {
            terms.push(entity);
        }
    }

    for term in key_terms(&tokens) {
        if seen.insert(term.clone()) {
            terms.push(term);
        }
    }

    terms.truncate(MAX_SIMPLIFIED_TERMS);
    terms.join(" ")
}

/// Returns the simplified query only when it differs from the trimmed input and is non-empty.
pub fn simplified_form(text: &str) -> Option<String> {
    let simplified = simplify(text);
    if simplified.is_empty() || simplified == text.trim() {
        None
    } else {
        Some(simplified)
    }
}

fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn is_capitalized(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| !c.to_lowercase().eq(std::iter::once(c)))
}

fn entity_runs(tokens: &[&str]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in tokens {
        if is_capitalized(token) {
            current.push(token);
        } else if !current.is_empty() {
            runs.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        runs.push(current.join(" "));
    }

    runs
}

fn key_terms(tokens: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|token| !is_capitalized(token))
        .map(|token| token.to_lowercase())
        .filter(|token| token.chars().count() > 2 && !STOP_WORDS.contains(&token.as_str()))
        .filter(|token| seen.insert(token.clone()))
        .collect()
}
