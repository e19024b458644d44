//! Lexical helpers shared by the reference evaluators.
//!
//! Matching is deliberately shallow: lower-cased substring and word-set
//! overlap. The evaluators are heuristics over wording, not an NLU layer.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid regex"));
static LONG_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w{4,}\b").expect("valid regex"));
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));
static DISTINCTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_\-]{4,}").expect("valid regex"));

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "with", "by", "about",
    "as", "of", "that", "this", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "do", "does", "did", "will", "would", "shall", "should", "may", "might", "must", "can",
    "could", "what", "when", "where", "which", "your", "you", "our", "their", "there", "from",
    "into", "than", "then", "them", "they", "also", "just", "some", "like",
];

const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "pricing",
        &["price", "cost", "costs", "fee", "fees", "rate", "rates", "charge"],
    ),
    ("information", &["info", "details", "data"]),
    (
        "timeline",
        &["timeframe", "schedule", "duration", "time", "takes", "timing"],
    ),
    (
        "implementation",
        &["setup", "deployment", "installation", "rollout", "onboarding"],
    ),
    ("meeting", &["appointment", "call", "session", "demo"]),
    ("schedule", &["book", "booked", "booking", "calendar", "slot"]),
];

/// Lower-cased word tokens
pub fn words(text: &str) -> Vec<String> {
    WORD.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Distinct lower-cased words of four or more characters
pub fn long_word_set(text: &str) -> BTreeSet<String> {
    LONG_WORD
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Content-bearing words (longer than three characters, not stop words),
/// deduplicated in first-seen order
pub fn key_terms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() > 3 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Non-empty trimmed sentences
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tokens of four or more identifier characters, lower-cased
pub fn distinctive_tokens(text: &str) -> BTreeSet<String> {
    DISTINCTIVE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Whether `term` (or one of its synonyms) occurs in already lower-cased text
pub fn term_present(haystack: &str, term: &str) -> bool {
    if haystack.contains(term) {
        return true;
    }
    SYNONYMS.iter().any(|(head, alternatives)| {
        let related = *head == term || alternatives.contains(&term);
        related
            && (haystack.contains(head) || alternatives.iter().any(|alt| haystack.contains(alt)))
    })
}

/// Whether `text` covers `target`: the target verbatim, or at least
/// `threshold` of its key terms (synonyms allowed).
pub fn covers(text: &str, target: &str, threshold: f64) -> bool {
    let haystack = text.to_lowercase();
    let needle = target.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    if haystack.contains(&needle) {
        return true;
    }
    let terms = key_terms(&needle);
    if terms.is_empty() {
        return false;
    }
    let matched = terms.iter().filter(|t| term_present(&haystack, t)).count();
    matched as f64 / terms.len() as f64 >= threshold
}

/// Number of `phrases` present as whole words in lower-cased `text`
pub fn count_phrases(text: &str, phrases: &[&str]) -> usize {
    let padded = format!(" {} ", words(text).join(" "));
    phrases
        .iter()
        .filter(|p| {
            let phrase = words(p).join(" ");
            !phrase.is_empty() && padded.contains(&format!(" {} ", phrase))
        })
        .count()
}

/// Number of `fragments` occurring as substrings of lower-cased `text`
pub fn count_fragments(text: &str, fragments: &[&str]) -> usize {
    let lower = text.to_lowercase();
    fragments.iter().filter(|f| lower.contains(*f)).count()
}

/// `part / whole`, with an empty whole counting as full coverage
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}
