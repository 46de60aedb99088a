//! Keyword Extractor: deterministic frequency-based keywords.
//!
//! Algorithm:
//! 1. Lower-case the text.
//! 2. Strip every character that is neither a word character nor whitespace.
//! 3. Split on Unicode word boundaries.
//! 4. Drop English stopwords.
//! 5. Count frequencies and keep the `n` most frequent tokens.
//!
//! Ties keep first-occurrence order: the sort is stable over tokens in the
//! order they first appeared.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::stopwords::is_stopword;

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex is valid"))
}

/// Normalized, stopword-free tokens in text order.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = punctuation().replace_all(&lowered, "");
    cleaned
        .unicode_words()
        .filter(|w| !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// Token frequencies, most frequent first, ties in first-occurrence order.
pub fn word_frequencies(text: &str) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for token in tokenize(text) {
        match index.get(&token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token.clone(), counts.len());
                counts.push((token, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Returns up to `n` distinct keywords for `text`, most frequent first.
/// Empty or all-stopword input yields an empty list.
pub fn extract_keywords(text: &str, n: usize) -> Vec<String> {
    word_frequencies(text)
        .into_iter()
        .take(n)
        .map(|(word, _)| word)
        .collect()
}

/// Keyword comparison between a job description and a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordOverlap {
    /// Job-description keywords that also appear among the resume keywords.
    pub matching: Vec<String>,
    /// Job-description keywords absent from the resume keywords.
    pub missing: Vec<String>,
}

/// Splits the job-description keywords into matching and missing, keeping
/// their original order.
pub fn keyword_overlap(jd_keywords: &[String], resume_keywords: &[String]) -> KeywordOverlap {
    let (matching, missing) = jd_keywords
        .iter()
        .cloned()
        .partition(|kw| resume_keywords.contains(kw));
    KeywordOverlap { matching, missing }
}
