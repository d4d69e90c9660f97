//! Morphology analyzer
//!
//! Turns raw text into normalized word forms (lemmas). Only Cyrillic words
//! are considered; everything else is treated as a separator. Function words
//! (prepositions, conjunctions, particles, interjections) are discarded and
//! the remaining tokens are reduced with a Russian Snowball stemmer.
//!
//! The stored "lemmas" are therefore stems, not dictionary forms: "сидит"
//! becomes "сид" and "окне" becomes "окн". Indexing and search share this
//! reduction, so every inflection of a word meets the same key.
//!
//! The analyzer holds no mutable state: the regex and the stemmer are built
//! once on first use and only read afterwards, so every function here can be
//! called from any number of threads.

mod function_words;

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;

pub use function_words::is_function_word;

lazy_static! {
    static ref NON_LETTERS: Regex = Regex::new(r"[^а-яё\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::Russian);
}

/// Splits text into lowercase Cyrillic tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_LETTERS
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Returns the lemma of a single lowercase token, or `None` for function words
pub fn lemma_of(token: &str) -> Option<String> {
    if token.is_empty() || is_function_word(token) {
        return None;
    }

    let stem = STEMMER.stem(token);
    if stem.is_empty() {
        None
    } else {
        Some(stem.into_owned())
    }
}

/// Counts the lemmas found in `text`
///
/// # Examples
///
/// ```
/// use sitedex::morphology::lemmatize;
///
/// let lemmas = lemmatize("Кот сидит на окне, кот!");
/// assert_eq!(lemmas.get("кот"), Some(&2));
/// assert!(!lemmas.contains_key("на"));
/// ```
pub fn lemmatize(text: &str) -> HashMap<String, u32> {
    let mut lemmas = HashMap::new();
    for token in tokenize(text) {
        if let Some(lemma) = lemma_of(&token) {
            *lemmas.entry(lemma).or_insert(0) += 1;
        }
    }
    lemmas
}

/// Lemmas of a search query in input order
///
/// Function words are skipped. A token the stemmer cannot reduce is kept
/// as-is so that it can still be matched literally.
pub fn lemma_sequence(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| !is_function_word(token))
        .map(|token| lemma_of(&token).unwrap_or(token))
        .collect()
}
