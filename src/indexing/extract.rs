//! Visible text extraction
//!
//! Text inside `<script>`, `<style>`, `<noscript>` and `<template>` is not
//! visible and is skipped.

use crate::morphology::lemmatize;
use scraper::{Html, Node, Selector};
use std::collections::HashMap;

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Title and body text of a page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    /// Text of `<title>`, empty if absent
    pub title: String,
    /// Visible text of `<body>`, fragments joined by single spaces
    pub body: String,
}

/// Extracts the title and visible body text of an HTML document
pub fn extract_text(html: &str) -> PageText {
    let document = Html::parse_document(html);
    PageText {
        title: extract_title(&document),
        body: extract_body(&document),
    }
}

fn extract_title(document: &Html) -> String {
    let selector = match Selector::parse("title") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default()
}

fn extract_body(document: &Html) -> String {
    let selector = match Selector::parse("body") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    let mut fragments = Vec::new();
    for body in document.select(&selector) {
        for node in body.descendants() {
            if let Node::Text(text) = node.value() {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .map(|e| HIDDEN_ELEMENTS.contains(&e.name()))
                        .unwrap_or(false)
                });
                if !hidden {
                    let fragment = text.trim();
                    if !fragment.is_empty() {
                        fragments.push(fragment.to_string());
                    }
                }
            }
        }
    }

    collapse_whitespace(&fragments.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lemmas of a page with their posting rank
///
/// The rank of a lemma is its occurrence count in the body plus its
/// occurrence count in the title multiplied by `title_weight`. The result is
/// sorted by lemma so that writes happen in a stable order.
pub fn page_lemmas(text: &PageText, title_weight: f32) -> Vec<(String, f32)> {
    let mut ranks: HashMap<String, f32> = HashMap::new();

    for (lemma, count) in lemmatize(&text.body) {
        *ranks.entry(lemma).or_insert(0.0) += count as f32;
    }
    if title_weight > 0.0 {
        for (lemma, count) in lemmatize(&text.title) {
            *ranks.entry(lemma).or_insert(0.0) += title_weight * count as f32;
        }
    }

    let mut lemmas: Vec<(String, f32)> = ranks.into_iter().collect();
    lemmas.sort_by(|a, b| a.0.cmp(&b.0));
    lemmas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_and_body() {
        let html = r#"<html><head><title>  Про   котов </title></head>
            <body><h1>Кот</h1><p>сидит на <b>окне</b></p></body></html>"#;
        let text = extract_text(html);

        assert_eq!(text.title, "Про котов");
        assert_eq!(text.body, "Кот сидит на окне");
    }

    #[test]
    fn test_hidden_text_is_skipped() {
        let html = r#"<html><body>
            <script>var кот = 1;</script>
            <style>.окно { color: red }</style>
            <p>видимый текст</p>
        </body></html>"#;

        assert_eq!(extract_text(html).body, "видимый текст");
    }

    #[test]
    fn test_missing_title() {
        let text = extract_text("<html><body>текст</body></html>");
        assert!(text.title.is_empty());
    }

    #[test]
    fn test_page_lemmas_ranks() {
        let text = PageText {
            title: "Кот".to_string(),
            body: "кот сидит на окне, кот спит".to_string(),
        };

        let lemmas = page_lemmas(&text, 1.0);
        let rank = |lemma: &str| lemmas.iter().find(|(l, _)| l == lemma).map(|(_, r)| *r);

        assert_eq!(rank("кот"), Some(3.0));
        assert_eq!(rank("окн"), Some(1.0));
        assert_eq!(rank("на"), None);

        let weighted = page_lemmas(&text, 0.5);
        assert_eq!(
            weighted.iter().find(|(l, _)| l == "кот").map(|(_, r)| *r),
            Some(2.5)
        );
    }

    #[test]
    fn test_page_lemmas_sorted() {
        let text = PageText {
            title: String::new(),
            body: "яблоко арбуз мост".to_string(),
        };
        let lemmas: Vec<String> = page_lemmas(&text, 1.0).into_iter().map(|(l, _)| l).collect();
        let mut sorted = lemmas.clone();
        sorted.sort();
        assert_eq!(lemmas, sorted);
    }
}
