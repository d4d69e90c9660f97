//! Result snippets
//!
//! A snippet is a window of the page body centered on the first word that
//! starts with one of the query lemmas. Every matching word inside the
//! window is wrapped in `<b>`; the rest of the text is HTML-escaped.

const ELLIPSIS: &str = "...";

/// Builds the snippet of `text` for the given lemmas
///
/// `size` is the window length in characters. Without a match the window
/// starts at the beginning of the text.
///
/// # Examples
///
/// ```
/// use sitedex::search::build_snippet;
///
/// let snippet = build_snippet("Кот сидит на окне", &["окн".to_string()], 200);
/// assert_eq!(snippet, "Кот сидит на <b>окне</b>");
/// ```
pub fn build_snippet(text: &str, lemmas: &[String], size: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || size == 0 {
        return String::new();
    }

    let folded: Vec<char> = chars.iter().map(|c| fold(*c)).collect();
    let needles: Vec<Vec<char>> = lemmas
        .iter()
        .filter(|lemma| !lemma.is_empty())
        .map(|lemma| lemma.chars().map(fold).collect())
        .collect();

    let center = first_match(&folded, &needles).unwrap_or(0);
    let (start, end) = window(chars.len(), center, size);
    let (start, end) = align_to_words(&chars, start, end);

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(&highlight(&chars[start..end], &folded[start..end], &needles));
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Case folding used for matching; keeps one char per char
fn fold(c: char) -> char {
    match c.to_lowercase().next().unwrap_or(c) {
        'ё' => 'е',
        lower => lower,
    }
}

fn is_word_start(text: &[char], i: usize) -> bool {
    i == 0 || !text[i - 1].is_alphanumeric()
}

fn first_match(text: &[char], needles: &[Vec<char>]) -> Option<usize> {
    (0..text.len()).find(|&i| {
        is_word_start(text, i) && needles.iter().any(|needle| text[i..].starts_with(needle))
    })
}

fn window(len: usize, center: usize, size: usize) -> (usize, usize) {
    if len <= size {
        return (0, len);
    }

    let start = center.saturating_sub(size / 2);
    let end = (start + size).min(len);
    (end.saturating_sub(size), end)
}

/// Moves the window edges inward so no word is cut in half
fn align_to_words(chars: &[char], mut start: usize, mut end: usize) -> (usize, usize) {
    if start > 0 && !chars[start - 1].is_whitespace() {
        if let Some(offset) = chars[start..end].iter().position(|c| c.is_whitespace()) {
            start += offset + 1;
        }
    }
    if end < chars.len() && !chars[end].is_whitespace() {
        if let Some(offset) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
            end = start + offset;
        }
    }

    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    (start, end)
}

fn highlight(chars: &[char], folded: &[char], needles: &[Vec<char>]) -> String {
    let mut out = String::with_capacity(chars.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_alphanumeric() {
            push_escaped(&mut out, chars[i]);
            i += 1;
            continue;
        }

        let word_end = (i..chars.len())
            .find(|&j| !chars[j].is_alphanumeric())
            .unwrap_or(chars.len());
        let word = &folded[i..word_end];
        let matched = needles.iter().any(|needle| word.starts_with(needle));

        if matched {
            out.push_str("<b>");
        }
        for c in &chars[i..word_end] {
            push_escaped(&mut out, *c);
        }
        if matched {
            out.push_str("</b>");
        }
        i = word_end;
    }

    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '&' => out.push_str("&amp;"),
        _ => out.push(c),
    }
}
