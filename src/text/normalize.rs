use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::warn;

pub const DEFAULT_MAX_LENGTH: usize = 100_000;

pub const TRUNCATION_MARKER: &str = "... [content truncated]";

/// Sentences at or under this many characters are dropped
const MIN_SENTENCE_CHARS: usize = 10;

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Collapse whitespace, drop short and exact-duplicate sentences, and cap
/// the length at `max_length` characters.
///
/// Sentences are split on every `.`; the first occurrence of a duplicate
/// keeps its position.
///
/// Re-normalizing the output returns it unchanged only while it fits in
/// `max_length`. Truncated output is `max_length` characters plus
/// `TRUNCATION_MARKER`, so a second pass cuts it again.
pub fn normalize(text: &str, max_length: usize) -> String {
    let collapsed = whitespace().replace_all(text, " ");

    let mut seen = HashSet::new();
    let mut sentences = Vec::new();

    for sentence in collapsed.split('.') {
        let sentence = sentence.trim();
        if sentence.chars().count() <= MIN_SENTENCE_CHARS {
            continue;
        }
        if seen.insert(sentence) {
            sentences.push(sentence);
        }
    }

    let cleaned = sentences.join(". ");
    truncate(cleaned, max_length)
}

/// Cut to `max_length` characters and append `TRUNCATION_MARKER`
fn truncate(text: String, max_length: usize) -> String {
    let length = text.chars().count();
    if length <= max_length {
        return text;
    }

    warn!("Cleaned text too long ({} chars), truncating to {}", length, max_length);

    let cut = text
        .char_indices()
        .nth(max_length)
        .map_or(text.len(), |(index, _)| index);

    let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
    truncated.push_str(&text[..cut]);
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
