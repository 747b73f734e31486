// Text normalization shared by catalog building and title parsing
use std::ops::Range;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalized text together with the source span behind every byte of it.
///
/// The normalized alphabet is `[a-z0-9 ]`, so byte and char indices coincide.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    text: String,
    spans: Vec<Range<usize>>,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Byte offset in the source right after the normalized prefix `..len`.
    pub fn source_end(&self, len: usize) -> usize {
        match len {
            0 => 0,
            n => self.spans[n.min(self.spans.len()) - 1].end,
        }
    }
}

/// Lowercases, strips diacritics, turns anything outside `[a-z0-9]` into a
/// separator and collapses separators into single spaces.
pub fn normalize(text: &str) -> String {
    normalize_with_offsets(text).into_string()
}

/// Same output as [`normalize`], keeping track of where each byte came from.
pub fn normalize_with_offsets(source: &str) -> NormalizedText {
    let mut text = String::with_capacity(source.len());
    let mut spans = Vec::with_capacity(source.len());
    let mut gap_start: Option<usize> = None;

    for (start, ch) in source.char_indices() {
        let end = start + ch.len_utf8();
        for folded in ch.to_lowercase().nfd() {
            if is_combining_mark(folded) {
                continue;
            }
            if folded.is_ascii_lowercase() || folded.is_ascii_digit() {
                if let Some(gap) = gap_start.take() {
                    if !text.is_empty() {
                        text.push(' ');
                        spans.push(gap..start);
                    }
                }
                text.push(folded);
                spans.push(start..end);
            } else if gap_start.is_none() {
                gap_start = Some(start);
            }
        }
    }

    NormalizedText { text, spans }
}

/// True when `haystack` starts with `prefix` and the prefix ends on a word
/// boundary (end of text or a space).
pub fn starts_with_word(haystack: &str, prefix: &str) -> bool {
    if prefix.is_empty() || !haystack.starts_with(prefix) {
        return false;
    }
    matches!(haystack.as_bytes().get(prefix.len()), None | Some(b' '))
}
