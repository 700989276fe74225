//! RFC 2047 encoded words, `B` encoding with a UTF-8 charset.

use std::borrow::Cow;

use base64::{Engine, engine::general_purpose::STANDARD};

const PREFIX: &str = "=?UTF-8?b?";
const SUFFIX: &str = "?=";

/// RFC 2047 Section 2 caps an encoded word at 75 characters.
pub const MAX_ENCODED_WORD_LEN: usize = 75;

/// Raw bytes that fit in one word once base64 encoded.
const MAX_CHUNK_LEN: usize = (MAX_ENCODED_WORD_LEN - PREFIX.len() - SUFFIX.len()) / 4 * 3;

/// Whether `text` contains anything outside printable ASCII (tab excepted).
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    text.chars().any(|c| !(' '..='~').contains(&c) && c != '\t')
}

/// Encodes `text` only if it [needs it](needs_encoding).
#[must_use]
pub fn encode_word(text: &str) -> Cow<'_, str> {
    if needs_encoding(text) {
        Cow::Owned(force_encode_word(text))
    } else {
        Cow::Borrowed(text)
    }
}

/// Encodes `text` unconditionally.
///
/// Text too long for a single word is split, on character boundaries, into
/// several words separated by a space.
#[must_use]
pub fn force_encode_word(text: &str) -> String {
    let mut words = Vec::new();
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if idx + c.len_utf8() - start > MAX_CHUNK_LEN {
            words.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        words.push(&text[start..]);
    }

    words
        .into_iter()
        .map(|chunk| format!("{PREFIX}{}{SUFFIX}", STANDARD.encode(chunk)))
        .collect::<Vec<_>>()
        .join(" ")
}
