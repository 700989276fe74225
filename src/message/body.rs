//! Escape handling for bodies passed on the command line.
//!
//! A flag value can't carry raw control characters, so the two-character
//! sequences `\r` and `\n` stand in for CR and LF. Nothing else is
//! interpreted; a structured caller would simply pass real line breaks.

use std::borrow::Cow;

/// Replaces each literal `\r` with CR and each literal `\n` with LF.
///
/// The scan runs left to right without overlap, so `\\n` becomes a
/// backslash followed by LF. Existing control characters are left alone.
#[must_use]
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains("\\r") && !text.contains("\\n") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('r') => {
                    chars.next();
                    out.push('\r');
                    continue;
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }

    Cow::Owned(out)
}
