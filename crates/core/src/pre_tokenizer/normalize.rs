//! Text normalization applied before pre-tokenization.
//!
//! Training corpora are decoded permissively and their line endings unified,
//! so that the same text produces the same pre-tokens on every platform.

use std::borrow::Cow;

/// Line-ending handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEndings {
    /// Rewrite `\r\n` and lone `\r` to `\n`
    #[default]
    Unix,
    /// Leave text untouched
    Preserve,
}

/// Line-ending normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    /// Line-ending mode to apply
    line_endings: LineEndings,
}

impl Normalizer {
    /// Create a new normalizer.
    pub fn new(line_endings: LineEndings) -> Self {
        Self { line_endings }
    }

    /// Normalizer that leaves text unchanged.
    pub fn preserve() -> Self {
        Self::new(LineEndings::Preserve)
    }

    /// Normalize text. Borrows when nothing changes.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self.line_endings {
            LineEndings::Unix if text.contains('\r') => {
                Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
            }
            _ => Cow::Borrowed(text),
        }
    }
}

/// Decode UTF-8, dropping malformed byte sequences.
///
/// Training never fails on corpus content: invalid bytes are removed rather
/// than replaced, so no U+FFFD sequences leak into the learned merges.
pub fn decode_utf8_lossy_dropping(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }

    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    Cow::Owned(text)
}
