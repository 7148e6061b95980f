//! Pre-tokenization pipeline.
//!
//! Pre-tokenization runs before any BPE merge: normalize line endings, cut on
//! special tokens, split the remaining text by the lexical grammar and count
//! the resulting pre-tokens.

pub mod normalize;
pub mod split;

pub use normalize::{decode_utf8_lossy_dropping, LineEndings, Normalizer};
pub use split::{pre_tokens, Segment, Splitter, PRE_TOKEN_PATTERN};

use crate::error::Result;
use ahash::AHashMap;

/// Pre-token string -> occurrence count.
pub type PreTokenCounts = AHashMap<String, u64>;

/// Counts pre-tokens in training text.
#[derive(Debug, Clone, Default)]
pub struct PreTokenizer {
    splitter: Splitter,
    normalizer: Normalizer,
}

impl PreTokenizer {
    /// Create a pre-tokenizer for the given special tokens.
    pub fn new<S: AsRef<str>>(special_tokens: &[S], normalizer: Normalizer) -> Result<Self> {
        Ok(Self {
            splitter: Splitter::new(special_tokens)?,
            normalizer,
        })
    }

    /// Count pre-tokens in a text segment.
    ///
    /// Special-token literals are dropped, never counted.
    pub fn count(&self, text: &str) -> Result<PreTokenCounts> {
        let mut counts = PreTokenCounts::new();
        self.count_into(text, &mut counts)?;
        Ok(counts)
    }

    /// Count pre-tokens in raw corpus bytes, dropping invalid UTF-8.
    pub fn count_bytes(&self, bytes: &[u8]) -> Result<PreTokenCounts> {
        self.count(&decode_utf8_lossy_dropping(bytes))
    }

    /// Add the pre-token counts of `text` to an existing table.
    pub fn count_into(&self, text: &str, counts: &mut PreTokenCounts) -> Result<()> {
        let text = self.normalizer.normalize(text);

        for segment in self.splitter.split(&text)? {
            let Segment::Text(span) = segment else {
                continue;
            };
            for piece in pre_tokens(span) {
                let piece = piece?;
                match counts.get_mut(piece) {
                    Some(count) => *count += 1,
                    None => {
                        counts.insert(piece.to_owned(), 1);
                    }
                }
            }
        }

        Ok(())
    }

    /// The special-token splitter.
    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }
}

/// Sum two count tables.
pub fn merge_counts(mut into: PreTokenCounts, mut from: PreTokenCounts) -> PreTokenCounts {
    if into.len() < from.len() {
        std::mem::swap(&mut into, &mut from);
    }
    for (piece, count) in from {
        *into.entry(piece).or_insert(0) += count;
    }
    into
}
