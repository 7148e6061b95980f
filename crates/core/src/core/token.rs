//! Byte-level symbols: tokens, words and adjacent pairs.
//!
//! A [`ByteToken`] is the unit every merge operates on. Tokens are compared,
//! hashed and ordered by their byte contents, so the same bytes reached through
//! different merge paths are the same token.

use crate::core::merges::MergeRule;
use std::borrow::Borrow;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// An immutable, non-empty byte sequence.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteToken(Arc<[u8]>);

/// An ordered pair of adjacent tokens within a word.
///
/// The derived tuple ordering compares the left token's bytes first, then the
/// right token's bytes. Training relies on this for tie-breaking.
pub type Pair = (ByteToken, ByteToken);

fn single_bytes() -> &'static [ByteToken; 256] {
    static TABLE: OnceLock<[ByteToken; 256]> = OnceLock::new();
    TABLE.get_or_init(|| std::array::from_fn(|b| ByteToken(Arc::from([b as u8].as_slice()))))
}

impl ByteToken {
    /// The token holding a single raw byte.
    ///
    /// Single-byte tokens are interned, so this is a reference count bump.
    #[inline]
    pub fn from_byte(byte: u8) -> Self {
        single_bytes()[byte as usize].clone()
    }

    /// Create a token from arbitrary bytes.
    ///
    /// Returns `None` for an empty slice.
    pub fn new(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [] => None,
            [b] => Some(Self::from_byte(*b)),
            _ => Some(Self(Arc::from(bytes))),
        }
    }

    /// Concatenate two tokens into a new one.
    pub fn concat(&self, other: &ByteToken) -> ByteToken {
        let mut joined = Vec::with_capacity(self.len() + other.len());
        joined.extend_from_slice(&self.0);
        joined.extend_from_slice(&other.0);
        ByteToken(Arc::from(joined))
    }

    /// The token's bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the token. Always at least 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<[u8]> for ByteToken {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for ByteToken {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ByteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"{}\"", self.0.escape_ascii())
    }
}

/// One pre-token's current segmentation into tokens.
///
/// Words are map keys during training, so identity is the full token sequence.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Word(Vec<ByteToken>);

impl Word {
    /// Split raw bytes into one single-byte token per byte.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|&b| ByteToken::from_byte(b)).collect())
    }

    /// Build a word from an explicit token sequence.
    pub fn from_tokens(tokens: Vec<ByteToken>) -> Self {
        Self(tokens)
    }

    #[inline]
    pub fn tokens(&self) -> &[ByteToken] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adjacent pairs, left to right, with repetition.
    pub fn pairs(&self) -> impl Iterator<Item = Pair> + '_ {
        self.0.windows(2).map(|w| (w[0].clone(), w[1].clone()))
    }

    /// Replace every non-overlapping occurrence of the rule's pair.
    ///
    /// Single greedy pass from the left: once two tokens are joined, the
    /// result is not considered again in the same pass. Returns the number
    /// of replacements made.
    pub fn merge_in_place(&mut self, rule: &MergeRule) -> usize {
        let tokens = &mut self.0;
        let len = tokens.len();
        let mut write = 0;
        let mut read = 0;
        let mut merged = 0;

        while read < len {
            if read + 1 < len && tokens[read] == rule.left && tokens[read + 1] == rule.right {
                tokens[write] = rule.merged.clone();
                read += 2;
                merged += 1;
            } else {
                // write <= read, so the slot at `read` is never visited again.
                tokens.swap(write, read);
                read += 1;
            }
            write += 1;
        }

        tokens.truncate(write);
        merged
    }

    /// Copying variant of [`Word::merge_in_place`].
    pub fn merged(&self, rule: &MergeRule) -> Word {
        let mut word = self.clone();
        word.merge_in_place(rule);
        word
    }

    /// Concatenated bytes of all tokens.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|t| t.as_bytes().iter().copied()).collect()
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
