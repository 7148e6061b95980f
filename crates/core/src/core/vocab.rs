//! Vocabulary storage and lookup.
//!
//! IDs are dense and assigned in a fixed order: special tokens first (in the
//! caller's order), then the 256 single bytes, then one entry per merge rule
//! in rank order.

use crate::core::merges::MergeRules;
use crate::core::token::ByteToken;
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;

/// Number of single-byte base tokens.
pub const BYTE_VOCAB_SIZE: usize = 256;

/// Reverse mapping: token bytes -> ID
pub type Vocab = AHashMap<ByteToken, u32>;

/// Bijection between IDs `[0, N)` and byte tokens.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Forward mapping: ID -> token bytes
    tokens: Vec<ByteToken>,
    /// Reverse mapping. When two IDs share bytes the lower ID wins.
    ids: Vocab,
    /// Special token IDs (cached for fast access)
    special: SpecialTokens,
}

impl Vocabulary {
    /// Build the vocabulary for a trained model.
    ///
    /// Pure function of the special tokens and the merge list. The result
    /// always has `special_tokens.len() + 256 + merges.len()` entries.
    pub fn build<S: AsRef<str>>(special_tokens: &[S], merges: &MergeRules) -> Self {
        let capacity = special_tokens.len() + BYTE_VOCAB_SIZE + merges.len();
        let mut tokens = Vec::with_capacity(capacity);
        let mut special = SpecialTokens::default();

        for name in special_tokens {
            let name = name.as_ref();
            // Empty names are rejected by configuration validation; skip
            // rather than store an empty token.
            if let Some(token) = ByteToken::new(name.as_bytes()) {
                special.insert(name, tokens.len() as u32);
                tokens.push(token);
            }
        }

        tokens.extend((0..=255u8).map(ByteToken::from_byte));
        tokens.extend(merges.iter().map(|rule| rule.merged.clone()));

        Self::from_parts(tokens, special)
    }

    /// Rebuild a vocabulary from an ID-ordered token list.
    ///
    /// The first `special_tokens.len()` entries must hold the special tokens'
    /// bytes, in order.
    pub fn from_tokens<S: AsRef<str>>(tokens: Vec<ByteToken>, special_tokens: &[S]) -> Result<Self> {
        let mut special = SpecialTokens::default();

        for (id, name) in special_tokens.iter().enumerate() {
            let name = name.as_ref();
            match tokens.get(id) {
                Some(token) if token.as_bytes() == name.as_bytes() => {
                    special.insert(name, id as u32);
                }
                _ => {
                    return Err(TokenizerError::InvalidConfig(format!(
                        "special token {:?} is not stored at ID {}",
                        name, id
                    )))
                }
            }
        }

        Ok(Self::from_parts(tokens, special))
    }

    fn from_parts(tokens: Vec<ByteToken>, special: SpecialTokens) -> Self {
        let mut ids = Vocab::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            ids.entry(token.clone()).or_insert(id as u32);
        }
        Self {
            tokens,
            ids,
            special,
        }
    }

    /// Get the ID for a byte sequence.
    #[inline]
    pub fn get_id(&self, bytes: &[u8]) -> Option<u32> {
        self.ids.get(bytes).copied()
    }

    /// Get the token for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&ByteToken> {
        self.tokens.get(id as usize)
    }

    /// ID of the single-byte token for `byte`.
    #[inline]
    pub fn byte_id(&self, byte: u8) -> u32 {
        (self.special.len() + byte as usize) as u32
    }

    /// Special token IDs.
    #[inline]
    pub fn special(&self) -> &SpecialTokens {
        &self.special
    }

    /// Iterate `(id, token)` in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ByteToken)> {
        self.tokens.iter().enumerate().map(|(id, t)| (id as u32, t))
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens && self.special == other.special
    }
}

impl Eq for Vocabulary {}

/// Special token names and their reserved IDs, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialTokens {
    entries: Vec<(CompactString, u32)>,
}

impl SpecialTokens {
    fn insert(&mut self, name: &str, id: u32) {
        self.entries.push((CompactString::new(name), id));
    }

    /// Reserved ID for a special token literal.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|&(_, id)| id)
    }

    /// Check if an ID is a special token.
    #[inline]
    pub fn is_special(&self, id: u32) -> bool {
        (id as usize) < self.entries.len()
    }

    /// Special token literals in ID order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::merges::MergeRule;

    fn tok(s: &str) -> ByteToken {
        ByteToken::new(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_build_order() {
        let merges = MergeRules::from_pairs([(tok("o"), tok("w")), (tok("l"), tok("ow"))]);
        let vocab = Vocabulary::build(&["<|endoftext|>", "<pad>"], &merges);

        assert_eq!(vocab.len(), 2 + 256 + 2);
        assert_eq!(vocab.get_id(b"<|endoftext|>"), Some(0));
        assert_eq!(vocab.get_id(b"<pad>"), Some(1));
        assert_eq!(vocab.get_id(&[0u8]), Some(2));
        assert_eq!(vocab.get_id(&[255u8]), Some(257));
        assert_eq!(vocab.get_id(b"ow"), Some(258));
        assert_eq!(vocab.get_id(b"low"), Some(259));
        assert_eq!(vocab.byte_id(b'a'), 2 + b'a' as u32);
    }

    #[test]
    fn test_build_without_merges() {
        let vocab = Vocabulary::build::<&str>(&[], &MergeRules::new());
        assert_eq!(vocab.len(), 256);
        for b in 0..=255u8 {
            assert_eq!(vocab.get_id(&[b]), Some(b as u32));
            assert_eq!(vocab.get_token(b as u32).unwrap().as_bytes(), &[b]);
        }
        assert!(vocab.get_token(256).is_none());
    }

    #[test]
    fn test_duplicate_bytes_resolve_to_lowest_id() {
        let mut merges = MergeRules::new();
        merges.push(MergeRule::new(tok("a"), tok("b")));
        merges.push(MergeRule::new(tok("ab"), tok("c")));
        merges.push(MergeRule::new(tok("a"), tok("bc")));
        let vocab = Vocabulary::build::<&str>(&[], &merges);

        assert_eq!(vocab.len(), 259);
        assert_eq!(vocab.get_id(b"abc"), Some(257));
        assert_eq!(vocab.get_token(258).unwrap(), &tok("abc"));
    }

    #[test]
    fn test_special_tokens() {
        let vocab = Vocabulary::build(&["<bos>", "<eos>"], &MergeRules::new());
        let special = vocab.special();

        assert_eq!(special.get("<bos>"), Some(0));
        assert_eq!(special.get("<eos>"), Some(1));
        assert_eq!(special.get("<unk>"), None);
        assert!(special.is_special(1));
        assert!(!special.is_special(2));
        assert_eq!(special.names().collect::<Vec<_>>(), vec!["<bos>", "<eos>"]);
    }

    #[test]
    fn test_from_tokens_checks_special_positions() {
        let built = Vocabulary::build(&["<s>"], &MergeRules::new());
        let tokens: Vec<ByteToken> = built.iter().map(|(_, t)| t.clone()).collect();

        let rebuilt = Vocabulary::from_tokens(tokens.clone(), &["<s>"]).unwrap();
        assert_eq!(rebuilt, built);

        assert!(Vocabulary::from_tokens(tokens, &["<pad>"]).is_err());
    }
}
