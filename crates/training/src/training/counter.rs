//! Word frequency table for BPE training.
//!
//! Each distinct pre-token becomes one [`Word`] with its occurrence count. The
//! merge loop rewrites words in place of their old segmentation, so the table
//! is keyed by the current token sequence.

use ahash::AHashMap;
use bytebpe_core::{Pair, PreTokenCounts, Word};

/// Word -> occurrence count. Counts are always positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    words: AHashMap<Word, u64>,
}

impl FrequencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial table: one single-byte word per pre-token.
    pub fn from_pre_tokens(counts: PreTokenCounts) -> Self {
        let mut table = Self {
            words: AHashMap::with_capacity(counts.len()),
        };
        for (piece, count) in counts {
            table.add(Word::from_bytes(piece.as_bytes()), count);
        }
        table
    }

    /// Add occurrences of a word. Zero counts and empty words are ignored.
    pub fn add(&mut self, word: Word, count: u64) {
        if count == 0 || word.is_empty() {
            return;
        }
        *self.words.entry(word).or_insert(0) += count;
    }

    /// Remove a word, returning its count.
    pub fn remove(&mut self, word: &Word) -> Option<u64> {
        self.words.remove(word)
    }

    /// Get the count of a word.
    pub fn get(&self, word: &Word) -> Option<u64> {
        self.words.get(word).copied()
    }

    /// Iterate `(word, count)` entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Word, u64)> {
        self.words.iter().map(|(w, &c)| (w, c))
    }

    /// Get the number of unique words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Count all adjacent pairs from scratch.
    ///
    /// This is the full re-scan the pair index exists to avoid; it is kept
    /// to cross-check the index.
    pub fn count_pairs(&self) -> AHashMap<Pair, u64> {
        let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();

        for (word, &count) in &self.words {
            for pair in word.pairs() {
                *pair_counts.entry(pair).or_insert(0) += count;
            }
        }

        pair_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytebpe_core::ByteToken;

    fn counts(entries: &[(&str, u64)]) -> PreTokenCounts {
        entries.iter().map(|&(s, c)| (s.to_string(), c)).collect()
    }

    fn pair(a: u8, b: u8) -> Pair {
        (ByteToken::from_byte(a), ByteToken::from_byte(b))
    }

    #[test]
    fn test_from_pre_tokens() {
        let table = FrequencyTable::from_pre_tokens(counts(&[("ab", 3), (" c", 1)]));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Word::from_bytes(b"ab")), Some(3));
        assert_eq!(table.get(&Word::from_bytes(b" c")), Some(1));
    }

    #[test]
    fn test_add_accumulates_and_ignores_zero() {
        let mut table = FrequencyTable::new();
        table.add(Word::from_bytes(b"ab"), 2);
        table.add(Word::from_bytes(b"ab"), 3);
        table.add(Word::from_bytes(b"cd"), 0);
        table.add(Word::default(), 4);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&Word::from_bytes(b"ab")), Some(5));
        assert_eq!(table.remove(&Word::from_bytes(b"ab")), Some(5));
        assert!(table.is_empty());
    }

    #[test]
    fn test_count_pairs_with_frequency() {
        let table = FrequencyTable::from_pre_tokens(counts(&[("abc", 1), ("bcd", 2), ("aaa", 1)]));
        let pairs = table.count_pairs();

        assert_eq!(pairs.get(&pair(b'a', b'b')), Some(&1));
        assert_eq!(pairs.get(&pair(b'b', b'c')), Some(&3));
        assert_eq!(pairs.get(&pair(b'c', b'd')), Some(&2));
        // Repeated pairs inside one word count once per occurrence.
        assert_eq!(pairs.get(&pair(b'a', b'a')), Some(&2));
    }
}
