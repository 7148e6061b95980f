//! Incremental pair-frequency index.
//!
//! The index answers "which adjacent pair is most frequent right now?" after
//! every merge without re-scanning the corpus. It keeps two maps in lockstep:
//! pair -> aggregate frequency, and pair -> the words containing it. Both are
//! only ever changed together, by [`PairIndex::register`],
//! [`PairIndex::unregister`] and [`PairIndex::retire`].
//!
//! Invariant: for every indexed pair, its frequency equals the sum over the
//! words in its set of `count(word) * occurrences(pair, word)`, and is
//! positive. Pairs with zero frequency or no words are not indexed.

use super::counter::FrequencyTable;
use ahash::{AHashMap, AHashSet};
use bytebpe_core::{Pair, PairPriorityQueue, Word};

/// Pair -> (frequency, containing words), with a max-queue over frequency.
#[derive(Default)]
pub struct PairIndex {
    frequencies: AHashMap<Pair, u64>,
    words: AHashMap<Pair, AHashSet<Word>>,
    queue: PairPriorityQueue,
    /// Pairs whose frequency changed since the queue was last synced
    dirty: AHashSet<Pair>,
}

impl PairIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every word of a frequency table.
    pub fn from_table(table: &FrequencyTable) -> Self {
        let mut index = Self::new();
        for (word, count) in table.iter() {
            index.register(word, count);
        }
        index
    }

    /// Add `count` to every pair the word forms and record the word under it.
    pub fn register(&mut self, word: &Word, count: u64) {
        if count == 0 {
            return;
        }

        for (pair, occurrences) in pair_occurrences(word) {
            *self.frequencies.entry(pair.clone()).or_insert(0) += count * occurrences;

            let words = self.words.entry(pair.clone()).or_default();
            if !words.contains(word) {
                words.insert(word.clone());
            }

            self.dirty.insert(pair);
        }
    }

    /// Remove a word's contribution from every pair it forms.
    ///
    /// Pairs left with zero frequency or no words are dropped from both maps.
    pub fn unregister(&mut self, word: &Word, count: u64) {
        for (pair, occurrences) in pair_occurrences(word) {
            let exhausted_frequency = match self.frequencies.get_mut(&pair) {
                Some(frequency) => {
                    *frequency = frequency.saturating_sub(count * occurrences);
                    *frequency == 0
                }
                None => true,
            };

            let exhausted_words = match self.words.get_mut(&pair) {
                Some(words) => {
                    words.remove(word);
                    words.is_empty()
                }
                None => true,
            };

            if exhausted_frequency || exhausted_words {
                self.frequencies.remove(&pair);
                self.words.remove(&pair);
            }

            self.dirty.insert(pair);
        }
    }

    /// The most frequent pair and its frequency.
    ///
    /// Ties go to the pair whose bytes compare greatest, left token first.
    /// Returns `None` when no pair is indexed.
    pub fn best_pair(&mut self) -> Option<(Pair, u64)> {
        for pair in self.dirty.drain() {
            match self.frequencies.get(&pair) {
                Some(&frequency) => self.queue.update(pair, frequency),
                None => self.queue.remove(&pair),
            }
        }

        self.queue.peek().map(|c| (c.pair.clone(), c.count))
    }

    /// Drop a pair from the index and hand back the words that contained it.
    pub fn retire(&mut self, pair: &Pair) -> AHashSet<Word> {
        self.frequencies.remove(pair);
        self.queue.remove(pair);
        self.dirty.remove(pair);
        self.words.remove(pair).unwrap_or_default()
    }

    /// Current frequency of a pair.
    pub fn frequency(&self, pair: &Pair) -> Option<u64> {
        self.frequencies.get(pair).copied()
    }

    /// Words currently containing a pair.
    pub fn words_containing(&self, pair: &Pair) -> Option<&AHashSet<Word>> {
        self.words.get(pair)
    }

    /// Number of indexed pairs.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Check if no pair is indexed.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Distinct pairs of a word with their occurrence counts.
fn pair_occurrences(word: &Word) -> AHashMap<Pair, u64> {
    let mut occurrences = AHashMap::with_capacity(word.len().saturating_sub(1));
    for pair in word.pairs() {
        *occurrences.entry(pair).or_insert(0) += 1;
    }
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytebpe_core::{ByteToken, MergeRule, PreTokenCounts};

    fn tok(s: &str) -> ByteToken {
        ByteToken::new(s.as_bytes()).unwrap()
    }

    fn pair(a: &str, b: &str) -> Pair {
        (tok(a), tok(b))
    }

    fn table(entries: &[(&str, u64)]) -> FrequencyTable {
        let counts: PreTokenCounts = entries.iter().map(|&(s, c)| (s.to_string(), c)).collect();
        FrequencyTable::from_pre_tokens(counts)
    }

    /// The index must agree with a full re-count of the table.
    fn assert_consistent(index: &PairIndex, table: &FrequencyTable) {
        let expected = table.count_pairs();
        assert_eq!(index.len(), expected.len());

        for (pair, &frequency) in &expected {
            assert_eq!(index.frequency(pair), Some(frequency), "pair {pair:?}");
            let words = index.words_containing(pair).unwrap();
            let sum: u64 = words
                .iter()
                .map(|w| table.get(w).unwrap() * w.pairs().filter(|p| p == pair).count() as u64)
                .sum();
            assert_eq!(sum, frequency);
        }
    }

    #[test]
    fn test_register_builds_frequencies() {
        let table = table(&[("low", 1), (" low", 4)]);
        let index = PairIndex::from_table(&table);

        assert_eq!(index.frequency(&pair("l", "o")), Some(5));
        assert_eq!(index.frequency(&pair("o", "w")), Some(5));
        assert_eq!(index.frequency(&pair(" ", "l")), Some(4));
        assert_eq!(index.words_containing(&pair("l", "o")).unwrap().len(), 2);
        assert_consistent(&index, &table);
    }

    #[test]
    fn test_best_pair_tie_break() {
        let table = table(&[("low", 1), (" low", 4), (" lowest", 1)]);
        let mut index = PairIndex::from_table(&table);

        // (l, o) and (o, w) both have 6; "o" > "l" byte-wise.
        assert_eq!(index.best_pair(), Some((pair("o", "w"), 6)));
    }

    #[test]
    fn test_best_pair_empty() {
        let mut index = PairIndex::from_table(&table(&[("a", 10), ("b", 3)]));
        assert!(index.is_empty());
        assert_eq!(index.best_pair(), None);
    }

    #[test]
    fn test_unregister_removes_exhausted_pairs() {
        let table = table(&[("ab", 2), ("abc", 1)]);
        let mut index = PairIndex::from_table(&table);

        index.unregister(&Word::from_bytes(b"abc"), 1);
        assert_eq!(index.frequency(&pair("a", "b")), Some(2));
        assert_eq!(index.frequency(&pair("b", "c")), None);
        assert!(index.words_containing(&pair("b", "c")).is_none());
        assert_eq!(index.best_pair(), Some((pair("a", "b"), 2)));
    }

    #[test]
    fn test_unregister_repeated_pair() {
        let table = table(&[("aaa", 3)]);
        let mut index = PairIndex::from_table(&table);
        assert_eq!(index.frequency(&pair("a", "a")), Some(6));

        index.unregister(&Word::from_bytes(b"aaa"), 3);
        assert!(index.is_empty());
        assert_eq!(index.best_pair(), None);
    }

    #[test]
    fn test_retire_and_rewrite_keeps_index_consistent() {
        let mut table = table(&[("low", 1), (" low", 4), (" lowest", 1), (" widest", 2)]);
        let mut index = PairIndex::from_table(&table);

        for _ in 0..3 {
            let (best, _) = index.best_pair().unwrap();
            let rule = MergeRule::from(best.clone());

            for word in index.retire(&best) {
                let count = table.remove(&word).unwrap();
                index.unregister(&word, count);
                let merged = word.merged(&rule);
                index.register(&merged, count);
                table.add(merged, count);
            }

            assert!(index.frequency(&best).is_none());
            assert_consistent(&index, &table);
        }
    }

    #[test]
    fn test_retire_unknown_pair() {
        let mut index = PairIndex::new();
        assert!(index.retire(&pair("x", "y")).is_empty());
    }
}
