//! Merge rule management for BPE.
//!
//! Merge rules are kept in the order they were learned. The order is part of
//! the model: encoding replays rule 0 over the whole word, then rule 1, and so
//! on, exactly as training applied them.

use crate::core::token::{ByteToken, Pair, Word};
use ahash::AHashMap;

/// A learned instruction: wherever `left` is immediately followed by `right`,
/// replace the two with their concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeRule {
    /// Left operand
    pub left: ByteToken,
    /// Right operand
    pub right: ByteToken,
    /// `left + right`, computed once
    pub merged: ByteToken,
}

impl MergeRule {
    /// Create a merge rule from its two operands.
    pub fn new(left: ByteToken, right: ByteToken) -> Self {
        let merged = left.concat(&right);
        Self {
            left,
            right,
            merged,
        }
    }

    /// The rule's operands as a pair.
    pub fn pair(&self) -> Pair {
        (self.left.clone(), self.right.clone())
    }
}

impl From<Pair> for MergeRule {
    fn from((left, right): Pair) -> Self {
        Self::new(left, right)
    }
}

/// Ordered, append-only list of merge rules with a pair -> rank index.
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    rules: Vec<MergeRule>,
    /// Ranks at which each pair was learned, ascending.
    ranks: AHashMap<Pair, Vec<u32>>,
}

impl MergeRules {
    /// Create a new empty collection of merge rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new collection with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rules: Vec::with_capacity(capacity),
            ranks: AHashMap::with_capacity(capacity),
        }
    }

    /// Append a rule and return its rank.
    pub fn push(&mut self, rule: MergeRule) -> u32 {
        let rank = self.rules.len() as u32;
        self.ranks.entry(rule.pair()).or_default().push(rank);
        self.rules.push(rule);
        rank
    }

    /// Create merge rules from a list of pairs, ranked in iteration order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = Pair>) -> Self {
        let mut rules = Self::new();
        for pair in pairs {
            rules.push(MergeRule::from(pair));
        }
        rules
    }

    /// Rule at the given rank.
    #[inline]
    pub fn get(&self, rank: u32) -> Option<&MergeRule> {
        self.rules.get(rank as usize)
    }

    /// Earliest rank at which the pair was learned.
    pub fn rank_of(&self, left: &ByteToken, right: &ByteToken) -> Option<u32> {
        self.next_rank(left, right, None)
    }

    /// Smallest rank for the pair that comes strictly after `after`.
    fn next_rank(&self, left: &ByteToken, right: &ByteToken, after: Option<u32>) -> Option<u32> {
        let ranks = self.ranks.get(&(left.clone(), right.clone()))?;
        match after {
            None => ranks.first().copied(),
            Some(after) => {
                let idx = ranks.partition_point(|&r| r <= after);
                ranks.get(idx).copied()
            }
        }
    }

    /// Apply every rule, in rank order, to `word`.
    ///
    /// Equivalent to running [`Word::merge_in_place`] for rule 0, then rule 1,
    /// through the last rule. Rules whose pair is absent from the word are
    /// no-ops, so only the next rank present in the word is visited.
    pub fn apply(&self, word: &mut Word) {
        let mut last: Option<u32> = None;

        while word.len() >= 2 {
            let next = word
                .tokens()
                .windows(2)
                .filter_map(|w| self.next_rank(&w[0], &w[1], last))
                .min();

            let Some(rank) = next else {
                break;
            };

            word.merge_in_place(&self.rules[rank as usize]);
            last = Some(rank);
        }
    }

    /// Iterate rules in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, MergeRule> {
        self.rules.iter()
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl PartialEq for MergeRules {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

impl Eq for MergeRules {}

impl<'a> IntoIterator for &'a MergeRules {
    type Item = &'a MergeRule;
    type IntoIter = std::slice::Iter<'a, MergeRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<MergeRule> for MergeRules {
    fn from_iter<I: IntoIterator<Item = MergeRule>>(iter: I) -> Self {
        let mut rules = Self::new();
        for rule in iter {
            rules.push(rule);
        }
        rules
    }
}
