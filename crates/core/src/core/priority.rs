//! Priority queue for BPE merge candidates.
//!
//! Training needs the most frequent pair after every merge. Counts change for
//! many pairs at once, so the queue is lazy: updates push a fresh entry and the
//! superseded ones are discarded when they reach the top.

use crate::core::token::Pair;
use ahash::AHashMap;
use dary_heap::OctonaryHeap;

/// A merge candidate during BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of tokens to merge
    pub pair: Pair,
    /// The frequency/count of this pair
    pub count: u64,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(pair: Pair, count: u64) -> Self {
        Self { pair, count }
    }
}

// Higher count first; equal counts go to the byte-wise greater pair.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.pair.cmp(&other.pair))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge operations.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
#[derive(Default)]
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Track current counts to detect stale entries
    current_counts: AHashMap<Pair, u64>,
}

impl PairPriorityQueue {
    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the count for a pair and push an entry for it.
    ///
    /// Any earlier entry for the pair becomes stale.
    pub fn update(&mut self, pair: Pair, count: u64) {
        if self.current_counts.get(&pair) == Some(&count) {
            return;
        }
        self.current_counts.insert(pair.clone(), count);
        self.heap.push(MergeCandidate::new(pair, count));
    }

    /// Drop a pair from the queue. Its heap entries become stale.
    pub fn remove(&mut self, pair: &Pair) {
        self.current_counts.remove(pair);
    }

    /// Peek at the highest priority live candidate.
    ///
    /// Stale entries found on top are discarded along the way.
    pub fn peek(&mut self) -> Option<&MergeCandidate> {
        while let Some(top) = self.heap.peek() {
            if self.current_counts.get(&top.pair) == Some(&top.count) {
                break;
            }
            self.heap.pop();
        }
        self.heap.peek()
    }
}
