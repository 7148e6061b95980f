//! Core BPE data structures.
//!
//! This module contains the byte-level token types, the ordered merge list,
//! the vocabulary and the priority queue used to pick merges.

pub mod merges;
pub mod priority;
pub mod token;
pub mod vocab;

pub use merges::{MergeRule, MergeRules};
pub use priority::{MergeCandidate, PairPriorityQueue};
pub use token::{ByteToken, Pair, Word};
pub use vocab::{SpecialTokens, Vocab, Vocabulary, BYTE_VOCAB_SIZE};
