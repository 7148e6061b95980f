//! Bytebpe-core - Core byte-level BPE data structures
//!
//! This crate provides the fundamental data structures for byte-pair encoding
//! (BPE) over raw bytes, shared by training and by the tokenizer.
//!
//! # Features
//!
//! - Content-addressed byte tokens and words, cheap to clone and hash
//! - Ordered merge rules with exact, order-preserving replay
//! - Dense vocabulary: special tokens, the 256 bytes, then one entry per merge
//! - Regex-based pre-tokenization with special-token splitting
//! - Lazy max-priority queue for merge selection
//!
//! # Example
//!
//! ```rust
//! use bytebpe_core::{ByteToken, MergeRules, Vocabulary, Word};
//!
//! let merges = MergeRules::from_pairs([(
//!     ByteToken::from_byte(b'h'),
//!     ByteToken::from_byte(b'i'),
//! )]);
//! let vocab = Vocabulary::build(&["<|endoftext|>"], &merges);
//! assert_eq!(vocab.len(), 1 + 256 + 1);
//!
//! let mut word = Word::from_bytes(b"hi");
//! merges.apply(&mut word);
//! assert_eq!(vocab.get_id(word.tokens()[0].as_bytes()), Some(257));
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

// Core BPE data structures
pub mod core;
pub use core::{
    ByteToken, MergeCandidate, MergeRule, MergeRules, Pair, PairPriorityQueue, SpecialTokens,
    Vocab, Vocabulary, Word, BYTE_VOCAB_SIZE,
};

// Byte <-> printable text mapping
pub mod encoding;

// Pre-tokenization
pub mod pre_tokenizer;
pub use pre_tokenizer::{
    merge_counts, LineEndings, Normalizer, PreTokenCounts, PreTokenizer, Segment, Splitter,
};
