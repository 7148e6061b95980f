//! Bytebpe-training - Byte-level BPE training
//!
//! This crate learns an ordered list of merge rules, and the vocabulary they
//! induce, from a text corpus.
//!
//! # Features
//!
//! - Corpus partitioning aligned to a boundary token, so ranges can be
//!   pre-tokenized independently
//! - Parallel pre-token counting on a dedicated thread pool
//! - Incremental pair index: each merge only touches the words containing
//!   the winning pair
//! - Deterministic tie-breaking, independent of worker count
//!
//! # Example
//!
//! ```rust
//! use bytebpe_training::{BpeTrainer, TrainingConfig};
//!
//! let config = TrainingConfig::builder()
//!     .vocab_size(259)
//!     .special_tokens(Vec::<String>::new())
//!     .build()?;
//!
//! let trainer = BpeTrainer::new(config)?;
//! let model = trainer.train("low low low low low lowest widest widest")?;
//! assert_eq!(model.vocab.len(), 259);
//! assert_eq!(model.vocab.get_id(b" low"), Some(258));
//! # Ok::<(), bytebpe_training::TokenizerError>(())
//! ```

pub use bytebpe_core::{Result, TokenizerError};

// Training infrastructure
pub mod training;
pub use training::{
    find_chunk_boundaries, par_map_reduce, BpeTrainer, FrequencyTable, PairIndex, TrainedModel,
    TrainingConfig, TrainingConfigBuilder, DEFAULT_SPECIAL_TOKEN,
};
