//! Bytebpe-tokenizer - Encode and decode with a trained byte-level BPE model
//!
//! This crate wraps a trained vocabulary and merge list in a [`Tokenizer`]
//! and stores trained models as a single JSON artifact.
//!
//! # Features
//!
//! - Exact round-trip: `decode(encode(text)) == text`
//! - Special tokens encode to one reserved ID, longest literal first
//! - Lazy encoding over a stream of text chunks
//! - Parallel batch encoding
//! - Lossless JSON artifacts, including tokens that are not valid UTF-8
//!
//! # Example
//!
//! ```rust
//! use bytebpe_tokenizer::Tokenizer;
//! use bytebpe_training::{BpeTrainer, TrainingConfig};
//!
//! let config = TrainingConfig::builder().vocab_size(300).build()?;
//! let model = BpeTrainer::new(config)?.train("hello world<|endoftext|>hello there")?;
//! let tokenizer = Tokenizer::from_trained(model)?;
//!
//! let ids = tokenizer.encode("hello<|endoftext|>world")?;
//! assert!(ids.contains(&0));
//! assert_eq!(tokenizer.decode(&ids)?, "hello<|endoftext|>world");
//! # Ok::<(), bytebpe_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use bytebpe_core::{Result, TokenizerError};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{EncodeStream, Tokenizer};

// IO/Serialization
pub mod io;
pub use io::{TokenizerLoader, TokenizerSaver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
