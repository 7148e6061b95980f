//! Format definitions for tokenizer serialization.
//!
//! A trained tokenizer is stored as one `tokenizer.json`. Token bytes are
//! written through the byte-level display mapping (byte `b` becomes the
//! character `U+0100 + b`), so tokens that are not valid UTF-8 survive JSON
//! unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

/// File name inside a tokenizer directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Merge rule for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedMerge {
    /// The pair of tokens being merged, as display strings
    pub pair: (String, String),
    /// Position in the merge list
    pub rank: u32,
    /// The ID this merge created
    pub new_token_id: u32,
}

/// Complete tokenizer serialization format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedTokenizer {
    /// Format version
    pub version: u32,
    /// Total number of tokens
    pub vocab_size: usize,
    /// Special tokens in ID order
    pub special_tokens: Vec<String>,
    /// ID -> token display string
    pub vocab: BTreeMap<u32, String>,
    /// Merge rules in training order
    pub merges: Vec<SerializedMerge>,
}
