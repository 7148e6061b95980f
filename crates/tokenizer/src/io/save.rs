//! Save functionality for trained tokenizers.

use super::format::{SerializedMerge, SerializedTokenizer, FORMAT_VERSION, TOKENIZER_FILE};
use bytebpe_core::encoding::bytes_to_display;
use bytebpe_core::{MergeRules, Result, TokenizerError, Vocabulary, BYTE_VOCAB_SIZE};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Tokenizer saver - handles saving trained models.
pub struct TokenizerSaver<'a> {
    /// Vocabulary reference
    vocab: &'a Vocabulary,
    /// Merge rules reference
    merges: &'a MergeRules,
    /// Special tokens in ID order
    special_tokens: &'a [String],
}

impl<'a> TokenizerSaver<'a> {
    /// Create a new tokenizer saver.
    pub fn new(vocab: &'a Vocabulary, merges: &'a MergeRules, special_tokens: &'a [String]) -> Self {
        Self {
            vocab,
            merges,
            special_tokens,
        }
    }

    /// Save the tokenizer to a directory.
    ///
    /// Creates the directory if needed and writes a single `tokenizer.json`.
    /// Returns the path of the written file.
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(path).map_err(|e| {
            TokenizerError::Save(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })?;

        let file_path = path.join(TOKENIZER_FILE);
        let file = File::create(&file_path).map_err(|e| {
            TokenizerError::Save(format!(
                "Failed to create file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.serialize())
            .map_err(|e| TokenizerError::Save(format!("Failed to serialize tokenizer: {}", e)))?;
        writer
            .flush()
            .map_err(|e| TokenizerError::io(&file_path, e))?;

        info!(
            "Saved tokenizer ({} tokens, {} merges) to {}",
            self.vocab.len(),
            self.merges.len(),
            file_path.display()
        );
        Ok(file_path)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.serialize())?)
    }

    /// Serialize the tokenizer to a structure.
    pub fn serialize(&self) -> SerializedTokenizer {
        let vocab = self
            .vocab
            .iter()
            .map(|(id, token)| (id, bytes_to_display(token.as_bytes())))
            .collect();

        let first_merge_id = (self.special_tokens.len() + BYTE_VOCAB_SIZE) as u32;
        let merges = self
            .merges
            .iter()
            .enumerate()
            .map(|(rank, rule)| SerializedMerge {
                pair: (
                    bytes_to_display(rule.left.as_bytes()),
                    bytes_to_display(rule.right.as_bytes()),
                ),
                rank: rank as u32,
                new_token_id: first_merge_id + rank as u32,
            })
            .collect();

        SerializedTokenizer {
            version: FORMAT_VERSION,
            vocab_size: self.vocab.len(),
            special_tokens: self.special_tokens.to_vec(),
            vocab,
            merges,
        }
    }
}
