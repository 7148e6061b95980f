//! Load functionality for pre-trained tokenizers.

use super::format::{SerializedTokenizer, FORMAT_VERSION, TOKENIZER_FILE};
use bytebpe_core::encoding::display_to_bytes;
use bytebpe_core::{
    ByteToken, MergeRule, MergeRules, Result, TokenizerError, Vocabulary, BYTE_VOCAB_SIZE,
};
use bytebpe_training::TrainedModel;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Tokenizer loader - handles loading trained models.
pub struct TokenizerLoader;

impl TokenizerLoader {
    /// Load a tokenizer from a directory.
    ///
    /// Expects a `tokenizer.json` file in the given directory.
    pub fn load(path: &Path) -> Result<TrainedModel> {
        let file_path = path.join(TOKENIZER_FILE);
        let file = File::open(&file_path).map_err(|e| {
            TokenizerError::Load(format!(
                "Failed to open file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let reader = BufReader::new(file);
        let serialized: SerializedTokenizer = serde_json::from_reader(reader)
            .map_err(|e| TokenizerError::Load(format!("Failed to deserialize tokenizer: {}", e)))?;

        let model = Self::deserialize(serialized)?;
        info!(
            "Loaded tokenizer ({} tokens, {} merges) from {}",
            model.vocab.len(),
            model.merges.len(),
            file_path.display()
        );
        Ok(model)
    }

    /// Load from a JSON string.
    pub fn from_json(json: &str) -> Result<TrainedModel> {
        let serialized: SerializedTokenizer = serde_json::from_str(json)?;
        Self::deserialize(serialized)
    }

    /// Rebuild and check a model from its serialized form.
    ///
    /// IDs must be dense `[0, N)`, special tokens must occupy the first IDs
    /// in order, the next 256 IDs must hold bytes 0..=255, and each merge must sit at its rank and name the ID of its
    /// result.
    pub fn deserialize(data: SerializedTokenizer) -> Result<TrainedModel> {
        if data.version != FORMAT_VERSION {
            return Err(TokenizerError::Load(format!(
                "Unsupported format version {} (expected {})",
                data.version, FORMAT_VERSION
            )));
        }
        if data.vocab.len() != data.vocab_size {
            return Err(TokenizerError::Load(format!(
                "vocab_size is {} but {} entries are stored",
                data.vocab_size,
                data.vocab.len()
            )));
        }

        let mut tokens = Vec::with_capacity(data.vocab.len());
        for (expected, (id, display)) in data.vocab.iter().enumerate() {
            if *id as usize != expected {
                return Err(TokenizerError::Load(format!(
                    "Token IDs are not dense: expected {}, found {}",
                    expected, id
                )));
            }
            tokens.push(parse_token(display)?);
        }

        let k = data.special_tokens.len();
        let byte_block = tokens.get(k..k + BYTE_VOCAB_SIZE).ok_or_else(|| {
            TokenizerError::Load(format!(
                "Vocabulary has {} entries, fewer than {} specials plus 256 bytes",
                tokens.len(),
                k
            ))
        })?;
        for (byte, token) in byte_block.iter().enumerate() {
            if token.as_bytes() != &[byte as u8][..] {
                return Err(TokenizerError::Load(format!(
                    "ID {} should hold byte {:#04x}, found {:?}",
                    k + byte,
                    byte,
                    token.as_bytes()
                )));
            }
        }

        let vocab = Vocabulary::from_tokens(tokens, &data.special_tokens)
            .map_err(|e| TokenizerError::Load(e.to_string()))?;

        let mut merges = MergeRules::with_capacity(data.merges.len());
        for (rank, merge) in data.merges.iter().enumerate() {
            if merge.rank as usize != rank {
                return Err(TokenizerError::Load(format!(
                    "Merge at position {} has rank {}",
                    rank, merge.rank
                )));
            }

            let rule = MergeRule::new(parse_token(&merge.pair.0)?, parse_token(&merge.pair.1)?);
            match vocab.get_token(merge.new_token_id) {
                Some(token) if *token == rule.merged => {}
                _ => {
                    return Err(TokenizerError::Load(format!(
                        "Merge {} claims ID {}, which does not hold {:?}",
                        rank, merge.new_token_id, rule.merged
                    )))
                }
            }
            merges.push(rule);
        }

        Ok(TrainedModel {
            vocab,
            merges,
            special_tokens: data.special_tokens,
        })
    }
}

fn parse_token(display: &str) -> Result<ByteToken> {
    display_to_bytes(display)
        .and_then(|bytes| ByteToken::new(&bytes))
        .ok_or_else(|| TokenizerError::Load(format!("Invalid token string {:?}", display)))
}
