//! BPE trainer implementation.
//!
//! Training runs in two phases. Pre-tokenization fans the corpus out over a
//! worker pool and sums the per-range counts. The merge loop then runs on a
//! single thread: it repeatedly takes the most frequent adjacent pair from the
//! [`PairIndex`], records it as the next merge rule and rewrites only the
//! words that contained it.

use super::counter::FrequencyTable;
use super::pair_index::PairIndex;
use super::parallel;
use super::partition::find_chunk_boundaries;
use bytebpe_core::{
    LineEndings, MergeRule, MergeRules, Normalizer, PreTokenCounts, PreTokenizer, Result,
    TokenizerError, Vocabulary, BYTE_VOCAB_SIZE,
};
use log::{debug, info, warn};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

/// Default end-of-text special token
pub const DEFAULT_SPECIAL_TOKEN: &str = "<|endoftext|>";

/// Merges between progress log lines
const PROGRESS_INTERVAL: usize = 100;

/// Configuration for BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingConfig {
    /// Target vocabulary size, special tokens and the 256 bytes included
    pub vocab_size: usize,
    /// Special tokens in ID order
    pub special_tokens: Vec<String>,
    /// Number of pre-tokenization workers
    pub num_workers: usize,
    /// Special token that partition boundaries snap to; defaults to the
    /// first special token that is safe to cut at
    pub boundary_token: Option<String>,
    /// Whether CRLF and CR are rewritten to LF before counting
    pub normalize_line_endings: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 10_000,
            special_tokens: vec![DEFAULT_SPECIAL_TOKEN.to_string()],
            num_workers: rayon::current_num_threads(),
            boundary_token: None,
            normalize_line_endings: true,
        }
    }
}

impl TrainingConfig {
    /// Start a builder from the defaults.
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }

    /// Smallest valid vocabulary size: special tokens plus all bytes.
    pub fn min_vocab_size(&self) -> usize {
        BYTE_VOCAB_SIZE + self.special_tokens.len()
    }

    /// Number of merges the loop will attempt.
    pub fn num_merges(&self) -> usize {
        self.vocab_size.saturating_sub(self.min_vocab_size())
    }

    /// The partition marker, if any.
    ///
    /// Without an explicit `boundary_token` this is the first special token
    /// that [`is_safe_marker`](Self::is_safe_marker) accepts. `None` means the
    /// corpus is counted as a single range.
    pub fn boundary_marker(&self) -> Option<&str> {
        match &self.boundary_token {
            Some(token) => Some(token.as_str()),
            None => self
                .special_tokens
                .iter()
                .map(String::as_str)
                .find(|token| self.is_safe_marker(token)),
        }
    }

    /// Whether a range may start at every occurrence of `marker`.
    ///
    /// No special token occurrence may begin before the marker and run into
    /// it, so no special token may contain the marker past its first byte or
    /// end on a proper prefix of it. This includes the marker overlapping
    /// itself. A leading LF is also refused when line endings are normalized,
    /// since the cut could split a CRLF pair.
    pub fn is_safe_marker(&self, marker: &str) -> bool {
        let marker = marker.as_bytes();
        if marker.is_empty() || (self.normalize_line_endings && marker[0] == b'\n') {
            return false;
        }

        self.special_tokens.iter().all(|special| {
            let special = special.as_bytes();
            (1..special.len()).all(|i| {
                let tail = &special[i..];
                !marker.starts_with(tail) && !tail.starts_with(marker)
            })
        })
    }

    /// Check the configuration before any corpus work.
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(TokenizerError::InvalidConfig(
                "num_workers must be at least 1".to_string(),
            ));
        }

        for (i, token) in self.special_tokens.iter().enumerate() {
            if token.is_empty() {
                return Err(TokenizerError::InvalidConfig(
                    "Special tokens must not be empty".to_string(),
                ));
            }
            if self.special_tokens[..i].contains(token) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "Duplicate special token: {token:?}"
                )));
            }
        }

        if let Some(token) = &self.boundary_token {
            if !self.special_tokens.contains(token) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "boundary_token {token:?} is not one of the special tokens"
                )));
            }
            if !self.is_safe_marker(token) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "boundary_token {token:?} can occur inside a special token"
                )));
            }
        }

        if self.vocab_size < self.min_vocab_size() {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab_size {} is below the minimum {} (256 bytes + {} special tokens)",
                self.vocab_size,
                self.min_vocab_size(),
                self.special_tokens.len()
            )));
        }

        Ok(())
    }

    fn normalizer(&self) -> Normalizer {
        if self.normalize_line_endings {
            Normalizer::new(LineEndings::Unix)
        } else {
            Normalizer::preserve()
        }
    }
}

/// Builder for [`TrainingConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    pub fn vocab_size(mut self, vocab_size: usize) -> Self {
        self.config.vocab_size = vocab_size;
        self
    }

    /// Replace the special tokens.
    pub fn special_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.special_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.config.num_workers = num_workers;
        self
    }

    pub fn boundary_token(mut self, token: impl Into<String>) -> Self {
        self.config.boundary_token = Some(token.into());
        self
    }

    pub fn normalize_line_endings(mut self, normalize: bool) -> Self {
        self.config.normalize_line_endings = normalize;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<TrainingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Output of training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainedModel {
    pub vocab: Vocabulary,
    pub merges: MergeRules,
    pub special_tokens: Vec<String>,
}

impl TrainedModel {
    /// The longest learned token, by byte length.
    ///
    /// Special tokens are not considered. Among equally long tokens the one
    /// learned first wins.
    pub fn longest_token(&self) -> Option<&[u8]> {
        self.merges
            .iter()
            .map(|rule| rule.merged.as_bytes())
            .fold(None, |best: Option<&[u8]>, bytes| match best {
                Some(b) if b.len() >= bytes.len() => Some(b),
                _ => Some(bytes),
            })
    }
}

/// BPE trainer.
///
/// Learns merge rules from a corpus by iteratively merging the most frequent
/// adjacent byte-token pair.
#[derive(Debug, Clone)]
pub struct BpeTrainer {
    config: TrainingConfig,
    pre_tokenizer: PreTokenizer,
}

impl BpeTrainer {
    /// Create a trainer, validating the configuration.
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let pre_tokenizer = PreTokenizer::new(&config.special_tokens, config.normalizer())?;
        Ok(Self {
            config,
            pre_tokenizer,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on a corpus file.
    pub fn train_from_file(&self, path: impl AsRef<Path>) -> Result<TrainedModel> {
        let counts = self.pre_tokenize_file(path.as_ref())?;
        self.train_from_counts(counts)
    }

    /// Train on an in-memory corpus.
    pub fn train_from_bytes(&self, corpus: &[u8]) -> Result<TrainedModel> {
        let counts = self.pre_tokenize_bytes(corpus)?;
        self.train_from_counts(counts)
    }

    /// Train on text.
    pub fn train(&self, text: &str) -> Result<TrainedModel> {
        self.train_from_bytes(text.as_bytes())
    }

    /// Train on pre-token counts gathered elsewhere.
    pub fn train_from_counts(&self, counts: PreTokenCounts) -> Result<TrainedModel> {
        let table = FrequencyTable::from_pre_tokens(counts);
        let merges = self.learn_merges(table);
        let vocab = Vocabulary::build(&self.config.special_tokens, &merges);

        info!(
            "Training complete: {} merges, vocabulary size {}",
            merges.len(),
            vocab.len()
        );

        Ok(TrainedModel {
            vocab,
            merges,
            special_tokens: self.config.special_tokens.clone(),
        })
    }

    /// Count pre-tokens of a corpus file in parallel.
    pub fn pre_tokenize_file(&self, path: &Path) -> Result<PreTokenCounts> {
        let start = Instant::now();
        let boundaries = match self.partition_marker() {
            Some(marker) => {
                let mut file = File::open(path).map_err(|e| TokenizerError::io(path, e))?;
                find_chunk_boundaries(&mut file, self.config.num_workers, marker)
                    .map_err(|e| TokenizerError::io(path, e))?
            }
            None => {
                let size = std::fs::metadata(path)
                    .map_err(|e| TokenizerError::io(path, e))?
                    .len();
                vec![0, size]
            }
        };

        info!(
            "Pre-tokenizing {} ({} bytes) in {} ranges",
            path.display(),
            boundaries.last().copied().unwrap_or(0),
            boundaries.len().saturating_sub(1)
        );

        let pool = parallel::build_pool(self.config.num_workers)?;
        let counts = parallel::count_file_ranges(&pool, path, &boundaries, &self.pre_tokenizer)?;

        info!(
            "Pre-tokenization done: {} unique pre-tokens in {:.2?}",
            counts.len(),
            start.elapsed()
        );
        Ok(counts)
    }

    /// Count pre-tokens of an in-memory corpus in parallel.
    pub fn pre_tokenize_bytes(&self, corpus: &[u8]) -> Result<PreTokenCounts> {
        let start = Instant::now();
        let boundaries = match self.partition_marker() {
            Some(marker) => {
                find_chunk_boundaries(&mut Cursor::new(corpus), self.config.num_workers, marker)
                    .map_err(|e| TokenizerError::Training(format!("Partitioning failed: {e}")))?
            }
            None => vec![0, corpus.len() as u64],
        };

        info!(
            "Pre-tokenizing {} bytes in {} ranges",
            corpus.len(),
            boundaries.len().saturating_sub(1)
        );

        let pool = parallel::build_pool(self.config.num_workers)?;
        let counts = parallel::count_slice_ranges(&pool, corpus, &boundaries, &self.pre_tokenizer)?;

        info!(
            "Pre-tokenization done: {} unique pre-tokens in {:.2?}",
            counts.len(),
            start.elapsed()
        );
        Ok(counts)
    }

    /// Run the merge loop over a frequency table.
    ///
    /// Stops early, without error, when no adjacent pair is left.
    pub fn learn_merges(&self, mut table: FrequencyTable) -> MergeRules {
        let start = Instant::now();
        let num_merges = self.config.num_merges();
        let mut merges = MergeRules::with_capacity(num_merges);

        info!(
            "Learning up to {} merges from {} unique words",
            num_merges,
            table.len()
        );

        let mut index = PairIndex::from_table(&table);

        while merges.len() < num_merges {
            let Some((pair, frequency)) = index.best_pair() else {
                warn!(
                    "No pairs left after {} merges; vocabulary is smaller than requested",
                    merges.len()
                );
                break;
            };

            let rule = MergeRule::from(pair);
            let affected = index.retire(&rule.pair());

            for word in affected {
                let Some(count) = table.remove(&word) else {
                    continue;
                };
                index.unregister(&word, count);

                let merged = word.merged(&rule);
                index.register(&merged, count);
                table.add(merged, count);
            }

            let rank = merges.push(rule);
            if (rank as usize + 1) % PROGRESS_INTERVAL == 0 {
                debug!(
                    "Merge {}/{}: frequency {}, {} pairs indexed",
                    rank + 1,
                    num_merges,
                    frequency,
                    index.len()
                );
            }
        }

        info!(
            "Learned {} merges in {:.2?}",
            merges.len(),
            start.elapsed()
        );
        merges
    }

    fn partition_marker(&self) -> Option<&[u8]> {
        if self.config.num_workers < 2 {
            return None;
        }
        self.config.boundary_marker().map(str::as_bytes)
    }
}
