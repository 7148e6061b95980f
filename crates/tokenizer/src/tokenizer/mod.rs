//! Main tokenizer implementation.
//!
//! A [`Tokenizer`] wraps a trained vocabulary, its ordered merge rules and the
//! special tokens. It is immutable after construction, so one instance can
//! serve any number of threads.

pub mod stream;

pub use stream::EncodeStream;

use crate::io::{TokenizerLoader, TokenizerSaver};
use bytebpe_core::pre_tokenizer::pre_tokens;
use bytebpe_core::{
    MergeRules, Result, Segment, Splitter, TokenizerError, Vocabulary, Word,
};
use bytebpe_training::TrainedModel;
use log::debug;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Byte-level BPE tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Vocabulary
    vocab: Arc<Vocabulary>,
    /// Merge rules, in training order
    merges: Arc<MergeRules>,
    /// Special tokens in ID order
    special_tokens: Arc<[String]>,
    /// Special-token splitter (longest literal first)
    splitter: Splitter,
}

impl Tokenizer {
    /// Create a tokenizer from its trained parts.
    ///
    /// Every special token must be registered in the vocabulary, and every
    /// merge rule's operands and result must have an ID. An artifact that
    /// fails these checks was not produced by one training run.
    pub fn new<S: AsRef<str>>(
        vocab: Vocabulary,
        merges: MergeRules,
        special_tokens: &[S],
    ) -> Result<Self> {
        let special_tokens: Vec<String> = special_tokens
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        for name in &special_tokens {
            if vocab.special().get(name).is_none() {
                return Err(TokenizerError::InvalidConfig(format!(
                    "special token {name:?} is not in the vocabulary"
                )));
            }
        }

        for (rank, rule) in merges.iter().enumerate() {
            for operand in [&rule.left, &rule.right, &rule.merged] {
                if vocab.get_id(operand.as_bytes()).is_none() {
                    return Err(TokenizerError::InvalidMerge(format!(
                        "rule {rank} ({:?} + {:?}) refers to {:?}, which has no ID",
                        rule.left, rule.right, operand
                    )));
                }
            }
        }

        let splitter = Splitter::new(&special_tokens)?;
        debug!(
            "Tokenizer ready: {} tokens, {} merges, {} special tokens",
            vocab.len(),
            merges.len(),
            special_tokens.len()
        );

        Ok(Self {
            vocab: Arc::new(vocab),
            merges: Arc::new(merges),
            special_tokens: special_tokens.into(),
            splitter,
        })
    }

    /// Create a tokenizer from a training result.
    pub fn from_trained(model: TrainedModel) -> Result<Self> {
        Self::new(model.vocab, model.merges, &model.special_tokens)
    }

    /// Encode text to token IDs.
    ///
    /// Special-token literals map to their reserved ID. Everything else is
    /// pre-tokenized and each pre-token is merged independently, replaying
    /// the merge rules in training order. Input bytes are not normalized, so
    /// [`Tokenizer::decode`] reproduces `text` exactly.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() / 3 + 1);
        self.encode_into(text, &mut ids)?;
        Ok(ids)
    }

    /// Encode text, appending IDs to `ids`.
    pub fn encode_into(&self, text: &str, ids: &mut Vec<u32>) -> Result<()> {
        for segment in self.splitter.split(text)? {
            match segment {
                Segment::Special(name) => ids.push(self.special_id_or_err(name)?),
                Segment::Text(span) => {
                    for piece in pre_tokens(span) {
                        self.encode_piece(piece?.as_bytes(), ids)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Lazily encode a sequence of text chunks.
    ///
    /// Chunks are encoded one at a time as IDs are pulled; each chunk is
    /// encoded on its own, exactly as [`Tokenizer::encode`] would. The stream
    /// is `Clone` when the chunk iterator is, and a clone restarts from the
    /// point it was taken.
    pub fn encode_stream<I>(&self, chunks: I) -> EncodeStream<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        EncodeStream::new(self, chunks.into_iter())
    }

    /// Encode many texts in parallel. Output order matches input order.
    pub fn encode_batch<S>(&self, texts: &[S]) -> Result<Vec<Vec<u32>>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect()
    }

    /// Concatenate the bytes of each token.
    ///
    /// Fails on the first ID outside the vocabulary.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(ids.len() * 4);
        for &id in ids {
            let token = self
                .vocab
                .get_token(id)
                .ok_or(TokenizerError::UnknownTokenId(id))?;
            bytes.extend_from_slice(token.as_bytes());
        }
        Ok(bytes)
    }

    /// Decode token IDs back to text.
    ///
    /// Byte sequences that are not valid UTF-8, such as a multi-byte
    /// character cut between two calls, decode to U+FFFD rather than failing.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let bytes = self.decode_bytes(ids)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Get the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// ID of a token by its bytes.
    pub fn token_to_id(&self, bytes: &[u8]) -> Option<u32> {
        self.vocab.get_id(bytes)
    }

    /// Bytes of a token by its ID.
    pub fn id_to_token(&self, id: u32) -> Option<&[u8]> {
        self.vocab.get_token(id).map(|t| t.as_bytes())
    }

    /// Reserved ID of a special token.
    pub fn special_token_id(&self, name: &str) -> Option<u32> {
        if !self.special_tokens.iter().any(|s| s == name) {
            return None;
        }
        self.vocab.special().get(name)
    }

    /// Special tokens in ID order.
    pub fn special_tokens(&self) -> &[String] {
        &self.special_tokens
    }

    /// Get a reference to the vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Get a reference to the merge rules.
    pub fn merges(&self) -> &MergeRules {
        &self.merges
    }

    /// Save to `dir/tokenizer.json`, returning the file path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        TokenizerSaver::new(&self.vocab, &self.merges, &self.special_tokens).save(dir)
    }

    /// Load from `dir/tokenizer.json`.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::from_trained(TokenizerLoader::load(dir)?)
    }

    fn special_id_or_err(&self, name: &str) -> Result<u32> {
        self.vocab
            .special()
            .get(name)
            .ok_or_else(|| TokenizerError::UnknownToken(name.to_string()))
    }

    fn encode_piece(&self, bytes: &[u8], ids: &mut Vec<u32>) -> Result<()> {
        let mut word = Word::from_bytes(bytes);
        self.merges.apply(&mut word);

        for token in word.tokens() {
            let id = self
                .vocab
                .get_id(token.as_bytes())
                .ok_or_else(|| TokenizerError::UnknownToken(format!("{token:?}")))?;
            ids.push(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytebpe_core::{ByteToken, MergeRule};
    use bytebpe_training::{BpeTrainer, TrainingConfig};

    const LOW_CORPUS: &str = "low low low low low lowest widest widest";

    fn low_tokenizer() -> Tokenizer {
        let config = TrainingConfig::builder()
            .vocab_size(259)
            .special_tokens(Vec::<String>::new())
            .build()
            .unwrap();
        let model = BpeTrainer::new(config).unwrap().train(LOW_CORPUS).unwrap();
        Tokenizer::from_trained(model).unwrap()
    }

    fn trained(corpus: &str, vocab_size: usize, special_tokens: &[&str]) -> Tokenizer {
        let config = TrainingConfig::builder()
            .vocab_size(vocab_size)
            .special_tokens(special_tokens.iter().copied())
            .build()
            .unwrap();
        let model = BpeTrainer::new(config).unwrap().train(corpus).unwrap();
        Tokenizer::from_trained(model).unwrap()
    }

    fn tok(s: &str) -> ByteToken {
        ByteToken::new(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_encode_low_lowest() {
        let tokenizer = low_tokenizer();
        assert_eq!(tokenizer.vocab_size(), 259);
        assert_eq!(
            tokenizer.encode("low lowest").unwrap(),
            vec![257, 258, 101, 115, 116]
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let tokenizer = trained(
            "Hello, world! Hello again, world.\nNumbers 123 and 4567.",
            320,
            &["<|endoftext|>"],
        );

        for text in [
            "Hello, world!",
            "",
            "   leading and trailing   ",
            "line one\r\nline two\rline three\n",
            "unicode: caf\u{e9} \u{65e5}\u{672c} \u{1f600}",
            "mixed<|endoftext|>special<|endoftext|>",
        ] {
            let ids = tokenizer.encode(text).unwrap();
            assert_eq!(tokenizer.decode(&ids).unwrap(), text, "text {text:?}");
        }
    }

    #[test]
    fn test_special_token_is_atomic() {
        let tokenizer = trained("a b c", 270, &["<|endoftext|>"]);
        let eot = tokenizer.special_token_id("<|endoftext|>").unwrap();
        assert_eq!(eot, 0);

        let ids = tokenizer.encode("hi<|endoftext|>there").unwrap();
        assert_eq!(ids.iter().filter(|&&id| id == eot).count(), 1);
        assert_eq!(tokenizer.decode(&ids).unwrap(), "hi<|endoftext|>there");

        assert_eq!(tokenizer.encode("<|endoftext|>").unwrap(), vec![eot]);
    }

    #[test]
    fn test_overlapping_special_tokens_prefer_longest() {
        let tokenizer = trained("", 258, &["<|a|>", "<|a|><|a|>"]);
        let single = tokenizer.special_token_id("<|a|>").unwrap();
        let double = tokenizer.special_token_id("<|a|><|a|>").unwrap();

        assert_eq!(
            tokenizer.encode("<|a|><|a|><|a|>").unwrap(),
            vec![double, single]
        );
    }

    #[test]
    fn test_special_token_text_without_registration_is_bytes() {
        let tokenizer = trained("", 256, &[]);
        let ids = tokenizer.encode("<|endoftext|>").unwrap();
        assert_eq!(ids.len(), "<|endoftext|>".len());
        assert_eq!(tokenizer.special_token_id("<|endoftext|>"), None);
    }

    #[test]
    fn test_merge_order_is_replayed() {
        // With [(a,b), (b,c)] "abc" -> [ab, c]; with [(b,c), (a,b)] -> [a, bc].
        let forward = MergeRules::from_pairs([(tok("a"), tok("b")), (tok("b"), tok("c"))]);
        let reverse = MergeRules::from_pairs([(tok("b"), tok("c")), (tok("a"), tok("b"))]);

        let t1 = Tokenizer::new(Vocabulary::build::<&str>(&[], &forward), forward, &[] as &[&str])
            .unwrap();
        let t2 = Tokenizer::new(Vocabulary::build::<&str>(&[], &reverse), reverse, &[] as &[&str])
            .unwrap();

        let ab = t1.token_to_id(b"ab").unwrap();
        let bc = t2.token_to_id(b"bc").unwrap();
        assert_eq!(t1.encode("abc").unwrap(), vec![ab, b'c' as u32]);
        assert_eq!(t2.encode("abc").unwrap(), vec![b'a' as u32, bc]);
    }

    #[test]
    fn test_truncated_utf8_decodes_to_one_replacement() {
        let tokenizer = low_tokenizer();
        let mut ids = tokenizer.encode("ab").unwrap();
        // First byte of a two-byte character only.
        ids.push(tokenizer.token_to_id(&[0xC3]).unwrap());
        ids.extend(tokenizer.encode("cd").unwrap());

        let text = tokenizer.decode(&ids).unwrap();
        assert_eq!(text, "ab\u{FFFD}cd");
        assert_eq!(text.matches('\u{FFFD}').count(), 1);
    }

    #[test]
    fn test_decode_unknown_id() {
        let tokenizer = low_tokenizer();
        assert!(matches!(
            tokenizer.decode(&[1, 259]),
            Err(TokenizerError::UnknownTokenId(259))
        ));
    }

    #[test]
    fn test_decode_bytes_is_exact() {
        let tokenizer = low_tokenizer();
        let ids = vec![257, 0xFF, 258];
        assert_eq!(tokenizer.decode_bytes(&ids).unwrap(), b"low\xff low".to_vec());
    }

    #[test]
    fn test_encode_batch_preserves_order() {
        let tokenizer = low_tokenizer();
        let texts = vec!["low", "lowest widest", "", " low low"];
        let batch = tokenizer.encode_batch(&texts).unwrap();

        assert_eq!(batch.len(), texts.len());
        for (text, ids) in texts.iter().zip(&batch) {
            assert_eq!(ids, &tokenizer.encode(text).unwrap());
        }
    }

    #[test]
    fn test_lookups() {
        let tokenizer = low_tokenizer();
        assert_eq!(tokenizer.token_to_id(b"ow"), Some(256));
        assert_eq!(tokenizer.id_to_token(258), Some(&b" low"[..]));
        assert_eq!(tokenizer.id_to_token(259), None);
        assert_eq!(tokenizer.token_to_id(b"lowest"), None);
    }

    #[test]
    fn test_rejects_mismatched_merges() {
        let merges = MergeRules::from_iter([MergeRule::new(tok("x"), tok("y"))]);
        let vocab = Vocabulary::build::<&str>(&[], &MergeRules::new());
        let result = Tokenizer::new(vocab, merges, &[] as &[&str]);
        assert!(matches!(result, Err(TokenizerError::InvalidMerge(_))));
    }

    #[test]
    fn test_rejects_unregistered_special_token() {
        let vocab = Vocabulary::build::<&str>(&[], &MergeRules::new());
        let result = Tokenizer::new(vocab, MergeRules::new(), &["<|endoftext|>"]);
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_tokenizer_is_shareable_across_threads() {
        let tokenizer = low_tokenizer();
        let expected = tokenizer.encode("low lowest").unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(tokenizer.encode("low lowest").unwrap(), expected);
                });
            }
        });
    }
}
