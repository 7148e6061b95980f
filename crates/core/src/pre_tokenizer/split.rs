//! Text splitting for pre-tokenization.
//!
//! Text is first cut on special-token literals, then every remaining span is
//! split by a fixed lexical grammar: contractions, letter runs, digit runs,
//! runs of other symbols, and whitespace. A letter, digit or symbol run may
//! carry one leading space. A whitespace run that precedes a non-space
//! character leaves its last space for that character.

use crate::error::Result;
use fancy_regex::Regex;
use std::sync::OnceLock;

/// The pre-tokenization grammar.
pub const PRE_TOKEN_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

fn pre_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PRE_TOKEN_PATTERN).expect("Invalid pre-token pattern"))
}

/// Iterate the pre-tokens of a span, left to right.
///
/// Matches are maximal and non-overlapping. Errors only if the regex engine
/// hits its backtracking limit.
pub fn pre_tokens(text: &str) -> impl Iterator<Item = Result<&str>> + '_ {
    pre_token_regex()
        .find_iter(text)
        .map(|m| m.map(|m| m.as_str()).map_err(Into::into))
}

/// A piece of input text after special-token splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// An exact special-token literal
    Special(&'a str),
    /// Ordinary text between special tokens
    Text(&'a str),
}

/// Splits text on special-token literals.
#[derive(Debug, Clone)]
pub struct Splitter {
    /// Special tokens, longest first
    special_tokens: Vec<String>,
    /// Alternation of the escaped literals in the same order
    pattern: Option<Regex>,
}

impl Splitter {
    /// Create a splitter for the given special tokens.
    ///
    /// Literals are tried longest first, so a token that is a prefix of
    /// another never wins over the longer one. Empty literals are ignored.
    pub fn new<S: AsRef<str>>(special_tokens: &[S]) -> Result<Self> {
        let mut tokens: Vec<String> = Vec::with_capacity(special_tokens.len());
        for token in special_tokens {
            let token = token.as_ref();
            if !token.is_empty() && !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        tokens.sort_by(|a, b| b.len().cmp(&a.len()));

        let pattern = if tokens.is_empty() {
            None
        } else {
            let alternation = tokens
                .iter()
                .map(|t| fancy_regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };

        Ok(Self {
            special_tokens: tokens,
            pattern,
        })
    }

    /// Splitter with no special tokens.
    pub fn plain() -> Self {
        Self {
            special_tokens: Vec::new(),
            pattern: None,
        }
    }

    /// Special tokens in match priority order (longest first).
    pub fn special_tokens(&self) -> &[String] {
        &self.special_tokens
    }

    /// Cut text into special and ordinary segments, in order.
    ///
    /// Empty text spans between adjacent special tokens are omitted.
    pub fn split<'a>(&self, text: &'a str) -> Result<Vec<Segment<'a>>> {
        let Some(pattern) = &self.pattern else {
            return Ok(if text.is_empty() {
                Vec::new()
            } else {
                vec![Segment::Text(text)]
            });
        };

        let mut segments = Vec::new();
        let mut last = 0;

        for m in pattern.find_iter(text) {
            let m = m?;
            if m.start() > last {
                segments.push(Segment::Text(&text[last..m.start()]));
            }
            segments.push(Segment::Special(m.as_str()));
            last = m.end();
        }

        if last < text.len() {
            segments.push(Segment::Text(&text[last..]));
        }

        Ok(segments)
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::plain()
    }
}
