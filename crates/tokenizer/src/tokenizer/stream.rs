//! Lazy encoding over a sequence of text chunks.

use super::Tokenizer;
use bytebpe_core::Result;
use std::iter::FusedIterator;

/// Iterator returned by [`Tokenizer::encode_stream`].
///
/// Holds at most one encoded chunk at a time. After an error the stream
/// yields that error once and then ends.
#[derive(Debug)]
pub struct EncodeStream<'a, I> {
    tokenizer: &'a Tokenizer,
    chunks: I,
    /// IDs of the current chunk
    pending: Vec<u32>,
    /// Next position in `pending`
    cursor: usize,
    finished: bool,
}

impl<'a, I> EncodeStream<'a, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    pub(crate) fn new(tokenizer: &'a Tokenizer, chunks: I) -> Self {
        Self {
            tokenizer,
            chunks,
            pending: Vec::new(),
            cursor: 0,
            finished: false,
        }
    }
}

impl<I> Iterator for EncodeStream<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(&id) = self.pending.get(self.cursor) {
                self.cursor += 1;
                return Some(Ok(id));
            }
            if self.finished {
                return None;
            }

            let Some(chunk) = self.chunks.next() else {
                self.finished = true;
                return None;
            };

            self.pending.clear();
            self.cursor = 0;
            if let Err(e) = self.tokenizer.encode_into(chunk.as_ref(), &mut self.pending) {
                self.pending.clear();
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}

impl<I> FusedIterator for EncodeStream<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}

impl<I: Clone> Clone for EncodeStream<'_, I> {
    fn clone(&self) -> Self {
        Self {
            tokenizer: self.tokenizer,
            chunks: self.chunks.clone(),
            pending: self.pending.clone(),
            cursor: self.cursor,
            finished: self.finished,
        }
    }
}
