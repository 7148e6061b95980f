//! Fan-out/fan-in pre-token counting.
//!
//! Each worker owns one aligned byte range, counts its pre-tokens into a
//! private table and hands it back; tables are summed once every worker has
//! finished. Workers share nothing mutable.

use bytebpe_core::{merge_counts, PreTokenCounts, PreTokenizer, Result, TokenizerError};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Build a pool with exactly `num_workers` threads.
pub fn build_pool(num_workers: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .thread_name(|i| format!("bytebpe-worker-{i}"))
        .build()
        .map_err(|e| TokenizerError::Training(format!("Failed to build thread pool: {e}")))
}

/// Map every item in parallel, then fold the results with an associative
/// `reduce`.
///
/// `identity` must be a neutral element of `reduce`.
pub fn par_map_reduce<T, R, M, I, F>(pool: &ThreadPool, items: &[T], map: M, identity: I, reduce: F) -> R
where
    T: Sync,
    R: Send,
    M: Fn(&T) -> R + Sync + Send,
    I: Fn() -> R + Sync + Send,
    F: Fn(R, R) -> R + Sync + Send,
{
    pool.install(|| items.par_iter().map(map).reduce(identity, reduce))
}

/// Consecutive `(start, end)` pairs of a boundary list.
pub fn ranges(boundaries: &[u64]) -> Vec<(u64, u64)> {
    boundaries.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Count pre-tokens of a file, one range per worker.
///
/// Every worker opens its own handle, so no file position is shared.
pub fn count_file_ranges(
    pool: &ThreadPool,
    path: &Path,
    boundaries: &[u64],
    pre_tokenizer: &PreTokenizer,
) -> Result<PreTokenCounts> {
    par_map_reduce(
        pool,
        &ranges(boundaries),
        |&(start, end)| {
            let bytes = read_range(path, start, end)?;
            pre_tokenizer.count_bytes(&bytes)
        },
        || Ok(PreTokenCounts::new()),
        sum_counts,
    )
}

/// Count pre-tokens of an in-memory corpus, one range per worker.
pub fn count_slice_ranges(
    pool: &ThreadPool,
    corpus: &[u8],
    boundaries: &[u64],
    pre_tokenizer: &PreTokenizer,
) -> Result<PreTokenCounts> {
    par_map_reduce(
        pool,
        &ranges(boundaries),
        |&(start, end)| pre_tokenizer.count_bytes(&corpus[start as usize..end as usize]),
        || Ok(PreTokenCounts::new()),
        sum_counts,
    )
}

fn sum_counts(a: Result<PreTokenCounts>, b: Result<PreTokenCounts>) -> Result<PreTokenCounts> {
    Ok(merge_counts(a?, b?))
}

fn read_range(path: &Path, start: u64, end: u64) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| TokenizerError::io(path, e))?;
    file.seek(SeekFrom::Start(start))
        .map_err(|e| TokenizerError::io(path, e))?;

    let mut bytes = Vec::with_capacity((end - start) as usize);
    file.take(end - start)
        .read_to_end(&mut bytes)
        .map_err(|e| TokenizerError::io(path, e))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::partition::find_chunk_boundaries;
    use bytebpe_core::Normalizer;
    use std::io::{Cursor, Write};

    fn corpus() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..50 {
            data.extend_from_slice(format!("doc {} says hello hello\r\n", i % 7).as_bytes());
            data.extend_from_slice(b"<|endoftext|>");
        }
        data
    }

    #[test]
    fn test_par_map_reduce_sums() {
        let pool = build_pool(3).unwrap();
        let items: Vec<u64> = (1..=100).collect();
        let total = par_map_reduce(&pool, &items, |&x| x * 2, || 0, |a, b| a + b);
        assert_eq!(total, 10_100);
    }

    #[test]
    fn test_ranges() {
        assert_eq!(ranges(&[0, 5, 9]), vec![(0, 5), (5, 9)]);
        assert!(ranges(&[0]).is_empty());
    }

    #[test]
    fn test_parallel_counts_match_sequential() {
        let data = corpus();
        let pre_tokenizer = PreTokenizer::new(&["<|endoftext|>"], Normalizer::default()).unwrap();
        let expected = pre_tokenizer.count_bytes(&data).unwrap();

        let pool = build_pool(4).unwrap();
        let bounds = find_chunk_boundaries(&mut Cursor::new(&data), 4, b"<|endoftext|>").unwrap();
        assert!(bounds.len() > 2);

        let counts = count_slice_ranges(&pool, &data, &bounds, &pre_tokenizer).unwrap();
        assert_eq!(counts, expected);
        assert_eq!(counts[" hello"], 100);
    }

    #[test]
    fn test_file_ranges_match_slice_ranges() {
        let data = corpus();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let pre_tokenizer = PreTokenizer::new(&["<|endoftext|>"], Normalizer::default()).unwrap();
        let pool = build_pool(2).unwrap();
        let bounds = find_chunk_boundaries(&mut Cursor::new(&data), 3, b"<|endoftext|>").unwrap();

        let from_file = count_file_ranges(&pool, file.path(), &bounds, &pre_tokenizer).unwrap();
        let from_slice = count_slice_ranges(&pool, &data, &bounds, &pre_tokenizer).unwrap();
        assert_eq!(from_file, from_slice);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let pool = build_pool(1).unwrap();
        let result = count_file_ranges(
            &pool,
            Path::new("/nonexistent/corpus.txt"),
            &[0, 10],
            &PreTokenizer::default(),
        );
        assert!(matches!(result, Err(TokenizerError::Io { .. })));
    }
}
