//! Corpus partitioning for parallel pre-tokenization.
//!
//! A corpus is cut into byte ranges whose interior boundaries sit exactly at
//! the start of a boundary marker (normally the end-of-text special token).
//! No pre-token or special token can then straddle two ranges.

use log::{debug, warn};
use std::io::{self, Read, Seek, SeekFrom};

/// Bytes scanned per read while searching for a marker
pub const MINI_CHUNK_SIZE: usize = 4096;

/// Find up to `desired_chunks + 1` sorted, unique byte offsets.
///
/// The first offset is always 0 and the last is the stream length. Interior
/// guesses are spaced evenly and then moved forward to the next marker
/// occurrence, or to the end of the stream when none follows. Guesses that
/// collapse onto the same offset are merged, so a sparse marker yields fewer
/// ranges. An empty marker disables alignment and yields a single range.
pub fn find_chunk_boundaries<R: Read + Seek>(
    reader: &mut R,
    desired_chunks: usize,
    marker: &[u8],
) -> io::Result<Vec<u64>> {
    let size = reader.seek(SeekFrom::End(0))?;
    let desired = desired_chunks.max(1) as u64;

    if marker.is_empty() || desired == 1 || size == 0 {
        return Ok(vec![0, size]);
    }

    let chunk_size = size / desired;
    let mut boundaries: Vec<u64> = (0..=desired).map(|i| i * chunk_size).collect();
    if let Some(last) = boundaries.last_mut() {
        *last = size;
    }

    let mut buffer = vec![0u8; MINI_CHUNK_SIZE + marker.len() - 1];
    let interior = boundaries.len() - 1;
    for boundary in &mut boundaries[1..interior] {
        *boundary = next_marker(reader, *boundary, size, marker, &mut buffer)?;
    }

    boundaries.sort_unstable();
    boundaries.dedup();

    if boundaries.len() < desired as usize + 1 {
        warn!(
            "Boundary marker too sparse: requested {} ranges, got {}",
            desired,
            boundaries.len() - 1
        );
    }
    debug!("Chunk boundaries: {:?}", boundaries);

    Ok(boundaries)
}

/// Offset of the first marker at or after `start`, or `size` if none.
///
/// Consecutive reads overlap by `marker.len() - 1` bytes so a marker split
/// across two reads is still seen.
fn next_marker<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    size: u64,
    marker: &[u8],
    buffer: &mut [u8],
) -> io::Result<u64> {
    let mut position = start;

    while position < size {
        reader.seek(SeekFrom::Start(position))?;
        let filled = read_full(reader, buffer)?;

        if let Some(offset) = find_subslice(&buffer[..filled], marker) {
            return Ok(position + offset as u64);
        }
        if filled < buffer.len() {
            break;
        }
        position += (buffer.len() - (marker.len() - 1)) as u64;
    }

    Ok(size)
}

/// Read until the buffer is full or the stream ends.
fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const EOT: &[u8] = b"<|endoftext|>";

    fn boundaries(data: &[u8], desired: usize, marker: &[u8]) -> Vec<u64> {
        find_chunk_boundaries(&mut Cursor::new(data), desired, marker).unwrap()
    }

    fn assert_aligned(data: &[u8], bounds: &[u64], marker: &[u8]) {
        assert_eq!(bounds[0], 0);
        assert_eq!(*bounds.last().unwrap(), data.len() as u64);
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        for &b in &bounds[1..bounds.len() - 1] {
            assert!(data[b as usize..].starts_with(marker), "boundary {b}");
        }
    }

    #[test]
    fn test_boundaries_land_on_marker() {
        let doc = b"some document text here ";
        let mut data = Vec::new();
        for _ in 0..20 {
            data.extend_from_slice(doc);
            data.extend_from_slice(EOT);
        }

        let bounds = boundaries(&data, 4, EOT);
        assert_eq!(bounds.len(), 5);
        assert_aligned(&data, &bounds, EOT);
    }

    #[test]
    fn test_sparse_marker_collapses_ranges() {
        let mut data = vec![b'a'; 100];
        data.extend_from_slice(EOT);
        data.extend_from_slice(&[b'b'; 10]);

        let bounds = boundaries(&data, 8, EOT);
        assert_eq!(bounds, vec![0, 100, data.len() as u64]);
    }

    #[test]
    fn test_no_marker_single_range() {
        let data = vec![b'x'; 1000];
        assert_eq!(boundaries(&data, 4, EOT), vec![0, 1000]);
    }

    #[test]
    fn test_marker_across_mini_chunk_edge() {
        // The guess sits at 5900; the marker starts 4100 bytes later, so the
        // first read window ends inside it.
        let mut data = vec![b'a'; 10_000];
        data.extend_from_slice(EOT);
        data.extend_from_slice(&[b'c'; 1787]);
        assert_eq!(data.len(), 11_800);

        let bounds = boundaries(&data, 2, EOT);
        assert_eq!(bounds, vec![0, 10_000, 11_800]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(boundaries(b"", 4, EOT), vec![0, 0]);
        assert_eq!(boundaries(b"abc", 0, EOT), vec![0, 3]);
        assert_eq!(boundaries(b"abc<|endoftext|>", 4, b""), vec![0, 16]);
    }

    #[test]
    fn test_file_backed() {
        let mut file = tempfile::tempfile().unwrap();
        let mut data = Vec::new();
        for i in 0..200 {
            data.extend_from_slice(format!("document number {i}").as_bytes());
            data.extend_from_slice(EOT);
        }
        file.write_all(&data).unwrap();

        let bounds = find_chunk_boundaries(&mut file, 6, EOT).unwrap();
        assert_eq!(bounds.len(), 7);
        assert_aligned(&data, &bounds, EOT);
    }
}
