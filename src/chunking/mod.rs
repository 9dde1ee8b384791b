//! Token-window chunking
//!
//! A document's token stream is cut into windows of `chunk_size` tokens.
//! Consecutive windows share `overlap` tokens. The window start always moves
//! forward, so chunking terminates for any `overlap`, including
//! `overlap >= chunk_size`.

pub mod codec;

use std::sync::Arc;
use tracing::debug;

pub use codec::{load_codec, CharCodec, HfTokenCodec, TokenCodec};

use crate::errors::{Result, TutorError};

/// Half-open token ranges `[start, end)` covering `len` tokens.
///
/// The next window starts `overlap` tokens before the current end. If that
/// would not move past the current start, it starts at the current end.
/// Stops after the window that reaches `len`.
pub fn window_bounds(len: usize, chunk_size: usize, overlap: usize) -> Vec<(usize, usize)> {
    let mut bounds = Vec::new();
    if len == 0 || chunk_size == 0 {
        return bounds;
    }

    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(len);
        bounds.push((start, end));

        if end == len {
            break;
        }

        let next = end.saturating_sub(overlap);
        start = if next <= start { end } else { next };
    }

    bounds
}

/// Splits document text into overlapping token windows
#[derive(Clone)]
pub struct Chunker {
    codec: Arc<dyn TokenCodec>,
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(codec: Arc<dyn TokenCodec>, chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(TutorError::ConfigError(
                "chunk_size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            codec,
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk text into decoded windows, in document order
    pub fn chunk(&self, text: &str) -> Result<Vec<String>> {
        let tokens = self.codec.encode(text)?;

        let chunks = window_bounds(tokens.len(), self.chunk_size, self.overlap)
            .into_iter()
            .map(|(start, end)| self.codec.decode(&tokens[start..end]))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            tokens = tokens.len(),
            chunk_count = chunks.len(),
            chunk_size = self.chunk_size,
            overlap = self.overlap,
            "Text chunked"
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn char_chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(Arc::new(CharCodec), size, overlap).unwrap()
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunker = char_chunker(500, 50);
        let text = "Photosynthesis converts light into chemical energy.";
        assert_eq!(chunker.chunk(text).unwrap(), vec![text.to_string()]);
    }

    #[test]
    fn test_empty_document_no_chunks() {
        assert!(char_chunker(10, 2).chunk("").unwrap().is_empty());
    }

    #[test]
    fn test_overlap_repeats_at_boundary() {
        let chunker = char_chunker(4, 2);
        let chunks = chunker.chunk("abcdefgh").unwrap();
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh"]);
    }

    #[test]
    fn test_short_tail() {
        assert_eq!(window_bounds(10, 4, 1), vec![(0, 4), (3, 7), (6, 10)]);
        assert_eq!(window_bounds(9, 4, 0), vec![(0, 4), (4, 8), (8, 9)]);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_still_advances() {
        assert_eq!(window_bounds(6, 2, 2), vec![(0, 2), (2, 4), (4, 6)]);
        assert_eq!(window_bounds(5, 2, 7), vec![(0, 2), (2, 4), (4, 5)]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(Chunker::new(Arc::new(CharCodec), 0, 0).is_err());
    }

    #[quickcheck]
    fn prop_windows_cover_without_gaps(len: u16, size: u8, overlap: u8) -> bool {
        let len = len as usize % 2000;
        let size = size as usize % 64 + 1;
        let overlap = overlap as usize % 80;

        let bounds = window_bounds(len, size, overlap);
        if len == 0 {
            return bounds.is_empty();
        }

        let starts_at_zero = bounds[0].0 == 0;
        let ends_at_len = bounds[bounds.len() - 1].1 == len;
        let contiguous = bounds.windows(2).all(|w| w[1].0 > w[0].0 && w[1].0 <= w[0].1);
        let sized = bounds.iter().all(|&(s, e)| e > s && e - s <= size);

        starts_at_zero && ends_at_len && contiguous && sized
    }

    #[quickcheck]
    fn prop_overlap_at_boundaries(len: u16, size: u8, overlap: u8) -> bool {
        let len = len as usize % 2000;
        let size = size as usize % 64 + 1;
        let overlap = overlap as usize % 64;
        if overlap >= size {
            return true;
        }

        window_bounds(len, size, overlap)
            .windows(2)
            .all(|w| w[0].1 - w[1].0 == overlap)
    }

    #[quickcheck]
    fn prop_terminates_within_bound(len: u16, size: u8, overlap: u8) -> bool {
        let len = len as usize;
        let size = size as usize % 32 + 1;
        let overlap = overlap as usize;

        // Every step advances by at least one token
        window_bounds(len, size, overlap).len() <= len.max(1)
    }

    #[quickcheck]
    fn prop_chunks_decode_to_source_windows(text: String) -> bool {
        let chunker = char_chunker(7, 3);
        let chars: Vec<char> = text.chars().collect();
        let chunks = chunker.chunk(&text).unwrap();

        window_bounds(chars.len(), 7, 3)
            .iter()
            .zip(chunks.iter())
            .all(|(&(s, e), chunk)| chars[s..e].iter().collect::<String>() == *chunk)
    }
}
