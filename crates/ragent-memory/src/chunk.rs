//! Recursive character splitter.
//!
//! Text is split on the coarsest separator it contains (`"\n\n"`, then
//! `"\n"`, then `" "`, then single characters). Pieces keep their leading
//! separator and are greedily merged into windows of at most `chunk_size`
//! characters. When a window is emitted, pieces are dropped from its front
//! until no more than `chunk_overlap` characters remain, and the next window
//! grows from that tail, so adjacent chunks share up to `chunk_overlap`
//! characters. Pieces that are themselves too large are split again with
//! the next separator.
//!
//! All lengths are counted in `char`s. The output depends only on the
//! input text and the two window parameters.
//!
//! # Example
//!
//! ```rust
//! use ragent_memory::{Chunker, ChunkingConfig};
//!
//! let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
//! let chunks = chunker.split_text("Hello world.\n\nSecond paragraph.", "notes.txt");
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].sequence_index, 0);
//! ```

use std::collections::VecDeque;

use ragent_core::RagResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ChunkingConfig;

/// Separators tried in order; the empty string means "split into chars".
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Source label for text that arrives without one.
pub const DEFAULT_SOURCE: &str = "local";

/// A bounded segment of source text; the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Where the text came from (file path, page label, URL, ...).
    pub source: String,
    /// Position of this chunk within its knowledge base.
    pub sequence_index: usize,
}

/// An already-extracted block of text handed over by an ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    pub source: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }

    /// A block with the [`DEFAULT_SOURCE`] label.
    pub fn unlabeled(text: impl Into<String>) -> Self {
        Self::new(text, DEFAULT_SOURCE)
    }
}

/// Splits text into overlapping [`Chunk`]s.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Create a chunker; fails if `chunk_overlap >= chunk_size`.
    pub fn new(config: ChunkingConfig) -> RagResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split a single raw text.
    pub fn split_text(&self, text: &str, source: &str) -> Vec<Chunk> {
        self.split_blocks(&[TextBlock::new(text, source)])
    }

    /// Split a sequence of blocks. Chunks never span two blocks, and
    /// `sequence_index` runs contiguously across all of them.
    pub fn split_blocks(&self, blocks: &[TextBlock]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for block in blocks {
            for text in self.split_recursive(&block.text, &SEPARATORS) {
                chunks.push(Chunk {
                    text,
                    source: block.source.clone(),
                    sequence_index: chunks.len(),
                });
            }
        }
        debug!(
            blocks = blocks.len(),
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "Chunked input"
        );
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);
        let mut output = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                output.extend(self.merge(&pending));
                pending.clear();
            }
            if finer.is_empty() {
                push_trimmed(&mut output, piece);
            } else {
                output.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            output.extend(self.merge(&pending));
        }
        output
    }

    /// Greedily pack small pieces into overlapping windows.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > size && !window.is_empty() {
                if total > size {
                    warn!(size = total, limit = size, "Created a chunk larger than chunk_size");
                }
                push_window(&mut docs, &window);
                while total > overlap || (total + len > size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            push_window(&mut docs, &window);
        }
        docs
    }
}

/// The first separator present in `text`, plus the finer ones after it.
fn pick_separator<'a>(
    text: &str,
    separators: &'a [&'static str],
) -> (&'static str, &'a [&'static str]) {
    for (i, &sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (sep, &[]);
        }
        if text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split so that each separator stays attached to the start of the piece
/// that follows it. Empty pieces are dropped.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_window(docs: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    push_trimmed(docs, &joined);
}

fn push_trimmed(docs: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
        .unwrap()
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunker(1000, 200).split_text("Hello, world!", "a.txt");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].source, "a.txt");
        assert_eq!(chunks[0].sequence_index, 0);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunker(1000, 200).split_text("", "a.txt").is_empty());
        assert!(chunker(1000, 200).split_text("  \n\n  ", "a.txt").is_empty());
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let result = Chunker::new(ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 20,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_3000_chars_make_four_overlapping_chunks() {
        let text = "abcdefghij".repeat(300);
        let chunks = chunker(1000, 200).split_text(&text, "doc");

        assert_eq!(chunks.len(), 4);
        let lens: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
        assert_eq!(lens, vec![1000, 1000, 1000, 600]);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            assert_eq!(&prev[prev.len() - 200..], &next[..200]);
        }
    }

    #[test]
    fn test_paragraphs_packed_under_limit() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunker(1000, 200).split_text(text, "doc");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_word_boundaries_respected() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunker(20, 5).split_text(text, "doc");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 20, "chunk too long: {:?}", chunk.text);
            for word in chunk.text.split_whitespace() {
                assert!(text.split_whitespace().any(|w| w == word), "split word: {word}");
            }
        }
        let shares_tail = chunks.windows(2).any(|pair| {
            let first_word = pair[1].text.split_whitespace().next().unwrap();
            pair[0].text.ends_with(first_word)
        });
        assert!(shares_tail, "expected overlapping windows: {chunks:?}");
    }

    #[test]
    fn test_oversized_paragraph_split_further() {
        let long = "word ".repeat(100);
        let text = format!("short intro\n\n{long}\n\nshort outro");
        let chunks = chunker(50, 10).split_text(&text, "doc");
        assert!(chunks.len() > 3);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 50));
        assert_eq!(chunks.first().unwrap().text, "short intro");
        assert_eq!(chunks.last().unwrap().text, "short outro");
    }

    #[test]
    fn test_sequence_indices_contiguous_across_blocks() {
        let blocks = vec![
            TextBlock::new("page one ".repeat(30), "p1"),
            TextBlock::unlabeled("page two ".repeat(30)),
        ];
        let chunks = chunker(100, 20).split_blocks(&blocks);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i);
        }
        assert_eq!(chunks.first().unwrap().source, "p1");
        assert_eq!(chunks.last().unwrap().source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_multibyte_chars_counted_as_units() {
        let text = "é".repeat(250);
        let chunks = chunker(100, 20).split_text(&text, "doc");
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 100));
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta.\n\nGamma delta epsilon.\nZeta eta theta.\n\n".repeat(40);
        let a = chunker(120, 30).split_text(&text, "doc");
        let b = chunker(120, 30).split_text(&text, "doc");
        assert_eq!(a, b);
    }
}
