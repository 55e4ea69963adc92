//! Sentence-aware sliding-window chunking.
//!
//! Text is walked in windows of `chunk_size` characters. A window that does not
//! reach the end of the text is cut after the last `.` or newline found in its
//! second half, so passages tend to end on a sentence or line boundary.
//! Consecutive windows overlap by `overlap` characters.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    /// Passages with this many characters or fewer are dropped by the builder.
    pub min_passage_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200, min_passage_chars: 50 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(Error::InvalidArgument(format!(
                "chunk_size must be greater than overlap (chunk_size={}, overlap={})",
                self.chunk_size, self.overlap
            )));
        }
        Ok(())
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<String>> {
        chunk_text(text, self.chunk_size, self.overlap)
    }

    /// Whether a trimmed chunk is long enough to be indexed.
    pub fn keeps(&self, passage: &str) -> bool {
        passage.chars().count() > self.min_passage_chars
    }
}

/// Split `text` into overlapping, trimmed, non-empty chunks.
///
/// Sizes are counted in `char`s. Requires `chunk_size > overlap`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    ChunkingConfig { chunk_size, overlap, min_passage_chars: 0 }.validate()?;

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let mut end = (start + chunk_size).min(len);
        if end < len {
            let window = &chars[start..end];
            if let Some(break_point) = window.iter().rposition(|&c| c == '.' || c == '\n') {
                if break_point * 2 > chunk_size {
                    end = start + break_point + 1;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end >= len {
            break;
        }
        // A short sentence cut combined with a wide overlap could step backwards.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(len: usize) -> String {
        "abcdefghij".chars().cycle().take(len).collect()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 1000, 200).unwrap().is_empty());
        assert!(chunk_text("   \n  ", 1000, 200).unwrap().is_empty());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        assert!(matches!(chunk_text("abc", 10, 10), Err(Error::InvalidArgument(_))));
        assert!(matches!(chunk_text("abc", 0, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("  One sentence. Another one.  ", 1000, 200).unwrap();
        assert_eq!(chunks, vec!["One sentence. Another one.".to_string()]);
    }

    #[test]
    fn cuts_after_sentence_break_in_second_half() {
        // period at offset 7 of a 10-char window: cut after it
        let text = "abcdefg.hijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, 10, 2).unwrap();
        assert_eq!(chunks[0], "abcdefg.");
        // next window starts at end - overlap = 8 - 2 = 6
        assert!(chunks[1].starts_with("g.hij"));
    }

    #[test]
    fn ignores_sentence_break_in_first_half() {
        let text = "ab.defghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, 10, 2).unwrap();
        assert_eq!(chunks[0], "ab.defghij");
    }

    #[test]
    fn newline_counts_as_break() {
        let text = format!("{}\n{}", filler(7), filler(30));
        let chunks = chunk_text(&text, 10, 0).unwrap();
        assert_eq!(chunks[0], filler(7));
    }

    #[test]
    fn wide_overlap_after_sentence_cut_still_advances() {
        // cut at offset 6 (end = 7) with overlap 8 would move start backwards
        let text = format!("abcdef.{}", filler(40));
        let chunks = chunk_text(&text, 10, 8).unwrap();
        assert_eq!(chunks[0], "abcdef.");
        assert!(chunks.len() > 1);
        assert!(chunks[1].starts_with("abcdefghij"));
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text: String = "é".repeat(25);
        let chunks = chunk_text(&text, 10, 0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[2].chars().count(), 5);
    }

    #[test]
    fn keeps_only_passages_longer_than_minimum() {
        let config = ChunkingConfig::default();
        assert!(!config.keeps(&"x".repeat(50)));
        assert!(config.keeps(&"x".repeat(51)));
    }
}
