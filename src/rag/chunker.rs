//! Recursive character splitter.
//!
//! Text is cut on the coarsest separator it contains (paragraph, line,
//! sentence, word) and the pieces are greedily merged back into chunks of
//! at most `chunk_size` characters. Pieces that are still too long are split
//! again on the next separator, down to single characters.

use std::collections::VecDeque;

use crate::core::errors::RagError;

/// Separators in order of preference. The empty separator means a hard cut
/// between characters.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty chunks of at most `chunk_size`
    /// characters. Blank input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) <= self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if finer.is_empty() {
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Greedily pack pieces into chunks, carrying up to `chunk_overlap`
    /// trailing characters into the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window.iter().copied().collect::<String>());

                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some(first) => total -= char_len(first),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if !window.is_empty() {
            push_trimmed(&mut chunks, &window.iter().copied().collect::<String>());
        }

        chunks
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (idx, &separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &[]);
        }
        if text.contains(separator) {
            return (separator, &separators[idx + 1..]);
        }
    }
    ("", &[])
}

/// Split after each occurrence of `separator` so no text is lost. An empty
/// separator splits into single characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(idx, c)| &text[idx..idx + c.len_utf8()])
            .collect();
    }
    text.split_inclusive(separator)
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Longest run of leading words of `next` that `prev` ends with.
    fn shared_overlap(prev: &str, next: &str) -> Option<String> {
        let words: Vec<&str> = next.split(' ').collect();
        (1..=words.len())
            .rev()
            .map(|k| words[..k].join(" "))
            .find(|prefix| prev.ends_with(prefix.as_str()))
    }

    #[test]
    fn blank_input_yields_no_chunks() {
        let splitter = TextSplitter::new(100, 20).unwrap();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split(" \n\n\t ").is_empty());
    }

    #[test]
    fn short_input_is_a_single_trimmed_chunk() {
        let splitter = TextSplitter::new(100, 20).unwrap();
        assert_eq!(splitter.split("  Rust is fast.\n"), vec!["Rust is fast."]);
    }

    #[test]
    fn long_text_is_bounded_and_overlapping() {
        let splitter = TextSplitter::new(100, 30).unwrap();
        let text = numbered_words(300);
        let chunks = splitter.split(&text);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "chunk too long: {}", chunk);
            assert!(chunk.split(' ').all(|w| w.starts_with('w') && w.len() > 1));
        }
        for pair in chunks.windows(2) {
            let overlap = shared_overlap(&pair[0], &pair[1])
                .unwrap_or_else(|| panic!("no overlap between {:?} and {:?}", pair[0], pair[1]));
            assert!(overlap.chars().count() <= 30);
        }
        assert!(chunks[0].starts_with("w0 w1"));
        assert!(chunks.last().unwrap().ends_with("w299"));
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(50, 10).unwrap();
        let text = "The first paragraph talks about ownership.\n\nThe second paragraph covers borrowing.";
        assert_eq!(
            splitter.split(text),
            vec![
                "The first paragraph talks about ownership.",
                "The second paragraph covers borrowing."
            ]
        );
    }

    #[test]
    fn falls_back_to_sentence_boundaries() {
        let splitter = TextSplitter::new(40, 0).unwrap();
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota.";
        assert_eq!(
            splitter.split(text),
            vec!["Alpha beta gamma. Delta epsilon zeta.", "Eta theta iota."]
        );
    }

    #[test]
    fn hard_cuts_indivisible_words() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let chunks = splitter.split("abcdefghijklmnopqrstuvwxy");

        assert_eq!(chunks[0], "abcdefghij");
        assert!(chunks[1].starts_with("ij"));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.last().unwrap().ends_with('y'));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let splitter = TextSplitter::new(12, 3).unwrap();
        let text = "naïve café über straße déjà vu ".repeat(5);
        let chunks = splitter.split(&text);

        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
    }

    #[test]
    fn splitting_is_deterministic() {
        let splitter = TextSplitter::new(64, 16).unwrap();
        let text = format!("{}\n\n{}", numbered_words(80), numbered_words(40));
        assert_eq!(splitter.split(&text), splitter.split(&text));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(100, 150).is_err());
        assert!(TextSplitter::new(100, 99).is_ok());
    }
}
