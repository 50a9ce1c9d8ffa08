//! Recursive character splitting of section text into overlapping chunks.
//!
//! Text is split on the coarsest separator it contains (paragraph, line,
//! word, character), small pieces are merged back up to `chunk_size`, and
//! consecutive chunks share up to `chunk_overlap` characters. Lengths are
//! counted in chars, not bytes.

use crate::config::ChunkingConfig;
use crate::models::{Chunk, Section};

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    pub fn from_config(cfg: &ChunkingConfig) -> Self {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (idx, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || text.contains(**s))
            .map(|(i, s)| (i, *s))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let remaining = separators.get(idx + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut small: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small, separator));
                small.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small, separator));
        }
        chunks
    }

    /// Greedily packs pieces into windows of at most `chunk_size`, keeping a
    /// tail of at most `chunk_overlap` when a window is emitted.
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut out = Vec::new();
        let mut window: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };
            if total + len + joiner > self.chunk_size && !window.is_empty() {
                push_joined(&mut out, &window, separator);
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { sep_len };
                }
            }
            let joiner = if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
            total += len + joiner;
        }
        push_joined(&mut out, &window, separator);
        out
    }
}

fn push_joined(out: &mut Vec<String>, window: &std::collections::VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Chunks every section; chunk ids are `{section title}_{index within section}`.
pub fn process_sections(splitter: &TextSplitter, sections: &[Section]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for section in sections {
        for (i, content) in splitter.split_text(&section.content).into_iter().enumerate() {
            chunks.push(Chunk {
                content,
                section_title: section.title.clone(),
                page_number: section.page_number,
                chunk_id: format!("{}_{}", section.title, i),
                source: section.source.clone(),
            });
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let splitter = TextSplitter::new(1000, 200);
        assert_eq!(
            splitter.split_text("Whoever commits murder shall be punished."),
            vec!["Whoever commits murder shall be punished."]
        );
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let splitter = TextSplitter::new(10, 2);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   ").is_empty());
    }

    #[test]
    fn words_merge_with_overlap() {
        let splitter = TextSplitter::new(10, 4);
        let chunks = splitter.split_text("aa bb cc dd ee ff");
        assert_eq!(chunks, vec!["aa bb cc", "cc dd ee", "ee ff"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn paragraphs_split_before_words() {
        let splitter = TextSplitter::new(12, 0);
        let chunks = splitter.split_text("first para\n\nsecond one");
        assert_eq!(chunks, vec!["first para", "second one"]);
    }

    #[test]
    fn oversized_word_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 1);
        let chunks = splitter.split_text("abcdefg hi");
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(chunks.first().map(String::as_str), Some("abcd"));
        assert_eq!(chunks.last().map(String::as_str), Some("hi"));
    }

    #[test]
    fn multibyte_text_counts_chars() {
        let splitter = TextSplitter::new(5, 0);
        let chunks = splitter.split_text("धारा धारा");
        assert_eq!(chunks, vec!["धारा", "धारा"]);
    }

    #[test]
    fn chunk_ids_are_numbered_per_section() {
        let splitter = TextSplitter::new(10, 0);
        let sections = vec![
            Section {
                title: "Section 1".into(),
                content: "aaaa bbbb cccc".into(),
                page_number: 3,
                source: "ipc.pdf".into(),
            },
            Section {
                title: "Section 2".into(),
                content: "short".into(),
                page_number: 4,
                source: "ipc.pdf".into(),
            },
        ];
        let chunks = process_sections(&splitter, &sections);
        let ids: Vec<_> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["Section 1_0", "Section 1_1", "Section 2_0"]);
        assert!(chunks.iter().take(2).all(|c| c.page_number == 3));
    }
}
