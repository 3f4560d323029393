use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

const SENTENCE_END: char = '.';

/// One bounded slice of normalized text, sent in a single synthesis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    pub index: usize,
    pub content: String,
}

/// How far past `max_chunk_size` a single sentence may run before
/// segmentation gives up on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentPolicy {
    /// A sentence may never exceed `max_chunk_size`
    #[default]
    Strict,
    /// A sentence may run up to 1.5x `max_chunk_size`
    Lenient,
}

impl SegmentPolicy {
    pub fn sentence_limit(&self, max_chunk_size: usize) -> usize {
        match self {
            SegmentPolicy::Strict => max_chunk_size,
            SegmentPolicy::Lenient => max_chunk_size + max_chunk_size / 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("text contains a sentence longer than the {limit}-character limit; split it with a period")]
    ChunkTooLarge { limit: usize },
}

/// Splits text into sentence-aligned chunks of at most `max_chunk_size` characters
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    max_chunk_size: usize,
    policy: SegmentPolicy,
}

impl Segmenter {
    pub fn new(max_chunk_size: usize, policy: SegmentPolicy) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
            policy,
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn policy(&self) -> SegmentPolicy {
        self.policy
    }

    /// Normalize `text` and return a lazy sequence over its chunks.
    ///
    /// Each call starts from the beginning, and the returned iterator can be
    /// cloned to replay the sequence. After a `ChunkTooLarge` error the
    /// iterator is exhausted.
    pub fn segment(&self, text: &str) -> Segments {
        Segments {
            chars: normalize(text).chars().collect(),
            cursor: 0,
            next_index: 0,
            max_chunk_size: self.max_chunk_size,
            sentence_limit: self.policy.sentence_limit(self.max_chunk_size),
            failed: false,
        }
    }
}

/// Collapse every run of two or more whitespace characters into one space and trim
pub fn normalize(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

#[derive(Debug, Clone)]
pub struct Segments {
    chars: Vec<char>,
    cursor: usize,
    next_index: usize,
    max_chunk_size: usize,
    sentence_limit: usize,
    failed: bool,
}

impl Segments {
    /// Exclusive end (in chars) of the chunk starting at `start`, which is
    /// never whitespace
    fn chunk_end(&self, start: usize) -> Result<usize, SegmentError> {
        let len = self.chars.len();
        let candidate = start + self.max_chunk_size;
        if candidate >= len {
            return Ok(len);
        }

        // Nearest period after `start` that keeps the chunk within the limit
        if let Some(offset) = self.chars[start + 1..candidate]
            .iter()
            .rposition(|&c| c == SENTENCE_END)
        {
            return Ok(start + 1 + offset + 1);
        }

        let forward = self.chars[candidate..]
            .iter()
            .position(|&c| c == SENTENCE_END)
            .map(|offset| candidate + offset + 1)
            .unwrap_or(len);

        if forward - start > self.sentence_limit {
            return Err(SegmentError::ChunkTooLarge {
                limit: self.sentence_limit,
            });
        }

        Ok(forward)
    }
}

impl Iterator for Segments {
    type Item = Result<TextChunk, SegmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Separators between chunks never count toward the next chunk's size
        while self.cursor < self.chars.len() && self.chars[self.cursor].is_whitespace() {
            self.cursor += 1;
        }

        while !self.failed && self.cursor < self.chars.len() {
            let start = self.cursor;
            let end = match self.chunk_end(start) {
                Ok(end) => end,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };
            self.cursor = end;

            let content = self.chars[start..end].iter().collect::<String>();
            let content = content.trim();
            if content.is_empty() {
                continue;
            }

            let index = self.next_index;
            self.next_index += 1;
            return Some(Ok(TextChunk {
                index,
                content: content.to_string(),
            }));
        }

        None
    }
}
