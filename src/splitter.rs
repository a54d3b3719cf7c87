//! Text splitting strategies.
//!
//! Two splitters turn extracted document text into retrieval fragments:
//!
//! - [`FixedSplitter`] slides a window of `chunk_size` characters forward by
//!   `chunk_size - overlap`, so every pair of consecutive fragments shares exactly
//!   `overlap` characters.
//! - [`RecursiveSplitter`] prefers natural boundaries (paragraphs, lines, words) and merges
//!   small pieces greedily, carrying up to `overlap` characters into the next fragment.
//!
//! Sizes are counted in `char`s, so multi-byte characters are never cut.

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Default fragment size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive fragments in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Which splitting strategy to use.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    /// Sliding character window with exact overlap.
    #[default]
    Fixed,
    /// Boundary-aware recursive splitting.
    Recursive,
}

/// Splitter settings, as found in the `splitter` section of the config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SplitterConfig {
    /// Strategy.
    pub kind: SplitterKind,
    /// Maximum fragment length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive fragments.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            kind: SplitterKind::Fixed,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl SplitterConfig {
    /// Rejects settings no splitter can honour.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.chunk_size == 0 {
            return Err(LoadError::Splitter {
                reason: "chunk_size must be > 0".to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(LoadError::Splitter {
                reason: format!(
                    "chunk_overlap ({}) must be smaller than chunk_size ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        Ok(())
    }

    /// Splits `text` with the configured strategy.
    pub fn split(&self, text: &str) -> Result<Vec<String>, LoadError> {
        self.validate()?;
        let pieces = match self.kind {
            SplitterKind::Fixed => FixedSplitter::new(self.chunk_size, self.chunk_overlap).split(text),
            SplitterKind::Recursive => {
                RecursiveSplitter::new(self.chunk_size, self.chunk_overlap).split(text)
            }
        };
        Ok(pieces)
    }
}

/// Sliding-window splitter.
///
/// ```rust
/// use pdf_chat::splitter::FixedSplitter;
///
/// let parts = FixedSplitter::new(4, 2).split("abcdefgh");
/// assert_eq!(parts, vec!["abcd", "cdef", "efgh"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl FixedSplitter {
    /// `overlap` must be smaller than `chunk_size`; see [`SplitterConfig::validate`].
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() || self.chunk_size == 0 {
            return Vec::new();
        }

        let step = self.chunk_size.saturating_sub(self.overlap).max(1);
        let mut fragments = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            fragments.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        fragments
    }
}

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Boundary-aware splitter.
///
/// Tries each separator in turn (`"\n\n"`, `"\n"`, `" "`, then single characters), keeps
/// the separator at the start of the piece that follows it, and recurses into pieces that
/// are still too long. Fragments are trimmed and never longer than `chunk_size`.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    overlap: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = "";
        let mut rest: &[&str] = &[];
        for (i, &candidate) in separators.iter().enumerate() {
            if candidate.is_empty() || text.contains(candidate) {
                separator = candidate;
                rest = &separators[i + 1..];
                break;
            }
        }

        let mut fragments = Vec::new();
        let mut good: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                fragments.extend(self.merge(&good));
                good.clear();
            }
            if rest.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    fragments.push(trimmed.to_string());
                }
            } else {
                fragments.extend(self.split_with(&piece, rest));
            }
        }
        if !good.is_empty() {
            fragments.extend(self.merge(&good));
        }
        fragments
    }

    /// Greedily joins `pieces` into fragments, dropping pieces from the front until at most
    /// `overlap` characters are carried into the next fragment.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut fragments = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(&mut fragments, &current);
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    total -= char_len(current.remove(0));
                }
            }
            current.push(piece);
            total += len;
        }
        push_trimmed(&mut fragments, &current);
        fragments
    }
}

fn push_trimmed(fragments: &mut Vec<String>, parts: &[&str]) {
    let joined = parts.concat();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        fragments.push(trimmed.to_string());
    }
}

/// Splits on `separator`, attaching each separator to the start of the piece after it.
/// An empty separator yields single characters. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > last {
            pieces.push(text[last..idx].to_string());
        }
        last = idx;
    }
    if last < text.len() {
        pieces.push(text[last..].to_string());
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}
