use serde::{Deserialize, Serialize};

/// The index and length of a lexical item (or any other span) within a body
/// of text.
///
/// Indices and lengths are in `char`s, not bytes: Myaku's original semantics
/// slice article text the way Python indexes `str` (by codepoint), and
/// keeping that here means a `Position` computed by the `LexicalAnalyzer`
/// interface composes directly with [`Article::slice`] without a UTF-8
/// byte-offset translation step at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub len: usize,
}

impl Position {
    pub fn new(start: usize, len: usize) -> Self {
        Position { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }

    pub fn overlaps(&self, other: &Position) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}
