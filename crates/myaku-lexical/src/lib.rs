//! The `LexicalAnalyzer` interface: text → lexical items with
//! interpretations and positions.
//!
//! The real Japanese morphological analyzer and dictionary lookup are
//! external to this workspace (see `spec.md` §4.4); only the interface, the
//! reduction helper it feeds into, and a `NullAnalyzer` reference
//! implementation for tests live here.

mod analyzer;
mod null_analyzer;
mod token;

pub use analyzer::{analyze_and_reduce, LexicalAnalyzer};
pub use null_analyzer::NullAnalyzer;
pub use token::{positions_are_non_overlapping, AnalyzedItem};
