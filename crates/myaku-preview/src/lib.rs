//! Builds search result previews: 1–3 sample sentences around an article's
//! matched positions, trimmed or expanded to land in a target character
//! range, per `spec.md` §4.9.

mod builder;
mod types;

pub use builder::PreviewBuilder;
pub use types::{ArticlePreview, PreviewSampleText, PreviewSegment};
