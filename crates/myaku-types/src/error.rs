use thiserror::Error;

/// Top-level error taxonomy shared by every crate in the workspace.
///
/// Mirrors the `InternalError` / `UserError` split used throughout the
/// teacher workspace: `InternalError` variants are bugs or environment
/// failures that abort the current run, `UserError` variants are conditions
/// an operator can act on (bad config, a write attempted through a
/// read-only handle, ...). Neither is ever shown verbatim to an end user of
/// the search API; the HTTP layer above the core is responsible for mapping
/// these into a generic "something went wrong" response.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error(transparent)]
    User(#[from] UserError),
}

#[derive(Error, Debug)]
pub enum InternalError {
    /// A page navigated to by a crawler could not be accessed: an HTTP
    /// error, or the page structure changed so drastically that parsing
    /// can't even begin.
    #[error("page unreachable: {0}")]
    PageUnreachable(String),

    /// The page was reached but expected elements were missing from it.
    #[error("parse failed: {0}")]
    ParseFailed(String),

    /// The analyzer dictionary or the index is unreachable. Fatal to the
    /// current crawl or rescore run, not to the process.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum UserError {
    /// A write was attempted through a read-only store handle.
    #[error("permission denied: attempted a write through a read-only handle")]
    PermissionDenied,

    /// An article's `full_text` exceeded the configured length cap.
    #[error("article text length {actual} exceeds the cap of {cap}")]
    ArticleTooLong { actual: usize, cap: usize },

    /// An article with this `text_hash` is already stored.
    #[error("article with text_hash {0} already stored")]
    DuplicateArticleText(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Non-error outcomes of fetching or parsing a single candidate article.
///
/// These are recorded as a [`crate::crawl::CrawlSkip`] rather than surfaced
/// as an [`Error`]; a source that is merely paywalled or gone is not a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Paywalled,
    NotFound,
    Malformed,
}

pub type Result<T> = std::result::Result<T, Error>;
