use thiserror::Error;

/// Errors [`crate::IndexSearcher::search`] can surface. Mirrors the
/// `Internal`/`User` split used throughout the workspace: both variants here
/// abort the current request, never partially render a page.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] myaku_store::StoreError),

    #[error(transparent)]
    Cache(#[from] myaku_cache::CacheError),
}

/// Named `SearchOutcome` rather than `SearchResult` to avoid shadowing
/// [`myaku_types::SearchResult`], the per-article result row.
pub type SearchOutcome<T> = std::result::Result<T, SearchError>;
