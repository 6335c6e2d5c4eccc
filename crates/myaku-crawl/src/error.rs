use thiserror::Error;

/// The error taxonomy [`crate::CrawlPipeline`] can surface. Mirrors
/// `myaku_types::Error`'s `Internal`/`User` split: everything here is fatal
/// to the current run (a single rejected article is not, and is instead
/// counted and logged — see `CrawlPipeline::process_one`).
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Adapter(#[from] myaku_types::InternalError),

    #[error(transparent)]
    Store(#[from] myaku_store::StoreError),

    #[error(transparent)]
    Cache(#[from] myaku_cache::CacheError),
}

pub type CrawlResult<T> = std::result::Result<T, CrawlError>;
