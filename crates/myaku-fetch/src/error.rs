use thiserror::Error;

/// Errors [`crate::RateLimitedFetcher::get`] can raise. A 404 is not among
/// them — it's returned as [`crate::FetchOutcome::NotFoundSkip`], per
/// `spec.md` §4.3 ("404 is returned as a skip and not retried").
#[derive(Error, Debug)]
pub enum FetchError {
    /// A non-404 4xx response: the request was rejected for a reason a
    /// retry won't fix (403, 401, ...).
    #[error("http error: {status} fetching {url}")]
    HttpError { status: u16, url: String },

    /// Every retry attempt failed with a transient error (connection reset,
    /// 5xx, timeout).
    #[error("fetch of {url} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { url: String, attempts: u32, last_error: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
