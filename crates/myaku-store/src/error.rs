use thiserror::Error;

/// Errors surfaced by [`crate::IndexStore`]. Wraps `heed`'s own error type
/// plus the store-specific conditions `spec.md` §4.6 calls out (the article
/// safety check, an unresolved foreign key).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("lmdb error: {0}")]
    Heed(#[from] heed::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("article with text_hash {0} already stored")]
    DuplicateArticleText(String),

    #[error("article text length {actual} exceeds the cap of {cap}")]
    ArticleTooLong { actual: usize, cap: usize },

    #[error("blog referenced by article was not upserted first")]
    BlogNotUpserted,

    #[error("fli references an article that was not written first")]
    ArticleNotWritten,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("codec error: {0}")]
    Codec(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<myaku_types::Error> for StoreError {
    fn from(err: myaku_types::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}
