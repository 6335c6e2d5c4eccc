use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache value serialization error: {0}")]
    Codec(#[from] crate::codec::CodecError),
}

pub type CacheResult<T> = Result<T, CacheError>;
