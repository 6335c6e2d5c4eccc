//! The two-tier search cache from `spec.md` §4.10: a never-evicted
//! first-page cache for popular queries, and a per-user next/previous-page
//! cache warmed in the background on each query.
//!
//! Backed by `redis`, matching `myaku.datastore.cache`'s use of a Redis
//! instance for both tiers. The fixed binary serialization format lives in
//! [`codec`].

mod cached_page;
mod codec;
mod error;
mod first_page;
mod next_page;

pub use cached_page::{CachedArticle, CachedSearchResult, CachedSearchResultPage};
pub use codec::{CodecError, CURRENT_GENERATION};
pub use error::{CacheError, CacheResult};
pub use first_page::FirstPageCache;
pub use next_page::{NextPageCache, TTL_SECONDS};
