use async_trait::async_trait;

use myaku_cache::{CachedSearchResultPage, FirstPageCache, NextPageCache};
use myaku_types::Query;

use crate::error::SearchOutcome;

/// The read side of the first-page cache, as [`crate::IndexSearcher`] needs
/// it. A trait rather than a concrete `FirstPageCache` field so tests can
/// substitute an in-memory double instead of a live Redis connection — the
/// same "explicit middleware over a singleton" seam `SPEC_FULL.md` §9 calls
/// for applied to the cache tier itself.
#[async_trait]
pub trait FirstPageCacheLike: Send + Sync {
    async fn get(&self, query_str: &str) -> SearchOutcome<Option<CachedSearchResultPage>>;
}

#[async_trait]
impl FirstPageCacheLike for FirstPageCache {
    async fn get(&self, query_str: &str) -> SearchOutcome<Option<CachedSearchResultPage>> {
        Ok(FirstPageCache::get(self, query_str).await?)
    }
}

/// The next-page cache's read/write surface, as [`crate::IndexSearcher`] and
/// its background warming jobs need it.
#[async_trait]
pub trait NextPageCacheLike: Send + Sync {
    async fn get(&self, user_id: &str, query: &Query) -> SearchOutcome<Option<CachedSearchResultPage>>;
    async fn put(&self, user_id: &str, page: &CachedSearchResultPage) -> SearchOutcome<()>;
}

#[async_trait]
impl NextPageCacheLike for NextPageCache {
    async fn get(&self, user_id: &str, query: &Query) -> SearchOutcome<Option<CachedSearchResultPage>> {
        Ok(NextPageCache::get(self, user_id, query).await?)
    }

    async fn put(&self, user_id: &str, page: &CachedSearchResultPage) -> SearchOutcome<()> {
        Ok(NextPageCache::put(self, user_id, page).await?)
    }
}

#[cfg(test)]
pub mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// An in-memory [`FirstPageCacheLike`] double, pre-seedable by test code
    /// without a live Redis connection.
    #[derive(Default)]
    pub struct InMemoryFirstPageCache {
        entries: Mutex<HashMap<String, CachedSearchResultPage>>,
    }

    impl InMemoryFirstPageCache {
        pub fn new() -> Self {
            InMemoryFirstPageCache::default()
        }

        pub fn seed(&self, query_str: &str, page: CachedSearchResultPage) {
            self.entries.lock().unwrap().insert(query_str.to_string(), page);
        }
    }

    #[async_trait]
    impl FirstPageCacheLike for InMemoryFirstPageCache {
        async fn get(&self, query_str: &str) -> SearchOutcome<Option<CachedSearchResultPage>> {
            Ok(self.entries.lock().unwrap().get(query_str).cloned())
        }
    }

    /// An in-memory [`NextPageCacheLike`] double used to observe what the
    /// background warming job in `IndexSearcher::search` actually wrote.
    #[derive(Default)]
    pub struct InMemoryNextPageCache {
        entries: Mutex<HashMap<String, CachedSearchResultPage>>,
    }

    impl InMemoryNextPageCache {
        pub fn new() -> Self {
            InMemoryNextPageCache::default()
        }

        pub fn get_raw(&self, user_id: &str) -> Option<CachedSearchResultPage> {
            self.entries.lock().unwrap().get(user_id).cloned()
        }

        /// Seeds this cache as if `page` had already been warmed for its
        /// own `query.user_id`.
        pub fn seed(&self, page: CachedSearchResultPage) {
            self.entries.lock().unwrap().insert(page.query.user_id.clone(), page);
        }
    }

    #[async_trait]
    impl NextPageCacheLike for InMemoryNextPageCache {
        async fn get(&self, user_id: &str, query: &Query) -> SearchOutcome<Option<CachedSearchResultPage>> {
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(user_id).filter(|cached| {
                cached.query.query_str == query.query_str
                    && cached.query.page_num == query.page_num
                    && cached.query.query_type == query.query_type
            }).cloned())
        }

        async fn put(&self, user_id: &str, page: &CachedSearchResultPage) -> SearchOutcome<()> {
            self.entries.lock().unwrap().insert(user_id.to_string(), page.clone());
            Ok(())
        }
    }
}
