use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use myaku_types::Query;

use crate::cached_page::CachedSearchResultPage;
use crate::codec;
use crate::error::CacheResult;

/// Entries expire after 7 days, per `spec.md` §4.10.
pub const TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

fn key(user_id: &str) -> String {
    format!("myaku:next-page:{user_id}")
}

fn query_matches(cached: &Query, requested: &Query) -> bool {
    cached.query_str == requested.query_str && cached.page_num == requested.page_num && cached.query_type == requested.query_type
}

/// The per-user cache holding the anticipated adjacent search results page,
/// per `spec.md` §4.10.
///
/// A hit requires the stored entry's originating [`Query`] (query string,
/// page number, and query type) to match the request exactly; a mismatch is
/// a plain miss, not an error, since a user who changed their query between
/// requests is simply not the case this cache exists to serve.
#[derive(Clone)]
pub struct NextPageCache {
    conn: ConnectionManager,
}

impl NextPageCache {
    pub fn new(conn: ConnectionManager) -> Self {
        NextPageCache { conn }
    }

    pub async fn get(&self, user_id: &str, query: &Query) -> CacheResult<Option<CachedSearchResultPage>> {
        let mut conn = self.conn.clone();
        let bytes: Option<Vec<u8>> = conn.get(key(user_id)).await?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let Some(page) = codec::decode(&bytes).ok().flatten() else {
            return Ok(None);
        };
        if query_matches(&page.query, query) {
            Ok(Some(page))
        } else {
            Ok(None)
        }
    }

    /// Writes `page` for `user_id` with the standard 7-day TTL. Last writer
    /// wins, per `spec.md` §5's shared-resource policy.
    pub async fn put(&self, user_id: &str, page: &CachedSearchResultPage) -> CacheResult<()> {
        let bytes = codec::encode(page)?;
        let mut conn = self.conn.clone();
        conn.set_ex(key(user_id), bytes, TTL_SECONDS).await?;
        Ok(())
    }
}
