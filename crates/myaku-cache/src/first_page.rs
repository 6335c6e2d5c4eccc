use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use myaku_types::RankKey;

use crate::cached_page::CachedSearchResultPage;
use crate::codec;
use crate::error::CacheResult;

const BUILT_MARKER_KEY: &str = "myaku:first-page:built";

fn page_key(query_str: &str) -> String {
    format!("myaku:first-page:page:{query_str}")
}

fn rank_marker_key(query_str: &str) -> String {
    format!("myaku:first-page:rank:{query_str}")
}

/// Encodes a [`RankKey`] as a fixed 24-byte big-endian tuple for the rank
/// marker used by [`FirstPageCache::is_recache_required`]. Separate from
/// [`codec`]'s page format since the marker isn't itself a cache value a
/// reader ever treats as a page.
fn encode_rank_key(key: RankKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    out.extend_from_slice(&key.composite_score.to_be_bytes());
    out.extend_from_slice(&key.last_updated_datetime.unix_timestamp().to_be_bytes());
    out.extend_from_slice(&key.article_id.get().to_be_bytes());
    out
}

fn decode_rank_key(bytes: &[u8]) -> Option<RankKey> {
    if bytes.len() != 24 {
        return None;
    }
    let composite_score = i64::from_be_bytes(bytes[0..8].try_into().ok()?);
    let last_updated_unix = i64::from_be_bytes(bytes[8..16].try_into().ok()?);
    let article_id = u64::from_be_bytes(bytes[16..24].try_into().ok()?);
    Some(RankKey::new(
        composite_score,
        time::OffsetDateTime::from_unix_timestamp(last_updated_unix).ok()?,
        myaku_types::ArticleId::new(article_id),
    ))
}

/// The shared, never-evicted cache of search results page 1 for popular
/// queries, per `spec.md` §4.10.
///
/// Backed by `redis`, matching `myaku.datastore.cache.FirstPageCache`'s use
/// of a Redis instance distinct from the next-page cache's.
#[derive(Clone)]
pub struct FirstPageCache {
    conn: ConnectionManager,
}

impl FirstPageCache {
    pub fn new(conn: ConnectionManager) -> Self {
        FirstPageCache { conn }
    }

    /// Reads the cached page 1 for `query_str`, if present and decodable.
    /// An undecodable (e.g. generation-mismatched) entry is treated as a
    /// miss rather than an error, per `spec.md` §7's `SerializationMismatch`
    /// policy.
    pub async fn get(&self, query_str: &str) -> CacheResult<Option<CachedSearchResultPage>> {
        let mut conn = self.conn.clone();
        let bytes: Option<Vec<u8>> = conn.get(page_key(query_str)).await?;
        Ok(bytes.and_then(|b| codec::decode(&b).ok().flatten()))
    }

    /// Writes page 1 for `query_str`, and, if `top_rank_key` is given,
    /// records it as the marker [`Self::is_recache_required`] compares
    /// future candidates against.
    pub async fn put(&self, query_str: &str, page: &CachedSearchResultPage, top_rank_key: Option<RankKey>) -> CacheResult<()> {
        let bytes = codec::encode(page)?;
        let mut conn = self.conn.clone();
        conn.set(page_key(query_str), bytes).await?;
        if let Some(key) = top_rank_key {
            conn.set(rank_marker_key(query_str), encode_rank_key(key)).await?;
        }
        Ok(())
    }

    /// Whether the cache has ever been fully built (see
    /// `build-first-page-cache` in `SPEC_FULL.md` §10). Absence of the
    /// marker means the cache must be rebuilt by scanning every base form.
    pub async fn is_built(&self) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(BUILT_MARKER_KEY).await?)
    }

    pub async fn mark_built(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.set(BUILT_MARKER_KEY, 1u8).await?;
        Ok(())
    }

    /// Whether a write producing `candidate` as the new best rank key for
    /// `query_str` requires recomputing and recaching page 1: true if no
    /// marker is stored yet, or `candidate` outranks the stored marker.
    pub async fn is_recache_required(&self, query_str: &str, candidate: RankKey) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let stored: Option<Vec<u8>> = conn.get(rank_marker_key(query_str)).await?;
        match stored.and_then(|b| decode_rank_key(&b)) {
            Some(existing) => Ok(candidate > existing),
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myaku_types::ArticleId;
    use time::OffsetDateTime;

    #[test]
    fn rank_key_round_trips() {
        let key = RankKey::new(4200, OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(), ArticleId::new(9));
        let bytes = encode_rank_key(key);
        let decoded = decode_rank_key(&bytes).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn malformed_rank_marker_decodes_to_none() {
        assert!(decode_rank_key(&[0u8; 3]).is_none());
    }
}
