use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::ArticleId;

/// Total order used for all ranking and cache-invalidation decisions:
/// `(composite_score desc, last_updated_datetime desc, article_id desc)`.
///
/// Ranking and invalidation code must always compare `RankKey`s rather than
/// raw scores, so that a tie on score falls back to recency and then to a
/// stable tie-breaker (`article_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankKey {
    pub composite_score: i64,
    pub last_updated_datetime: OffsetDateTime,
    pub article_id: ArticleId,
}

impl RankKey {
    pub fn new(composite_score: i64, last_updated_datetime: OffsetDateTime, article_id: ArticleId) -> Self {
        RankKey { composite_score, last_updated_datetime, article_id }
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankKey {
    /// Higher composite score sorts first; ties broken by newer
    /// `last_updated_datetime`, then by higher `article_id`.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.composite_score
            .cmp(&other.composite_score)
            .then_with(|| self.last_updated_datetime.cmp(&other.last_updated_datetime))
            .then_with(|| self.article_id.get().cmp(&other.article_id.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(score: i64, id: u64) -> RankKey {
        RankKey::new(score, OffsetDateTime::UNIX_EPOCH, ArticleId::new(id))
    }

    #[test]
    fn higher_score_ranks_first() {
        assert!(key(10, 1) > key(5, 2));
    }

    #[test]
    fn tie_breaks_on_article_id() {
        assert!(key(10, 2) > key(10, 1));
    }
}
