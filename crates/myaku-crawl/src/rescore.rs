use std::collections::HashSet;

use time::OffsetDateTime;
use tracing::info;

use myaku_cache::{CachedSearchResultPage, FirstPageCache};
use myaku_scorer::{score_publication_recency, Scorer};
use myaku_store::IndexStore;
use myaku_types::{Article, Query, QueryType};

use crate::error::CrawlResult;

/// Periodically re-scores articles whose publication recency crossed a
/// scoring tier boundary since the last pass, per `spec.md` §4.8.
///
/// Only articles near a boundary are re-examined: the recency factor is
/// piecewise-constant within a tier, so an article that hasn't crossed a
/// tier boundary scores identically to last time and re-scoring it would be
/// wasted work.
#[derive(Clone)]
pub struct RescorePass {
    store: IndexStore,
    scorer: Scorer,
    first_page_cache: Option<FirstPageCache>,
}

/// Outcome of one [`RescorePass::run`] invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RescoreStats {
    pub articles_examined: u64,
    pub articles_rescored: u64,
}

impl RescorePass {
    pub fn new(store: IndexStore) -> Self {
        RescorePass { store, scorer: Scorer::new(), first_page_cache: None }
    }

    pub fn with_first_page_cache(mut self, cache: FirstPageCache) -> Self {
        self.first_page_cache = Some(cache);
        self
    }

    /// Runs one rescore pass. `previous_pass_at` is the timestamp of the
    /// prior run (or `None` on the first ever run, in which case every
    /// article is examined); `now` is the current time.
    pub async fn run(&self, previous_pass_at: Option<OffsetDateTime>, now: OffsetDateTime) -> CrawlResult<RescoreStats> {
        let mut stats = RescoreStats::default();
        let mut touched_base_forms: HashSet<String> = HashSet::new();

        for article in self.store.iter_articles()? {
            stats.articles_examined += 1;
            let Some(article_id) = article.id else { continue };

            if let Some(previous_pass_at) = previous_pass_at {
                if !crossed_a_boundary(&article, previous_pass_at, now) {
                    continue;
                }
            }

            let blog_rating = match article.blog_id {
                Some(blog_id) => self.store.get_blog(blog_id)?.and_then(|b| b.rating),
                None => None,
            };
            let new_score = self.scorer.score_article(&article, blog_rating, now);
            if new_score == article.quality_score {
                continue;
            }

            let flis = self.store.flis_for_article(article_id)?;
            touched_base_forms.extend(flis.into_iter().map(|fli| fli.base_form));
            self.store.update_article_score(article_id, new_score)?;
            stats.articles_rescored += 1;
        }

        self.refresh_first_page_cache(&touched_base_forms).await?;
        info!(examined = stats.articles_examined, rescored = stats.articles_rescored, "rescore pass complete");
        Ok(stats)
    }

    async fn refresh_first_page_cache(&self, base_forms: &HashSet<String>) -> CrawlResult<()> {
        let Some(cache) = &self.first_page_cache else {
            return Ok(());
        };
        for base_form in base_forms {
            let Some(best) = self.store.best_rank_key(base_form)? else {
                continue;
            };
            if cache.is_recache_required(base_form, best).await? {
                let query = Query::new(base_form.clone(), 1, QueryType::Exact, String::new());
                let page = self.store.search_page(query)?;
                let cached = CachedSearchResultPage::from_page(&page);
                cache.put(base_form, &cached, Some(best)).await?;
            }
        }
        Ok(())
    }
}

/// Whether `article`'s recency factor, evaluated at `previous_pass_at`
/// versus at `now`, landed in a different tier. Comparing the scorer's own
/// output directly sidesteps re-deriving its bucket boundaries and their
/// exact edge semantics here.
fn crossed_a_boundary(article: &Article, previous_pass_at: OffsetDateTime, now: OffsetDateTime) -> bool {
    score_publication_recency(article, previous_pass_at) != score_publication_recency(article, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn article_updated_at(last_updated_datetime: OffsetDateTime) -> Article {
        Article::build(
            "t".to_string(),
            None,
            "https://example.test/x".to_string(),
            "Source".to_string(),
            None,
            last_updated_datetime,
            last_updated_datetime,
            "本文です。".to_string(),
            false,
            vec![],
        )
        .unwrap()
    }

    fn days_ago(days: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::days(365 * 10) - Duration::days(days)
    }

    #[test]
    fn detects_a_crossed_boundary() {
        // ~6 days old at the previous pass (tier 1.0, bound 7), ~8 days old
        // at now (tier 0.9, bound 30): floor(age_days) crosses the 7-day
        // boundary between the two passes.
        let last_updated = days_ago(8) + Duration::minutes(1);
        let article = article_updated_at(last_updated);
        let previous_pass_at = last_updated + Duration::days(7) - Duration::minutes(1);
        let now = previous_pass_at + Duration::days(1) + Duration::minutes(2);
        assert!(crossed_a_boundary(&article, previous_pass_at, now));
    }

    #[test]
    fn no_crossing_within_the_same_tier() {
        let last_updated = days_ago(100);
        let article = article_updated_at(last_updated);
        let previous_pass_at = last_updated + Duration::days(50);
        let now = previous_pass_at + Duration::minutes(2);
        assert!(!crossed_a_boundary(&article, previous_pass_at, now));
    }
}
