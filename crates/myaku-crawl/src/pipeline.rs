use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use time::OffsetDateTime;
use tracing::{info, warn};

use myaku_adapter::{ArticleCandidate, Crawl, FetchOutcome, SourceAdapter};
use myaku_cache::{CachedSearchResultPage, FirstPageCache};
use myaku_lexical::{analyze_and_reduce, LexicalAnalyzer};
use myaku_scorer::Scorer;
use myaku_store::{IndexStore, StoreError};
use myaku_types::{Article, Query, QueryType};

use crate::error::CrawlResult;
use crate::stats::{CrawlCounts, CrawlStats};
use crate::tracker::CrawlTracker;

/// Bounds on the number of candidates processed concurrently within a
/// single [`myaku_adapter::Crawl`], per `spec.md` §5: a fixed-size pool of
/// workers draining one queue per crawl, rather than one worker per
/// candidate or one worker for the whole adapter.
pub const MIN_WORKERS_PER_CRAWL: usize = 1;
pub const MAX_WORKERS_PER_CRAWL: usize = 4;

/// Drives `adapter -> tracker -> analyzer -> scorer -> store (-> cache)` for
/// every crawl an adapter produces, per `spec.md` §4.5.
///
/// Cheaply `Clone`: every field is itself a cheap handle (`IndexStore` wraps
/// an `Arc`-backed `heed::Env`, `FirstPageCache`/`Scorer` are small value
/// types, `Arc<dyn LexicalAnalyzer>` is a pointer), so a pipeline can be
/// shared across the concurrent workers it spawns internally without an
/// extra layer of `Arc<Mutex<_>>`.
#[derive(Clone)]
pub struct CrawlPipeline {
    store: IndexStore,
    analyzer: Arc<dyn LexicalAnalyzer>,
    scorer: Scorer,
    first_page_cache: Option<FirstPageCache>,
    workers_per_crawl: usize,
}

impl CrawlPipeline {
    pub fn new(store: IndexStore, analyzer: Arc<dyn LexicalAnalyzer>) -> Self {
        CrawlPipeline {
            store,
            analyzer,
            scorer: Scorer::new(),
            first_page_cache: None,
            workers_per_crawl: MAX_WORKERS_PER_CRAWL,
        }
    }

    pub fn with_first_page_cache(mut self, cache: FirstPageCache) -> Self {
        self.first_page_cache = Some(cache);
        self
    }

    /// Clamped to `[MIN_WORKERS_PER_CRAWL, MAX_WORKERS_PER_CRAWL]`.
    pub fn with_workers_per_crawl(mut self, n: usize) -> Self {
        self.workers_per_crawl = n.clamp(MIN_WORKERS_PER_CRAWL, MAX_WORKERS_PER_CRAWL);
        self
    }

    /// Runs every adapter's most-recent crawls to completion, writing new
    /// and updated articles/FLIs to the index and refreshing the first-page
    /// cache for any base form whose ranking changed as a result. Returns
    /// aggregated [`CrawlStats`] across the whole run.
    pub async fn run_all(&self, adapters: &[Arc<dyn SourceAdapter>]) -> CrawlResult<CrawlStats> {
        let mut stats = CrawlStats::start();
        let mut touched_base_forms: HashSet<String> = HashSet::new();

        for adapter in adapters {
            let crawls = adapter.most_recent_crawls().await?;
            for crawl in crawls {
                let crawl_name = crawl.name.clone();
                let counts = self.run_crawl(adapter.as_ref(), crawl, &mut touched_base_forms).await?;
                info!(crawl = %crawl_name, articles = counts.articles, skipped = counts.skipped, flis = counts.flis, "crawl complete");
                stats.record_crawl(crawl_name, counts);
            }
        }

        self.refresh_first_page_cache(&touched_base_forms).await?;
        Ok(stats)
    }

    async fn run_crawl(
        &self,
        adapter: &dyn SourceAdapter,
        crawl: Crawl,
        touched_base_forms: &mut HashSet<String>,
    ) -> CrawlResult<CrawlCounts> {
        let tracker = CrawlTracker::new();
        let candidates: Vec<ArticleCandidate> = crawl.candidates.collect().await;
        let survivors = tracker.filter_to_updated(&self.store, candidates)?;

        let results: Vec<CrawlResult<(CrawlCounts, Vec<String>)>> = futures::stream::iter(survivors)
            .map(|candidate| self.process_one(adapter, &tracker, candidate))
            .buffer_unordered(self.workers_per_crawl)
            .collect()
            .await;

        let mut counts = CrawlCounts::default();
        for result in results {
            let (one, base_forms) = result?;
            counts.merge(one);
            touched_base_forms.extend(base_forms);
        }
        Ok(counts)
    }

    /// Fetches, scores, and writes a single candidate. A rejection at any
    /// point short of a hard adapter/store error (an unindexable skip, a
    /// write-gate rejection) is counted and logged rather than propagated,
    /// per `spec.md` §4.5's "surfaced as a non-fatal warning" framing, so one
    /// bad candidate never aborts the rest of a crawl.
    async fn process_one(
        &self,
        adapter: &dyn SourceAdapter,
        tracker: &CrawlTracker,
        candidate: ArticleCandidate,
    ) -> CrawlResult<(CrawlCounts, Vec<String>)> {
        let now = OffsetDateTime::now_utc();
        let mut counts = CrawlCounts::default();

        let outcome = adapter.fetch_article(&candidate).await?;
        let article = match outcome {
            FetchOutcome::Skipped(reason) => {
                warn!(url = %candidate.source_url, ?reason, "skipping candidate");
                tracker.record_crawled(&self.store, &candidate, now)?;
                counts.add_skip();
                return Ok((counts, Vec::new()));
            }
            FetchOutcome::Fetched(article) => *article,
        };

        let (mut article, blog_rating) = self.attach_blog(&candidate, article)?;
        self.scorer.rescore_article(&mut article, blog_rating, now);

        let article_id = match self.store.write_articles(vec![article])?.remove(0) {
            Ok(id) => id,
            Err(err) => {
                warn!(url = %candidate.source_url, error = %err, "article rejected at write time");
                tracker.record_crawled(&self.store, &candidate, now)?;
                counts.add_skip();
                return Ok((counts, Vec::new()));
            }
        };

        let stored_article =
            self.store.get_article(article_id)?.ok_or(StoreError::ArticleNotWritten)?;
        let mut flis = analyze_and_reduce(self.analyzer.as_ref(), &stored_article.full_text, article_id)?;
        for fli in &mut flis {
            fli.quality_score_mod = self.scorer.score_fli_modifier(fli);
        }
        let base_forms: Vec<String> = flis.iter().map(|fli| fli.base_form.clone()).collect();
        let fli_count = flis.len();
        self.store.replace_article_flis(article_id, flis)?;

        counts.add_article(stored_article.alnum_count, fli_count);
        tracker.record_crawled(&self.store, &candidate, now)?;
        Ok((counts, base_forms))
    }

    /// Resolves `candidate.blog` (if any) to a stored [`myaku_types::BlogId`]
    /// via [`IndexStore::upsert_blog`], and copies the candidate's
    /// blog-relative ordering fields onto `article` — fields
    /// [`Article::build`] never takes as parameters, since an adapter builds
    /// an `Article` without knowing whether the blog it belongs to has been
    /// upserted yet.
    fn attach_blog(&self, candidate: &ArticleCandidate, mut article: Article) -> CrawlResult<(Article, Option<f64>)> {
        let Some(mut blog) = candidate.blog.clone() else {
            return Ok((article, None));
        };
        let blog_id = self.store.upsert_blog(&mut blog)?;
        article.blog_id = Some(blog_id);
        article.blog_article_order_num = candidate.blog_article_order_num;
        article.blog_section_name = candidate.blog_section_name.clone();
        article.blog_section_order_num = candidate.blog_section_order_num;
        article.blog_section_article_order_num = candidate.blog_section_article_order_num;
        Ok((article, blog.rating))
    }

    /// For every base form touched by this run, checks whether its best
    /// rank key now outranks the first-page cache's stored marker and, if
    /// so, recomputes and recaches page 1, per `spec.md` §4.10.
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
