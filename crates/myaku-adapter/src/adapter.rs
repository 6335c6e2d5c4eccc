use async_trait::async_trait;

use myaku_types::{Article, InternalError, SkipReason};

use crate::candidate::ArticleCandidate;
use crate::crawl::Crawl;

/// The outcome of fetching one candidate's article page.
///
/// An adapter returns `Skipped` rather than an error for domain-specific
/// non-indexable outcomes (paywalled, gone, too malformed to parse) — only a
/// genuine failure (HTTP error, unexpected page shape) is an `Err`.
pub enum FetchOutcome {
    Fetched(Box<Article>),
    Skipped(SkipReason),
}

/// A per-source implementation of article discovery and fetching.
///
/// Adapters are treated as black boxes by `myaku-crawl`'s `CrawlPipeline`:
/// they may perform arbitrary I/O while producing crawls or fetching a
/// single article, and the pipeline only ever awaits them.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The human-readable name of the source this adapter handles.
    fn source_name(&self) -> &str;

    /// The base URL new article URLs are resolved against.
    fn base_url(&self) -> &str;

    /// Builds the crawls needed to cover at least the last 24 hours of new
    /// articles from this source. Each returned [`Crawl`] is independent and
    /// may be driven by its own worker.
    async fn most_recent_crawls(&self) -> Result<Vec<Crawl>, InternalError>;

    /// Fetches and parses a single article page.
    async fn fetch_article(&self, candidate: &ArticleCandidate) -> Result<FetchOutcome, InternalError>;
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    struct StubAdapter;

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn source_name(&self) -> &str {
            "Stub Source"
        }

        fn base_url(&self) -> &str {
            "https://stub.example.test"
        }

        async fn most_recent_crawls(&self) -> Result<Vec<Crawl>, InternalError> {
            let candidates = vec![
                ArticleCandidate::new("https://stub.example.test/a", self.source_name()),
                ArticleCandidate::new("https://stub.example.test/b", self.source_name()),
            ];
            Ok(vec![Crawl::new("stub-crawl", futures::stream::iter(candidates).boxed())])
        }

        async fn fetch_article(&self, candidate: &ArticleCandidate) -> Result<FetchOutcome, InternalError> {
            if candidate.source_url.ends_with('b') {
                return Ok(FetchOutcome::Skipped(SkipReason::NotFound));
            }
            Err(InternalError::PageUnreachable("stub never fetches for real".into()))
        }
    }

    #[tokio::test]
    async fn crawl_stream_yields_every_candidate() {
        let adapter = StubAdapter;
        let mut crawls = adapter.most_recent_crawls().await.unwrap();
        let crawl = crawls.remove(0);
        let collected: Vec<_> = crawl.candidates.collect().await;
        assert_eq!(collected.len(), 2);
    }

    #[tokio::test]
    async fn fetch_article_reports_skip_for_missing_pages() {
        let adapter = StubAdapter;
        let candidate = ArticleCandidate::new("https://stub.example.test/b", "Stub Source");
        let outcome = adapter.fetch_article(&candidate).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Skipped(SkipReason::NotFound)));
    }
}
