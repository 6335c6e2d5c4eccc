use std::time::{Duration, Instant};

/// Per-crawl counters: article count, alnum character count, FLI count, per
/// `spec.md` §2's stats requirement. Promoted from a one-off script helper
/// (`myaku/runners/run_crawl.py`'s `CrawlStats`) into a library type since
/// every consumer of `CrawlPipeline::run_all` needs the same summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCounts {
    pub articles: u64,
    pub alnum_chars: u64,
    pub flis: u64,
    pub skipped: u64,
}

impl CrawlCounts {
    pub fn add_article(&mut self, alnum_count: usize, fli_count: usize) {
        self.articles += 1;
        self.alnum_chars += alnum_count as u64;
        self.flis += fli_count as u64;
    }

    pub fn add_skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn merge(&mut self, other: CrawlCounts) {
        self.articles += other.articles;
        self.alnum_chars += other.alnum_chars;
        self.flis += other.flis;
        self.skipped += other.skipped;
    }
}

/// Aggregates per-crawl [`CrawlCounts`] plus overall wall time across a full
/// `CrawlPipeline::run_all` invocation (one adapter may run several crawls).
#[derive(Debug)]
pub struct CrawlStats {
    started_at: Instant,
    pub per_crawl: Vec<(String, CrawlCounts)>,
    pub total: CrawlCounts,
}

impl CrawlStats {
    pub fn start() -> Self {
        CrawlStats { started_at: Instant::now(), per_crawl: Vec::new(), total: CrawlCounts::default() }
    }

    pub fn record_crawl(&mut self, crawl_name: impl Into<String>, counts: CrawlCounts) {
        self.total.merge(counts);
        self.per_crawl.push((crawl_name.into(), counts));
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
