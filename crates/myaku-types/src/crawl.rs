use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Anything a [`crate::article::Article`] or [`crate::blog::Blog`] shares:
/// the fields `CrawlTracker` needs to decide whether an item is new, has
/// been updated since it was last crawled, or should be skipped.
pub trait Crawlable {
    fn source_url(&self) -> &str;
    fn source_name(&self) -> &str;
    fn last_updated_datetime(&self) -> Option<OffsetDateTime>;
}

/// A URL marker recorded when a crawler re-encounters a page that is no
/// longer indexable (paywalled, 404, malformed). Write-once; prevents
/// Myaku from re-crawling a page it already knows it can't index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlSkip {
    pub source_url: String,
    pub source_name: String,
    pub last_crawled_datetime: OffsetDateTime,
}
