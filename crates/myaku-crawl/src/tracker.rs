use time::OffsetDateTime;

use myaku_types::{CrawlSkip, Crawlable};

/// The read-only/write surface [`CrawlTracker`] needs from the index, kept
/// as an injected trait so `filter_to_updated` is unit-testable against a
/// fake without a live `IndexStore`, per `SPEC_FULL.md` §4.2.
///
/// `myaku-store`'s `IndexStore` implements this directly — see the `impl`
/// block at the bottom of this module.
pub trait TrackerStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `(stored_last_updated_datetime, stored_last_crawled_datetime)`
    /// for whichever of a blog or article is addressed by `source_url`, or
    /// `None` if neither is stored yet.
    fn lookup_crawl_state(
        &self,
        source_url: &str,
    ) -> Result<Option<(Option<OffsetDateTime>, Option<OffsetDateTime>)>, Self::Error>;

    fn is_crawl_skip(&self, source_url: &str) -> Result<bool, Self::Error>;

    fn update_last_crawled(&self, source_url: &str, when: OffsetDateTime) -> Result<(), Self::Error>;

    fn insert_crawl_skip(&self, skip: CrawlSkip) -> Result<(), Self::Error>;
}

/// Decides which discovered items are new, updated, or skippable against
/// the index, and records crawl bookkeeping after a fetch, per `spec.md`
/// §4.2.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrawlTracker;

impl CrawlTracker {
    pub fn new() -> Self {
        CrawlTracker
    }

    /// Keeps items with no stored `source_url`, or a null stored
    /// `last_crawled_datetime`, or whose `last_updated_datetime` is newer
    /// than what's stored; drops items whose URL is a recorded crawl skip.
    ///
    /// Idempotent: applying this to its own output returns the same list,
    /// since every surviving item either wasn't in the store at all (still
    /// won't be, until the caller writes it) or had a newer
    /// `last_updated_datetime` than what's stored (the store is still
    /// unchanged by a filter call alone).
    pub fn filter_to_updated<T, S>(&self, store: &S, items: Vec<T>) -> Result<Vec<T>, S::Error>
    where
        T: Crawlable,
        S: TrackerStore,
    {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if store.is_crawl_skip(item.source_url())? {
                continue;
            }
            match store.lookup_crawl_state(item.source_url())? {
                None => kept.push(item),
                Some((_, None)) => kept.push(item),
                Some((stored_last_updated, Some(_))) => {
                    let is_newer = match (item.last_updated_datetime(), stored_last_updated) {
                        (Some(item_updated), Some(stored_updated)) => item_updated > stored_updated,
                        (Some(_), None) => true,
                        _ => false,
                    };
                    if is_newer {
                        kept.push(item);
                    }
                }
            }
        }
        Ok(kept)
    }

    /// Records that `item` was just crawled: updates `last_crawled_datetime`
    /// if it's already present in blogs/articles by `source_url`; otherwise
    /// inserts a [`CrawlSkip`] record so the URL is never retried. This is
    /// what prevents an adapter that keeps discovering a non-indexable URL
    /// (paywalled, permanently gone) from retrying it on every crawl.
    pub fn record_crawled<T, S>(&self, store: &S, item: &T, when: OffsetDateTime) -> Result<(), S::Error>
    where
        T: Crawlable,
        S: TrackerStore,
    {
        match store.lookup_crawl_state(item.source_url())? {
            Some(_) => store.update_last_crawled(item.source_url(), when),
            None => store.insert_crawl_skip(CrawlSkip {
                source_url: item.source_url().to_string(),
                source_name: item.source_name().to_string(),
                last_crawled_datetime: when,
            }),
        }
    }
}

impl TrackerStore for myaku_store::IndexStore {
    type Error = myaku_store::StoreError;

    fn lookup_crawl_state(
        &self,
        source_url: &str,
    ) -> Result<Option<(Option<OffsetDateTime>, Option<OffsetDateTime>)>, Self::Error> {
        myaku_store::IndexStore::lookup_crawl_state(self, source_url)
    }

    fn is_crawl_skip(&self, source_url: &str) -> Result<bool, Self::Error> {
        myaku_store::IndexStore::is_crawl_skip(self, source_url)
    }

    fn update_last_crawled(&self, source_url: &str, when: OffsetDateTime) -> Result<(), Self::Error> {
        myaku_store::IndexStore::update_last_crawled(self, source_url, when)
    }

    fn insert_crawl_skip(&self, skip: CrawlSkip) -> Result<(), Self::Error> {
        myaku_store::IndexStore::insert_crawl_skip(self, skip)
    }
}
