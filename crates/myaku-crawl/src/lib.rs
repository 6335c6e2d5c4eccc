//! Crawl orchestration: turns a [`myaku_adapter::SourceAdapter`]'s discovered
//! candidates into written, scored, searchable index entries.
//!
//! [`CrawlPipeline`] is the entry point; [`tracker`] and [`stats`] are the
//! pure, independently-tested pieces it composes.

mod error;
mod pipeline;
mod rescore;
mod stats;
mod tracker;

pub use error::{CrawlError, CrawlResult};
pub use pipeline::{CrawlPipeline, MAX_WORKERS_PER_CRAWL, MIN_WORKERS_PER_CRAWL};
pub use rescore::{RescorePass, RescoreStats};
pub use stats::{CrawlCounts, CrawlStats};
pub use tracker::{CrawlTracker, TrackerStore};
