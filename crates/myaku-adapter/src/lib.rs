//! The `SourceAdapter` interface: per-site article discovery and fetching.
//!
//! Implementations are external to this workspace (one per site, e.g. a
//! blog platform or a news site); only the interface and its supporting
//! types live here. Mirrors the shape of the original's
//! `myaku.crawlers.abc.CrawlerABC`.

mod adapter;
mod candidate;
mod crawl;

pub use adapter::{FetchOutcome, SourceAdapter};
pub use candidate::ArticleCandidate;
pub use crawl::Crawl;
