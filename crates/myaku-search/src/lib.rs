//! Query → ranked, preview-annotated search results, per `spec.md` §4.11.
//!
//! [`IndexSearcher`] consults the two-tier cache (`myaku-cache`) before
//! falling back to [`myaku_store::IndexStore`], renders previews via
//! `myaku-preview`, and dispatches background warming jobs through a
//! pluggable [`scheduler::JobQueue`] — see `SPEC_FULL.md` §4.11 and §5.

mod cache_tier;
mod error;
mod response;
mod scheduler;
mod searcher;

pub use cache_tier::{FirstPageCacheLike, NextPageCacheLike};
pub use error::{SearchError, SearchOutcome};
pub use response::{ArticleResultView, SampleTextView, SearchResponse, SegmentView};
pub use scheduler::{CollectingJobQueue, JobQueue, TokioJobQueue};
pub use searcher::{IndexSearcher, SearchConfig};
