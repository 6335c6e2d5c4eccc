//! Core data model and error taxonomy shared by every crate in the Myaku
//! search workspace: `Article`, `Blog`, `FoundLexicalItem`, `Position`,
//! `Interpretation`, `Query`, `SearchResult`, `RankKey`, and the error kinds
//! from `spec.md` §7.

pub mod article;
pub mod blog;
pub mod crawl;
pub mod error;
pub mod fli;
pub mod ids;
pub mod interp;
pub mod position;
pub mod query;
pub mod rank_key;
pub mod search_result;
pub mod width;

pub use article::{Article, ArticleBuildError, MAX_ARTICLE_TEXT_LEN, SENTENCE_ENDERS};
pub use blog::Blog;
pub use crawl::{Crawlable, CrawlSkip};
pub use error::{Error, InternalError, Result, SkipReason, UserError};
pub use fli::{reduce_found_lexical_items, FoundLexicalItem};
pub use ids::{ArticleId, BlogId, FliId};
pub use interp::{InterpSource, Interpretation, MecabInterp};
pub use position::Position;
pub use query::{Query, QueryType};
pub use rank_key::RankKey;
pub use search_result::{SearchResult, SearchResultPage, SEARCH_RESULTS_PAGE_SIZE};
