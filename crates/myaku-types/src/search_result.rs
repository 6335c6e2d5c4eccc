use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::ids::ArticleId;
use crate::position::Position;
use crate::query::Query;

/// A row returned by a search: one article, possibly matching the query
/// through more than one base form (after merging consecutive index rows
/// with the same `article_id`, per `spec.md` §4.11).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub article_id: ArticleId,
    pub article: Article,
    pub matched_base_forms: Vec<String>,
    pub found_positions: Vec<Position>,
    pub quality_score: i64,
}

/// One page of search results, as produced by `IndexSearcher::search` and
/// cached verbatim by the first-page/next-page caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultPage {
    pub query: Query,
    pub total_results: u64,
    pub search_results: Vec<SearchResult>,
}

impl SearchResultPage {
    pub fn empty(query: Query) -> Self {
        SearchResultPage { query, total_results: 0, search_results: Vec::new() }
    }
}

/// Number of results per search results page.
pub const SEARCH_RESULTS_PAGE_SIZE: usize = 20;
