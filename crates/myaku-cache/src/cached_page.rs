use time::OffsetDateTime;

use myaku_types::{ArticleId, Position, Query, SearchResultPage};

/// The subset of an [`myaku_types::Article`]'s fields a search result
/// display needs — title, dates, tags, and the identifiers used to build a
/// link, but not `full_text` or scoring internals. `spec.md` §4.10 calls for
/// "serialized article bodies"; §8's cache round-trip property notes this is
/// lossy by design ("only article display fields are preserved").
#[derive(Debug, Clone, PartialEq)]
pub struct CachedArticle {
    pub article_id: ArticleId,
    pub title: String,
    pub source_name: String,
    pub source_url: String,
    pub publication_datetime: OffsetDateTime,
    pub last_updated_datetime: OffsetDateTime,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedSearchResult {
    pub article: CachedArticle,
    pub matched_base_forms: Vec<String>,
    pub found_positions: Vec<Position>,
    pub quality_score: i64,
}

/// The cacheable projection of a [`SearchResultPage`]: everything a
/// rendered results page needs, and nothing a preview rebuild needs `
/// full_text` for (preview text is rendered once, on the uncached path,
/// and is not itself re-cached — see `DESIGN.md`).
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSearchResultPage {
    pub query: Query,
    pub total_results: u64,
    pub results: Vec<CachedSearchResult>,
}

impl CachedSearchResultPage {
    /// Projects a full [`SearchResultPage`] down to its cacheable display
    /// fields.
    pub fn from_page(page: &SearchResultPage) -> Self {
        CachedSearchResultPage {
            query: page.query.clone(),
            total_results: page.total_results,
            results: page
                .search_results
                .iter()
                .map(|result| CachedSearchResult {
                    article: CachedArticle {
                        article_id: result.article_id,
                        title: result.article.title.clone(),
                        source_name: result.article.source_name.clone(),
                        source_url: result.article.source_url.clone(),
                        publication_datetime: result.article.publication_datetime,
                        last_updated_datetime: result.article.last_updated_datetime,
                        tags: result.article.tags.clone(),
                    },
                    matched_base_forms: result.matched_base_forms.clone(),
                    found_positions: result.found_positions.clone(),
                    quality_score: result.quality_score,
                })
                .collect(),
        }
    }
}
