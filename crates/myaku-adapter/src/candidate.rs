use time::OffsetDateTime;

use myaku_types::{Blog, Crawlable};

/// A listing-page sighting of an article, before the article page itself has
/// been fetched.
///
/// Carries just enough of `JpnArticleMetadata` (see the original's
/// `myaku.datatypes.JpnArticleMetadata`) for `CrawlTracker::filter_to_updated`
/// to decide whether the article is worth fetching, and for
/// `SourceAdapter::fetch_article` to attach the rest once it parses the
/// article page itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleCandidate {
    pub source_url: String,
    pub source_name: String,
    pub last_updated_datetime: Option<OffsetDateTime>,
    pub blog: Option<Blog>,
    pub blog_article_order_num: Option<u32>,
    pub blog_section_name: Option<String>,
    pub blog_section_order_num: Option<u32>,
    pub blog_section_article_order_num: Option<u32>,
}

impl ArticleCandidate {
    pub fn new(source_url: impl Into<String>, source_name: impl Into<String>) -> Self {
        ArticleCandidate {
            source_url: source_url.into(),
            source_name: source_name.into(),
            last_updated_datetime: None,
            blog: None,
            blog_article_order_num: None,
            blog_section_name: None,
            blog_section_order_num: None,
            blog_section_article_order_num: None,
        }
    }
}

impl Crawlable for ArticleCandidate {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn last_updated_datetime(&self) -> Option<OffsetDateTime> {
        self.last_updated_datetime
    }
}
