use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::BlogId;

/// Info for a blog of Japanese text articles.
///
/// Identity is `source_url`. A `Blog` is created on first sighting and
/// upserted (replaced wholesale) on subsequent crawls; it is owned by the
/// index and never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    /// Assigned by the store on first upsert; `None` before that.
    pub id: Option<BlogId>,
    pub source_url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub source_name: String,
    pub publication_datetime: Option<OffsetDateTime>,
    pub last_updated_datetime: Option<OffsetDateTime>,
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub tags: Vec<String>,
    pub catchphrase: Option<String>,
    pub introduction: Option<String>,
    pub article_count: Option<u64>,
    pub total_char_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub follower_count: Option<u64>,
    pub in_serialization: Option<bool>,
    pub last_crawled_datetime: Option<OffsetDateTime>,
}

impl crate::crawl::Crawlable for Blog {
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

impl Blog {
    /// Builds a new, not-yet-stored blog for `source_url`/`source_name`.
    /// Every other attribute defaults to absent and is filled in by the
    /// Source Adapter before the blog is passed to `IndexStore::upsert_blog`.
    pub fn new(source_url: impl Into<String>, source_name: impl Into<String>) -> Self {
        Blog {
            id: None,
            source_url: source_url.into(),
            title: None,
            author: None,
            source_name: source_name.into(),
            publication_datetime: None,
            last_updated_datetime: None,
            rating: None,
            rating_count: None,
            tags: Vec::new(),
            catchphrase: None,
            introduction: None,
            article_count: None,
            total_char_count: None,
            comment_count: None,
            follower_count: None,
            in_serialization: None,
            last_crawled_datetime: None,
        }
    }
}
