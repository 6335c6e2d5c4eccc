use futures::stream::BoxStream;

use crate::candidate::ArticleCandidate;

/// A single crawl run of a source: a display name plus a stream of
/// candidates. Mirrors the original's `Crawl` named tuple
/// (`crawl_name`, `crawl_gen`), with the generator replaced by an async
/// stream so fetching the candidate listing itself can suspend.
pub struct Crawl {
    pub name: String,
    pub candidates: BoxStream<'static, ArticleCandidate>,
}

impl Crawl {
    pub fn new(name: impl Into<String>, candidates: BoxStream<'static, ArticleCandidate>) -> Self {
        Crawl { name: name.into(), candidates }
    }
}
