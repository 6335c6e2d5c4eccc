use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::ids::{ArticleId, BlogId};
use crate::width::{alnum_count, normalize_char_width};

/// Hard cap on `Article::full_text` length. Articles over this are rejected
/// at store time and recorded as a `CrawlSkip`.
pub const MAX_ARTICLE_TEXT_LEN: usize = 65_536;

/// Japanese sentence terminators used both by length-group/alnum accounting
/// and by `PreviewBuilder`'s sentence grouping.
pub const SENTENCE_ENDERS: [char; 6] = ['。', '？', '！', '?', '!', '\n'];

/// Alnum-length buckets used by the original's found-lexical-item position
/// quality ranking (kept for completeness per `SPEC_FULL.md` §3; not used by
/// the ranking computations `spec.md` actually specifies).
pub const ARTICLE_LEN_GROUPS: [u64; 2] = [1000, 500];

/// The full text and metadata for a Japanese text article.
///
/// Identity is an opaque `id` assigned at first store; also addressable by
/// `source_url` and content-addressable by `text_hash`. `text_hash` and
/// `alnum_count` are derived deterministically from `full_text` at
/// construction time via [`Article::build`] rather than recomputed lazily on
/// every read, so downstream code can treat an `Article` as immutable once
/// built (see `SPEC_FULL.md`'s note on dataclass-with-property
/// auto-conversion becoming a validating constructor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<ArticleId>,
    pub title: String,
    pub author: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub blog_id: Option<BlogId>,
    pub blog_article_order_num: Option<u32>,
    pub blog_section_name: Option<String>,
    pub blog_section_order_num: Option<u32>,
    pub blog_section_article_order_num: Option<u32>,
    pub publication_datetime: OffsetDateTime,
    pub last_updated_datetime: OffsetDateTime,
    pub last_crawled_datetime: Option<OffsetDateTime>,
    pub full_text: String,
    pub alnum_count: usize,
    pub has_video: bool,
    pub tags: Vec<String>,
    pub quality_score: i64,
    pub text_hash: String,
}

/// Error raised when building an [`Article`] from out-of-policy input.
#[derive(Debug, thiserror::Error)]
pub enum ArticleBuildError {
    #[error("article text length {actual} exceeds the cap of {cap}")]
    TooLong { actual: usize, cap: usize },
}

impl Article {
    /// Builds an article, deriving `text_hash` and `alnum_count` from
    /// `full_text` and rejecting text over [`MAX_ARTICLE_TEXT_LEN`] chars.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        title: String,
        author: Option<String>,
        source_url: String,
        source_name: String,
        blog_id: Option<BlogId>,
        publication_datetime: OffsetDateTime,
        last_updated_datetime: OffsetDateTime,
        full_text: String,
        has_video: bool,
        tags: Vec<String>,
    ) -> Result<Self, ArticleBuildError> {
        if full_text.chars().count() > MAX_ARTICLE_TEXT_LEN {
            return Err(ArticleBuildError::TooLong {
                actual: full_text.chars().count(),
                cap: MAX_ARTICLE_TEXT_LEN,
            });
        }
        let normalized = normalize_char_width(&full_text);
        let text_hash = Self::hash_text(&full_text);
        let alnum = alnum_count(&normalized);
        Ok(Article {
            id: None,
            title,
            author,
            source_url,
            source_name,
            blog_id,
            blog_article_order_num: None,
            blog_section_name: None,
            blog_section_order_num: None,
            blog_section_article_order_num: None,
            publication_datetime,
            last_updated_datetime,
            last_crawled_datetime: None,
            full_text,
            alnum_count: alnum,
            has_video,
            tags,
            quality_score: 0,
            text_hash,
        })
    }

    pub fn hash_text(full_text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(full_text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// The alnum-length bucket this article falls in, per
    /// `SPEC_FULL.md` §3.
    pub fn len_group(&self) -> u64 {
        for group_min in ARTICLE_LEN_GROUPS {
            if self.alnum_count as u64 >= group_min {
                return group_min;
            }
        }
        0
    }

    /// Returns the `[start, end)` char bounds of the sentence containing
    /// `index`, using [`SENTENCE_ENDERS`] as sentence boundaries.
    pub fn containing_sentence_bounds(&self, index: usize) -> (usize, usize) {
        let chars: Vec<char> = self.full_text.chars().collect();
        let start = find_sentence_start(&chars, index);
        let end = find_sentence_end(&chars, index);
        (start, end)
    }

    /// Slices `full_text` by char offsets, matching `Position`'s
    /// `[start, start+len)` semantics.
    pub fn slice(&self, start: usize, len: usize) -> String {
        self.full_text.chars().skip(start).take(len).collect()
    }
}

impl crate::crawl::Crawlable for Article {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn last_updated_datetime(&self) -> Option<OffsetDateTime> {
        Some(self.last_updated_datetime)
    }
}

/// Finds the start index (inclusive) of the Japanese sentence containing a
/// char index in `pos`, scanning backward for the nearest prior sentence
/// ender.
fn find_sentence_start(chars: &[char], pos: usize) -> usize {
    let mut pos = pos.min(chars.len().saturating_sub(1));
    while pos > 0
        && SENTENCE_ENDERS.contains(&chars[pos])
        && SENTENCE_ENDERS.contains(&chars[pos - 1])
    {
        pos -= 1;
    }
    for i in (0..pos).rev() {
        if SENTENCE_ENDERS.contains(&chars[i]) {
            return i + 1;
        }
    }
    0
}

/// Finds the end index (exclusive) of the Japanese sentence containing a
/// char index in `pos`, scanning forward for the nearest run of sentence
/// enders and returning just past the last ender in that run.
fn find_sentence_end(chars: &[char], pos: usize) -> usize {
    let mut i = pos;
    while i < chars.len() && !SENTENCE_ENDERS.contains(&chars[i]) {
        i += 1;
    }
    if i >= chars.len() {
        return chars.len();
    }
    while i + 1 < chars.len() && SENTENCE_ENDERS.contains(&chars[i + 1]) {
        i += 1;
    }
    i + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(text: &str) -> Article {
        Article::build(
            "title".into(),
            None,
            "https://example.test/a".into(),
            "example".into(),
            None,
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
            text.into(),
            false,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn text_hash_is_deterministic_sha256() {
        let a = mk("同じテキスト");
        let b = mk("同じテキスト");
        assert_eq!(a.text_hash, b.text_hash);
        assert_eq!(Article::hash_text("同じテキスト"), a.text_hash);
    }

    #[test]
    fn too_long_article_is_rejected() {
        let text: String = "あ".repeat(MAX_ARTICLE_TEXT_LEN + 1);
        let err = Article::build(
            "t".into(),
            None,
            "u".into(),
            "s".into(),
            None,
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
            text,
            false,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ArticleBuildError::TooLong { .. }));
    }

    #[test]
    fn alnum_count_reflects_width_normalized_text() {
        let article = mk("ａｂｃ123走る。");
        assert_eq!(article.alnum_count, 6);
    }

    #[test]
    fn sentence_bounds_split_on_enders() {
        let article = mk("一文目です。二文目です！三文目。");
        let (start, end) = article.containing_sentence_bounds(2);
        let chars: Vec<char> = article.full_text.chars().collect();
        let sentence: String = chars[start..end].iter().collect();
        assert_eq!(sentence, "一文目です。");
    }
}
