use serde::Serialize;
use time::OffsetDateTime;

use myaku_preview::{ArticlePreview, PreviewSampleText};
use myaku_types::ArticleId;

/// One segment of a rendered sample text, per `spec.md` §6's
/// `{isQueryMatch, text}` shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentView {
    pub is_query_match: bool,
    pub text: String,
}

/// A rendered sample text, per `spec.md` §6's
/// `{segments, textStartIndex, articlePositionLabel}` shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleTextView {
    pub segments: Vec<SegmentView>,
    pub text_start_index: usize,
    pub article_position_label: String,
}

impl SampleTextView {
    fn from_sample(sample: &PreviewSampleText, title_len: usize, article_len: usize) -> Self {
        SampleTextView {
            segments: sample
                .segments
                .iter()
                .map(|seg| SegmentView { is_query_match: seg.is_query_match, text: seg.text.clone() })
                .collect(),
            text_start_index: sample.text_start_index,
            article_position_label: sample.position_label(title_len, article_len),
        }
    }
}

/// One result row, per `spec.md` §6's `articleResults[]` shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResultView {
    pub article_id: u64,
    pub title: String,
    pub source_name: String,
    pub source_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub publication_datetime: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated_datetime: OffsetDateTime,
    pub instance_count: usize,
    pub tags: Vec<String>,
    pub main_sample_text: SampleTextView,
    pub more_sample_texts: Vec<SampleTextView>,
}

/// Fields describing a single article-result row, independent of whether it
/// was resolved from a fresh store query or a cached page, so both paths in
/// [`crate::IndexSearcher`] can share one constructor.
pub(crate) struct ArticleResultFields {
    pub article_id: ArticleId,
    pub title: String,
    pub source_name: String,
    pub source_url: String,
    pub publication_datetime: OffsetDateTime,
    pub last_updated_datetime: OffsetDateTime,
    pub tags: Vec<String>,
    pub instance_count: usize,
}

impl ArticleResultView {
    pub(crate) fn build(fields: ArticleResultFields, preview: Option<ArticlePreview>, title_len: usize, article_len: usize) -> Self {
        let (main_sample_text, more_sample_texts) = match preview {
            Some(preview) => (
                SampleTextView::from_sample(&preview.main_sample_text, title_len, article_len),
                preview.extra_sample_texts.iter().map(|s| SampleTextView::from_sample(s, title_len, article_len)).collect(),
            ),
            None => (
                SampleTextView { segments: Vec::new(), text_start_index: 0, article_position_label: "0% into article".to_string() },
                Vec::new(),
            ),
        };
        ArticleResultView {
            article_id: fields.article_id.get(),
            title: fields.title,
            source_name: fields.source_name,
            source_url: fields.source_url,
            publication_datetime: fields.publication_datetime,
            last_updated_datetime: fields.last_updated_datetime,
            instance_count: fields.instance_count,
            tags: fields.tags,
            main_sample_text,
            more_sample_texts,
        }
    }
}

/// The full search response, per `spec.md` §6's `GET /search` JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub converted_query: String,
    pub total_results: u64,
    pub page_num: u32,
    pub has_next_page: bool,
    pub max_page_reached: bool,
    pub article_results: Vec<ArticleResultView>,
    /// Set when the request failed internally; per `spec.md` §7, the
    /// response degrades to an empty page with this flag rather than
    /// exposing the internal error kind.
    pub error: bool,
}

impl SearchResponse {
    pub(crate) fn empty_with_error(query_str: String, page_num: u32) -> Self {
        SearchResponse {
            converted_query: query_str,
            total_results: 0,
            page_num,
            has_next_page: false,
            max_page_reached: false,
            article_results: Vec::new(),
            error: true,
        }
    }
}
