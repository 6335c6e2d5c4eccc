/// A single run of a preview sample's text, marked for whether it falls
/// inside one of the query's match positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSegment {
    pub is_query_match: bool,
    pub text: String,
}

impl PreviewSegment {
    pub fn new(is_query_match: bool, text: impl Into<String>) -> Self {
        PreviewSegment { is_query_match, text: text.into() }
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One rendered preview sample: a contiguous (possibly trimmed or expanded)
/// span of an article's text, split into match/non-match segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSampleText {
    pub text_start_index: usize,
    pub segments: Vec<PreviewSegment>,
}

impl PreviewSampleText {
    pub fn text_len(&self) -> usize {
        segments_len(&self.segments)
    }

    /// A human-readable position label for the API response's
    /// `articlePositionLabel` field: `"Article title"` if the sample starts
    /// inside the title, else a rounded percent-into-article.
    pub fn position_label(&self, title_len: usize, article_len: usize) -> String {
        if self.text_start_index < title_len {
            return "Article title".to_string();
        }
        if article_len == 0 {
            return "0% into article".to_string();
        }
        let percent = ((self.text_start_index as f64 / article_len as f64) * 100.0).round() as i64;
        format!("{percent}% into article")
    }
}

/// The full preview for a search result: a main sample plus up to two extra
/// samples, per `spec.md` §4.9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePreview {
    pub main_sample_text: PreviewSampleText,
    pub extra_sample_texts: Vec<PreviewSampleText>,
}

pub(crate) fn segments_len(segments: &[PreviewSegment]) -> usize {
    segments.iter().map(PreviewSegment::len).sum()
}

/// Collapses runs of whitespace into a single ideographic space (`\u{3000}`),
/// per `spec.md` §4.9.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('\u{3000}');
                in_whitespace = true;
            }
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}
