use std::collections::{BTreeMap, HashMap, HashSet};

use myaku_types::{Article, Position};

use crate::types::{collapse_whitespace, segments_len, ArticlePreview, PreviewSampleText, PreviewSegment};

const MIN_ACCEPTABLE_SAMPLE_LEN: usize = 50;
const MIN_IDEAL_SAMPLE_LEN: usize = 70;
const MAX_IDEAL_SAMPLE_LEN: usize = 90;
const MAX_ACCEPTABLE_SAMPLE_LEN: usize = 100;

const MAX_PREVIEW_ARTICLE_SAMPLES: usize = 3;
const MAX_PREVIEW_ARTICLE_PERCENT: f64 = 0.15;

const TRIMMED_INDICATOR: &str = "...";
const MIN_CHARS_BETWEEN_MATCH_AND_TRIM: usize = 8;

/// Builds article previews from match positions, per `spec.md` §4.9: groups
/// matches by containing sentence, ranks sentences by preview quality,
/// builds a sample from the best unused sentence, then trims or expands it
/// to land in `[50, 100]` chars — repeating for up to 3 samples, bounded by
/// 15% of the article's length.
///
/// Stateless and cheaply constructible; each call to [`Self::build`] does
/// its own bookkeeping internally.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreviewBuilder;

impl PreviewBuilder {
    pub fn new() -> Self {
        PreviewBuilder
    }

    pub fn build(&self, article: &Article, found_positions: &[Position]) -> Option<ArticlePreview> {
        if found_positions.is_empty() {
            return None;
        }
        let mut session = Session::new(article);
        let samples = session.create_all_sample_texts(found_positions);
        let mut iter = samples.into_iter();
        let main_sample_text = iter.next()?;
        Some(ArticlePreview { main_sample_text, extra_sample_texts: iter.collect() })
    }
}

/// Per-build bookkeeping: which sentences have been used already, and a
/// lookup from sentence start to the match positions inside it, so
/// expansion can attach the right matches when pulling in a neighboring
/// sentence that wasn't part of the original ranked group list.
struct Session<'a> {
    chars: Vec<char>,
    title_len: usize,
    article_len: usize,
    article: &'a Article,
    used_sentences: HashSet<usize>,
    sentence_positions: HashMap<usize, Vec<Position>>,
}

impl<'a> Session<'a> {
    fn new(article: &'a Article) -> Self {
        let chars: Vec<char> = article.full_text.chars().collect();
        let article_len = chars.len();
        let title_len = article.title.chars().count();
        Session { chars, title_len, article_len, article, used_sentences: HashSet::new(), sentence_positions: HashMap::new() }
    }

    fn slice(&self, start: usize, len: usize) -> String {
        let end = (start + len).min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// `(start, end)` char bounds of the sentence containing `index`.
    fn sentence_bounds(&self, index: usize) -> (usize, usize) {
        self.article.containing_sentence_bounds(index)
    }

    fn create_all_sample_texts(&mut self, found_positions: &[Position]) -> Vec<PreviewSampleText> {
        let mut groups: BTreeMap<usize, (usize, Vec<Position>)> = BTreeMap::new();
        for &pos in found_positions {
            let (start, end) = self.sentence_bounds(pos.start);
            let entry = groups.entry(start).or_insert((end, Vec::new()));
            entry.1.push(pos);
        }
        for (start, (_, matches)) in groups.iter_mut() {
            matches.sort_by_key(|p| p.start);
            self.sentence_positions.insert(*start, matches.clone());
        }

        let mut ranked: Vec<(Position, Vec<Position>)> =
            groups.into_iter().map(|(start, (end, matches))| (Position::new(start, end - start), matches)).collect();
        ranked.sort_by_key(|(span, _)| std::cmp::Reverse(quality_key(span.len)));

        let collapsed_article_len = collapse_whitespace(&self.article.full_text).chars().count().max(1);
        let mut samples = Vec::new();
        for (span, matches) in ranked {
            if self.used_sentences.contains(&span.start) {
                continue;
            }
            samples.push(self.create_sample_text(span, &matches));

            let total_len: usize = samples.iter().map(PreviewSampleText::text_len).sum();
            let percent = total_len as f64 / collapsed_article_len as f64;
            if samples.len() > 1 && percent > MAX_PREVIEW_ARTICLE_PERCENT {
                samples.pop();
                break;
            }
            if samples.len() >= MAX_PREVIEW_ARTICLE_SAMPLES {
                break;
            }
        }
        samples
    }

    fn create_sample_text(&mut self, span: Position, matches: &[Position]) -> PreviewSampleText {
        let segments = self.create_sample_segments(span, matches);
        let mut sample = PreviewSampleText { text_start_index: span.start, segments };
        self.used_sentences.insert(span.start);

        if sample.text_len() > MAX_ACCEPTABLE_SAMPLE_LEN {
            self.trim_sample_text(&mut sample);
        } else {
            self.expand_sample_text(&mut sample, span);
        }
        sample
    }

    fn create_sample_segments(&self, span: Position, matches: &[Position]) -> Vec<PreviewSegment> {
        let mut segments = Vec::new();
        let mut last_end = span.start;
        for pos in matches {
            if last_end != pos.start {
                segments.push(PreviewSegment::new(false, self.slice(last_end, pos.start - last_end)));
                last_end = pos.start;
            }
            segments.push(PreviewSegment::new(true, self.slice(pos.start, pos.len)));
            last_end = pos.start + pos.len;
        }
        let span_end = span.start + span.len;
        if last_end < span_end {
            segments.push(PreviewSegment::new(false, self.slice(last_end, span_end - last_end)));
        }
        if let Some(first) = segments.first_mut() {
            first.text = first.text.trim_start().to_string();
        }
        if let Some(last) = segments.last_mut() {
            last.text = last.text.trim_end().to_string();
        }
        for seg in &mut segments {
            seg.text = collapse_whitespace(&seg.text);
        }
        segments
    }

    fn trim_sample_text(&self, sample: &mut PreviewSampleText) {
        let segs = sample.segments.clone();
        let (max_start, max_end) = max_query_match_bounds(&segs);
        let mut trimmed: Vec<PreviewSegment> = segs[max_start..max_end].to_vec();
        let trimmed_len = segments_len(&trimmed);
        let chars_from_start = segments_len(&segs[0..max_start]);
        let chars_to_end = segments_len(&segs[max_end..]);
        sample.text_start_index += chars_from_start;

        let left_added_chars = if trimmed_len >= MAX_ACCEPTABLE_SAMPLE_LEN {
            0
        } else if trimmed_len + chars_from_start + MIN_CHARS_BETWEEN_MATCH_AND_TRIM <= MAX_ACCEPTABLE_SAMPLE_LEN {
            append_full_left_remainder_right(&segs, &mut trimmed, max_start, max_end, chars_from_start)
        } else if trimmed_len + chars_to_end + MIN_CHARS_BETWEEN_MATCH_AND_TRIM <= MAX_ACCEPTABLE_SAMPLE_LEN {
            append_full_right_remainder_left(&segs, &mut trimmed, max_start, max_end)
        } else {
            append_left_right_balance(&segs, &mut trimmed, max_start, max_end)
        };

        sample.text_start_index -= left_added_chars;
        sample.segments = trimmed;
    }

    fn expand_sample_text(&mut self, sample: &mut PreviewSampleText, span: Position) {
        let mut pos = self.expand_left(sample, span, true);
        pos = self.expand_right(sample, pos, true);
        if sample.text_len() >= MIN_ACCEPTABLE_SAMPLE_LEN {
            return;
        }

        pos = self.expand_left(sample, pos, false);
        pos = self.expand_right(sample, pos, false);
        if sample.text_len() >= MIN_ACCEPTABLE_SAMPLE_LEN {
            return;
        }

        let pos = self.force_expand_left_up_to_max(sample, pos);
        if sample.text_len() >= MIN_ACCEPTABLE_SAMPLE_LEN {
            return;
        }
        self.force_expand_right_up_to_max(sample, pos);
    }

    fn can_expand_left(&self, pos: Position) -> bool {
        if pos.start == 0 {
            return false;
        }
        let (left_start, _) = self.sentence_bounds(pos.start - 1);
        if pos.start >= self.title_len && left_start < self.title_len {
            return false;
        }
        !self.used_sentences.contains(&left_start)
    }

    fn paragraph_continues_left(&self, pos: Position) -> bool {
        pos.start != 0 && !self.chars[pos.start - 1].is_whitespace()
    }

    fn get_left_sentence_segs(&self, pos: Position) -> (Vec<PreviewSegment>, usize) {
        let (left_start, _) = self.sentence_bounds(pos.start - 1);
        let matches = self.sentence_positions.get(&left_start).cloned().unwrap_or_default();
        let segs = self.create_sample_segments(Position::new(left_start, pos.start - left_start), &matches);
        (segs, left_start)
    }

    fn expand_left(&mut self, sample: &mut PreviewSampleText, pos: Position, only_if_paragraph_continues: bool) -> Position {
        let mut current = pos;
        loop {
            if !self.can_expand_left(current) {
                break;
            }
            if only_if_paragraph_continues && !self.paragraph_continues_left(current) {
                break;
            }
            let (left_segs, left_start) = self.get_left_sentence_segs(current);
            if !should_expand(&sample.segments, &left_segs) {
                break;
            }
            for seg in left_segs.into_iter().rev() {
                sample.segments.insert(0, seg);
            }
            self.used_sentences.insert(left_start);
            current = Position::new(left_start, current.end() - left_start);
        }
        sample.text_start_index = current.start;
        current
    }

    fn can_expand_right(&self, pos: Position) -> bool {
        if pos.end() >= self.article_len {
            return false;
        }
        if pos.start < self.title_len {
            let mut right_end = pos.end();
            while right_end > 0 && self.chars[right_end] == '\n' {
                right_end -= 1;
            }
            if right_end >= self.title_len {
                return false;
            }
        }
        !self.used_sentences.contains(&pos.end())
    }

    fn paragraph_continues_right(&self, pos: Position) -> bool {
        pos.end() != self.article_len && !self.chars[pos.end()].is_whitespace()
    }

    fn get_right_sentence_segs(&self, pos: Position) -> (Vec<PreviewSegment>, usize) {
        let right_start = pos.end();
        let (_, right_end) = self.sentence_bounds(right_start);
        let matches = self.sentence_positions.get(&right_start).cloned().unwrap_or_default();
        let segs = self.create_sample_segments(Position::new(right_start, right_end - right_start), &matches);
        (segs, right_end)
    }

    fn expand_right(&mut self, sample: &mut PreviewSampleText, pos: Position, only_if_paragraph_continues: bool) -> Position {
        let mut current = pos;
        loop {
            if !self.can_expand_right(current) {
                break;
            }
            if only_if_paragraph_continues && !self.paragraph_continues_right(current) {
                break;
            }
            let (right_segs, right_end) = self.get_right_sentence_segs(current);
            if !should_expand(&sample.segments, &right_segs) {
                break;
            }
            self.used_sentences.insert(current.end());
            sample.segments.extend(right_segs);
            current = Position::new(current.start, right_end - current.start);
        }
        current
    }

    /// Expands left past the ideal range using a partial sentence, up to
    /// `MAX_ACCEPTABLE_SAMPLE_LEN`. `text_start_index` only advances when an
    /// iteration stays under the cap — matching the original's behavior of
    /// leaving the position stale on the iteration that hits the cap, since
    /// that sample is already at its final, capped length regardless.
    fn force_expand_left_up_to_max(&mut self, sample: &mut PreviewSampleText, pos: Position) -> Position {
        let mut current = pos;
        loop {
            if !self.can_expand_left(current) {
                break;
            }
            let (left_segs, left_start) = self.get_left_sentence_segs(current);
            let mut excess = 0usize;
            for seg in left_segs.into_iter().rev() {
                sample.segments.insert(0, seg);
                let len_now = sample.text_len();
                if len_now >= MAX_ACCEPTABLE_SAMPLE_LEN {
                    excess = len_now - MAX_ACCEPTABLE_SAMPLE_LEN;
                    let text = sample.segments[0].text.clone();
                    sample.segments[0].text = text.chars().skip(excess).collect();
                    break;
                }
            }
            if sample.text_len() >= MAX_ACCEPTABLE_SAMPLE_LEN {
                if excess > 0 {
                    sample.segments.insert(0, PreviewSegment::new(false, TRIMMED_INDICATOR));
                }
                break;
            }
            self.used_sentences.insert(left_start);
            current = Position::new(left_start, current.end() - left_start);
        }
        sample.text_start_index = current.start;
        current
    }

    /// Expands right past the ideal range using a partial sentence, up to
    /// `MAX_ACCEPTABLE_SAMPLE_LEN`.
    fn force_expand_right_up_to_max(&mut self, sample: &mut PreviewSampleText, pos: Position) -> Position {
        let mut current = pos;
        loop {
            if !self.can_expand_right(current) {
                break;
            }
            let (right_segs, right_end) = self.get_right_sentence_segs(current);
            let mut excess = 0usize;
            for seg in right_segs {
                sample.segments.push(seg);
                let len_now = sample.text_len();
                if len_now >= MAX_ACCEPTABLE_SAMPLE_LEN {
                    excess = len_now - MAX_ACCEPTABLE_SAMPLE_LEN;
                    let last = sample.segments.len() - 1;
                    let text = sample.segments[last].text.clone();
                    let keep = text.chars().count().saturating_sub(excess);
                    sample.segments[last].text = text.chars().take(keep).collect();
                    break;
                }
            }
            if sample.text_len() >= MAX_ACCEPTABLE_SAMPLE_LEN {
                if excess > 0 {
                    sample.segments.push(PreviewSegment::new(false, TRIMMED_INDICATOR));
                }
                break;
            }
            self.used_sentences.insert(current.end());
            current = Position::new(current.start, right_end - current.start);
        }
        current
    }
}

/// `(tier, len)`: tier 2 for the ideal `[70,90]` band, 1 for `[50,70)`, 0 for
/// `(90,100]`, -1 for `<50`, -2 for `>100`; ties within a tier prefer the
/// longer sentence.
fn quality_key(len: usize) -> (i32, usize) {
    if (MIN_IDEAL_SAMPLE_LEN..=MAX_IDEAL_SAMPLE_LEN).contains(&len) {
        (2, len)
    } else if (MIN_ACCEPTABLE_SAMPLE_LEN..MIN_IDEAL_SAMPLE_LEN).contains(&len) {
        (1, len)
    } else if len > MAX_IDEAL_SAMPLE_LEN && len <= MAX_ACCEPTABLE_SAMPLE_LEN {
        (0, len)
    } else if len < MIN_ACCEPTABLE_SAMPLE_LEN {
        (-1, len)
    } else {
        (-2, len)
    }
}

fn should_expand(current: &[PreviewSegment], expand: &[PreviewSegment]) -> bool {
    let cur_len = segments_len(current) as i64;
    let exp_len = cur_len + segments_len(expand) as i64;
    let min_ideal = MIN_IDEAL_SAMPLE_LEN as i64;
    let max_ideal = MAX_IDEAL_SAMPLE_LEN as i64;
    if (min_ideal..=max_ideal).contains(&exp_len) {
        return true;
    }
    if (min_ideal..=max_ideal).contains(&cur_len) {
        return false;
    }
    if cur_len < min_ideal && exp_len < min_ideal {
        return true;
    }
    if cur_len > max_ideal && exp_len > max_ideal {
        return false;
    }
    (min_ideal - cur_len) >= (exp_len - max_ideal)
}

/// Finds the contiguous span of `segs` containing the most match segments
/// while staying under `MAX_ACCEPTABLE_SAMPLE_LEN` chars, per `spec.md`
/// §4.9's trim step.
fn max_query_match_bounds(segs: &[PreviewSegment]) -> (usize, usize) {
    let mut max_matches: i64 = -1;
    let mut bounds = (0, segs.len());
    for i in 0..segs.len() {
        if !segs[i].is_query_match {
            continue;
        }
        let mut matches = 0i64;
        let mut section_len = 0usize;
        let mut last_match = i;
        for (j, seg) in segs.iter().enumerate().skip(i) {
            section_len += seg.len();
            if section_len >= MAX_ACCEPTABLE_SAMPLE_LEN {
                break;
            }
            if seg.is_query_match {
                last_match = j;
                matches += 1;
            }
        }
        if matches > max_matches {
            max_matches = matches;
            bounds = (i, last_match + 1);
        }
    }
    bounds
}

fn first_n_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn last_n_chars(s: &str, n: usize) -> String {
    let total = s.chars().count();
    s.chars().skip(total.saturating_sub(n)).collect()
}

/// All of `segs[0..sub_start]` fits within the cap alongside the trimmed
/// match window, so it's kept in full; any remaining room is filled with a
/// partial slice of the segment just past `sub_end`, per
/// `myakuweb/search/article_preview.py`'s `_append_segments_full_left_remainder_right`.
fn append_full_left_remainder_right(
    segs: &[PreviewSegment],
    trimmed: &mut Vec<PreviewSegment>,
    sub_start: usize,
    sub_end: usize,
    chars_from_start: usize,
) -> usize {
    for seg in segs[0..sub_start].iter().rev() {
        trimmed.insert(0, seg.clone());
    }
    let len_now = segments_len(trimmed);
    if len_now < MAX_ACCEPTABLE_SAMPLE_LEN && sub_end < segs.len() {
        let take = MAX_ACCEPTABLE_SAMPLE_LEN - len_now;
        trimmed.push(PreviewSegment::new(false, first_n_chars(&segs[sub_end].text, take)));
    }
    trimmed.push(PreviewSegment::new(false, TRIMMED_INDICATOR));
    chars_from_start
}

/// Mirror of [`append_full_left_remainder_right`] for the opposite side.
fn append_full_right_remainder_left(segs: &[PreviewSegment], trimmed: &mut Vec<PreviewSegment>, sub_start: usize, sub_end: usize) -> usize {
    trimmed.extend_from_slice(&segs[sub_end..]);
    let mut left_added = 0;
    let len_now = segments_len(trimmed);
    if len_now < MAX_ACCEPTABLE_SAMPLE_LEN && sub_start > 0 {
        let take = MAX_ACCEPTABLE_SAMPLE_LEN - len_now;
        let text = last_n_chars(&segs[sub_start - 1].text, take);
        left_added = text.chars().count();
        trimmed.insert(0, PreviewSegment::new(false, text));
    }
    trimmed.insert(0, PreviewSegment::new(false, TRIMMED_INDICATOR));
    left_added
}

/// Splits remaining room evenly between a partial slice to the left and one
/// to the right, for when neither side alone has enough spare room.
fn append_left_right_balance(segs: &[PreviewSegment], trimmed: &mut Vec<PreviewSegment>, sub_start: usize, sub_end: usize) -> usize {
    let len_now = segments_len(trimmed);
    let remaining = MAX_ACCEPTABLE_SAMPLE_LEN.saturating_sub(len_now);
    let left_take = remaining / 2 + remaining % 2;
    let right_take = remaining / 2;

    let mut left_added = 0;
    if sub_start > 0 {
        let text = last_n_chars(&segs[sub_start - 1].text, left_take);
        left_added = text.chars().count();
        trimmed.insert(0, PreviewSegment::new(false, text));
    }
    trimmed.insert(0, PreviewSegment::new(false, TRIMMED_INDICATOR));

    if sub_end < segs.len() {
        trimmed.push(PreviewSegment::new(false, first_n_chars(&segs[sub_end].text, right_take)));
    }
    trimmed.push(PreviewSegment::new(false, TRIMMED_INDICATOR));
    left_added
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn mk_article(full_text: &str) -> Article {
        Article::build(
            "タイトル".to_string(),
            None,
            "https://example.test/a".to_string(),
            "Source".to_string(),
            None,
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
            full_text.to_string(),
            false,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn no_positions_yields_no_preview() {
        let article = mk_article("本文です。");
        let builder = PreviewBuilder::new();
        assert!(builder.build(&article, &[]).is_none());
    }

    #[test]
    fn ideal_length_sentence_is_used_as_is() {
        // A single ~78-char sentence (already in the ideal band) containing
        // one match should come back unexpanded and untrimmed.
        let sentence = "走る".repeat(38) + "走った。";
        let article = mk_article(&sentence);
        let pos = Position::new(0, 2);
        let preview = PreviewBuilder::new().build(&article, &[pos]).unwrap();
        let len = preview.main_sample_text.text_len();
        assert!((50..=100).contains(&len), "expected an acceptable length, got {len}");
        assert!(preview.main_sample_text.segments.iter().any(|s| s.is_query_match));
    }

    #[test]
    fn short_sentence_expands_into_neighbors() {
        let text = "短い文です。次の文が続きます。さらに三文目も続く形です。四文目はこれです。";
        let article = mk_article(text);
        let pos = Position::new(0, 2);
        let preview = PreviewBuilder::new().build(&article, &[pos]).unwrap();
        assert!(preview.main_sample_text.text_len() > 6, "should have expanded past the first short sentence");
    }

    #[test]
    fn long_sentence_is_trimmed_to_the_cap() {
        let sentence = format!("{}走る{}。", "あ".repeat(60), "い".repeat(60));
        let article = mk_article(&sentence);
        let pos = Position::new(60, 2);
        let preview = PreviewBuilder::new().build(&article, &[pos]).unwrap();
        assert!(preview.main_sample_text.text_len() <= MAX_ACCEPTABLE_SAMPLE_LEN);
        assert!(preview.main_sample_text.segments.iter().any(|s| s.is_query_match));
    }

    #[test]
    fn position_label_reports_title_or_percent() {
        let article = mk_article("本文です。");
        let sample = PreviewSampleText { text_start_index: 0, segments: vec![PreviewSegment::new(false, "x")] };
        assert_eq!(sample.position_label(article.title.chars().count(), 10), "Article title");
        let sample = PreviewSampleText { text_start_index: 5, segments: vec![PreviewSegment::new(false, "x")] };
        assert_eq!(sample.position_label(0, 10), "50% into article");
    }
}
