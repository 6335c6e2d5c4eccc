//! Individual article-quality and FLI-modifier factor scorers.
//!
//! Every scorer here returns a value in `[-MAX_FACTOR_SCORE, MAX_FACTOR_SCORE]`;
//! [`crate::Scorer`] combines them with the weights from `spec.md` §4.7.
//! Table boundary values are taken verbatim from the original scorer so the
//! quality ordering of articles doesn't shift under translation.

use time::OffsetDateTime;

use myaku_types::Article;

use crate::value_range::ValueRangeMultipliers;

pub const MAX_FACTOR_SCORE: f64 = 1000.0;

/// Source names recognized by [`BlogRatingScorer`]. `spec.md`'s Scorer is a
/// pure-function table; real source names come from whatever Source
/// Adapters are configured; an unrecognized source falls back to the
/// serialized-blog (Kakuyomu-style) rating curve rather than panicking.
pub const NHK_NEWS_WEB_SOURCE_NAME: &str = "NHK News Web";
pub const KAKUYOMU_SOURCE_NAME: &str = "Kakuyomu";

const LENGTH_RANGE_MULTIPLIERS: ValueRangeMultipliers = ValueRangeMultipliers::new(&[
    (Some(100), -1.0),
    (Some(200), -0.5),
    (Some(300), 0.0),
    (Some(500), 0.6),
    (Some(800), 1.0),
    (Some(1000), 0.8),
    (Some(1300), 0.6),
    (Some(1500), 0.2),
    (Some(2000), 0.0),
    (Some(2500), -0.5),
    (None, -1.0),
]);

/// Scores an article's alnum length: peaks in `(500, 800]`, where an article
/// has enough context around lexical item usage to be useful without
/// becoming a slog to read.
pub fn score_length(article: &Article) -> i64 {
    (MAX_FACTOR_SCORE * LENGTH_RANGE_MULTIPLIERS.get(article.alnum_count as i64)).floor() as i64
}

/// Age-in-days tier boundaries of [`RECENCY_RANGE_MULTIPLIERS`], exposed for
/// `RescorePass` (`spec.md` §4.8), which re-examines only articles whose age
/// crossed one of these boundaries since the previous pass.
pub const RECENCY_TIER_BOUNDARY_DAYS: [i64; 6] = [7, 30, 90, 180, 365, 365 * 3];

const RECENCY_RANGE_MULTIPLIERS: ValueRangeMultipliers = ValueRangeMultipliers::new(&[
    (Some(7), 1.0),
    (Some(30), 0.9),
    (Some(90), 0.6),
    (Some(180), 0.4),
    (Some(365), 0.2),
    (Some(365 * 3), 0.0),
    (None, -0.2),
]);

/// Scores an article's publication recency, rewarding newer articles and
/// lightly penalizing very old ones.
pub fn score_publication_recency(article: &Article, now: OffsetDateTime) -> i64 {
    let age_days = (now - article.last_updated_datetime).whole_days().max(0);
    (MAX_FACTOR_SCORE * RECENCY_RANGE_MULTIPLIERS.get(age_days)).floor() as i64
}

const BLOG_FIRST_ARTICLE_MULTIPLIER: f64 = 1.0;
const SECTION_FIRST_ARTICLE_MULTIPLIER: f64 = 0.5;

/// Scores an article's position in its blog: the very first article in a
/// blog needs the least outside context to enjoy, so it scores highest; the
/// first article of a section scores a bit lower; everything else is
/// neutral (not negative).
pub fn score_blog_article_order(article: &Article) -> i64 {
    if article.blog_article_order_num == Some(1) {
        return (MAX_FACTOR_SCORE * BLOG_FIRST_ARTICLE_MULTIPLIER).floor() as i64;
    }
    if article.blog_section_order_num == Some(1) {
        return (MAX_FACTOR_SCORE * SECTION_FIRST_ARTICLE_MULTIPLIER).floor() as i64;
    }
    0
}

const KAKUYOMU_STAR_RANGE_MULTIPLIERS: ValueRangeMultipliers = ValueRangeMultipliers::new(&[
    (Some(5), -0.5),
    (Some(10), -0.25),
    (Some(20), 0.0),
    (Some(30), 0.25),
    (Some(50), 0.5),
    (Some(70), 0.7),
    (Some(100), 0.8),
    (None, 1.0),
]);
const NHK_NEWS_WEB_MULTIPLIER: f64 = 0.25;

/// Scores an article's blog rating. News sources have no meaningful rating
/// concept and get a constant score; serialized blogs are scored by their
/// star rating.
pub fn score_blog_rating(article: &Article, blog_rating: Option<f64>) -> i64 {
    if article.source_name == NHK_NEWS_WEB_SOURCE_NAME {
        return (MAX_FACTOR_SCORE * NHK_NEWS_WEB_MULTIPLIER).floor() as i64;
    }
    let rating = blog_rating.unwrap_or(0.0) as i64;
    (MAX_FACTOR_SCORE * KAKUYOMU_STAR_RANGE_MULTIPLIERS.get(rating)).floor() as i64
}

/// Scores whether an article has a video.
pub fn score_has_video(article: &Article) -> i64 {
    if article.has_video {
        MAX_FACTOR_SCORE as i64
    } else {
        0
    }
}

const TERM_FREQUENCY_RANGE_MULTIPLIERS: ValueRangeMultipliers = ValueRangeMultipliers::new(&[
    (Some(1), 0.0),
    (Some(2), 0.25),
    (Some(3), 0.5),
    (Some(4), 0.75),
    (None, 1.0),
]);

/// Scores a found lexical item's modifier by how many times it's used in
/// its article: more occurrences make an article a better usage example.
pub fn score_term_frequency(found_position_count: usize) -> i64 {
    (MAX_FACTOR_SCORE * TERM_FREQUENCY_RANGE_MULTIPLIERS.get(found_position_count as i64)).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use myaku_types::ids::BlogId;

    fn mk_article(alnum_count: usize, has_video: bool, source_name: &str) -> Article {
        let mut article = Article::build(
            "t".into(),
            None,
            "u".into(),
            source_name.into(),
            None,
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
            "あ".repeat(alnum_count),
            has_video,
            vec![],
        )
        .unwrap();
        article.alnum_count = alnum_count;
        article
    }

    #[test]
    fn length_peaks_between_500_and_800() {
        let ideal = mk_article(700, false, "x");
        let short = mk_article(50, false, "x");
        let long = mk_article(3000, false, "x");
        assert_eq!(score_length(&ideal), 1000);
        assert_eq!(score_length(&short), -1000);
        assert_eq!(score_length(&long), -1000);
    }

    #[test]
    fn has_video_scores_binary() {
        assert_eq!(score_has_video(&mk_article(0, true, "x")), 1000);
        assert_eq!(score_has_video(&mk_article(0, false, "x")), 0);
    }

    #[test]
    fn blog_order_scores_first_article_highest() {
        let mut article = mk_article(0, false, "x");
        article.blog_id = Some(BlogId::new(1));
        article.blog_article_order_num = Some(1);
        assert_eq!(score_blog_article_order(&article), 1000);

        article.blog_article_order_num = Some(2);
        article.blog_section_order_num = Some(1);
        assert_eq!(score_blog_article_order(&article), 500);

        article.blog_section_order_num = Some(2);
        assert_eq!(score_blog_article_order(&article), 0);
    }

    #[test]
    fn nhk_news_gets_fixed_rating_score() {
        let article = mk_article(0, false, NHK_NEWS_WEB_SOURCE_NAME);
        assert_eq!(score_blog_rating(&article, None), 250);
    }

    #[test]
    fn kakuyomu_uses_star_table() {
        let article = mk_article(0, false, KAKUYOMU_SOURCE_NAME);
        assert_eq!(score_blog_rating(&article, Some(3.0)), -500);
        assert_eq!(score_blog_rating(&article, Some(200.0)), 1000);
    }

    #[test]
    fn term_frequency_rewards_repetition() {
        assert_eq!(score_term_frequency(1), 0);
        assert_eq!(score_term_frequency(5), 1000);
    }
}
