//! Composes the individual factor scorers into an article quality score and
//! a found-lexical-item modifier score, weighted per `spec.md` §4.7.
//!
//! Mirrors `myaku.scorer.MyakuArticleScorer`: each factor's `[-1000, 1000]`
//! output is multiplied by an integer weight and the weighted factors are
//! summed, so a single dominant factor (e.g. a viral-length article) can't
//! swing the score further than its weight allows relative to the others.

use time::OffsetDateTime;

use myaku_types::{Article, FoundLexicalItem};

use crate::factor_scorers;

/// `(weight, name)` pairs applied to article-level factors, in the order
/// they're summed. Total weight is 9, so the fully-weighted score range is
/// `[-9000, 9000]`.
const ARTICLE_LENGTH_WEIGHT: i64 = 3;
const BLOG_ARTICLE_ORDER_WEIGHT: i64 = 1;
const BLOG_RATING_WEIGHT: i64 = 2;
const HAS_VIDEO_WEIGHT: i64 = 1;
const PUBLICATION_RECENCY_WEIGHT: i64 = 2;

const TERM_FREQUENCY_WEIGHT: i64 = 3;

/// Scores articles and found-lexical-item modifiers for search ranking.
///
/// Stateless; every method is a pure function of its inputs plus `now`,
/// which the caller supplies so tests and rescoring passes can pin the
/// clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scorer;

impl Scorer {
    pub fn new() -> Self {
        Scorer
    }

    /// Computes an article's `quality_score`, the base `composite_score`
    /// contribution shared by every found lexical item in that article.
    pub fn score_article(&self, article: &Article, blog_rating: Option<f64>, now: OffsetDateTime) -> i64 {
        factor_scorers::score_length(article) * ARTICLE_LENGTH_WEIGHT
            + factor_scorers::score_blog_article_order(article) * BLOG_ARTICLE_ORDER_WEIGHT
            + factor_scorers::score_blog_rating(article, blog_rating) * BLOG_RATING_WEIGHT
            + factor_scorers::score_has_video(article) * HAS_VIDEO_WEIGHT
            + factor_scorers::score_publication_recency(article, now) * PUBLICATION_RECENCY_WEIGHT
    }

    /// Computes a found lexical item's `quality_score_mod`, added to its
    /// article's `quality_score` to produce the item's composite scores.
    pub fn score_fli_modifier(&self, fli: &FoundLexicalItem) -> i64 {
        factor_scorers::score_term_frequency(fli.found_positions.len()) * TERM_FREQUENCY_WEIGHT
    }

    /// Scores an article and applies the result to `article.quality_score`.
    pub fn rescore_article(&self, article: &mut Article, blog_rating: Option<f64>, now: OffsetDateTime) {
        article.quality_score = self.score_article(article, blog_rating, now);
    }

    /// Scores a found lexical item's modifier and denormalizes its composite
    /// scores against the (already rescored) owning article.
    pub fn rescore_fli(&self, fli: &mut FoundLexicalItem, article: &Article) {
        fli.quality_score_mod = self.score_fli_modifier(fli);
        fli.denormalize_scores(article.quality_score, article.last_updated_datetime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myaku_types::Position;

    fn mk_article() -> Article {
        Article::build(
            "t".into(),
            None,
            "u".into(),
            "x".into(),
            None,
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
            "あ".repeat(700),
            false,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn rescore_article_sets_quality_score() {
        let scorer = Scorer::new();
        let mut article = mk_article();
        scorer.rescore_article(&mut article, None, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(article.quality_score, scorer.score_article(&article, None, OffsetDateTime::UNIX_EPOCH));
    }

    #[test]
    fn rescore_fli_propagates_article_score_into_composite_scores() {
        let scorer = Scorer::new();
        let mut article = mk_article();
        scorer.rescore_article(&mut article, None, OffsetDateTime::UNIX_EPOCH);

        let mut fli = FoundLexicalItem::new_unscored(
            "走る".into(),
            article.id.unwrap_or(myaku_types::ArticleId::new(1)),
            vec![Position::new(0, 2)],
            vec![],
            Default::default(),
        );
        scorer.rescore_fli(&mut fli, &article);
        assert_eq!(fli.quality_score_exact, article.quality_score + fli.quality_score_mod);
        assert_eq!(fli.quality_score_definite, fli.quality_score_exact);
        assert_eq!(fli.quality_score_possible, fli.quality_score_exact);
    }
}
