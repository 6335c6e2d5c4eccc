//! Article and found-lexical-item quality scoring.
//!
//! Implements the ranking factors from `spec.md` §4.7: a set of independent
//! [`ValueRangeMultipliers`]-backed factor scorers, combined by [`Scorer`]
//! into an article's `quality_score` and a found lexical item's
//! `quality_score_mod`.

mod factor_scorers;
mod scorer;
mod value_range;

pub use factor_scorers::{
    score_blog_article_order, score_blog_rating, score_has_video, score_length,
    score_publication_recency, score_term_frequency, KAKUYOMU_SOURCE_NAME, MAX_FACTOR_SCORE,
    NHK_NEWS_WEB_SOURCE_NAME, RECENCY_TIER_BOUNDARY_DAYS,
};
pub use scorer::Scorer;
pub use value_range::ValueRangeMultipliers;
