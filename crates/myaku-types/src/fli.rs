use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::{ArticleId, FliId};
use crate::interp::Interpretation;
use crate::position::Position;
use crate::width::normalize_char_width;

/// A Japanese lexical item found within a text article: one
/// `(article_id, base_form)` entry in the index.
///
/// `interp_position_map` is a partial map from interpretation to the subset
/// of `found_positions` it applies to; an interpretation with no entry here
/// applies to every position. The three composite scores are denormalized
/// copies of `article_quality_score + quality_score_mod`, kept in sync by
/// `IndexStore::update_article_score`'s cascade — see the invariant in
/// `spec.md` §8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundLexicalItem {
    pub id: Option<FliId>,
    pub base_form: String,
    pub article_id: ArticleId,
    pub found_positions: Vec<Position>,
    pub possible_interps: Vec<Interpretation>,
    pub interp_position_map: HashMap<Interpretation, Vec<Position>>,
    pub quality_score_mod: i64,
    pub article_quality_score: i64,
    pub article_last_updated_datetime: OffsetDateTime,
    pub quality_score_exact: i64,
    pub quality_score_definite: i64,
    pub quality_score_possible: i64,
}

impl FoundLexicalItem {
    /// Constructs an FLI under construction, prior to denormalization of the
    /// composite scores, which `IndexStore::write_flis` fills in.
    pub fn new_unscored(
        base_form: impl Into<String>,
        article_id: ArticleId,
        found_positions: Vec<Position>,
        possible_interps: Vec<Interpretation>,
        interp_position_map: HashMap<Interpretation, Vec<Position>>,
    ) -> Self {
        FoundLexicalItem {
            id: None,
            base_form: normalize_char_width(&base_form.into()),
            article_id,
            found_positions,
            possible_interps,
            interp_position_map,
            quality_score_mod: 0,
            article_quality_score: 0,
            article_last_updated_datetime: OffsetDateTime::UNIX_EPOCH,
            quality_score_exact: 0,
            quality_score_definite: 0,
            quality_score_possible: 0,
        }
    }

    /// Recomputes the three composite scores from the given article score
    /// and this FLI's modifier. Used both at write time and by the
    /// rescore cascade.
    pub fn denormalize_scores(&mut self, article_quality_score: i64, article_last_updated_datetime: OffsetDateTime) {
        self.article_quality_score = article_quality_score;
        self.article_last_updated_datetime = article_last_updated_datetime;
        let composite = article_quality_score + self.quality_score_mod;
        self.quality_score_exact = composite;
        self.quality_score_definite = composite;
        self.quality_score_possible = composite;
    }
}

/// Reduces a list of under-construction FLIs to the minimum-size equivalent
/// set: FLIs sharing `(article_id, base_form)` are combined, their positions
/// and interpretations unioned, and `interp_position_map` records which
/// positions each interpretation applies to (omitted when an interpretation
/// applies to every position for that base form).
///
/// Mirrors `myaku.datatypes.reduce_found_lexical_items`.
pub fn reduce_found_lexical_items(items: Vec<FoundLexicalItem>) -> Vec<FoundLexicalItem> {
    let mut grouped: HashMap<(ArticleId, String), HashMap<Interpretation, HashSet<Position>>> = HashMap::new();

    for item in items {
        let key = (item.article_id, item.base_form.clone());
        let entry = grouped.entry(key).or_default();
        for interp in item.possible_interps {
            let positions = entry.entry(interp).or_default();
            positions.extend(item.found_positions.iter().copied());
        }
    }

    let mut reduced = Vec::with_capacity(grouped.len());
    for ((article_id, base_form), interp_map) in grouped {
        let mut all_positions: HashSet<Position> = HashSet::new();
        for positions in interp_map.values() {
            all_positions.extend(positions.iter().copied());
        }
        let mut found_positions: Vec<Position> = all_positions.iter().copied().collect();
        found_positions.sort();

        let mut interp_position_map = HashMap::new();
        let mut possible_interps = Vec::with_capacity(interp_map.len());
        for (interp, positions) in interp_map {
            if positions != all_positions {
                let mut sorted: Vec<Position> = positions.into_iter().collect();
                sorted.sort();
                interp_position_map.insert(interp.clone(), sorted);
            }
            possible_interps.push(interp);
        }

        reduced.push(FoundLexicalItem::new_unscored(
            base_form,
            article_id,
            found_positions,
            possible_interps,
            interp_position_map,
        ));
    }

    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::InterpSource;

    fn interp(tag: &str) -> Interpretation {
        Interpretation::new(vec![InterpSource::Mecab], None, Some(tag.to_string())).unwrap()
    }

    #[test]
    fn reduce_merges_same_article_and_base_form() {
        let a = ArticleId::new(1);
        let items = vec![
            FoundLexicalItem::new_unscored(
                "走る",
                a,
                vec![Position::new(0, 2)],
                vec![interp("verb")],
                HashMap::new(),
            ),
            FoundLexicalItem::new_unscored(
                "走る",
                a,
                vec![Position::new(10, 2)],
                vec![interp("verb")],
                HashMap::new(),
            ),
        ];
        let reduced = reduce_found_lexical_items(items);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].found_positions.len(), 2);
    }

    #[test]
    fn interp_position_map_omits_interp_applying_to_all_positions() {
        let a = ArticleId::new(1);
        let items = vec![FoundLexicalItem::new_unscored(
            "走る",
            a,
            vec![Position::new(0, 2), Position::new(10, 2)],
            vec![interp("verb")],
            HashMap::new(),
        )];
        let reduced = reduce_found_lexical_items(items);
        assert!(reduced[0].interp_position_map.is_empty());
    }

    #[test]
    fn interp_position_map_records_partial_applicability() {
        let a = ArticleId::new(1);
        let items = vec![
            FoundLexicalItem::new_unscored(
                "走る",
                a,
                vec![Position::new(0, 2)],
                vec![interp("verb"), interp("noun")],
                HashMap::new(),
            ),
            FoundLexicalItem::new_unscored(
                "走る",
                a,
                vec![Position::new(10, 2)],
                vec![interp("verb")],
                HashMap::new(),
            ),
        ];
        let reduced = reduce_found_lexical_items(items);
        assert_eq!(reduced[0].found_positions.len(), 2);
        assert_eq!(reduced[0].interp_position_map.len(), 1);
        let noun_positions = reduced[0].interp_position_map.get(&interp("noun")).unwrap();
        assert_eq!(noun_positions, &vec![Position::new(0, 2)]);
    }
}
