use serde::{Deserialize, Serialize};

use crate::width::normalize_char_width;

/// Which composite-score/base-form variant a search should match against.
///
/// The schema carries all three variants (three composite scores on every
/// FLI, three `(base_form_<type>, composite_score_<type>, ...)` indexes) per
/// `spec.md` §9's Open Question, but the grouping logic that would make
/// `DefiniteAltForms`/`PossibleAltForms` differ from `Exact` is unspecified
/// upstream and is not implemented here — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    Exact,
    DefiniteAltForms,
    PossibleAltForms,
}

/// A search query. `query_str` is assumed already width-normalized and
/// kana-converted by the caller (the collaborating HTTP layer), but
/// `Query::new` re-normalizes defensively since that normalization is cheap
/// and idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    pub query_str: String,
    pub page_num: u32,
    pub query_type: QueryType,
    pub user_id: String,
}

impl Query {
    pub fn new(query_str: impl Into<String>, page_num: u32, query_type: QueryType, user_id: impl Into<String>) -> Self {
        Query {
            query_str: normalize_char_width(&query_str.into()),
            page_num: page_num.max(1),
            query_type,
            user_id: user_id.into(),
        }
    }
}
