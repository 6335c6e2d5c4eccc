use serde::{Deserialize, Serialize};

/// The source of a Japanese lexical item interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpSource {
    /// Output from MeCab was directly used.
    Mecab,
    /// The base-form decomposition MeCab provided was used as an index into
    /// JMdict.
    JmdictMecabDecomp,
    /// The surface form of the text was used as an index into JMdict.
    JmdictSurfaceForm,
    /// The concatenated base forms from MeCab's decomposition were used as
    /// an index into JMdict.
    JmdictBaseForm,
}

/// An interpretation of a lexical item as produced by MeCab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MecabInterp {
    pub parts_of_speech: Vec<String>,
    pub conjugated_type: Option<String>,
    pub conjugated_form: Option<String>,
}

/// One possible grammatical/dictionary reading of a surface form.
///
/// At least one of `mecab` or `jmdict_entry_id` must be present; this is
/// enforced by [`Interpretation::new`] rather than by the type alone, since
/// both fields are independently useful and neither alone determines the
/// other's shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interpretation {
    pub sources: Vec<InterpSource>,
    pub mecab: Option<MecabInterp>,
    pub jmdict_entry_id: Option<String>,
}

impl Interpretation {
    pub fn new(
        sources: Vec<InterpSource>,
        mecab: Option<MecabInterp>,
        jmdict_entry_id: Option<String>,
    ) -> Option<Self> {
        if mecab.is_none() && jmdict_entry_id.is_none() {
            return None;
        }
        Some(Interpretation { sources, mecab, jmdict_entry_id })
    }
}
