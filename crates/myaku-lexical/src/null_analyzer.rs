use myaku_types::{InterpSource, Interpretation, MecabInterp, Position};

use crate::analyzer::LexicalAnalyzer;
use crate::token::AnalyzedItem;

/// A reference `LexicalAnalyzer` that needs no dictionary: every maximal run
/// of alphanumeric characters (Unicode `is_alphanumeric`, which covers kanji,
/// kana, and Latin/digit scripts alike) is treated as one lexical item whose
/// base form is the run's own surface text. Runs of non-alphanumeric
/// characters (punctuation, whitespace, symbols) are skipped, matching the
/// "symbol-only tokens are omitted" clause of `spec.md` §4.4.
///
/// This has no linguistic value — it doesn't lemmatize, and two distinct
/// inflections of the same headword surface as distinct base forms. It
/// exists purely so `myaku-crawl`'s pipeline and the end-to-end scenarios in
/// `spec.md` §8 can be exercised without wiring up a real dictionary.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnalyzer;

impl NullAnalyzer {
    pub fn new() -> Self {
        NullAnalyzer
    }
}

impl LexicalAnalyzer for NullAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<AnalyzedItem>, myaku_types::InternalError> {
        let chars: Vec<char> = text.chars().collect();
        let mut items = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if !chars[i].is_alphanumeric() {
                i += 1;
                continue;
            }
            let start = i;
            while i < chars.len() && chars[i].is_alphanumeric() {
                i += 1;
            }
            let surface: String = chars[start..i].iter().collect();
            let interp = Interpretation::new(
                vec![InterpSource::Mecab],
                Some(MecabInterp { parts_of_speech: vec!["unknown".to_string()], conjugated_type: None, conjugated_form: None }),
                None,
            )
            .expect("mecab interp is always present");
            items.push(AnalyzedItem::new(surface.clone(), surface, Position::new(start, i - start), vec![interp]));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_symbol_only_runs() {
        let analyzer = NullAnalyzer::new();
        let items = analyzer.analyze("走る。食べる！").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].base_form, "走る");
        assert_eq!(items[1].base_form, "食べる");
    }

    #[test]
    fn positions_are_non_overlapping_and_cover_runs() {
        let analyzer = NullAnalyzer::new();
        let text = "猫が走る。犬も走る。";
        let items = analyzer.analyze(text).unwrap();
        assert!(crate::positions_are_non_overlapping(&items));
        let chars: Vec<char> = text.chars().collect();
        for item in &items {
            let slice: String = chars[item.position.start..item.position.end()].iter().collect();
            assert_eq!(slice, item.surface_form);
        }
    }

    #[test]
    fn empty_text_yields_no_items() {
        let analyzer = NullAnalyzer::new();
        assert!(analyzer.analyze("").unwrap().is_empty());
    }
}
