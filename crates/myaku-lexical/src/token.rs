use myaku_types::{Interpretation, Position};

/// One lexical item surfaced by a [`crate::LexicalAnalyzer`] before reduction
/// by base form.
///
/// Mirrors what the original calls a found word/phrase prior to being
/// reduced into a `FoundJpnLexicalItem`: a single occurrence, not yet unioned
/// with the item's other occurrences in the same text.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedItem {
    pub base_form: String,
    pub surface_form: String,
    pub position: Position,
    pub possible_interps: Vec<Interpretation>,
}

impl AnalyzedItem {
    pub fn new(
        base_form: impl Into<String>,
        surface_form: impl Into<String>,
        position: Position,
        possible_interps: Vec<Interpretation>,
    ) -> Self {
        AnalyzedItem { base_form: base_form.into(), surface_form: surface_form.into(), position, possible_interps }
    }
}

/// Checks the `LexicalAnalyzer` contract's non-overlap requirement: no two
/// items' `[start, start+len)` ranges intersect. Analyzer implementations
/// are expected to exercise this in their own test suites; it is exposed
/// here so they don't each reinvent it.
pub fn positions_are_non_overlapping(items: &[AnalyzedItem]) -> bool {
    let mut sorted: Vec<Position> = items.iter().map(|item| item.position).collect();
    sorted.sort_by_key(|p| p.start);
    sorted.windows(2).all(|pair| pair[0].start + pair[0].len <= pair[1].start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(start: usize, len: usize) -> AnalyzedItem {
        AnalyzedItem::new("x", "x", Position::new(start, len), vec![])
    }

    #[test]
    fn detects_overlap() {
        let items = vec![item(0, 5), item(3, 2)];
        assert!(!positions_are_non_overlapping(&items));
    }

    #[test]
    fn accepts_adjacent_non_overlapping() {
        let items = vec![item(0, 5), item(5, 2)];
        assert!(positions_are_non_overlapping(&items));
    }
}
