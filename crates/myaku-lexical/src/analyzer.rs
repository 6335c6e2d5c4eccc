use myaku_types::{ArticleId, FoundLexicalItem, InternalError};

use crate::token::AnalyzedItem;

/// Text → lexical items, the interface the real morphological
/// analyzer/dictionary lookup sits behind. External to this workspace;
/// `myaku-crawl`'s pipeline depends only on this trait.
///
/// CPU-bound and assumed non-blocking from the async scheduler's
/// perspective — implementations should not themselves perform I/O per call
/// (a dictionary should be loaded once, at construction).
pub trait LexicalAnalyzer: Send + Sync {
    /// Analyzes `text`, returning one [`AnalyzedItem`] per occurrence found.
    ///
    /// Contract: positions are non-overlapping (see
    /// [`crate::positions_are_non_overlapping`]); concatenating the surface
    /// forms in position order, interleaved with the text between them,
    /// reproduces `text` exactly. Symbol-only tokens (pure punctuation,
    /// whitespace) are omitted rather than returned as items.
    fn analyze(&self, text: &str) -> Result<Vec<AnalyzedItem>, InternalError>;
}

/// Runs `analyzer` over `text` and reduces the result into the
/// `FoundLexicalItem`s an article's analysis produces, per `spec.md` §4.4:
/// items sharing a base form are combined, their positions and
/// interpretations unioned, and `interp_position_map` records which
/// positions each interpretation applies to.
///
/// The returned items carry `placeholder_article_id`; the caller (typically
/// `myaku-crawl`'s pipeline) overwrites it with the real `ArticleId` once the
/// article has been written and an ID assigned.
pub fn analyze_and_reduce(
    analyzer: &dyn LexicalAnalyzer,
    text: &str,
    placeholder_article_id: ArticleId,
) -> Result<Vec<FoundLexicalItem>, InternalError> {
    let items = analyzer.analyze(text)?;
    let unreduced: Vec<FoundLexicalItem> = items
        .into_iter()
        .map(|item| {
            FoundLexicalItem::new_unscored(
                item.base_form,
                placeholder_article_id,
                vec![item.position],
                item.possible_interps,
                std::collections::HashMap::new(),
            )
        })
        .collect();
    Ok(myaku_types::reduce_found_lexical_items(unreduced))
}
