//! Fold range derivation.
//!
//! Fold ranges are a straight projection of scope spans: every multi-line
//! node in the tree yields one foldable region.

use crate::scope::{ScopeManager, ScopeNode};

/// A foldable region, in buffer lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldRegion {
    /// Start line of the fold (inclusive).
    pub start_line: usize,
    /// End line of the fold (inclusive).
    pub end_line: usize,
}

impl FoldRegion {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Returns the number of lines in this fold region.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Derives fold regions from every multi-line scope in the tree. Scopes
/// still open extend to `last_row`.
pub fn fold_ranges(manager: &ScopeManager, last_row: usize) -> Vec<FoldRegion> {
    let mut regions = Vec::new();
    collect(manager.root(), last_row, &mut regions);
    regions.sort_by_key(|r| (r.start_line, r.end_line));
    regions
}

fn collect(node: &ScopeNode, last_row: usize, out: &mut Vec<FoldRegion>) {
    for child in node.children() {
        let start = child.preamble.row;
        let end = child.end.map(|e| e.row).unwrap_or(last_row);
        if end > start {
            out.push(FoldRegion::new(start, end));
        }
        collect(child, last_row, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RowTokenCache;
    use crate::document::Document;
    use crate::lang::Language;
    use crate::scope::ScopeTreeBuilder;
    use std::time::Duration;

    #[test]
    fn test_fold_ranges_from_scopes() {
        let doc = Document::from_str("void f() {\n  if (x) {\n    g();\n  }\n}\nint y;\n");
        let mut cache =
            RowTokenCache::new(Language::CFamily.tokenizer(), doc.len_lines(), Duration::ZERO);
        cache.tokenize_up_to_row(&doc, doc.last_row());
        let mut builder = ScopeTreeBuilder::new(Language::CFamily.scope_rules());
        builder.build_up_to_row(&cache, &doc, doc.last_row());

        let regions = fold_ranges(builder.manager(), doc.last_row());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0], FoldRegion::new(0, 4));
        assert_eq!(regions[1], FoldRegion::new(1, 3));
        assert_eq!(regions[0].line_count(), 5);
    }

    #[test]
    fn test_open_scope_folds_to_document_end() {
        let doc = Document::from_str("void f() {\n  int x;\n  int y;\n");
        let mut cache =
            RowTokenCache::new(Language::CFamily.tokenizer(), doc.len_lines(), Duration::ZERO);
        cache.tokenize_up_to_row(&doc, doc.last_row());
        let mut builder = ScopeTreeBuilder::new(Language::CFamily.scope_rules());
        builder.build_up_to_row(&cache, &doc, doc.last_row());

        let regions = fold_ranges(builder.manager(), doc.last_row());
        assert_eq!(regions, vec![FoldRegion::new(0, doc.last_row())]);
    }

    #[test]
    fn test_single_line_scope_is_not_foldable() {
        let doc = Document::from_str("void f() { g(); }\n");
        let mut cache =
            RowTokenCache::new(Language::CFamily.tokenizer(), doc.len_lines(), Duration::ZERO);
        cache.tokenize_up_to_row(&doc, doc.last_row());
        let mut builder = ScopeTreeBuilder::new(Language::CFamily.scope_rules());
        builder.build_up_to_row(&cache, &doc, doc.last_row());

        assert!(fold_ranges(builder.manager(), doc.last_row()).is_empty());
    }
}
