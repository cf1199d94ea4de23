//! Token-walking scope tree construction.
//!
//! The builder advances a token cursor from the manager's `parse_pos` to a
//! target row, classifying structurally significant tokens and calling into
//! the manager. Classification failures never abort a pass; the worst case
//! is an anonymous brace scope.

use super::manager::ScopeManager;
use super::node::{BraceCategory, ScopeKind, ScopeNode};
use crate::cache::RowTokenCache;
use crate::cursor::TokenCursor;
use crate::document::{Document, Position};
use crate::lang::ScopeRules;

/// Per-language scope tree driver.
pub struct ScopeTreeBuilder {
    manager: ScopeManager,
    rules: Box<dyn ScopeRules>,
}

impl ScopeTreeBuilder {
    pub fn new(rules: Box<dyn ScopeRules>) -> Self {
        Self {
            manager: ScopeManager::new(),
            rules,
        }
    }

    pub fn manager(&self) -> &ScopeManager {
        &self.manager
    }

    /// Invalidates the tree from `pos`, returning the resume position.
    pub fn invalidate_from(&mut self, pos: Position) -> Position {
        self.manager.invalidate_from(pos)
    }

    /// Extends the tree through the end of `target_row`. Rows already
    /// covered by `parse_pos` are not re-walked.
    pub fn build_up_to_row(&mut self, cache: &RowTokenCache, doc: &Document, target_row: usize) {
        let target_row = target_row.min(doc.last_row());
        let target_end = Position::new(target_row + 1, 0);
        let parse_pos = self.manager.parse_pos();
        if parse_pos >= target_end {
            return;
        }

        // First unprocessed token: the one after the last token before
        // parse_pos, or the document start on a fresh tree.
        let mut cursor = TokenCursor::new(cache);
        let started = if cursor.move_to_position(parse_pos, false) {
            cursor.move_to_next_token()
        } else {
            cursor.move_to_start()
        };

        if started {
            loop {
                if cursor.position() >= target_end {
                    break;
                }
                self.process_token(&cursor, cache, doc);
                if !cursor.move_to_next_token() {
                    break;
                }
            }
        }
        self.manager.set_parse_pos(target_end);
    }

    fn process_token(&mut self, cursor: &TokenCursor, cache: &RowTokenCache, doc: &Document) {
        let token = cursor.current_token().expect("cursor is on a token");
        let pos = cursor.position();

        if let Some(heading) = self.rules.section(token) {
            // A heading ends every open section at its depth or deeper,
            // provided no open brace intervenes.
            loop {
                let closable = matches!(
                    self.manager.open_chain().last(),
                    Some(n) if n.kind == ScopeKind::Section && n.section_depth() >= heading.depth
                );
                if !closable {
                    break;
                }
                self.manager.close_scope(pos, ScopeKind::Section);
            }
            self.manager
                .add_node(ScopeNode::section(heading.label, heading.depth, pos));
            return;
        }

        if let Some(label) = self.rules.chunk_start(token) {
            self.manager.add_node(ScopeNode::chunk(label, pos));
            return;
        }
        if self.rules.chunk_end(token) {
            let end = Position::new(pos.row, doc.line_len(pos.row));
            self.manager.close_scope(end, ScopeKind::Chunk);
            return;
        }

        if token.is_bracket_char('{') {
            let classification = self.rules.classify_brace(cursor);
            let preamble = classification.preamble.unwrap_or(pos);
            let mut node =
                ScopeNode::brace(classification.category, classification.label, preamble, pos);
            if matches!(
                classification.category,
                BraceCategory::Function | BraceCategory::Test
            ) {
                if let Some(label) = node.label.clone() {
                    node = node.with_attribute("signature", label);
                }
            }
            self.manager.add_node(node);
            return;
        }

        if token.is_bracket_char('}') {
            let mut end = Position::new(pos.row, token.end_column());
            if Self::only_trivia_after(cache, cursor) {
                // Pull trailing content (a statement terminator, a
                // comment) into the scope's span.
                end = Position::new(pos.row, doc.line_len(pos.row));
            }
            self.manager.close_scope(end, ScopeKind::Brace);
        }
    }

    /// True when every token after the cursor on its row is a comment or a
    /// statement terminator.
    fn only_trivia_after(cache: &RowTokenCache, cursor: &TokenCursor) -> bool {
        let tokens = cache.tokens(cursor.row()).unwrap_or(&[]);
        tokens[cursor.index() + 1..]
            .iter()
            .all(|t| t.kind == crate::token::TokenKind::Comment || t.is(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use std::time::Duration;

    fn build(language: Language, text: &str) -> (Document, RowTokenCache, ScopeTreeBuilder) {
        let doc = Document::from_str(text);
        let mut cache = RowTokenCache::new(language.tokenizer(), doc.len_lines(), Duration::ZERO);
        cache.tokenize_up_to_row(&doc, doc.last_row());
        let mut builder = ScopeTreeBuilder::new(language.scope_rules());
        builder.build_up_to_row(&cache, &doc, doc.last_row());
        (doc, cache, builder)
    }

    #[test]
    fn test_class_with_method_scenario() {
        let (_doc, _cache, builder) = build(
            Language::CFamily,
            "class Foo : public A {\n  void bar() {\n  }\n};\n",
        );
        let root = builder.manager().root();
        assert_eq!(root.children().len(), 1);

        let class = &root.children()[0];
        assert_eq!(class.category, Some(BraceCategory::Class));
        assert!(class.label.as_deref().unwrap().contains("Foo"));
        assert_eq!(class.children().len(), 1);

        let method = &class.children()[0];
        assert_eq!(method.category, Some(BraceCategory::Function));
        assert!(method.label.as_deref().unwrap().contains("bar"));
        assert!(method.children().is_empty());

        // "};" -- the terminator is pulled into the class span.
        assert_eq!(class.end, Some(Position::new(3, 2)));
    }

    #[test]
    fn test_active_scope_count_matches_nesting_depth() {
        let (_doc, _cache, builder) = build(
            Language::CFamily,
            "void f() {\n  if (x) {\n    while (y) {\n    }\n  }\n}\n",
        );
        let mgr = builder.manager();
        assert_eq!(mgr.active_scopes(Position::new(6, 0)).len(), 0);
        assert_eq!(mgr.active_scopes(Position::new(1, 4)).len(), 1);
        assert_eq!(mgr.active_scopes(Position::new(2, 6)).len(), 2);
        assert_eq!(mgr.active_scopes(Position::new(3, 2)).len(), 3);
        assert_eq!(mgr.active_scopes(Position::new(5, 0)).len(), 1);
    }

    #[test]
    fn test_namespace_and_anonymous_blocks() {
        let (_doc, _cache, builder) = build(
            Language::CFamily,
            "namespace app {\nint g() {\n  {\n  }\n}\n}\n",
        );
        let root = builder.manager().root();
        let ns = &root.children()[0];
        assert_eq!(ns.category, Some(BraceCategory::Namespace));
        assert_eq!(ns.label.as_deref(), Some("app"));

        let func = &ns.children()[0];
        assert_eq!(func.category, Some(BraceCategory::Function));
        let block = &func.children()[0];
        assert_eq!(block.category, Some(BraceCategory::Anonymous));
        assert!(block.label.is_none());
    }

    #[test]
    fn test_unbalanced_closer_is_tolerated() {
        let (_doc, _cache, builder) = build(Language::CFamily, "}\nvoid f() {\n}\n");
        let root = builder.manager().root();
        // The stray closer is ignored; the function still parses.
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].category, Some(BraceCategory::Function));
        assert!(!root.children()[0].is_open());
    }

    #[test]
    fn test_unclosed_scope_stays_open() {
        let (_doc, _cache, builder) = build(Language::CFamily, "void f() {\n  int x;\n");
        let root = builder.manager().root();
        assert_eq!(root.children().len(), 1);
        assert!(root.children()[0].is_open());
    }

    #[test]
    fn test_sections_close_at_same_depth() {
        let (_doc, _cache, builder) = build(
            Language::DataLang,
            "# First ----\nx <- 1\n## Nested ----\ny <- 2\n# Second ----\nz <- 3\n",
        );
        let root = builder.manager().root();
        assert_eq!(root.children().len(), 2);

        let first = &root.children()[0];
        assert_eq!(first.label.as_deref(), Some("First"));
        assert!(!first.is_open());
        assert_eq!(first.children().len(), 1);
        assert_eq!(first.children()[0].label.as_deref(), Some("Nested"));

        let second = &root.children()[1];
        assert_eq!(second.label.as_deref(), Some("Second"));
        assert!(second.is_open()); // runs to end of document
    }

    #[test]
    fn test_chunks_in_literate_document() {
        let (_doc, _cache, builder) = build(
            Language::DataLang,
            "```{r setup}\nlibrary(x)\n```\n```{r fit}\nm <- lm(y ~ x)\n```\n",
        );
        let root = builder.manager().root();
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].kind, ScopeKind::Chunk);
        assert_eq!(root.children()[0].label.as_deref(), Some("r setup"));
        assert!(!root.children()[0].is_open());
        assert_eq!(root.children()[1].label.as_deref(), Some("r fit"));
    }

    #[test]
    fn test_function_scope_in_data_language() {
        let (_doc, _cache, builder) = build(
            Language::DataLang,
            "fit_model <- function(df) {\n  lm(y ~ x, data = df)\n}\n",
        );
        let root = builder.manager().root();
        let func = &root.children()[0];
        assert_eq!(func.category, Some(BraceCategory::Function));
        assert!(func.label.as_deref().unwrap().contains("fit_model"));
        assert_eq!(func.preamble, Position::new(0, 0));
        assert_eq!(func.start, Position::new(0, 26));
        assert_eq!(func.attributes.get("signature"), func.label.as_ref());
    }

    #[test]
    fn test_incremental_build_resumes_from_parse_pos() {
        let text = "void a() {\n}\nvoid b() {\n}\n";
        let doc = Document::from_str(text);
        let mut cache =
            RowTokenCache::new(Language::CFamily.tokenizer(), doc.len_lines(), Duration::ZERO);
        cache.tokenize_up_to_row(&doc, doc.last_row());

        let mut builder = ScopeTreeBuilder::new(Language::CFamily.scope_rules());
        builder.build_up_to_row(&cache, &doc, 1);
        assert_eq!(builder.manager().root().children().len(), 1);

        builder.build_up_to_row(&cache, &doc, doc.last_row());
        let root = builder.manager().root();
        assert_eq!(root.children().len(), 2);
        assert!(root.children().iter().all(|n| !n.is_open()));
    }

    #[test]
    fn test_invalidate_then_rebuild_matches_full_build() {
        let text = "void a() {\n  int x;\n}\nvoid b() {\n  int y;\n}\n";
        let mut doc = Document::from_str(text);
        let mut cache =
            RowTokenCache::new(Language::CFamily.tokenizer(), doc.len_lines(), Duration::ZERO);
        cache.tokenize_up_to_row(&doc, doc.last_row());
        let mut builder = ScopeTreeBuilder::new(Language::CFamily.scope_rules());
        builder.build_up_to_row(&cache, &doc, doc.last_row());

        // Edit inside b's body, invalidate, rebuild.
        let change = doc.insert(Position::new(4, 8), "2");
        cache.apply_change(&change);
        cache.tokenize_up_to_row(&doc, doc.last_row());
        builder.invalidate_from(Position::new(change.start_row, 0));
        builder.build_up_to_row(&cache, &doc, doc.last_row());

        let (_d, _c, fresh) = build(Language::CFamily, &doc.to_string());
        let rebuilt = builder.manager().root();
        let scratch = fresh.manager().root();
        assert_eq!(rebuilt.children().len(), scratch.children().len());
        for (a, b) in rebuilt.children().iter().zip(scratch.children()) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.preamble, b.preamble);
            assert_eq!(a.end, b.end);
        }
    }
}
