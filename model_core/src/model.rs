//! The per-document code model session.
//!
//! One `CodeModel` is created when a document opens and discarded when it
//! closes. It owns the token cache, the scope tree builder, and the
//! indentation engine, and keeps them consistent across edits. The
//! document itself stays outside: every query takes it by reference.

use crate::cache::RowTokenCache;
use crate::config::ModelConfig;
use crate::cursor::TokenCursor;
use crate::document::{DocChange, Document, Position};
use crate::fold::{fold_ranges, FoldRegion};
use crate::indent::IndentEngine;
use crate::lang::Language;
use crate::scope::{ScopeNode, ScopeTreeBuilder};
use crate::token::LexState;

/// Incremental code model for a single open document.
pub struct CodeModel {
    language: Language,
    config: ModelConfig,
    cache: RowTokenCache,
    builder: ScopeTreeBuilder,
    indenter: IndentEngine,
}

impl CodeModel {
    /// Creates a model for a freshly opened document.
    pub fn new(language: Language, config: ModelConfig, doc: &Document) -> Self {
        let cache = RowTokenCache::new(language.tokenizer(), doc.len_lines(), config.notify_delay);
        let builder = ScopeTreeBuilder::new(language.scope_rules());
        let indenter = IndentEngine::new(language, &config);
        Self {
            language,
            config,
            cache,
            builder,
            indenter,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Toggles bracket-column alignment for subsequent indent queries.
    pub fn set_vertical_alignment(&mut self, on: bool) {
        self.config.vertical_alignment = on;
        self.indenter.set_vertical_alignment(on);
    }

    /// Must be called for every document change, before any query against
    /// the post-edit document: invalidates the edited row, splices the row
    /// cache, and rolls the scope tree back to a safe resume position.
    pub fn apply_change(&mut self, change: &DocChange) {
        self.cache.apply_change(change);
        self.builder
            .invalidate_from(Position::new(change.start_row, 0));
    }

    /// Ensures rows `[0, row]` hold valid tokens.
    pub fn tokenize_up_to_row(&mut self, doc: &Document, row: usize) {
        self.cache.tokenize_up_to_row(doc, row);
    }

    /// Tokenizes eagerly and schedules the deferred render notification.
    pub fn tokenize_ahead(&mut self, doc: &Document, row: usize) {
        self.cache.tokenize_ahead(doc, row);
    }

    /// Polls the coalesced render notification; true means "notify now".
    pub fn poll_render_notify(&mut self) -> bool {
        self.cache.poll_render_notify()
    }

    /// Direct access to the row token cache.
    pub fn cache(&self) -> &RowTokenCache {
        &self.cache
    }

    /// A cursor positioned at the nearest token at-or-before `pos`,
    /// tokenizing ahead as needed. None when no token precedes `pos`.
    pub fn token_cursor_at(
        &mut self,
        doc: &Document,
        pos: Position,
        right_inclusive: bool,
    ) -> Option<TokenCursor<'_>> {
        self.cache.tokenize_up_to_row(doc, pos.row);
        let mut cursor = TokenCursor::new(&self.cache);
        if cursor.move_to_position(pos, right_inclusive) {
            Some(cursor)
        } else {
            None
        }
    }

    /// Extends the scope tree through `row`.
    pub fn build_scope_tree_up_to_row(&mut self, doc: &Document, row: usize) {
        self.cache.tokenize_up_to_row(doc, row);
        self.builder.build_up_to_row(&self.cache, doc, row);
    }

    /// The scope tree root, built through the whole document.
    pub fn scope_tree(&mut self, doc: &Document) -> &ScopeNode {
        self.build_scope_tree_up_to_row(doc, doc.last_row());
        self.builder.manager().root()
    }

    /// The innermost scope containing `pos`.
    pub fn current_scope(&mut self, doc: &Document, pos: Position) -> Option<&ScopeNode> {
        self.build_scope_tree_up_to_row(doc, pos.row);
        self.builder.manager().find_node(pos)
    }

    /// The ordered chain of scopes containing `pos`, outermost first.
    pub fn active_scopes(&mut self, doc: &Document, pos: Position) -> Vec<&ScopeNode> {
        self.build_scope_tree_up_to_row(doc, pos.row);
        self.builder.manager().active_scopes(pos)
    }

    /// Breadcrumb labels for `pos`, outermost first.
    pub fn active_scope_labels(&mut self, doc: &Document, pos: Position) -> Vec<String> {
        self.build_scope_tree_up_to_row(doc, pos.row);
        self.builder.manager().active_scope_labels(pos)
    }

    /// Fold regions for the whole document.
    pub fn fold_ranges(&mut self, doc: &Document) -> Vec<FoldRegion> {
        self.build_scope_tree_up_to_row(doc, doc.last_row());
        fold_ranges(self.builder.manager(), doc.last_row())
    }

    /// The indentation string for a new line inserted after `row`.
    pub fn next_line_indent(&mut self, doc: &Document, row: usize) -> String {
        if row >= doc.len_lines() {
            return String::new();
        }
        self.cache.tokenize_up_to_row(doc, row);
        let state = self
            .cache
            .exit_state(row)
            .cloned()
            .unwrap_or(LexState::Normal);
        let line = doc.line(row).unwrap_or_default();
        let tab = self.config.tab.clone();
        self.indenter
            .next_line_indent(doc, &self.cache, &state, &line, &tab, row)
    }
}
