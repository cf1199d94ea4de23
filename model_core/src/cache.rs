//! Row-indexed token cache with invalidation-aware re-tokenization.
//!
//! Each row caches its token list and the lexical state the tokenizer was
//! left in at end of line. After an edit only a suffix of rows starting at
//! the edit needs recomputation, and recomputation stops as soon as a row's
//! freshly computed exit state matches the one previously on record --
//! everything downstream is then provably unchanged.

use crate::document::{ChangeAction, DocChange, Document};
use crate::token::{LexState, Token, Tokenizer};
use std::time::{Duration, Instant};

/// One cached row. `tokens == None` means "needs recomputation";
/// `exit_state` is the last recorded exit state and survives invalidation,
/// so a recompute can detect that the state recurred.
#[derive(Debug, Clone, Default)]
struct RowEntry {
    tokens: Option<Vec<Token>>,
    exit_state: Option<LexState>,
}

impl RowEntry {
    fn is_valid(&self) -> bool {
        self.tokens.is_some() && self.exit_state.is_some()
    }
}

/// A cancellable deadline used to coalesce render notifications.
///
/// Scheduling while a deadline is pending replaces it rather than firing
/// twice. Single-threaded: the owner polls for expiry from its event loop.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Schedules (or reschedules) the deadline `delay` from now.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Cancels any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once after the deadline has passed, clearing it.
    pub fn poll_expired(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Per-row cache of token lists and exit lexical states.
pub struct RowTokenCache {
    rows: Vec<RowEntry>,
    tokenizer: Box<dyn Tokenizer>,
    notify: Debounce,
}

impl RowTokenCache {
    /// Creates a cache for a document with the given tokenizer. All rows
    /// start unset.
    pub fn new(tokenizer: Box<dyn Tokenizer>, row_count: usize, notify_delay: Duration) -> Self {
        Self {
            rows: vec![RowEntry::default(); row_count],
            tokenizer,
            notify: Debounce::new(notify_delay),
        }
    }

    /// Number of rows tracked (kept in lockstep with the document).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cached tokens for a row, or `None` if the row has not
    /// been tokenized (or was invalidated) since the last edit.
    pub fn tokens(&self, row: usize) -> Option<&[Token]> {
        self.rows.get(row)?.tokens.as_deref()
    }

    /// Returns the cached exit state for a row, if valid.
    pub fn exit_state(&self, row: usize) -> Option<&LexState> {
        self.rows.get(row)?.exit_state.as_ref()
    }

    /// Marks a single row as needing recomputation. The recorded exit
    /// state is kept: it is what the next recompute compares against to
    /// prove that nothing downstream changed.
    pub fn invalidate_row(&mut self, row: usize) {
        if let Some(entry) = self.rows.get_mut(row) {
            entry.tokens = None;
        }
    }

    /// Inserts `count` unset rows starting at `row`.
    pub fn insert_rows(&mut self, row: usize, count: usize) {
        let row = row.min(self.rows.len());
        self.rows
            .splice(row..row, std::iter::repeat_with(RowEntry::default).take(count));
    }

    /// Removes `count` rows starting at `row`.
    pub fn remove_rows(&mut self, row: usize, count: usize) {
        let end = (row + count).min(self.rows.len());
        let row = row.min(end);
        self.rows.drain(row..end);
    }

    /// Applies a document change event: invalidates the edited row, then
    /// splices the row arrays to match the new row count. Must run before
    /// any query against the post-edit document.
    pub fn apply_change(&mut self, change: &DocChange) {
        self.invalidate_row(change.start_row);
        match change.action {
            ChangeAction::Insert => {
                self.insert_rows(change.start_row + 1, change.row_delta());
            }
            ChangeAction::Delete => {
                self.remove_rows(change.start_row + 1, change.row_delta());
            }
        }
    }

    /// Guarantees every row in `[0, max_row]` holds a valid token list,
    /// recomputing the minimal suffix needed.
    pub fn tokenize_up_to_row(&mut self, doc: &Document, max_row: usize) {
        // Defensive realignment; apply_change keeps this a no-op.
        if self.rows.len() != doc.len_lines() {
            self.rows.resize_with(doc.len_lines(), RowEntry::default);
        }
        if self.rows.is_empty() {
            return;
        }
        let max_row = max_row.min(self.rows.len() - 1);

        let mut assume_good = true;
        let mut state = LexState::default();
        let mut recomputed = 0usize;

        for row in 0..=max_row {
            if assume_good && self.rows[row].is_valid() {
                state = self.rows[row].exit_state.clone().expect("valid row");
                continue;
            }
            assume_good = false;

            let line = doc.line(row).unwrap_or_default();
            let (tokens, exit) = self.tokenizer.tokenize_line(&line, &state);
            let recurred = self.rows[row].exit_state.as_ref() == Some(&exit);
            self.rows[row] = RowEntry {
                tokens: Some(tokens),
                exit_state: Some(exit.clone()),
            };
            state = exit;
            recomputed += 1;

            if recurred {
                // The old downstream entries were computed from this same
                // state; nothing below needs to change.
                assume_good = true;
            }
        }

        if recomputed > 0 {
            log::trace!("retokenized {} row(s) up to row {}", recomputed, max_row);
        }
    }

    /// Tokenizes ahead eagerly and schedules the coalesced render
    /// notification.
    pub fn tokenize_ahead(&mut self, doc: &Document, max_row: usize) {
        self.tokenize_up_to_row(doc, max_row);
        self.notify.schedule();
    }

    /// Polls the deferred render notification; true means "notify now".
    pub fn poll_render_notify(&mut self) -> bool {
        self.notify.poll_expired()
    }

    /// Access to the notification debounce (cancel on document close).
    pub fn render_notify(&mut self) -> &mut Debounce {
        &mut self.notify
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Position;
    use crate::lexer::CFamilyTokenizer;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Wraps a tokenizer and counts how many lines it actually lexes.
    struct CountingTokenizer {
        inner: CFamilyTokenizer,
        calls: Rc<Cell<usize>>,
    }

    impl Tokenizer for CountingTokenizer {
        fn tokenize_line(&self, line: &str, state: &LexState) -> (Vec<Token>, LexState) {
            self.calls.set(self.calls.get() + 1);
            self.inner.tokenize_line(line, state)
        }
    }

    fn counting_cache(doc: &Document) -> (RowTokenCache, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let tokenizer = CountingTokenizer {
            inner: CFamilyTokenizer::new(),
            calls: Rc::clone(&calls),
        };
        (
            RowTokenCache::new(Box::new(tokenizer), doc.len_lines(), Duration::ZERO),
            calls,
        )
    }

    fn snapshot(cache: &RowTokenCache) -> Vec<Vec<Token>> {
        (0..cache.row_count())
            .map(|r| cache.tokens(r).unwrap().to_vec())
            .collect()
    }

    #[test]
    fn test_tokenize_idempotent() {
        let doc = Document::from_str("int a;\nint b;\nint c;\n");
        let (mut cache, calls) = counting_cache(&doc);

        cache.tokenize_up_to_row(&doc, doc.last_row());
        let first = snapshot(&cache);
        let lexed = calls.get();

        cache.tokenize_up_to_row(&doc, doc.last_row());
        assert_eq!(snapshot(&cache), first);
        assert_eq!(calls.get(), lexed); // no extra lexing on the second pass
    }

    #[test]
    fn test_recompute_stops_on_state_recurrence() {
        let doc = Document::from_str("a;\nb;\nc;\nd;\ne;\n");
        let (mut cache, calls) = counting_cache(&doc);
        cache.tokenize_up_to_row(&doc, 4);
        calls.set(0);

        // Plain edit on row 2: exit state stays Normal, so only row 2 lexes.
        cache.invalidate_row(2);
        cache.tokenize_up_to_row(&doc, 4);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_state_change_recomputes_downstream() {
        let mut doc = Document::from_str("a;\nb;\nc;\n");
        let (mut cache, calls) = counting_cache(&doc);
        cache.tokenize_up_to_row(&doc, 2);
        calls.set(0);

        // Opening a block comment on row 0 poisons every row below it.
        let change = doc.insert(Position::new(0, 2), " /*");
        cache.apply_change(&change);
        cache.tokenize_up_to_row(&doc, 2);
        assert_eq!(calls.get(), 3);
        assert_eq!(
            cache.exit_state(2),
            Some(&LexState::BlockComment { depth: 1 })
        );
    }

    #[test]
    fn test_incremental_equals_from_scratch() {
        let mut doc = Document::from_str("int a; /* x */\nint b;\nvoid f() {\n  g();\n}\n");
        let (mut cache, _) = counting_cache(&doc);
        cache.tokenize_up_to_row(&doc, doc.last_row());

        // Edit: replace "g();" and add a row.
        let change = doc.remove(Position::new(3, 2), Position::new(3, 6));
        cache.apply_change(&change);
        let change = doc.insert(Position::new(3, 2), "h(1,\n    2);");
        cache.apply_change(&change);
        cache.tokenize_up_to_row(&doc, doc.last_row());

        let (mut fresh, _) = counting_cache(&doc);
        fresh.tokenize_up_to_row(&doc, doc.last_row());
        assert_eq!(snapshot(&cache), snapshot(&fresh));
    }

    #[test]
    fn test_row_splicing_alignment() {
        let mut doc = Document::from_str("a\nb\nc\n");
        let (mut cache, _) = counting_cache(&doc);
        cache.tokenize_up_to_row(&doc, doc.last_row());

        let change = doc.insert(Position::new(1, 1), "\nX\nY");
        cache.apply_change(&change);
        assert_eq!(cache.row_count(), doc.len_lines());
        // Untouched trailing row is still valid.
        assert!(cache.tokens(doc.last_row() - 1).is_some());

        cache.tokenize_up_to_row(&doc, doc.last_row());
        let (mut fresh, _) = counting_cache(&doc);
        fresh.tokenize_up_to_row(&doc, doc.last_row());
        assert_eq!(snapshot(&cache), snapshot(&fresh));
    }

    #[test]
    fn test_delete_rows_merges_at_edit() {
        let mut doc = Document::from_str("aa\nbb\ncc\ndd\n");
        let (mut cache, _) = counting_cache(&doc);
        cache.tokenize_up_to_row(&doc, doc.last_row());

        let change = doc.remove(Position::new(1, 1), Position::new(2, 1));
        cache.apply_change(&change);
        cache.tokenize_up_to_row(&doc, doc.last_row());

        let (mut fresh, _) = counting_cache(&doc);
        fresh.tokenize_up_to_row(&doc, doc.last_row());
        assert_eq!(snapshot(&cache), snapshot(&fresh));
    }

    #[test]
    fn test_debounce_coalesces() {
        let mut debounce = Debounce::new(Duration::ZERO);
        assert!(!debounce.poll_expired());

        debounce.schedule();
        debounce.schedule(); // reschedule, still a single pending deadline
        assert!(debounce.is_pending());
        assert!(debounce.poll_expired());
        assert!(!debounce.poll_expired()); // fires once

        debounce.schedule();
        debounce.cancel();
        assert!(!debounce.poll_expired());
    }
}
