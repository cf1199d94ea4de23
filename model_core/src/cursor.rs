//! Bidirectional token cursor over the row cache.
//!
//! A cursor is a cheap value addressing one token as (row, index). All
//! movement operations return a bool; on failure the cursor is left exactly
//! where it was, so callers can probe freely. Cursors only see rows the
//! cache has already tokenized -- the session object tokenizes ahead before
//! handing cursors out.

use crate::cache::RowTokenCache;
use crate::document::Position;
use crate::token::Token;

/// A movable, cloneable address into the token cache.
#[derive(Clone, Copy)]
pub struct TokenCursor<'a> {
    cache: &'a RowTokenCache,
    row: usize,
    index: usize,
}

impl<'a> TokenCursor<'a> {
    /// Creates a cursor at the origin (row 0, index 0). If row 0 has no
    /// tokens this is the "before the first token" sentinel.
    pub fn new(cache: &'a RowTokenCache) -> Self {
        Self {
            cache,
            row: 0,
            index: 0,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn row_tokens(&self, row: usize) -> &'a [Token] {
        self.cache.tokens(row).unwrap_or(&[])
    }

    /// The token currently under the cursor, if the position is occupied.
    pub fn current_token(&self) -> Option<&'a Token> {
        self.row_tokens(self.row).get(self.index)
    }

    /// Document position of the current token's first character, or of the
    /// row start when the cursor sits on the sentinel.
    pub fn position(&self) -> Position {
        match self.current_token() {
            Some(token) => Position::new(self.row, token.column),
            None => Position::new(self.row, 0),
        }
    }

    /// Document position just past the current token.
    pub fn end_position(&self) -> Position {
        match self.current_token() {
            Some(token) => Position::new(self.row, token.end_column()),
            None => Position::new(self.row, 0),
        }
    }

    /// Advances to the next token, crossing row boundaries and skipping
    /// empty rows. Returns false (cursor unchanged) at the end.
    pub fn move_to_next_token(&mut self) -> bool {
        let len = self.row_tokens(self.row).len();
        if self.index + 1 < len {
            self.index += 1;
            return true;
        }
        // Sentinel on an empty row: the "next" token may be on this row's
        // successors only, since index 0 of a non-empty row is occupied.
        for row in (self.row + 1)..self.cache.row_count() {
            if !self.row_tokens(row).is_empty() {
                self.row = row;
                self.index = 0;
                return true;
            }
        }
        false
    }

    /// Steps back to the previous token, crossing row boundaries and
    /// skipping empty rows. Returns false (cursor unchanged) at the start.
    pub fn move_to_previous_token(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            return true;
        }
        for row in (0..self.row).rev() {
            let len = self.row_tokens(row).len();
            if len > 0 {
                self.row = row;
                self.index = len - 1;
                return true;
            }
        }
        false
    }

    /// Moves to the first token of the document. Returns false if there is
    /// none.
    pub fn move_to_start(&mut self) -> bool {
        for row in 0..self.cache.row_count() {
            if !self.row_tokens(row).is_empty() {
                self.row = row;
                self.index = 0;
                return true;
            }
        }
        false
    }

    /// Non-destructive lookahead: the token `n` steps forward, if every
    /// step exists.
    pub fn peek_fwd(&self, n: usize) -> Option<&'a Token> {
        let mut probe = *self;
        for _ in 0..n {
            if !probe.move_to_next_token() {
                return None;
            }
        }
        probe.current_token()
    }

    /// Non-destructive lookbehind: the token `n` steps backward, if every
    /// step exists.
    pub fn peek_bwd(&self, n: usize) -> Option<&'a Token> {
        let mut probe = *self;
        for _ in 0..n {
            if !probe.move_to_previous_token() {
                return None;
            }
        }
        probe.current_token()
    }

    /// From an opening token, scans forward for the balanced complementary
    /// token. Succeeds only on a perfect match; otherwise the cursor does
    /// not move.
    pub fn fwd_to_matching_token(&mut self) -> bool {
        let (open, close) = match self.current_token() {
            Some(t) if t.is("(") => ("(", ")"),
            Some(t) if t.is("[") => ("[", "]"),
            Some(t) if t.is("{") => ("{", "}"),
            _ => return false,
        };
        self.fwd_to_matching_pair(open, close)
    }

    /// From a closing token, scans backward for the balanced complementary
    /// token. Succeeds only on a perfect match; otherwise the cursor does
    /// not move.
    pub fn bwd_to_matching_token(&mut self) -> bool {
        let (open, close) = match self.current_token() {
            Some(t) if t.is(")") => ("(", ")"),
            Some(t) if t.is("]") => ("[", "]"),
            Some(t) if t.is("}") => ("{", "}"),
            _ => return false,
        };
        self.bwd_to_matching_pair(open, close)
    }

    /// Depth-counted forward scan used for both brackets and the template
    /// angle-arrow pair.
    pub(crate) fn fwd_to_matching_pair(&mut self, open: &str, close: &str) -> bool {
        let mut probe = *self;
        let mut depth = 1usize;
        while probe.move_to_next_token() {
            let token = probe.current_token().expect("moved onto a token");
            if token.is_comment_or_string() {
                continue;
            }
            if token.is(open) {
                depth += 1;
            } else if token.is(close) {
                depth -= 1;
                if depth == 0 {
                    *self = probe;
                    return true;
                }
            }
        }
        false
    }

    /// Depth-counted backward scan, mirror of [`Self::fwd_to_matching_pair`].
    pub(crate) fn bwd_to_matching_pair(&mut self, open: &str, close: &str) -> bool {
        let mut probe = *self;
        let mut depth = 1usize;
        while probe.move_to_previous_token() {
            let token = probe.current_token().expect("moved onto a token");
            if token.is_comment_or_string() {
                continue;
            }
            if token.is(close) {
                depth += 1;
            } else if token.is(open) {
                depth -= 1;
                if depth == 0 {
                    *self = probe;
                    return true;
                }
            }
        }
        false
    }

    /// Moves to the nearest token at-or-before the given position within
    /// already-tokenized rows. `right_inclusive` decides whether a token
    /// starting exactly at `pos` counts. Returns false (cursor unchanged)
    /// when no such token exists.
    pub fn move_to_position(&mut self, pos: Position, right_inclusive: bool) -> bool {
        if self.cache.row_count() == 0 {
            return false;
        }
        let row = pos.row.min(self.cache.row_count() - 1);

        let candidate = self
            .row_tokens(row)
            .iter()
            .rposition(|t| t.column < pos.col || (right_inclusive && t.column == pos.col));
        if let Some(index) = candidate {
            self.row = row;
            self.index = index;
            return true;
        }
        // Nothing on the target row: nearest token strictly above.
        for r in (0..row).rev() {
            let len = self.row_tokens(r).len();
            if len > 0 {
                self.row = r;
                self.index = len - 1;
                return true;
            }
        }
        false
    }

    /// Moves to the last token at or before the end of the given row.
    pub fn move_to_end_of_row(&mut self, row: usize) -> bool {
        self.move_to_position(Position::new(row, usize::MAX), false)
    }
}

impl std::fmt::Debug for TokenCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCursor")
            .field("row", &self.row)
            .field("index", &self.index)
            .field("token", &self.current_token().map(|t| t.text.as_str()))
            .finish()
    }
}
