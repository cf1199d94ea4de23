//! Document line store backed by ropey.
//!
//! The code model consumes the document strictly row-by-row; edits are
//! reported as row-oriented change events that drive cache invalidation.

use ropey::Rope;
use std::fs;
use std::io::{self, BufReader};
use std::path::Path;

/// A position in the document as (row, column). Both are 0-indexed.
/// Ordered by row first, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// The kind of a document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Insert,
    Delete,
}

/// A row-oriented change event emitted by document mutations.
///
/// `start_row..=end_row` is the affected row range: for an insert, the rows
/// that now exist where `start_row` used to be; for a delete, the rows that
/// were removed or merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocChange {
    pub action: ChangeAction,
    pub start_row: usize,
    pub end_row: usize,
}

impl DocChange {
    /// Number of rows inserted or removed by this change (zero for edits
    /// confined to a single row).
    pub fn row_delta(&self) -> usize {
        self.end_row - self.start_row
    }
}

/// A mutable, line-addressable document.
#[derive(Debug, Clone)]
pub struct Document {
    rope: Rope,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Creates a document from a string.
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Loads a document from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let rope = Rope::from_reader(reader)?;
        Ok(Self { rope })
    }

    /// Returns the total number of lines in the document.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns the total number of characters in the document.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns true if the document contains no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the length of a line in characters, excluding the newline.
    pub fn line_len(&self, row: usize) -> usize {
        if row >= self.len_lines() {
            return 0;
        }
        let line = self.rope.line(row);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Returns the line at the given row without its trailing newline.
    pub fn line(&self, row: usize) -> Option<String> {
        if row >= self.len_lines() {
            return None;
        }
        let mut s = self.rope.line(row).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// Returns the last valid row index.
    pub fn last_row(&self) -> usize {
        self.len_lines().saturating_sub(1)
    }

    /// Clamps a position to valid document bounds.
    pub fn clamp(&self, pos: Position) -> Position {
        let row = pos.row.min(self.last_row());
        Position::new(row, pos.col.min(self.line_len(row)))
    }

    fn pos_to_char(&self, pos: Position) -> usize {
        let pos = self.clamp(pos);
        self.rope.line_to_char(pos.row) + pos.col
    }

    /// Inserts text at the given position and returns the change event.
    pub fn insert(&mut self, pos: Position, text: &str) -> DocChange {
        let pos = self.clamp(pos);
        let idx = self.pos_to_char(pos);
        self.rope.insert(idx, text);
        let new_rows = text.matches('\n').count();
        DocChange {
            action: ChangeAction::Insert,
            start_row: pos.row,
            end_row: pos.row + new_rows,
        }
    }

    /// Removes the text between two positions and returns the change event.
    pub fn remove(&mut self, start: Position, end: Position) -> DocChange {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let start = self.clamp(start);
        let end = self.clamp(end);
        let a = self.pos_to_char(start);
        let b = self.pos_to_char(end);
        if a < b {
            self.rope.remove(a..b);
        }
        DocChange {
            action: ChangeAction::Delete,
            start_row: start.row,
            end_row: end.row,
        }
    }

    /// Returns the whole document as a string.
    pub fn to_string(&self) -> String {
        self.rope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.len_lines(), 1); // Empty rope still reports 1 line
    }

    #[test]
    fn test_line_access() {
        let doc = Document::from_str("alpha\nbeta\ngamma");
        assert_eq!(doc.len_lines(), 3);
        assert_eq!(doc.line(0), Some("alpha".to_string()));
        assert_eq!(doc.line(2), Some("gamma".to_string()));
        assert_eq!(doc.line(3), None);
        assert_eq!(doc.line_len(1), 4);
    }

    #[test]
    fn test_insert_single_row() {
        let mut doc = Document::from_str("ab\ncd");
        let change = doc.insert(Position::new(1, 1), "X");
        assert_eq!(doc.line(1), Some("cXd".to_string()));
        assert_eq!(change.action, ChangeAction::Insert);
        assert_eq!(change.start_row, 1);
        assert_eq!(change.end_row, 1);
        assert_eq!(change.row_delta(), 0);
    }

    #[test]
    fn test_insert_multi_row() {
        let mut doc = Document::from_str("ab\ncd");
        let change = doc.insert(Position::new(0, 2), "\nnew\n");
        assert_eq!(doc.len_lines(), 4);
        assert_eq!(change.start_row, 0);
        assert_eq!(change.end_row, 2);
        assert_eq!(doc.line(1), Some("new".to_string()));
    }

    #[test]
    fn test_remove_across_rows() {
        let mut doc = Document::from_str("one\ntwo\nthree");
        let change = doc.remove(Position::new(0, 2), Position::new(2, 1));
        assert_eq!(doc.to_string(), "onhree");
        assert_eq!(change.action, ChangeAction::Delete);
        assert_eq!(change.start_row, 0);
        assert_eq!(change.end_row, 2);
    }

    #[test]
    fn test_remove_reversed_range() {
        let mut doc = Document::from_str("hello");
        doc.remove(Position::new(0, 4), Position::new(0, 1));
        assert_eq!(doc.to_string(), "ho");
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 0) > Position::new(0, 99));
        assert!(Position::new(2, 3) < Position::new(2, 4));
    }
}
