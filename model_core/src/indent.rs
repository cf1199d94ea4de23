//! Indentation decision engine.
//!
//! `next_line_indent` chooses the indent string for a line inserted after
//! `row`. Cheap text-only checks against the previous line run first; when
//! none resolves, the engine walks tokens backward from the end of the
//! previous line to find an anchor (an unmatched opening bracket, an
//! assignment, a control-flow keyword, a statement terminator) and derives
//! the indent from the anchor's line. The engine always terminates with a
//! concrete string.

use crate::cache::RowTokenCache;
use crate::config::ModelConfig;
use crate::cursor::TokenCursor;
use crate::document::Document;
use crate::lang::{ChainCursor, Language};
use crate::token::{LexState, Token, TokenKind};

/// Tokens scanned backward before the anchor search gives up.
const ANCHOR_SCAN_LIMIT: usize = 200;

/// Per-language indentation engine.
#[derive(Debug, Clone)]
pub struct IndentEngine {
    language: Language,
    vertical_alignment: bool,
}

/// The leading whitespace of a line.
fn leading_indent(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

fn is_control_flow(token: &Token) -> bool {
    token.kind == TokenKind::Keyword
        && matches!(
            token.text.as_str(),
            "if" | "else" | "for" | "while" | "do" | "switch" | "repeat"
        )
}

/// Operators that signal an unfinished expression when they end a line.
fn is_continuation_op(token: &Token) -> bool {
    token.kind == TokenKind::Operator && !matches!(token.text.as_str(), "++" | "--" | "!")
}

impl IndentEngine {
    pub fn new(language: Language, config: &ModelConfig) -> Self {
        Self {
            language,
            vertical_alignment: config.vertical_alignment,
        }
    }

    pub fn vertical_alignment(&self) -> bool {
        self.vertical_alignment
    }

    pub fn set_vertical_alignment(&mut self, on: bool) {
        self.vertical_alignment = on;
    }

    /// Computes the indentation for a new line inserted after `row`.
    /// `line` is the text of row `row`; `state` is the lexical state at the
    /// end of that row, i.e. the state the new line starts in. Never fails;
    /// the final fallback copies the indentation of the first token in the
    /// document.
    pub fn next_line_indent(
        &self,
        doc: &Document,
        cache: &RowTokenCache,
        state: &LexState,
        line: &str,
        tab: &str,
        row: usize,
    ) -> String {
        let indent = leading_indent(line);

        // Continuations of multi-line literals resolve from state alone.
        match state {
            LexState::MultiLineString { .. } | LexState::RawString { .. } => {
                return String::new();
            }
            LexState::BlockComment { .. } => {
                let trimmed = line.trim_start();
                if trimmed.starts_with("/*") {
                    return format!("{} * ", indent);
                }
                if trimmed.starts_with('*') {
                    return format!("{}* ", indent);
                }
                return indent;
            }
            LexState::Normal => {}
        }

        let code = self.strip_trailing_comment(line);
        let trimmed = code.trim_end();

        // Blank and comment-only lines keep their indentation.
        if trimmed.is_empty() {
            return indent;
        }

        // Macro continuation: the first backslash adds a level, further
        // ones stay aligned.
        if trimmed.ends_with('\\') {
            let prior_continues = row > 0
                && doc
                    .line(row - 1)
                    .map(|l| l.trim_end().ends_with('\\'))
                    .unwrap_or(false);
            return if prior_continues {
                indent
            } else {
                format!("{}{}", indent, tab)
            };
        }

        if trimmed.ends_with('{') {
            // Namespace bodies conventionally stay flat.
            if self.language == Language::CFamily
                && trimmed.trim_start().starts_with("namespace")
            {
                return indent;
            }
            return format!("{}{}", indent, tab);
        }

        // Case labels, access specifiers, and inheritance colons all open
        // an indented region.
        if trimmed.ends_with(':') && !trimmed.ends_with("::") {
            return format!("{}{}", indent, tab);
        }

        // Multi-line class-inheritance and constructor initializer lists:
        // the members after the head line sit one level in. Continuation
        // lines past the first resolve through the token walk instead.
        if self.language == Language::CFamily && trimmed.ends_with(',') {
            let head = trimmed.trim_start();
            if head.starts_with("class ") || head.starts_with("struct ") || code.contains(") :") {
                return format!("{}{}", indent, tab);
            }
        }

        self.token_anchor_indent(doc, cache, tab, row)
            .unwrap_or(indent)
    }

    /// Strips a trailing line comment, tracking quotes so comment markers
    /// inside string literals survive.
    fn strip_trailing_comment(&self, line: &str) -> String {
        let marker = match self.language {
            Language::CFamily => "//",
            Language::DataLang => "#",
        };
        let mut out = String::new();
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for c in line.chars() {
            match quote {
                Some(q) => {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == q {
                        quote = None;
                    }
                }
                None => {
                    if c == '"' || c == '\'' {
                        quote = Some(c);
                    } else if marker.starts_with(c) {
                        let rest = &line[out.len()..];
                        if rest.starts_with(marker) {
                            return out;
                        }
                    }
                }
            }
            out.push(c);
        }
        out
    }

    /// The token-walk fallback: finds the nearest anchor and derives the
    /// indent from its line. Returns None when the document holds no
    /// usable tokens at all.
    fn token_anchor_indent(
        &self,
        doc: &Document,
        cache: &RowTokenCache,
        tab: &str,
        row: usize,
    ) -> Option<String> {
        let mut cursor = TokenCursor::new(cache);
        if !cursor.move_to_end_of_row(row) {
            return self.first_token_indent(doc, cache);
        }
        // Trailing comments are not anchors.
        while matches!(cursor.current_token(), Some(t) if t.kind == TokenKind::Comment) {
            if !cursor.move_to_previous_token() {
                return self.first_token_indent(doc, cache);
            }
        }
        let last = cursor.current_token()?;

        // A balanced group ending the line: either a control-flow header
        // awaiting its body, or a completed expression to align with.
        if last.is(")") || last.is("]") {
            let mut open = cursor;
            if open.bwd_to_matching_token() {
                if matches!(open.peek_bwd(1), Some(t) if is_control_flow(t)) {
                    let mut kw = open;
                    kw.move_to_previous_token();
                    return Some(format!(
                        "{}{}",
                        self.indent_of_row(doc, kw.row()),
                        tab
                    ));
                }
                let mut stmt = cursor;
                stmt.bwd_to_statement_start();
                return Some(self.indent_of_row(doc, stmt.row()));
            }
        }
        if last.is_keyword("else") || last.is_keyword("do") || last.is_keyword("repeat") {
            return Some(format!("{}{}", self.indent_of_row(doc, row), tab));
        }

        // Completed statement: align with the line that started it.
        if last.is(";") {
            let mut stmt = cursor;
            stmt.bwd_to_statement_start();
            return Some(self.indent_of_row(doc, stmt.row()));
        }

        // Completed block: align with the line of its opening brace.
        if last.is("}") {
            let mut open = cursor;
            if open.bwd_to_matching_token() {
                let mut stmt = open;
                stmt.bwd_to_statement_start();
                return Some(self.indent_of_row(doc, stmt.row()));
            }
            return Some(self.indent_of_row(doc, row));
        }

        // Unfinished expression: indent one level past the statement head.
        if is_continuation_op(last) {
            let mut stmt = cursor;
            stmt.bwd_to_statement_start();
            return Some(format!("{}{}", self.indent_of_row(doc, stmt.row()), tab));
        }

        // General case: scan backward for an unmatched opening bracket.
        let mut probe = cursor;
        for _ in 0..ANCHOR_SCAN_LIMIT {
            let token = probe.current_token()?;
            if token.is(")") || token.is("]") || token.is("}") {
                if !probe.bwd_to_matching_token() {
                    break;
                }
            } else if token.is("(") || token.is("[") {
                if self.vertical_alignment {
                    return Some(" ".repeat(token.column + 1));
                }
                return Some(format!("{}{}", self.indent_of_row(doc, probe.row()), tab));
            } else if token.is("{") {
                return Some(format!("{}{}", self.indent_of_row(doc, probe.row()), tab));
            } else if token.is(";") {
                // Tokens after the terminator are a fresh statement.
                return Some(self.indent_of_row(doc, row));
            } else if token.kind == TokenKind::Operator
                && matches!(token.text.as_str(), "=" | "<-" | "<<-")
            {
                // A mid-line assignment: the statement is complete, align
                // with its line.
                return Some(self.indent_of_row(doc, probe.row()));
            }
            if !probe.move_to_previous_token() {
                break;
            }
        }

        self.first_token_indent(doc, cache)
    }

    /// Final fallback: the indentation of the first token found scanning
    /// from the document start.
    fn first_token_indent(&self, doc: &Document, cache: &RowTokenCache) -> Option<String> {
        let mut cursor = TokenCursor::new(cache);
        if cursor.move_to_start() {
            Some(self.indent_of_row(doc, cursor.row()))
        } else {
            None
        }
    }

    fn indent_of_row(&self, doc: &Document, row: usize) -> String {
        leading_indent(&doc.line(row).unwrap_or_default())
    }
}
