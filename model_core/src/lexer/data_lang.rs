//! Line tokenizer for the pipe-oriented data language.
//!
//! Strings may span rows, so the exit state carries the open delimiter.
//! Literate-document fences (```` ``` ````-prefixed lines) are emitted as a
//! single text token for the chunk builder to classify.

use super::Scanner;
use crate::token::{LexState, Token, TokenKind, Tokenizer};

const KEYWORDS: &[&str] = &[
    "function", "if", "else", "for", "while", "repeat", "break", "next", "return", "in",
    "TRUE", "FALSE", "NULL", "NA", "Inf", "NaN",
];

const OPERATORS: &[&str] = &[
    "<<-", "->>", ":::", "<-", "->", "|>", "::", "==", "!=", "<=", ">=", "&&", "||",
];

/// Tokenizer for data-language source lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLangTokenizer;

impl DataLangTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Scans the remainder of a string opened with `delim`. Returns the
    /// consumed text and whether the closing delimiter was found.
    fn scan_string_tail(scanner: &mut Scanner, delim: char) -> (String, bool) {
        let mut text = String::new();
        while !scanner.is_eol() {
            let c = scanner.advance();
            text.push(c);
            if c == '\\' && !scanner.is_eol() {
                text.push(scanner.advance());
            } else if c == delim {
                return (text, true);
            }
        }
        (text, false)
    }
}

impl Tokenizer for DataLangTokenizer {
    fn tokenize_line(&self, line: &str, state: &LexState) -> (Vec<Token>, LexState) {
        let mut tokens = Vec::new();
        let mut scanner = Scanner::new(line);

        // Resume a string left open on a previous row.
        if let LexState::MultiLineString { delim } = state {
            let (text, closed) = Self::scan_string_tail(&mut scanner, *delim);
            if !text.is_empty() || !closed {
                tokens.push(Token::new(TokenKind::StringLit, text, 0));
            }
            if !closed {
                return (tokens, state.clone());
            }
        }

        // Literate-document fence: the whole line is one token.
        if line.starts_with("```") {
            tokens.push(Token::new(TokenKind::Text, line, 0));
            return (tokens, LexState::Normal);
        }

        while !scanner.is_eol() {
            let c = scanner.peek();
            let start = scanner.col();

            if c.is_whitespace() {
                scanner.advance();
                continue;
            }

            // Comments run to end of line; section markers stay inside them.
            if c == '#' {
                let mut text = String::new();
                scanner.take_while(&mut text, |_| true);
                tokens.push(Token::new(TokenKind::Comment, text, start));
                break;
            }

            // Strings (may continue onto following rows)
            if c == '"' || c == '\'' {
                let delim = scanner.advance();
                let (tail, closed) = Self::scan_string_tail(&mut scanner, delim);
                let mut text = String::new();
                text.push(delim);
                text.push_str(&tail);
                tokens.push(Token::new(TokenKind::StringLit, text, start));
                if !closed {
                    return (tokens, LexState::MultiLineString { delim });
                }
                continue;
            }

            // Backtick-quoted identifiers
            if c == '`' {
                let mut text = String::new();
                text.push(scanner.advance());
                scanner.take_while(&mut text, |c| c != '`');
                if !scanner.is_eol() {
                    text.push(scanner.advance());
                }
                tokens.push(Token::new(TokenKind::Identifier, text, start));
                continue;
            }

            // Numbers
            if c.is_ascii_digit() || (c == '.' && scanner.second().is_ascii_digit()) {
                let mut text = String::new();
                scanner.take_while(&mut text, |c| c.is_ascii_alphanumeric() || c == '.');
                tokens.push(Token::new(TokenKind::Number, text, start));
                continue;
            }

            // Identifiers and keywords (dots are valid name characters)
            if c.is_alphabetic() || c == '.' || c == '_' {
                let mut text = String::new();
                scanner.take_while(&mut text, |c| c.is_alphanumeric() || c == '.' || c == '_');
                let kind = if KEYWORDS.contains(&text.as_str()) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                tokens.push(Token::new(kind, text, start));
                continue;
            }

            // User-defined infix operators: %...%
            if c == '%' {
                let mut text = String::new();
                text.push(scanner.advance());
                scanner.take_while(&mut text, |c| c != '%');
                if !scanner.is_eol() {
                    text.push(scanner.advance());
                }
                tokens.push(Token::new(TokenKind::Operator, text, start));
                continue;
            }

            // Brackets
            if matches!(c, '(' | ')' | '[' | ']' | '{' | '}') {
                scanner.advance();
                tokens.push(Token::new(TokenKind::Bracket, c.to_string(), start));
                continue;
            }

            // Multi-character operators
            if let Some(op) = OPERATORS.iter().find(|op| scanner.eat_str(op)) {
                tokens.push(Token::new(TokenKind::Operator, *op, start));
                continue;
            }

            scanner.advance();
            let kind = if matches!(
                c,
                '+' | '-' | '*' | '/' | '^' | '<' | '>' | '=' | '!' | '&' | '|' | '~' | '?'
                    | ':' | '$' | '@'
            ) {
                TokenKind::Operator
            } else {
                TokenKind::Text
            };
            tokens.push(Token::new(kind, c.to_string(), start));
        }

        (tokens, LexState::Normal)
    }
}
