//! Line tokenizer for C-family sources.

use super::Scanner;
use crate::token::{LexState, Token, TokenKind, Tokenizer};

const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "auto", "bool", "break", "case", "catch", "char", "class", "const",
    "constexpr", "continue", "decltype", "default", "delete", "do", "double", "else", "enum",
    "explicit", "extern", "final", "float", "for", "friend", "goto", "if", "inline", "int",
    "long", "mutable", "namespace", "new", "noexcept", "nullptr", "operator", "override",
    "private", "protected", "public", "register", "return", "short", "signed", "sizeof",
    "static", "struct", "switch", "template", "this", "throw", "try", "typedef", "typename",
    "union", "unsigned", "using", "virtual", "void", "volatile", "while",
];

/// Multi-character operators, longest first so greedy matching works.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "->*", "...", "::", "->", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "++", "--",
];

/// Tokenizer for C and C++ source lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFamilyTokenizer;

impl CFamilyTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn scan_string(scanner: &mut Scanner, delim: char) -> String {
        let mut text = String::new();
        text.push(scanner.advance());
        while !scanner.is_eol() {
            let c = scanner.advance();
            text.push(c);
            if c == '\\' && !scanner.is_eol() {
                text.push(scanner.advance());
            } else if c == delim {
                break;
            }
        }
        text
    }
}

impl Tokenizer for CFamilyTokenizer {
    fn tokenize_line(&self, line: &str, state: &LexState) -> (Vec<Token>, LexState) {
        let mut tokens = Vec::new();
        let mut scanner = Scanner::new(line);

        // Resume an unterminated block comment from the previous row.
        if matches!(state, LexState::BlockComment { .. }) {
            let start = scanner.col();
            let mut text = String::new();
            let mut closed = false;
            while !scanner.is_eol() {
                if scanner.peek() == '*' && scanner.second() == '/' {
                    text.push(scanner.advance());
                    text.push(scanner.advance());
                    closed = true;
                    break;
                }
                text.push(scanner.advance());
            }
            if !text.is_empty() || !closed {
                tokens.push(Token::new(TokenKind::Comment, text, start));
            }
            if !closed {
                return (tokens, LexState::BlockComment { depth: 1 });
            }
        }

        // Preprocessor directives claim the whole line.
        if matches!(state, LexState::Normal) && line.trim_start().starts_with('#') {
            let col = line.chars().take_while(|c| c.is_whitespace()).count();
            let text: String = line.chars().skip(col).collect();
            tokens.push(Token::new(TokenKind::Preproc, text, col));
            return (tokens, LexState::Normal);
        }

        while !scanner.is_eol() {
            let c = scanner.peek();
            let start = scanner.col();

            if c.is_whitespace() {
                scanner.advance();
                continue;
            }

            // Comments
            if c == '/' && scanner.second() == '/' {
                let mut text = String::new();
                scanner.take_while(&mut text, |_| true);
                tokens.push(Token::new(TokenKind::Comment, text, start));
                break;
            }
            if c == '/' && scanner.second() == '*' {
                let mut text = String::new();
                text.push(scanner.advance());
                text.push(scanner.advance());
                let mut closed = false;
                while !scanner.is_eol() {
                    if scanner.peek() == '*' && scanner.second() == '/' {
                        text.push(scanner.advance());
                        text.push(scanner.advance());
                        closed = true;
                        break;
                    }
                    text.push(scanner.advance());
                }
                tokens.push(Token::new(TokenKind::Comment, text, start));
                if !closed {
                    return (tokens, LexState::BlockComment { depth: 1 });
                }
                continue;
            }

            // Strings and chars
            if c == '"' || c == '\'' {
                let text = Self::scan_string(&mut scanner, c);
                tokens.push(Token::new(TokenKind::StringLit, text, start));
                continue;
            }

            // Numbers
            if c.is_ascii_digit() {
                let mut text = String::new();
                scanner.take_while(&mut text, |c| {
                    c.is_ascii_alphanumeric() || c == '.' || c == '_'
                });
                tokens.push(Token::new(TokenKind::Number, text, start));
                continue;
            }

            // Identifiers and keywords
            if c.is_alphabetic() || c == '_' {
                let mut text = String::new();
                scanner.take_while(&mut text, |c| c.is_alphanumeric() || c == '_');
                let kind = if KEYWORDS.contains(&text.as_str()) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                tokens.push(Token::new(kind, text, start));
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

            // Single-character operators and punctuation
            scanner.advance();
            let kind = if matches!(
                c,
                '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '^' | '~'
                    | '?' | ':' | '.'
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
