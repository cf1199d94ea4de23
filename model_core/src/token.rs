//! Token and tokenizer interface types.
//!
//! The model never runs lexical rules itself; each language supplies a
//! [`Tokenizer`] that turns one line of text plus an entry state into a
//! token list and an exit state. Exit-state equality is what lets the row
//! cache stop re-tokenizing after an edit.

/// Classification of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    StringLit,
    Comment,
    Operator,
    /// A single bracket character; the character itself is in `text`.
    Bracket,
    /// A preprocessor directive (C family).
    Preproc,
    /// Anything else (punctuation, unrecognized text).
    Text,
}

/// The smallest classified lexical unit: kind, literal text, and the column
/// at which it starts. The row is implicit from the cache entry holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            column,
        }
    }

    /// Column just past the end of this token.
    pub fn end_column(&self) -> usize {
        self.column + self.text.chars().count()
    }

    /// Returns true for bracket tokens.
    pub fn is_bracket(&self) -> bool {
        self.kind == TokenKind::Bracket
    }

    /// Returns true if this token is the given bracket character.
    pub fn is_bracket_char(&self, ch: char) -> bool {
        self.kind == TokenKind::Bracket && self.text.len() == 1 && self.text.starts_with(ch)
    }

    /// Returns true for comment and string tokens, which structural
    /// walkers skip over.
    pub fn is_comment_or_string(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::StringLit)
    }

    /// Returns true for tokens that can appear as the object of an
    /// extraction chain: identifiers, strings, and numbers.
    pub fn is_identifier_like(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier | TokenKind::StringLit | TokenKind::Number
        )
    }

    /// Returns true if this token's text equals `s`.
    pub fn is(&self, s: &str) -> bool {
        self.text == s
    }

    /// Returns true if this token is a keyword with the given text.
    pub fn is_keyword(&self, s: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == s
    }
}

/// Lexical state carried across line boundaries.
///
/// Equality of a freshly computed exit state with the previously cached one
/// is the cache's signal that nothing downstream needs recomputation, so
/// variants must compare cheaply and exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub enum LexState {
    /// Ordinary code.
    #[default]
    Normal,
    /// Inside a block comment; `depth` supports nestable comment syntaxes.
    BlockComment { depth: u32 },
    /// Inside a multi-line string with the given delimiter.
    MultiLineString { delim: char },
    /// Inside a raw string; `hashes` is the delimiter repetition count.
    RawString { hashes: u32 },
}

/// Per-language lexical collaborator.
///
/// Implementations must be pure: the same `(line, state)` input always
/// produces the same output. Tokens must be ordered by column and carry
/// columns within the line.
pub trait Tokenizer {
    fn tokenize_line(&self, line: &str, state: &LexState) -> (Vec<Token>, LexState);
}
