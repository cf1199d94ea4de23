//! Language dispatch and per-language capability implementations.
//!
//! Each supported language family supplies a tokenizer, a set of cursor
//! navigation heuristics, and a [`ScopeRules`] implementation the scope
//! tree builder drives. Capabilities are traits over the shared cursor and
//! node types; there is no per-language node subclassing.

mod c_family;
mod data_lang;

pub use c_family::{CFamilyCursor, CFamilyScopeRules};
pub use data_lang::{ChainCursor, DataLangScopeRules};

use crate::cursor::TokenCursor;
use crate::document::Position;
use crate::lexer::{CFamilyTokenizer, DataLangTokenizer};
use crate::scope::BraceCategory;
use crate::token::{Token, Tokenizer};
use std::path::Path;

/// Supported language families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// C and C++.
    #[default]
    CFamily,
    /// The pipe-oriented data language (plain and literate documents).
    DataLang,
}

impl Language {
    /// Detects the language from a file path based on extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Detects the language from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "c" | "h" | "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Self::CFamily),
            "r" | "rmd" | "rnw" => Some(Self::DataLang),
            _ => None,
        }
    }

    /// Returns the display name of the language family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CFamily => "C/C++",
            Self::DataLang => "Data",
        }
    }

    /// Builds the reference tokenizer for this language.
    pub fn tokenizer(&self) -> Box<dyn Tokenizer> {
        match self {
            Self::CFamily => Box::new(CFamilyTokenizer::new()),
            Self::DataLang => Box::new(DataLangTokenizer::new()),
        }
    }

    /// Builds the scope classification rules for this language.
    pub fn scope_rules(&self) -> Box<dyn ScopeRules> {
        match self {
            Self::CFamily => Box::new(CFamilyScopeRules),
            Self::DataLang => Box::new(DataLangScopeRules),
        }
    }
}

/// Result of classifying an opening brace.
#[derive(Debug, Clone)]
pub struct BraceClassification {
    pub category: BraceCategory,
    pub label: Option<String>,
    /// Where the scope visually begins (start of a return type or the
    /// defining keyword); `None` means "at the brace itself".
    pub preamble: Option<Position>,
}

impl BraceClassification {
    pub fn anonymous() -> Self {
        Self {
            category: BraceCategory::Anonymous,
            label: None,
            preamble: None,
        }
    }
}

/// A recognized section heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeading {
    pub label: String,
    pub depth: usize,
}

/// Per-language scope classification capabilities consumed by the builder.
pub trait ScopeRules {
    /// Classifies the opening brace under the cursor. Must not fail; the
    /// unclassifiable case is [`BraceClassification::anonymous`].
    fn classify_brace(&self, at_brace: &TokenCursor) -> BraceClassification;

    /// Recognizes a section heading token.
    fn section(&self, token: &Token) -> Option<SectionHeading>;

    /// Recognizes a chunk-opening delimiter, yielding its optional label.
    fn chunk_start(&self, token: &Token) -> Option<Option<String>>;

    /// Recognizes a chunk-closing delimiter.
    fn chunk_end(&self, token: &Token) -> bool;
}

/// Parses a comment's text as a section heading: a title followed by a
/// trailing run of at least four `-`, `=`, or `#` characters. The heading
/// depth is the number of leading comment markers.
pub(crate) fn parse_section_heading(comment: &str, marker: char) -> Option<SectionHeading> {
    let trimmed = comment.trim_end();
    let tail_len = trimmed
        .chars()
        .rev()
        .take_while(|&c| c == '-' || c == '=' || c == '#')
        .count();
    if tail_len < 4 {
        return None;
    }
    let body = &trimmed[..trimmed.len() - tail_len];

    let depth = body.chars().take_while(|&c| c == marker).count();
    if depth == 0 {
        return None;
    }
    let label = body.trim_start_matches(marker).trim();
    if label.is_empty() {
        return None;
    }
    Some(SectionHeading {
        label: label.to_string(),
        depth,
    })
}

/// Collects token texts from `from` up to and including `to`. Gives up
/// (returns None) past the sanity limit.
pub(crate) fn texts_between(
    mut from: TokenCursor,
    to: &TokenCursor,
    limit: usize,
) -> Option<Vec<String>> {
    let mut texts = Vec::new();
    loop {
        let token = from.current_token()?;
        texts.push(token.text.clone());
        if (from.row(), from.index()) == (to.row(), to.index()) {
            return Some(texts);
        }
        if texts.len() > limit || !from.move_to_next_token() {
            return None;
        }
    }
}

/// Reassembles token texts into display text, with spacing rules good
/// enough for scope labels.
pub(crate) fn join_tokens<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for text in texts {
        let no_space_before = matches!(text, "," | "(" | ")" | "]" | ";" | "::" | "<" | ">");
        let no_space_after = matches!(out.chars().last(), Some('(') | Some('[') | Some('<'))
            || out.ends_with("::");
        if !out.is_empty() && !no_space_before && !no_space_after {
            out.push(' ');
        }
        out.push_str(text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_extension("cpp"), Some(Language::CFamily));
        assert_eq!(Language::from_extension("H"), Some(Language::CFamily));
        assert_eq!(Language::from_extension("R"), Some(Language::DataLang));
        assert_eq!(Language::from_extension("rmd"), Some(Language::DataLang));
        assert_eq!(Language::from_extension("txt"), None);
        assert_eq!(
            Language::from_path(Path::new("src/model.cc")),
            Some(Language::CFamily)
        );
    }

    #[test]
    fn test_parse_section_heading() {
        let h = parse_section_heading("# Load data ----", '#').unwrap();
        assert_eq!(h.label, "Load data");
        assert_eq!(h.depth, 1);

        let h = parse_section_heading("### Cleanup ====", '#').unwrap();
        assert_eq!(h.label, "Cleanup");
        assert_eq!(h.depth, 3);

        assert!(parse_section_heading("# plain comment", '#').is_none());
        assert!(parse_section_heading("# ---", '#').is_none()); // run too short
        assert!(parse_section_heading("# ----", '#').is_none()); // no title
    }

    #[test]
    fn test_join_tokens() {
        let s = join_tokens(vec!["void", "bar", "(", "int", "x", ",", "int", "y", ")"]);
        assert_eq!(s, "void bar(int x, int y)");
    }
}
