//! Code Model Core - incremental, token-level editor intelligence.
//!
//! This crate contains the language-aware model behind auto-indentation,
//! bracket matching, scope breadcrumbs, and code folding, without any
//! dependencies on windowing or rendering systems.

pub mod cache;
pub mod config;
pub mod cursor;
pub mod document;
pub mod fold;
pub mod indent;
pub mod lang;
pub mod lexer;
pub mod model;
pub mod scope;
pub mod token;

pub use cache::{Debounce, RowTokenCache};
pub use config::ModelConfig;
pub use cursor::TokenCursor;
pub use document::{ChangeAction, DocChange, Document, Position};
pub use fold::{fold_ranges, FoldRegion};
pub use indent::IndentEngine;
pub use lang::{CFamilyCursor, ChainCursor, Language, ScopeRules};
pub use model::CodeModel;
pub use scope::{BraceCategory, ScopeKind, ScopeManager, ScopeNode, ScopeTreeBuilder};
pub use token::{LexState, Token, TokenKind, Tokenizer};
