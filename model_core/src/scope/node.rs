//! Scope tree node types.

use crate::document::Position;
use std::collections::HashMap;

/// The structural kind of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The document itself; exactly one per tree, never closed.
    Root,
    /// A `{ ... }` region.
    Brace,
    /// An embedded sub-document region (literate-document code block).
    Chunk,
    /// A heading/section comment region.
    Section,
}

/// Refinement of [`ScopeKind::Brace`] nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceCategory {
    Class,
    Namespace,
    Function,
    Lambda,
    Test,
    Anonymous,
}

/// One lexical region of the document.
///
/// `preamble` is where the node visually begins (start of a function's
/// return type); `start` is where structural parsing resumes (the opening
/// brace); `end == None` means the scope is still open. Children are owned,
/// kept sorted by `preamble`, and never overlap.
#[derive(Debug, Clone)]
pub struct ScopeNode {
    pub label: Option<String>,
    pub preamble: Position,
    pub start: Position,
    pub end: Option<Position>,
    pub kind: ScopeKind,
    pub category: Option<BraceCategory>,
    pub attributes: HashMap<String, String>,
    pub(crate) children: Vec<ScopeNode>,
}

impl ScopeNode {
    /// Creates the tree root spanning the whole document.
    pub(crate) fn root() -> Self {
        Self {
            label: None,
            preamble: Position::new(0, 0),
            start: Position::new(0, 0),
            end: None,
            kind: ScopeKind::Root,
            category: None,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates an open brace scope.
    pub fn brace(
        category: BraceCategory,
        label: Option<String>,
        preamble: Position,
        start: Position,
    ) -> Self {
        Self {
            label,
            preamble,
            start,
            end: None,
            kind: ScopeKind::Brace,
            category: Some(category),
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates an open section scope at the given heading depth.
    pub fn section(label: String, depth: usize, at: Position) -> Self {
        let mut node = Self {
            label: Some(label),
            preamble: at,
            start: at,
            end: None,
            kind: ScopeKind::Section,
            category: None,
            attributes: HashMap::new(),
            children: Vec::new(),
        };
        node.attributes.insert("depth".into(), depth.to_string());
        node
    }

    /// Creates an open chunk scope.
    pub fn chunk(label: Option<String>, at: Position) -> Self {
        Self {
            label,
            preamble: at,
            start: at,
            end: None,
            kind: ScopeKind::Chunk,
            category: None,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute, returning self for construction chains.
    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Heading depth for Section nodes, 0 otherwise.
    pub fn section_depth(&self) -> usize {
        self.attributes
            .get("depth")
            .and_then(|d| d.parse().ok())
            .unwrap_or(0)
    }

    /// True if `pos` falls inside `[preamble, end)`. Open scopes contain
    /// everything from their preamble onward.
    pub fn contains(&self, pos: Position) -> bool {
        if self.kind == ScopeKind::Root {
            return true;
        }
        if pos < self.preamble {
            return false;
        }
        match self.end {
            Some(end) => pos < end,
            None => true,
        }
    }

    /// The node's owned children, ordered by preamble.
    pub fn children(&self) -> &[ScopeNode] {
        &self.children
    }

    /// Display text: the label, or a placeholder for anonymous scopes.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(match self.category {
            Some(BraceCategory::Namespace) => "<anonymous namespace>",
            Some(BraceCategory::Lambda) => "<lambda>",
            Some(BraceCategory::Function) => "<function>",
            _ => "<block>",
        })
    }
}
