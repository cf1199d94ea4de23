//! Scope tree ownership and mutation.
//!
//! The manager owns the root node and the `parse_pos` watermark marking how
//! far the tree has been built. All mutation goes through it: builders
//! append open nodes, close them in LIFO order, and invalidate suffixes of
//! the tree after edits.

use super::node::{ScopeKind, ScopeNode};
use crate::document::Position;

/// Owns one scope tree and its build watermark.
#[derive(Debug, Clone)]
pub struct ScopeManager {
    root: ScopeNode,
    parse_pos: Position,
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeManager {
    pub fn new() -> Self {
        Self {
            root: ScopeNode::root(),
            parse_pos: Position::new(0, 0),
        }
    }

    /// The tree root (kind Root, never closed).
    pub fn root(&self) -> &ScopeNode {
        &self.root
    }

    /// How far the tree has been built; builders resume from here.
    pub fn parse_pos(&self) -> Position {
        self.parse_pos
    }

    pub fn set_parse_pos(&mut self, pos: Position) {
        self.parse_pos = pos;
    }

    /// Inserts a new open node at its position-determined place in the
    /// tree.
    ///
    /// Descends by binary search over child preambles; if the position
    /// falls inside an existing child the insertion recurses into it.
    /// Otherwise the node is spliced in among the siblings, adopting any
    /// later siblings its own interval now envelops (a function scope is
    /// discovered at its opening brace, after brace scopes inside its
    /// default arguments were already attached to the grandparent).
    pub fn add_node(&mut self, node: ScopeNode) {
        Self::insert_into(&mut self.root, node);
    }

    fn insert_into(parent: &mut ScopeNode, node: ScopeNode) {
        let idx = parent
            .children
            .partition_point(|c| c.preamble <= node.preamble);
        if idx > 0 && parent.children[idx - 1].contains(node.preamble) {
            return Self::insert_into(&mut parent.children[idx - 1], node);
        }

        let mut node = node;
        while idx < parent.children.len() {
            let sibling = &parent.children[idx];
            let enveloped = match node.end {
                // An open node reaches to the end of the document.
                None => sibling.preamble >= node.preamble,
                Some(end) => {
                    sibling.preamble >= node.preamble
                        && matches!(sibling.end, Some(se) if se <= end)
                }
            };
            if !enveloped {
                break;
            }
            let adopted = parent.children.remove(idx);
            node.children.push(adopted);
        }
        parent.children.insert(idx, node);
    }

    /// Indices of the rightmost open chain, outermost first.
    fn open_chain_path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cur = &self.root;
        while let Some(last) = cur.children.last() {
            if !last.is_open() {
                break;
            }
            path.push(cur.children.len() - 1);
            cur = last;
        }
        path
    }

    /// The rightmost open chain as node references, outermost first.
    pub fn open_chain(&self) -> Vec<&ScopeNode> {
        let mut nodes = Vec::new();
        let mut cur = &self.root;
        for &i in &self.open_chain_path() {
            cur = &cur.children[i];
            nodes.push(cur);
        }
        nodes
    }

    /// Closes the most recently opened scope of the given kind at `pos`,
    /// force-closing any open descendants underneath it first. Returns the
    /// closed node, or `None` when no open scope of that kind exists (a
    /// stray closer, tolerated silently).
    pub fn close_scope(&mut self, pos: Position, kind: ScopeKind) -> Option<&ScopeNode> {
        let path = self.open_chain_path();

        let mut target_depth = None;
        {
            let mut cur = &self.root;
            for (depth, &i) in path.iter().enumerate() {
                cur = &cur.children[i];
                if cur.kind == kind {
                    target_depth = Some(depth);
                }
            }
        }
        let target_depth = match target_depth {
            Some(d) => d,
            None => {
                log::debug!("stray {:?} closer at {:?} ignored", kind, pos);
                return None;
            }
        };

        {
            let mut cur = &mut self.root;
            for (depth, &i) in path.iter().enumerate() {
                cur = &mut cur.children[i];
                if depth >= target_depth {
                    cur.end = Some(pos);
                }
            }
        }

        let mut cur = &self.root;
        for &i in &path[..=target_depth] {
            cur = &cur.children[i];
        }
        Some(cur)
    }

    /// The innermost non-root node containing `pos`.
    pub fn find_node(&self, pos: Position) -> Option<&ScopeNode> {
        self.active_scopes(pos).last().copied()
    }

    /// The ordered ancestor chain of nodes containing `pos`, outermost
    /// first, root excluded.
    pub fn active_scopes(&self, pos: Position) -> Vec<&ScopeNode> {
        let mut chain = Vec::new();
        let mut cur = &self.root;
        loop {
            let idx = cur.children.partition_point(|c| c.preamble <= pos);
            if idx == 0 {
                break;
            }
            let child = &cur.children[idx - 1];
            if !child.contains(pos) {
                break;
            }
            chain.push(child);
            cur = child;
        }
        chain
    }

    /// Labels of the containing scopes, outermost first; unlabeled nodes
    /// are searched through but not reported.
    pub fn active_scope_labels(&self, pos: Position) -> Vec<String> {
        self.active_scopes(pos)
            .iter()
            .filter_map(|n| n.label.clone())
            .collect()
    }

    /// Invalidates the tree from `pos`: whole siblings at/after the
    /// position are pruned; a sibling straddling the position is reopened
    /// and recursed into. Returns the earliest position a builder pass must
    /// restart from, and moves `parse_pos` back to it.
    pub fn invalidate_from(&mut self, pos: Position) -> Position {
        let resume = Self::invalidate_node(&mut self.root, pos);
        if resume < self.parse_pos {
            self.parse_pos = resume;
        }
        resume
    }

    fn invalidate_node(node: &mut ScopeNode, pos: Position) -> Position {
        let cut = node.children.partition_point(|c| c.preamble < pos);
        let mut resume = pos;
        if cut < node.children.len() {
            resume = resume.min(node.children[cut].preamble);
            node.children.truncate(cut);
        }
        if let Some(child) = node.children.last_mut() {
            let straddles = match child.end {
                None => true,
                Some(end) => end > pos,
            };
            if straddles {
                child.end = None;
                resume = resume.min(Self::invalidate_node(child, pos));
            }
        }
        resume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::node::BraceCategory;

    fn brace(label: &str, preamble: (usize, usize), start: (usize, usize)) -> ScopeNode {
        ScopeNode::brace(
            BraceCategory::Anonymous,
            Some(label.to_string()),
            Position::new(preamble.0, preamble.1),
            Position::new(start.0, start.1),
        )
    }

    #[test]
    fn test_lifo_closing() {
        let mut mgr = ScopeManager::new();
        mgr.add_node(brace("A", (0, 0), (0, 0)));
        mgr.add_node(brace("B", (1, 0), (1, 0)));

        let closed = mgr.close_scope(Position::new(2, 0), ScopeKind::Brace);
        assert_eq!(closed.unwrap().label.as_deref(), Some("B"));
        let closed = mgr.close_scope(Position::new(3, 0), ScopeKind::Brace);
        assert_eq!(closed.unwrap().label.as_deref(), Some("A"));
    }

    #[test]
    fn test_stray_closer_is_ignored() {
        let mut mgr = ScopeManager::new();
        assert!(mgr
            .close_scope(Position::new(0, 1), ScopeKind::Brace)
            .is_none());

        mgr.add_node(ScopeNode::section("S".into(), 1, Position::new(0, 0)));
        // A brace closer cannot close a section.
        assert!(mgr
            .close_scope(Position::new(1, 0), ScopeKind::Brace)
            .is_none());
        assert!(mgr.root().children()[0].is_open());
    }

    #[test]
    fn test_forced_closure_of_descendants() {
        let mut mgr = ScopeManager::new();
        mgr.add_node(brace("outer", (0, 0), (0, 0)));
        mgr.add_node(ScopeNode::section("inner section".into(), 1, Position::new(1, 0)));

        let closed = mgr.close_scope(Position::new(5, 0), ScopeKind::Brace);
        assert_eq!(closed.unwrap().label.as_deref(), Some("outer"));
        // The section was force-closed underneath it.
        let outer = &mgr.root().children()[0];
        assert!(!outer.children()[0].is_open());
        assert_eq!(outer.children()[0].end, Some(Position::new(5, 0)));
    }

    #[test]
    fn test_active_scopes_depth() {
        let mut mgr = ScopeManager::new();
        mgr.add_node(brace("a", (0, 0), (0, 0)));
        mgr.add_node(brace("b", (1, 0), (1, 0)));
        mgr.add_node(brace("c", (2, 0), (2, 0)));
        mgr.close_scope(Position::new(3, 0), ScopeKind::Brace); // closes c

        assert_eq!(mgr.active_scopes(Position::new(2, 5)).len(), 3);
        assert_eq!(mgr.active_scopes(Position::new(4, 0)).len(), 2);
        let labels = mgr.active_scope_labels(Position::new(2, 5));
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(
            mgr.find_node(Position::new(2, 5)).unwrap().label.as_deref(),
            Some("c")
        );
    }

    #[test]
    fn test_adoption_of_enveloped_siblings() {
        let mut mgr = ScopeManager::new();
        // A brace scope inside a default-argument expression is attached
        // first, directly to the root.
        let mut early = brace("arg-block", (0, 20), (0, 20));
        early.end = Some(Position::new(0, 24));
        mgr.add_node(early);

        // The function scope is discovered later, with an earlier preamble.
        mgr.add_node(brace("f", (0, 0), (0, 30)));

        let root_children = mgr.root().children();
        assert_eq!(root_children.len(), 1);
        assert_eq!(root_children[0].label.as_deref(), Some("f"));
        assert_eq!(root_children[0].children()[0].label.as_deref(), Some("arg-block"));
    }

    #[test]
    fn test_invalidate_at_sibling_boundary() {
        let mut mgr = ScopeManager::new();
        let mut a = brace("a", (0, 0), (0, 0));
        a.end = Some(Position::new(2, 1));
        mgr.add_node(a);
        let mut b = brace("b", (3, 0), (3, 0));
        b.end = Some(Position::new(5, 1));
        mgr.add_node(b);
        mgr.set_parse_pos(Position::new(6, 0));

        // Invalidate exactly at the boundary between the two siblings.
        let resume = mgr.invalidate_from(Position::new(3, 0));
        assert_eq!(mgr.root().children().len(), 1);
        assert_eq!(mgr.root().children()[0].label.as_deref(), Some("a"));
        assert!(resume <= Position::new(3, 0));
        assert_eq!(mgr.parse_pos(), resume);
    }

    #[test]
    fn test_invalidate_reopens_straddling_node() {
        let mut mgr = ScopeManager::new();
        let mut outer = brace("outer", (0, 0), (0, 0));
        outer.end = Some(Position::new(10, 1));
        mgr.add_node(outer);
        let mut inner = brace("inner", (2, 0), (2, 0));
        inner.end = Some(Position::new(4, 1));
        mgr.add_node(inner);
        let mut later = brace("later", (6, 0), (6, 0));
        later.end = Some(Position::new(8, 1));
        mgr.add_node(later);

        let resume = mgr.invalidate_from(Position::new(5, 0));
        let outer = &mgr.root().children()[0];
        assert!(outer.is_open()); // reopened
        assert_eq!(outer.children().len(), 1); // "later" pruned
        assert_eq!(outer.children()[0].label.as_deref(), Some("inner"));
        assert!(resume <= Position::new(5, 0));
    }

    #[test]
    fn test_invalidate_before_everything_clears_tree() {
        let mut mgr = ScopeManager::new();
        let mut a = brace("a", (1, 0), (1, 0));
        a.end = Some(Position::new(2, 0));
        mgr.add_node(a);

        let resume = mgr.invalidate_from(Position::new(0, 0));
        assert!(mgr.root().children().is_empty());
        assert_eq!(resume, Position::new(0, 0));
    }
}
