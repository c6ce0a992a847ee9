//! Owned syntax tree
//!
//! The parser's tree is copied into a flat arena once, so every later pass
//! works on plain indices instead of borrowing the tree-sitter tree.

use serde::{Deserialize, Serialize};

/// Index of a node inside a [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxId(pub u32);

impl SyntaxId {
    /// The root node of every tree
    pub fn root() -> Self {
        Self(0)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A zero-based (row, column) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

/// Source span of a syntax element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,
}

impl SourceRange {
    pub fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }
}

impl From<tree_sitter::Range> for SourceRange {
    fn from(range: tree_sitter::Range) -> Self {
        Self {
            start_byte: range.start_byte,
            end_byte: range.end_byte,
            start: Point {
                row: range.start_point.row as u32,
                column: range.start_point.column as u32,
            },
            end: Point {
                row: range.end_point.row as u32,
                column: range.end_point.column as u32,
            },
        }
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.row + 1,
            self.start.column + 1,
            self.end.row + 1,
            self.end.column + 1
        )
    }
}

/// One node of the owned syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: &'static str,
    named: bool,
    field: Option<&'static str>,
    range: SourceRange,
    parent: Option<SyntaxId>,
    children: Vec<SyntaxId>,
    malformed: bool,
}

impl SyntaxNode {
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn is_named(&self) -> bool {
        self.named
    }

    /// Grammar field under which this node hangs off its parent
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn parent(&self) -> Option<SyntaxId> {
        self.parent
    }

    pub fn children(&self) -> &[SyntaxId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// ERROR or MISSING node reported by the parser
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }
}

/// Read-only arena holding a parsed source unit.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Copy a tree-sitter tree into an owned arena.
    ///
    /// Nodes are stored in pre-order, so a node's id is always greater than
    /// its parent's and leaves appear in source order.
    pub fn from_tree_sitter(tree: &tree_sitter::Tree, source: &str) -> Self {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut parents: Vec<SyntaxId> = Vec::new();
        let mut cursor = tree.walk();

        loop {
            let node = cursor.node();
            let id = SyntaxId(nodes.len() as u32);
            let parent = parents.last().copied();

            nodes.push(SyntaxNode {
                kind: node.kind(),
                named: node.is_named(),
                field: cursor.field_name(),
                range: node.range().into(),
                parent,
                children: Vec::new(),
                malformed: node.is_error() || node.is_missing(),
            });
            if let Some(p) = parent {
                nodes[p.index()].children.push(id);
            }

            if cursor.goto_first_child() {
                parents.push(id);
                continue;
            }

            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    return Self {
                        source: source.to_string(),
                        nodes,
                    };
                }
                parents.pop();
            }
        }
    }

    pub fn root(&self) -> SyntaxId {
        SyntaxId::root()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self, id: SyntaxId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: SyntaxId) -> &'static str {
        self.node(id).kind
    }

    pub fn range(&self, id: SyntaxId) -> SourceRange {
        self.node(id).range
    }

    pub fn children(&self, id: SyntaxId) -> &[SyntaxId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: SyntaxId) -> Option<SyntaxId> {
        self.node(id).parent
    }

    /// Source text covered by a node
    pub fn text(&self, id: SyntaxId) -> &str {
        let range = self.range(id);
        self.source.get(range.start_byte..range.end_byte).unwrap_or("")
    }

    /// Token text, only for leaves
    pub fn token_text(&self, id: SyntaxId) -> Option<&str> {
        if self.node(id).is_leaf() {
            Some(self.text(id))
        } else {
            None
        }
    }

    pub fn named_children(&self, id: SyntaxId) -> impl Iterator<Item = SyntaxId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.node(*c).named)
    }

    pub fn child_by_field(&self, id: SyntaxId, field: &str) -> Option<SyntaxId> {
        self.children_by_field(id, field).next()
    }

    pub fn children_by_field<'a>(
        &'a self,
        id: SyntaxId,
        field: &'a str,
    ) -> impl Iterator<Item = SyntaxId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.node(*c).field == Some(field))
    }

    /// First child with the given kind
    pub fn child_of_kind(&self, id: SyntaxId, kind: &str) -> Option<SyntaxId> {
        self.children(id).iter().copied().find(|c| self.kind(*c) == kind)
    }

    pub fn children_of_kind<'a>(
        &'a self,
        id: SyntaxId,
        kind: &'a str,
    ) -> impl Iterator<Item = SyntaxId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.kind(*c) == kind)
    }

    /// All node ids in pre-order
    pub fn ids(&self) -> impl Iterator<Item = SyntaxId> {
        (0..self.nodes.len() as u32).map(SyntaxId)
    }

    /// Topmost malformed nodes, in source order
    pub fn malformed(&self) -> Vec<SyntaxId> {
        self.topmost(|node| node.malformed)
    }

    /// Topmost nodes matching `pred`; descendants of a match are not reported
    pub fn topmost(&self, pred: impl Fn(&SyntaxNode) -> bool) -> Vec<SyntaxId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if pred(node) {
                found.push(id);
                continue;
            }
            stack.extend(node.children.iter().rev().copied());
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{parse, Language};

    #[test]
    fn test_preorder_layout() {
        let tree = parse("x = 1\n", Language::Python).unwrap();
        assert_eq!(tree.kind(tree.root()), "module");
        for id in tree.ids().skip(1) {
            let parent = tree.parent(id).unwrap();
            assert!(parent < id);
            assert!(tree.children(parent).contains(&id));
        }
    }

    #[test]
    fn test_fields_and_text() {
        let tree = parse("total = a + b\n", Language::Python).unwrap();
        let assignment = tree
            .ids()
            .find(|id| tree.kind(*id) == "assignment")
            .unwrap();
        let left = tree.child_by_field(assignment, "left").unwrap();
        let right = tree.child_by_field(assignment, "right").unwrap();
        assert_eq!(tree.token_text(left), Some("total"));
        assert_eq!(tree.text(right), "a + b");
        assert_eq!(tree.token_text(right), None);
    }

    #[test]
    fn test_malformed_reported() {
        let tree = parse("def f(:\n    return 1\n", Language::Python).unwrap();
        assert!(!tree.malformed().is_empty());

        let clean = parse("def f(a):\n    return a\n", Language::Python).unwrap();
        assert!(clean.malformed().is_empty());
    }

    #[test]
    fn test_range_display() {
        let tree = parse("x = 1\n", Language::Python).unwrap();
        let range = tree.range(tree.root());
        assert!(range.to_string().starts_with("1:1-"));
    }
}
