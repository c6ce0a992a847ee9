//! Program Graph - node and edge store with traversal
//!
//! The store is append-only while a [`crate::builder::GraphBuilder`] fills
//! it and read-only afterwards: every mutator is crate-private.

use crate::adapter::Language;
use crate::edge::{Edge, EdgeKind};
use crate::node::{Node, NodeId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;

/// A multi-relational graph over the syntax elements of one code unit.
#[derive(Debug, Clone)]
pub struct ProgramGraph {
    language: Language,
    nodes: Vec<Node>,
    /// Outgoing edges, indexed by source node
    edges_from: Vec<Vec<Edge>>,
    /// Incoming edges, indexed by target node
    edges_to: Vec<Vec<Edge>>,
    seen: HashSet<Edge>,
}

impl ProgramGraph {
    pub(crate) fn new(language: Language) -> Self {
        Self {
            language,
            nodes: Vec::new(),
            edges_from: Vec::new(),
            edges_to: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Append a node; its id is the next free index
    pub(crate) fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.id = id;
        self.nodes.push(node);
        self.edges_from.push(Vec::new());
        self.edges_to.push(Vec::new());
        id
    }

    /// Add an edge; duplicates are dropped. Returns whether it was new.
    pub(crate) fn add_edge(&mut self, edge: Edge) -> bool {
        if edge.source.index() >= self.nodes.len() || edge.target.index() >= self.nodes.len() {
            tracing::debug!("dropping edge with unknown endpoint: {:?}", edge);
            return false;
        }
        if !self.seen.insert(edge) {
            return false;
        }
        self.edges_from[edge.source.index()].push(edge);
        self.edges_to[edge.target.index()].push(edge);
        true
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The root of the syntax tree
    pub fn root_node(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// All nodes in identity order
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf tokens in source order
    pub fn tokens(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_token())
    }

    /// All edges, grouped by source node
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges_from.iter().flat_map(|v| v.iter())
    }

    pub fn edge_count(&self) -> usize {
        self.seen.len()
    }

    /// Get outgoing edges from a node
    pub fn edges_from(&self, id: NodeId) -> &[Edge] {
        self.edges_from.get(id.index()).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Get incoming edges to a node
    pub fn edges_to(&self, id: NodeId) -> &[Edge] {
        self.edges_to.get(id.index()).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Outgoing `(node, kind, next)` triples restricted to `kinds`
    pub fn successors<'a>(
        &'a self,
        id: NodeId,
        kinds: &'a [EdgeKind],
    ) -> impl Iterator<Item = (NodeId, EdgeKind, NodeId)> + 'a {
        self.edges_from(id)
            .iter()
            .filter(move |e| kinds.contains(&e.kind))
            .map(Edge::triple)
    }

    /// Incoming `(previous, kind, node)` triples restricted to `kinds`
    pub fn predecessors<'a>(
        &'a self,
        id: NodeId,
        kinds: &'a [EdgeKind],
    ) -> impl Iterator<Item = (NodeId, EdgeKind, NodeId)> + 'a {
        self.edges_to(id)
            .iter()
            .filter(move |e| kinds.contains(&e.kind))
            .map(Edge::triple)
    }

    /// Syntactic children in source order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.successors(id, &[EdgeKind::Child]).map(|(_, _, c)| c)
    }

    /// Lazy depth-first walk from `start` following `kinds`.
    ///
    /// Every call starts a fresh walk.
    pub fn depth_first<'a>(&'a self, start: NodeId, kinds: &'a [EdgeKind]) -> DepthFirst<'a> {
        let mut stack = Vec::new();
        if start.index() < self.nodes.len() {
            stack.push(start);
        }
        DepthFirst {
            graph: self,
            kinds,
            stack,
            visited: HashSet::new(),
        }
    }

    /// Lazy breadth-first walk from `start` following `kinds`.
    pub fn breadth_first<'a>(&'a self, start: NodeId, kinds: &'a [EdgeKind]) -> BreadthFirst<'a> {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        if start.index() < self.nodes.len() {
            queue.push_back(start);
            visited.insert(start);
        }
        BreadthFirst {
            graph: self,
            kinds,
            queue,
            visited,
        }
    }

    /// Project the graph onto its tokens.
    ///
    /// Every non-token node is represented by its leftmost token; syntactic
    /// edges are dropped and all other edges are re-targeted between
    /// representers.
    pub fn tokens_only(&self) -> ProgramGraph {
        let mut output = ProgramGraph::new(self.language);
        let mut token_ids: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        for token in self.tokens() {
            let new_id = output.add_node(token.clone());
            token_ids.insert(token.id, new_id);
        }

        let representer = |mut id: NodeId| -> Option<NodeId> {
            loop {
                if let Some(new_id) = token_ids.get(&id) {
                    return Some(*new_id);
                }
                id = self.children(id).next()?;
            }
        };

        for edge in self.edges() {
            if edge.kind.is_syntactic() {
                continue;
            }
            let (Some(source), Some(target)) = (representer(edge.source), representer(edge.target))
            else {
                continue;
            };
            if source == target {
                continue;
            }
            output.add_edge(Edge {
                source,
                target,
                ..*edge
            });
        }
        output
    }

    /// Per-kind edge counts
    pub fn stats(&self) -> GraphStats {
        let mut edges_by_kind = BTreeMap::new();
        for edge in self.edges() {
            *edges_by_kind.entry(edge.kind).or_insert(0) += 1;
        }
        GraphStats {
            language: self.language,
            total_nodes: self.nodes.len(),
            tokens: self.tokens().count(),
            opaque_nodes: self.nodes.iter().filter(|n| n.opaque).count(),
            total_edges: self.edge_count(),
            edges_by_kind,
        }
    }

    /// Write the graph in DOT format to a file
    pub fn to_dot_file(&self, path: &Path) -> crate::Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        crate::export::write_dot(self, &mut file, &crate::export::EdgeColors::default())?;
        Ok(())
    }
}

/// Iterator returned by [`ProgramGraph::depth_first`].
pub struct DepthFirst<'a> {
    graph: &'a ProgramGraph,
    kinds: &'a [EdgeKind],
    stack: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id) {
                continue;
            }
            // Reverse so the first successor is visited first
            let next: Vec<NodeId> = self
                .graph
                .successors(id, self.kinds)
                .map(|(_, _, n)| n)
                .filter(|n| !self.visited.contains(n))
                .collect();
            self.stack.extend(next.into_iter().rev());
            return Some(id);
        }
        None
    }
}

/// Iterator returned by [`ProgramGraph::breadth_first`].
pub struct BreadthFirst<'a> {
    graph: &'a ProgramGraph,
    kinds: &'a [EdgeKind],
    queue: VecDeque<NodeId>,
    visited: HashSet<NodeId>,
}

impl Iterator for BreadthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        for (_, _, next) in self.graph.successors(id, self.kinds) {
            if self.visited.insert(next) {
                self.queue.push_back(next);
            }
        }
        Some(id)
    }
}

/// Statistics about a program graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub language: Language,
    pub total_nodes: usize,
    pub tokens: usize,
    pub opaque_nodes: usize,
    pub total_edges: usize,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
}

impl GraphStats {
    pub fn count(&self, kind: EdgeKind) -> usize {
        self.edges_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Program Graph Statistics ({}):", self.language)?;
        writeln!(f, "  Nodes: {} (tokens: {}, opaque: {})",
            self.total_nodes, self.tokens, self.opaque_nodes)?;
        writeln!(f, "  Edges: {}", self.total_edges)?;
        for (kind, count) in &self.edges_by_kind {
            writeln!(f, "    {}: {}", kind, count)?;
        }
        Ok(())
    }
}
