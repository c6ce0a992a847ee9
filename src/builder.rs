//! Graph construction
//!
//! Parses the source, applies the error policy, creates one graph node per
//! syntax node in pre-order and runs the requested analyses on top.

use crate::adapter::{self, Language, SyntaxId, SyntaxTree};
use crate::edge::{Edge, EdgeKind};
use crate::flow::{ControlFlowBuilder, DataFlowBuilder, FlowInput};
use crate::graph::ProgramGraph;
use crate::node::{Node, NodeId, SemanticRole};
use crate::rules::LanguageRules;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// What to do with malformed or unsupported input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole construction
    #[default]
    Raise,
    /// Replace the offending subtree with an opaque node
    Ignore,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Raise => "raise",
            ErrorPolicy::Ignore => "ignore",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raise" | "strict" => Ok(ErrorPolicy::Raise),
            "ignore" | "lenient" => Ok(ErrorPolicy::Ignore),
            _ => Err(Error::InvalidArgument(format!("Unknown error policy: {}", s))),
        }
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Edge families that can be switched on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analysis {
    /// `Child` (and optional `Sibling`) edges
    Ast,
    /// `NextControlFlow`, `GuardedBy` and `ReturnFrom` edges
    Cfg,
    /// `LastWrite`, `LastRead` and `ComputedFrom` edges
    DataFlow,
}

impl Analysis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Analysis::Ast => "ast",
            Analysis::Cfg => "cfg",
            Analysis::DataFlow => "dataflow",
        }
    }

    pub fn all() -> &'static [Analysis] {
        &[Analysis::Ast, Analysis::Cfg, Analysis::DataFlow]
    }
}

impl FromStr for Analysis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ast" | "syntax" => Ok(Analysis::Ast),
            "cfg" | "control_flow" | "controlflow" => Ok(Analysis::Cfg),
            "dataflow" | "data_flow" | "df" => Ok(Analysis::DataFlow),
            _ => Err(Error::InvalidArgument(format!("Unknown analysis: {}", s))),
        }
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for one graph construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub language: Language,
    pub on_error: ErrorPolicy,
    /// Nodes and `NextToken` edges are always built
    pub analyses: Vec<Analysis>,
    pub sibling_edges: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::new(Language::Python)
    }
}

impl BuildOptions {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            on_error: ErrorPolicy::default(),
            analyses: Analysis::all().to_vec(),
            sibling_edges: false,
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn with_analyses(mut self, analyses: &[Analysis]) -> Self {
        self.analyses = analyses.to_vec();
        self
    }

    pub fn with_sibling_edges(mut self, enabled: bool) -> Self {
        self.sibling_edges = enabled;
        self
    }

    pub fn enables(&self, analysis: Analysis) -> bool {
        self.analyses.contains(&analysis)
    }
}

/// Builds program graphs with fixed options.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    options: BuildOptions,
}

impl GraphBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the graph of one source text
    pub fn build(&self, source: &str) -> Result<ProgramGraph> {
        let language = self.options.language;
        let rules = language.rules();
        let tree = adapter::parse(source, language)?;
        let opaque = self.check(&tree, rules)?;

        let mut graph = ProgramGraph::new(language);
        let nodes = create_nodes(&mut graph, &tree, rules, &opaque);
        self.syntax_edges(&mut graph, &tree, &nodes);

        let input = FlowInput {
            tree: &tree,
            rules,
            nodes: &nodes,
            opaque: &opaque,
        };
        if self.options.enables(Analysis::Cfg) {
            let flow = ControlFlowBuilder::new(input).build();
            add_all(&mut graph, flow.edges);
        }
        if self.options.enables(Analysis::DataFlow) {
            add_all(&mut graph, DataFlowBuilder::new(input).build());
        }

        tracing::debug!(
            "built {} graph: {} nodes, {} edges, {} opaque",
            language,
            graph.len(),
            graph.edge_count(),
            opaque.len()
        );
        Ok(graph)
    }

    /// Apply the error policy; returns the roots of opaque subtrees
    fn check(&self, tree: &SyntaxTree, rules: &dyn LanguageRules) -> Result<HashSet<SyntaxId>> {
        let malformed = tree.malformed();
        let unsupported = tree.topmost(|node| rules.is_unsupported(node.kind()));

        if self.options.on_error == ErrorPolicy::Raise {
            if let Some(&id) = malformed.first() {
                return Err(Error::Parse {
                    range: tree.range(id),
                    message: describe_malformed(tree, id),
                });
            }
            if let Some(&id) = unsupported.first() {
                return Err(Error::UnsupportedConstruct {
                    kind: tree.kind(id).to_string(),
                    range: tree.range(id),
                });
            }
            return Ok(HashSet::new());
        }

        for &id in &malformed {
            tracing::warn!("ignoring malformed source at {}", tree.range(id));
        }
        for &id in &unsupported {
            tracing::warn!("ignoring unsupported {} at {}", tree.kind(id), tree.range(id));
        }
        Ok(malformed.into_iter().chain(unsupported).collect())
    }

    fn syntax_edges(&self, graph: &mut ProgramGraph, tree: &SyntaxTree, nodes: &[Option<NodeId>]) {
        let node_of = |id: SyntaxId| nodes.get(id.index()).copied().flatten();
        let with_ast = self.options.enables(Analysis::Ast);

        if with_ast {
            for id in tree.ids() {
                let Some(parent) = node_of(id) else {
                    continue;
                };
                if graph.node(parent).is_some_and(|n| n.opaque) {
                    continue;
                }
                let children: Vec<NodeId> =
                    tree.children(id).iter().filter_map(|c| node_of(*c)).collect();
                for &child in &children {
                    graph.add_edge(Edge::new(parent, EdgeKind::Child, child));
                }
                if self.options.sibling_edges {
                    for pair in children.windows(2) {
                        graph.add_edge(Edge::new(pair[0], EdgeKind::Sibling, pair[1]));
                    }
                }
            }
        }

        // Tokens are created in pre-order, which is source order
        let tokens: Vec<NodeId> = graph.tokens().map(|t| t.id).collect();
        for pair in tokens.windows(2) {
            graph.add_edge(Edge::new(pair[0], EdgeKind::NextToken, pair[1]));
        }
    }
}

/// One node per syntax node, skipping everything below opaque roots
fn create_nodes(
    graph: &mut ProgramGraph,
    tree: &SyntaxTree,
    rules: &dyn LanguageRules,
    opaque: &HashSet<SyntaxId>,
) -> Vec<Option<NodeId>> {
    let mut nodes = vec![None; tree.len()];
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let syntax = tree.node(id);
        let is_opaque = opaque.contains(&id);
        let node = Node {
            id: NodeId(0),
            kind: syntax.kind().to_string(),
            role: if is_opaque {
                SemanticRole::Other
            } else {
                rules.classify(syntax.kind())
            },
            text: (!is_opaque && syntax.is_leaf()).then(|| tree.text(id).to_string()),
            range: syntax.range(),
            opaque: is_opaque,
        };
        nodes[id.index()] = Some(graph.add_node(node));
        if !is_opaque {
            stack.extend(syntax.children().iter().rev().copied());
        }
    }
    nodes
}

fn add_all(graph: &mut ProgramGraph, edges: Vec<Edge>) {
    for edge in edges {
        graph.add_edge(edge);
    }
}

fn describe_malformed(tree: &SyntaxTree, id: SyntaxId) -> String {
    let node = tree.node(id);
    if node.kind() == "ERROR" {
        let text = tree.text(id).lines().next().unwrap_or("").trim();
        format!("syntax error near `{}`", text)
    } else {
        format!("missing `{}`", node.kind())
    }
}

/// Build a program graph with all analyses enabled
pub fn build_graph(source: &str, language: Language, policy: ErrorPolicy) -> Result<ProgramGraph> {
    build_graph_with(source, &BuildOptions::new(language).with_policy(policy))
}

pub fn build_graph_with(source: &str, options: &BuildOptions) -> Result<ProgramGraph> {
    GraphBuilder::new(options.clone()).build(source)
}
