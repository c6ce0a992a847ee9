//! Control-flow and data-flow construction
//!
//! Both builders walk the owned syntax tree through the language rule set
//! and emit edges between graph nodes. Nodes inside opaque subtrees have no
//! graph counterpart and never receive flow edges.

pub mod control;
pub mod data;

pub use control::{ControlFlow, ControlFlowBuilder};
pub use data::DataFlowBuilder;

use crate::adapter::{SyntaxId, SyntaxTree};
use crate::node::NodeId;
use crate::rules::LanguageRules;
use std::collections::HashSet;

/// Everything a flow builder reads.
#[derive(Clone, Copy)]
pub struct FlowInput<'a> {
    pub tree: &'a SyntaxTree,
    pub rules: &'a dyn LanguageRules,
    /// Graph node of each syntax node, indexed by syntax id
    pub nodes: &'a [Option<NodeId>],
    /// Roots of subtrees replaced by opaque nodes
    pub opaque: &'a HashSet<SyntaxId>,
}

impl<'a> FlowInput<'a> {
    pub fn node_id(&self, id: SyntaxId) -> Option<NodeId> {
        self.nodes.get(id.index()).copied().flatten()
    }

    /// Opaque roots and everything dropped below them
    pub fn is_opaque(&self, id: SyntaxId) -> bool {
        self.opaque.contains(&id) || self.node_id(id).is_none()
    }
}
