//! Edge types - typed relations of the program graph
//!
//! Four edge families connect the nodes:
//! - syntactic: `Child`, `Sibling`
//! - lexical: `NextToken`
//! - control flow: `NextControlFlow`, `GuardedBy`, `ReturnFrom`
//! - data flow: `LastWrite`, `LastRead`, `ComputedFrom`

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Relation kinds of the program graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Syntactic parent → child
    Child,
    /// Previous sibling → next sibling
    Sibling,
    /// Leaf token → following leaf token
    NextToken,
    /// Statement → statement executed next
    NextControlFlow,
    /// Statement → guard governing it (carries a [`Branch`])
    GuardedBy,
    /// Exit statement → enclosing function
    ReturnFrom,
    /// Variable use → most recent writer
    LastWrite,
    /// Variable write → most recent prior read
    LastRead,
    /// Right-hand-side read → assignment target
    ComputedFrom,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Child => "child",
            EdgeKind::Sibling => "sibling",
            EdgeKind::NextToken => "next_token",
            EdgeKind::NextControlFlow => "next_control_flow",
            EdgeKind::GuardedBy => "guarded_by",
            EdgeKind::ReturnFrom => "return_from",
            EdgeKind::LastWrite => "last_write",
            EdgeKind::LastRead => "last_read",
            EdgeKind::ComputedFrom => "computed_from",
        }
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[
            EdgeKind::Child,
            EdgeKind::Sibling,
            EdgeKind::NextToken,
            EdgeKind::NextControlFlow,
            EdgeKind::GuardedBy,
            EdgeKind::ReturnFrom,
            EdgeKind::LastWrite,
            EdgeKind::LastRead,
            EdgeKind::ComputedFrom,
        ]
    }

    /// Edges that only mirror the syntax tree
    pub fn is_syntactic(&self) -> bool {
        matches!(self, EdgeKind::Child | EdgeKind::Sibling)
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            EdgeKind::NextControlFlow | EdgeKind::GuardedBy | EdgeKind::ReturnFrom
        )
    }

    pub fn is_data_flow(&self) -> bool {
        matches!(
            self,
            EdgeKind::LastWrite | EdgeKind::LastRead | EdgeKind::ComputedFrom
        )
    }

    /// Default DOT color
    pub fn color(&self) -> &'static str {
        match self {
            EdgeKind::Child | EdgeKind::Sibling => "black",
            EdgeKind::NextToken => "gray",
            EdgeKind::NextControlFlow => "blue",
            EdgeKind::GuardedBy => "purple",
            EdgeKind::ReturnFrom => "cyan",
            EdgeKind::LastWrite => "red",
            EdgeKind::LastRead => "orange",
            EdgeKind::ComputedFrom => "darkgreen",
        }
    }
}

impl FromStr for EdgeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "child" | "ast" => Ok(EdgeKind::Child),
            "sibling" => Ok(EdgeKind::Sibling),
            "next_token" | "token" => Ok(EdgeKind::NextToken),
            "next_control_flow" | "controlflow" | "cfg" => Ok(EdgeKind::NextControlFlow),
            "guarded_by" | "guard" => Ok(EdgeKind::GuardedBy),
            "return_from" => Ok(EdgeKind::ReturnFrom),
            "last_write" => Ok(EdgeKind::LastWrite),
            "last_read" => Ok(EdgeKind::LastRead),
            "computed_from" => Ok(EdgeKind::ComputedFrom),
            _ => Err(crate::Error::InvalidArgument(format!("Unknown edge kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which outcome of a guard a statement depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    TrueBranch,
    FalseBranch,
    LoopBody,
    /// Statement of a switch case; the guard is the switch subject
    Case,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::TrueBranch => "true",
            Branch::FalseBranch => "false",
            Branch::LoopBody => "loop",
            Branch::Case => "case",
        }
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed, typed edge between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub kind: EdgeKind,
    pub target: NodeId,
    /// Only set on `GuardedBy` edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
}

impl Edge {
    pub fn new(source: NodeId, kind: EdgeKind, target: NodeId) -> Self {
        Self {
            source,
            kind,
            target,
            branch: None,
        }
    }

    pub fn guarded(source: NodeId, guard: NodeId, branch: Branch) -> Self {
        Self {
            source,
            kind: EdgeKind::GuardedBy,
            target: guard,
            branch: Some(branch),
        }
    }

    /// `(current node, edge kind, next node)`
    pub fn triple(&self) -> (NodeId, EdgeKind, NodeId) {
        (self.source, self.kind, self.target)
    }

    /// Label used by exporters, e.g. `guarded_by:true`
    pub fn label(&self) -> String {
        match self.branch {
            Some(branch) => format!("{}:{}", self.kind, branch),
            None => self.kind.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_roundtrip() {
        for kind in EdgeKind::all() {
            let s = kind.as_str();
            let parsed: EdgeKind = s.parse().unwrap();
            assert_eq!(*kind, parsed);
        }
        assert!("calls".parse::<EdgeKind>().is_err());
    }

    #[test]
    fn test_edge_families() {
        let families: Vec<_> = EdgeKind::all()
            .iter()
            .map(|k| (k.is_syntactic(), k.is_control_flow(), k.is_data_flow()))
            .collect();
        // NextToken is the only kind outside all three families
        let unclassified = families.iter().filter(|(s, c, d)| !s && !c && !d).count();
        assert_eq!(unclassified, 1);
    }

    #[test]
    fn test_guarded_edge_label() {
        let edge = Edge::guarded(NodeId(4), NodeId(2), Branch::FalseBranch);
        assert_eq!(edge.kind, EdgeKind::GuardedBy);
        assert_eq!(edge.label(), "guarded_by:false");
        assert_eq!(edge.triple(), (NodeId(4), EdgeKind::GuardedBy, NodeId(2)));

        let plain = Edge::new(NodeId(1), EdgeKind::LastWrite, NodeId(0));
        assert_eq!(plain.label(), "last_write");
    }
}
