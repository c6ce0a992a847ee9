//! Graph nodes
//!
//! Every syntax element becomes one node. The raw grammar kind is kept for
//! display, while the engine reasons over the closed [`SemanticRole`] set.

use crate::adapter::SourceRange;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identity of a node inside one [`crate::ProgramGraph`].
///
/// Identities are dense, assigned in pre-order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Language-independent role of a syntax element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticRole {
    Identifier,
    Literal,
    Assignment,
    Conditional,
    Loop,
    Call,
    Operator,
    FunctionDef,
    Block,
    Other,
}

impl SemanticRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticRole::Identifier => "identifier",
            SemanticRole::Literal => "literal",
            SemanticRole::Assignment => "assignment",
            SemanticRole::Conditional => "conditional",
            SemanticRole::Loop => "loop",
            SemanticRole::Call => "call",
            SemanticRole::Operator => "operator",
            SemanticRole::FunctionDef => "functiondef",
            SemanticRole::Block => "block",
            SemanticRole::Other => "other",
        }
    }

    pub fn all() -> &'static [SemanticRole] {
        &[
            SemanticRole::Identifier,
            SemanticRole::Literal,
            SemanticRole::Assignment,
            SemanticRole::Conditional,
            SemanticRole::Loop,
            SemanticRole::Call,
            SemanticRole::Operator,
            SemanticRole::FunctionDef,
            SemanticRole::Block,
            SemanticRole::Other,
        ]
    }
}

impl FromStr for SemanticRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SemanticRole::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == s.to_lowercase())
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown semantic role: {}", s)))
    }
}

impl std::fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node of the program graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Grammar kind, e.g. `if_statement`
    pub kind: String,
    pub role: SemanticRole,
    /// Token text, present for leaves only
    pub text: Option<String>,
    pub range: SourceRange,
    /// Stand-in for a malformed or unsupported subtree
    pub opaque: bool,
}

impl Node {
    pub fn is_token(&self) -> bool {
        self.text.is_some()
    }

    /// Label used by exporters: token text for leaves, kind otherwise
    pub fn label(&self) -> &str {
        self.text.as_deref().unwrap_or(&self.kind)
    }
}
