//! # proggraph - Program graphs for Python and Java
//!
//! Builds a multi-relational graph over the syntax tree of one source file:
//! - syntactic edges (`Child`, `Sibling`, `NextToken`)
//! - control-flow edges (`NextControlFlow`, `GuardedBy`, `ReturnFrom`)
//! - data-flow edges (`LastWrite`, `LastRead`, `ComputedFrom`)
//!
//! Parsing is done with tree-sitter; everything language specific lives in
//! a [`rules::LanguageRules`] implementation.
//!
//! ```no_run
//! use proggraph::{build_graph, EdgeKind, ErrorPolicy, Language};
//!
//! let graph = build_graph("x = 1\ny = x + 2\n", Language::Python, ErrorPolicy::Raise)?;
//! for edge in graph.edges().filter(|e| e.kind == EdgeKind::ComputedFrom) {
//!     println!("{} <- {}", edge.target, edge.source);
//! }
//! # Ok::<(), proggraph::Error>(())
//! ```

pub mod adapter;
pub mod builder;
pub mod config;
pub mod edge;
pub mod export;
pub mod flow;
pub mod graph;
pub mod ignore;
pub mod node;
pub mod rules;
pub mod scope;
pub mod ui;

// Re-exports for convenient access
pub use adapter::{Language, SourceRange};
pub use builder::{build_graph, build_graph_with, Analysis, BuildOptions, ErrorPolicy, GraphBuilder};
pub use edge::{Branch, Edge, EdgeKind};
pub use graph::{GraphStats, ProgramGraph};
pub use node::{Node, NodeId, SemanticRole};

/// Result type alias for proggraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for proggraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error at {range}: {message}")]
    Parse { range: SourceRange, message: String },

    #[error("Unsupported construct `{kind}` at {range}")]
    UnsupportedConstruct { kind: String, range: SourceRange },

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
