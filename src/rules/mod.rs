//! Language Rule Sets
//!
//! Each supported language provides one [`LanguageRules`] implementation
//! that maps grammar kinds to semantic roles and exposes the structural
//! accessors the flow builders need. The engine never matches on grammar
//! kind strings itself.

pub mod java;
pub mod python;

pub use java::JavaRules;
pub use python::PythonRules;

use crate::adapter::{Language, SyntaxId, SyntaxTree};
use crate::node::SemanticRole;
use crate::scope::ScopeKind;

/// Control-flow shape of a statement-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Straight-line statement, also the fallback for unknown statement kinds
    Simple,
    Conditional {
        consequence: Option<SyntaxId>,
        alternative: Option<SyntaxId>,
    },
    Loop {
        body: Option<SyntaxId>,
        /// Python `for ... else` / `while ... else`
        alternative: Option<SyntaxId>,
        /// Expressions evaluated after each iteration (Java `for` update)
        updates: Vec<SyntaxId>,
        /// `do { } while (c)`
        test_after_body: bool,
    },
    Try {
        body: Option<SyntaxId>,
        handlers: Vec<SyntaxId>,
        orelse: Option<SyntaxId>,
        finalizer: Option<SyntaxId>,
    },
    /// Java `switch`, Python `match`
    Switch {
        subject: Option<SyntaxId>,
        cases: Vec<SwitchCase>,
        /// Some case matches every value
        has_default: bool,
        /// An unlabeled `break` leaves the switch (Java) rather than the loop
        breakable: bool,
    },
    /// Statement wrapping a body that runs once (`with`, `synchronized`)
    Compound { body: Option<SyntaxId> },
    Labeled { label: String, body: SyntaxId },
    Return,
    Throw,
    Break { label: Option<String> },
    Continue { label: Option<String> },
    /// Function or method definition; its body gets its own flow
    Function { body: Option<SyntaxId> },
}

impl Statement {
    /// Statements after which control does not fall through
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Statement::Return | Statement::Throw | Statement::Break { .. } | Statement::Continue { .. }
        )
    }
}

/// One arm of a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    /// Label group, switch rule or case clause
    pub node: SyntaxId,
    /// Patterns and guards, read before the body runs
    pub labels: Vec<SyntaxId>,
    pub body: Vec<SyntaxId>,
    /// The end of the body runs into the next case (Java `case x:` groups)
    pub falls_through: bool,
}

/// How the data-flow walk treats identifiers below an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Keep the enclosing context
    Inherit,
    Read,
    /// New binding in the innermost scope
    Declare,
    /// Write to the visible binding
    Assign,
    /// Read, then write the visible binding (`x += 1`, `i++`)
    Update,
    /// Not walked at all
    Skip,
}

impl Access {
    pub fn is_write(&self) -> bool {
        matches!(self, Access::Declare | Access::Assign | Access::Update)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub node: SyntaxId,
    pub access: Access,
}

impl Operand {
    pub fn new(node: SyntaxId, access: Access) -> Self {
        Self { node, access }
    }
}

/// Ordered operands of an expression and their access modes.
///
/// When `computes` is set, every read made while walking the operands is a
/// source of every write made to the operands' targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataShape {
    pub operands: Vec<Operand>,
    pub computes: bool,
}

impl DataShape {
    /// Shape whose subtree is not walked
    pub fn skip() -> Self {
        Self::default()
    }

    pub fn computing() -> Self {
        Self {
            operands: Vec::new(),
            computes: true,
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Append an optional operand
    pub fn with(mut self, node: Option<SyntaxId>, access: Access) -> Self {
        if let Some(node) = node {
            self.operands.push(Operand::new(node, access));
        }
        self
    }

    pub fn with_all(mut self, nodes: impl IntoIterator<Item = SyntaxId>, access: Access) -> Self {
        self.operands
            .extend(nodes.into_iter().map(|n| Operand::new(n, access)));
        self
    }
}

/// Pieces of a function-like node for the data-flow walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParts {
    /// Walked in the enclosing scope (name, base classes)
    pub header: Vec<Operand>,
    /// Default values, read in the enclosing scope before the header
    pub defaults: Vec<SyntaxId>,
    /// Declared in the new scope
    pub parameters: Vec<SyntaxId>,
    pub body: Option<SyntaxId>,
    pub scope: ScopeKind,
}

/// Short-circuit boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Per-language mapping from grammar kinds to the engine's abstractions.
pub trait LanguageRules: Send + Sync {
    fn language(&self) -> Language;

    /// Semantic role of a grammar kind
    fn classify(&self, kind: &str) -> SemanticRole;

    /// Kinds the rule set refuses to interpret
    fn is_unsupported(&self, _kind: &str) -> bool {
        false
    }

    /// Control-flow shape of `node`, or `None` if it is not a statement
    fn statement(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<Statement>;

    /// Boolean guard of a conditional or loop
    fn guard_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<SyntaxId>;

    /// Scope opened by `node`, apart from function-like nodes
    fn scope_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<ScopeKind>;

    fn is_scope_boundary(&self, tree: &SyntaxTree, node: SyntaxId) -> bool {
        self.scope_of(tree, node).is_some() || self.function_parts(tree, node).is_some()
    }

    /// `(left, op, right)` of a short-circuit operator, looking through parentheses
    fn logical_operands(
        &self,
        tree: &SyntaxTree,
        node: SyntaxId,
    ) -> Option<(SyntaxId, LogicalOp, SyntaxId)>;

    /// Operand access modes; `None` walks all children in the current context
    fn data_shape(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<DataShape>;

    fn function_parts(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<FunctionParts>;

    /// Node standing for a simple statement in the control flow.
    ///
    /// An expression statement is represented by its expression.
    fn flow_node(&self, tree: &SyntaxTree, node: SyntaxId) -> SyntaxId {
        if tree.kind(node) != "expression_statement" {
            return node;
        }
        let mut named = tree.named_children(node).filter(|c| tree.kind(*c) != "comment");
        match (named.next(), named.next()) {
            (Some(inner), None) => inner,
            _ => node,
        }
    }

    fn is_identifier(&self, kind: &str) -> bool {
        self.classify(kind) == SemanticRole::Identifier
    }

    /// Assignment targets of `node`
    fn targets_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Vec<SyntaxId> {
        self.data_shape(tree, node)
            .filter(|shape| shape.computes)
            .map(|shape| {
                shape
                    .operands
                    .iter()
                    .filter(|op| op.access.is_write())
                    .map(|op| op.node)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Right-hand sides of `node`
    fn values_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Vec<SyntaxId> {
        self.data_shape(tree, node)
            .filter(|shape| shape.computes)
            .map(|shape| {
                shape
                    .operands
                    .iter()
                    .filter(|op| op.access == Access::Read)
                    .map(|op| op.node)
                    .collect()
            })
            .unwrap_or_default()
    }
}

static PYTHON: PythonRules = PythonRules;
static JAVA: JavaRules = JavaRules;

/// The rule set for a language
pub fn for_language(language: Language) -> &'static dyn LanguageRules {
    match language {
        Language::Python => &PYTHON,
        Language::Java => &JAVA,
    }
}

/// Named children of `node`, mapped to an access by field name
pub(crate) fn fielded(
    tree: &SyntaxTree,
    node: SyntaxId,
    default: Access,
    overrides: &[(&str, Access)],
) -> DataShape {
    let operands = tree
        .named_children(node)
        .map(|child| {
            let access = tree
                .node(child)
                .field()
                .and_then(|f| overrides.iter().find(|(name, _)| *name == f))
                .map(|(_, access)| *access)
                .unwrap_or(default);
            Operand::new(child, access)
        })
        .filter(|op| op.access != Access::Skip)
        .collect();
    DataShape {
        operands,
        computes: false,
    }
}

/// Text of the first child of kind `kind`
pub(crate) fn child_text(tree: &SyntaxTree, node: SyntaxId, kind: &str) -> Option<String> {
    tree.child_of_kind(node, kind).map(|c| tree.text(c).to_string())
}
