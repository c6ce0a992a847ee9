//! Python rule set
//!
//! Targets the tree-sitter-python grammar. Python has function-level
//! scoping, so only functions, lambdas, classes and comprehensions open
//! scopes; plain assignments always declare in the innermost scope.

use super::{
    fielded, Access, DataShape, FunctionParts, LanguageRules, LogicalOp, Operand, Statement,
    SwitchCase,
};
use crate::adapter::{Language, SyntaxId, SyntaxTree};
use crate::node::SemanticRole;
use crate::scope::ScopeKind;

const COMPREHENSIONS: &[&str] = &[
    "list_comprehension",
    "set_comprehension",
    "dictionary_comprehension",
    "generator_expression",
];

/// Python language rules
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonRules;

impl PythonRules {
    /// The `elif`/`else` clause following `clause` in its `if` statement
    fn next_alternative(&self, tree: &SyntaxTree, clause: SyntaxId) -> Option<SyntaxId> {
        let parent = tree.parent(clause)?;
        let mut alternatives = tree.children_by_field(parent, "alternative");
        alternatives.find(|id| *id == clause)?;
        alternatives.next()
    }

    /// `except E as name:`; the name after `as` is declared
    fn except_shape(&self, tree: &SyntaxTree, node: SyntaxId) -> DataShape {
        let mut shape = DataShape::new();
        let mut after_as = false;
        for &child in tree.children(node) {
            if !tree.node(child).is_named() {
                after_as = tree.kind(child) == "as";
                continue;
            }
            let access = if after_as { Access::Declare } else { Access::Inherit };
            shape.operands.push(Operand::new(child, access));
            after_as = false;
        }
        shape
    }

    /// `match` cases never fall through; `case _:` matches everything
    fn match_statement(&self, tree: &SyntaxTree, node: SyntaxId) -> Statement {
        let subject = tree.child_by_field(node, "subject");
        let clauses: Vec<SyntaxId> = match tree.child_by_field(node, "body") {
            Some(body) => tree.children_of_kind(body, "case_clause").collect(),
            None => tree.children_of_kind(node, "case_clause").collect(),
        };
        let mut has_default = false;
        let cases = clauses
            .into_iter()
            .map(|clause| {
                let guard = tree.child_by_field(clause, "guard");
                let patterns: Vec<SyntaxId> = tree.children_of_kind(clause, "case_pattern").collect();
                if guard.is_none() && patterns.len() == 1 && tree.text(patterns[0]) == "_" {
                    has_default = true;
                }
                SwitchCase {
                    node: clause,
                    labels: patterns.into_iter().chain(guard).collect(),
                    body: tree.child_by_field(clause, "consequence").into_iter().collect(),
                    falls_through: false,
                }
            })
            .collect();
        Statement::Switch {
            subject,
            cases,
            has_default,
            breakable: false,
        }
    }
}

impl LanguageRules for PythonRules {
    fn language(&self) -> Language {
        Language::Python
    }

    fn classify(&self, kind: &str) -> SemanticRole {
        match kind {
            "identifier" => SemanticRole::Identifier,
            "integer" | "float" | "string" | "concatenated_string" | "true" | "false" | "none"
            | "ellipsis" => SemanticRole::Literal,
            "assignment" | "augmented_assignment" | "named_expression" => SemanticRole::Assignment,
            "if_statement" | "elif_clause" | "conditional_expression" => SemanticRole::Conditional,
            "for_statement" | "while_statement" | "for_in_clause" => SemanticRole::Loop,
            "call" => SemanticRole::Call,
            "binary_operator" | "boolean_operator" | "comparison_operator" | "not_operator"
            | "unary_operator" => SemanticRole::Operator,
            "function_definition" | "lambda" => SemanticRole::FunctionDef,
            "module" | "block" => SemanticRole::Block,
            _ => SemanticRole::Other,
        }
    }

    fn is_unsupported(&self, kind: &str) -> bool {
        // Python 2 only
        matches!(kind, "print_statement" | "exec_statement")
    }

    fn statement(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<Statement> {
        let stmt = match tree.kind(node) {
            "if_statement" => Statement::Conditional {
                consequence: tree.child_by_field(node, "consequence"),
                alternative: tree.child_by_field(node, "alternative"),
            },
            "elif_clause" => Statement::Conditional {
                consequence: tree.child_by_field(node, "consequence"),
                alternative: self.next_alternative(tree, node),
            },
            "for_statement" | "while_statement" => Statement::Loop {
                body: tree.child_by_field(node, "body"),
                alternative: tree.child_by_field(node, "alternative"),
                updates: Vec::new(),
                test_after_body: false,
            },
            "try_statement" => Statement::Try {
                body: tree.child_by_field(node, "body"),
                handlers: tree
                    .children(node)
                    .iter()
                    .copied()
                    .filter(|c| matches!(tree.kind(*c), "except_clause" | "except_group_clause"))
                    .collect(),
                orelse: tree.child_of_kind(node, "else_clause"),
                finalizer: tree.child_of_kind(node, "finally_clause"),
            },
            "match_statement" => self.match_statement(tree, node),
            "with_statement" => Statement::Compound {
                body: tree.child_by_field(node, "body"),
            },
            "return_statement" => Statement::Return,
            "raise_statement" => Statement::Throw,
            "break_statement" => Statement::Break { label: None },
            "continue_statement" => Statement::Continue { label: None },
            "function_definition" => Statement::Function {
                body: tree.child_by_field(node, "body"),
            },
            kind if kind.ends_with("_statement") => Statement::Simple,
            _ => return None,
        };
        Some(stmt)
    }

    fn guard_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<SyntaxId> {
        match tree.kind(node) {
            "if_statement" | "elif_clause" | "while_statement" => {
                tree.child_by_field(node, "condition")
            }
            "for_statement" => tree.child_by_field(node, "right"),
            _ => None,
        }
    }

    fn scope_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<ScopeKind> {
        COMPREHENSIONS
            .contains(&tree.kind(node))
            .then_some(ScopeKind::Comprehension)
    }

    fn logical_operands(
        &self,
        tree: &SyntaxTree,
        node: SyntaxId,
    ) -> Option<(SyntaxId, LogicalOp, SyntaxId)> {
        match tree.kind(node) {
            "parenthesized_expression" => {
                let inner = tree.named_children(node).find(|c| tree.kind(*c) != "comment")?;
                self.logical_operands(tree, inner)
            }
            "boolean_operator" => {
                let left = tree.child_by_field(node, "left")?;
                let right = tree.child_by_field(node, "right")?;
                let op = match tree.text(tree.child_by_field(node, "operator")?) {
                    "and" => LogicalOp::And,
                    "or" => LogicalOp::Or,
                    _ => return None,
                };
                Some((left, op, right))
            }
            _ => None,
        }
    }

    fn function_parts(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<FunctionParts> {
        let field = |name| tree.child_by_field(node, name);
        let defaults = || {
            field("parameters")
                .into_iter()
                .flat_map(|params| tree.named_children(params))
                .filter(|&param| {
                    matches!(tree.kind(param), "default_parameter" | "typed_default_parameter")
                })
                .filter_map(|param| tree.child_by_field(param, "value"))
                .collect()
        };
        let parts = match tree.kind(node) {
            "function_definition" => FunctionParts {
                header: DataShape::new().with(field("name"), Access::Declare).operands,
                defaults: defaults(),
                parameters: field("parameters").into_iter().collect(),
                body: field("body"),
                scope: ScopeKind::Function,
            },
            "lambda" => FunctionParts {
                header: Vec::new(),
                defaults: defaults(),
                parameters: field("parameters").into_iter().collect(),
                body: field("body"),
                scope: ScopeKind::Function,
            },
            "class_definition" => FunctionParts {
                header: DataShape::new()
                    .with(field("name"), Access::Declare)
                    .with(field("superclasses"), Access::Read)
                    .operands,
                defaults: Vec::new(),
                parameters: Vec::new(),
                body: field("body"),
                scope: ScopeKind::Class,
            },
            _ => return None,
        };
        Some(parts)
    }

    fn data_shape(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<DataShape> {
        let field = |name| tree.child_by_field(node, name);
        let shape = match tree.kind(node) {
            "assignment" => {
                let right = field("right");
                DataShape {
                    computes: right.is_some(),
                    ..DataShape::new()
                }
                .with(right, Access::Read)
                .with(field("left"), Access::Declare)
            }
            "augmented_assignment" => DataShape::computing()
                .with(field("right"), Access::Read)
                .with(field("left"), Access::Update),
            "named_expression" => DataShape::computing()
                .with(field("value"), Access::Read)
                .with(field("name"), Access::Declare),
            "for_statement" | "for_in_clause" => DataShape::computing()
                .with(field("right"), Access::Read)
                .with(field("left"), Access::Declare),
            "while_statement" => DataShape::new().with(field("condition"), Access::Read),
            "as_pattern" => {
                let alias = field("alias");
                let value = tree.named_children(node).find(|c| Some(*c) != alias);
                DataShape::computing()
                    .with(value, Access::Read)
                    .with(alias, Access::Declare)
            }
            "attribute" => DataShape::new().with(field("object"), Access::Read),
            "subscript" => DataShape::new()
                .with(field("value"), Access::Read)
                .with_all(tree.children_by_field(node, "subscript"), Access::Read),
            "keyword_argument" => DataShape::new().with(field("value"), Access::Read),
            // The value is read where the function is defined
            "default_parameter" | "typed_default_parameter" => {
                DataShape::new().with(field("name"), Access::Declare)
            }
            "typed_parameter" => fielded(tree, node, Access::Declare, &[("type", Access::Skip)]),
            "parameters" | "lambda_parameters" => fielded(tree, node, Access::Declare, &[]),
            "except_clause" | "except_group_clause" => self.except_shape(tree, node),
            kind if COMPREHENSIONS.contains(&kind) => {
                // Clauses bind the loop variables the body reads
                let body = field("body");
                DataShape::new()
                    .with_all(
                        tree.named_children(node).filter(|c| Some(*c) != body),
                        Access::Inherit,
                    )
                    .with(body, Access::Read)
            }
            // f-strings are not analysed
            "string" | "type" | "import_statement" | "import_from_statement"
            | "future_import_statement" | "global_statement" | "nonlocal_statement" => {
                DataShape::skip()
            }
            _ => return None,
        };
        Some(shape)
    }
}
