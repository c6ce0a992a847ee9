//! Java rule set
//!
//! Targets the tree-sitter-java grammar. Braced blocks, loop headers and
//! catch clauses open block scopes; local declarations bind in the
//! innermost one.

use super::{
    child_text, fielded, Access, DataShape, FunctionParts, LanguageRules, LogicalOp, Statement,
    SwitchCase,
};
use crate::adapter::{Language, SyntaxId, SyntaxTree};
use crate::node::SemanticRole;
use crate::scope::ScopeKind;

/// Java language rules
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaRules;

impl JavaRules {
    fn unparenthesize(&self, tree: &SyntaxTree, mut node: SyntaxId) -> SyntaxId {
        while tree.kind(node) == "parenthesized_expression" {
            match tree.named_children(node).next() {
                Some(inner) => node = inner,
                None => break,
            }
        }
        node
    }

    fn operator(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<String> {
        tree.child_by_field(node, "operator")
            .map(|op| tree.text(op).to_string())
    }

    /// `case 1: a(); b();` groups fall through, `case 1 -> a();` rules do not
    fn switch(&self, tree: &SyntaxTree, node: SyntaxId) -> Statement {
        let subject = tree
            .child_by_field(node, "condition")
            .map(|c| self.unparenthesize(tree, c));
        let mut has_default = false;
        let cases = tree
            .child_by_field(node, "body")
            .map(|block| tree.named_children(block).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .filter(|c| matches!(tree.kind(*c), "switch_block_statement_group" | "switch_rule"))
            .map(|case| {
                let (labels, body): (Vec<SyntaxId>, Vec<SyntaxId>) = tree
                    .named_children(case)
                    .filter(|c| tree.kind(*c) != "comment")
                    .partition(|c| tree.kind(*c) == "switch_label");
                has_default |= labels
                    .iter()
                    .any(|label| tree.text(*label).trim_start().starts_with("default"));
                SwitchCase {
                    node: case,
                    labels,
                    body,
                    falls_through: tree.kind(case) == "switch_block_statement_group",
                }
            })
            .collect();
        Statement::Switch {
            subject,
            cases,
            has_default,
            breakable: true,
        }
    }
}

impl LanguageRules for JavaRules {
    fn language(&self) -> Language {
        Language::Java
    }

    fn classify(&self, kind: &str) -> SemanticRole {
        match kind {
            "identifier" => SemanticRole::Identifier,
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal"
            | "decimal_floating_point_literal"
            | "hex_floating_point_literal"
            | "string_literal"
            | "character_literal"
            | "text_block"
            | "true"
            | "false"
            | "null_literal" => SemanticRole::Literal,
            "assignment_expression" | "variable_declarator" | "update_expression" => {
                SemanticRole::Assignment
            }
            "if_statement" | "ternary_expression" => SemanticRole::Conditional,
            "for_statement" | "enhanced_for_statement" | "while_statement" | "do_statement" => {
                SemanticRole::Loop
            }
            "method_invocation" | "object_creation_expression" => SemanticRole::Call,
            "binary_expression" | "unary_expression" | "instanceof_expression" => {
                SemanticRole::Operator
            }
            "method_declaration" | "constructor_declaration" | "lambda_expression" => {
                SemanticRole::FunctionDef
            }
            "program" | "block" | "class_body" | "constructor_body" => SemanticRole::Block,
            _ => SemanticRole::Other,
        }
    }

    fn is_unsupported(&self, kind: &str) -> bool {
        kind == "module_declaration"
    }

    fn statement(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<Statement> {
        let field = |name| tree.child_by_field(node, name);
        let stmt = match tree.kind(node) {
            "if_statement" => Statement::Conditional {
                consequence: field("consequence"),
                alternative: field("alternative"),
            },
            "while_statement" | "enhanced_for_statement" => Statement::Loop {
                body: field("body"),
                alternative: None,
                updates: Vec::new(),
                test_after_body: false,
            },
            "for_statement" => Statement::Loop {
                body: field("body"),
                alternative: None,
                updates: tree.children_by_field(node, "update").collect(),
                test_after_body: false,
            },
            "do_statement" => Statement::Loop {
                body: field("body"),
                alternative: None,
                updates: Vec::new(),
                test_after_body: true,
            },
            "try_statement" | "try_with_resources_statement" => Statement::Try {
                body: field("body"),
                handlers: tree.children_of_kind(node, "catch_clause").collect(),
                orelse: None,
                finalizer: tree.child_of_kind(node, "finally_clause"),
            },
            "synchronized_statement" => Statement::Compound {
                body: field("body"),
            },
            "labeled_statement" => {
                let label = child_text(tree, node, "identifier")?;
                let body = tree.named_children(node).last()?;
                Statement::Labeled { label, body }
            }
            "return_statement" => Statement::Return,
            "throw_statement" => Statement::Throw,
            "break_statement" => Statement::Break {
                label: child_text(tree, node, "identifier"),
            },
            "continue_statement" => Statement::Continue {
                label: child_text(tree, node, "identifier"),
            },
            "method_declaration" | "constructor_declaration" => Statement::Function {
                body: field("body"),
            },
            "switch_expression" => self.switch(tree, node),
            // `for (int i = 0; ...)` declares as part of the loop header
            "local_variable_declaration" if tree.node(node).field() == Some("init") => return None,
            "local_variable_declaration" | "explicit_constructor_invocation" => Statement::Simple,
            kind if kind.ends_with("_statement") => Statement::Simple,
            _ => return None,
        };
        Some(stmt)
    }

    fn guard_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<SyntaxId> {
        let guard = match tree.kind(node) {
            "if_statement" | "while_statement" | "do_statement" | "for_statement" => {
                tree.child_by_field(node, "condition")
            }
            "enhanced_for_statement" => tree.child_by_field(node, "value"),
            _ => None,
        }?;
        Some(self.unparenthesize(tree, guard))
    }

    fn scope_of(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<ScopeKind> {
        match tree.kind(node) {
            "block"
            | "for_statement"
            | "enhanced_for_statement"
            | "catch_clause"
            | "try_with_resources_statement"
            | "switch_expression" => Some(ScopeKind::Block),
            "class_body" | "interface_body" | "enum_body" => Some(ScopeKind::Class),
            _ => None,
        }
    }

    fn logical_operands(
        &self,
        tree: &SyntaxTree,
        node: SyntaxId,
    ) -> Option<(SyntaxId, LogicalOp, SyntaxId)> {
        let node = self.unparenthesize(tree, node);
        if tree.kind(node) != "binary_expression" {
            return None;
        }
        let op = match self.operator(tree, node)?.as_str() {
            "&&" => LogicalOp::And,
            "||" => LogicalOp::Or,
            _ => return None,
        };
        Some((
            tree.child_by_field(node, "left")?,
            op,
            tree.child_by_field(node, "right")?,
        ))
    }

    fn function_parts(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<FunctionParts> {
        match tree.kind(node) {
            "method_declaration" | "constructor_declaration" | "lambda_expression" => {
                Some(FunctionParts {
                    header: Vec::new(),
                    defaults: Vec::new(),
                    parameters: tree.child_by_field(node, "parameters").into_iter().collect(),
                    body: tree.child_by_field(node, "body"),
                    scope: ScopeKind::Function,
                })
            }
            _ => None,
        }
    }

    fn data_shape(&self, tree: &SyntaxTree, node: SyntaxId) -> Option<DataShape> {
        let field = |name| tree.child_by_field(node, name);
        let shape = match tree.kind(node) {
            "variable_declarator" => {
                let value = field("value");
                DataShape {
                    computes: value.is_some(),
                    ..DataShape::new()
                }
                .with(value, Access::Read)
                .with(field("name"), Access::Declare)
            }
            "assignment_expression" => {
                let access = match self.operator(tree, node).as_deref() {
                    Some("=") => Access::Assign,
                    _ => Access::Update,
                };
                DataShape::computing()
                    .with(field("right"), Access::Read)
                    .with(field("left"), access)
            }
            "update_expression" => {
                DataShape::computing().with(tree.named_children(node).next(), Access::Update)
            }
            "resource" if field("name").is_some() => DataShape::computing()
                .with(field("value"), Access::Read)
                .with(field("name"), Access::Declare),
            "enhanced_for_statement" => DataShape::computing()
                .with(field("value"), Access::Read)
                .with(field("name"), Access::Declare),
            "for_statement" => DataShape::new()
                .with_all(tree.children_by_field(node, "init"), Access::Inherit)
                .with(field("condition"), Access::Read),
            "while_statement" => DataShape::new().with(field("condition"), Access::Read),
            "field_access" => DataShape::new().with(field("object"), Access::Read),
            "method_invocation" => DataShape::new()
                .with(field("object"), Access::Read)
                .with(field("arguments"), Access::Read),
            "object_creation_expression" => DataShape::new()
                .with(field("arguments"), Access::Read)
                .with(tree.child_of_kind(node, "class_body"), Access::Inherit),
            "array_access" => DataShape::new()
                .with(field("array"), Access::Read)
                .with(field("index"), Access::Read),
            "cast_expression" => DataShape::new().with(field("value"), Access::Read),
            "instanceof_expression" => DataShape::new()
                .with(field("left"), Access::Read)
                .with(field("name"), Access::Declare),
            "formal_parameter" | "catch_formal_parameter" | "spread_parameter" => {
                DataShape::new().with(field("name"), Access::Declare)
            }
            "inferred_parameters" => fielded(tree, node, Access::Declare, &[]),
            "local_variable_declaration" | "field_declaration" => DataShape::new()
                .with_all(tree.children_by_field(node, "declarator"), Access::Inherit),
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => DataShape::new().with(field("body"), Access::Inherit),
            "import_declaration" | "package_declaration" | "annotation" | "marker_annotation"
            | "break_statement" | "continue_statement" => DataShape::skip(),
            _ => return None,
        };
        Some(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::parse;

    fn find(tree: &SyntaxTree, kind: &str) -> SyntaxId {
        tree.ids().find(|id| tree.kind(*id) == kind).unwrap()
    }

    fn wrap(body: &str) -> String {
        format!("class A {{ void f() {{ {} }} }}", body)
    }

    #[test]
    fn test_classify() {
        let rules = JavaRules;
        assert_eq!(rules.classify("identifier"), SemanticRole::Identifier);
        assert_eq!(rules.classify("decimal_integer_literal"), SemanticRole::Literal);
        assert_eq!(rules.classify("variable_declarator"), SemanticRole::Assignment);
        assert_eq!(rules.classify("do_statement"), SemanticRole::Loop);
        assert_eq!(rules.classify("method_invocation"), SemanticRole::Call);
        assert_eq!(rules.classify("field_declaration"), SemanticRole::Other);
    }

    #[test]
    fn test_guard_unwraps_parentheses() {
        let tree = parse(&wrap("if ((c)) { a(); }"), Language::Java).unwrap();
        let guard = JavaRules.guard_of(&tree, find(&tree, "if_statement")).unwrap();
        assert_eq!(tree.kind(guard), "identifier");
        assert_eq!(tree.text(guard), "c");
    }

    #[test]
    fn test_for_loop_parts() {
        let tree = parse(&wrap("for (int i = 0; i < n; i++) { s += i; }"), Language::Java).unwrap();
        let rules = JavaRules;
        let for_stmt = find(&tree, "for_statement");
        let Some(Statement::Loop { updates, test_after_body, .. }) = rules.statement(&tree, for_stmt)
        else {
            panic!("expected loop");
        };
        assert!(!test_after_body);
        assert_eq!(updates.len(), 1);
        assert_eq!(tree.text(updates[0]), "i++");
        assert_eq!(tree.text(rules.guard_of(&tree, for_stmt).unwrap()), "i < n");
        assert_eq!(rules.scope_of(&tree, for_stmt), Some(ScopeKind::Block));
        // the header declaration is not a statement of its own
        assert_eq!(rules.statement(&tree, find(&tree, "local_variable_declaration")), None);
    }

    #[test]
    fn test_labeled_break() {
        let tree = parse(&wrap("outer: while (true) { break outer; }"), Language::Java).unwrap();
        let rules = JavaRules;
        match rules.statement(&tree, find(&tree, "labeled_statement")) {
            Some(Statement::Labeled { label, body }) => {
                assert_eq!(label, "outer");
                assert_eq!(tree.kind(body), "while_statement");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            rules.statement(&tree, find(&tree, "break_statement")),
            Some(Statement::Break { label: Some("outer".to_string()) })
        );
    }

    #[test]
    fn test_switch_cases() {
        let src = wrap("switch (k) { case 1: case 2: a(); default: b(); break; }");
        let tree = parse(&src, Language::Java).unwrap();
        let Some(Statement::Switch { subject, cases, has_default, breakable }) =
            JavaRules.statement(&tree, find(&tree, "switch_expression"))
        else {
            panic!("expected switch");
        };
        assert_eq!(tree.text(subject.unwrap()), "k");
        assert!(has_default);
        assert!(breakable);
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].labels.len(), 2);
        assert_eq!(tree.text(cases[0].body[0]), "a();");
        assert!(cases[0].falls_through);
        assert_eq!(cases[1].body.len(), 2);

        let tree = parse(&wrap("switch (k) { case 1 -> a(); }"), Language::Java).unwrap();
        let Some(Statement::Switch { cases, has_default, .. }) =
            JavaRules.statement(&tree, find(&tree, "switch_expression"))
        else {
            panic!("expected switch");
        };
        assert!(!has_default);
        assert!(!cases[0].falls_through);
        assert_eq!(tree.text(cases[0].body[0]), "a();");
    }

    #[test]
    fn test_logical_operands() {
        let tree = parse(&wrap("if (a || (b && c)) { }"), Language::Java).unwrap();
        let rules = JavaRules;
        let guard = rules.guard_of(&tree, find(&tree, "if_statement")).unwrap();
        let (left, op, right) = rules.logical_operands(&tree, guard).unwrap();
        assert_eq!(op, LogicalOp::Or);
        assert_eq!(tree.text(left), "a");
        let (_, inner, _) = rules.logical_operands(&tree, right).unwrap();
        assert_eq!(inner, LogicalOp::And);
    }

    #[test]
    fn test_compound_assignment_is_update() {
        let tree = parse(&wrap("x += 1; y = 2;"), Language::Java).unwrap();
        let rules = JavaRules;
        let accesses: Vec<_> = tree
            .ids()
            .filter(|id| tree.kind(*id) == "assignment_expression")
            .map(|id| rules.data_shape(&tree, id).unwrap().operands[1].access)
            .collect();
        assert_eq!(accesses, vec![Access::Update, Access::Assign]);
    }

    #[test]
    fn test_expression_statement_flow_node() {
        let tree = parse(&wrap("a();"), Language::Java).unwrap();
        let stmt = find(&tree, "expression_statement");
        let node = JavaRules.flow_node(&tree, stmt);
        assert_eq!(tree.kind(node), "method_invocation");
    }
}
