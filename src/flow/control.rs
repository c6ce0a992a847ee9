//! Control-flow builder
//!
//! Links statements in execution order. The builder keeps a frontier of
//! statements whose successor is still unknown; visiting a statement links
//! the whole frontier to it. Branches fork the frontier and join it again,
//! jumps empty it and park their statement on the enclosing loop or label.
//!
//! Each function body gets its own flow starting at the function node. The
//! function node itself is not part of the enclosing flow.

use super::FlowInput;
use crate::adapter::SyntaxId;
use crate::edge::{Branch, Edge, EdgeKind};
use crate::node::SemanticRole;
use crate::rules::{LogicalOp, Statement, SwitchCase};
use crate::scope::ScopeKind;
use std::mem;

/// Result of the control-flow pass.
#[derive(Debug, Default, Clone)]
pub struct ControlFlow {
    pub edges: Vec<Edge>,
}

/// Pending jumps out of a loop, switch or labeled statement
#[derive(Debug, Default)]
struct JumpFrame {
    label: Option<String>,
    is_loop: bool,
    /// Target of an unlabeled `break`, but not of `continue`
    is_switch: bool,
    breaks: Vec<SyntaxId>,
    continues: Vec<SyntaxId>,
}

pub struct ControlFlowBuilder<'a> {
    input: FlowInput<'a>,
    frontier: Vec<SyntaxId>,
    guards: Vec<(SyntaxId, Branch)>,
    frames: Vec<JumpFrame>,
    pending_label: Option<String>,
    returns: Vec<SyntaxId>,
    flow: ControlFlow,
}

impl<'a> ControlFlowBuilder<'a> {
    pub fn new(input: FlowInput<'a>) -> Self {
        Self {
            input,
            frontier: Vec::new(),
            guards: Vec::new(),
            frames: Vec::new(),
            pending_label: None,
            returns: Vec::new(),
            flow: ControlFlow::default(),
        }
    }

    /// Walk the whole tree
    pub fn build(mut self) -> ControlFlow {
        let root = self.input.tree.root();
        self.visit(root);
        tracing::trace!("control flow: {} edges", self.flow.edges.len());
        self.flow
    }

    fn edge(&mut self, source: SyntaxId, kind: EdgeKind, target: SyntaxId, branch: Option<Branch>) {
        if source == target && kind != EdgeKind::NextControlFlow {
            return;
        }
        if self.input.opaque.contains(&source) || self.input.opaque.contains(&target) {
            return;
        }
        let (Some(source), Some(target)) = (self.input.node_id(source), self.input.node_id(target))
        else {
            return;
        };
        self.flow.edges.push(Edge {
            source,
            kind,
            target,
            branch,
        });
    }

    /// Link the frontier to `node` and make it the new frontier
    fn add_next(&mut self, node: SyntaxId) {
        for prev in mem::take(&mut self.frontier) {
            self.edge(prev, EdgeKind::NextControlFlow, node, None);
        }
        if let Some(&(guard, branch)) = self.guards.last() {
            self.edge(node, EdgeKind::GuardedBy, guard, Some(branch));
        }
        self.frontier.push(node);
    }

    fn link_frontier(&mut self, target: SyntaxId) {
        for prev in mem::take(&mut self.frontier) {
            self.edge(prev, EdgeKind::NextControlFlow, target, None);
        }
    }

    fn set_frontier(&mut self, nodes: Vec<SyntaxId>) {
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if !unique.contains(&node) {
                unique.push(node);
            }
        }
        self.frontier = unique;
    }

    fn visit_opt(&mut self, node: Option<SyntaxId>) {
        if let Some(node) = node {
            self.visit(node);
        }
    }

    fn visit(&mut self, node: SyntaxId) {
        if self.input.is_opaque(node) {
            return;
        }
        let tree = self.input.tree;
        match self.input.rules.statement(tree, node) {
            Some(stmt) => self.statement(node, stmt),
            None => match self.function_body(node) {
                Some(body) => self.function(node, body),
                None => self.visit_children(node),
            },
        }
    }

    fn visit_children(&mut self, node: SyntaxId) {
        let tree = self.input.tree;
        for &child in tree.children(node) {
            self.visit(child);
        }
    }

    /// Body of a function-like node that is not a class
    fn function_body(&self, node: SyntaxId) -> Option<Option<SyntaxId>> {
        self.input
            .rules
            .function_parts(self.input.tree, node)
            .filter(|parts| parts.scope == ScopeKind::Function)
            .map(|parts| parts.body)
    }

    fn statement(&mut self, node: SyntaxId, stmt: Statement) {
        match stmt {
            Statement::Simple => self.simple(node),
            Statement::Conditional {
                consequence,
                alternative,
            } => self.conditional(node, consequence, alternative),
            Statement::Loop {
                body,
                alternative,
                updates,
                test_after_body,
            } => {
                if test_after_body {
                    self.do_loop(node, body);
                } else {
                    self.loop_(node, body, alternative, &updates);
                }
            }
            Statement::Try {
                body,
                handlers,
                orelse,
                finalizer,
            } => self.try_(node, body, &handlers, orelse, finalizer),
            Statement::Switch {
                subject,
                cases,
                has_default,
                breakable,
            } => self.switch(node, subject, &cases, has_default, breakable),
            Statement::Compound { body } => {
                self.add_next(node);
                self.visit_opt(body);
            }
            Statement::Labeled { label, body } => self.labeled(node, label, body),
            Statement::Return => {
                self.add_next(node);
                self.returns.push(node);
                self.frontier.clear();
            }
            Statement::Throw => {
                self.add_next(node);
                self.frontier.clear();
            }
            Statement::Break { label } => {
                let range = self.input.tree.range(node);
                self.add_next(node);
                match self.jump_frame(label.as_deref(), false) {
                    Some(frame) => frame.breaks.push(node),
                    None => tracing::debug!("break outside of a loop at {}", range),
                }
                self.frontier.clear();
            }
            Statement::Continue { label } => {
                let range = self.input.tree.range(node);
                self.add_next(node);
                match self.jump_frame(label.as_deref(), true) {
                    Some(frame) => frame.continues.push(node),
                    None => tracing::debug!("continue outside of a loop at {}", range),
                }
                self.frontier.clear();
            }
            Statement::Function { body } => self.function(node, body),
        }
    }

    /// Innermost frame a jump leaves; labeled jumps match by label
    fn jump_frame(&mut self, label: Option<&str>, needs_loop: bool) -> Option<&mut JumpFrame> {
        self.frames
            .iter_mut()
            .rev()
            .find(|frame| match label {
                Some(label) => frame.label.as_deref() == Some(label),
                None => frame.is_loop || (frame.is_switch && !needs_loop),
            })
            .filter(|frame| frame.is_loop || !needs_loop)
    }

    fn simple(&mut self, node: SyntaxId) {
        let flow_node = match self.input.rules.flow_node(self.input.tree, node) {
            inner if self.input.is_opaque(inner) => node,
            inner => inner,
        };
        self.add_next(flow_node);

        // Lambdas and local classes inside the statement get their own flow
        let tree = self.input.tree;
        let mut stack: Vec<SyntaxId> = tree.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.input.is_opaque(id) {
                continue;
            }
            if let Some(Statement::Function { body }) = self.input.rules.statement(tree, id) {
                self.function(id, body);
            } else if let Some(body) = self.function_body(id) {
                self.function(id, body);
            } else {
                stack.extend(tree.children(id).iter().rev().copied());
            }
        }
    }

    /// Enter a guard and return it; a missing guard is replaced by the node
    fn enter_guard(&mut self, node: SyntaxId) -> SyntaxId {
        self.add_next(node);
        match self.input.rules.guard_of(self.input.tree, node) {
            Some(guard) if !self.input.is_opaque(guard) => {
                self.add_next(guard);
                self.short_circuit(guard);
                guard
            }
            _ => node,
        }
    }

    /// The right operand of `&&`/`||` only runs when the left one allows it
    fn short_circuit(&mut self, expr: SyntaxId) {
        let Some((left, op, right)) = self.input.rules.logical_operands(self.input.tree, expr) else {
            return;
        };
        let branch = match op {
            LogicalOp::And => Branch::TrueBranch,
            LogicalOp::Or => Branch::FalseBranch,
        };
        self.edge(right, EdgeKind::GuardedBy, left, Some(branch));
        self.short_circuit(left);
        self.short_circuit(right);
    }

    fn conditional(
        &mut self,
        node: SyntaxId,
        consequence: Option<SyntaxId>,
        alternative: Option<SyntaxId>,
    ) {
        let test = self.enter_guard(node);

        self.guards.push((test, Branch::TrueBranch));
        self.visit_opt(consequence);
        self.guards.pop();
        let mut joined = mem::replace(&mut self.frontier, vec![test]);

        if let Some(alternative) = alternative {
            self.guards.push((test, Branch::FalseBranch));
            self.visit(alternative);
            self.guards.pop();
        }
        joined.append(&mut self.frontier);
        self.set_frontier(joined);
    }

    fn loop_(
        &mut self,
        node: SyntaxId,
        body: Option<SyntaxId>,
        alternative: Option<SyntaxId>,
        updates: &[SyntaxId],
    ) {
        let label = self.pending_label.take();
        let test = self.enter_guard(node);

        self.frames.push(JumpFrame {
            label,
            is_loop: true,
            ..JumpFrame::default()
        });
        self.guards.push((test, Branch::LoopBody));
        self.visit_opt(body);
        self.guards.pop();
        let frame = self.frames.pop().unwrap_or_default();

        self.frontier.extend(frame.continues);
        for &update in updates {
            if !self.input.is_opaque(update) {
                self.add_next(update);
            }
        }
        self.link_frontier(test);

        // Loop exit: the test fails, then the else clause runs
        self.frontier = vec![test];
        self.visit_opt(alternative);
        let mut exits = mem::take(&mut self.frontier);
        exits.extend(frame.breaks);
        self.set_frontier(exits);
    }

    fn do_loop(&mut self, node: SyntaxId, body: Option<SyntaxId>) {
        let label = self.pending_label.take();
        self.add_next(node);

        self.frames.push(JumpFrame {
            label,
            is_loop: true,
            ..JumpFrame::default()
        });
        self.visit_opt(body);
        let frame = self.frames.pop().unwrap_or_default();
        self.frontier.extend(frame.continues);

        let test = match self.input.rules.guard_of(self.input.tree, node) {
            Some(guard) if !self.input.is_opaque(guard) => {
                self.add_next(guard);
                self.short_circuit(guard);
                guard
            }
            _ => node,
        };
        self.edge(test, EdgeKind::NextControlFlow, node, None);

        let mut exits = vec![test];
        exits.extend(frame.breaks);
        self.set_frontier(exits);
    }

    /// Every case starts at the subject; cases without a default leave a path around them
    fn switch(
        &mut self,
        node: SyntaxId,
        subject: Option<SyntaxId>,
        cases: &[SwitchCase],
        has_default: bool,
        breakable: bool,
    ) {
        self.add_next(node);
        let test = match subject {
            Some(subject) if !self.input.is_opaque(subject) => {
                self.add_next(subject);
                subject
            }
            _ => node,
        };

        if breakable {
            self.frames.push(JumpFrame {
                is_switch: true,
                ..JumpFrame::default()
            });
        }
        let mut exits = Vec::new();
        let mut carried = Vec::new();
        for case in cases {
            if self.input.is_opaque(case.node) {
                continue;
            }
            let mut entry = vec![test];
            entry.append(&mut carried);
            self.set_frontier(entry);

            self.guards.push((test, Branch::Case));
            self.add_next(case.node);
            for &statement in &case.body {
                self.visit(statement);
            }
            self.guards.pop();

            if case.falls_through {
                carried = mem::take(&mut self.frontier);
            } else {
                exits.append(&mut self.frontier);
            }
        }
        exits.append(&mut carried);
        if breakable {
            let frame = self.frames.pop().unwrap_or_default();
            exits.extend(frame.breaks);
        }
        if !has_default {
            exits.push(test);
        }
        self.set_frontier(exits);
    }

    fn try_(
        &mut self,
        node: SyntaxId,
        body: Option<SyntaxId>,
        handlers: &[SyntaxId],
        orelse: Option<SyntaxId>,
        finalizer: Option<SyntaxId>,
    ) {
        self.add_next(node);
        let start = self.frontier.clone();
        self.visit_opt(body);
        self.visit_opt(orelse);

        // An exception may leave the body before or after any statement
        let normal = mem::take(&mut self.frontier);
        let mut raised = start;
        raised.extend(normal.iter().copied());

        let mut exits = normal;
        for &handler in handlers {
            if self.input.is_opaque(handler) {
                continue;
            }
            self.frontier = raised.clone();
            self.add_next(handler);
            self.visit_children(handler);
            exits.append(&mut self.frontier);
        }
        self.set_frontier(exits);
        self.visit_opt(finalizer);
    }

    fn labeled(&mut self, node: SyntaxId, label: String, body: SyntaxId) {
        self.add_next(node);
        let is_loop = matches!(
            self.input.rules.statement(self.input.tree, body),
            Some(Statement::Loop { .. })
        );
        if is_loop {
            self.pending_label = Some(label);
            self.visit(body);
            return;
        }
        self.frames.push(JumpFrame {
            label: Some(label),
            ..JumpFrame::default()
        });
        self.visit(body);
        let frame = self.frames.pop().unwrap_or_default();
        let mut exits = mem::take(&mut self.frontier);
        exits.extend(frame.breaks);
        self.set_frontier(exits);
    }

    /// Build the flow of a function body in isolation
    fn function(&mut self, node: SyntaxId, body: Option<SyntaxId>) {
        let frontier = mem::replace(&mut self.frontier, vec![node]);
        let returns = mem::take(&mut self.returns);
        let guards = mem::take(&mut self.guards);
        let frames = mem::take(&mut self.frames);
        let label = self.pending_label.take();

        if let Some(body) = body {
            self.visit(body);
            let tree = self.input.tree;
            let expression_body = self.input.rules.classify(tree.kind(body)) != SemanticRole::Block
                && self.input.rules.statement(tree, body).is_none();
            if expression_body && !self.input.is_opaque(body) {
                self.edge(body, EdgeKind::ReturnFrom, node, None);
            }
        }

        let mut exits = mem::take(&mut self.frontier);
        exits.append(&mut self.returns);
        for exit in exits {
            if exit != node {
                self.edge(exit, EdgeKind::ReturnFrom, node, None);
            }
        }

        self.frontier = frontier;
        self.returns = returns;
        self.guards = guards;
        self.frames = frames;
        self.pending_label = label;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Language;
    use crate::flow::testing::Fixture;
    use crate::node::NodeId;

    fn flow(fixture: &Fixture) -> ControlFlow {
        ControlFlowBuilder::new(fixture.input()).build()
    }

    fn java(body: &str) -> Fixture {
        Fixture::new(&format!("class A {{ void f() {{ {} }} }}", body), Language::Java)
    }

    /// Statements that no edge leaves; a `throw` may leave to the caller
    fn stranded(fixture: &Fixture) -> Vec<&str> {
        let cf = flow(fixture);
        let tree = &fixture.tree;
        let rules = fixture.language.rules();
        tree.ids()
            .filter_map(|id| Some((id, rules.statement(tree, id)?)))
            .filter(|(_, stmt)| *stmt != Statement::Throw)
            .map(|(id, stmt)| match stmt {
                Statement::Simple => rules.flow_node(tree, id),
                _ => id,
            })
            .filter(|id| {
                !cf.edges.iter().any(|e| {
                    e.source == NodeId(id.0)
                        && matches!(e.kind, EdgeKind::NextControlFlow | EdgeKind::ReturnFrom)
                })
            })
            .map(|id| tree.text(id))
            .collect()
    }

    #[test]
    fn test_straight_line() {
        let fixture = Fixture::new("x = 1\ny = x + 2\n", Language::Python);
        let cf = flow(&fixture);
        assert_eq!(
            fixture.pairs(&cf.edges, EdgeKind::NextControlFlow),
            vec![("x = 1", "y = x + 2")]
        );
    }

    #[test]
    fn test_if_else_join() {
        let fixture = java("if (c) { a(); } else { b(); } d();");
        let cf = flow(&fixture);
        let next = fixture.pairs(&cf.edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("c", "a()")));
        assert!(next.contains(&("c", "b()")));
        assert!(next.contains(&("a()", "d()")));
        assert!(next.contains(&("b()", "d()")));
        assert!(!next.contains(&("c", "d()")));

        let guarded: Vec<_> = cf
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::GuardedBy)
            .map(|e| (fixture.text(e.source), e.branch))
            .collect();
        assert!(guarded.contains(&("a()", Some(Branch::TrueBranch))));
        assert!(guarded.contains(&("b()", Some(Branch::FalseBranch))));
    }

    #[test]
    fn test_if_without_else_falls_through() {
        let fixture = Fixture::new("if c:\n    a()\nb()\n", Language::Python);
        let next = fixture.pairs(&flow(&fixture).edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("c", "a()")));
        assert!(next.contains(&("c", "b()")));
        assert!(next.contains(&("a()", "b()")));
    }

    #[test]
    fn test_while_loop_back_edge_and_break() {
        let src = "while x:\n    if y:\n        break\n    z()\nw()\n";
        let fixture = Fixture::new(src, Language::Python);
        let cf = flow(&fixture);
        let next = fixture.pairs(&cf.edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("z()", "x")));
        assert!(next.contains(&("x", "w()")));
        assert!(next.contains(&("break", "w()")));
        assert!(!next.contains(&("break", "z()")));

        let loop_body: Vec<_> = cf
            .edges
            .iter()
            .filter(|e| e.branch == Some(Branch::LoopBody))
            .map(|e| fixture.text(e.source))
            .collect();
        assert!(loop_body.iter().any(|text| text.starts_with("if y")));
        assert!(loop_body.contains(&"z()"));
    }

    #[test]
    fn test_for_update_and_continue() {
        let fixture = java("for (int i = 0; i < n; i++) { if (c) continue; g(); } h();");
        let next = fixture.pairs(&flow(&fixture).edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("continue;", "i++")));
        assert!(next.contains(&("g();", "i++")) || next.contains(&("g()", "i++")));
        assert!(next.contains(&("i++", "i < n")));
        assert!(next.contains(&("i < n", "h()")));
    }

    #[test]
    fn test_do_while() {
        let fixture = java("do { a(); } while (c); b();");
        let next = fixture.pairs(&flow(&fixture).edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("a()", "c")));
        assert!(next.contains(&("c", "b()")));
        assert!(next.iter().any(|(s, t)| *s == "c" && t.starts_with("do")));
    }

    #[test]
    fn test_labeled_break() {
        let fixture = java("outer: while (a) { while (b) { break outer; } } c();");
        let next = fixture.pairs(&flow(&fixture).edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("break outer;", "c()")));
        assert!(!next.contains(&("break outer;", "b")));
    }

    #[test]
    fn test_return_from() {
        let src = "def f(x):\n    if x:\n        return 1\n    y = 2\n";
        let fixture = Fixture::new(src, Language::Python);
        let cf = flow(&fixture);
        let returns: Vec<_> = fixture
            .pairs(&cf.edges, EdgeKind::ReturnFrom)
            .into_iter()
            .map(|(source, _)| source)
            .collect();
        assert!(returns.contains(&"return 1"));
        assert!(returns.contains(&"y = 2"));
        // the definition does not flow into its own body from outside
        assert!(
            !fixture
                .pairs(&cf.edges, EdgeKind::NextControlFlow)
                .iter()
                .any(|(_, t)| t.starts_with("def"))
        );
    }

    #[test]
    fn test_short_circuit_guard() {
        let fixture = Fixture::new("if a and b:\n    pass\n", Language::Python);
        let cf = flow(&fixture);
        let guarded: Vec<_> = cf
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::GuardedBy && fixture.text(e.source) == "b")
            .map(|e| (fixture.text(e.target), e.branch))
            .collect();
        assert_eq!(guarded, vec![("a", Some(Branch::TrueBranch))]);
    }

    #[test]
    fn test_switch_cases() {
        let fixture = java("switch (k) { case 1: if (k > 0) { g(); } return 1; default: h(); }");
        let cf = flow(&fixture);
        let next = fixture.pairs(&cf.edges, EdgeKind::NextControlFlow);
        assert!(next.iter().any(|(s, t)| *s == "k" && t.starts_with("case 1")));
        assert!(next.iter().any(|(s, t)| *s == "k" && t.starts_with("default")));
        assert!(next.iter().any(|(s, t)| s.starts_with("case 1") && t.starts_with("if")));
        assert!(next.contains(&("k > 0", "g()")));
        assert!(next.contains(&("g()", "return 1;")));
        assert!(next.contains(&("k > 0", "return 1;")));
        assert!(next.iter().any(|(s, t)| s.starts_with("default") && *t == "h()"));

        let returns: Vec<_> = fixture
            .pairs(&cf.edges, EdgeKind::ReturnFrom)
            .into_iter()
            .map(|(source, _)| source)
            .collect();
        assert!(returns.contains(&"return 1;"));
        assert!(returns.contains(&"h()"));
        // a default case leaves no path around the cases
        assert!(!returns.contains(&"k"));

        let cases: Vec<_> = cf
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::GuardedBy && e.branch == Some(Branch::Case))
            .map(|e| (fixture.text(e.source), fixture.text(e.target)))
            .collect();
        assert!(cases.iter().any(|(case, _)| case.starts_with("case 1")));
        assert!(cases.iter().any(|(case, _)| case.starts_with("default")));
        assert!(cases.iter().all(|(_, guard)| *guard == "k"));
    }

    #[test]
    fn test_switch_fallthrough_and_break() {
        let fixture = java("switch (k) { case 1: a(); case 2: b(); break; case 3: c(); } d();");
        let next = fixture.pairs(&flow(&fixture).edges, EdgeKind::NextControlFlow);
        assert!(next.iter().any(|(s, t)| *s == "a()" && t.starts_with("case 2")));
        assert!(next.contains(&("break;", "d()")));
        assert!(next.contains(&("c()", "d()")));
        assert!(next.contains(&("k", "d()")));
        assert!(!next.iter().any(|(s, t)| *s == "break;" && t.starts_with("case 3")));
    }

    #[test]
    fn test_break_in_match_leaves_loop() {
        let src = "for x in xs:\n    match x:\n        case 1:\n            break\n        case _:\n            pass\ny()\n";
        let fixture = Fixture::new(src, Language::Python);
        let next = fixture.pairs(&flow(&fixture).edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("break", "y()")));
        assert!(next.contains(&("pass", "xs")));
        assert!(next.contains(&("xs", "y()")));
        assert!(!next.contains(&("x", "xs")));
    }

    #[test]
    fn test_every_statement_has_a_successor() {
        let python = Fixture::new(
            "def f(xs, p):
    total = 0
    for x in xs:
        if x < 0:
            continue
        try:
            total += x
        except ValueError as e:
            raise
        finally:
            done()
    while total:
        if p:
            break
        total -= 1
    else:
        total = 1
    with p as h:
        h.write(total)
    match total:
        case 0:
            pass
        case _:
            total = 2
    return total
",
            Language::Python,
        );
        assert_eq!(stranded(&python), Vec::<&str>::new());

        let java = Fixture::new(
            "class A {
  int f(int[] xs, int k) {
    int total = 0;
    outer:
    for (int x : xs) {
      for (int i = 0; i < x; i++) {
        if (i == k) continue outer;
        if (i > k) break outer;
        total += i;
      }
    }
    switch (k) {
      case 0:
        total++;
      case 1:
        total--;
        break;
      default:
        total = 1;
    }
    switch (k) {
      case 2 -> total = 3;
      default -> { total = 4; }
    }
    try {
      total = total / k;
    } catch (ArithmeticException e) {
      throw new IllegalStateException(e);
    } finally {
      k = 0;
    }
    do {
      k++;
    } while (k < 3);
    return total;
  }
}
",
            Language::Java,
        );
        assert_eq!(stranded(&java), Vec::<&str>::new());
    }

    #[test]
    fn test_try_handlers() {
        let src = "try:\n    a()\nexcept E:\n    b()\nfinally:\n    c()\n";
        let fixture = Fixture::new(src, Language::Python);
        let next = fixture.pairs(&flow(&fixture).edges, EdgeKind::NextControlFlow);
        assert!(next.contains(&("a()", "c()")));
        assert!(next.contains(&("b()", "c()")));
        assert!(next.iter().any(|(s, t)| *s == "a()" && t.starts_with("except")));
    }
}
