//! Scope stack for variable bindings
//!
//! The tracker follows the tree walk: one frame per open lexical scope,
//! each holding the most recent writer and reader of every name bound in
//! it. Frames are opened through [`ScopeTracker::enter_scope`] and closed
//! when the returned guard is dropped, so every exit path of a recursive
//! walk releases its scope.

use crate::node::NodeId;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// Create a root scope ID
    pub fn root() -> Self {
        Self(0)
    }
}

/// The kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Module/file level scope
    Module,
    /// Class body
    Class,
    /// Function, method or lambda
    Function,
    /// Comprehension or generator expression
    Comprehension,
    /// Brace block (if, for, catch, ...)
    Block,
}

/// Last writer and reader of one name within one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Binding {
    /// Node of the most recent write; `None` when the name has only been read
    pub writer: Option<NodeId>,
    /// Most recent read since the last write
    pub reader: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct Frame {
    id: ScopeId,
    kind: ScopeKind,
    bindings: HashMap<String, Binding>,
}

impl Frame {
    fn new(id: ScopeId, kind: ScopeKind) -> Self {
        Self {
            id,
            kind,
            bindings: HashMap::new(),
        }
    }
}

/// Saved binding state of every open frame.
#[derive(Debug, Clone, Default)]
pub struct ScopeSnapshot {
    frames: Vec<HashMap<String, Binding>>,
}

/// Nested lexical scopes with their symbol tables.
#[derive(Debug, Clone)]
pub struct ScopeTracker {
    frames: Vec<Frame>,
    next_id: u32,
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTracker {
    /// Create a tracker holding only the root module scope
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(ScopeId::root(), ScopeKind::Module)],
            next_id: 1,
        }
    }

    /// Open a nested scope; it closes when the guard is dropped
    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeGuard<'_> {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        self.frames.push(Frame::new(id, kind));
        let depth = self.frames.len();
        ScopeGuard { tracker: self, depth }
    }

    /// Close the innermost scope, discarding its bindings. The root scope
    /// is never closed.
    pub fn exit_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of open scopes, root included
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> ScopeId {
        self.innermost().id
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.innermost().kind
    }

    fn innermost(&self) -> &Frame {
        // The root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn innermost_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Index of the innermost frame binding `name`
    fn owner(&self, name: &str) -> Option<usize> {
        self.frames.iter().rposition(|f| f.bindings.contains_key(name))
    }

    /// Record a write in the innermost scope.
    ///
    /// Shadows any outer binding of the same name. Returns the binding the
    /// innermost scope held before.
    pub fn bind(&mut self, name: &str, node: NodeId) -> Option<Binding> {
        self.innermost_mut().bindings.insert(
            name.to_string(),
            Binding {
                writer: Some(node),
                reader: None,
            },
        )
    }

    /// Record a write to the visible binding of `name`, wherever it lives.
    ///
    /// Falls back to [`ScopeTracker::bind`] when the name is unbound.
    pub fn assign(&mut self, name: &str, node: NodeId) -> Option<Binding> {
        match self.owner(name) {
            Some(index) => self.frames[index].bindings.insert(
                name.to_string(),
                Binding {
                    writer: Some(node),
                    reader: None,
                },
            ),
            None => self.bind(name, node),
        }
    }

    /// Most recent writer of `name` visible from the current scope
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        self.lookup(name).and_then(|(_, binding)| binding.writer)
    }

    /// Visible binding of `name` and the scope holding it
    pub fn lookup(&self, name: &str) -> Option<(ScopeId, &Binding)> {
        let index = self.owner(name)?;
        let frame = &self.frames[index];
        frame.bindings.get(name).map(|b| (frame.id, b))
    }

    /// Record a read of `name`, returning the previous reader.
    ///
    /// A free name gets a reader-only binding in the innermost scope so a
    /// later write can still link back to this read.
    pub fn record_read(&mut self, name: &str, node: NodeId) -> Option<NodeId> {
        let index = self.owner(name).unwrap_or(self.frames.len() - 1);
        let binding = self.frames[index]
            .bindings
            .entry(name.to_string())
            .or_default();
        binding.reader.replace(node)
    }

    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot {
            frames: self.frames.iter().map(|f| f.bindings.clone()).collect(),
        }
    }

    /// Reset bindings of the open frames to a snapshot taken at the same depth
    pub fn restore(&mut self, snapshot: ScopeSnapshot) {
        for (frame, bindings) in self.frames.iter_mut().zip(snapshot.frames) {
            frame.bindings = bindings;
        }
    }

    /// Join the current state with `other`, both derived from `base`.
    ///
    /// Writer and reader are joined separately: where the current state left
    /// one as it was in `base`, the value from `other` is taken; otherwise
    /// the current one wins.
    pub fn merge(&mut self, base: &ScopeSnapshot, other: &ScopeSnapshot) {
        let empty = HashMap::new();
        for (i, frame) in self.frames.iter_mut().enumerate() {
            let Some(other_bindings) = other.frames.get(i) else {
                break;
            };
            let base_bindings = base.frames.get(i).unwrap_or(&empty);
            for (name, binding) in other_bindings {
                let before = base_bindings.get(name).copied().unwrap_or_default();
                let current = frame.bindings.entry(name.clone()).or_default();
                if current.writer == before.writer {
                    current.writer = binding.writer;
                }
                if current.reader == before.reader {
                    current.reader = binding.reader;
                }
            }
        }
    }
}

/// Open scope; derefs to the tracker and closes the scope on drop.
pub struct ScopeGuard<'a> {
    tracker: &'a mut ScopeTracker,
    depth: usize,
}

impl ScopeGuard<'_> {
    pub fn id(&self) -> ScopeId {
        self.tracker.frames[self.depth - 1].id
    }

    /// Close the scope now
    pub fn exit(self) {}
}

impl Deref for ScopeGuard<'_> {
    type Target = ScopeTracker;

    fn deref(&self) -> &ScopeTracker {
        self.tracker
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut ScopeTracker {
        self.tracker
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        // Also closes scopes opened through the guard and never released
        while self.tracker.frames.len() >= self.depth && self.tracker.frames.len() > 1 {
            self.tracker.exit_scope();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_resolve() {
        let mut scopes = ScopeTracker::new();
        assert_eq!(scopes.resolve("x"), None);
        assert_eq!(scopes.bind("x", NodeId(1)), None);
        assert_eq!(scopes.resolve("x"), Some(NodeId(1)));

        let prior = scopes.bind("x", NodeId(5)).unwrap();
        assert_eq!(prior.writer, Some(NodeId(1)));
        assert_eq!(scopes.resolve("x"), Some(NodeId(5)));
    }

    #[test]
    fn test_shadowing() {
        let mut scopes = ScopeTracker::new();
        scopes.bind("x", NodeId(1));
        {
            let mut inner = scopes.enter_scope(ScopeKind::Function);
            assert_eq!(inner.resolve("x"), Some(NodeId(1)));
            inner.bind("x", NodeId(2));
            assert_eq!(inner.resolve("x"), Some(NodeId(2)));
            assert_eq!(inner.depth(), 2);
        }
        assert_eq!(scopes.depth(), 1);
        assert_eq!(scopes.resolve("x"), Some(NodeId(1)));
    }

    #[test]
    fn test_assign_updates_owner() {
        let mut scopes = ScopeTracker::new();
        scopes.bind("count", NodeId(1));
        {
            let mut block = scopes.enter_scope(ScopeKind::Block);
            block.assign("count", NodeId(7));
            block.assign("tmp", NodeId(8));
            assert_eq!(block.resolve("tmp"), Some(NodeId(8)));
        }
        assert_eq!(scopes.resolve("count"), Some(NodeId(7)));
        assert_eq!(scopes.resolve("tmp"), None);
    }

    #[test]
    fn test_read_then_write() {
        let mut scopes = ScopeTracker::new();
        scopes.bind("x", NodeId(1));
        assert_eq!(scopes.record_read("x", NodeId(2)), None);
        assert_eq!(scopes.record_read("x", NodeId(3)), Some(NodeId(2)));

        let prior = scopes.bind("x", NodeId(4)).unwrap();
        assert_eq!(prior.reader, Some(NodeId(3)));
        assert_eq!(scopes.lookup("x").unwrap().1.reader, None);
    }

    #[test]
    fn test_free_read_creates_reader_only_binding() {
        let mut scopes = ScopeTracker::new();
        scopes.record_read("free", NodeId(3));
        assert_eq!(scopes.resolve("free"), None);
        let prior = scopes.bind("free", NodeId(4)).unwrap();
        assert_eq!(prior.writer, None);
        assert_eq!(prior.reader, Some(NodeId(3)));
    }

    #[test]
    fn test_guard_exit_and_ids() {
        let mut scopes = ScopeTracker::new();
        assert_eq!(scopes.current(), ScopeId::root());
        let guard = scopes.enter_scope(ScopeKind::Comprehension);
        let id = guard.id();
        assert_ne!(id, ScopeId::root());
        assert_eq!(guard.current_kind(), ScopeKind::Comprehension);
        guard.exit();
        assert_eq!(scopes.current(), ScopeId::root());
        scopes.exit_scope();
        assert_eq!(scopes.depth(), 1);
    }

    #[test]
    fn test_snapshot_merge() {
        let mut scopes = ScopeTracker::new();
        scopes.bind("a", NodeId(1));
        scopes.bind("b", NodeId(2));
        let base = scopes.snapshot();

        // first branch writes a
        scopes.bind("a", NodeId(10));
        let first = scopes.snapshot();

        // second branch writes b
        scopes.restore(base.clone());
        scopes.bind("b", NodeId(20));

        scopes.merge(&base, &first);
        assert_eq!(scopes.resolve("a"), Some(NodeId(10)));
        assert_eq!(scopes.resolve("b"), Some(NodeId(20)));
    }

    #[test]
    fn test_merge_keeps_write_from_other_when_current_only_read() {
        let mut scopes = ScopeTracker::new();
        scopes.bind("x", NodeId(1));
        let base = scopes.snapshot();

        scopes.bind("x", NodeId(10));
        let written = scopes.snapshot();

        scopes.restore(base.clone());
        scopes.record_read("x", NodeId(20));

        scopes.merge(&base, &written);
        assert_eq!(scopes.resolve("x"), Some(NodeId(10)));
        assert_eq!(scopes.lookup("x").unwrap().1.reader, Some(NodeId(20)));
    }
}
