//! Scope Tracker - lexical scopes and variable bindings
//!
//! Bindings are kept per scope on an explicit stack that the data-flow
//! walk threads through its recursion.

pub mod tracker;

pub use tracker::{Binding, ScopeGuard, ScopeId, ScopeKind, ScopeSnapshot, ScopeTracker};
