//! Per-query environments (§3 "Environments").
//!
//! All three live exactly as long as one top-level query: created on
//! entry, discarded on exit. None of them may be shared across queries —
//! the design notes are explicit that a process-wide cache would be a bug.

use crate::ast::{ArbitraryId, ArgId, Expr, NodeId};
use crate::solver::Solver;
use crate::value::SymbolicValue;
use std::collections::HashMap;

/// Either an unevaluated expression placeholder or an already-computed
/// symbolic value bound to an argument identifier.
pub enum ArgBinding<S: Solver> {
    Expr(Expr),
    Value(SymbolicValue<S>),
}

/// Maps argument identifiers to their binding. Evaluating the bound
/// expression for an `Expr` binding happens once, on first reference
/// (§4.5 "Argument").
pub struct ArgumentEnv<S: Solver> {
    bindings: HashMap<ArgId, ArgBinding<S>>,
    resolved: HashMap<ArgId, SymbolicValue<S>>,
}

impl<S: Solver> Default for ArgumentEnv<S> {
    fn default() -> Self {
        ArgumentEnv {
            bindings: HashMap::new(),
            resolved: HashMap::new(),
        }
    }
}

impl<S: Solver> ArgumentEnv<S> {
    pub fn new() -> Self {
        ArgumentEnv::default()
    }

    pub fn bind(&mut self, arg: ArgId, binding: ArgBinding<S>) {
        self.bindings.insert(arg, binding);
    }

    pub fn bind_value(&mut self, arg: ArgId, value: SymbolicValue<S>) {
        self.resolved.insert(arg, value);
    }

    pub fn resolved(&self, arg: ArgId) -> Option<&SymbolicValue<S>> {
        self.resolved.get(&arg)
    }

    pub fn cache_resolved(&mut self, arg: ArgId, value: SymbolicValue<S>) {
        self.resolved.insert(arg, value);
    }

    pub fn take_expr(&self, arg: ArgId) -> Option<&Expr> {
        match self.bindings.get(&arg) {
            Some(ArgBinding::Expr(e)) => Some(e),
            _ => None,
        }
    }
}

/// Expression-node-identity keyed memoization cache. Cleared per
/// top-level query (§3 "Memoization cache").
pub struct MemoCache<S: Solver> {
    cache: HashMap<NodeId, SymbolicValue<S>>,
}

impl<S: Solver> Default for MemoCache<S> {
    fn default() -> Self {
        MemoCache {
            cache: HashMap::new(),
        }
    }
}

impl<S: Solver> MemoCache<S> {
    pub fn new() -> Self {
        MemoCache::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&SymbolicValue<S>> {
        self.cache.get(&id)
    }

    pub fn insert(&mut self, id: NodeId, value: SymbolicValue<S>) {
        self.cache.insert(id, value);
    }
}

/// Maps arbitrary-expression identity to its bound solver variable
/// handle(s), preserving insertion order (needed by the interleaving
/// analyzer and by deterministic variable-allocation order, §5
/// "Ordering"). Structured arbitraries (record/union/list/finite-map)
/// allocate one leaf handle per constituent primitive, so a single
/// `ArbitraryId` can map to several handles.
#[derive(Default)]
pub struct ArbitraryRegistry<H> {
    order: Vec<ArbitraryId>,
    handles: HashMap<ArbitraryId, Vec<H>>,
}

impl<H: Clone> ArbitraryRegistry<H> {
    pub fn new() -> Self {
        ArbitraryRegistry {
            order: Vec::new(),
            handles: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: ArbitraryId, handles: Vec<H>) {
        if !self.handles.contains_key(&id) {
            self.order.push(id);
        }
        self.handles.insert(id, handles);
    }

    pub fn handles(&self, id: ArbitraryId) -> Option<&[H]> {
        self.handles.get(&id).map(|v| v.as_slice())
    }

    /// First-occurrence, depth-first-left-to-right order (§5 "Ordering").
    pub fn insertion_order(&self) -> &[ArbitraryId] {
        &self.order
    }

    pub fn ids(&self) -> impl Iterator<Item = ArbitraryId> + '_ {
        self.order.iter().copied()
    }
}
