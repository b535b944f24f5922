//! Reachable-Set Engine (§4.7).
//!
//! A `StateSet<I>` is a decision-diagram-backed characteristic function
//! over one state type: the set of concrete values satisfying some
//! predicate, represented as a `Bdd` over the bits the state's
//! `Arbitrary` node was allocated. Combining two sets (`intersect`,
//! `union`, `complement`) is pointwise `Bdd` algebra; asking for one
//! element reifies a satisfying valuation back through the same
//! [`crate::reify::reify`] path the façade uses, then hands it to a
//! caller-supplied [`ValueInterpreter`] exactly as `find`'s reified
//! variants do (§6 "Value interpreter").
//!
//! Per the design notes (§9 "StateSet vs. solver lifetime"), a
//! `StateSet` only ever borrows a *shared* handle to its backing
//! solver — several sets (and the transition relation connecting them)
//! must outlive any one of them and see the same fixed variable
//! allocation, so the solver lives behind `Rc<RefCell<_>>` rather than
//! being owned by a single set. Only `Bool`/`BitVec`-typed states are
//! supported here, matching the decision-diagram backend's own scope
//! (§6: it "rejects expressions containing unbounded integers, reals,
//! sequences, or characters").

use crate::ast::{ArbitraryId, ArgId, Expr};
use crate::const_keys::ConstantKeyCollector;
use crate::env::{ArgBinding, ArgumentEnv};
use crate::error::{CoreError, CoreResult};
use crate::evaluator::Evaluator;
use crate::interpreter::ValueInterpreter;
use crate::reify::reify;
use crate::solver::dd_backend::DdSolver;
use crate::solver::{Solver, VarId};
use crate::types::Type;
use crate::value::SymbolicValue;
use biodivine_lib_bdd::{Bdd, BddVariable};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const BACKEND_NAME: &str = "decision-diagram";

/// A set of concrete states of type `I::Value`, represented as a
/// decision diagram over the bits backing one `Arbitrary` expression.
pub struct StateSet<'i, I: ValueInterpreter> {
    solver: Rc<RefCell<DdSolver>>,
    bdd: Bdd,
    /// Every bit the state's arbitrary was allocated, flattened in
    /// registration order. Two sets can only be combined pointwise when
    /// this matches exactly (§4.7 "require shared variable set").
    domain: Vec<BddVariable>,
    state_expr: Expr,
    const_keys: Rc<ConstantKeyCollector>,
    list_max_length: u32,
    registry_handles: Vec<VarId>,
    interpreter: &'i I,
}

impl<'i, I: ValueInterpreter> StateSet<'i, I> {
    /// Builds a set from a predicate over `state_expr`'s value — e.g.
    /// the initial-states predicate `Init(x)` in a reachability query.
    /// `state_expr` and `predicate` are evaluated through one shared
    /// [`Evaluator`] so that if `predicate`'s DAG references `state_expr`
    /// by `Rc` identity (the usual case), the memoization cache resolves
    /// them to the same allocated variables instead of allocating twice.
    pub fn from_predicate(
        solver: Rc<RefCell<DdSolver>>,
        state_expr: &Expr,
        predicate: &Expr,
        args: &[(ArgId, Expr)],
        interpreter: &'i I,
        const_keys: Rc<ConstantKeyCollector>,
        list_max_length: u32,
    ) -> CoreResult<Self> {
        let (bdd, registry_handles, domain) = {
            let mut guard = solver.borrow_mut();
            let mut env = ArgumentEnv::new();
            for (id, expr) in args {
                env.bind(*id, ArgBinding::Expr(expr.clone()));
            }
            let mut evaluator = Evaluator::new(&mut guard, &const_keys, list_max_length);
            evaluator.evaluate(state_expr, &mut env)?;
            let value = evaluator.evaluate(predicate, &mut env)?;
            let bdd = value.as_bool()?.clone();
            let (registry, _) = evaluator.into_registry();
            let registry_handles = registry
                .handles(state_expr.id)
                .ok_or_else(|| CoreError::invariant("state expression registered no solver handles"))?
                .to_vec();
            let domain = flatten_domain(&guard, &registry_handles)?;
            (bdd, registry_handles, domain)
        };

        Ok(StateSet {
            solver,
            bdd,
            domain,
            state_expr: Rc::clone(state_expr),
            const_keys,
            list_max_length,
            registry_handles,
            interpreter,
        })
    }

    fn same_domain(&self, other: &Self) -> CoreResult<()> {
        if !Rc::ptr_eq(&self.solver, &other.solver) || self.domain != other.domain {
            return Err(CoreError::invariant(
                "cannot combine state sets defined over different decision-diagram variable sets",
            ));
        }
        Ok(())
    }

    pub fn intersect(&self, other: &Self) -> CoreResult<Self> {
        self.same_domain(other)?;
        Ok(self.with_bdd(self.bdd.and(&other.bdd)))
    }

    pub fn union(&self, other: &Self) -> CoreResult<Self> {
        self.same_domain(other)?;
        Ok(self.with_bdd(self.bdd.or(&other.bdd)))
    }

    pub fn complement(&self) -> Self {
        self.with_bdd(self.bdd.not())
    }

    pub fn is_empty(&self) -> bool {
        self.bdd.is_false()
    }

    pub fn is_full(&self) -> bool {
        self.bdd.is_true()
    }

    pub fn equals(&self, other: &Self) -> CoreResult<bool> {
        self.same_domain(other)?;
        Ok(self.bdd.xor(&other.bdd).is_false())
    }

    /// Reifies one satisfying state, or `None` if the set is empty.
    /// Mirrors `find`'s reification path: solve, reify the handles back
    /// to a [`crate::reify::Assignment`], then hand it to the
    /// interpreter evaluating the state expression itself.
    pub fn element(&self) -> CoreResult<Option<I::Value>> {
        let model = match self.solver.borrow_mut().check(&self.bdd)? {
            None => return Ok(None),
            Some(model) => model,
        };
        let mut arbitrary_types = HashMap::with_capacity(1);
        arbitrary_types.insert(self.state_expr.id, self.state_expr.ty.clone());
        let assignment = reify(
            &*self.solver.borrow(),
            &model,
            &arbitrary_types,
            |id: ArbitraryId| {
                if id == self.state_expr.id {
                    Some(self.registry_handles.clone())
                } else {
                    None
                }
            },
            &self.const_keys,
            self.list_max_length,
        )?;
        Ok(Some(self.interpreter.interpret(&self.state_expr, &assignment)?))
    }

    /// Re-expresses this set over a different, equally-sized arbitrary
    /// (§4.7 `convert_set_variables`): positionally renames every bit in
    /// `self.domain` to the bits `new_state_expr` allocates.
    pub fn convert_set_variables(&self, new_state_expr: &Expr) -> CoreResult<Self> {
        let (new_domain, new_handles) = self.register_fresh_copy(new_state_expr)?;
        let renamed = self.solver.borrow().rename_positional(&self.bdd, &self.domain, &new_domain)?;
        Ok(StateSet {
            solver: Rc::clone(&self.solver),
            bdd: renamed,
            domain: new_domain,
            state_expr: Rc::clone(new_state_expr),
            const_keys: Rc::clone(&self.const_keys),
            list_max_length: self.list_max_length,
            registry_handles: new_handles,
            interpreter: self.interpreter,
        })
    }

    /// Computes `post(self)` under transition relation `relation`
    /// (expected to reference `self`'s current-state value through
    /// `current_binding` and a fresh next-state arbitrary `next_expr`):
    /// the set of states reachable from some state in `self` by one
    /// application of `relation`. Implements the image construction
    /// exactly as described in §4.7: conjoin `self` with
    /// `R(x, x')`, existentially quantify the current-state bits `x`,
    /// then rename the surviving next-state bits `x'` back onto `x` so
    /// the result is a set over the same variable domain as `self`.
    pub fn post(&self, next_expr: &Expr, relation: &Expr, current_binding: ArgId) -> CoreResult<Self> {
        let (next_domain, _next_handles) = self.register_fresh_copy(next_expr)?;
        let relation_bdd = {
            let mut guard = self.solver.borrow_mut();
            let current = current_value(&guard, &self.state_expr.ty, &self.registry_handles)?;
            let mut env = ArgumentEnv::new();
            env.bind_value(current_binding, current);
            let mut evaluator = Evaluator::new(&mut guard, &self.const_keys, self.list_max_length);
            evaluator.evaluate(next_expr, &mut env)?;
            let value = evaluator.evaluate(relation, &mut env)?;
            value.as_bool()?.clone()
        };
        let combined = self.bdd.and(&relation_bdd);
        let guard = self.solver.borrow();
        let projected = guard.exists_vars(&combined, &self.domain);
        let renamed = guard.rename_positional(&projected, &next_domain, &self.domain)?;
        drop(guard);
        Ok(self.with_bdd(renamed))
    }

    /// Iterates `post` from `self` until a fixed point, returning the
    /// full reachable set (`post^*`, §8 scenario S6).
    pub fn reachable_fixpoint(&self, next_expr: &Expr, relation: &Expr, current_binding: ArgId) -> CoreResult<Self> {
        let mut frontier = self.with_bdd(self.bdd.clone());
        loop {
            let stepped = frontier.post(next_expr, relation, current_binding)?;
            let grown = frontier.union(&stepped)?;
            if grown.equals(&frontier)? {
                return Ok(grown);
            }
            frontier = grown;
        }
    }

    fn with_bdd(&self, bdd: Bdd) -> Self {
        StateSet {
            solver: Rc::clone(&self.solver),
            bdd,
            domain: self.domain.clone(),
            state_expr: Rc::clone(&self.state_expr),
            const_keys: Rc::clone(&self.const_keys),
            list_max_length: self.list_max_length,
            registry_handles: self.registry_handles.clone(),
            interpreter: self.interpreter,
        }
    }

    /// Allocates fresh decision-diagram bits for another arbitrary of
    /// the same shape as this set's state, returning its flattened
    /// variable domain and registry handles.
    fn register_fresh_copy(&self, state_expr: &Expr) -> CoreResult<(Vec<BddVariable>, Vec<VarId>)> {
        let handles = {
            let mut guard = self.solver.borrow_mut();
            let mut env = ArgumentEnv::new();
            let mut evaluator = Evaluator::new(&mut guard, &self.const_keys, self.list_max_length);
            evaluator.evaluate(state_expr, &mut env)?;
            let (registry, _) = evaluator.into_registry();
            registry
                .handles(state_expr.id)
                .ok_or_else(|| CoreError::invariant("state expression registered no solver handles"))?
                .to_vec()
        };
        let guard = self.solver.borrow();
        let domain = flatten_domain(&guard, &handles)?;
        Ok((domain, handles))
    }
}

fn flatten_domain(solver: &DdSolver, handles: &[VarId]) -> CoreResult<Vec<BddVariable>> {
    let mut domain = Vec::new();
    for &v in handles {
        domain.extend_from_slice(solver.bits_for(v)?);
    }
    Ok(domain)
}

/// Reconstructs a state's current solver-level value from its already
/// allocated bits, for binding into a transition relation's argument
/// environment via [`ArgBinding::Value`]. Only the two primitive types
/// the decision-diagram backend represents are supported; anything else
/// would have been rejected when the state's arbitrary was first
/// planned (`crate::dd_plan`).
fn current_value(solver: &DdSolver, ty: &Type, handles: &[VarId]) -> CoreResult<SymbolicValue<DdSolver>> {
    let var = *handles
        .first()
        .ok_or_else(|| CoreError::invariant("state has no registered solver variable"))?;
    let bits = solver.bits_for(var)?;
    let var_set = solver.var_set();
    match ty {
        Type::Bool => Ok(SymbolicValue::Bool(var_set.mk_var(bits[0]))),
        Type::BitVec { .. } => Ok(SymbolicValue::Bv(bits.iter().map(|&b| var_set.mk_var(b)).collect())),
        Type::Record(_) => Err(CoreError::unsupported(BACKEND_NAME, "record-typed reachable-set state")),
        _ => Err(CoreError::unsupported(BACKEND_NAME, "non-bitvector reachable-set state")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{node, ArithOp, CmpOp, NodeKind};
    use crate::config::CheckerConfig;
    use crate::types::ConstValue;

    /// A transparent interpreter: a `u4` state's "value" is just the
    /// reified bit-vector magnitude, read straight out of the assignment.
    struct RawBitVec;

    impl ValueInterpreter for RawBitVec {
        type Value = i128;

        fn interpret(&self, expr: &Expr, assignment: &crate::reify::Assignment) -> CoreResult<i128> {
            match assignment.get(&expr.id) {
                Some(ConstValue::BitVec { value, .. }) => Ok(*value),
                _ => Err(CoreError::invariant("expected a reified bit-vector state")),
            }
        }
    }

    fn u4() -> Type {
        Type::BitVec { width: 4, signed: false }
    }

    fn bv_const(value: i128) -> Expr {
        node(u4(), NodeKind::Const(ConstValue::BitVec { value, width: 4, signed: false }))
    }

    /// S6: `x' = (x + 1) mod 16` over a `u4`, starting from `{x = 0}`,
    /// reaches every representable value.
    #[test]
    fn reachable_fixpoint_covers_the_full_u4_domain() {
        let plan = [crate::solver::dd_backend::DdVarSpec { width: 4 }, crate::solver::dd_backend::DdVarSpec { width: 4 }];
        let solver = Rc::new(RefCell::new(DdSolver::new(&plan)));
        let interpreter = RawBitVec;
        let const_keys = Rc::new(ConstantKeyCollector::new());
        let list_max_length = CheckerConfig::default().list_max_length;

        let x = node(u4(), NodeKind::Arbitrary);
        let init = node(Type::Bool, NodeKind::Eq { lhs: x.clone(), rhs: bv_const(0) });
        let initial = StateSet::from_predicate(
            Rc::clone(&solver),
            &x,
            &init,
            &[],
            &interpreter,
            Rc::clone(&const_keys),
            list_max_length,
        )
        .unwrap();

        let current_binding: ArgId = 0;
        let current = node(u4(), NodeKind::Argument(current_binding));
        let x_next = node(u4(), NodeKind::Arbitrary);
        let successor = node(
            u4(),
            NodeKind::Arith {
                op: ArithOp::Add,
                lhs: current,
                rhs: bv_const(1),
            },
        );
        let relation = node(Type::Bool, NodeKind::Eq { lhs: x_next.clone(), rhs: successor });

        let reached = initial.reachable_fixpoint(&x_next, &relation, current_binding).unwrap();
        assert!(reached.is_full());

        let bound = node(Type::Bool, NodeKind::Cmp { op: CmpOp::Ge, lhs: x.clone(), rhs: bv_const(16) });
        let empty = StateSet::from_predicate(
            Rc::clone(&solver),
            &x,
            &bound,
            &[],
            &interpreter,
            Rc::clone(&const_keys),
            list_max_length,
        )
        .unwrap();
        assert!(empty.is_empty());
        assert!(!reached.equals(&empty).unwrap());
    }
}
