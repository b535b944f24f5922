//! The Symbolic Value Lattice (§4.2).
//!
//! One variant per semantic type in the expression AST (§3). Every
//! variant carries only solver-native handles reached through the
//! [`Solver`] trait's associated types — never a raw backend type. Each
//! variant implements *guarded merge*: given a Boolean guard term and a
//! sibling value of the same variant, produce a value equal to `self`
//! when the guard holds and to `other` otherwise. Mixing variants in a
//! merge is a programming error (`CoreError::InvariantViolated`), not a
//! recoverable case — a well-typed DAG cannot produce it.

use crate::error::{CoreError, CoreResult};
use crate::solver::Solver;
use crate::types::{ConstValue, Type};
use std::collections::BTreeMap;

/// A finite-map value keyed on the concrete keys the constant-key
/// collector (§4.4) observed for this map's type. Looking up a key
/// outside that set is a caller error at the AST level (the evaluator
/// only ever emits `ConstMapGet` nodes with literal keys), so this type
/// does not need a "default" arm — a missing key here means the
/// collector under-approximated, which is itself an invariant violation.
pub type ConstMapKey = ConstValue;

pub struct ArrayMap<S: Solver> {
    pub backing: S::Array,
    pub key_ty: Type,
    pub value_ty: Type,
}

impl<S: Solver> Clone for ArrayMap<S> {
    fn clone(&self) -> Self {
        ArrayMap {
            backing: self.backing.clone(),
            key_ty: self.key_ty.clone(),
            value_ty: self.value_ty.clone(),
        }
    }
}

pub struct UnionValue<S: Solver> {
    /// One (case name, "is this the active case") pair per alternative,
    /// in declaration order.
    pub tags: Vec<(String, S::Bool)>,
    /// One (case name, payload) pair per alternative, in the same order
    /// as `tags`. The payload is only meaningful when the matching tag
    /// is true.
    pub payloads: Vec<(String, SymbolicValue<S>)>,
}

impl<S: Solver> Clone for UnionValue<S> {
    fn clone(&self) -> Self {
        UnionValue {
            tags: self.tags.clone(),
            payloads: self.payloads.clone(),
        }
    }
}

pub struct OptionValue<S: Solver> {
    pub present: S::Bool,
    pub payload: Box<SymbolicValue<S>>,
}

impl<S: Solver> Clone for OptionValue<S> {
    fn clone(&self) -> Self {
        OptionValue {
            present: self.present.clone(),
            payload: self.payload.clone(),
        }
    }
}

/// A fixed-length cons-chain: `slots[i]` is populated with the element at
/// index `i` when the list's *symbolic* length is `> i` (encoded as the
/// `OptionValue.present` guard of that slot), matching §4.2's merge rule
/// ("length-indexed merge; lists are represented as a fixed-length
/// cons-chain of option payloads"). The configured maximum length
/// (`CheckerConfig::list_max_length`) bounds `slots.len()`.
pub struct ListValue<S: Solver> {
    pub slots: Vec<OptionValue<S>>,
}

impl<S: Solver> Clone for ListValue<S> {
    fn clone(&self) -> Self {
        ListValue {
            slots: self.slots.clone(),
        }
    }
}

pub enum SymbolicValue<S: Solver> {
    Bool(S::Bool),
    Bv(S::Bv),
    Int(S::Int),
    Real(S::Real),
    Char(S::Char),
    Seq(S::Seq),
    Array(ArrayMap<S>),
    Record(Vec<(String, SymbolicValue<S>)>),
    Union(UnionValue<S>),
    Option(OptionValue<S>),
    ConstMap(BTreeMap<ConstMapKey, SymbolicValue<S>>),
    List(ListValue<S>),
}

impl<S: Solver> Clone for SymbolicValue<S> {
    fn clone(&self) -> Self {
        match self {
            SymbolicValue::Bool(v) => SymbolicValue::Bool(v.clone()),
            SymbolicValue::Bv(v) => SymbolicValue::Bv(v.clone()),
            SymbolicValue::Int(v) => SymbolicValue::Int(v.clone()),
            SymbolicValue::Real(v) => SymbolicValue::Real(v.clone()),
            SymbolicValue::Char(v) => SymbolicValue::Char(v.clone()),
            SymbolicValue::Seq(v) => SymbolicValue::Seq(v.clone()),
            SymbolicValue::Array(v) => SymbolicValue::Array(v.clone()),
            SymbolicValue::Record(v) => SymbolicValue::Record(v.clone()),
            SymbolicValue::Union(v) => SymbolicValue::Union(v.clone()),
            SymbolicValue::Option(v) => SymbolicValue::Option(v.clone()),
            SymbolicValue::ConstMap(v) => SymbolicValue::ConstMap(v.clone()),
            SymbolicValue::List(v) => SymbolicValue::List(v.clone()),
        }
    }
}

/// A cheap string tag for error messages and the "merging across
/// variants" invariant check; not exposed as part of the lattice's
/// public shape.
fn variant_name<S: Solver>(v: &SymbolicValue<S>) -> &'static str {
    match v {
        SymbolicValue::Bool(_) => "bool",
        SymbolicValue::Bv(_) => "bitvec",
        SymbolicValue::Int(_) => "int",
        SymbolicValue::Real(_) => "real",
        SymbolicValue::Char(_) => "char",
        SymbolicValue::Seq(_) => "seq",
        SymbolicValue::Array(_) => "array",
        SymbolicValue::Record(_) => "record",
        SymbolicValue::Union(_) => "union",
        SymbolicValue::Option(_) => "option",
        SymbolicValue::ConstMap(_) => "const_map",
        SymbolicValue::List(_) => "list",
    }
}

impl<S: Solver> SymbolicValue<S> {
    /// Guarded merge: `ite(guard, self, other)` lifted to the whole
    /// lattice, per the rules in §4.2's table.
    pub fn merge(&self, solver: &mut S, guard: &S::Bool, other: &Self) -> CoreResult<Self> {
        match (self, other) {
            (SymbolicValue::Bool(a), SymbolicValue::Bool(b)) => {
                Ok(SymbolicValue::Bool(solver.ite_bool(guard, a, b)))
            }
            (SymbolicValue::Bv(a), SymbolicValue::Bv(b)) => {
                Ok(SymbolicValue::Bv(solver.ite_bv(guard, a, b)))
            }
            (SymbolicValue::Int(a), SymbolicValue::Int(b)) => {
                Ok(SymbolicValue::Int(solver.ite_int(guard, a, b)))
            }
            (SymbolicValue::Real(a), SymbolicValue::Real(b)) => {
                Ok(SymbolicValue::Real(solver.ite_real(guard, a, b)))
            }
            (SymbolicValue::Char(a), SymbolicValue::Char(b)) => {
                Ok(SymbolicValue::Char(solver.ite_char(guard, a, b)))
            }
            (SymbolicValue::Seq(a), SymbolicValue::Seq(b)) => {
                Ok(SymbolicValue::Seq(solver.ite_seq(guard, a, b)))
            }
            (SymbolicValue::Array(a), SymbolicValue::Array(b)) => {
                Ok(SymbolicValue::Array(ArrayMap {
                    backing: solver.ite_array(guard, &a.backing, &b.backing),
                    key_ty: a.key_ty.clone(),
                    value_ty: a.value_ty.clone(),
                }))
            }
            (SymbolicValue::Record(a), SymbolicValue::Record(b)) => {
                if a.len() != b.len() || a.iter().zip(b).any(|((n1, _), (n2, _))| n1 != n2) {
                    return Err(CoreError::invariant(
                        "record merge requires identical field sets",
                    ));
                }
                let mut merged = Vec::with_capacity(a.len());
                for ((name, va), (_, vb)) in a.iter().zip(b.iter()) {
                    merged.push((name.clone(), va.merge(solver, guard, vb)?));
                }
                Ok(SymbolicValue::Record(merged))
            }
            (SymbolicValue::Union(a), SymbolicValue::Union(b)) => {
                if a.tags.len() != b.tags.len() {
                    return Err(CoreError::invariant(
                        "union merge requires identical alternative sets",
                    ));
                }
                let mut tags = Vec::with_capacity(a.tags.len());
                for ((name, ta), (_, tb)) in a.tags.iter().zip(b.tags.iter()) {
                    tags.push((name.clone(), solver.ite_bool(guard, ta, tb)));
                }
                let mut payloads = Vec::with_capacity(a.payloads.len());
                for ((name, pa), (_, pb)) in a.payloads.iter().zip(b.payloads.iter()) {
                    payloads.push((name.clone(), pa.merge(solver, guard, pb)?));
                }
                Ok(SymbolicValue::Union(UnionValue { tags, payloads }))
            }
            (SymbolicValue::Option(a), SymbolicValue::Option(b)) => {
                Ok(SymbolicValue::Option(OptionValue {
                    present: solver.ite_bool(guard, &a.present, &b.present),
                    payload: Box::new(a.payload.merge(solver, guard, &b.payload)?),
                }))
            }
            (SymbolicValue::ConstMap(a), SymbolicValue::ConstMap(b)) => {
                // Keys absent on one side take the other's value
                // unconditionally (§4.2).
                let mut merged = BTreeMap::new();
                for key in a.keys().chain(b.keys()) {
                    if merged.contains_key(key) {
                        continue;
                    }
                    let value = match (a.get(key), b.get(key)) {
                        (Some(va), Some(vb)) => va.merge(solver, guard, vb)?,
                        (Some(va), None) => va.merge(solver, guard, va)?,
                        (None, Some(vb)) => vb.merge(solver, guard, vb)?,
                        (None, None) => unreachable!("key came from a or b's key set"),
                    };
                    merged.insert(key.clone(), value);
                }
                Ok(SymbolicValue::ConstMap(merged))
            }
            (SymbolicValue::List(a), SymbolicValue::List(b)) => {
                if a.slots.len() != b.slots.len() {
                    return Err(CoreError::invariant(
                        "list merge requires equal configured maximum length",
                    ));
                }
                let mut slots = Vec::with_capacity(a.slots.len());
                for (sa, sb) in a.slots.iter().zip(b.slots.iter()) {
                    slots.push(OptionValue {
                        present: solver.ite_bool(guard, &sa.present, &sb.present),
                        payload: Box::new(sa.payload.merge(solver, guard, &sb.payload)?),
                    });
                }
                Ok(SymbolicValue::List(ListValue { slots }))
            }
            (a, b) => Err(CoreError::invariant(format!(
                "cannot merge symbolic value variants {} and {}",
                variant_name::<S>(a),
                variant_name::<S>(b)
            ))),
        }
    }

    pub fn as_bool(&self) -> CoreResult<&S::Bool> {
        match self {
            SymbolicValue::Bool(b) => Ok(b),
            other => Err(CoreError::invariant(format!(
                "expected bool, found {}",
                variant_name::<S>(other)
            ))),
        }
    }

    pub fn as_bv(&self) -> CoreResult<&S::Bv> {
        match self {
            SymbolicValue::Bv(b) => Ok(b),
            other => Err(CoreError::invariant(format!("expected bitvec, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_int(&self) -> CoreResult<&S::Int> {
        match self {
            SymbolicValue::Int(i) => Ok(i),
            other => Err(CoreError::invariant(format!("expected int, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_real(&self) -> CoreResult<&S::Real> {
        match self {
            SymbolicValue::Real(r) => Ok(r),
            other => Err(CoreError::invariant(format!("expected real, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_seq(&self) -> CoreResult<&S::Seq> {
        match self {
            SymbolicValue::Seq(s) => Ok(s),
            other => Err(CoreError::invariant(format!("expected seq, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_array(&self) -> CoreResult<&ArrayMap<S>> {
        match self {
            SymbolicValue::Array(a) => Ok(a),
            other => Err(CoreError::invariant(format!("expected array-map, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_record(&self) -> CoreResult<&[(String, SymbolicValue<S>)]> {
        match self {
            SymbolicValue::Record(fields) => Ok(fields),
            other => Err(CoreError::invariant(format!("expected record, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_union(&self) -> CoreResult<&UnionValue<S>> {
        match self {
            SymbolicValue::Union(u) => Ok(u),
            other => Err(CoreError::invariant(format!("expected union, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_option(&self) -> CoreResult<&OptionValue<S>> {
        match self {
            SymbolicValue::Option(o) => Ok(o),
            other => Err(CoreError::invariant(format!("expected option, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_const_map(&self) -> CoreResult<&BTreeMap<ConstMapKey, SymbolicValue<S>>> {
        match self {
            SymbolicValue::ConstMap(m) => Ok(m),
            other => Err(CoreError::invariant(format!("expected const_map, found {}", variant_name::<S>(other)))),
        }
    }

    pub fn as_list(&self) -> CoreResult<&ListValue<S>> {
        match self {
            SymbolicValue::List(l) => Ok(l),
            other => Err(CoreError::invariant(format!("expected list, found {}", variant_name::<S>(other)))),
        }
    }
}

/// Exposed for callers outside this module that need the variant label
/// (e.g. the evaluator's `InvariantViolated` messages for node/type
/// mismatches).
pub fn symbolic_variant_name<S: Solver>(v: &SymbolicValue<S>) -> &'static str {
    variant_name(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::z3_backend::Z3Solver;
    use crate::types::Type;

    /// Negating `eq` and checking it unsat proves `eq` holds for every
    /// assignment to the free variables it mentions, not just one model.
    fn holds_for_every_guard(solver: &mut Z3Solver, eq: &<Z3Solver as Solver>::Bool) {
        let not_eq = solver.not(eq);
        assert!(solver.check(&not_eq).unwrap().is_none());
    }

    #[test]
    fn bool_merge_picks_then_branch_when_guard_is_true() {
        let mut solver = Z3Solver::new();
        let t = SymbolicValue::<Z3Solver>::Bool(solver.bool_const(true));
        let f = SymbolicValue::<Z3Solver>::Bool(solver.bool_const(false));
        let guard = solver.bool_const(true);
        let merged = t.merge(&mut solver, &guard, &f).unwrap();
        let eq = solver.iff(merged.as_bool().unwrap(), t.as_bool().unwrap());
        holds_for_every_guard(&mut solver, &eq);
    }

    /// Spec testable property 5: merge idempotence, `x.merge(g, x) == x`
    /// for every guard `g`, not just a fixed one.
    #[test]
    fn bitvector_merge_is_idempotent_for_every_guard() {
        let mut solver = Z3Solver::new();
        let ty = Type::u8();
        let (_, x_dyn) = solver.fresh_var(&ty).unwrap();
        let x = SymbolicValue::<Z3Solver>::Bv(solver.as_bv(&x_dyn).unwrap());
        let (_, g_dyn) = solver.fresh_var(&Type::Bool).unwrap();
        let guard = solver.as_bool(&g_dyn).unwrap();
        let merged = x.merge(&mut solver, &guard, &x).unwrap();
        let eq = solver.bv_eq(merged.as_bv().unwrap(), x.as_bv().unwrap());
        holds_for_every_guard(&mut solver, &eq);
    }

    #[test]
    fn record_merge_rejects_mismatched_field_sets() {
        let mut solver = Z3Solver::new();
        let (_, x_dyn) = solver.fresh_var(&Type::u8()).unwrap();
        let x = SymbolicValue::<Z3Solver>::Bv(solver.as_bv(&x_dyn).unwrap());
        let a = SymbolicValue::<Z3Solver>::Record(vec![("x".to_string(), x.clone())]);
        let b = SymbolicValue::<Z3Solver>::Record(vec![("y".to_string(), x)]);
        let guard = solver.bool_const(true);
        let err = a.merge(&mut solver, &guard, &b).unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolated(_)));
    }

    #[test]
    fn union_merge_rejects_mismatched_alternative_counts() {
        let mut solver = Z3Solver::new();
        let (_, x_dyn) = solver.fresh_var(&Type::u8()).unwrap();
        let x = SymbolicValue::<Z3Solver>::Bv(solver.as_bv(&x_dyn).unwrap());
        let tag = solver.bool_const(true);
        let a = SymbolicValue::<Z3Solver>::Union(UnionValue {
            tags: vec![("a".to_string(), tag.clone()), ("b".to_string(), tag.clone())],
            payloads: vec![("a".to_string(), x.clone()), ("b".to_string(), x.clone())],
        });
        let b = SymbolicValue::<Z3Solver>::Union(UnionValue {
            tags: vec![("a".to_string(), tag)],
            payloads: vec![("a".to_string(), x)],
        });
        let guard = solver.bool_const(true);
        let err = a.merge(&mut solver, &guard, &b).unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolated(_)));
    }

    #[test]
    fn list_merge_rejects_mismatched_configured_lengths() {
        let mut solver = Z3Solver::new();
        let (_, x_dyn) = solver.fresh_var(&Type::u8()).unwrap();
        let x = SymbolicValue::<Z3Solver>::Bv(solver.as_bv(&x_dyn).unwrap());
        let present = solver.bool_const(true);
        let slot = OptionValue {
            present,
            payload: Box::new(x),
        };
        let a = SymbolicValue::<Z3Solver>::List(ListValue {
            slots: vec![slot.clone(), slot.clone()],
        });
        let b = SymbolicValue::<Z3Solver>::List(ListValue { slots: vec![slot] });
        let guard = solver.bool_const(true);
        let err = a.merge(&mut solver, &guard, &b).unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolated(_)));
    }

    /// A key absent on one side of a `ConstMap` merge takes the present
    /// side's value unconditionally (§4.2) — it must hold regardless of
    /// the guard, not just when the guard happens to be true.
    #[test]
    fn const_map_merge_keeps_a_key_absent_on_one_side_regardless_of_guard() {
        let mut solver = Z3Solver::new();
        let (_, x_dyn) = solver.fresh_var(&Type::u8()).unwrap();
        let x = SymbolicValue::<Z3Solver>::Bv(solver.as_bv(&x_dyn).unwrap());
        let key = ConstValue::BitVec { value: 0, width: 8, signed: false };
        let mut a = BTreeMap::new();
        a.insert(key.clone(), x.clone());
        let b: BTreeMap<ConstMapKey, SymbolicValue<Z3Solver>> = BTreeMap::new();
        let a = SymbolicValue::<Z3Solver>::ConstMap(a);
        let b = SymbolicValue::<Z3Solver>::ConstMap(b);
        let (_, g_dyn) = solver.fresh_var(&Type::Bool).unwrap();
        let guard = solver.as_bool(&g_dyn).unwrap();
        let merged = a.merge(&mut solver, &guard, &b).unwrap();
        let merged_map = merged.as_const_map().unwrap();
        let eq = solver.bv_eq(merged_map.get(&key).unwrap().as_bv().unwrap(), x.as_bv().unwrap());
        holds_for_every_guard(&mut solver, &eq);
    }
}
