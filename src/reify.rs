//! Witness Reifier (§4.7 "Witness reification").
//!
//! Converts a raw model assignment — solver variable handles read back
//! through [`Solver::get`] — into `ConstValue`s keyed by the arbitrary
//! expression that asked for them. The recursive descent here mirrors
//! `Evaluator::alloc_arbitrary`'s structure exactly: the same type is
//! walked in the same order, consuming the same flat handle list one
//! leaf at a time, so the n-th handle read here is the n-th handle that
//! allocation produced.

use crate::ast::ArbitraryId;
use crate::const_keys::ConstantKeyCollector;
use crate::error::{CoreError, CoreResult};
use crate::evaluator::selector_width;
use crate::solver::{Solver, VarId};
use crate::types::{ConstValue, Type};
use std::collections::HashMap;

/// `expr_id -> concrete value`, the result of a successful `find`/
/// `maximize`/`minimize` call (§6 "Exposed interfaces").
pub type Assignment = HashMap<ArbitraryId, ConstValue>;

/// Reifies every registered arbitrary's handles against `model`.
/// `handles_of` is the arbitrary registry's `handles` lookup, passed as
/// a closure so this module never needs to name `ArbitraryRegistry`'s
/// handle-element type beyond `VarId`.
pub fn reify<S: Solver>(
    solver: &S,
    model: &S::Model,
    arbitrary_types: &HashMap<ArbitraryId, Type>,
    handles_of: impl Fn(ArbitraryId) -> Option<Vec<VarId>>,
    const_keys: &ConstantKeyCollector,
    list_max_length: u32,
) -> CoreResult<Assignment> {
    let mut out = HashMap::with_capacity(arbitrary_types.len());
    for (&id, ty) in arbitrary_types {
        let handles = handles_of(id)
            .ok_or_else(|| CoreError::invariant(format!("arbitrary {id} has no registered solver handles")))?;
        let mut cursor = 0usize;
        let value = reify_value(solver, model, ty, &handles, &mut cursor, const_keys, list_max_length)?;
        if cursor != handles.len() {
            return Err(CoreError::invariant(format!(
                "arbitrary {id} consumed {cursor} of its {} registered handles during reification",
                handles.len()
            )));
        }
        out.insert(id, value);
    }
    Ok(out)
}

fn next_handle(handles: &[VarId], cursor: &mut usize) -> CoreResult<VarId> {
    let h = handles
        .get(*cursor)
        .copied()
        .ok_or_else(|| CoreError::invariant("arbitrary handle list exhausted during reification"))?;
    *cursor += 1;
    Ok(h)
}

fn reify_bool<S: Solver>(solver: &S, model: &S::Model, handle: VarId) -> CoreResult<bool> {
    match solver.get(model, handle, &Type::Bool)? {
        ConstValue::Bool(b) => Ok(b),
        other => Err(CoreError::invariant(format!("expected a bool handle to reify, found {other:?}"))),
    }
}

fn reify_value<S: Solver>(
    solver: &S,
    model: &S::Model,
    ty: &Type,
    handles: &[VarId],
    cursor: &mut usize,
    const_keys: &ConstantKeyCollector,
    list_max_length: u32,
) -> CoreResult<ConstValue> {
    match ty {
        Type::Bool | Type::BitVec { .. } | Type::Int | Type::Real | Type::Char | Type::Seq(_) => {
            let h = next_handle(handles, cursor)?;
            solver.get(model, h, ty)
        }
        Type::Map(_, _) => {
            let _ = next_handle(handles, cursor)?;
            Err(CoreError::unsupported("reifier", "array-backed map arbitrary witnessing"))
        }
        Type::Record(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            for (name, fty) in fields {
                let value = reify_value(solver, model, fty, handles, cursor, const_keys, list_max_length)?;
                out.push((name.clone(), value));
            }
            Ok(ConstValue::Record(out))
        }
        Type::Union(cases) => {
            let width = selector_width(cases.len());
            let sel_handle = next_handle(handles, cursor)?;
            let selected = match solver.get(model, sel_handle, &Type::BitVec { width, signed: false })? {
                ConstValue::BitVec { value, .. } => value as usize,
                other => return Err(CoreError::invariant(format!("union selector did not reify to a bitvec, found {other:?}"))),
            };
            let mut chosen = None;
            for (idx, (name, case_ty)) in cases.iter().enumerate() {
                let payload = reify_value(solver, model, case_ty, handles, cursor, const_keys, list_max_length)?;
                if idx == selected {
                    chosen = Some(ConstValue::Union {
                        case: name.clone(),
                        payload: Box::new(payload),
                    });
                }
            }
            chosen.ok_or_else(|| CoreError::invariant("union selector reified out of range of its declared alternatives"))
        }
        Type::Option(inner) => {
            let present_handle = next_handle(handles, cursor)?;
            let present = reify_bool(solver, model, present_handle)?;
            let payload = reify_value(solver, model, inner, handles, cursor, const_keys, list_max_length)?;
            Ok(ConstValue::Option(if present { Some(Box::new(payload)) } else { None }))
        }
        Type::List(inner) => {
            let mut items = Vec::new();
            for _ in 0..list_max_length {
                let present_handle = next_handle(handles, cursor)?;
                let present = reify_bool(solver, model, present_handle)?;
                let payload = reify_value(solver, model, inner, handles, cursor, const_keys, list_max_length)?;
                if present {
                    items.push(payload);
                }
            }
            Ok(ConstValue::List(items))
        }
        Type::ConstMap(k, v) => {
            let keys = const_keys.keys_for(k, v);
            let mut entries = Vec::with_capacity(keys.len());
            for key in keys {
                let value = reify_value(solver, model, v, handles, cursor, const_keys, list_max_length)?;
                entries.push((key, value));
            }
            Ok(ConstValue::ConstMap(entries))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ArbitraryRegistry;
    use crate::solver::z3_backend::Z3Solver;

    #[test]
    fn reifies_a_flat_bitvec_arbitrary() {
        let mut solver = Z3Solver::new();
        let ty = Type::u8();
        let (id, dynamic) = solver.fresh_var(&ty).unwrap();
        let x = solver.as_bv(&dynamic).unwrap();
        let seven = solver.const_of(&ConstValue::BitVec { value: 7, width: 8, signed: false }).unwrap();
        let seven_bv = solver.as_bv(&seven).unwrap();
        let eq = solver.bv_eq(&x, &seven_bv);
        let model = solver.check(&eq).unwrap().unwrap();

        let mut registry: ArbitraryRegistry<VarId> = ArbitraryRegistry::new();
        registry.register(1, vec![id]);
        let mut types = HashMap::new();
        types.insert(1, ty);
        let const_keys = ConstantKeyCollector::new();

        let assignment = reify(&solver, &model, &types, |aid| registry.handles(aid).map(|s| s.to_vec()), &const_keys, 5).unwrap();
        assert_eq!(assignment.get(&1), Some(&ConstValue::BitVec { value: 7, width: 8, signed: false }));
    }
}
