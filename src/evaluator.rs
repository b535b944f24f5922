//! Symbolic Evaluator (§4.5).
//!
//! A memoizing visitor over the expression AST that folds each node into
//! a [`SymbolicValue`] using a generic [`Solver`]. Every `Arbitrary` node
//! registers one or more fresh solver variables in the arbitrary registry,
//! keyed by the node's own identity, so the model checker façade can walk
//! them again during reification (§4.8). The evaluator never constructs a
//! symbolic value of a different family than the node it came from — a
//! violation of that invariant is `CoreError::InvariantViolated`, not a
//! recoverable case (§4.5 "Failure modes").

use crate::ast::{ArbitraryId, ArgId, ArithOp, BitOp, CmpOp, Expr, NodeKind};
use crate::const_keys::ConstantKeyCollector;
use crate::env::{ArgBinding, ArgumentEnv, ArbitraryRegistry, MemoCache};
use crate::error::{CoreError, CoreResult};
use crate::solver::{Solver, VarId};
use crate::types::{ConstValue, Type};
use crate::value::{ArrayMap, ListValue, OptionValue, SymbolicValue, UnionValue};
use std::collections::{BTreeMap, HashMap};

/// The smallest bit-vector width that can select among `n` union
/// alternatives (at least 1, since a single-case union still needs a
/// selector bit for uniformity).
pub(crate) fn selector_width(n: usize) -> u32 {
    if n <= 1 {
        1
    } else {
        32 - ((n - 1) as u32).leading_zeros()
    }
}

/// The default symbolic value for `ty` — an absent `ConstMap` key (§4.5
/// "Finite-map get"), an unused list slot past the literal's length, or
/// an absent `Option`'s payload. A `Type::Union` with no alternatives is
/// malformed (nothing elsewhere in the type system forbids constructing
/// one), so that case reports `CoreError::InvariantViolated` rather than
/// panicking.
fn default_const(ty: &Type) -> CoreResult<ConstValue> {
    Ok(match ty {
        Type::Bool => ConstValue::Bool(false),
        Type::BitVec { width, signed } => ConstValue::BitVec {
            value: 0,
            width: *width,
            signed: *signed,
        },
        Type::Int => ConstValue::Int(0),
        Type::Real => ConstValue::Real {
            numerator: 0,
            denominator: 1,
        },
        Type::Char => ConstValue::Char('\0'),
        Type::Seq(_) => ConstValue::Seq(Vec::new()),
        Type::List(_) => ConstValue::List(Vec::new()),
        Type::Option(_) => ConstValue::Option(None),
        Type::ConstMap(_, _) => ConstValue::ConstMap(Vec::new()),
        Type::Map(_, _) => ConstValue::Map(Vec::new()),
        Type::Record(fields) => {
            let out: CoreResult<Vec<_>> = fields.iter().map(|(n, t)| Ok((n.clone(), default_const(t)?))).collect();
            ConstValue::Record(out?)
        }
        Type::Union(cases) => {
            let (case, case_ty) = cases
                .first()
                .ok_or_else(|| CoreError::invariant("union type has no alternatives"))?;
            ConstValue::Union {
                case: case.clone(),
                payload: Box::new(default_const(case_ty)?),
            }
        }
    })
}

pub struct Evaluator<'a, S: Solver> {
    solver: &'a mut S,
    memo: MemoCache<S>,
    registry: ArbitraryRegistry<VarId>,
    arbitrary_types: HashMap<ArbitraryId, Type>,
    const_keys: &'a ConstantKeyCollector,
    list_max_length: u32,
}

impl<'a, S: Solver> Evaluator<'a, S> {
    pub fn new(solver: &'a mut S, const_keys: &'a ConstantKeyCollector, list_max_length: u32) -> Self {
        Evaluator {
            solver,
            memo: MemoCache::new(),
            registry: ArbitraryRegistry::new(),
            arbitrary_types: HashMap::new(),
            const_keys,
            list_max_length,
        }
    }

    /// Consumes the evaluator, handing back the arbitrary registry and
    /// the declared type of each registered arbitrary — everything the
    /// witness reifier (§4.8) needs to walk the same structure again.
    pub fn into_registry(self) -> (ArbitraryRegistry<VarId>, HashMap<ArbitraryId, Type>) {
        (self.registry, self.arbitrary_types)
    }

    pub fn evaluate(&mut self, expr: &Expr, env: &mut ArgumentEnv<S>) -> CoreResult<SymbolicValue<S>> {
        if let Some(cached) = self.memo.get(expr.id) {
            return Ok(cached.clone());
        }
        let value = self.evaluate_uncached(expr, env)?;
        self.memo.insert(expr.id, value.clone());
        Ok(value)
    }

    fn bool_true(&mut self) -> CoreResult<S::Bool> {
        Ok(self.solver.bool_const(true))
    }

    fn evaluate_uncached(&mut self, expr: &Expr, env: &mut ArgumentEnv<S>) -> CoreResult<SymbolicValue<S>> {
        match &expr.kind {
            NodeKind::Const(value) => self.const_to_symbolic(&expr.ty, value),

            NodeKind::Arbitrary => {
                let mut leaves = Vec::new();
                let value = self.alloc_arbitrary(&expr.ty, &mut leaves)?;
                self.registry.register(expr.id, leaves);
                self.arbitrary_types.insert(expr.id, expr.ty.clone());
                Ok(value)
            }

            NodeKind::Argument(arg) => self.evaluate_argument(*arg, env),

            NodeKind::Not(a) => {
                let va = self.evaluate(a, env)?;
                let b = va.as_bool()?;
                Ok(SymbolicValue::Bool(self.solver.not(b)))
            }
            NodeKind::And(a, b) => {
                let va = self.evaluate(a, env)?;
                let vb = self.evaluate(b, env)?;
                let r = self.solver.and(va.as_bool()?, vb.as_bool()?);
                Ok(SymbolicValue::Bool(r))
            }
            NodeKind::Or(a, b) => {
                let va = self.evaluate(a, env)?;
                let vb = self.evaluate(b, env)?;
                let r = self.solver.or(va.as_bool()?, vb.as_bool()?);
                Ok(SymbolicValue::Bool(r))
            }
            NodeKind::Iff(a, b) => {
                let va = self.evaluate(a, env)?;
                let vb = self.evaluate(b, env)?;
                let r = self.solver.iff(va.as_bool()?, vb.as_bool()?);
                Ok(SymbolicValue::Bool(r))
            }

            NodeKind::If {
                guard,
                then_branch,
                else_branch,
            } => {
                let vg = self.evaluate(guard, env)?;
                let vt = self.evaluate(then_branch, env)?;
                let ve = self.evaluate(else_branch, env)?;
                let g = vg.as_bool()?.clone();
                vt.merge(self.solver, &g, &ve)
            }

            NodeKind::Arith { op, lhs, rhs } => self.evaluate_arith(*op, lhs, rhs, env),
            NodeKind::BitOp { op, lhs, rhs } => self.evaluate_bitop(*op, lhs, rhs, env),
            NodeKind::BitNot(a) => {
                let va = self.evaluate(a, env)?;
                Ok(SymbolicValue::Bv(self.solver.bv_not(va.as_bv()?)))
            }
            NodeKind::Cmp { op, lhs, rhs } => self.evaluate_cmp(*op, lhs, rhs, env),
            NodeKind::Eq { lhs, rhs } => {
                let va = self.evaluate(lhs, env)?;
                let vb = self.evaluate(rhs, env)?;
                Ok(SymbolicValue::Bool(structural_eq(&va, &vb, self.solver)?))
            }

            NodeKind::RecordCreate(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    out.push((name.clone(), self.evaluate(value, env)?));
                }
                Ok(SymbolicValue::Record(out))
            }
            NodeKind::RecordGet { record, field } => {
                let v = self.evaluate(record, env)?;
                v.as_record()?
                    .iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| CoreError::invariant(format!("record has no field {field}")))
            }
            NodeKind::RecordSet { record, field, value } => {
                let base = self.evaluate(record, env)?;
                let new_value = self.evaluate(value, env)?;
                let mut fields = base.as_record()?.to_vec();
                let slot = fields
                    .iter_mut()
                    .find(|(name, _)| name == field)
                    .ok_or_else(|| CoreError::invariant(format!("record has no field {field}")))?;
                slot.1 = new_value;
                Ok(SymbolicValue::Record(fields))
            }

            NodeKind::UnionCreate { case, payload } => self.evaluate_union_create(&expr.ty, case, payload, env),
            NodeKind::UnionMatch { scrutinee, arms } => self.evaluate_union_match(scrutinee, arms, env),

            NodeKind::SeqConcat(a, b) => {
                let va = self.evaluate(a, env)?;
                let vb = self.evaluate(b, env)?;
                Ok(SymbolicValue::Seq(self.solver.seq_concat(va.as_seq()?, vb.as_seq()?)))
            }
            NodeKind::SeqLength(a) => {
                let va = self.evaluate(a, env)?;
                Ok(SymbolicValue::Int(self.solver.seq_length(va.as_seq()?)))
            }
            NodeKind::SeqAt { seq, index } => {
                let vs = self.evaluate(seq, env)?;
                let vi = self.evaluate(index, env)?;
                Ok(SymbolicValue::Seq(self.solver.seq_at(vs.as_seq()?, vi.as_int()?)))
            }
            NodeKind::SeqContains { seq, elem } => {
                let vs = self.evaluate(seq, env)?;
                let ve = self.evaluate(elem, env)?;
                Ok(SymbolicValue::Bool(self.solver.seq_contains(vs.as_seq()?, ve.as_seq()?)))
            }
            NodeKind::SeqIndexOf { seq, elem } => {
                let vs = self.evaluate(seq, env)?;
                let ve = self.evaluate(elem, env)?;
                let zero = self.solver.const_of(&ConstValue::Int(0))?;
                let zero_int = self
                    .solver
                    .as_int(&zero)
                    .ok_or_else(|| CoreError::invariant("solver failed to build an int zero literal"))?;
                Ok(SymbolicValue::Int(self.solver.seq_index_of(vs.as_seq()?, ve.as_seq()?, &zero_int)))
            }
            NodeKind::SeqSlice { seq, offset, length } => {
                let vs = self.evaluate(seq, env)?;
                let vo = self.evaluate(offset, env)?;
                let vl = self.evaluate(length, env)?;
                Ok(SymbolicValue::Seq(self.solver.seq_slice(vs.as_seq()?, vo.as_int()?, vl.as_int()?)))
            }
            NodeKind::SeqReplace { seq, from, to } => {
                let vs = self.evaluate(seq, env)?;
                let vf = self.evaluate(from, env)?;
                let vt = self.evaluate(to, env)?;
                Ok(SymbolicValue::Seq(self.solver.seq_replace(vs.as_seq()?, vf.as_seq()?, vt.as_seq()?)))
            }

            NodeKind::ListCreate(items) => self.evaluate_list_create(&expr.ty, items, env),
            NodeKind::ListCons { head, tail } => {
                let vh = self.evaluate(head, env)?;
                let vt = self.evaluate(tail, env)?;
                let tail_list = vt.as_list()?;
                let mut slots = Vec::with_capacity(tail_list.slots.len());
                let true_bool = self.bool_true()?;
                slots.push(OptionValue {
                    present: true_bool,
                    payload: Box::new(vh),
                });
                slots.extend(tail_list.slots[..tail_list.slots.len().saturating_sub(1)].iter().cloned());
                Ok(SymbolicValue::List(ListValue { slots }))
            }
            NodeKind::ListIsEmpty(a) => {
                let va = self.evaluate(a, env)?;
                let first = &va.as_list()?.slots[0];
                Ok(SymbolicValue::Bool(self.solver.not(&first.present)))
            }
            NodeKind::ListHead(a) => {
                let va = self.evaluate(a, env)?;
                Ok((*va.as_list()?.slots[0].payload).clone())
            }
            NodeKind::ListTail(a) => {
                let va = self.evaluate(a, env)?;
                let list = va.as_list()?;
                let elem_ty = match &a.ty {
                    Type::List(t) => (**t).clone(),
                    other => return Err(CoreError::invariant(format!("list_tail operand has non-list type {other}"))),
                };
                let mut slots: Vec<OptionValue<S>> = list.slots[1..].to_vec();
                let false_bool = self.solver.bool_const(false);
                let default_payload = self.default_symbolic(&elem_ty)?;
                slots.push(OptionValue {
                    present: false_bool,
                    payload: Box::new(default_payload),
                });
                Ok(SymbolicValue::List(ListValue { slots }))
            }

            NodeKind::ConstMapGet { map, key } => {
                let vm = self.evaluate(map, env)?;
                let value_ty = match &map.ty {
                    Type::ConstMap(_, v) => (**v).clone(),
                    other => return Err(CoreError::invariant(format!("const_map_get operand has non-map type {other}"))),
                };
                match vm.as_const_map()?.get(key) {
                    Some(v) => Ok(v.clone()),
                    None => self.default_symbolic(&value_ty),
                }
            }
            NodeKind::ConstMapSet { map, key, value } => {
                let vm = self.evaluate(map, env)?;
                let vv = self.evaluate(value, env)?;
                let mut entries = vm.as_const_map()?.clone();
                entries.insert(key.clone(), vv);
                Ok(SymbolicValue::ConstMap(entries))
            }

            NodeKind::ArrayMapGet { map, key } => {
                let vm = self.evaluate(map, env)?;
                let vk = self.evaluate(key, env)?;
                let arr = vm.as_array()?;
                let key_dyn = self.symbolic_to_dynamic(&vk)?;
                let result_dyn = self.solver.array_select(&arr.backing, &key_dyn);
                self.dynamic_to_value(&arr.value_ty, &result_dyn)
            }
            NodeKind::ArrayMapSet { map, key, value } => {
                let vm = self.evaluate(map, env)?;
                let vk = self.evaluate(key, env)?;
                let vv = self.evaluate(value, env)?;
                let arr = vm.as_array()?.clone();
                let key_dyn = self.symbolic_to_dynamic(&vk)?;
                let value_dyn = self.symbolic_to_dynamic(&vv)?;
                let backing = self.solver.array_store(&arr.backing, &key_dyn, &value_dyn);
                Ok(SymbolicValue::Array(ArrayMap {
                    backing,
                    key_ty: arr.key_ty,
                    value_ty: arr.value_ty,
                }))
            }

            NodeKind::Convert(a) => {
                let va = self.evaluate(a, env)?;
                let (from_width, signed) = match &a.ty {
                    Type::BitVec { width, signed } => (*width, *signed),
                    other => return Err(CoreError::invariant(format!("convert operand has non-bitvec type {other}"))),
                };
                let to_width = match &expr.ty {
                    Type::BitVec { width, .. } => *width,
                    other => return Err(CoreError::invariant(format!("convert target has non-bitvec type {other}"))),
                };
                if to_width == 0 {
                    return Err(CoreError::invariant("cannot convert to a zero-width bitvector"));
                }
                Ok(SymbolicValue::Bv(self.solver.bv_convert(va.as_bv()?, from_width, to_width, signed)))
            }

            NodeKind::OptionSome(a) => {
                let va = self.evaluate(a, env)?;
                let present = self.bool_true()?;
                Ok(SymbolicValue::Option(OptionValue {
                    present,
                    payload: Box::new(va),
                }))
            }
            NodeKind::OptionNone => {
                let inner_ty = match &expr.ty {
                    Type::Option(t) => (**t).clone(),
                    other => return Err(CoreError::invariant(format!("option_none node has non-option type {other}"))),
                };
                let present = self.solver.bool_const(false);
                let payload = self.default_symbolic(&inner_ty)?;
                Ok(SymbolicValue::Option(OptionValue {
                    present,
                    payload: Box::new(payload),
                }))
            }
            NodeKind::OptionIsSome(a) => {
                let va = self.evaluate(a, env)?;
                Ok(SymbolicValue::Bool(va.as_option()?.present.clone()))
            }
            NodeKind::OptionGet(a) => {
                let va = self.evaluate(a, env)?;
                Ok((*va.as_option()?.payload).clone())
            }
        }
    }

    fn evaluate_argument(&mut self, arg: ArgId, env: &mut ArgumentEnv<S>) -> CoreResult<SymbolicValue<S>> {
        if let Some(value) = env.resolved(arg) {
            return Ok(value.clone());
        }
        let bound = env
            .take_expr(arg)
            .cloned()
            .ok_or_else(|| CoreError::invariant(format!("argument {arg} has no binding")))?;
        let value = self.evaluate(&bound, env)?;
        env.cache_resolved(arg, value.clone());
        Ok(value)
    }

    fn evaluate_arith(&mut self, op: ArithOp, lhs: &Expr, rhs: &Expr, env: &mut ArgumentEnv<S>) -> CoreResult<SymbolicValue<S>> {
        let va = self.evaluate(lhs, env)?;
        let vb = self.evaluate(rhs, env)?;
        match &lhs.ty {
            Type::BitVec { .. } => {
                let (a, b) = (va.as_bv()?, vb.as_bv()?);
                let r = match op {
                    ArithOp::Add => self.solver.bv_add(a, b),
                    ArithOp::Sub => self.solver.bv_sub(a, b),
                    ArithOp::Mul => self.solver.bv_mul(a, b),
                    ArithOp::Div | ArithOp::Rem => {
                        return Err(CoreError::unsupported("evaluator", "bitvec div/rem (backend-specific, not in Solver trait)"))
                    }
                };
                Ok(SymbolicValue::Bv(r))
            }
            Type::Int => {
                let (a, b) = (va.as_int()?, vb.as_int()?);
                let r = match op {
                    ArithOp::Add => self.solver.int_add(a, b),
                    ArithOp::Sub => self.solver.int_sub(a, b),
                    ArithOp::Mul => self.solver.int_mul(a, b),
                    ArithOp::Div => self.solver.int_div(a, b),
                    ArithOp::Rem => self.solver.int_rem(a, b),
                };
                Ok(SymbolicValue::Int(r))
            }
            Type::Real => {
                let (a, b) = (va.as_real()?, vb.as_real()?);
                let r = match op {
                    ArithOp::Add => self.solver.real_add(a, b),
                    ArithOp::Sub => self.solver.real_sub(a, b),
                    ArithOp::Mul => self.solver.real_mul(a, b),
                    ArithOp::Div => self.solver.real_div(a, b),
                    ArithOp::Rem => return Err(CoreError::unsupported("evaluator", "real rem")),
                };
                Ok(SymbolicValue::Real(r))
            }
            other => Err(CoreError::invariant(format!("arithmetic on non-numeric type {other}"))),
        }
    }

    fn evaluate_bitop(&mut self, op: BitOp, lhs: &Expr, rhs: &Expr, env: &mut ArgumentEnv<S>) -> CoreResult<SymbolicValue<S>> {
        let va = self.evaluate(lhs, env)?;
        let vb = self.evaluate(rhs, env)?;
        let (a, b) = (va.as_bv()?, vb.as_bv()?);
        let r = match op {
            BitOp::And => self.solver.bv_and(a, b),
            BitOp::Or => self.solver.bv_or(a, b),
            BitOp::Xor => self.solver.bv_xor(a, b),
        };
        Ok(SymbolicValue::Bv(r))
    }

    fn evaluate_cmp(&mut self, op: CmpOp, lhs: &Expr, rhs: &Expr, env: &mut ArgumentEnv<S>) -> CoreResult<SymbolicValue<S>> {
        let va = self.evaluate(lhs, env)?;
        let vb = self.evaluate(rhs, env)?;
        match &lhs.ty {
            Type::BitVec { signed, .. } => {
                let (a, b) = (va.as_bv()?, vb.as_bv()?);
                let r = match op {
                    CmpOp::Lt => self.solver.bv_lt(a, b, *signed),
                    CmpOp::Le => self.solver.bv_le(a, b, *signed),
                    CmpOp::Gt => self.solver.bv_gt(a, b, *signed),
                    CmpOp::Ge => self.solver.bv_ge(a, b, *signed),
                };
                Ok(SymbolicValue::Bool(r))
            }
            Type::Int => {
                let (a, b) = (va.as_int()?, vb.as_int()?);
                let r = match op {
                    CmpOp::Lt => self.solver.int_lt(a, b),
                    CmpOp::Le => self.solver.int_le(a, b),
                    CmpOp::Gt => self.solver.int_gt(a, b),
                    CmpOp::Ge => self.solver.int_ge(a, b),
                };
                Ok(SymbolicValue::Bool(r))
            }
            Type::Real => {
                let (a, b) = (va.as_real()?, vb.as_real()?);
                let r = match op {
                    CmpOp::Lt => self.solver.real_lt(a, b),
                    CmpOp::Le => self.solver.real_le(a, b),
                    CmpOp::Gt => self.solver.real_gt(a, b),
                    CmpOp::Ge => self.solver.real_ge(a, b),
                };
                Ok(SymbolicValue::Bool(r))
            }
            other => Err(CoreError::invariant(format!("comparison on non-ordered type {other}"))),
        }
    }

    fn evaluate_union_create(
        &mut self,
        union_ty: &Type,
        case: &str,
        payload: &Expr,
        env: &mut ArgumentEnv<S>,
    ) -> CoreResult<SymbolicValue<S>> {
        let cases = match union_ty {
            Type::Union(cases) => cases,
            other => return Err(CoreError::invariant(format!("union_create target has non-union type {other}"))),
        };
        let active_payload = self.evaluate(payload, env)?;
        let mut tags = Vec::with_capacity(cases.len());
        let mut payloads = Vec::with_capacity(cases.len());
        for (name, case_ty) in cases {
            let is_active = name == case;
            let tag = self.solver.bool_const(is_active);
            tags.push((name.clone(), tag));
            let value = if is_active {
                active_payload.clone()
            } else {
                self.default_symbolic(case_ty)?
            };
            payloads.push((name.clone(), value));
        }
        Ok(SymbolicValue::Union(UnionValue { tags, payloads }))
    }

    fn evaluate_union_match(
        &mut self,
        scrutinee: &Expr,
        arms: &[crate::ast::UnionArm],
        env: &mut ArgumentEnv<S>,
    ) -> CoreResult<SymbolicValue<S>> {
        let scrutinee_value = self.evaluate(scrutinee, env)?;
        let union = scrutinee_value.as_union()?.clone();
        let mut result: Option<SymbolicValue<S>> = None;
        for (i, arm) in arms.iter().enumerate() {
            let (_, tag) = &union.tags[i];
            let (_, payload) = &union.payloads[i];
            env.bind_value(arm.bound_arg, payload.clone());
            let body_value = self.evaluate(&arm.body, env)?;
            result = Some(match result {
                None => body_value,
                Some(acc) => acc.merge(self.solver, tag, &body_value)?,
            });
        }
        result.ok_or_else(|| CoreError::invariant("union_match has no arms"))
    }

    fn evaluate_list_create(&mut self, list_ty: &Type, items: &[Expr], env: &mut ArgumentEnv<S>) -> CoreResult<SymbolicValue<S>> {
        let elem_ty = match list_ty {
            Type::List(t) => (**t).clone(),
            other => return Err(CoreError::invariant(format!("list_create target has non-list type {other}"))),
        };
        if items.len() as u32 > self.list_max_length {
            return Err(CoreError::invariant(format!(
                "list literal has {} elements, exceeding the configured maximum of {}",
                items.len(),
                self.list_max_length
            )));
        }
        let mut slots = Vec::with_capacity(self.list_max_length as usize);
        for item in items {
            let value = self.evaluate(item, env)?;
            let present = self.bool_true()?;
            slots.push(OptionValue {
                present,
                payload: Box::new(value),
            });
        }
        while slots.len() < self.list_max_length as usize {
            let present = self.solver.bool_const(false);
            let payload = self.default_symbolic(&elem_ty)?;
            slots.push(OptionValue {
                present,
                payload: Box::new(payload),
            });
        }
        Ok(SymbolicValue::List(ListValue { slots }))
    }

    /// The default symbolic value for `ty`, backing absent-key
    /// `ConstMap` lookups, unused list slots, and `None` options (§4.5
    /// "Finite-map get").
    fn default_symbolic(&mut self, ty: &Type) -> CoreResult<SymbolicValue<S>> {
        let value = default_const(ty)?;
        self.const_to_symbolic(ty, &value)
    }

    fn const_to_symbolic(&mut self, ty: &Type, value: &ConstValue) -> CoreResult<SymbolicValue<S>> {
        match (ty, value) {
            (Type::Record(field_tys), ConstValue::Record(fields)) => {
                let mut out = Vec::with_capacity(field_tys.len());
                for (name, fty) in field_tys {
                    let found = fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone());
                    let field_value = match found {
                        Some(v) => v,
                        None => default_const(fty)?,
                    };
                    out.push((name.clone(), self.const_to_symbolic(fty, &field_value)?));
                }
                Ok(SymbolicValue::Record(out))
            }
            (Type::Union(cases), ConstValue::Union { case, payload }) => {
                let mut tags = Vec::with_capacity(cases.len());
                let mut payloads = Vec::with_capacity(cases.len());
                for (name, case_ty) in cases {
                    let is_active = name == case;
                    let tag = self.solver.bool_const(is_active);
                    tags.push((name.clone(), tag));
                    let payload_value = if is_active {
                        self.const_to_symbolic(case_ty, payload)?
                    } else {
                        self.default_symbolic(case_ty)?
                    };
                    payloads.push((name.clone(), payload_value));
                }
                Ok(SymbolicValue::Union(UnionValue { tags, payloads }))
            }
            (Type::Option(inner), ConstValue::Option(opt)) => match opt {
                Some(v) => {
                    let payload = self.const_to_symbolic(inner, v)?;
                    let present = self.bool_true()?;
                    Ok(SymbolicValue::Option(OptionValue {
                        present,
                        payload: Box::new(payload),
                    }))
                }
                None => {
                    let payload = self.default_symbolic(inner)?;
                    let present = self.solver.bool_const(false);
                    Ok(SymbolicValue::Option(OptionValue {
                        present,
                        payload: Box::new(payload),
                    }))
                }
            },
            (Type::List(inner), ConstValue::List(items)) => {
                if items.len() as u32 > self.list_max_length {
                    return Err(CoreError::invariant("list literal exceeds configured maximum length"));
                }
                let mut slots = Vec::with_capacity(self.list_max_length as usize);
                for item in items {
                    let payload = self.const_to_symbolic(inner, item)?;
                    let present = self.bool_true()?;
                    slots.push(OptionValue {
                        present,
                        payload: Box::new(payload),
                    });
                }
                while slots.len() < self.list_max_length as usize {
                    let payload = self.default_symbolic(inner)?;
                    let present = self.solver.bool_const(false);
                    slots.push(OptionValue {
                        present,
                        payload: Box::new(payload),
                    });
                }
                Ok(SymbolicValue::List(ListValue { slots }))
            }
            (Type::ConstMap(k, v), ConstValue::ConstMap(entries)) => {
                let keys = self.const_keys.keys_for(k, v);
                let mut map = BTreeMap::new();
                for key in keys {
                    let found = entries.iter().find(|(ek, _)| ek == &key).map(|(_, v)| v.clone());
                    let entry_value = match found {
                        Some(v) => v,
                        None => default_const(v)?,
                    };
                    map.insert(key.clone(), self.const_to_symbolic(v, &entry_value)?);
                }
                Ok(SymbolicValue::ConstMap(map))
            }
            (Type::Map(k, v), ConstValue::Map(entries)) => {
                let (_, mut backing) = self.solver.fresh_array(k, v)?;
                for (ek, ev) in entries {
                    let key_dyn = self.solver.const_of(ek)?;
                    let value_sym = self.const_to_symbolic(v, ev)?;
                    let value_dyn = self.symbolic_to_dynamic(&value_sym)?;
                    backing = self.solver.array_store(&backing, &key_dyn, &value_dyn);
                }
                Ok(SymbolicValue::Array(ArrayMap {
                    backing,
                    key_ty: (**k).clone(),
                    value_ty: (**v).clone(),
                }))
            }
            _ => {
                let dynamic = self.solver.const_of(value)?;
                self.dynamic_to_value(ty, &dynamic)
            }
        }
    }

    fn dynamic_to_value(&self, ty: &Type, d: &S::Dynamic) -> CoreResult<SymbolicValue<S>> {
        match ty {
            Type::Bool => self
                .solver
                .as_bool(d)
                .map(SymbolicValue::Bool)
                .ok_or_else(|| CoreError::invariant("solver value is not a bool")),
            Type::BitVec { .. } => self
                .solver
                .as_bv(d)
                .map(SymbolicValue::Bv)
                .ok_or_else(|| CoreError::invariant("solver value is not a bitvec")),
            Type::Char => self
                .solver
                .as_char(d)
                .map(SymbolicValue::Char)
                .ok_or_else(|| CoreError::invariant("solver value is not a char")),
            Type::Int => self
                .solver
                .as_int(d)
                .map(SymbolicValue::Int)
                .ok_or_else(|| CoreError::invariant("solver value is not an int")),
            Type::Real => self
                .solver
                .as_real(d)
                .map(SymbolicValue::Real)
                .ok_or_else(|| CoreError::invariant("solver value is not a real")),
            Type::Seq(_) => self
                .solver
                .as_seq(d)
                .map(SymbolicValue::Seq)
                .ok_or_else(|| CoreError::invariant("solver value is not a sequence")),
            Type::Map(k, v) => self
                .solver
                .as_array(d)
                .map(|backing| {
                    SymbolicValue::Array(ArrayMap {
                        backing,
                        key_ty: (**k).clone(),
                        value_ty: (**v).clone(),
                    })
                })
                .ok_or_else(|| CoreError::invariant("solver value is not an array")),
            other => Err(CoreError::invariant(format!(
                "structured type {other} has no flat solver representation"
            ))),
        }
    }

    pub(crate) fn symbolic_to_dynamic(&self, value: &SymbolicValue<S>) -> CoreResult<S::Dynamic> {
        match value {
            SymbolicValue::Bool(b) => Ok(self.solver.from_bool(b)),
            SymbolicValue::Bv(b) => Ok(self.solver.from_bv(b)),
            SymbolicValue::Char(c) => Ok(self.solver.from_char(c)),
            SymbolicValue::Int(i) => Ok(self.solver.from_int(i)),
            SymbolicValue::Real(r) => Ok(self.solver.from_real(r)),
            SymbolicValue::Seq(s) => Ok(self.solver.from_seq(s)),
            SymbolicValue::Array(a) => Ok(self.solver.from_array(&a.backing)),
            other => Err(CoreError::invariant(format!(
                "structured value {} has no flat solver representation",
                crate::value::symbolic_variant_name(other)
            ))),
        }
    }

    /// Allocates one fresh solver variable per leaf primitive in `ty`,
    /// pushing each into `leaves` in allocation order (§5 "Ordering").
    /// Union alternatives share a single bit-vector selector rather than
    /// one independent Boolean per tag, so the solver is free to pick any
    /// alternative without an external exactly-one-hot constraint.
    fn alloc_arbitrary(&mut self, ty: &Type, leaves: &mut Vec<VarId>) -> CoreResult<SymbolicValue<S>> {
        match ty {
            Type::Bool | Type::BitVec { .. } | Type::Int | Type::Real | Type::Char | Type::Seq(_) => {
                let (id, dynamic) = self.solver.fresh_var(ty)?;
                leaves.push(id);
                self.dynamic_to_value(ty, &dynamic)
            }
            Type::Map(k, v) => {
                let (id, backing) = self.solver.fresh_array(k, v)?;
                leaves.push(id);
                Ok(SymbolicValue::Array(ArrayMap {
                    backing,
                    key_ty: (**k).clone(),
                    value_ty: (**v).clone(),
                }))
            }
            Type::ConstMap(k, v) => {
                let keys = self.const_keys.keys_for(k, v);
                let mut map = BTreeMap::new();
                for key in keys {
                    map.insert(key, self.alloc_arbitrary(v, leaves)?);
                }
                Ok(SymbolicValue::ConstMap(map))
            }
            Type::Record(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, fty) in fields {
                    out.push((name.clone(), self.alloc_arbitrary(fty, leaves)?));
                }
                Ok(SymbolicValue::Record(out))
            }
            Type::Union(cases) => {
                let width = selector_width(cases.len());
                let (sel_id, sel_dynamic) = self.solver.fresh_var(&Type::BitVec { width, signed: false })?;
                leaves.push(sel_id);
                let sel_bv = self
                    .solver
                    .as_bv(&sel_dynamic)
                    .ok_or_else(|| CoreError::invariant("union selector variable is not a bitvec"))?;
                let mut tags = Vec::with_capacity(cases.len());
                let mut payloads = Vec::with_capacity(cases.len());
                for (idx, (name, case_ty)) in cases.iter().enumerate() {
                    let key_const = ConstValue::BitVec {
                        value: idx as i128,
                        width,
                        signed: false,
                    };
                    let key_dynamic = self.solver.const_of(&key_const)?;
                    let key_bv = self
                        .solver
                        .as_bv(&key_dynamic)
                        .ok_or_else(|| CoreError::invariant("union case index literal is not a bitvec"))?;
                    let tag = self.solver.bv_eq(&sel_bv, &key_bv);
                    tags.push((name.clone(), tag));
                    payloads.push((name.clone(), self.alloc_arbitrary(case_ty, leaves)?));
                }
                Ok(SymbolicValue::Union(UnionValue { tags, payloads }))
            }
            Type::Option(inner) => {
                let (present_id, present_dynamic) = self.solver.fresh_var(&Type::Bool)?;
                leaves.push(present_id);
                let present = self
                    .solver
                    .as_bool(&present_dynamic)
                    .ok_or_else(|| CoreError::invariant("option presence variable is not a bool"))?;
                let payload = self.alloc_arbitrary(inner, leaves)?;
                Ok(SymbolicValue::Option(OptionValue {
                    present,
                    payload: Box::new(payload),
                }))
            }
            Type::List(inner) => {
                let mut slots = Vec::with_capacity(self.list_max_length as usize);
                for _ in 0..self.list_max_length {
                    let (present_id, present_dynamic) = self.solver.fresh_var(&Type::Bool)?;
                    leaves.push(present_id);
                    let present = self
                        .solver
                        .as_bool(&present_dynamic)
                        .ok_or_else(|| CoreError::invariant("list slot presence variable is not a bool"))?;
                    let payload = self.alloc_arbitrary(inner, leaves)?;
                    slots.push(OptionValue {
                        present,
                        payload: Box::new(payload),
                    });
                }
                Ok(SymbolicValue::List(ListValue { slots }))
            }
        }
    }
}

/// Type-dispatched structural equality (§4.5 "Equality": "structural
/// equality recursively conjoins field/element equalities").
fn structural_eq<S: Solver>(a: &SymbolicValue<S>, b: &SymbolicValue<S>, solver: &mut S) -> CoreResult<S::Bool> {
    match (a, b) {
        (SymbolicValue::Bool(x), SymbolicValue::Bool(y)) => Ok(solver.iff(x, y)),
        (SymbolicValue::Bv(x), SymbolicValue::Bv(y)) => Ok(solver.bv_eq(x, y)),
        (SymbolicValue::Char(x), SymbolicValue::Char(y)) => Ok(solver.char_eq(x, y)),
        (SymbolicValue::Int(x), SymbolicValue::Int(y)) => Ok(solver.int_eq(x, y)),
        (SymbolicValue::Real(x), SymbolicValue::Real(y)) => Ok(solver.real_eq(x, y)),
        (SymbolicValue::Seq(x), SymbolicValue::Seq(y)) => Ok(solver.seq_eq(x, y)),
        (SymbolicValue::Array(x), SymbolicValue::Array(y)) => Ok(solver.array_eq(&x.backing, &y.backing)),
        (SymbolicValue::Record(x), SymbolicValue::Record(y)) => {
            if x.len() != y.len() {
                return Err(CoreError::invariant("structural equality requires identical record field sets"));
            }
            let mut acc = solver.bool_const(true);
            for ((n1, v1), (n2, v2)) in x.iter().zip(y.iter()) {
                if n1 != n2 {
                    return Err(CoreError::invariant("structural equality requires identical record field sets"));
                }
                let eq = structural_eq(v1, v2, solver)?;
                acc = solver.and(&acc, &eq);
            }
            Ok(acc)
        }
        (SymbolicValue::Union(x), SymbolicValue::Union(y)) => {
            if x.tags.len() != y.tags.len() {
                return Err(CoreError::invariant("structural equality requires identical union alternatives"));
            }
            let mut acc = solver.bool_const(true);
            for i in 0..x.tags.len() {
                let same_tag = solver.iff(&x.tags[i].1, &y.tags[i].1);
                let payload_eq = structural_eq(&x.payloads[i].1, &y.payloads[i].1, solver)?;
                let true_const = solver.bool_const(true);
                let case_ok = solver.ite_bool(&x.tags[i].1, &payload_eq, &true_const);
                let combined = solver.and(&same_tag, &case_ok);
                acc = solver.and(&acc, &combined);
            }
            Ok(acc)
        }
        (SymbolicValue::Option(x), SymbolicValue::Option(y)) => {
            let same_present = solver.iff(&x.present, &y.present);
            let payload_eq = structural_eq(&x.payload, &y.payload, solver)?;
            let true_const = solver.bool_const(true);
            let case_ok = solver.ite_bool(&x.present, &payload_eq, &true_const);
            Ok(solver.and(&same_present, &case_ok))
        }
        (SymbolicValue::ConstMap(x), SymbolicValue::ConstMap(y)) => {
            let mut acc = solver.bool_const(true);
            for (key, vx) in x.iter() {
                if let Some(vy) = y.get(key) {
                    let eq = structural_eq(vx, vy, solver)?;
                    acc = solver.and(&acc, &eq);
                }
            }
            Ok(acc)
        }
        (SymbolicValue::List(x), SymbolicValue::List(y)) => {
            if x.slots.len() != y.slots.len() {
                return Err(CoreError::invariant("structural equality requires equal configured maximum length"));
            }
            let mut acc = solver.bool_const(true);
            for (sx, sy) in x.slots.iter().zip(y.slots.iter()) {
                let same_present = solver.iff(&sx.present, &sy.present);
                let payload_eq = structural_eq(&sx.payload, &sy.payload, solver)?;
                let true_const = solver.bool_const(true);
                let case_ok = solver.ite_bool(&sx.present, &payload_eq, &true_const);
                let combined = solver.and(&same_present, &case_ok);
                acc = solver.and(&acc, &combined);
            }
            Ok(acc)
        }
        (a, b) => Err(CoreError::invariant(format!(
            "cannot compare symbolic value variants {} and {}",
            crate::value::symbolic_variant_name::<S>(a),
            crate::value::symbolic_variant_name::<S>(b)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{node, ArithOp};
    use crate::solver::z3_backend::Z3Solver;

    #[test]
    fn arbitrary_bitvec_registers_one_leaf() {
        let mut solver = Z3Solver::new();
        let keys = ConstantKeyCollector::new();
        let mut eval = Evaluator::new(&mut solver, &keys, 5);
        let mut env = ArgumentEnv::new();
        let x = node(Type::u8(), NodeKind::Arbitrary);
        eval.evaluate(&x, &mut env).unwrap();
        let (registry, types) = eval.into_registry();
        assert_eq!(registry.handles(x.id).unwrap().len(), 1);
        assert_eq!(types.get(&x.id), Some(&Type::u8()));
    }

    #[test]
    fn arithmetic_and_comparison_round_trip_through_the_solver() {
        let mut solver = Z3Solver::new();
        let keys = ConstantKeyCollector::new();
        let mut eval = Evaluator::new(&mut solver, &keys, 5);
        let mut env = ArgumentEnv::new();
        let x = node(Type::u8(), NodeKind::Arbitrary);
        let three = node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value: 3, width: 8, signed: false }));
        let product = node(
            Type::u8(),
            NodeKind::Arith {
                op: ArithOp::Mul,
                lhs: x.clone(),
                rhs: three,
            },
        );
        let twenty_one = node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value: 21, width: 8, signed: false }));
        let constraint = node(
            Type::Bool,
            NodeKind::Eq {
                lhs: product,
                rhs: twenty_one,
            },
        );
        let value = eval.evaluate(&constraint, &mut env).unwrap();
        let check_result = solver.check(value.as_bool().unwrap());
        assert!(matches!(check_result, Ok(Some(_))));
    }

    #[test]
    fn if_node_merges_branches_by_the_guards_value() {
        let mut solver = Z3Solver::new();
        let keys = ConstantKeyCollector::new();
        let mut eval = Evaluator::new(&mut solver, &keys, 5);
        let mut env = ArgumentEnv::new();
        let flag = node(Type::Bool, NodeKind::Arbitrary);
        let ten = node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value: 10, width: 8, signed: false }));
        let twenty = node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value: 20, width: 8, signed: false }));
        let if_expr = node(
            Type::u8(),
            NodeKind::If {
                guard: flag.clone(),
                then_branch: ten,
                else_branch: twenty,
            },
        );
        let if_value = eval.evaluate(&if_expr, &mut env).unwrap();
        let flag_value = eval.evaluate(&flag, &mut env).unwrap();
        let ten_const = node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value: 10, width: 8, signed: false }));
        let ten_value = eval.evaluate(&ten_const, &mut env).unwrap();
        let eq = solver.bv_eq(if_value.as_bv().unwrap(), ten_value.as_bv().unwrap());
        let not_flag = solver.not(flag_value.as_bool().unwrap());
        let implication = solver.or(&not_flag, &eq);
        let negated = solver.not(&implication);
        assert!(solver.check(&negated).unwrap().is_none());
    }
}
