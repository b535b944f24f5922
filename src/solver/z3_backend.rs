//! SMT Backend (§4.1, §6 "Decision procedure backends", (i)).
//!
//! Wraps the `z3` crate (crates.io, context-free API). Every `Solver`
//! associated type here is a thin alias over a `z3::ast` wrapper; nothing
//! outside this module ever names a `z3::*` type directly (the value
//! lattice in `crate::value` is generic over `Solver` and only ever sees
//! the associated types).
//!
//! **Restrictions inherited from the backend, not the evaluator.** The
//! evaluator's `Seq` operations are only realizable here over Z3's native
//! string sort, so `Solver::Seq` is `z3::ast::String` — a `Type::Seq(T)`
//! where `T != Char` cannot be backed by this solver (surfaces as
//! `CoreError::Unsupported`). `Char` is represented as a 32-bit bit-vector
//! holding the Unicode scalar value, since this crate version has no
//! native character sort binding (see DESIGN.md).

use crate::config::OptimizationContext;
use crate::error::{CoreError, CoreResult};
use crate::solver::{Solver, VarId};
use crate::types::{ConstValue, Type};
use std::collections::HashMap;
use std::str::FromStr;
use z3::ast::{Array as Z3Array, Ast, Bool as Z3Bool, Dynamic, Int as Z3Int, Real as Z3Real, String as Z3String, BV};
use z3::{Optimize, SatResult, Sort};

const BACKEND_NAME: &str = "z3";

pub struct Z3Solver {
    solver: z3::Solver,
    vars: HashMap<VarId, Dynamic>,
    next_var: VarId,
    timeout_ms: Option<u32>,
    optimization_context: OptimizationContext,
}

impl Z3Solver {
    pub fn new() -> Self {
        Z3Solver {
            solver: z3::Solver::new(),
            vars: HashMap::new(),
            next_var: 0,
            timeout_ms: None,
            optimization_context: OptimizationContext::Optimization,
        }
    }

    /// Selects which internal context `maximize`/`minimize` dispatch to
    /// (SPEC_FULL §D). `Optimization` uses Z3's dedicated `Optimize`
    /// context directly; `Solving` instead drives the plain satisfiability
    /// context through a bounded binary search, the same strategy the
    /// decision-diagram backend uses (its only option, since it has no
    /// native optimizing context at all).
    pub fn set_optimization_context(&mut self, context: OptimizationContext) {
        self.optimization_context = context;
    }

    /// Applies a caller-provided deadline (§5 "Suspension/blocking") via
    /// Z3's own `timeout` parameter, in milliseconds. A solver that times
    /// out is reported to the caller as `CoreError::Timeout` and must be
    /// discarded — this crate never reuses a `Z3Solver` after that.
    pub fn set_timeout(&mut self, timeout: Option<std::time::Duration>) {
        let Some(timeout) = timeout else { return };
        let ms = timeout.as_millis().min(u32::MAX as u128) as u32;
        let mut params = z3::Params::new();
        params.set_u32("timeout", ms);
        self.solver.set_params(&params);
        self.timeout_ms = Some(ms);
    }

    /// `Unknown` results from the solver-specific `timeout` param are
    /// reported as `CoreError::Timeout`, not `SolverFailure` — every
    /// other `Unknown` reason is a genuine backend failure.
    fn unknown_to_error(&self, reason: Option<String>) -> CoreError {
        let reason = reason.unwrap_or_else(|| "z3 returned unknown".to_string());
        if reason.to_lowercase().contains("timeout") {
            CoreError::Timeout {
                elapsed_ms: self.timeout_ms.unwrap_or(0) as u64,
            }
        } else {
            CoreError::SolverFailure(reason)
        }
    }

    fn alloc_var(&mut self, term: Dynamic) -> VarId {
        let id = self.next_var;
        self.next_var += 1;
        self.vars.insert(id, term);
        id
    }

    fn sort_of(ty: &Type) -> CoreResult<Sort> {
        Ok(match ty {
            Type::Bool => Sort::bool(),
            Type::BitVec { width, .. } => Sort::bitvector(*width),
            Type::Int => Sort::int(),
            Type::Real => Sort::real(),
            Type::Char => Sort::bitvector(32),
            Type::Seq(elem) if matches!(**elem, Type::Char) => Sort::string(),
            Type::Map(_, v) => Sort::array(&Sort::int(), &Self::sort_of(v)?),
            other => {
                return Err(CoreError::unsupported(BACKEND_NAME, leak_type_name(other)));
            }
        })
    }

    fn dynamic_const(&mut self, ty: &Type, name: &str) -> CoreResult<Dynamic> {
        let sort = Self::sort_of(ty)?;
        Ok(Dynamic::fresh_const(name, &sort))
    }

    fn optimize_via_dedicated_context(
        &mut self,
        objective: &Dynamic,
        constraint: &Z3Bool,
        want_max: bool,
    ) -> CoreResult<Option<z3::Model>> {
        let opt = Optimize::new();
        if let Some(ms) = self.timeout_ms {
            let mut params = z3::Params::new();
            params.set_u32("timeout", ms);
            opt.set_params(&params);
        }
        opt.assert(constraint);
        if want_max {
            opt.maximize(objective);
        } else {
            opt.minimize(objective);
        }
        match opt.check(&[]) {
            SatResult::Sat => Ok(opt.get_model()),
            SatResult::Unsat => Ok(None),
            SatResult::Unknown => Err(self.unknown_to_error(opt.get_reason_unknown())),
        }
    }

    /// Binary search over the plain satisfiability context: repeatedly
    /// assert a candidate bound on `objective` and narrow it by whether
    /// the bounded query is still sat, the same strategy
    /// `dd_backend::DdSolver::optimize` uses (there, unconditionally,
    /// since the decision-diagram backend has no dedicated optimizing
    /// context to fall back on). Only a bit-vector objective has the
    /// finite, known range this search needs; any other objective type
    /// under this context is unsupported.
    fn optimize_via_binary_search(
        &mut self,
        objective: &Dynamic,
        constraint: &Z3Bool,
        want_max: bool,
    ) -> CoreResult<Option<z3::Model>> {
        let bv = objective
            .as_bv()
            .ok_or_else(|| CoreError::unsupported(BACKEND_NAME, "non-bitvector optimization objective under the plain solving context"))?;
        let width = bv.get_size();
        let (mut lo, mut hi): (i128, i128) = (0, (1i128 << width) - 1);
        let mut best: Option<z3::Model> = None;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let bound = BV::from_i64(mid as i64, width);
            let cmp = if want_max { bv.bvuge(&bound) } else { bv.bvule(&bound) };
            self.solver.push();
            self.solver.assert(constraint);
            self.solver.assert(&cmp);
            let outcome = match self.solver.check() {
                SatResult::Sat => self.solver.get_model(),
                SatResult::Unsat => None,
                SatResult::Unknown => {
                    let reason = self.solver.get_reason_unknown();
                    self.solver.pop(1);
                    return Err(self.unknown_to_error(reason));
                }
            };
            self.solver.pop(1);
            if let Some(model) = outcome {
                best = model;
                if want_max {
                    lo = mid + 1;
                } else {
                    hi = mid - 1;
                }
            } else if want_max {
                hi = mid - 1;
            } else {
                lo = mid + 1;
            }
        }
        Ok(best)
    }
}

impl Default for Z3Solver {
    fn default() -> Self {
        Z3Solver::new()
    }
}

/// `CoreError::Unsupported` wants a `&'static str`; the operator names we
/// hand it are all compile-time known, but `Type`'s `Display` impl isn't,
/// so this renders a fixed label per family instead of leaking the full
/// structural type.
fn leak_type_name(ty: &Type) -> &'static str {
    match ty {
        Type::Bool => "bool",
        Type::BitVec { .. } => "bitvec",
        Type::Int => "int",
        Type::Real => "real",
        Type::Char => "char",
        Type::Seq(_) => "seq (non-char element)",
        Type::List(_) => "list",
        Type::Option(_) => "option",
        Type::ConstMap(_, _) => "const_map",
        Type::Map(_, _) => "map",
        Type::Record(_) => "record",
        Type::Union(_) => "union",
    }
}

impl Solver for Z3Solver {
    type Bool = Z3Bool;
    type Bv = BV;
    type Int = Z3Int;
    type Real = Z3Real;
    type Char = BV;
    type Seq = Z3String;
    type Array = Z3Array;
    type Dynamic = Dynamic;
    type Model = z3::Model;

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn fresh_var(&mut self, ty: &Type) -> CoreResult<(VarId, Self::Dynamic)> {
        let name = format!("v{}", self.next_var);
        let term = self.dynamic_const(ty, &name)?;
        let id = self.alloc_var(term.clone());
        Ok((id, term))
    }

    fn const_of(&mut self, value: &ConstValue) -> CoreResult<Self::Dynamic> {
        Ok(match value {
            ConstValue::Bool(b) => Dynamic::from_ast(&Z3Bool::from_bool(*b)),
            ConstValue::BitVec { value, width, .. } => {
                Dynamic::from_ast(&BV::from_i64(*value as i64, *width))
            }
            ConstValue::Int(i) => Dynamic::from_ast(&Z3Int::from_i64(*i as i64)),
            ConstValue::Real {
                numerator,
                denominator,
            } => Dynamic::from_ast(&Z3Real::from_real(*numerator as i32, *denominator as i32)),
            ConstValue::Char(c) => Dynamic::from_ast(&BV::from_i64(*c as i64, 32)),
            ConstValue::Seq(chars) => {
                let s: String = chars
                    .iter()
                    .map(|v| match v {
                        ConstValue::Char(c) => *c,
                        _ => '\u{0}',
                    })
                    .collect();
                Dynamic::from_ast(&Z3String::from_str(&s).map_err(|_| {
                    CoreError::invariant("sequence literal contains a NUL character z3 strings cannot encode")
                })?)
            }
            other => {
                return Err(CoreError::unsupported(
                    BACKEND_NAME,
                    leak_type_name(&other.ty()),
                ));
            }
        })
    }

    fn as_bool(&self, d: &Self::Dynamic) -> Option<Self::Bool> {
        d.as_bool()
    }
    fn as_bv(&self, d: &Self::Dynamic) -> Option<Self::Bv> {
        d.as_bv()
    }
    fn as_int(&self, d: &Self::Dynamic) -> Option<Self::Int> {
        d.as_int()
    }
    fn as_real(&self, d: &Self::Dynamic) -> Option<Self::Real> {
        d.as_real()
    }
    fn as_char(&self, d: &Self::Dynamic) -> Option<Self::Char> {
        d.as_bv()
    }
    fn as_seq(&self, d: &Self::Dynamic) -> Option<Self::Seq> {
        d.as_string()
    }
    fn as_array(&self, d: &Self::Dynamic) -> Option<Self::Array> {
        d.as_array()
    }

    fn from_bool(&self, v: &Self::Bool) -> Self::Dynamic {
        Dynamic::from_ast(v)
    }
    fn from_bv(&self, v: &Self::Bv) -> Self::Dynamic {
        Dynamic::from_ast(v)
    }
    fn from_int(&self, v: &Self::Int) -> Self::Dynamic {
        Dynamic::from_ast(v)
    }
    fn from_real(&self, v: &Self::Real) -> Self::Dynamic {
        Dynamic::from_ast(v)
    }
    fn from_char(&self, v: &Self::Char) -> Self::Dynamic {
        Dynamic::from_ast(v)
    }
    fn from_seq(&self, v: &Self::Seq) -> Self::Dynamic {
        Dynamic::from_ast(v)
    }
    fn from_array(&self, v: &Self::Array) -> Self::Dynamic {
        Dynamic::from_ast(v)
    }

    fn bool_const(&mut self, v: bool) -> Self::Bool {
        Z3Bool::from_bool(v)
    }
    fn not(&mut self, a: &Self::Bool) -> Self::Bool {
        a.not()
    }
    fn and(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool {
        Z3Bool::and(&[a, b])
    }
    fn or(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool {
        Z3Bool::or(&[a, b])
    }
    fn iff(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool {
        a.iff(b)
    }

    fn ite_bool(&mut self, g: &Self::Bool, t: &Self::Bool, e: &Self::Bool) -> Self::Bool {
        g.ite(t, e)
    }
    fn ite_bv(&mut self, g: &Self::Bool, t: &Self::Bv, e: &Self::Bv) -> Self::Bv {
        g.ite(t, e)
    }
    fn ite_int(&mut self, g: &Self::Bool, t: &Self::Int, e: &Self::Int) -> Self::Int {
        g.ite(t, e)
    }
    fn ite_real(&mut self, g: &Self::Bool, t: &Self::Real, e: &Self::Real) -> Self::Real {
        g.ite(t, e)
    }
    fn ite_char(&mut self, g: &Self::Bool, t: &Self::Char, e: &Self::Char) -> Self::Char {
        g.ite(t, e)
    }
    fn ite_seq(&mut self, g: &Self::Bool, t: &Self::Seq, e: &Self::Seq) -> Self::Seq {
        g.ite(t, e)
    }
    fn ite_array(&mut self, g: &Self::Bool, t: &Self::Array, e: &Self::Array) -> Self::Array {
        g.ite(t, e)
    }

    fn bv_add(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.bvadd(b)
    }
    fn bv_sub(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.bvsub(b)
    }
    fn bv_mul(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.bvmul(b)
    }
    fn bv_and(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.bvand(b)
    }
    fn bv_or(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.bvor(b)
    }
    fn bv_xor(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.bvxor(b)
    }
    fn bv_not(&mut self, a: &Self::Bv) -> Self::Bv {
        a.bvnot()
    }
    fn bv_le(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        if signed {
            a.bvsle(b)
        } else {
            a.bvule(b)
        }
    }
    fn bv_ge(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        if signed {
            a.bvsge(b)
        } else {
            a.bvuge(b)
        }
    }
    fn bv_lt(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        if signed {
            a.bvslt(b)
        } else {
            a.bvult(b)
        }
    }
    fn bv_gt(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        if signed {
            a.bvsgt(b)
        } else {
            a.bvugt(b)
        }
    }
    fn bv_eq(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bool {
        a._eq(b)
    }
    fn bv_convert(&mut self, a: &Self::Bv, from_width: u32, to_width: u32, signed: bool) -> Self::Bv {
        if to_width > from_width {
            let extra = to_width - from_width;
            if signed {
                a.sign_ext(extra)
            } else {
                a.zero_ext(extra)
            }
        } else if to_width < from_width {
            a.extract(to_width - 1, 0)
        } else {
            a.clone()
        }
    }

    fn int_add(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int {
        Z3Int::add(&[a, b])
    }
    fn int_sub(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int {
        Z3Int::sub(&[a, b])
    }
    fn int_mul(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int {
        Z3Int::mul(&[a, b])
    }
    fn int_div(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int {
        a.div(b)
    }
    fn int_rem(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int {
        a.rem(b)
    }
    fn int_le(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool {
        a.le(b)
    }
    fn int_ge(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool {
        a.ge(b)
    }
    fn int_lt(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool {
        a.lt(b)
    }
    fn int_gt(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool {
        a.gt(b)
    }
    fn int_eq(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool {
        a._eq(b)
    }

    fn real_add(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real {
        Z3Real::add(&[a, b])
    }
    fn real_sub(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real {
        Z3Real::sub(&[a, b])
    }
    fn real_mul(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real {
        Z3Real::mul(&[a, b])
    }
    fn real_div(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real {
        a.div(b)
    }
    fn real_le(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool {
        a.le(b)
    }
    fn real_ge(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool {
        a.ge(b)
    }
    fn real_lt(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool {
        a.lt(b)
    }
    fn real_gt(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool {
        a.gt(b)
    }
    fn real_eq(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool {
        a._eq(b)
    }

    fn seq_concat(&mut self, a: &Self::Seq, b: &Self::Seq) -> Self::Seq {
        Z3String::concat(&[a, b])
    }
    fn seq_length(&mut self, a: &Self::Seq) -> Self::Int {
        a.length()
    }
    fn seq_at(&mut self, a: &Self::Seq, index: &Self::Int) -> Self::Seq {
        a.at(index)
    }
    fn seq_contains(&mut self, a: &Self::Seq, elem: &Self::Seq) -> Self::Bool {
        a.contains(elem)
    }
    fn seq_index_of(&mut self, a: &Self::Seq, elem: &Self::Seq, from: &Self::Int) -> Self::Int {
        a.index_of(elem, from)
    }
    fn seq_slice(&mut self, a: &Self::Seq, offset: &Self::Int, length: &Self::Int) -> Self::Seq {
        a.substr(offset, length)
    }
    fn seq_replace(&mut self, a: &Self::Seq, from: &Self::Seq, to: &Self::Seq) -> Self::Seq {
        a.replace(from, to)
    }
    fn seq_eq(&mut self, a: &Self::Seq, b: &Self::Seq) -> Self::Bool {
        a._eq(b)
    }
    fn char_const(&mut self, c: char) -> Self::Char {
        BV::from_i64(c as i64, 32)
    }
    fn char_eq(&mut self, a: &Self::Char, b: &Self::Char) -> Self::Bool {
        a._eq(b)
    }

    fn array_select(&mut self, a: &Self::Array, key: &Self::Dynamic) -> Self::Dynamic {
        a.select(key)
    }
    fn array_store(&mut self, a: &Self::Array, key: &Self::Dynamic, value: &Self::Dynamic) -> Self::Array {
        a.store(key, value)
    }
    fn array_eq(&mut self, a: &Self::Array, b: &Self::Array) -> Self::Bool {
        a._eq(b)
    }
    fn fresh_array(&mut self, key_ty: &Type, value_ty: &Type) -> CoreResult<(VarId, Self::Array)> {
        let domain = Self::sort_of(key_ty)?;
        let range = Self::sort_of(value_ty)?;
        let name = format!("v{}", self.next_var);
        let arr = Z3Array::fresh_const(&name, &domain, &range);
        let id = self.alloc_var(Dynamic::from_ast(&arr));
        Ok((id, arr))
    }

    fn check(&mut self, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>> {
        self.solver.assert(constraint);
        match self.solver.check() {
            SatResult::Sat => Ok(self.solver.get_model()),
            SatResult::Unsat => Ok(None),
            SatResult::Unknown => Err(self.unknown_to_error(self.solver.get_reason_unknown())),
        }
    }

    fn maximize(&mut self, objective: &Self::Dynamic, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>> {
        match self.optimization_context {
            OptimizationContext::Optimization => self.optimize_via_dedicated_context(objective, constraint, true),
            OptimizationContext::Solving => self.optimize_via_binary_search(objective, constraint, true),
        }
    }

    fn minimize(&mut self, objective: &Self::Dynamic, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>> {
        match self.optimization_context {
            OptimizationContext::Optimization => self.optimize_via_dedicated_context(objective, constraint, false),
            OptimizationContext::Solving => self.optimize_via_binary_search(objective, constraint, false),
        }
    }

    fn get(&self, model: &Self::Model, var: VarId, declared_type: &Type) -> CoreResult<ConstValue> {
        let term = self
            .vars
            .get(&var)
            .ok_or_else(|| CoreError::invariant(format!("no solver variable registered for var id {var}")))?;
        let evaluated = model
            .eval(term, true)
            .ok_or_else(|| CoreError::SolverFailure(format!("model has no interpretation for var id {var}")))?;
        dynamic_to_const(&evaluated, declared_type)
    }
}

/// Parses the model's native representation of `d` into the primitive
/// typed by `declared_type` (§4.1 "Model extraction"); signed bit-vectors
/// are interpreted two's-complement via `as_i64`.
fn dynamic_to_const(d: &Dynamic, declared_type: &Type) -> CoreResult<ConstValue> {
    match declared_type {
        Type::Bool => d
            .as_bool()
            .and_then(|b| b.as_bool())
            .map(ConstValue::Bool)
            .ok_or_else(|| CoreError::SolverFailure("expected a concrete bool in the model".into())),
        Type::BitVec { width, signed } => {
            let bv = d
                .as_bv()
                .ok_or_else(|| CoreError::SolverFailure("expected a bit-vector in the model".into()))?;
            let value = if *signed {
                bv.as_i64()
                    .ok_or_else(|| CoreError::SolverFailure("bit-vector model value not concrete".into()))?
                    as i128
            } else {
                bv.as_u64()
                    .ok_or_else(|| CoreError::SolverFailure("bit-vector model value not concrete".into()))?
                    as i128
            };
            Ok(ConstValue::BitVec {
                value,
                width: *width,
                signed: *signed,
            })
        }
        Type::Int => d
            .as_int()
            .and_then(|i| i.as_i64())
            .map(|i| ConstValue::Int(i as i128))
            .ok_or_else(|| CoreError::SolverFailure("expected a concrete int in the model".into())),
        Type::Real => {
            let r = d
                .as_real()
                .ok_or_else(|| CoreError::SolverFailure("expected a real in the model".into()))?;
            let (num, den) = r
                .as_real()
                .ok_or_else(|| CoreError::SolverFailure("real model value not concrete".into()))?;
            Ok(ConstValue::Real {
                numerator: num,
                denominator: den,
            })
        }
        Type::Char => {
            let bv = d
                .as_bv()
                .ok_or_else(|| CoreError::SolverFailure("expected a char bit-vector in the model".into()))?;
            let scalar = bv
                .as_u64()
                .ok_or_else(|| CoreError::SolverFailure("char model value not concrete".into()))?;
            char::from_u32(scalar as u32)
                .map(ConstValue::Char)
                .ok_or_else(|| CoreError::invariant("model char value is not a valid Unicode scalar"))
        }
        Type::Seq(elem) if matches!(**elem, Type::Char) => {
            let s = d
                .as_string()
                .and_then(|s| s.as_string())
                .ok_or_else(|| CoreError::SolverFailure("expected a concrete string in the model".into()))?;
            Ok(ConstValue::Seq(s.chars().map(ConstValue::Char).collect()))
        }
        other => Err(CoreError::unsupported(BACKEND_NAME, leak_type_name(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_const_round_trips() {
        let mut solver = Z3Solver::new();
        let t = solver.bool_const(true);
        let model = solver.check(&t).unwrap();
        assert!(model.is_some());
    }

    #[test]
    fn unsupported_element_type_is_reported_not_panicked() {
        let err = Z3Solver::sort_of(&Type::Seq(Box::new(Type::Int))).unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
    }
}
