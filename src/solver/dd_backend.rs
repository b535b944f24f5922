//! Decision-Diagram Backend (§4.1, §6 "Decision procedure backends", (ii)).
//!
//! Wraps `biodivine-lib-bdd`. Only `Bool` and `BitVec` terms are
//! representable — `Int`/`Real`/`Char`/`Seq`/`Array`-typed nodes are
//! rejected by the model checker façade before evaluation ever reaches
//! this backend (§6: "rejects expressions containing unbounded
//! integers, reals, sequences, or characters"). Those associated types
//! are therefore `()`: no value of them is ever constructed, so their
//! trait methods are satisfiable without ever being exercised.
//!
//! A `biodivine_lib_bdd::BddVariableSet` is immutable once built, so
//! every symbolic variable this solver will ever need must be known
//! before the first one is allocated — this is exactly the "variable
//! ordering derived from pass results" the façade computes in §4.6 step
//! 2. [`DdSolver::new`] takes that plan (one width per arbitrary, in
//! allocation order) and builds the full variable set up front;
//! [`DdSolver::fresh_var`]/[`fresh_bit_vec`] then just consume the next
//! reserved chunk.

use crate::error::{CoreError, CoreResult};
use crate::solver::{Solver, VarId};
use crate::types::{ConstValue, Type};
use biodivine_lib_bdd::{Bdd, BddVariable, BddVariableSet, BddVariableSetBuilder};

const BACKEND_NAME: &str = "decision-diagram";

/// One bit-vector (or single-bit Boolean) worth of reserved ordering.
#[derive(Debug, Clone, Copy)]
pub struct DdVarSpec {
    pub width: u32,
}

#[derive(Clone)]
pub enum DdDynamic {
    Bool(Bdd),
    Bv(Vec<Bdd>),
    /// Placeholder for the uninhabited `Int`/`Real`/`Char`/`Seq`/`Array`
    /// associated types — never produced by `fresh_var`/`const_of`.
    Unsupported,
}

pub struct DdModel {
    valuation: biodivine_lib_bdd::BddValuation,
}

pub struct DdSolver {
    var_set: BddVariableSet,
    /// Reserved `BddVariable`s in allocation order, consumed left to
    /// right by `fresh_var`/`fresh_bit_vec`.
    plan: Vec<BddVariable>,
    cursor: usize,
    /// `VarId -> bits`, needed by `get` to read a model valuation back
    /// out per allocated arbitrary.
    bits_of: Vec<Vec<BddVariable>>,
}

impl DdSolver {
    /// Builds the variable set from a fixed plan of widths, one entry
    /// per arbitrary expression in allocation order (§5 "Ordering").
    /// A plain `Bool` arbitrary is a `DdVarSpec { width: 1 }`.
    pub fn new(plan: &[DdVarSpec]) -> Self {
        let mut builder = BddVariableSetBuilder::new();
        let mut vars = Vec::new();
        let mut idx = 0usize;
        for spec in plan {
            for _ in 0..spec.width.max(1) {
                vars.push(builder.make_variable(&format!("b{idx}")));
                idx += 1;
            }
        }
        DdSolver {
            var_set: builder.build(),
            plan: vars,
            cursor: 0,
            bits_of: Vec::new(),
        }
    }

    fn take_bits(&mut self, count: u32) -> CoreResult<Vec<BddVariable>> {
        let count = count as usize;
        if self.cursor + count > self.plan.len() {
            return Err(CoreError::invariant(
                "decision-diagram variable plan exhausted — the interleaving/allocation pass under-counted arbitraries",
            ));
        }
        let bits = self.plan[self.cursor..self.cursor + count].to_vec();
        self.cursor += count;
        Ok(bits)
    }

    fn register(&mut self, bits: Vec<BddVariable>) -> VarId {
        let id = self.bits_of.len() as VarId;
        self.bits_of.push(bits);
        id
    }

    fn const_bv(&self, value: i128, width: u32) -> Vec<Bdd> {
        (0..width)
            .map(|i| {
                if (value >> i) & 1 == 1 {
                    self.var_set.mk_true()
                } else {
                    self.var_set.mk_false()
                }
            })
            .collect()
    }

    /// Full-adder ripple-carry, bit 0 = LSB.
    fn bv_add_bits(&self, a: &[Bdd], b: &[Bdd]) -> Vec<Bdd> {
        let mut out = Vec::with_capacity(a.len());
        let mut carry = self.var_set.mk_false();
        for (ai, bi) in a.iter().zip(b.iter()) {
            let axb = ai.xor(bi);
            let sum = axb.xor(&carry);
            let carry_out = ai.and(bi).or(&axb.and(&carry));
            out.push(sum);
            carry = carry_out;
        }
        out
    }

    fn bv_not_bits(&self, a: &[Bdd]) -> Vec<Bdd> {
        a.iter().map(|b| b.not()).collect()
    }

    fn bv_neg_bits(&self, a: &[Bdd]) -> Vec<Bdd> {
        let inverted = self.bv_not_bits(a);
        let one = self.const_bv(1, a.len() as u32);
        self.bv_add_bits(&inverted, &one)
    }

    /// Unsigned `<`, MSB-down recursive comparator.
    fn bv_ult_bits(&self, a: &[Bdd], b: &[Bdd]) -> Bdd {
        let mut lt = self.var_set.mk_false();
        let mut eq_so_far = self.var_set.mk_true();
        for i in (0..a.len()).rev() {
            let bit_lt = a[i].not().and(&b[i]);
            let bit_eq = a[i].iff(&b[i]);
            lt = lt.or(&eq_so_far.and(&bit_lt));
            eq_so_far = eq_so_far.and(&bit_eq);
        }
        lt
    }

    fn bv_eq_bits(&self, a: &[Bdd], b: &[Bdd]) -> Bdd {
        a.iter()
            .zip(b.iter())
            .fold(self.var_set.mk_true(), |acc, (x, y)| acc.and(&x.iff(y)))
    }

    /// The sign bit. Every `Bv` reaching this point was allocated through
    /// `fresh_var`/`const_of` (both reject zero-width bitvectors) or
    /// truncated through `bv_convert` (which rejects a zero-width
    /// target), so `a` is never empty in practice; the empty case still
    /// returns a value instead of panicking, treating a width-0
    /// bitvector as carrying no sign.
    fn msb(&self, a: &[Bdd]) -> Bdd {
        a.last().cloned().unwrap_or_else(|| self.var_set.mk_false())
    }
}

impl Solver for DdSolver {
    type Bool = Bdd;
    type Bv = Vec<Bdd>;
    type Int = ();
    type Real = ();
    type Char = ();
    type Seq = ();
    type Array = ();
    type Dynamic = DdDynamic;
    type Model = DdModel;

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn fresh_var(&mut self, ty: &Type) -> CoreResult<(VarId, Self::Dynamic)> {
        match ty {
            Type::Bool => {
                let bits = self.take_bits(1)?;
                let bdd = self.var_set.mk_var(bits[0]);
                let id = self.register(bits);
                Ok((id, DdDynamic::Bool(bdd)))
            }
            Type::BitVec { width, .. } => {
                if *width == 0 {
                    return Err(CoreError::unsupported(BACKEND_NAME, "zero-width bitvector"));
                }
                let bits = self.take_bits(*width)?;
                let bdds = bits.iter().map(|v| self.var_set.mk_var(*v)).collect();
                let id = self.register(bits);
                Ok((id, DdDynamic::Bv(bdds)))
            }
            other => Err(CoreError::unsupported(BACKEND_NAME, dd_type_name(other))),
        }
    }

    fn const_of(&mut self, value: &ConstValue) -> CoreResult<Self::Dynamic> {
        match value {
            ConstValue::Bool(b) => Ok(DdDynamic::Bool(if *b {
                self.var_set.mk_true()
            } else {
                self.var_set.mk_false()
            })),
            ConstValue::BitVec { width: 0, .. } => Err(CoreError::unsupported(BACKEND_NAME, "zero-width bitvector")),
            ConstValue::BitVec { value, width, .. } => Ok(DdDynamic::Bv(self.const_bv(*value, *width))),
            other => Err(CoreError::unsupported(BACKEND_NAME, dd_type_name(&other.ty()))),
        }
    }

    fn as_bool(&self, d: &Self::Dynamic) -> Option<Self::Bool> {
        match d {
            DdDynamic::Bool(b) => Some(b.clone()),
            _ => None,
        }
    }
    fn as_bv(&self, d: &Self::Dynamic) -> Option<Self::Bv> {
        match d {
            DdDynamic::Bv(v) => Some(v.clone()),
            _ => None,
        }
    }
    fn as_int(&self, _d: &Self::Dynamic) -> Option<Self::Int> {
        None
    }
    fn as_real(&self, _d: &Self::Dynamic) -> Option<Self::Real> {
        None
    }
    fn as_char(&self, _d: &Self::Dynamic) -> Option<Self::Char> {
        None
    }
    fn as_seq(&self, _d: &Self::Dynamic) -> Option<Self::Seq> {
        None
    }
    fn as_array(&self, _d: &Self::Dynamic) -> Option<Self::Array> {
        None
    }

    fn from_bool(&self, v: &Self::Bool) -> Self::Dynamic {
        DdDynamic::Bool(v.clone())
    }
    fn from_bv(&self, v: &Self::Bv) -> Self::Dynamic {
        DdDynamic::Bv(v.clone())
    }
    fn from_int(&self, _v: &Self::Int) -> Self::Dynamic {
        DdDynamic::Unsupported
    }
    fn from_real(&self, _v: &Self::Real) -> Self::Dynamic {
        DdDynamic::Unsupported
    }
    fn from_char(&self, _v: &Self::Char) -> Self::Dynamic {
        DdDynamic::Unsupported
    }
    fn from_seq(&self, _v: &Self::Seq) -> Self::Dynamic {
        DdDynamic::Unsupported
    }
    fn from_array(&self, _v: &Self::Array) -> Self::Dynamic {
        DdDynamic::Unsupported
    }

    fn bool_const(&mut self, v: bool) -> Self::Bool {
        if v {
            self.var_set.mk_true()
        } else {
            self.var_set.mk_false()
        }
    }
    fn not(&mut self, a: &Self::Bool) -> Self::Bool {
        a.not()
    }
    fn and(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool {
        a.and(b)
    }
    fn or(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool {
        a.or(b)
    }
    fn iff(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool {
        a.iff(b)
    }

    fn ite_bool(&mut self, g: &Self::Bool, t: &Self::Bool, e: &Self::Bool) -> Self::Bool {
        g.and(t).or(&g.not().and(e))
    }
    fn ite_bv(&mut self, g: &Self::Bool, t: &Self::Bv, e: &Self::Bv) -> Self::Bv {
        t.iter().zip(e.iter()).map(|(ti, ei)| self.ite_bool(g, ti, ei)).collect()
    }
    fn ite_int(&mut self, _g: &Self::Bool, t: &Self::Int, _e: &Self::Int) -> Self::Int {
        *t
    }
    fn ite_real(&mut self, _g: &Self::Bool, t: &Self::Real, _e: &Self::Real) -> Self::Real {
        *t
    }
    fn ite_char(&mut self, _g: &Self::Bool, t: &Self::Char, _e: &Self::Char) -> Self::Char {
        *t
    }
    fn ite_seq(&mut self, _g: &Self::Bool, t: &Self::Seq, _e: &Self::Seq) -> Self::Seq {
        *t
    }
    fn ite_array(&mut self, _g: &Self::Bool, t: &Self::Array, _e: &Self::Array) -> Self::Array {
        *t
    }

    fn bv_add(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        self.bv_add_bits(a, b)
    }
    fn bv_sub(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        let neg_b = self.bv_neg_bits(b);
        self.bv_add_bits(a, &neg_b)
    }
    fn bv_mul(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        let width = a.len();
        let mut acc = vec![self.var_set.mk_false(); width];
        for (i, bit) in b.iter().enumerate() {
            let shifted: Vec<Bdd> = (0..width)
                .map(|j| if j >= i { a[j - i].and(bit) } else { self.var_set.mk_false() })
                .collect();
            acc = self.bv_add_bits(&acc, &shifted);
        }
        acc
    }
    fn bv_and(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.iter().zip(b.iter()).map(|(x, y)| x.and(y)).collect()
    }
    fn bv_or(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.iter().zip(b.iter()).map(|(x, y)| x.or(y)).collect()
    }
    fn bv_xor(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv {
        a.iter().zip(b.iter()).map(|(x, y)| x.xor(y)).collect()
    }
    fn bv_not(&mut self, a: &Self::Bv) -> Self::Bv {
        self.bv_not_bits(a)
    }
    fn bv_le(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        let gt = self.bv_gt(a, b, signed);
        gt.not()
    }
    fn bv_ge(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        let lt = self.bv_lt(a, b, signed);
        lt.not()
    }
    fn bv_lt(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        if !signed {
            return self.bv_ult_bits(a, b);
        }
        // signed a < b  <=>  (sign differs AND a negative) OR (same sign AND unsigned a < b)
        let sa = self.msb(a);
        let sb = self.msb(b);
        let unsigned_lt = self.bv_ult_bits(a, b);
        let diff_sign_neg = sa.and(&sb.not());
        let same_sign = sa.iff(&sb);
        diff_sign_neg.or(&same_sign.and(&unsigned_lt))
    }
    fn bv_gt(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool {
        self.bv_lt(b, a, signed)
    }
    fn bv_eq(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bool {
        self.bv_eq_bits(a, b)
    }
    fn bv_convert(&mut self, a: &Self::Bv, from_width: u32, to_width: u32, signed: bool) -> Self::Bv {
        if to_width <= from_width {
            a[..to_width as usize].to_vec()
        } else {
            let fill = if signed {
                self.msb(a)
            } else {
                self.var_set.mk_false()
            };
            let mut out = a.clone();
            out.extend(std::iter::repeat(fill).take((to_width - from_width) as usize));
            out
        }
    }

    fn int_add(&mut self, a: &Self::Int, _b: &Self::Int) -> Self::Int {
        *a
    }
    fn int_sub(&mut self, a: &Self::Int, _b: &Self::Int) -> Self::Int {
        *a
    }
    fn int_mul(&mut self, a: &Self::Int, _b: &Self::Int) -> Self::Int {
        *a
    }
    fn int_div(&mut self, a: &Self::Int, _b: &Self::Int) -> Self::Int {
        *a
    }
    fn int_rem(&mut self, a: &Self::Int, _b: &Self::Int) -> Self::Int {
        *a
    }
    fn int_le(&mut self, _a: &Self::Int, _b: &Self::Int) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn int_ge(&mut self, _a: &Self::Int, _b: &Self::Int) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn int_lt(&mut self, _a: &Self::Int, _b: &Self::Int) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn int_gt(&mut self, _a: &Self::Int, _b: &Self::Int) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn int_eq(&mut self, _a: &Self::Int, _b: &Self::Int) -> Self::Bool {
        self.var_set.mk_false()
    }

    fn real_add(&mut self, a: &Self::Real, _b: &Self::Real) -> Self::Real {
        *a
    }
    fn real_sub(&mut self, a: &Self::Real, _b: &Self::Real) -> Self::Real {
        *a
    }
    fn real_mul(&mut self, a: &Self::Real, _b: &Self::Real) -> Self::Real {
        *a
    }
    fn real_div(&mut self, a: &Self::Real, _b: &Self::Real) -> Self::Real {
        *a
    }
    fn real_le(&mut self, _a: &Self::Real, _b: &Self::Real) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn real_ge(&mut self, _a: &Self::Real, _b: &Self::Real) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn real_lt(&mut self, _a: &Self::Real, _b: &Self::Real) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn real_gt(&mut self, _a: &Self::Real, _b: &Self::Real) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn real_eq(&mut self, _a: &Self::Real, _b: &Self::Real) -> Self::Bool {
        self.var_set.mk_false()
    }

    fn seq_concat(&mut self, a: &Self::Seq, _b: &Self::Seq) -> Self::Seq {
        *a
    }
    fn seq_length(&mut self, _a: &Self::Seq) -> Self::Int {}
    fn seq_at(&mut self, a: &Self::Seq, _index: &Self::Int) -> Self::Seq {
        *a
    }
    fn seq_contains(&mut self, _a: &Self::Seq, _elem: &Self::Seq) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn seq_index_of(&mut self, _a: &Self::Seq, _elem: &Self::Seq, _from: &Self::Int) -> Self::Int {}
    fn seq_slice(&mut self, a: &Self::Seq, _offset: &Self::Int, _length: &Self::Int) -> Self::Seq {
        *a
    }
    fn seq_replace(&mut self, a: &Self::Seq, _from: &Self::Seq, _to: &Self::Seq) -> Self::Seq {
        *a
    }
    fn seq_eq(&mut self, _a: &Self::Seq, _b: &Self::Seq) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn char_const(&mut self, _c: char) -> Self::Char {}
    fn char_eq(&mut self, _a: &Self::Char, _b: &Self::Char) -> Self::Bool {
        self.var_set.mk_false()
    }

    fn array_select(&mut self, _a: &Self::Array, _key: &Self::Dynamic) -> Self::Dynamic {
        DdDynamic::Unsupported
    }
    fn array_store(&mut self, a: &Self::Array, _key: &Self::Dynamic, _value: &Self::Dynamic) -> Self::Array {
        *a
    }
    fn array_eq(&mut self, _a: &Self::Array, _b: &Self::Array) -> Self::Bool {
        self.var_set.mk_false()
    }
    fn fresh_array(&mut self, key_ty: &Type, _value_ty: &Type) -> CoreResult<(VarId, Self::Array)> {
        Err(CoreError::unsupported(BACKEND_NAME, dd_type_name(key_ty)))
    }

    fn check(&mut self, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>> {
        if constraint.is_false() {
            Ok(None)
        } else {
            let valuation = constraint
                .sat_witness()
                .ok_or_else(|| CoreError::SolverFailure("bdd reported sat but produced no witness".into()))?;
            Ok(Some(DdModel { valuation }))
        }
    }

    fn maximize(&mut self, objective: &Self::Dynamic, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>> {
        self.optimize(objective, constraint, true)
    }

    fn minimize(&mut self, objective: &Self::Dynamic, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>> {
        self.optimize(objective, constraint, false)
    }

    fn get(&self, model: &Self::Model, var: VarId, declared_type: &Type) -> CoreResult<ConstValue> {
        let bits = self
            .bits_of
            .get(var as usize)
            .ok_or_else(|| CoreError::invariant(format!("no decision-diagram variable registered for var id {var}")))?;
        match declared_type {
            Type::Bool => Ok(ConstValue::Bool(model.valuation.value(bits[0]))),
            Type::BitVec { width, signed } => {
                let mut magnitude: i128 = 0;
                for (i, bit) in bits.iter().enumerate() {
                    if model.valuation.value(*bit) {
                        magnitude |= 1 << i;
                    }
                }
                let value = if *signed && *width > 0 && (magnitude >> (width - 1)) & 1 == 1 {
                    magnitude - (1i128 << width)
                } else {
                    magnitude
                };
                Ok(ConstValue::BitVec {
                    value,
                    width: *width,
                    signed: *signed,
                })
            }
            other => Err(CoreError::unsupported(BACKEND_NAME, dd_type_name(other))),
        }
    }
}

impl DdSolver {
    /// Binary search over the bit-vector's representable range, driven
    /// purely by repeated `check` calls — the only primitive the BDD
    /// representation actually gives us. `maximize`/`minimize` share
    /// this, varying only the comparison direction.
    fn optimize(
        &mut self,
        objective: &DdDynamic,
        constraint: &Bdd,
        want_max: bool,
    ) -> CoreResult<Option<DdModel>> {
        let bv = self
            .as_bv(objective)
            .ok_or_else(|| CoreError::unsupported(BACKEND_NAME, "non-bitvector optimization objective"))?;
        if constraint.is_false() {
            return Ok(None);
        }
        let width = bv.len() as u32;
        let (mut lo, mut hi): (i128, i128) = (0, (1i128 << width) - 1);
        let mut best: Option<DdModel> = None;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let bound = self.const_bv(mid, width);
            let cmp = if want_max {
                self.bv_ge(&bv, &bound, false)
            } else {
                self.bv_le(&bv, &bound, false)
            };
            let attempt = constraint.and(&cmp);
            if let Some(model) = self.check(&attempt)? {
                best = Some(model);
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

impl DdSolver {
    /// The allocated bits backing `var`, in the order `alloc_arbitrary`
    /// pushed them — needed by the reachable-set engine (§4.7) to know
    /// which `BddVariable`s a `StateSet<T>` is defined over.
    pub(crate) fn bits_for(&self, var: VarId) -> CoreResult<&[BddVariable]> {
        self.bits_of
            .get(var as usize)
            .map(|v| v.as_slice())
            .ok_or_else(|| CoreError::invariant(format!("no decision-diagram variable registered for var id {var}")))
    }

    /// Existentially quantifies `bdd` over every variable in `vars`,
    /// one at a time. Used by [`Self::convert_set_variables`] to project
    /// out the pre-image variables after linking them to their renamed
    /// counterparts (§4.7 "combining `R ∧ (x' = f(x))` and existentially
    /// quantifying `x`").
    pub(crate) fn exists_vars(&self, bdd: &Bdd, vars: &[BddVariable]) -> Bdd {
        vars.iter().fold(bdd.clone(), |acc, v| acc.var_exists(*v))
    }

    /// Renames a set defined over `from` (the variable's original bits)
    /// to the equally-sized `to` (§4.7 `convert_set_variables`), via the
    /// standard relational-product construction: conjoin with the
    /// positional linking predicate `AND_i (from_i <-> to_i)`, then
    /// existentially quantify away every `from` bit. This is also the
    /// primitive `post(R)` image computation is built from, conjoining
    /// a transition relation instead of a pure linking predicate.
    pub(crate) fn rename_positional(&self, bdd: &Bdd, from: &[BddVariable], to: &[BddVariable]) -> CoreResult<Bdd> {
        if from.len() != to.len() {
            return Err(CoreError::invariant(
                "convert_set_variables requires equally-sized variable sets",
            ));
        }
        let mut linked = bdd.clone();
        for (&f, &t) in from.iter().zip(to.iter()) {
            let link = self.var_set.mk_var(f).iff(&self.var_set.mk_var(t));
            linked = linked.and(&link);
        }
        Ok(self.exists_vars(&linked, from))
    }

    pub(crate) fn var_set(&self) -> &BddVariableSet {
        &self.var_set
    }
}

fn dd_type_name(ty: &Type) -> &'static str {
    match ty {
        Type::Bool => "bool",
        Type::BitVec { .. } => "bitvec",
        Type::Int => "int",
        Type::Real => "real",
        Type::Char => "char",
        Type::Seq(_) => "seq",
        Type::List(_) => "list",
        Type::Option(_) => "option",
        Type::ConstMap(_, _) => "const_map",
        Type::Map(_, _) => "map",
        Type::Record(_) => "record",
        Type::Union(_) => "union",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_bool_var_then_check_true_is_sat() {
        let mut solver = DdSolver::new(&[DdVarSpec { width: 1 }]);
        let (_, d) = solver.fresh_var(&Type::Bool).unwrap();
        let b = solver.as_bool(&d).unwrap();
        assert!(solver.check(&b).unwrap().is_some());
        let not_b = solver.not(&b);
        let both = solver.and(&b, &not_b);
        assert!(solver.check(&both).unwrap().is_none());
    }

    #[test]
    fn bitvector_addition_round_trips_through_model_extraction() {
        let mut solver = DdSolver::new(&[DdVarSpec { width: 4 }]);
        let ty = Type::BitVec { width: 4, signed: false };
        let (id, d) = solver.fresh_var(&ty).unwrap();
        let x = solver.as_bv(&d).unwrap();
        let three = solver.const_bv(3, 4);
        let sum = solver.bv_add(&x, &three);
        let seven = solver.const_bv(7, 4);
        let eq = solver.bv_eq(&sum, &seven);
        let model = solver.check(&eq).unwrap().expect("3 + x = 7 is sat for x = 4");
        let value = solver.get(&model, id, &ty).unwrap();
        assert_eq!(value, ConstValue::BitVec { value: 4, width: 4, signed: false });
    }

    #[test]
    fn exhausting_the_variable_plan_is_an_invariant_violation() {
        let mut solver = DdSolver::new(&[]);
        let err = solver.fresh_var(&Type::Bool).unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolated(_)));
    }
}
