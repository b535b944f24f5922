//! Solver Abstraction Layer (§4.1)
//!
//! A single polymorphic capability surface, parameterized over opaque
//! handle types for each term kind the evaluator needs. Per the design
//! notes (§9 "Open-typed generic solver"), this re-expresses the
//! upstream pattern of propagating nine type parameters through every
//! symbolic value as one trait with associated types instead — the
//! value lattice (`crate::value`) holds `Box<dyn Any>`-free, solver-typed
//! handles only through this trait's associated types, never raw solver
//! types directly.
//!
//! Two backends ship: [`z3_backend::Z3Solver`] wraps the Z3 SMT solver;
//! [`dd_backend::DdSolver`] wraps a binary decision diagram and backs the
//! reachable-set engine plus Boolean/bit-vector-only queries.

pub mod dd_backend;
pub mod z3_backend;

use crate::error::CoreResult;
use crate::types::{ConstValue, Type};

/// Fresh-variable identifier. Must be unique within one solver instance;
/// two `fresh_var` calls on the same instance must never alias (§4.1).
pub type VarId = u64;

/// The result of a `check`/`maximize`/`minimize` call: `None` means
/// unsat, `Some(model)` carries a backend-specific model handle used
/// only through [`Solver::get`].
pub trait Solver {
    type Bool: Clone;
    type Bv: Clone;
    type Int: Clone;
    type Real: Clone;
    type Char: Clone;
    type Seq: Clone;
    type Array: Clone;
    /// A value of unknown kind, e.g. the result of an array select whose
    /// element type the caller already knows from the expression AST.
    /// Mirrors the `Dynamic` type in mainstream SMT binding crates.
    type Dynamic: Clone;
    type Model;

    fn name(&self) -> &'static str;

    // --- constants & variables -------------------------------------
    //
    // A constructor per primitive width/kind would smear that
    // combinatorics through the trait; dispatching on `Type`/`ConstValue`
    // instead keeps one polymorphic surface (see DESIGN.md, Open
    // Question: "one polymorphic surface vs. per-kind methods").

    /// Allocate a fresh variable of the given type. Returns both the
    /// opaque solver identifier (used by the arbitrary registry and the
    /// interleaving analyzer) and the typed term referencing it.
    fn fresh_var(&mut self, ty: &Type) -> CoreResult<(VarId, Self::Dynamic)>;

    fn const_of(&mut self, value: &ConstValue) -> CoreResult<Self::Dynamic>;

    // --- downcasts from Dynamic --------------------------------------
    fn as_bool(&self, d: &Self::Dynamic) -> Option<Self::Bool>;
    fn as_bv(&self, d: &Self::Dynamic) -> Option<Self::Bv>;
    fn as_int(&self, d: &Self::Dynamic) -> Option<Self::Int>;
    fn as_real(&self, d: &Self::Dynamic) -> Option<Self::Real>;
    fn as_char(&self, d: &Self::Dynamic) -> Option<Self::Char>;
    fn as_seq(&self, d: &Self::Dynamic) -> Option<Self::Seq>;
    fn as_array(&self, d: &Self::Dynamic) -> Option<Self::Array>;

    // --- upcasts into Dynamic -----------------------------------------
    fn from_bool(&self, v: &Self::Bool) -> Self::Dynamic;
    fn from_bv(&self, v: &Self::Bv) -> Self::Dynamic;
    fn from_int(&self, v: &Self::Int) -> Self::Dynamic;
    fn from_real(&self, v: &Self::Real) -> Self::Dynamic;
    fn from_char(&self, v: &Self::Char) -> Self::Dynamic;
    fn from_seq(&self, v: &Self::Seq) -> Self::Dynamic;
    fn from_array(&self, v: &Self::Array) -> Self::Dynamic;

    // --- propositional --------------------------------------------------
    fn bool_const(&mut self, v: bool) -> Self::Bool;
    fn not(&mut self, a: &Self::Bool) -> Self::Bool;
    fn and(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool;
    fn or(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool;
    fn iff(&mut self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool;

    fn ite_bool(&mut self, g: &Self::Bool, t: &Self::Bool, e: &Self::Bool) -> Self::Bool;
    fn ite_bv(&mut self, g: &Self::Bool, t: &Self::Bv, e: &Self::Bv) -> Self::Bv;
    fn ite_int(&mut self, g: &Self::Bool, t: &Self::Int, e: &Self::Int) -> Self::Int;
    fn ite_real(&mut self, g: &Self::Bool, t: &Self::Real, e: &Self::Real) -> Self::Real;
    fn ite_char(&mut self, g: &Self::Bool, t: &Self::Char, e: &Self::Char) -> Self::Char;
    fn ite_seq(&mut self, g: &Self::Bool, t: &Self::Seq, e: &Self::Seq) -> Self::Seq;
    fn ite_array(&mut self, g: &Self::Bool, t: &Self::Array, e: &Self::Array) -> Self::Array;

    // --- bit-vector -------------------------------------------------
    fn bv_add(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    fn bv_sub(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    fn bv_mul(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    fn bv_and(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    fn bv_or(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    fn bv_xor(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    fn bv_not(&mut self, a: &Self::Bv) -> Self::Bv;
    fn bv_le(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool;
    fn bv_ge(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool;
    fn bv_lt(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool;
    fn bv_gt(&mut self, a: &Self::Bv, b: &Self::Bv, signed: bool) -> Self::Bool;
    fn bv_eq(&mut self, a: &Self::Bv, b: &Self::Bv) -> Self::Bool;
    /// Sign- or zero-extend/truncate `a` (currently `from_width` wide) to
    /// `to_width`, per the source node's declared signedness (§4.5
    /// "Conversions").
    fn bv_convert(&mut self, a: &Self::Bv, from_width: u32, to_width: u32, signed: bool) -> Self::Bv;

    // --- unbounded integer / real -------------------------------------
    // Division semantics are the backend's to define (§4.1); the
    // evaluator never assumes particular rounding.
    fn int_add(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int;
    fn int_sub(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int;
    fn int_mul(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int;
    fn int_div(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int;
    fn int_rem(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Int;
    fn int_le(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool;
    fn int_ge(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool;
    fn int_lt(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool;
    fn int_gt(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool;
    fn int_eq(&mut self, a: &Self::Int, b: &Self::Int) -> Self::Bool;

    fn real_add(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real;
    fn real_sub(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real;
    fn real_mul(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real;
    fn real_div(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Real;
    fn real_le(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool;
    fn real_ge(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool;
    fn real_lt(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool;
    fn real_gt(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool;
    fn real_eq(&mut self, a: &Self::Real, b: &Self::Real) -> Self::Bool;

    // --- sequences & characters -----------------------------------------
    fn seq_concat(&mut self, a: &Self::Seq, b: &Self::Seq) -> Self::Seq;
    fn seq_length(&mut self, a: &Self::Seq) -> Self::Int;
    fn seq_at(&mut self, a: &Self::Seq, index: &Self::Int) -> Self::Seq;
    fn seq_contains(&mut self, a: &Self::Seq, elem: &Self::Seq) -> Self::Bool;
    fn seq_index_of(&mut self, a: &Self::Seq, elem: &Self::Seq, from: &Self::Int) -> Self::Int;
    fn seq_slice(&mut self, a: &Self::Seq, offset: &Self::Int, length: &Self::Int) -> Self::Seq;
    fn seq_replace(&mut self, a: &Self::Seq, from: &Self::Seq, to: &Self::Seq) -> Self::Seq;
    fn seq_eq(&mut self, a: &Self::Seq, b: &Self::Seq) -> Self::Bool;
    fn char_const(&mut self, c: char) -> Self::Char;
    fn char_eq(&mut self, a: &Self::Char, b: &Self::Char) -> Self::Bool;

    // --- arrays -----------------------------------------------------
    fn array_select(&mut self, a: &Self::Array, key: &Self::Dynamic) -> Self::Dynamic;
    fn array_store(&mut self, a: &Self::Array, key: &Self::Dynamic, value: &Self::Dynamic) -> Self::Array;
    fn array_eq(&mut self, a: &Self::Array, b: &Self::Array) -> Self::Bool;
    fn fresh_array(&mut self, key_ty: &Type, value_ty: &Type) -> CoreResult<(VarId, Self::Array)>;

    // --- quantifier-free decision / optimization --------------------
    fn check(&mut self, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>>;
    fn maximize(&mut self, objective: &Self::Dynamic, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>>;
    fn minimize(&mut self, objective: &Self::Dynamic, constraint: &Self::Bool) -> CoreResult<Option<Self::Model>>;

    /// Parse the model's native representation into the primitive typed
    /// by `declared_type` (§4.1 "Model extraction"). Signed bit-vectors
    /// must be interpreted as two's-complement.
    fn get(&self, model: &Self::Model, var: VarId, declared_type: &Type) -> CoreResult<ConstValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_ids_are_u64() {
        let _v: VarId = 7;
    }
}
