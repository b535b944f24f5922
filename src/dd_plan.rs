//! Decision-diagram variable allocation planning (§4.1 "Backends
//! expected", §5 "Ordering").
//!
//! `DdSolver::new` must know, before the first variable is allocated,
//! the full ordered list of bit-widths every arbitrary in the query
//! will need — a `biodivine_lib_bdd::BddVariableSet` is immutable once
//! built. This walks the expression in the same depth-first,
//! left-to-right, first-occurrence order the evaluator's memoized
//! recursion visits it in, and for every `Arbitrary` node expands its
//! declared type into the same flat sequence of leaf widths
//! `Evaluator::alloc_arbitrary` will later consume one at a time.
//!
//! Also rejects (§6: "the decision-diagram backend rejects expressions
//! containing unbounded integers, reals, sequences, or characters")
//! anywhere in the DAG, not just at the root — a `Bool` predicate built
//! over an `Int` subexpression is still unrepresentable.

use crate::ast::{Expr, NodeKind};
use crate::const_keys::ConstantKeyCollector;
use crate::error::{CoreError, CoreResult};
use crate::evaluator::selector_width;
use crate::solver::dd_backend::DdVarSpec;
use crate::types::Type;
use std::collections::HashSet;

const BACKEND_NAME: &str = "decision-diagram";

fn dd_representable(ty: &Type) -> bool {
    match ty {
        Type::Bool | Type::BitVec { .. } => true,
        Type::Int | Type::Real | Type::Char | Type::Seq(_) | Type::Map(_, _) => false,
        Type::List(inner) | Type::Option(inner) => dd_representable(inner),
        Type::ConstMap(_, v) => dd_representable(v),
        Type::Record(fields) => fields.iter().all(|(_, t)| dd_representable(t)),
        Type::Union(cases) => cases.iter().all(|(_, t)| dd_representable(t)),
    }
}

pub struct DdPlanner<'a> {
    const_keys: &'a ConstantKeyCollector,
    list_max_length: u32,
    visited: HashSet<u64>,
    plan: Vec<DdVarSpec>,
}

impl<'a> DdPlanner<'a> {
    pub fn new(const_keys: &'a ConstantKeyCollector, list_max_length: u32) -> Self {
        DdPlanner {
            const_keys,
            list_max_length,
            visited: HashSet::new(),
            plan: Vec::new(),
        }
    }

    pub fn into_plan(self) -> Vec<DdVarSpec> {
        self.plan
    }

    pub fn walk(&mut self, expr: &Expr) -> CoreResult<()> {
        if !self.visited.insert(expr.id) {
            return Ok(());
        }
        if !dd_representable(&expr.ty) {
            return Err(CoreError::unsupported(BACKEND_NAME, leak_type_name(&expr.ty)));
        }
        match &expr.kind {
            NodeKind::Const(_) | NodeKind::Argument(_) => {}
            NodeKind::Arbitrary => self.plan_leaves(&expr.ty),

            NodeKind::Not(a) | NodeKind::BitNot(a) | NodeKind::Convert(a) => self.walk(a)?,
            NodeKind::And(a, b) | NodeKind::Or(a, b) | NodeKind::Iff(a, b) | NodeKind::SeqConcat(a, b) => {
                self.walk(a)?;
                self.walk(b)?;
            }
            NodeKind::If {
                guard,
                then_branch,
                else_branch,
            } => {
                self.walk(guard)?;
                self.walk(then_branch)?;
                self.walk(else_branch)?;
            }
            NodeKind::Arith { lhs, rhs, .. }
            | NodeKind::BitOp { lhs, rhs, .. }
            | NodeKind::Cmp { lhs, rhs, .. }
            | NodeKind::Eq { lhs, rhs } => {
                self.walk(lhs)?;
                self.walk(rhs)?;
            }
            NodeKind::RecordCreate(fields) => {
                for (_, v) in fields {
                    self.walk(v)?;
                }
            }
            NodeKind::RecordGet { record, .. } => self.walk(record)?,
            NodeKind::RecordSet { record, value, .. } => {
                self.walk(record)?;
                self.walk(value)?;
            }
            NodeKind::UnionCreate { payload, .. } => self.walk(payload)?,
            NodeKind::UnionMatch { scrutinee, arms } => {
                self.walk(scrutinee)?;
                for arm in arms {
                    self.walk(&arm.body)?;
                }
            }
            NodeKind::SeqLength(a) | NodeKind::ListIsEmpty(a) | NodeKind::ListHead(a) | NodeKind::ListTail(a) => {
                self.walk(a)?
            }
            NodeKind::SeqAt { seq, index } => {
                self.walk(seq)?;
                self.walk(index)?;
            }
            NodeKind::SeqContains { seq, elem } | NodeKind::SeqIndexOf { seq, elem } => {
                self.walk(seq)?;
                self.walk(elem)?;
            }
            NodeKind::SeqSlice { seq, offset, length } => {
                self.walk(seq)?;
                self.walk(offset)?;
                self.walk(length)?;
            }
            NodeKind::SeqReplace { seq, from, to } => {
                self.walk(seq)?;
                self.walk(from)?;
                self.walk(to)?;
            }
            NodeKind::ListCreate(items) => {
                for item in items {
                    self.walk(item)?;
                }
            }
            NodeKind::ListCons { head, tail } => {
                self.walk(head)?;
                self.walk(tail)?;
            }
            NodeKind::ConstMapGet { map, .. } => self.walk(map)?,
            NodeKind::ConstMapSet { map, value, .. } => {
                self.walk(map)?;
                self.walk(value)?;
            }
            NodeKind::ArrayMapGet { map, key } => {
                self.walk(map)?;
                self.walk(key)?;
            }
            NodeKind::ArrayMapSet { map, key, value } => {
                self.walk(map)?;
                self.walk(key)?;
                self.walk(value)?;
            }
            NodeKind::OptionSome(a) | NodeKind::OptionIsSome(a) | NodeKind::OptionGet(a) => self.walk(a)?,
            NodeKind::OptionNone => {}
        }
        Ok(())
    }

    fn plan_leaves(&mut self, ty: &Type) {
        match ty {
            Type::Bool => self.plan.push(DdVarSpec { width: 1 }),
            Type::BitVec { width, .. } => self.plan.push(DdVarSpec { width: *width }),
            Type::Record(fields) => {
                for (_, fty) in fields {
                    self.plan_leaves(fty);
                }
            }
            Type::Union(cases) => {
                self.plan.push(DdVarSpec {
                    width: selector_width(cases.len()),
                });
                for (_, case_ty) in cases {
                    self.plan_leaves(case_ty);
                }
            }
            Type::Option(inner) => {
                self.plan.push(DdVarSpec { width: 1 });
                self.plan_leaves(inner);
            }
            Type::List(inner) => {
                for _ in 0..self.list_max_length {
                    self.plan.push(DdVarSpec { width: 1 });
                    self.plan_leaves(inner);
                }
            }
            Type::ConstMap(k, v) => {
                let keys = self.const_keys.keys_for(k, v);
                for _ in keys {
                    self.plan_leaves(v);
                }
            }
            Type::Int | Type::Real | Type::Char | Type::Seq(_) | Type::Map(_, _) => {}
        }
    }
}

fn leak_type_name(ty: &Type) -> &'static str {
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
        Type::Map(_, _) => "map (array-backed)",
        Type::Record(_) => "record",
        Type::Union(_) => "union",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node;

    #[test]
    fn rejects_int_anywhere_in_the_dag() {
        let keys = ConstantKeyCollector::new();
        let mut planner = DdPlanner::new(&keys, 5);
        let x = node(Type::Int, NodeKind::Arbitrary);
        let zero = node(Type::Int, NodeKind::Const(crate::types::ConstValue::Int(0)));
        let cmp = node(
            Type::Bool,
            NodeKind::Cmp {
                op: crate::ast::CmpOp::Lt,
                lhs: zero,
                rhs: x,
            },
        );
        assert!(planner.walk(&cmp).is_err());
    }

    #[test]
    fn plans_one_bit_per_bool_and_width_bits_per_bitvec() {
        let keys = ConstantKeyCollector::new();
        let mut planner = DdPlanner::new(&keys, 5);
        let x = node(Type::u8(), NodeKind::Arbitrary);
        let flag = node(Type::Bool, NodeKind::Arbitrary);
        let both = node(Type::Bool, NodeKind::And(x.clone(), flag.clone()));
        planner.walk(&both).unwrap();
        let plan = planner.into_plan();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].width, 8);
        assert_eq!(plan[1].width, 1);
    }
}
