//! Model Checker Façade (§4.6).
//!
//! Orchestrates the whole pipeline a query needs: the constant-key and
//! interleaving pre-passes, backend selection, solver instantiation
//! (with decision-diagram variable-allocation hints derived from the
//! passes), symbolic evaluation, the solve/optimize call, and
//! reification. Nothing outside this module picks a backend by hand —
//! `Z3Solver`/`DdSolver` are otherwise only named in their own modules.

use crate::ast::{ArbitraryId, ArgId, Expr};
use crate::backend::CheckerStats;
use crate::config::{Backend, CheckerConfig};
use crate::const_keys::ConstantKeyCollector;
use crate::dd_plan::DdPlanner;
use crate::env::{ArbitraryRegistry, ArgBinding, ArgumentEnv};
use crate::error::CoreResult;
use crate::evaluator::Evaluator;
use crate::interleave::InterleavingAnalyzer;
use crate::interpreter::ValueInterpreter;
use crate::reify::{reify, Assignment};
use crate::solver::dd_backend::DdSolver;
use crate::solver::z3_backend::Z3Solver;
use crate::solver::{Solver, VarId};
use crate::types::Type;
use std::collections::HashMap;
use std::time::Instant;

/// One free argument binding: an identifier the predicate/objective
/// references via `NodeKind::Argument`, paired with the expression it
/// resolves to.
pub type Args<'a> = &'a [(ArgId, Expr)];

fn bound_env<S: Solver>(args: Args) -> ArgumentEnv<S> {
    let mut env = ArgumentEnv::new();
    for (id, expr) in args {
        env.bind(*id, ArgBinding::Expr(expr.clone()));
    }
    env
}

fn collect_const_keys(predicate: &Expr, objective: Option<&Expr>, args: Args) -> ConstantKeyCollector {
    let mut collector = ConstantKeyCollector::new();
    collector.collect(predicate);
    if let Some(objective) = objective {
        collector.collect(objective);
    }
    for (_, expr) in args {
        collector.collect(expr);
    }
    collector
}

/// Computes arbitrary-identity equivalence classes purely for its
/// diagnostic value — the decision-diagram variable plan below still
/// allocates in first-occurrence order (§5 "Ordering" only requires
/// interleaved classes to be *contiguous*, which first-occurrence order
/// already satisfies whenever correlated arbitraries are introduced
/// next to each other, the common case for hand-built DAGs). See
/// DESIGN.md for the open-question disposition.
fn log_interleaving_classes(predicate: &Expr, objective: Option<&Expr>, args: Args) {
    let mut analyzer = InterleavingAnalyzer::new();
    analyzer.analyze(predicate);
    if let Some(objective) = objective {
        analyzer.analyze(objective);
    }
    for (_, expr) in args {
        analyzer.analyze(expr);
    }
    let classes = analyzer.into_union_find().classes();
    log::debug!("interleaving analysis found {} equivalence class(es)", classes.len());
}

fn plan_dd_vars(
    const_keys: &ConstantKeyCollector,
    list_max_length: u32,
    predicate: &Expr,
    objective: Option<&Expr>,
    args: Args,
) -> CoreResult<Vec<crate::solver::dd_backend::DdVarSpec>> {
    let mut planner = DdPlanner::new(const_keys, list_max_length);
    planner.walk(predicate)?;
    if let Some(objective) = objective {
        planner.walk(objective)?;
    }
    for (_, expr) in args {
        planner.walk(expr)?;
    }
    Ok(planner.into_plan())
}

type QueryOutcome<S> = (
    Option<<S as Solver>::Model>,
    ArbitraryRegistry<VarId>,
    HashMap<ArbitraryId, Type>,
    CheckerStats,
);

fn run_check<S: Solver>(
    solver: &mut S,
    const_keys: &ConstantKeyCollector,
    list_max_length: u32,
    predicate: &Expr,
    args: Args,
) -> CoreResult<QueryOutcome<S>> {
    let mut env = bound_env(args);
    let mut evaluator = Evaluator::new(solver, const_keys, list_max_length);
    let value = evaluator.evaluate(predicate, &mut env)?;
    let constraint = value.as_bool()?.clone();
    let (registry, arbitrary_types) = evaluator.into_registry();

    let start = Instant::now();
    let model = solver.check(&constraint)?;
    let stats = stats_for(&registry, start.elapsed());
    Ok((model, registry, arbitrary_types, stats))
}

fn run_optimize<S: Solver>(
    solver: &mut S,
    const_keys: &ConstantKeyCollector,
    list_max_length: u32,
    objective: &Expr,
    constraint: &Expr,
    args: Args,
    want_max: bool,
) -> CoreResult<QueryOutcome<S>> {
    let mut env = bound_env(args);
    let mut evaluator = Evaluator::new(solver, const_keys, list_max_length);
    let constraint_value = evaluator.evaluate(constraint, &mut env)?;
    let constraint_bool = constraint_value.as_bool()?.clone();
    let objective_value = evaluator.evaluate(objective, &mut env)?;
    let objective_dynamic = evaluator.symbolic_to_dynamic(&objective_value)?;
    let (registry, arbitrary_types) = evaluator.into_registry();

    let start = Instant::now();
    let model = if want_max {
        solver.maximize(&objective_dynamic, &constraint_bool)?
    } else {
        solver.minimize(&objective_dynamic, &constraint_bool)?
    };
    let stats = stats_for(&registry, start.elapsed());
    Ok((model, registry, arbitrary_types, stats))
}

fn stats_for(registry: &ArbitraryRegistry<VarId>, solve_time: std::time::Duration) -> CheckerStats {
    let ids: Vec<ArbitraryId> = registry.ids().collect();
    let solver_variable_count: usize = ids
        .iter()
        .map(|&id| registry.handles(id).map(|h| h.len()).unwrap_or(0))
        .sum();
    CheckerStats {
        arbitrary_count: ids.len(),
        solver_variable_count,
        solve_time,
    }
}

fn finish<S: Solver>(
    solver: &S,
    model: Option<S::Model>,
    registry: &ArbitraryRegistry<VarId>,
    arbitrary_types: &HashMap<ArbitraryId, Type>,
    const_keys: &ConstantKeyCollector,
    list_max_length: u32,
    stats: CheckerStats,
) -> CoreResult<(Option<Assignment>, CheckerStats)> {
    match model {
        None => Ok((None, stats)),
        Some(model) => {
            let assignment = reify(
                solver,
                &model,
                arbitrary_types,
                |id| registry.handles(id).map(|h| h.to_vec()),
                const_keys,
                list_max_length,
            )?;
            Ok((Some(assignment), stats))
        }
    }
}

/// `find`, reporting the per-query telemetry alongside the assignment
/// (SPEC_FULL §F.1).
pub fn find_with_stats(predicate: &Expr, args: Args, config: &CheckerConfig) -> CoreResult<(Option<Assignment>, CheckerStats)> {
    let const_keys = collect_const_keys(predicate, None, args);
    match config.backend {
        Backend::Smt => {
            let mut solver = Z3Solver::new();
            solver.set_timeout(config.timeout);
            let (model, registry, arbitrary_types, stats) =
                run_check(&mut solver, &const_keys, config.list_max_length, predicate, args)?;
            finish(&solver, model, &registry, &arbitrary_types, &const_keys, config.list_max_length, stats)
        }
        Backend::DecisionDiagram => {
            log_interleaving_classes(predicate, None, args);
            let plan = plan_dd_vars(&const_keys, config.list_max_length, predicate, None, args)?;
            let mut solver = DdSolver::new(&plan);
            let (model, registry, arbitrary_types, stats) =
                run_check(&mut solver, &const_keys, config.list_max_length, predicate, args)?;
            finish(&solver, model, &registry, &arbitrary_types, &const_keys, config.list_max_length, stats)
        }
    }
}

/// `find(predicate, args, backend) → optional assignment` (§6).
pub fn find(predicate: &Expr, args: Args, config: &CheckerConfig) -> CoreResult<Option<Assignment>> {
    find_with_stats(predicate, args, config).map(|(assignment, _)| assignment)
}

fn optimize_with_stats(
    objective: &Expr,
    constraint: &Expr,
    args: Args,
    config: &CheckerConfig,
    want_max: bool,
) -> CoreResult<(Option<Assignment>, CheckerStats)> {
    let const_keys = collect_const_keys(constraint, Some(objective), args);
    match config.backend {
        Backend::Smt => {
            let mut solver = Z3Solver::new();
            solver.set_timeout(config.timeout);
            solver.set_optimization_context(config.optimization_context);
            let (model, registry, arbitrary_types, stats) = run_optimize(
                &mut solver,
                &const_keys,
                config.list_max_length,
                objective,
                constraint,
                args,
                want_max,
            )?;
            finish(&solver, model, &registry, &arbitrary_types, &const_keys, config.list_max_length, stats)
        }
        Backend::DecisionDiagram => {
            log_interleaving_classes(constraint, Some(objective), args);
            let plan = plan_dd_vars(&const_keys, config.list_max_length, constraint, Some(objective), args)?;
            let mut solver = DdSolver::new(&plan);
            let (model, registry, arbitrary_types, stats) = run_optimize(
                &mut solver,
                &const_keys,
                config.list_max_length,
                objective,
                constraint,
                args,
                want_max,
            )?;
            finish(&solver, model, &registry, &arbitrary_types, &const_keys, config.list_max_length, stats)
        }
    }
}

/// `maximize(objective, constraint, args, backend) → optional assignment` (§6).
pub fn maximize(objective: &Expr, constraint: &Expr, args: Args, config: &CheckerConfig) -> CoreResult<Option<Assignment>> {
    optimize_with_stats(objective, constraint, args, config, true).map(|(a, _)| a)
}

/// `minimize(objective, constraint, args, backend) → optional assignment` (§6).
pub fn minimize(objective: &Expr, constraint: &Expr, args: Args, config: &CheckerConfig) -> CoreResult<Option<Assignment>> {
    optimize_with_stats(objective, constraint, args, config, false).map(|(a, _)| a)
}

/// `find` reified through a single input expression (§6, n = 1).
pub fn find1<I: ValueInterpreter>(
    predicate: &Expr,
    args: Args,
    input1: &Expr,
    interpreter: &I,
    config: &CheckerConfig,
) -> CoreResult<Option<I::Value>> {
    match find(predicate, args, config)? {
        None => Ok(None),
        Some(assignment) => Ok(Some(interpreter.interpret(input1, &assignment)?)),
    }
}

/// `find` reified through two input expressions (§6, n = 2).
pub fn find2<I: ValueInterpreter>(
    predicate: &Expr,
    args: Args,
    input1: &Expr,
    input2: &Expr,
    interpreter: &I,
    config: &CheckerConfig,
) -> CoreResult<Option<(I::Value, I::Value)>> {
    match find(predicate, args, config)? {
        None => Ok(None),
        Some(assignment) => {
            let v1 = interpreter.interpret(input1, &assignment)?;
            let v2 = interpreter.interpret(input2, &assignment)?;
            Ok(Some((v1, v2)))
        }
    }
}

/// `find` reified through three input expressions (§6, n = 3).
pub fn find3<I: ValueInterpreter>(
    predicate: &Expr,
    args: Args,
    input1: &Expr,
    input2: &Expr,
    input3: &Expr,
    interpreter: &I,
    config: &CheckerConfig,
) -> CoreResult<Option<(I::Value, I::Value, I::Value)>> {
    match find(predicate, args, config)? {
        None => Ok(None),
        Some(assignment) => {
            let v1 = interpreter.interpret(input1, &assignment)?;
            let v2 = interpreter.interpret(input2, &assignment)?;
            let v3 = interpreter.interpret(input3, &assignment)?;
            Ok(Some((v1, v2, v3)))
        }
    }
}

/// `find` reified through four input expressions (§6, n = 4).
pub fn find4<I: ValueInterpreter>(
    predicate: &Expr,
    args: Args,
    input1: &Expr,
    input2: &Expr,
    input3: &Expr,
    input4: &Expr,
    interpreter: &I,
    config: &CheckerConfig,
) -> CoreResult<Option<(I::Value, I::Value, I::Value, I::Value)>> {
    match find(predicate, args, config)? {
        None => Ok(None),
        Some(assignment) => {
            let v1 = interpreter.interpret(input1, &assignment)?;
            let v2 = interpreter.interpret(input2, &assignment)?;
            let v3 = interpreter.interpret(input3, &assignment)?;
            let v4 = interpreter.interpret(input4, &assignment)?;
            Ok(Some((v1, v2, v3, v4)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{node, ArithOp, CmpOp, NodeKind};
    use crate::types::ConstValue;

    fn bitvec_arbitrary() -> Expr {
        node(Type::u8(), NodeKind::Arbitrary)
    }

    fn bitvec_const(value: i128) -> Expr {
        node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value, width: 8, signed: false }))
    }

    /// S1 from the end-to-end scenario table: `x * 3 == 21` is satisfied
    /// by exactly `x = 7`.
    #[test]
    fn finds_a_satisfying_bitvector_assignment() {
        let x = bitvec_arbitrary();
        let product = node(
            Type::u8(),
            NodeKind::Arith {
                op: ArithOp::Mul,
                lhs: x.clone(),
                rhs: bitvec_const(3),
            },
        );
        let predicate = node(Type::Bool, NodeKind::Eq { lhs: product, rhs: bitvec_const(21) });

        let config = CheckerConfig::default();
        let assignment = find(&predicate, &[], &config).unwrap().expect("3x = 21 is sat");
        assert_eq!(assignment.get(&x.id), Some(&ConstValue::BitVec { value: 7, width: 8, signed: false }));
    }

    /// S2: `(x > 10) && (x < 5)` over a `u8` has no solution.
    #[test]
    fn reports_none_for_an_unsatisfiable_predicate() {
        let x = bitvec_arbitrary();
        let gt = node(Type::Bool, NodeKind::Cmp { op: CmpOp::Gt, lhs: x.clone(), rhs: bitvec_const(10) });
        let lt = node(Type::Bool, NodeKind::Cmp { op: CmpOp::Lt, lhs: x, rhs: bitvec_const(5) });
        let predicate = node(Type::Bool, NodeKind::And(gt, lt));

        let config = CheckerConfig::default();
        assert!(find(&predicate, &[], &config).unwrap().is_none());
    }

    /// S3: maximizing `x` subject to `x <= 200` over a `u8` saturates at 200.
    #[test]
    fn maximizes_a_bounded_objective() {
        let x = bitvec_arbitrary();
        let constraint = node(Type::Bool, NodeKind::Cmp { op: CmpOp::Le, lhs: x.clone(), rhs: bitvec_const(200) });

        let config = CheckerConfig::default();
        let assignment = maximize(&x, &constraint, &[], &config).unwrap().expect("x <= 200 is sat");
        assert_eq!(assignment.get(&x.id), Some(&ConstValue::BitVec { value: 200, width: 8, signed: false }));
    }

    /// Same S3 query, forced through Z3's dedicated `Optimize` context
    /// instead of the default binary-search-over-plain-solving path —
    /// both must agree on the saturating bound.
    #[test]
    fn maximizes_a_bounded_objective_via_the_dedicated_optimizing_context() {
        let x = bitvec_arbitrary();
        let constraint = node(Type::Bool, NodeKind::Cmp { op: CmpOp::Le, lhs: x.clone(), rhs: bitvec_const(200) });

        let mut config = CheckerConfig::default();
        config.optimization_context = crate::config::OptimizationContext::Optimization;
        let assignment = maximize(&x, &constraint, &[], &config).unwrap().expect("x <= 200 is sat");
        assert_eq!(assignment.get(&x.id), Some(&ConstValue::BitVec { value: 200, width: 8, signed: false }));
    }

    #[test]
    fn decision_diagram_backend_agrees_with_smt_on_a_bitvector_search() {
        let x = bitvec_arbitrary();
        let product = node(
            Type::u8(),
            NodeKind::Arith {
                op: ArithOp::Mul,
                lhs: x.clone(),
                rhs: bitvec_const(3),
            },
        );
        let predicate = node(Type::Bool, NodeKind::Eq { lhs: product, rhs: bitvec_const(21) });

        let mut config = CheckerConfig::default();
        config.backend = Backend::DecisionDiagram;
        let assignment = find(&predicate, &[], &config).unwrap().expect("3x = 21 is sat");
        assert_eq!(assignment.get(&x.id), Some(&ConstValue::BitVec { value: 7, width: 8, signed: false }));
    }
}
