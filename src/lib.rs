#![cfg_attr(test, allow(warnings))]

pub mod ast;
pub mod backend; // Backend discovery and per-query telemetry
pub mod checker; // Model Checker façade: find / maximize / minimize
pub mod config; // CheckerConfig: Backend, ListMaxLength, Timeout, OptimizationContext
pub mod const_keys; // Constant-Key Collector pre-pass
pub mod dd_plan; // Decision-diagram variable allocation planning
pub mod env; // Per-query environments (argument env, memo cache, arbitrary registry)
pub mod error; // Unsupported / Timeout / SolverFailure / InvariantViolated
pub mod evaluator; // Symbolic Evaluator
pub mod interleave; // Variable-Interleaving Analyzer
pub mod interpreter; // Value Interpreter consumed interface
pub mod reify; // Witness Reifier
pub mod solver; // Solver Abstraction (SMT + decision-diagram backends)
pub mod state_set; // Reachable-Set Engine: StateSet<T>
pub mod types; // Declared types of the expression AST
pub mod value; // Symbolic Value Lattice
pub mod witness; // Human-readable witness rendering

pub use checker::{find, find1, find2, find3, find4, maximize, minimize};
pub use config::{Backend, CheckerConfig, OptimizationContext};
pub use error::{CoreError, CoreResult};
pub use reify::Assignment;
