//! The Value Interpreter — consumed external interface (§6 "Consumed
//! interfaces": "Value interpreter").
//!
//! The core does not materialize witnesses itself; it hands the reified
//! assignment (arbitrary-expression identity → concrete primitive) to a
//! caller-supplied interpreter, which evaluates the *characteristic
//! expression* the same way the front-end's own expression interpreter
//! would. This keeps the expensive, general-purpose AST interpreter
//! (pattern matching, user-defined functions, the rest of the front end)
//! strictly out of this crate's scope (§1) while still letting
//! `StateSet::element` and `find`'s n-input reified variants hand back a
//! host-level typed value instead of a bag of `ConstValue`s.

use crate::ast::Expr;
use crate::error::CoreResult;
use crate::reify::Assignment;

/// Evaluates an arbitrary expression to a concrete, host-level value
/// given a full assignment to its free `Arbitrary` nodes. Implementors
/// typically wrap the same interpreter the front-end uses to run
/// ordinary (non-symbolic) expressions, with `Arbitrary` nodes treated
/// as looked-up constants rather than re-generated.
pub trait ValueInterpreter {
    /// The host-level type this interpreter produces. `StateSet<Self>`
    /// and the n-input `find` variants return this type.
    type Value;

    fn interpret(&self, expr: &Expr, assignment: &Assignment) -> CoreResult<Self::Value>;
}
