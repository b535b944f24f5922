//! The expression AST — the input contract (§3, §6 "Expression AST provider").
//!
//! A rooted, shared, immutable DAG of typed nodes. Node identity is a
//! monotonic id assigned at construction time and preserved across `Rc`
//! clones, which is what the memoization cache and the arbitrary registry
//! key on. The front-end that builds these trees (syntactic sugar, name
//! resolution, static typing) is out of scope — this crate only consumes
//! the DAG.

use crate::types::{ConstValue, Type};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub type NodeId = u64;
pub type ArgId = u32;
pub type ArbitraryId = u64;

/// A shared, reference-counted handle to a node. Two `Expr`s that came
/// from the same `Rc::clone` share identity; two structurally identical
/// but independently built nodes do not (and need not — the builder is
/// responsible for sharing common subexpressions).
pub type Expr = Rc<ExprNode>;

#[derive(Debug)]
pub struct ExprNode {
    pub id: NodeId,
    pub ty: Type,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug)]
pub enum NodeKind {
    Const(ConstValue),

    /// A free symbolic variable (§3 "arbitrary"). Two distinct `Arbitrary`
    /// nodes never share an id even if they denote the same type.
    Arbitrary,

    /// Reference to a caller-bound argument identifier (§3 "Argument
    /// environment").
    Argument(ArgId),

    Not(Expr),
    And(Expr, Expr),
    Or(Expr, Expr),
    Iff(Expr, Expr),

    If {
        guard: Expr,
        then_branch: Expr,
        else_branch: Expr,
    },

    Arith {
        op: ArithOp,
        lhs: Expr,
        rhs: Expr,
    },
    BitOp {
        op: BitOp,
        lhs: Expr,
        rhs: Expr,
    },
    BitNot(Expr),
    Cmp {
        op: CmpOp,
        lhs: Expr,
        rhs: Expr,
    },
    Eq {
        lhs: Expr,
        rhs: Expr,
    },

    RecordCreate(Vec<(String, Expr)>),
    RecordGet {
        record: Expr,
        field: String,
    },
    RecordSet {
        record: Expr,
        field: String,
        value: Expr,
    },

    UnionCreate {
        case: String,
        payload: Expr,
    },
    /// Matches on the active tag, binding the payload to `bound_arg` in
    /// each arm's body.
    UnionMatch {
        scrutinee: Expr,
        arms: Vec<UnionArm>,
    },

    SeqConcat(Expr, Expr),
    SeqLength(Expr),
    SeqAt {
        seq: Expr,
        index: Expr,
    },
    SeqContains {
        seq: Expr,
        elem: Expr,
    },
    SeqIndexOf {
        seq: Expr,
        elem: Expr,
    },
    SeqSlice {
        seq: Expr,
        offset: Expr,
        length: Expr,
    },
    SeqReplace {
        seq: Expr,
        from: Expr,
        to: Expr,
    },

    ListCreate(Vec<Expr>),
    ListCons {
        head: Expr,
        tail: Expr,
    },
    ListIsEmpty(Expr),
    ListHead(Expr),
    ListTail(Expr),

    ConstMapGet {
        map: Expr,
        key: ConstValue,
    },
    ConstMapSet {
        map: Expr,
        key: ConstValue,
        value: Expr,
    },

    /// Wraps a value of the node's `Option(T)` element type as present.
    OptionSome(Expr),
    /// The absent value of whatever `Option(T)` the node's declared type
    /// names; carries no child since there is nothing to wrap.
    OptionNone,
    OptionIsSome(Expr),
    /// Extracts the payload of a present option. Absent-option behavior
    /// is backend-defined (the evaluator returns the element type's
    /// default), matching `ConstMapGet`'s default-on-absent-key rule.
    OptionGet(Expr),

    ArrayMapGet {
        map: Expr,
        key: Expr,
    },
    ArrayMapSet {
        map: Expr,
        key: Expr,
        value: Expr,
    },

    /// Bit-width change: widening sign- or zero-extends per `ty`'s
    /// signedness, narrowing truncates.
    Convert(Expr),
}

#[derive(Debug)]
pub struct UnionArm {
    pub case: String,
    pub bound_arg: ArgId,
    pub body: Expr,
}

fn fresh_id() -> NodeId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Builder entry point. Front-ends out of scope for this crate still need
/// *some* way to hand us a DAG; this is the minimal constructor surface
/// the evaluator's invariant (§3) requires: every node's declared type
/// matches its kind.
pub fn node(ty: Type, kind: NodeKind) -> Expr {
    Rc::new(ExprNode {
        id: fresh_id(),
        ty,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique_even_for_structurally_identical_nodes() {
        let a = node(Type::Bool, NodeKind::Const(ConstValue::Bool(true)));
        let b = node(Type::Bool, NodeKind::Const(ConstValue::Bool(true)));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn rc_clone_preserves_identity() {
        let a = node(Type::Bool, NodeKind::Arbitrary);
        let b = Rc::clone(&a);
        assert_eq!(a.id, b.id);
        assert!(Rc::ptr_eq(&a, &b));
    }
}
