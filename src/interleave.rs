//! Variable-Interleaving Analyzer (§4.3).
//!
//! A pre-pass over the expression tree producing an equivalence relation
//! over arbitrary-expression identities: variables that appear together
//! in an arithmetic, equality, or relational subexpression must share a
//! decision-diagram variable ordering so the DD backend can represent
//! their correlation efficiently (§9 "Interleaving").

use crate::ast::{ArbitraryId, Expr, NodeKind};
use std::collections::{BTreeSet, HashMap};

/// Union-find over arbitrary-expression identities (§3 "Interleaving
/// data"). Classic union-by-rank with path compression, hand-rolled
/// since this is a self-contained ~20-line structure, not an ambient
/// concern like logging or serialization.
#[derive(Default)]
pub struct UnionFind {
    parent: HashMap<ArbitraryId, ArbitraryId>,
    rank: HashMap<ArbitraryId, u32>,
}

impl UnionFind {
    pub fn new() -> Self {
        UnionFind::default()
    }

    fn ensure(&mut self, id: ArbitraryId) {
        self.parent.entry(id).or_insert(id);
        self.rank.entry(id).or_insert(0);
    }

    pub fn find(&mut self, id: ArbitraryId) -> ArbitraryId {
        self.ensure(id);
        if self.parent[&id] != id {
            let root = self.find(self.parent[&id]);
            self.parent.insert(id, root);
        }
        self.parent[&id]
    }

    pub fn union(&mut self, a: ArbitraryId, b: ArbitraryId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (ra, rb) = if self.rank[&ra] < self.rank[&rb] {
            (rb, ra)
        } else {
            (ra, rb)
        };
        self.parent.insert(rb, ra);
        if self.rank[&ra] == self.rank[&rb] {
            *self.rank.get_mut(&ra).unwrap() += 1;
        }
    }

    /// Equivalence classes, each a set of arbitrary-expression
    /// identities that must be interleaved together, ordered by the
    /// smallest member id so output is deterministic.
    pub fn classes(&mut self) -> Vec<Vec<ArbitraryId>> {
        let ids: Vec<ArbitraryId> = self.parent.keys().copied().collect();
        let mut groups: HashMap<ArbitraryId, Vec<ArbitraryId>> = HashMap::new();
        for id in ids {
            let root = self.find(id);
            groups.entry(root).or_default().push(id);
        }
        let mut classes: Vec<Vec<ArbitraryId>> = groups.into_values().collect();
        for class in &mut classes {
            class.sort_unstable();
        }
        classes.sort_by_key(|c| c[0]);
        classes
    }
}

/// Per-node interleaving result (§4.3 algorithm): either a flat set of
/// arbitrary identities, or a record-structured result mirroring the
/// node's type, so record/union-valued subexpressions combine
/// field-by-field rather than collapsing into one opaque set.
#[derive(Clone, Debug)]
pub enum InterleaveResult {
    Flat(BTreeSet<ArbitraryId>),
    Record(Vec<(String, InterleaveResult)>),
}

impl InterleaveResult {
    fn empty() -> Self {
        InterleaveResult::Flat(BTreeSet::new())
    }

    fn singleton(id: ArbitraryId) -> Self {
        let mut set = BTreeSet::new();
        set.insert(id);
        InterleaveResult::Flat(set)
    }

    fn is_empty_flat(&self) -> bool {
        matches!(self, InterleaveResult::Flat(s) if s.is_empty())
    }

    /// Pointwise union, used at choice points (if/then/else branches,
    /// Boolean connectives).
    fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (InterleaveResult::Flat(a), InterleaveResult::Flat(b)) => {
                InterleaveResult::Flat(a.union(b).copied().collect())
            }
            (InterleaveResult::Record(a), InterleaveResult::Record(b)) => {
                InterleaveResult::Record(
                    a.iter()
                        .zip(b.iter())
                        .map(|((name, ra), (_, rb))| (name.clone(), ra.union(rb)))
                        .collect(),
                )
            }
            // A flat empty set (e.g. from a constant) unions harmlessly
            // with a record result.
            (InterleaveResult::Record(r), InterleaveResult::Flat(s)) if s.is_empty() => {
                InterleaveResult::Record(r.clone())
            }
            (InterleaveResult::Flat(s), InterleaveResult::Record(r)) if s.is_empty() => {
                InterleaveResult::Record(r.clone())
            }
            (a, _) => a.clone(),
        }
    }

    fn flatten(&self) -> BTreeSet<ArbitraryId> {
        match self {
            InterleaveResult::Flat(s) => s.clone(),
            InterleaveResult::Record(fields) => {
                fields.iter().flat_map(|(_, r)| r.flatten()).collect()
            }
        }
    }
}

pub struct InterleavingAnalyzer {
    uf: UnionFind,
    cache: HashMap<u64, InterleaveResult>,
}

impl InterleavingAnalyzer {
    pub fn new() -> Self {
        InterleavingAnalyzer {
            uf: UnionFind::new(),
            cache: HashMap::new(),
        }
    }

    pub fn into_union_find(self) -> UnionFind {
        self.uf
    }

    pub fn analyze(&mut self, expr: &Expr) -> InterleaveResult {
        if let Some(cached) = self.cache.get(&expr.id) {
            return cached.clone();
        }
        let result = self.visit(expr);
        self.cache.insert(expr.id, result.clone());
        result
    }

    /// Combine (§4.3): unions the classes of every pair of variables
    /// from the two operand results that share an element type. Boolean
    /// operands contribute no correlation (a Boolean is one bit; there
    /// is nothing to interleave it against).
    fn combine(&mut self, a: &InterleaveResult, b: &InterleaveResult, boolean_operand: bool) -> InterleaveResult {
        let union_result = a.union(b);
        if boolean_operand {
            return union_result;
        }
        let set_a = a.flatten();
        let set_b = b.flatten();
        for &va in &set_a {
            for &vb in &set_b {
                self.uf.union(va, vb);
            }
        }
        union_result
    }

    fn visit(&mut self, expr: &Expr) -> InterleaveResult {
        match &expr.kind {
            NodeKind::Const(_) => InterleaveResult::empty(),
            NodeKind::Arbitrary => InterleaveResult::singleton(expr.id),
            NodeKind::Argument(_) => InterleaveResult::empty(),

            NodeKind::Not(a) => self.analyze(a),
            NodeKind::And(a, b) | NodeKind::Or(a, b) | NodeKind::Iff(a, b) => {
                let ra = self.analyze(a);
                let rb = self.analyze(b);
                ra.union(&rb)
            }
            NodeKind::If {
                guard,
                then_branch,
                else_branch,
            } => {
                let _ = self.analyze(guard);
                let rt = self.analyze(then_branch);
                let re = self.analyze(else_branch);
                rt.union(&re)
            }

            NodeKind::Arith { lhs, rhs, .. } | NodeKind::BitOp { lhs, rhs, .. } => {
                let ra = self.analyze(lhs);
                let rb = self.analyze(rhs);
                self.combine(&ra, &rb, false)
            }
            NodeKind::BitNot(a) => self.analyze(a),
            NodeKind::Cmp { lhs, rhs, .. } | NodeKind::Eq { lhs, rhs } => {
                let ra = self.analyze(lhs);
                let rb = self.analyze(rhs);
                let boolean_operand = matches!(lhs.ty, crate::types::Type::Bool)
                    || matches!(rhs.ty, crate::types::Type::Bool);
                self.combine(&ra, &rb, boolean_operand)
            }

            NodeKind::RecordCreate(fields) => InterleaveResult::Record(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), self.analyze(value)))
                    .collect(),
            ),
            NodeKind::RecordGet { record, field } => match self.analyze(record) {
                InterleaveResult::Record(fields) => fields
                    .into_iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, r)| r)
                    .unwrap_or_else(InterleaveResult::empty),
                flat => flat,
            },
            NodeKind::RecordSet {
                record,
                field,
                value,
            } => {
                let base = self.analyze(record);
                let new_value = self.analyze(value);
                match base {
                    InterleaveResult::Record(mut fields) => {
                        for (name, r) in fields.iter_mut() {
                            if name == field {
                                *r = new_value.clone();
                            }
                        }
                        InterleaveResult::Record(fields)
                    }
                    other => other,
                }
            }

            NodeKind::UnionCreate { payload, .. } => self.analyze(payload),
            NodeKind::UnionMatch { scrutinee, arms } => {
                let mut result = self.analyze(scrutinee);
                for arm in arms {
                    let body = self.analyze(&arm.body);
                    result = result.union(&body);
                }
                result
            }

            NodeKind::SeqConcat(a, b) => {
                let ra = self.analyze(a);
                let rb = self.analyze(b);
                ra.union(&rb)
            }
            NodeKind::SeqLength(a)
            | NodeKind::ListIsEmpty(a)
            | NodeKind::ListHead(a)
            | NodeKind::ListTail(a) => self.analyze(a),
            NodeKind::SeqAt { seq, index } | NodeKind::SeqContains { seq, elem: index } | NodeKind::SeqIndexOf { seq, elem: index } => {
                let ra = self.analyze(seq);
                let rb = self.analyze(index);
                ra.union(&rb)
            }
            NodeKind::SeqSlice { seq, offset, length } => {
                let r = self.analyze(seq);
                let ro = self.analyze(offset);
                let rl = self.analyze(length);
                r.union(&ro).union(&rl)
            }
            NodeKind::SeqReplace { seq, from, to } => {
                let r = self.analyze(seq);
                let rf = self.analyze(from);
                let rt = self.analyze(to);
                r.union(&rf).union(&rt)
            }

            NodeKind::ListCreate(items) => {
                let mut result = InterleaveResult::empty();
                for item in items {
                    result = result.union(&self.analyze(item));
                }
                result
            }
            NodeKind::ListCons { head, tail } => {
                let rh = self.analyze(head);
                let rt = self.analyze(tail);
                rh.union(&rt)
            }

            NodeKind::ConstMapGet { map, .. } => self.analyze(map),
            NodeKind::ConstMapSet { map, value, .. } => {
                let r = self.analyze(map);
                let v = self.analyze(value);
                r.union(&v)
            }

            NodeKind::ArrayMapGet { map, key } => {
                let r = self.analyze(map);
                let k = self.analyze(key);
                self.combine(&r, &k, false)
            }
            NodeKind::ArrayMapSet { map, key, value } => {
                let r = self.analyze(map);
                let k = self.analyze(key);
                let v = self.analyze(value);
                let combined = self.combine(&r, &k, false);
                combined.union(&v)
            }

            NodeKind::Convert(a) => self.analyze(a),

            NodeKind::OptionSome(a) | NodeKind::OptionIsSome(a) | NodeKind::OptionGet(a) => {
                self.analyze(a)
            }
            NodeKind::OptionNone => InterleaveResult::empty(),
        }
    }
}

impl Default for InterleavingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{node, ArithOp, NodeKind};
    use crate::types::Type;

    #[test]
    fn arithmetic_combine_unions_operand_classes() {
        let x = node(Type::u8(), NodeKind::Arbitrary);
        let y = node(Type::u8(), NodeKind::Arbitrary);
        let sum = node(
            Type::u8(),
            NodeKind::Arith {
                op: ArithOp::Add,
                lhs: x.clone(),
                rhs: y.clone(),
            },
        );

        let mut analyzer = InterleavingAnalyzer::new();
        analyzer.analyze(&sum);
        let mut uf = analyzer.into_union_find();
        assert_eq!(uf.find(x.id), uf.find(y.id));
    }

    #[test]
    fn disjoint_boolean_combinations_do_not_interleave() {
        let x = node(Type::Bool, NodeKind::Arbitrary);
        let y = node(Type::Bool, NodeKind::Arbitrary);
        let both = node(Type::Bool, NodeKind::And(x.clone(), y.clone()));

        let mut analyzer = InterleavingAnalyzer::new();
        analyzer.analyze(&both);
        let mut uf = analyzer.into_union_find();
        assert_ne!(uf.find(x.id), uf.find(y.id));
    }
}
