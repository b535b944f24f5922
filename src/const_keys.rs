//! Constant-Key Collector (§4.4).
//!
//! A pre-pass that gathers, per finite-map variable type, the set of
//! concrete key values ever observed — from literal `ConstMapGet`/Set
//! nodes and from literal finite-map constants. The evaluator later
//! materializes a `ConstMap<K,V>` arbitrary as an explicit mapping
//! defined on exactly that key set, so under-collecting here would leave
//! a symbolic map unable to represent a key the constraint actually
//! references.

use crate::ast::{Expr, NodeKind};
use crate::types::{ConstValue, Type};
use std::collections::{HashMap, HashSet};

/// Finite-map types are keyed here by their rendered `Type` (via
/// `Display`) rather than the `Type` itself, since `Type` isn't `Hash`
/// across its recursive `Box` fields in a way that's convenient to reuse
/// as a map key; the collector only needs a stable per-type bucket.
pub type MapTypeKey = String;

#[derive(Default)]
pub struct ConstantKeyCollector {
    cache: HashSet<u64>,
    keys: HashMap<MapTypeKey, HashSet<ConstValue>>,
}

fn map_type_key(key_ty: &Type, value_ty: &Type) -> MapTypeKey {
    format!("const_map<{key_ty},{value_ty}>")
}

impl ConstantKeyCollector {
    pub fn new() -> Self {
        ConstantKeyCollector::default()
    }

    /// Observed key set for a given `ConstMap<K,V>` type, or empty if the
    /// DAG never referenced that type.
    pub fn keys_for(&self, key_ty: &Type, value_ty: &Type) -> HashSet<ConstValue> {
        self.keys
            .get(&map_type_key(key_ty, value_ty))
            .cloned()
            .unwrap_or_default()
    }

    fn observe(&mut self, key_ty: &Type, value_ty: &Type, key: ConstValue) {
        self.keys
            .entry(map_type_key(key_ty, value_ty))
            .or_default()
            .insert(key);
    }

    fn observe_literal_map(&mut self, key_ty: &Type, value_ty: &Type, entries: &[(ConstValue, ConstValue)]) {
        for (k, _) in entries {
            self.observe(key_ty, value_ty, k.clone());
        }
    }

    pub fn collect(&mut self, expr: &Expr) {
        if !self.cache.insert(expr.id) {
            return;
        }
        match &expr.kind {
            NodeKind::Const(value) => self.collect_const(&expr.ty, value),
            NodeKind::Arbitrary | NodeKind::Argument(_) => {}

            NodeKind::Not(a) | NodeKind::BitNot(a) | NodeKind::Convert(a) => self.collect(a),
            NodeKind::And(a, b)
            | NodeKind::Or(a, b)
            | NodeKind::Iff(a, b)
            | NodeKind::SeqConcat(a, b) => {
                self.collect(a);
                self.collect(b);
            }
            NodeKind::If {
                guard,
                then_branch,
                else_branch,
            } => {
                self.collect(guard);
                self.collect(then_branch);
                self.collect(else_branch);
            }
            NodeKind::Arith { lhs, rhs, .. }
            | NodeKind::BitOp { lhs, rhs, .. }
            | NodeKind::Cmp { lhs, rhs, .. }
            | NodeKind::Eq { lhs, rhs } => {
                self.collect(lhs);
                self.collect(rhs);
            }

            NodeKind::RecordCreate(fields) => {
                for (_, value) in fields {
                    self.collect(value);
                }
            }
            NodeKind::RecordGet { record, .. } => self.collect(record),
            NodeKind::RecordSet { record, value, .. } => {
                self.collect(record);
                self.collect(value);
            }

            NodeKind::UnionCreate { payload, .. } => self.collect(payload),
            NodeKind::UnionMatch { scrutinee, arms } => {
                self.collect(scrutinee);
                for arm in arms {
                    self.collect(&arm.body);
                }
            }

            NodeKind::SeqLength(a)
            | NodeKind::ListIsEmpty(a)
            | NodeKind::ListHead(a)
            | NodeKind::ListTail(a) => self.collect(a),
            NodeKind::SeqAt { seq, index } => {
                self.collect(seq);
                self.collect(index);
            }
            NodeKind::SeqContains { seq, elem } | NodeKind::SeqIndexOf { seq, elem } => {
                self.collect(seq);
                self.collect(elem);
            }
            NodeKind::SeqSlice { seq, offset, length } => {
                self.collect(seq);
                self.collect(offset);
                self.collect(length);
            }
            NodeKind::SeqReplace { seq, from, to } => {
                self.collect(seq);
                self.collect(from);
                self.collect(to);
            }

            NodeKind::ListCreate(items) => {
                for item in items {
                    self.collect(item);
                }
            }
            NodeKind::ListCons { head, tail } => {
                self.collect(head);
                self.collect(tail);
            }

            NodeKind::ConstMapGet { map, key } => {
                self.collect(map);
                if let Type::ConstMap(k, v) = &map.ty {
                    self.observe(k, v, key.clone());
                }
            }
            NodeKind::ConstMapSet { map, key, value } => {
                self.collect(map);
                self.collect(value);
                if let Type::ConstMap(k, v) = &map.ty {
                    self.observe(k, v, key.clone());
                }
            }

            NodeKind::ArrayMapGet { map, key } => {
                self.collect(map);
                self.collect(key);
            }
            NodeKind::ArrayMapSet { map, key, value } => {
                self.collect(map);
                self.collect(key);
                self.collect(value);
            }

            NodeKind::OptionSome(a) | NodeKind::OptionIsSome(a) | NodeKind::OptionGet(a) => {
                self.collect(a)
            }
            NodeKind::OptionNone => {}
        }
    }

    /// Literal finite-map constants contribute every key they carry,
    /// and structured constants recurse field/element-wise so a
    /// `ConstMap` nested inside a record or list literal is still found.
    fn collect_const(&mut self, ty: &Type, value: &ConstValue) {
        match (ty, value) {
            (Type::ConstMap(k, v), ConstValue::ConstMap(entries)) => {
                self.observe_literal_map(k, v, entries);
                for (_, val) in entries {
                    self.collect_const(v, val);
                }
            }
            (Type::Map(_, v), ConstValue::Map(entries)) => {
                for (_, val) in entries {
                    self.collect_const(v, val);
                }
            }
            (Type::Record(field_tys), ConstValue::Record(fields)) => {
                for (name, val) in fields {
                    if let Some((_, t)) = field_tys.iter().find(|(n, _)| n == name) {
                        self.collect_const(t, val);
                    }
                }
            }
            (Type::Union(cases), ConstValue::Union { case, payload }) => {
                if let Some((_, t)) = cases.iter().find(|(n, _)| n == case) {
                    self.collect_const(t, payload);
                }
            }
            (Type::Option(inner), ConstValue::Option(Some(payload))) => {
                self.collect_const(inner, payload);
            }
            (Type::Seq(inner), ConstValue::Seq(items)) | (Type::List(inner), ConstValue::List(items)) => {
                for item in items {
                    self.collect_const(inner, item);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node;

    #[test]
    fn collects_keys_from_get_and_set_nodes() {
        let map_ty = Type::ConstMap(Box::new(Type::Seq(Box::new(Type::Char))), Box::new(Type::u8()));
        let map = node(map_ty.clone(), NodeKind::Arbitrary);
        let get_a = node(
            Type::u8(),
            NodeKind::ConstMapGet {
                map: map.clone(),
                key: ConstValue::Seq(vec![ConstValue::Char('a')]),
            },
        );
        let set_b = node(
            map_ty.clone(),
            NodeKind::ConstMapSet {
                map: map.clone(),
                key: ConstValue::Seq(vec![ConstValue::Char('b')]),
                value: node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value: 2, width: 8, signed: false })),
            },
        );
        let both = node(Type::Bool, NodeKind::Eq { lhs: get_a, rhs: node(Type::u8(), NodeKind::ConstMapGet { map: set_b, key: ConstValue::Seq(vec![ConstValue::Char('b')]) }) });

        let mut collector = ConstantKeyCollector::new();
        collector.collect(&both);
        let keys = collector.keys_for(&Type::Seq(Box::new(Type::Char)), &Type::u8());
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&ConstValue::Seq(vec![ConstValue::Char('a')])));
        assert!(keys.contains(&ConstValue::Seq(vec![ConstValue::Char('b')])));
    }

    #[test]
    fn memoizes_by_node_identity() {
        let map_ty = Type::ConstMap(Box::new(Type::u8()), Box::new(Type::Bool));
        let map = node(map_ty, NodeKind::Arbitrary);
        let get_node = node(
            Type::Bool,
            NodeKind::ConstMapGet {
                map: map.clone(),
                key: ConstValue::BitVec { value: 1, width: 8, signed: false },
            },
        );
        let shared = node(Type::Bool, NodeKind::And(get_node.clone(), get_node.clone()));

        let mut collector = ConstantKeyCollector::new();
        collector.collect(&shared);
        let keys = collector.keys_for(&Type::u8(), &Type::Bool);
        assert_eq!(keys.len(), 1);
    }
}
