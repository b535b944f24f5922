//! S5 from the end-to-end scenario table (§8): a `ConstMap` arbitrary
//! constrained at two string keys reifies with exactly those two keys
//! present and no others.

use symcheck_core::checker::find;
use symcheck_core::config::CheckerConfig;
use symcheck_core::ast::{node, NodeKind};
use symcheck_core::types::{ConstValue, Type};

fn key(s: &str) -> ConstValue {
    ConstValue::Seq(s.chars().map(ConstValue::Char).collect())
}

fn u8_const(value: i128) -> symcheck_core::ast::Expr {
    node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value, width: 8, signed: false }))
}

/// `arbitrary ConstMap<string,u8> m; P = (m["a"] == 1) && (m["b"] == 2)`.
#[test]
fn finite_map_reifies_exactly_the_constrained_keys() {
    let map_ty = Type::ConstMap(Box::new(Type::Seq(Box::new(Type::Char))), Box::new(Type::u8()));
    let m = node(map_ty, NodeKind::Arbitrary);

    let get_a = node(Type::u8(), NodeKind::ConstMapGet { map: m.clone(), key: key("a") });
    let get_b = node(Type::u8(), NodeKind::ConstMapGet { map: m.clone(), key: key("b") });
    let a_is_1 = node(Type::Bool, NodeKind::Eq { lhs: get_a, rhs: u8_const(1) });
    let b_is_2 = node(Type::Bool, NodeKind::Eq { lhs: get_b, rhs: u8_const(2) });
    let predicate = node(Type::Bool, NodeKind::And(a_is_1, b_is_2));

    let config = CheckerConfig::default();
    let assignment = find(&predicate, &[], &config).unwrap().expect("m[a]=1, m[b]=2 is sat");

    match assignment.get(&m.id) {
        Some(ConstValue::ConstMap(entries)) => {
            let mut by_key = std::collections::HashMap::new();
            for (k, v) in entries {
                by_key.insert(k.clone(), v.clone());
            }
            assert_eq!(
                by_key.get(&key("a")),
                Some(&ConstValue::BitVec { value: 1, width: 8, signed: false })
            );
            assert_eq!(
                by_key.get(&key("b")),
                Some(&ConstValue::BitVec { value: 2, width: 8, signed: false })
            );
            assert_eq!(entries.len(), 2, "only the two observed keys should be materialized");
        }
        other => panic!("expected a reified ConstMap, got {other:?}"),
    }
}
