//! S4 from the end-to-end scenario table (§8): searching for a
//! satisfying assignment to an `Option<u16>` arbitrary.

use symcheck_core::checker::find;
use symcheck_core::config::CheckerConfig;
use symcheck_core::ast::{node, NodeKind};
use symcheck_core::types::{ConstValue, Type};

fn u16_const(value: i128) -> symcheck_core::ast::Expr {
    node(Type::u16(), NodeKind::Const(ConstValue::BitVec { value, width: 16, signed: false }))
}

/// `arbitrary option<u16> o; P = is_some(o) && (value(o) == 1000)` must
/// reify to `Some(1000)`.
#[test]
fn finds_a_present_option_with_the_expected_payload() {
    let o = node(Type::Option(Box::new(Type::u16())), NodeKind::Arbitrary);

    let is_some = node(Type::Bool, NodeKind::OptionIsSome(o.clone()));
    let payload = node(Type::u16(), NodeKind::OptionGet(o.clone()));
    let payload_is_1000 = node(Type::Bool, NodeKind::Eq { lhs: payload, rhs: u16_const(1000) });
    let predicate = node(Type::Bool, NodeKind::And(is_some, payload_is_1000));

    let config = CheckerConfig::default();
    let assignment = find(&predicate, &[], &config).unwrap().expect("a present option with payload 1000 is sat");

    match assignment.get(&o.id) {
        Some(ConstValue::Option(Some(payload))) => {
            assert_eq!(**payload, ConstValue::BitVec { value: 1000, width: 16, signed: false });
        }
        other => panic!("expected Some(1000), got {other:?}"),
    }
}

fn u8_const(value: i128) -> symcheck_core::ast::Expr {
    node(Type::u8(), NodeKind::Const(ConstValue::BitVec { value, width: 8, signed: false }))
}

/// A record arbitrary with an `OptionGet`-like field update: setting one
/// field of a two-field record must leave the other field free. If
/// `RecordSet` buggily touched every field instead of only the named
/// one, constraining `y` to a value other than what `x` is set to would
/// make this unsatisfiable.
#[test]
fn record_set_replaces_only_the_named_field() {
    let record_ty = Type::Record(vec![
        ("x".to_string(), Type::u8()),
        ("y".to_string(), Type::u8()),
    ]);
    let r = node(record_ty.clone(), NodeKind::Arbitrary);
    let updated = node(
        record_ty,
        NodeKind::RecordSet {
            record: r.clone(),
            field: "x".to_string(),
            value: u8_const(10),
        },
    );
    let x_field = node(Type::u8(), NodeKind::RecordGet { record: updated.clone(), field: "x".to_string() });
    let y_field = node(Type::u8(), NodeKind::RecordGet { record: updated, field: "y".to_string() });
    let x_is_10 = node(Type::Bool, NodeKind::Eq { lhs: x_field, rhs: u8_const(10) });
    let y_is_77 = node(Type::Bool, NodeKind::Eq { lhs: y_field, rhs: u8_const(77) });
    let predicate = node(Type::Bool, NodeKind::And(x_is_10, y_is_77));

    let config = CheckerConfig::default();
    let assignment = find(&predicate, &[], &config).unwrap().expect("x=10 alongside an untouched y=77 is sat");

    match assignment.get(&r.id) {
        Some(ConstValue::Record(fields)) => {
            let by_name: std::collections::HashMap<&str, ConstValue> =
                fields.iter().map(|(n, v)| (n.as_str(), v.clone())).collect();
            assert_eq!(by_name.get("y"), Some(&ConstValue::BitVec { value: 77, width: 8, signed: false }));
        }
        other => panic!("expected a reified record, got {other:?}"),
    }
}
