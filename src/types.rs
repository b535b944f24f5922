//! The declared types of the expression AST (§3 "Expression AST").
//!
//! This is the input contract: the front-end expression builder is out of
//! scope (§1), but the core must still know the type lattice it evaluates
//! against, since every symbolic value is well-typed against the node it
//! came from (§3 invariant).

use std::fmt;

/// A declared expression-level type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    /// Fixed-width integer, signed or unsigned, widths 8/16/32/64.
    BitVec { width: u32, signed: bool },
    /// Unbounded (arbitrary-precision) integer.
    Int,
    Real,
    Char,
    Seq(Box<Type>),
    List(Box<Type>),
    Option(Box<Type>),
    /// Finite-key map; symbolic representation is an explicit mapping over
    /// the keys the constant-key pass observed.
    ConstMap(Box<Type>, Box<Type>),
    /// Array-backed map, symbolic representation uses solver select/store.
    Map(Box<Type>, Box<Type>),
    Record(Vec<(String, Type)>),
    Union(Vec<(String, Type)>),
}

impl Type {
    pub fn u8() -> Type {
        Type::BitVec { width: 8, signed: false }
    }
    pub fn u16() -> Type {
        Type::BitVec { width: 16, signed: false }
    }
    pub fn u32() -> Type {
        Type::BitVec { width: 32, signed: false }
    }
    pub fn u64() -> Type {
        Type::BitVec { width: 64, signed: false }
    }
    pub fn i8() -> Type {
        Type::BitVec { width: 8, signed: true }
    }
    pub fn i16() -> Type {
        Type::BitVec { width: 16, signed: true }
    }
    pub fn i32() -> Type {
        Type::BitVec { width: 32, signed: true }
    }
    pub fn i64() -> Type {
        Type::BitVec { width: 64, signed: true }
    }

    /// Structural types the decision-diagram backend cannot represent
    /// (§6: "rejects expressions containing unbounded integers, reals,
    /// sequences, or characters").
    pub fn is_dd_representable(&self) -> bool {
        match self {
            Type::Bool | Type::BitVec { .. } => true,
            Type::Int | Type::Real | Type::Char | Type::Seq(_) => false,
            Type::List(elem) => elem.is_dd_representable(),
            Type::Option(inner) => inner.is_dd_representable(),
            Type::ConstMap(_, v) | Type::Map(_, v) => v.is_dd_representable(),
            Type::Record(fields) => fields.iter().all(|(_, t)| t.is_dd_representable()),
            Type::Union(cases) => cases.iter().all(|(_, t)| t.is_dd_representable()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::BitVec { width, signed } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, width)
            }
            Type::Int => write!(f, "int"),
            Type::Real => write!(f, "real"),
            Type::Char => write!(f, "char"),
            Type::Seq(t) => write!(f, "seq<{t}>"),
            Type::List(t) => write!(f, "list<{t}>"),
            Type::Option(t) => write!(f, "option<{t}>"),
            Type::ConstMap(k, v) => write!(f, "const_map<{k},{v}>"),
            Type::Map(k, v) => write!(f, "map<{k},{v}>"),
            Type::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {t}")?;
                }
                write!(f, "}}")
            }
            Type::Union(cases) => {
                write!(f, "(")?;
                for (i, (name, t)) in cases.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{name}({t})")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A concrete, host-side literal value. Exact-precision arithmetic is not
/// required for literals (only for solver-side symbolic `Int`/`Real`
/// terms, which Z3 represents natively); `i128`/rational pairs are ample
/// for every literal a caller constructs by hand. See DESIGN.md for the
/// open-question disposition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Bool(bool),
    BitVec { value: i128, width: u32, signed: bool },
    Int(i128),
    /// Exact rational `numerator / denominator`.
    Real { numerator: i64, denominator: i64 },
    Char(char),
    Seq(Vec<ConstValue>),
    List(Vec<ConstValue>),
    Option(Option<Box<ConstValue>>),
    ConstMap(Vec<(ConstValue, ConstValue)>),
    Map(Vec<(ConstValue, ConstValue)>),
    Record(Vec<(String, ConstValue)>),
    Union { case: String, payload: Box<ConstValue> },
}

impl ConstValue {
    pub fn ty(&self) -> Type {
        match self {
            ConstValue::Bool(_) => Type::Bool,
            ConstValue::BitVec { width, signed, .. } => Type::BitVec { width: *width, signed: *signed },
            ConstValue::Int(_) => Type::Int,
            ConstValue::Real { .. } => Type::Real,
            ConstValue::Char(_) => Type::Char,
            ConstValue::Seq(xs) => Type::Seq(Box::new(xs.first().map(|x| x.ty()).unwrap_or(Type::Bool))),
            ConstValue::List(xs) => Type::List(Box::new(xs.first().map(|x| x.ty()).unwrap_or(Type::Bool))),
            ConstValue::Option(o) => Type::Option(Box::new(
                o.as_ref().map(|v| v.ty()).unwrap_or(Type::Bool),
            )),
            ConstValue::ConstMap(entries) => {
                let (k, v) = entries
                    .first()
                    .map(|(k, v)| (k.ty(), v.ty()))
                    .unwrap_or((Type::Bool, Type::Bool));
                Type::ConstMap(Box::new(k), Box::new(v))
            }
            ConstValue::Map(entries) => {
                let (k, v) = entries
                    .first()
                    .map(|(k, v)| (k.ty(), v.ty()))
                    .unwrap_or((Type::Bool, Type::Bool));
                Type::Map(Box::new(k), Box::new(v))
            }
            ConstValue::Record(fields) => {
                Type::Record(fields.iter().map(|(n, v)| (n.clone(), v.ty())).collect())
            }
            ConstValue::Union { payload, case } => {
                Type::Union(vec![(case.clone(), payload.ty())])
            }
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::BitVec { value, .. } => write!(f, "{value}"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Real { numerator, denominator } => write!(f, "{numerator}/{denominator}"),
            ConstValue::Char(c) => write!(f, "{c:?}"),
            ConstValue::Seq(items) => {
                write!(f, "\"")?;
                for item in items {
                    if let ConstValue::Char(c) = item {
                        write!(f, "{c}")?;
                    }
                }
                write!(f, "\"")
            }
            ConstValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ConstValue::Option(None) => write!(f, "None"),
            ConstValue::Option(Some(v)) => write!(f, "Some({v})"),
            ConstValue::ConstMap(entries) | ConstValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            ConstValue::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                write!(f, "}}")
            }
            ConstValue::Union { case, payload } => write!(f, "{case}({payload})"),
        }
    }
}
