//! Expression trees and type tags for the polyglot test corpus.
//!
//! The corpus expressions are Python; the upstream extractor hands them over
//! already parsed, in the shape below. Trees are immutable once built.

use serde::{Deserialize, Serialize};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mult => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::FloorDiv => write!(f, "//"),
            BinOp::Mod => write!(f, "%"),
            BinOp::Pow => write!(f, "**"),
            BinOp::BitAnd => write!(f, "&"),
            BinOp::BitOr => write!(f, "|"),
            BinOp::BitXor => write!(f, "^"),
            BinOp::LShift => write!(f, "<<"),
            BinOp::RShift => write!(f, ">>"),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// `-x`
    USub,
    /// `+x`
    UAdd,
    /// `not x`
    Not,
    /// `~x`
    Invert,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Lt,
    Gt,
    LtE,
    GtE,
    Eq,
    NotEq,
    In,
    NotIn,
    Is,
    IsNot,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmpOp::Lt => write!(f, "<"),
            CmpOp::Gt => write!(f, ">"),
            CmpOp::LtE => write!(f, "<="),
            CmpOp::GtE => write!(f, ">="),
            CmpOp::Eq => write!(f, "=="),
            CmpOp::NotEq => write!(f, "!="),
            CmpOp::In => write!(f, "in"),
            CmpOp::NotIn => write!(f, "not in"),
            CmpOp::Is => write!(f, "is"),
            CmpOp::IsNot => write!(f, "is not"),
        }
    }
}

/// A keyword argument (`name=value`) of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub arg: String,
    pub value: Expr,
}

/// One `for target in iter if ...` clause of a comprehension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    #[serde(default)]
    pub ifs: Vec<Expr>,
}

/// What goes between the brackets of a subscript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Index {
    /// `v[x]`
    Index(Expr),
    /// `v[lower:upper:step]`, every part optional
    Slice {
        lower: Option<Expr>,
        upper: Option<Expr>,
        step: Option<Expr>,
    },
    /// `v[a:b, c]`
    ExtSlice(Vec<Index>),
}

/// A Python expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", content = "value", rename_all = "snake_case")]
pub enum Expr {
    Bool(bool),
    /// `None`
    Null,
    /// Integer literal, decimal digits as written (never negative, Python
    /// parses `-1` as a unary minus).
    Int(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Call {
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        keywords: Vec<Keyword>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `left op0 c0 op1 c1 ...`, chains kept as written
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    Dict(Vec<(Expr, Expr)>),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Index>,
    },
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
}

impl Expr {
    pub fn int(n: i128) -> Self {
        if n < 0 {
            Expr::unary(UnaryOp::USub, Expr::Int(n.unsigned_abs().to_string()))
        } else {
            Expr::Int(n.to_string())
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        Expr::Str(s.into())
    }

    pub fn name(id: impl Into<String>) -> Self {
        Expr::Name(id.into())
    }

    pub fn attr(value: Expr, attr: impl Into<String>) -> Self {
        Expr::Attribute {
            value: Box::new(value),
            attr: attr.into(),
        }
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
            keywords: Vec::new(),
        }
    }

    pub fn call_kw(func: Expr, args: Vec<Expr>, keywords: Vec<Keyword>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
            keywords,
        }
    }

    pub fn binop(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn subscript(value: Expr, index: Index) -> Self {
        Expr::Subscript {
            value: Box::new(value),
            index: Box::new(index),
        }
    }

    /// `r.<attr>`
    pub fn r(attr: impl Into<String>) -> Self {
        Expr::attr(Expr::name("r"), attr)
    }

    /// Whether this is a bare name with the given identifier.
    pub fn is_name(&self, id: &str) -> bool {
        matches!(self, Expr::Name(n) if n == id)
    }

    /// Whether this is `root.attr` for a bare name `root`.
    pub fn is_attr_of(&self, root: &str, attr: &str) -> bool {
        matches!(self, Expr::Attribute { value, attr: a } if a == attr && value.is_name(root))
    }

    /// `None` or the corpus's `null` alias.
    pub fn is_null(&self) -> bool {
        matches!(self, Expr::Null) || self.is_name("null")
    }

    /// Integer value of a literal, or of a negated literal.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Expr::Int(digits) => digits.parse().ok(),
            Expr::UnaryOp {
                op: UnaryOp::USub,
                operand,
            } => match operand.as_ref() {
                Expr::Int(digits) => digits.parse::<i128>().ok().map(|n| -n),
                _ => None,
            },
            _ => None,
        }
    }
}

/// The runtime type handle exported by the extractor: `type(value)` split
/// into module and name. Constants from `rethinkdb.query` carry their term
/// name in `st`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawType {
    pub module: String,
    pub name: String,
    #[serde(default)]
    pub st: Option<String>,
}

/// Closed set of value types the corpus produces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawType")]
pub enum TypeTag {
    Bool,
    Bytes,
    Int,
    Float,
    Str,
    Time,
    Dict,
    List,
    Null,
    Function,
    /// A ReQL query term.
    Term,
    /// A Python builtin exception class.
    Error(String),
    /// A driver error class, e.g. `ReqlOpFailedError`.
    DriverError(String),
    /// A comparison helper from the test harness (`bag`, `partial`, ...).
    TestHelper(String),
    /// A top-level ReQL constant such as `r.minval`.
    Constant(String),
    /// Anything the classification below does not recognize.
    Unknown { module: String, name: String },
}

impl From<RawType> for TypeTag {
    fn from(raw: RawType) -> Self {
        if raw.name == "function" {
            return TypeTag::Function;
        }
        match raw.module.as_str() {
            "datetime" if raw.name == "datetime" => TypeTag::Time,
            "builtins" if raw.name.ends_with("Error") => TypeTag::Error(raw.name),
            "builtins" => match raw.name.as_str() {
                "bool" => TypeTag::Bool,
                "bytes" => TypeTag::Bytes,
                "int" => TypeTag::Int,
                "float" => TypeTag::Float,
                "str" => TypeTag::Str,
                "dict" | "object" => TypeTag::Dict,
                "list" => TypeTag::List,
                "NoneType" => TypeTag::Null,
                _ => TypeTag::Unknown {
                    module: raw.module,
                    name: raw.name,
                },
            },
            "rethinkdb.ast" => TypeTag::Term,
            "rethinkdb.errors" => TypeTag::DriverError(raw.name),
            "?test?" => TypeTag::TestHelper(raw.name),
            "rethinkdb.query" => TypeTag::Constant(raw.st.unwrap_or(raw.name)),
            _ => TypeTag::Unknown {
                module: raw.module,
                name: raw.name,
            },
        }
    }
}

impl TypeTag {
    /// Whether values of this type are ReQL terms, i.e. get translated as
    /// builder method chains.
    pub fn is_term(&self) -> bool {
        matches!(self, TypeTag::Term)
    }

    /// Whether a query of this type evaluates to a plain Go value instead of
    /// something that must be run against the server.
    pub fn is_plain_value(&self) -> bool {
        !matches!(
            self,
            TypeTag::Term | TypeTag::DriverError(_) | TypeTag::Constant(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(module: &str, name: &str) -> RawType {
        RawType {
            module: module.to_string(),
            name: name.to_string(),
            st: None,
        }
    }

    #[test]
    fn test_classify_builtins() {
        assert_eq!(TypeTag::from(raw("builtins", "int")), TypeTag::Int);
        assert_eq!(TypeTag::from(raw("builtins", "object")), TypeTag::Dict);
        assert_eq!(TypeTag::from(raw("builtins", "NoneType")), TypeTag::Null);
        assert_eq!(
            TypeTag::from(raw("builtins", "ValueError")),
            TypeTag::Error("ValueError".to_string())
        );
        assert_eq!(TypeTag::from(raw("builtins", "function")), TypeTag::Function);
    }

    #[test]
    fn test_classify_driver_types() {
        assert_eq!(TypeTag::from(raw("rethinkdb.ast", "Add")), TypeTag::Term);
        assert_eq!(
            TypeTag::from(RawType {
                st: Some("minval".to_string()),
                ..raw("rethinkdb.query", "RqlConstant")
            }),
            TypeTag::Constant("minval".to_string())
        );
        assert_eq!(
            TypeTag::from(raw("numpy", "int64")),
            TypeTag::Unknown {
                module: "numpy".to_string(),
                name: "int64".to_string()
            }
        );
    }

    #[test]
    fn test_plain_value() {
        assert!(TypeTag::Int.is_plain_value());
        assert!(TypeTag::TestHelper("bag".to_string()).is_plain_value());
        assert!(!TypeTag::Term.is_plain_value());
        assert!(!TypeTag::DriverError("ReqlOpFailedError".to_string()).is_plain_value());
    }

    #[test]
    fn test_deserialize_tree() {
        let json = r#"{"node": "call", "value": {
            "func": {"node": "attribute", "value": {"value": {"node": "name", "value": "r"}, "attr": "expr"}},
            "args": [{"node": "int", "value": "1"}]
        }}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(expr, Expr::call(Expr::r("expr"), vec![Expr::int(1)]));
    }

    #[test]
    fn test_as_int() {
        assert_eq!(Expr::int(-3).as_int(), Some(-3));
        assert_eq!(Expr::int(7).as_int(), Some(7));
        assert_eq!(Expr::str("7").as_int(), None);
    }
}
