//! Go transpiler for corpus expressions.
//!
//! Turns a python expression tree into Go source text. There are two modes
//! sharing one dispatch: [`Mode::Value`] renders ordinary Go values,
//! [`Mode::Query`] renders ReQL builder chains (`r.Expr(1).Add(2)`).
//!
//! Every handler returns the complete text for its node or an error, so a
//! skipped construct never leaves half a line behind.

mod calls;
mod literals;
mod operators;
mod subscript;


use crate::ast::{Expr, TypeTag, UnaryOp};
use crate::error::{Emit, Severity, Skip, TranspileError};
use crate::naming::{escape_keyword, name_alias};
use crate::scope::Scope;

pub use literals::{escape_string, int_literal};

/// How operands are assumed to behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plain Go values.
    Value,
    /// ReQL terms.
    Query,
}

impl Mode {
    /// Query mode for term-typed values, value mode for everything else.
    pub fn for_tag(tag: &TypeTag) -> Self {
        if tag.is_term() { Mode::Query } else { Mode::Value }
    }
}

/// Converts expression trees to Go text.
#[derive(Debug, Clone, Copy)]
pub struct Transpiler<'a> {
    mode: Mode,
    scope: &'a Scope,
    severity: Severity,
    smart_bracket: bool,
}

impl<'a> Transpiler<'a> {
    pub fn new(mode: Mode, scope: &'a Scope) -> Self {
        Self {
            mode,
            scope,
            severity: Severity::Recoverable,
            smart_bracket: false,
        }
    }

    /// Skips raised while converting a definition are fatal: later records
    /// may reference the variable.
    pub fn for_definition(mut self) -> Self {
        self.severity = Severity::Fatal;
        self
    }

    /// `v["a"]` becomes `.Field("a")` and `v[1]` becomes `.Nth(1)`
    /// instead of `.AtIndex(..)`.
    pub fn smart_bracket(mut self, enabled: bool) -> Self {
        self.smart_bracket = enabled;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn is_query(&self) -> bool {
        self.mode == Mode::Query
    }

    fn skip(&self, reason: impl Into<String>) -> TranspileError {
        TranspileError::Skip(Skip {
            reason: reason.into(),
            severity: self.severity,
        })
    }

    /// Convert one expression.
    pub fn convert(&self, expr: &Expr) -> Emit {
        match expr {
            Expr::Bool(true) => Ok("true".to_string()),
            Expr::Bool(false) => Ok("false".to_string()),
            Expr::Null => Ok("nil".to_string()),
            Expr::Int(digits) => Ok(int_literal(digits)),
            Expr::Float(value) => Ok(literals::float_literal(*value)),
            Expr::Str(s) => self.string(s),
            Expr::Bytes(bytes) => Ok(literals::bytes_literal(bytes)),
            Expr::Name(id) => self.name(id),
            Expr::Attribute { value, attr } => self.attribute(value, attr, false),
            Expr::Call {
                func,
                args,
                keywords,
            } => self.call(expr, func, args, keywords),
            Expr::BinOp { left, op, right } => self.binop(expr, left, *op, right),
            Expr::UnaryOp { op, operand } => self.unary(*op, operand),
            Expr::Compare {
                left,
                ops,
                comparators,
            } => self.compare(expr, left, ops, comparators),
            Expr::Dict(entries) => self.dict(entries),
            Expr::List(items) | Expr::Tuple(items) => self.list(items),
            Expr::Lambda { params, body } => self.lambda(params, body),
            Expr::Subscript { value, index } => self.subscript(expr, value, index),
            Expr::ListComp { elt, generators } => self.list_comp(expr, elt, generators),
        }
    }

    fn name(&self, id: &str) -> Emit {
        if id == "frozenset" {
            return Err(self.skip("can't convert frozensets to GroupedData yet"));
        }
        Ok(match name_alias(id) {
            Some(alias) => alias.to_string(),
            None => escape_keyword(id),
        })
    }

    /// Positional argument; `null` is spelled `nil` in Go.
    fn arg(&self, expr: &Expr) -> Emit {
        if expr.is_null() {
            Ok("nil".to_string())
        } else {
            self.convert(expr)
        }
    }

    fn join(&self, items: &[Expr]) -> Emit {
        let parts = items
            .iter()
            .map(|item| self.convert(item))
            .collect::<Emit<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn dict(&self, entries: &[(Expr, Expr)]) -> Emit {
        let mut parts = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            parts.push(format!("{}: {}", self.convert(key)?, self.convert(value)?));
        }
        Ok(format!("map[interface{{}}]interface{{}}{{{}}}", parts.join(", ")))
    }

    fn list(&self, items: &[Expr]) -> Emit {
        Ok(format!("[]interface{{}}{{{}}}", self.join(items)?))
    }

    fn lambda(&self, params: &[String], body: &Expr) -> Emit {
        let param_type = match self.mode {
            Mode::Query => "r.Term",
            Mode::Value => "interface{}",
        };
        let params: Vec<String> = params
            .iter()
            .map(|p| format!("{} {}", escape_keyword(p), param_type))
            .collect();
        Ok(format!(
            "func({}) interface{{}} {{ return {} }}",
            params.join(", "),
            self.convert(body)?
        ))
    }

    /// Whether `expr` is known to evaluate to a ReQL term, which decides
    /// between `left.Add(right)` and `r.Add(left, right)`.
    ///
    /// This is syntactic: a literal that happens to be wrapped elsewhere is
    /// still treated as a plain value.
    fn yields_term(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Name(id) => self.scope.contains(id),
            Expr::Attribute { .. }
            | Expr::Call { .. }
            | Expr::Subscript { .. }
            | Expr::Compare { .. } => true,
            // Only `~x` becomes a method chain; `-1` stays a Go literal.
            Expr::UnaryOp { op, .. } => *op == UnaryOp::Invert,
            Expr::BinOp { left, op, right } => !literals::folds_to_literal(left, *op, right),
            _ => false,
        }
    }
}
