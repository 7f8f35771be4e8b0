//! Binary, unary and comparison operators.

use super::literals::{
    bytes_literal, concatenated_bytes, escape_string, folds_to_literal, repeated_string,
};
use super::{Mode, Transpiler};
use crate::ast::{BinOp, CmpOp, Expr, UnaryOp};
use crate::error::{Emit, TranspileError};

/// ReQL method implementing a binary operator.
fn binop_method(op: BinOp) -> Option<&'static str> {
    match op {
        BinOp::Add => Some("Add"),
        BinOp::Sub => Some("Sub"),
        BinOp::Mult => Some("Mul"),
        BinOp::Div => Some("Div"),
        BinOp::Mod => Some("Mod"),
        BinOp::BitAnd => Some("And"),
        BinOp::BitOr => Some("Or"),
        _ => None,
    }
}

/// ReQL method implementing a comparison.
fn compare_method(op: CmpOp) -> Option<&'static str> {
    match op {
        CmpOp::Lt => Some("Lt"),
        CmpOp::Gt => Some("Gt"),
        CmpOp::GtE => Some("Ge"),
        CmpOp::LtE => Some("Le"),
        CmpOp::Eq => Some("Eq"),
        CmpOp::NotEq => Some("Ne"),
        _ => None,
    }
}

impl Transpiler<'_> {
    pub(super) fn binop(&self, node: &Expr, left: &Expr, op: BinOp, right: &Expr) -> Emit {
        if let Some(text) = repeated_string(left, op, right) {
            return Ok(escape_string(&text));
        }
        if op == BinOp::Add && (matches!(left, Expr::List(_)) || matches!(right, Expr::List(_))) {
            return Err(self.skip("Array concatenation using + operator not currently supported"));
        }
        if let Some(bytes) = concatenated_bytes(left, op, right) {
            return Ok(bytes_literal(&bytes));
        }
        if op == BinOp::Pow {
            return self.power(node, left, right);
        }

        match self.mode {
            Mode::Value => {
                if op == BinOp::FloorDiv {
                    return Err(TranspileError::unhandled("No Go operator for //", node));
                }
                Ok(format!(
                    "{} {} {}",
                    self.operand(left)?,
                    op,
                    self.operand(right)?
                ))
            }
            Mode::Query => {
                let method = binop_method(op).ok_or_else(|| {
                    TranspileError::unhandled(format!("No ReQL method for operator {}", op), node)
                })?;
                self.chain(method, left, right)
            }
        }
    }

    /// `2 ** n` is the only power the corpus needs; Go has no operator for
    /// it but a shift does the job.
    fn power(&self, node: &Expr, base: &Expr, exponent: &Expr) -> Emit {
        if !matches!(base, Expr::Int(digits) if digits == "2") {
            return Err(TranspileError::unhandled("Can't do exponent with non 2 base", node));
        }
        Ok(format!("1 << {}", self.operand(exponent)?))
    }

    pub(super) fn compare(
        &self,
        node: &Expr,
        left: &Expr,
        ops: &[CmpOp],
        comparators: &[Expr],
    ) -> Emit {
        // a < b < c is valid python but has no single-call equivalent.
        let (op, right) = match (ops, comparators) {
            ([op], [right]) => (*op, right),
            _ => return Err(TranspileError::unhandled("Compare hack bailed on chained comparison", node)),
        };

        match self.mode {
            Mode::Value => {
                if compare_method(op).is_none() {
                    return Err(TranspileError::unhandled(
                        format!("No Go operator for python `{}`", op),
                        node,
                    ));
                }
                Ok(format!(
                    "{} {} {}",
                    self.operand(left)?,
                    op,
                    self.operand(right)?
                ))
            }
            Mode::Query => {
                let method = compare_method(op).ok_or_else(|| {
                    TranspileError::unhandled(format!("No ReQL method for `{}`", op), node)
                })?;
                self.chain(method, left, right)
            }
        }
    }

    pub(super) fn unary(&self, op: UnaryOp, operand: &Expr) -> Emit {
        if self.is_query() && op == UnaryOp::Invert {
            return Ok(format!("{}.Not()", self.convert(operand)?));
        }
        // `-9223372036854775808` only fits an int64 with its sign attached.
        if let (UnaryOp::USub, Expr::Int(digits)) = (op, operand) {
            let negated = format!("-{}", digits);
            if negated.parse::<i64>().is_ok() {
                return Ok(negated);
            }
        }
        let symbol = match op {
            UnaryOp::USub => "-",
            UnaryOp::UAdd => "+",
            UnaryOp::Not => "!",
            UnaryOp::Invert => "^",
        };
        Ok(format!("{}{}", symbol, self.operand(operand)?))
    }

    /// `left.Method(right)` when the left side is already a term,
    /// `r.Method(left, right)` otherwise.
    fn chain(&self, method: &str, left: &Expr, right: &Expr) -> Emit {
        let lhs = self.convert(left)?;
        let rhs = self.convert(right)?;
        if self.yields_term(left) {
            Ok(format!("{}.{}({})", lhs, method, rhs))
        } else {
            Ok(format!("r.{}({}, {})", method, lhs, rhs))
        }
    }

    /// Operand of a Go infix operator. Python trees drop the parentheses,
    /// so nested operations get them back.
    fn operand(&self, expr: &Expr) -> Emit {
        let text = self.convert(expr)?;
        let needs_parens = match expr {
            Expr::BinOp { left, op, right } => !folds_to_literal(left, *op, right),
            Expr::Compare { .. } => self.mode == Mode::Value,
            _ => false,
        };
        if needs_parens && self.mode == Mode::Value {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }
}
