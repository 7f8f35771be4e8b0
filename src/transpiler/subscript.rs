//! Indexing, slicing and range comprehensions.

use super::{Mode, Transpiler};
use crate::ast::{Comprehension, Expr, Index};
use crate::error::{Emit, TranspileError};

/// Bounds of a `v[lower:upper]` slice as the driver's `Slice` expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBounds {
    pub lower: i128,
    /// `-1` when no upper bound was written, meaning "to the end".
    pub upper: i128,
    /// Closed exactly when the upper bound was left out, so `-1` includes
    /// the last element.
    pub right_closed: bool,
}

impl SliceBounds {
    pub fn new(node: &Expr, lower: Option<&Expr>, upper: Option<&Expr>) -> Result<Self, TranspileError> {
        Ok(Self {
            lower: bound(node, lower, 0)?,
            upper: bound(node, upper, -1)?,
            right_closed: upper.is_none(),
        })
    }
}

/// Python parses `-1` as a unary minus applied to `1`; both shapes are
/// accepted and the sign is kept.
fn bound(node: &Expr, bound: Option<&Expr>, default: i128) -> Result<i128, TranspileError> {
    match bound {
        None => Ok(default),
        Some(expr) => expr
            .as_int()
            .ok_or_else(|| TranspileError::unhandled(format!("Not handling bound: {:?}", expr), node)),
    }
}

impl Transpiler<'_> {
    pub(super) fn subscript(&self, node: &Expr, value: &Expr, index: &Index) -> Emit {
        if self.mode == Mode::Value {
            return match index {
                Index::Index(Expr::Int(n)) => Ok(format!("{}[{}]", self.convert(value)?, n)),
                _ => Err(TranspileError::unhandled(
                    "Only integers subscript can be converted",
                    node,
                )),
            };
        }

        let target = self.convert(value)?;
        match index {
            Index::Index(key) => {
                let method = match key {
                    Expr::Str(_) if self.smart_bracket => "Field",
                    _ if self.smart_bracket && key.as_int().is_some() => "Nth",
                    _ => "AtIndex",
                };
                Ok(format!("{}.{}({})", target, method, self.convert(key)?))
            }
            Index::Slice {
                lower,
                upper,
                step: None,
            } => {
                let bounds = SliceBounds::new(node, lower.as_ref(), upper.as_ref())?;
                let opts = if bounds.right_closed {
                    r#", r.SliceOpts{RightBound: "closed"}"#
                } else {
                    ""
                };
                Ok(format!(
                    "{}.Slice({}, {}{})",
                    target, bounds.lower, bounds.upper, opts
                ))
            }
            Index::Slice { step: Some(_), .. } => {
                Err(TranspileError::unhandled("No translation for slice steps", node))
            }
            Index::ExtSlice(_) => Err(TranspileError::unhandled("No translation for ExtSlice", node)),
        }
    }

    /// `[elt for x in range(a, b)]`. Nothing else the corpus might come up
    /// with is supported.
    pub(super) fn list_comp(&self, node: &Expr, elt: &Expr, generators: &[Comprehension]) -> Emit {
        let unhandled = || TranspileError::unhandled("ListComp hack couldn't handle", node);

        let [generator] = generators else {
            return Err(unhandled());
        };
        if !generator.ifs.is_empty() || !matches!(generator.target, Expr::Name(_)) {
            return Err(unhandled());
        }
        let (start, end) = match &generator.iter {
            Expr::Call {
                func,
                args,
                keywords,
            } if keywords.is_empty()
                && matches!(func.as_ref(), Expr::Name(id) if id.ends_with("range")) =>
            {
                match args.as_slice() {
                    [end] => (0, end.as_int().ok_or_else(unhandled)?),
                    [start, end] => (
                        start.as_int().ok_or_else(unhandled)?,
                        end.as_int().ok_or_else(unhandled)?,
                    ),
                    _ => return Err(unhandled()),
                }
            }
            _ => return Err(unhandled()),
        };

        let var = self.convert(&generator.target)?;
        let element = self.convert(elt)?;
        Ok(format!(
            "(func() []interface{{}} {{\n    \
             res := []interface{{}}{{}}\n    \
             for iterator_ := {start}; iterator_ < {end}; iterator_++ {{\n        \
             {var} := iterator_\n        \
             _ = {var}\n        \
             res = append(res, {element})\n    \
             }}\n    \
             return res\n\
             }}())"
        ))
    }
}
