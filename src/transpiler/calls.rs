//! Calls, attribute access and optional arguments.

use std::borrow::Cow;

use super::Transpiler;
use crate::ast::{Expr, Keyword};
use crate::error::{Emit, TranspileError};
use crate::naming::{escape_keyword, optarg_field, optarg_type, term_name};

/// Attributes of `r` that python exposes as values but Go only as
/// functions, so `r.error` must become `r.Error()`.
const TOPLEVEL_CONSTANTS: &[&str] = &["error"];

/// Optional arguments only a dynamically typed driver can get wrong.
const STATICALLY_TYPED_OPTARGS: &[&str] = &["return_vals", "foo"];

/// Name of the function a call invokes, if it has one.
fn callee_name(func: &Expr) -> Option<&str> {
    match func {
        Expr::Attribute { attr, .. } => Some(attr.as_str()),
        Expr::Name(id) => Some(id.as_str()),
        _ => None,
    }
}

impl Transpiler<'_> {
    /// `value.attr`; `called` tells whether the attribute is the callee of
    /// a call, in which case constants keep their bare form.
    pub(super) fn attribute(&self, value: &Expr, attr: &str, called: bool) -> Emit {
        let member = escape_keyword(&term_name(attr));
        // There is no `ast` namespace on the Go side, the test file declares
        // the helpers at top level instead.
        let target = if value.is_attr_of("r", "ast") {
            member
        } else {
            format!("{}.{}", self.convert(value)?, member)
        };

        let constant = value.is_name("r") && TOPLEVEL_CONSTANTS.contains(&attr);
        if self.is_query() && constant && !called {
            Ok(format!("{}()", target))
        } else {
            Ok(target)
        }
    }

    pub(super) fn call(
        &self,
        node: &Expr,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
    ) -> Emit {
        if matches!(func, Expr::Attribute { attr, .. } if attr == "encode") {
            return Err(self.skip("Go tests do not currently support character encoding"));
        }

        let mut name = callee_name(func);
        if self.is_query() && name == Some("index_create") && args.len() == 2 {
            name = Some("index_create_func");
        }

        let args = self.adjust_args(func, args);
        let callee = match func {
            Expr::Attribute { value, .. } => {
                self.attribute(value, name.unwrap_or_default(), true)?
            }
            _ => self.convert(func)?,
        };
        let rendered = args
            .iter()
            .map(|arg| self.arg(arg))
            .collect::<Emit<Vec<_>>>()?;

        let mut out = format!("{}({})", callee, rendered.join(", "));
        if !keywords.is_empty() {
            let Some(name) = name else {
                return Err(TranspileError::unhandled("Missing function name", node));
            };
            out.push_str(&self.optargs(name, keywords)?);
        }

        if self.is_query() && args.len() > 1 {
            match func {
                Expr::Attribute { attr, .. } if attr == "expr" => {
                    return Err(self.skip("the go driver only accepts one parameter to expr"));
                }
                Expr::Attribute { attr, .. } if attr == "table_create" => {
                    return Err(
                        self.skip("the go driver only accepts one parameter to table_create")
                    );
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Test helpers whose python signatures have no Go counterpart.
    fn adjust_args<'e>(&self, func: &Expr, args: &'e [Expr]) -> Cow<'e, [Expr]> {
        match func {
            // The third argument is unused by the Go harness and Go has no
            // overloading.
            Expr::Name(id) if (id == "err" || id == "err_regex") && args.len() > 2 => {
                Cow::Borrowed(&args[..2])
            }
            Expr::Name(id) if id == "fetch" => match args.len() {
                1 => {
                    let mut owned = args.to_vec();
                    owned.push(Expr::int(0));
                    Cow::Owned(owned)
                }
                n if n > 2 => Cow::Borrowed(&args[..2]),
                _ => Cow::Borrowed(args),
            },
            _ => Cow::Borrowed(args),
        }
    }

    /// `.OptArgs(r.FuncOpts{Field: value, ...})` for python keyword args.
    fn optargs(&self, func: &str, keywords: &[Keyword]) -> Emit {
        let mut fields = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            if STATICALLY_TYPED_OPTARGS.contains(&keyword.arg.as_str()) {
                return Err(self.skip("test not required since optargs are statically typed"));
            }
            if keyword.value.is_null() {
                return Err(self.skip("test not required since go does not support null optargs"));
            }
            fields.push(format!(
                "{}: {}",
                optarg_field(&keyword.arg),
                self.convert(&keyword.value)?
            ));
        }
        Ok(format!(".OptArgs({}{{{}}})", optarg_type(func), fields.join(", ")))
    }
}
