//! Literal rendering: strings, numbers, byte slices.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Transpiler;
use crate::ast::{BinOp, Expr};
use crate::error::Emit;

static EXPECTED_ARGUMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*Expected .* argument").unwrap());
static ARGUMENT_MUST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*argument .* must").unwrap());

const MODULE_ATTRIBUTE: &str = "'module' object has no attribute ";
const OBJECT_KEYS: &str = "Object keys must be strings.*";

impl Transpiler<'_> {
    /// String literal. Some expected error messages only make sense for a
    /// dynamically typed driver; tests asserting them are skipped.
    pub(super) fn string(&self, s: &str) -> Emit {
        if s == "ReqlServerCompileError" {
            return Ok(escape_string("ReqlCompileError"));
        }
        if EXPECTED_ARGUMENT.is_match(s) || ARGUMENT_MUST.is_match(s) {
            return Err(self.skip("argument checks not supported"));
        }
        if s == OBJECT_KEYS {
            return Err(self.skip(
                "the Go driver automatically converts object keys to strings",
            ));
        }
        if s.starts_with(MODULE_ATTRIBUTE) {
            return Err(self.skip("test not required since terms are statically typed"));
        }
        Ok(escape_string(s))
    }
}

/// Quote `s` as a Go interpreted string literal.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c if c.is_ascii() => out.push(c),
            c if (c as u32) <= 0xffff => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Integer literal. Values that do not fit an `int64` become float
/// constants so the Go compiler does not reject them.
pub fn int_literal(digits: &str) -> String {
    if digits.parse::<i64>().is_ok() {
        digits.to_string()
    } else {
        format!("{}.0", digits)
    }
}

pub(super) fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "math.NaN()".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { 1 } else { -1 };
        format!("math.Inf({})", sign)
    } else {
        // Debug keeps the fractional marker (`1.0`) and round-trips.
        format!("{:?}", value)
    }
}

pub(super) fn bytes_literal(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(u8::to_string).collect();
    format!("[]byte{{{}}}", items.join(","))
}

/// `"ab" * 3` or `3 * "ab"`, computed up front.
pub(super) fn repeated_string(left: &Expr, op: BinOp, right: &Expr) -> Option<String> {
    if op != BinOp::Mult {
        return None;
    }
    let (text, count) = match (left, right) {
        (Expr::Str(s), Expr::Int(_)) => (s, right.as_int()?),
        (Expr::Int(_), Expr::Str(s)) => (s, left.as_int()?),
        _ => return None,
    };
    let count = usize::try_from(count.max(0)).ok()?;
    Some(text.repeat(count))
}

/// `b'ab' + b'cd'`, flattened into one byte slice.
pub(super) fn concatenated_bytes(left: &Expr, op: BinOp, right: &Expr) -> Option<Vec<u8>> {
    match (left, op, right) {
        (Expr::Bytes(l), BinOp::Add, Expr::Bytes(r)) => {
            Some(l.iter().chain(r.iter()).copied().collect())
        }
        _ => None,
    }
}

/// Whether the binary operation is evaluated here into a single literal.
pub(super) fn folds_to_literal(left: &Expr, op: BinOp, right: &Expr) -> bool {
    repeated_string(left, op, right).is_some() || concatenated_bytes(left, op, right).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes_and_controls() {
        assert_eq!(escape_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(escape_string("a\\b"), r#""a\\b""#);
        assert_eq!(escape_string("\u{0}\n"), r#""\u0000\n""#);
        assert_eq!(escape_string("it's"), r#""it's""#);
    }

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape_string("é"), r#""\u00e9""#);
        assert_eq!(escape_string("\u{2603}"), r#""\u2603""#);
        assert_eq!(escape_string("\u{1f600}"), r#""\U0001f600""#);
    }

    #[test]
    fn test_int_range() {
        assert_eq!(int_literal("9223372036854775807"), "9223372036854775807");
        assert_eq!(int_literal("9223372036854775808"), "9223372036854775808.0");
        assert_eq!(int_literal("0"), "0");
    }

    #[test]
    fn test_float() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(f64::INFINITY), "math.Inf(1)");
    }

    #[test]
    fn test_repeated_string() {
        assert_eq!(
            repeated_string(&Expr::str("ab"), BinOp::Mult, &Expr::int(3)),
            Some("ababab".to_string())
        );
        assert_eq!(
            repeated_string(&Expr::int(2), BinOp::Mult, &Expr::str("x")),
            Some("xx".to_string())
        );
        assert_eq!(repeated_string(&Expr::str("ab"), BinOp::Add, &Expr::int(3)), None);
    }
}
