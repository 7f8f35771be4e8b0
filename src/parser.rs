//! Python expression parser using nom.
//!
//! Covers the subset of python the polyglot corpus writes its queries in:
//!
//! ```text
//! r.table('foo').insert({'id': 1}, conflict='replace')[0:2] + 3
//! ─┬ ──┬── ───┬──  ──┬─── ────┬───  ───────┬─────── ─┬─  ─┬─
//!  │   │      │      │        │            │          │    └── binary operator
//!  │   │      │      │        │            │          └── slice
//!  │   │      │      │        │            └── keyword argument
//!  │   │      │      │        └── dict literal
//!  │   │      │      └── attribute
//!  │   │      └── call
//!  │   └── attribute
//!  └── name
//! ```
//!
//! Boolean `and`/`or`, conditional expressions, sets and generator
//! expressions are not part of the corpus and are rejected.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{map, not, opt, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::{many0, many1, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::ast::*;
use crate::error::{GenError, GenResult};

/// Words that can never be a name.
const RESERVED: &[&str] = &[
    "lambda", "not", "in", "is", "for", "if", "else", "and", "or",
];

/// Parse a complete python expression.
pub fn parse(input: &str) -> GenResult<Expr> {
    match terminated(expr, multispace0)(input) {
        Ok(("", node)) => Ok(node),
        Ok((remaining, _)) => Err(GenError::parse(
            input.len() - remaining.len(),
            format!("Unexpected trailing content: '{}'", remaining),
        )),
        Err(e) => Err(GenError::parse(0, format!("Parse failed: {:?}", e))),
    }
}

fn fail(input: &str) -> nom::Err<Error<&str>> {
    nom::Err::Error(Error::new(input, ErrorKind::Char))
}

/// A fixed token, after optional whitespace.
fn sym<'a>(token: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(token))
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A keyword, not followed by more identifier characters.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, terminated(tag(word), not(satisfy(is_ident_char))))
}

/// Any identifier, reserved words included (attribute names).
fn raw_identifier(input: &str) -> IResult<&str, &str> {
    preceded(
        multispace0,
        recognize(pair(satisfy(is_ident_start), take_while(is_ident_char))),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    verify(raw_identifier, |name: &str| !RESERVED.contains(&name))(input)
}

/// Top-level expression: a lambda or an operator expression.
fn expr(input: &str) -> IResult<&str, Expr> {
    alt((lambda, not_test))(input)
}

fn lambda(input: &str) -> IResult<&str, Expr> {
    let (input, _) = keyword("lambda")(input)?;
    let (input, params) = separated_list0(sym(","), identifier)(input)?;
    let (input, _) = sym(":")(input)?;
    let (input, body) = expr(input)?;
    Ok((
        input,
        Expr::Lambda {
            params: params.into_iter().map(String::from).collect(),
            body: Box::new(body),
        },
    ))
}

fn not_test(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(keyword("not"), not_test), |e| {
            Expr::unary(UnaryOp::Not, e)
        }),
        comparison,
    ))(input)
}

fn cmp_op(input: &str) -> IResult<&str, CmpOp> {
    alt((
        value(CmpOp::LtE, sym("<=")),
        value(CmpOp::GtE, sym(">=")),
        value(CmpOp::Eq, sym("==")),
        value(CmpOp::NotEq, sym("!=")),
        value(CmpOp::Lt, terminated(sym("<"), not(char('<')))),
        value(CmpOp::Gt, terminated(sym(">"), not(char('>')))),
        value(CmpOp::NotIn, pair(keyword("not"), keyword("in"))),
        value(CmpOp::In, keyword("in")),
        value(CmpOp::IsNot, pair(keyword("is"), keyword("not"))),
        value(CmpOp::Is, keyword("is")),
    ))(input)
}

fn comparison(input: &str) -> IResult<&str, Expr> {
    let (mut input, left) = bit_or(input)?;
    let mut ops = Vec::new();
    let mut comparators = Vec::new();
    loop {
        match pair(cmp_op, bit_or)(input) {
            Ok((rest, (op, right))) => {
                ops.push(op);
                comparators.push(right);
                input = rest;
            }
            Err(nom::Err::Error(_)) => break,
            Err(e) => return Err(e),
        }
    }
    if ops.is_empty() {
        Ok((input, left))
    } else {
        Ok((
            input,
            Expr::Compare {
                left: Box::new(left),
                ops,
                comparators,
            },
        ))
    }
}

/// One left-associative precedence level.
fn binary_level<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expr>,
    operator: fn(&'a str) -> IResult<&'a str, BinOp>,
) -> IResult<&'a str, Expr> {
    let (mut input, mut left) = operand(input)?;
    loop {
        match pair(operator, operand)(input) {
            Ok((rest, (op, right))) => {
                left = Expr::binop(left, op, right);
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, left)),
            Err(e) => return Err(e),
        }
    }
}

fn bit_or(input: &str) -> IResult<&str, Expr> {
    binary_level(input, bit_xor, |i| value(BinOp::BitOr, sym("|"))(i))
}

fn bit_xor(input: &str) -> IResult<&str, Expr> {
    binary_level(input, bit_and, |i| value(BinOp::BitXor, sym("^"))(i))
}

fn bit_and(input: &str) -> IResult<&str, Expr> {
    binary_level(input, shift, |i| value(BinOp::BitAnd, sym("&"))(i))
}

fn shift(input: &str) -> IResult<&str, Expr> {
    binary_level(input, arith, |i| {
        alt((value(BinOp::LShift, sym("<<")), value(BinOp::RShift, sym(">>"))))(i)
    })
}

fn arith(input: &str) -> IResult<&str, Expr> {
    binary_level(input, term, |i| {
        alt((value(BinOp::Add, sym("+")), value(BinOp::Sub, sym("-"))))(i)
    })
}

fn term(input: &str) -> IResult<&str, Expr> {
    binary_level(input, factor, |i| {
        alt((
            value(BinOp::FloorDiv, sym("//")),
            value(BinOp::Div, sym("/")),
            value(BinOp::Mult, terminated(sym("*"), not(char('*')))),
            value(BinOp::Mod, sym("%")),
        ))(i)
    })
}

fn factor(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(sym("-"), factor), |e| Expr::unary(UnaryOp::USub, e)),
        map(preceded(sym("+"), factor), |e| Expr::unary(UnaryOp::UAdd, e)),
        map(preceded(sym("~"), factor), |e| Expr::unary(UnaryOp::Invert, e)),
        power,
    ))(input)
}

fn power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = postfix(input)?;
    let (input, exponent) = opt(preceded(sym("**"), factor))(input)?;
    Ok(match exponent {
        Some(exponent) => (input, Expr::binop(base, BinOp::Pow, exponent)),
        None => (input, base),
    })
}

enum Arg {
    Positional(Expr),
    Keyword(Keyword),
}

enum Trailer {
    Call(Vec<Arg>),
    Index(Index),
    Attr(String),
}

fn call_arg(input: &str) -> IResult<&str, Arg> {
    alt((
        map(
            pair(identifier, preceded(terminated(sym("="), not(char('='))), expr)),
            |(name, value)| {
                Arg::Keyword(Keyword {
                    arg: name.to_string(),
                    value,
                })
            },
        ),
        map(expr, Arg::Positional),
    ))(input)
}

fn slice(input: &str) -> IResult<&str, Index> {
    let (input, lower) = opt(expr)(input)?;
    let (input, _) = sym(":")(input)?;
    let (input, upper) = opt(expr)(input)?;
    let (input, step) = opt(preceded(sym(":"), opt(expr)))(input)?;
    Ok((
        input,
        Index::Slice {
            lower,
            upper,
            step: step.flatten(),
        },
    ))
}

fn trailer(input: &str) -> IResult<&str, Trailer> {
    alt((
        map(
            delimited(
                sym("("),
                separated_list0(sym(","), call_arg),
                pair(opt(sym(",")), sym(")")),
            ),
            Trailer::Call,
        ),
        map(
            delimited(sym("["), alt((slice, map(expr, Index::Index))), sym("]")),
            Trailer::Index,
        ),
        map(preceded(sym("."), raw_identifier), |name| {
            Trailer::Attr(name.to_string())
        }),
    ))(input)
}

fn postfix(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut node) = atom(input)?;
    loop {
        match trailer(input) {
            Ok((rest, Trailer::Call(call_args))) => {
                let mut args = Vec::new();
                let mut keywords = Vec::new();
                for arg in call_args {
                    match arg {
                        Arg::Positional(e) => args.push(e),
                        Arg::Keyword(k) => keywords.push(k),
                    }
                }
                node = Expr::call_kw(node, args, keywords);
                input = rest;
            }
            Ok((rest, Trailer::Index(index))) => {
                node = Expr::subscript(node, index);
                input = rest;
            }
            Ok((rest, Trailer::Attr(attr))) => {
                node = Expr::attr(node, attr);
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, node)),
            Err(e) => return Err(e),
        }
    }
}

fn atom(input: &str) -> IResult<&str, Expr> {
    alt((paren, list, dict, string, number, name))(input)
}

fn paren(input: &str) -> IResult<&str, Expr> {
    let (input, _) = sym("(")(input)?;
    let (input, mut items) = separated_list0(sym(","), expr)(input)?;
    let (input, trailing) = opt(sym(","))(input)?;
    let (input, _) = sym(")")(input)?;
    if items.len() == 1 && trailing.is_none() {
        Ok((input, items.remove(0)))
    } else {
        Ok((input, Expr::Tuple(items)))
    }
}

fn comprehension(input: &str) -> IResult<&str, Comprehension> {
    let (input, _) = keyword("for")(input)?;
    let (input, target) = identifier(input)?;
    let (input, _) = keyword("in")(input)?;
    let (input, iter) = bit_or(input)?;
    let (input, ifs) = many0(preceded(keyword("if"), bit_or))(input)?;
    Ok((
        input,
        Comprehension {
            target: Expr::name(target),
            iter,
            ifs,
        },
    ))
}

fn list(input: &str) -> IResult<&str, Expr> {
    let (input, _) = sym("[")(input)?;
    let (input, first) = opt(expr)(input)?;
    let Some(first) = first else {
        let (input, _) = sym("]")(input)?;
        return Ok((input, Expr::List(Vec::new())));
    };

    if let Ok((rest, generators)) = many1(comprehension)(input) {
        let (rest, _) = sym("]")(rest)?;
        return Ok((
            rest,
            Expr::ListComp {
                elt: Box::new(first),
                generators,
            },
        ));
    }

    let (input, rest) = many0(preceded(sym(","), expr))(input)?;
    let (input, _) = opt(sym(","))(input)?;
    let (input, _) = sym("]")(input)?;
    let mut items = vec![first];
    items.extend(rest);
    Ok((input, Expr::List(items)))
}

fn dict(input: &str) -> IResult<&str, Expr> {
    let (input, _) = sym("{")(input)?;
    let (input, entries) = separated_list0(sym(","), pair(expr, preceded(sym(":"), expr)))(input)?;
    let (input, _) = opt(sym(","))(input)?;
    let (input, _) = sym("}")(input)?;
    Ok((input, Expr::Dict(entries)))
}

fn number(input: &str) -> IResult<&str, Expr> {
    let (rest, text) = preceded(
        multispace0,
        verify(recognize_float, |s: &str| {
            s.starts_with(|c: char| c.is_ascii_digit())
        }),
    )(input)?;
    if text.contains(['.', 'e', 'E']) {
        let value = text.parse::<f64>().map_err(|_| fail(input))?;
        Ok((rest, Expr::Float(value)))
    } else {
        Ok((rest, Expr::Int(text.to_string())))
    }
}

fn name(input: &str) -> IResult<&str, Expr> {
    map(identifier, |id| match id {
        "True" => Expr::Bool(true),
        "False" => Expr::Bool(false),
        "None" => Expr::Null,
        _ => Expr::name(id),
    })(input)
}

enum Literal {
    Str(String),
    Bytes(Vec<u8>),
}

fn push_char(buf: &mut Vec<u8>, c: char) {
    let mut utf8 = [0u8; 4];
    buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
}

/// One quoted literal with an optional `r`/`b`/`u` prefix.
fn string_piece(input: &str) -> IResult<&str, Literal> {
    let (input, _) = multispace0(input)?;
    let prefix_len = input
        .chars()
        .take_while(|c| "rRbBuU".contains(*c))
        .count();
    if prefix_len > 2 {
        return Err(fail(input));
    }
    let (prefix, body) = input.split_at(prefix_len);
    let is_bytes = prefix.contains(['b', 'B']);
    let is_raw = prefix.contains(['r', 'R']);

    let mut chars = body.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err(fail(input)),
    };

    let mut buf = Vec::new();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            let rest = &body[i + c.len_utf8()..];
            let literal = if is_bytes {
                Literal::Bytes(buf)
            } else {
                Literal::Str(String::from_utf8(buf).map_err(|_| fail(input))?)
            };
            return Ok((rest, literal));
        }
        if c != '\\' || is_raw {
            push_char(&mut buf, c);
            continue;
        }

        let Some((_, escaped)) = chars.next() else {
            return Err(fail(input));
        };
        match escaped {
            'n' => buf.push(b'\n'),
            't' => buf.push(b'\t'),
            'r' => buf.push(b'\r'),
            '0' => buf.push(0),
            'a' => buf.push(0x07),
            'b' => buf.push(0x08),
            'f' => buf.push(0x0c),
            'v' => buf.push(0x0b),
            '\\' | '\'' | '"' => push_char(&mut buf, escaped),
            '\n' => {}
            'x' | 'u' | 'U' => {
                let width = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(width).map(|(_, h)| h).collect();
                let code = u32::from_str_radix(&hex, 16).map_err(|_| fail(input))?;
                if hex.len() != width {
                    return Err(fail(input));
                }
                if is_bytes && escaped == 'x' {
                    buf.push(code as u8);
                } else if is_bytes {
                    // \u means nothing inside bytes.
                    buf.push(b'\\');
                    push_char(&mut buf, escaped);
                    buf.extend_from_slice(hex.as_bytes());
                } else {
                    let c = char::from_u32(code).ok_or_else(|| fail(input))?;
                    push_char(&mut buf, c);
                }
            }
            other => {
                buf.push(b'\\');
                push_char(&mut buf, other);
            }
        }
    }
    Err(fail(input))
}

/// Adjacent literals concatenate, as in python.
fn string(input: &str) -> IResult<&str, Expr> {
    let (rest, pieces) = many1(string_piece)(input)?;
    let mut text = String::new();
    let mut bytes = Vec::new();
    let mut saw_str = false;
    let mut saw_bytes = false;
    for piece in pieces {
        match piece {
            Literal::Str(s) => {
                saw_str = true;
                text.push_str(&s);
            }
            Literal::Bytes(b) => {
                saw_bytes = true;
                bytes.extend(b);
            }
        }
    }
    match (saw_str, saw_bytes) {
        (true, true) => Err(fail(input)),
        (false, true) => Ok((rest, Expr::Bytes(bytes))),
        _ => Ok((rest, Expr::Str(text))),
    }
}
