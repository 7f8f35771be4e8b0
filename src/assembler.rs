//! Definition and query assembly.
//!
//! Combines translated expressions with their Go types, source locations
//! and run options into the records the Go test template consumes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ast::Expr;
use crate::corpus::{Definition, Passthrough, Query, RunOpts, SkipRecord};
use crate::error::Emit;
use crate::naming::{camel, escape_keyword};
use crate::scope::Scope;
use crate::transpiler::{Mode, Transpiler};
use crate::types::go_type;

/// A line as written in the corpus and as rendered in Go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub original: String,
    pub go: String,
}

/// A translated variable definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoDef {
    pub line: Version,
    pub varname: String,
    pub vartype: String,
    pub value: String,
    /// Run the value against the server when it is a query.
    pub run_if_query: bool,
    pub testfile: String,
    pub line_num: usize,
    pub runopts: Option<BTreeMap<String, String>>,
}

/// A translated query with its expected result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoQuery {
    /// The query evaluates to a plain Go value, nothing to run.
    pub is_value: bool,
    pub line: Version,
    pub expected_type: String,
    pub expected_line: Version,
    pub testfile: String,
    pub line_num: usize,
    pub runopts: BTreeMap<String, String>,
}

/// A Go line copied from the corpus as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoLine {
    pub line: String,
    pub testfile: String,
    pub line_num: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTest {
    pub line: String,
    pub reason: String,
}

/// One entry of a converted test file, in corpus order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    Def(GoDef),
    Query(GoQuery),
    Passthrough(GoLine),
    Skipped(SkippedTest),
}

impl Output {
    /// Whether this entry produces test code, as opposed to a comment.
    pub fn is_test_code(&self) -> bool {
        matches!(self, Output::Def(_) | Output::Query(_))
    }
}

/// Assembles the records of one test file.
///
/// Owns the file's [`Scope`]: every term-typed definition that converts
/// makes its variable available to later records.
#[derive(Debug)]
pub struct Assembler {
    testfile: String,
    scope: Scope,
    smart_bracket: bool,
}

impl Assembler {
    pub fn new(testfile: impl Into<String>, scope: Scope) -> Self {
        Self {
            testfile: testfile.into(),
            scope,
            smart_bracket: false,
        }
    }

    pub fn smart_bracket(mut self, enabled: bool) -> Self {
        self.smart_bracket = enabled;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn transpiler(&self, mode: Mode) -> Transpiler<'_> {
        Transpiler::new(mode, &self.scope).smart_bracket(self.smart_bracket)
    }

    /// `var name Type = value`. Any skip raised here is fatal.
    pub fn definition(&mut self, def: &Definition) -> Emit<Output> {
        let term = &def.term;
        let mode = Mode::for_tag(&term.tag);
        let transpiler = self.transpiler(mode).for_definition();

        let vartype = match mode {
            Mode::Query => "r.Term".to_string(),
            Mode::Value => go_type(&term.tag)?,
        };
        // The corpus values for these overflow what the driver accepts.
        let value = match (mode, def.varname.as_str()) {
            (Mode::Value, "upper_limit") => "2<<52 - 1".to_string(),
            (Mode::Value, "lower_limit") => "1 - 2<<52".to_string(),
            _ => transpiler.convert(&term.ast)?,
        };
        let runopts = match &def.runopts {
            Some(opts) => Some(convert_runopts(
                opts,
                self.transpiler(Mode::Value).for_definition(),
            )?),
            None => None,
        };

        let varname = escape_keyword(&def.varname);
        let go = format!("var {} {} = {}", varname, vartype, value);
        if mode == Mode::Query {
            self.scope.insert(def.varname.clone());
        }

        Ok(Output::Def(GoDef {
            line: Version {
                original: term.line.clone(),
                go,
            },
            varname,
            vartype,
            value,
            run_if_query: def.run_if_query,
            testfile: self.testfile.clone(),
            line_num: def.line_num,
            runopts,
        }))
    }

    /// A query and its expected result. Skips here only drop this record.
    pub fn query(&self, query: &Query) -> Emit<Output> {
        // Only checked; an unknown tag means the type table needs a new rule.
        go_type(&query.query.tag)?;
        let go = self.transpiler(Mode::Query).convert(&query.query.ast)?;
        let expected = &query.expected;
        let expected_go = self
            .transpiler(Mode::for_tag(&expected.tag))
            .convert(&expected.ast)?;
        let expected_type = go_type(&expected.tag)?;

        let mut runopts = match &query.runopts {
            Some(opts) => convert_runopts(opts, self.transpiler(Mode::Value))?,
            None => BTreeMap::new(),
        };
        runopts.insert("GeometryFormat".to_string(), r#""raw""#.to_string());
        runopts
            .entry("GroupFormat".to_string())
            .or_insert_with(|| r#""map""#.to_string());

        Ok(Output::Query(GoQuery {
            is_value: query.query.tag.is_plain_value(),
            line: Version {
                original: query.query.line.clone(),
                go,
            },
            expected_type,
            expected_line: Version {
                original: expected.line.clone(),
                go: expected_go,
            },
            testfile: self.testfile.clone(),
            line_num: query.line_num,
            runopts,
        }))
    }

    pub fn passthrough(&self, line: &Passthrough) -> Output {
        Output::Passthrough(GoLine {
            line: line.line.clone(),
            testfile: self.testfile.clone(),
            line_num: line.line_num,
        })
    }
}

impl From<&SkipRecord> for Output {
    fn from(record: &SkipRecord) -> Self {
        Output::Skipped(SkippedTest {
            line: record.line.clone(),
            reason: record.reason.clone(),
        })
    }
}

/// `RunOpts` fields: camel-cased keys, values rendered as Go values.
pub fn convert_runopts(
    opts: &RunOpts,
    transpiler: Transpiler<'_>,
) -> Emit<BTreeMap<String, String>> {
    opts.iter()
        .map(|(key, value): (&String, &Expr)| Ok((camel(key), transpiler.convert(value)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeTag;
    use crate::corpus::Term;
    use crate::error::TranspileError;
    use crate::parser::parse;

    fn term(line: &str, tag: TypeTag) -> Term {
        Term {
            line: line.to_string(),
            tag,
            ast: parse(line).unwrap(),
        }
    }

    fn def(varname: &str, src: &str, tag: TypeTag) -> Definition {
        Definition {
            varname: varname.to_string(),
            term: Term {
                line: format!("{} = {}", varname, src),
                ..term(src, tag)
            },
            run_if_query: false,
            runopts: None,
            line_num: 1,
        }
    }

    fn query(src: &str, expected: &str, expected_tag: TypeTag) -> Query {
        Query {
            query: term(src, TypeTag::Term),
            expected: term(expected, expected_tag),
            runopts: None,
            line_num: 4,
        }
    }

    fn assembler() -> Assembler {
        Assembler::new("math_logic/add.yaml", Scope::new(["tbl"]))
    }

    #[test]
    fn test_term_definition_joins_scope() {
        let mut asm = assembler();
        let out = asm.definition(&def("x", "r.expr(1)", TypeTag::Term)).unwrap();
        let Output::Def(go) = out else {
            panic!("expected a definition");
        };
        assert_eq!(go.line.go, "var x r.Term = r.Expr(1)");
        assert_eq!(go.vartype, "r.Term");
        assert!(asm.scope().contains("x"));

        // x is now a term, so operators chain on it.
        let Output::Query(q) = asm.query(&query("x + 1", "2", TypeTag::Int)).unwrap() else {
            panic!("expected a query");
        };
        assert_eq!(q.line.go, "x.Add(1)");
    }

    #[test]
    fn test_value_definition() {
        let mut asm = assembler();
        let Output::Def(go) = asm.definition(&def("y", "[1, 2]", TypeTag::List)).unwrap() else {
            panic!("expected a definition");
        };
        assert_eq!(go.line.go, "var y []interface{} = []interface{}{1, 2}");
        assert!(!asm.scope().contains("y"));
    }

    #[test]
    fn test_limit_definitions() {
        let mut asm = assembler();
        let Output::Def(go) = asm
            .definition(&def("upper_limit", "2 ** 53 - 1", TypeTag::Int))
            .unwrap()
        else {
            panic!("expected a definition");
        };
        assert_eq!(go.value, "2<<52 - 1");
        let Output::Def(go) = asm
            .definition(&def("lower_limit", "1 - 2 ** 53", TypeTag::Int))
            .unwrap()
        else {
            panic!("expected a definition");
        };
        assert_eq!(go.value, "1 - 2<<52");
    }

    #[test]
    fn test_definition_skip_is_fatal() {
        let mut asm = assembler();
        let err = asm
            .definition(&def("s", "frozenset([1])", TypeTag::List))
            .unwrap_err();
        match err {
            TranspileError::Skip(skip) => assert!(skip.is_fatal()),
            other => panic!("expected a skip, got {:?}", other),
        }
        assert!(!asm.scope().contains("s"));
    }

    #[test]
    fn test_query_runopts_defaults() {
        let asm = assembler();
        let Output::Query(q) = asm.query(&query("r.expr(1) + 1", "2", TypeTag::Int)).unwrap() else {
            panic!("expected a query");
        };
        assert_eq!(q.line.go, "r.Expr(1).Add(1)");
        assert_eq!(q.expected_type, "int");
        assert_eq!(q.expected_line.go, "2");
        assert!(!q.is_value);
        assert_eq!(q.runopts["GeometryFormat"], r#""raw""#);
        assert_eq!(q.runopts["GroupFormat"], r#""map""#);
    }

    #[test]
    fn test_query_runopts_converted() {
        let asm = assembler();
        let mut q = query("tbl.group('a')", "1", TypeTag::Int);
        let mut opts = RunOpts::new();
        opts.insert("group_format".to_string(), parse("'raw'").unwrap());
        opts.insert("profile".to_string(), parse("True").unwrap());
        q.runopts = Some(opts);

        let Output::Query(q) = asm.query(&q).unwrap() else {
            panic!("expected a query");
        };
        assert_eq!(q.runopts["GroupFormat"], r#""raw""#);
        assert_eq!(q.runopts["Profile"], "true");
        assert_eq!(q.runopts["GeometryFormat"], r#""raw""#);
    }

    #[test]
    fn test_query_skip_is_recoverable() {
        let asm = assembler();
        let err = asm
            .query(&query("r.expr(1, 2)", "1", TypeTag::Int))
            .unwrap_err();
        match err {
            TranspileError::Skip(skip) => assert!(!skip.is_fatal()),
            other => panic!("expected a skip, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_expected_type_aborts() {
        let asm = assembler();
        let tag = TypeTag::Unknown {
            module: "decimal".into(),
            name: "Decimal".into(),
        };
        let err = asm.query(&query("r.expr(1)", "1", tag)).unwrap_err();
        assert!(matches!(err, TranspileError::UnhandledType { .. }));
    }

    #[test]
    fn test_unknown_query_type_aborts() {
        let asm = assembler();
        let mut q = query("r.expr(1)", "1", TypeTag::Int);
        q.query.tag = TypeTag::Unknown {
            module: "numpy".into(),
            name: "int64".into(),
        };
        let err = asm.query(&q).unwrap_err();
        assert!(matches!(
            err,
            TranspileError::UnhandledType { ref module, ref name } if module == "numpy" && name == "int64"
        ));
    }

    #[test]
    fn test_output_serializes_with_kind() {
        let out = Output::Skipped(SkippedTest {
            line: "r.expr(1, 2)".into(),
            reason: "nope".into(),
        });
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["kind"], "skipped");
        assert_eq!(json["reason"], "nope");
    }
}
