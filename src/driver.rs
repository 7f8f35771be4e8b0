//! Record stream driver.
//!
//! Feeds the records of each corpus file through the assembler in order,
//! turning skips into skipped-test entries and aborts into errors carrying
//! the file and line they came from.

use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::assembler::{Assembler, Output, SkippedTest};
use crate::config::GenConfig;
use crate::corpus::{discover, CorpusFile, Record};
use crate::error::{GenError, GenResult, TranspileError};
use crate::render::GoTestRenderer;
use crate::scope::Scope;

/// Convert one file's records. One output per record, in order.
///
/// A fatal skip in a definition turns every later record of the file into
/// a skipped test, since they may depend on the missing variable.
pub fn convert_records(
    testfile: &str,
    records: &[Record],
    table_vars: &[String],
) -> GenResult<Vec<Output>> {
    let mut assembler = Assembler::new(testfile, Scope::new(table_vars.iter().cloned()));
    let mut outputs = Vec::with_capacity(records.len());
    let mut failed_def: Option<String> = None;

    for record in records {
        if let Some(reason) = &failed_def {
            outputs.push(Output::Skipped(SkippedTest {
                line: record.line().to_string(),
                reason: reason.clone(),
            }));
            continue;
        }

        let result = match record {
            Record::Definition(def) => assembler.definition(def),
            Record::Query(query) => assembler.query(query),
            Record::Passthrough(line) => Ok(assembler.passthrough(line)),
            Record::Skip(skip) => Ok(Output::from(skip)),
        };

        match result {
            Ok(output) => outputs.push(output),
            Err(TranspileError::Skip(skip)) => {
                debug!(
                    "{}:{}: skipping `{}`: {}",
                    testfile,
                    record.line_num(),
                    record.line(),
                    skip
                );
                if skip.is_fatal() {
                    failed_def = Some(format!(
                        "skipped because the definition `{}` could not be converted: {}",
                        record.line(),
                        skip
                    ));
                }
                outputs.push(Output::Skipped(SkippedTest {
                    line: record.line().to_string(),
                    reason: skip.reason,
                }));
            }
            Err(source) => {
                error!(
                    "{}:{}: {} in `{}`",
                    testfile,
                    record.line_num(),
                    source,
                    record.line()
                );
                return Err(GenError::Transpile {
                    file: testfile.to_string(),
                    line_num: record.line_num(),
                    line: record.line().to_string(),
                    source,
                });
            }
        }
    }

    Ok(outputs)
}

/// Convert a corpus file.
pub fn convert_file(file: &CorpusFile) -> GenResult<Vec<Output>> {
    info!("Working on {}", file.file);
    convert_records(&file.file, &file.records, &file.table_vars())
}

/// Convert files one after the other. Nothing carries over between files.
pub fn convert_files(files: &[CorpusFile]) -> GenResult<Vec<Vec<Output>>> {
    files.iter().map(convert_file).collect()
}

/// What a full run produced.
#[derive(Debug, Default)]
pub struct Report {
    /// Go test files written, in corpus order.
    pub written: Vec<PathBuf>,
    /// Corpus files that produced no test code.
    pub empty: usize,
    /// Records turned into skipped tests.
    pub skipped: usize,
}

/// Discover, convert and render the whole corpus described by `config`.
///
/// Stops at the first file that hits an unhandled construct; files before
/// it are already written.
pub fn generate(config: &GenConfig, only: Option<&str>) -> GenResult<Report> {
    let renderer = match &config.template {
        Some(path) => GoTestRenderer::from_template_file(path)?,
        None => GoTestRenderer::new()?,
    };
    std::fs::create_dir_all(&config.output_dir)?;

    let mut report = Report::default();
    for relative in discover(&config.test_dir, &config.exclusions, only)? {
        let file = CorpusFile::load(&config.test_dir.join(&relative))?;
        let outputs = convert_file(&file)?;
        report.skipped += outputs
            .iter()
            .filter(|o| matches!(o, Output::Skipped(_)))
            .count();
        match renderer.write(&file, &outputs, &config.output_dir)? {
            Some(path) => report.written.push(path),
            None => report.empty += 1,
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeTag;
    use crate::corpus::{Definition, Query, SkipRecord, Term};
    use crate::parser::parse;

    fn term(line: &str, tag: TypeTag) -> Term {
        Term {
            line: line.to_string(),
            tag,
            ast: parse(line).unwrap(),
        }
    }

    fn def(varname: &str, src: &str, tag: TypeTag) -> Record {
        Record::Definition(Definition {
            varname: varname.to_string(),
            term: term(src, tag),
            run_if_query: false,
            runopts: None,
            line_num: 1,
        })
    }

    fn query(src: &str, expected: &str) -> Record {
        Record::Query(Query {
            query: term(src, TypeTag::Term),
            expected: term(expected, TypeTag::Int),
            runopts: None,
            line_num: 2,
        })
    }

    fn file(name: &str, records: Vec<Record>) -> CorpusFile {
        CorpusFile {
            file: name.to_string(),
            description: String::new(),
            table_variable_name: "tbl".to_string(),
            records,
        }
    }

    #[test]
    fn test_one_output_per_record() {
        let records = vec![
            def("x", "r.expr(1)", TypeTag::Term),
            query("x + 1", "2"),
            query("r.expr(1, 2)", "1"),
            Record::Skip(SkipRecord {
                line: "r.foo()".into(),
                reason: "pre-marked".into(),
                line_num: 3,
            }),
            query("tbl.count()", "0"),
        ];
        let outputs = convert_records("a.yaml", &records, &["tbl".to_string()]).unwrap();
        assert_eq!(outputs.len(), 5);
        assert!(matches!(outputs[0], Output::Def(_)));
        assert!(matches!(&outputs[1], Output::Query(q) if q.line.go == "x.Add(1)"));
        assert!(matches!(&outputs[2], Output::Skipped(s) if s.reason.contains("one parameter to expr")));
        assert!(matches!(&outputs[3], Output::Skipped(s) if s.reason == "pre-marked"));
        assert!(matches!(&outputs[4], Output::Query(q) if q.line.go == "tbl.Count()"));
    }

    #[test]
    fn test_fatal_skip_cascades_within_file() {
        let broken = file(
            "broken.yaml",
            vec![
                query("r.expr(1)", "1"),
                def("s", "frozenset([1])", TypeTag::List),
                query("r.expr(2)", "2"),
                query("r.expr(3)", "3"),
            ],
        );
        let healthy = file("healthy.yaml", vec![query("r.expr(4)", "4")]);

        let converted = convert_files(&[broken, healthy]).unwrap();
        let broken = &converted[0];
        assert!(matches!(broken[0], Output::Query(_)));
        for output in &broken[1..] {
            assert!(matches!(output, Output::Skipped(_)), "{:?}", output);
        }
        let Output::Skipped(cascaded) = &broken[3] else {
            unreachable!()
        };
        assert!(cascaded.reason.contains("frozenset([1])"));

        assert!(matches!(&converted[1][0], Output::Query(q) if q.line.go == "r.Expr(4)"));
    }

    #[test]
    fn test_scope_not_shared_between_files() {
        let first = file("first.yaml", vec![def("x", "r.expr(1)", TypeTag::Term)]);
        let second = file("second.yaml", vec![query("x + 1", "2")]);
        let converted = convert_files(&[first, second]).unwrap();
        assert!(matches!(&converted[1][0], Output::Query(q) if q.line.go == "r.Add(x, 1)"));
    }

    #[test]
    fn test_unhandled_aborts_with_context() {
        let records = vec![query("r.expr(1)", "1"), query("r.expr(3 ** 2)", "9")];
        let err = convert_records("pow.yaml", &records, &[]).unwrap_err();
        match err {
            GenError::Transpile {
                file,
                line_num,
                line,
                source,
            } => {
                assert_eq!(file, "pow.yaml");
                assert_eq!(line_num, 2);
                assert_eq!(line, "r.expr(3 ** 2)");
                assert!(matches!(source, TranspileError::Unhandled { .. }));
            }
            other => panic!("expected a transpile error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_query_tag_aborts_run() {
        let mut record = query("r.expr(1)", "1");
        if let Record::Query(q) = &mut record {
            q.query.tag = TypeTag::Unknown {
                module: "numpy".into(),
                name: "int64".into(),
            };
        }
        let err = convert_records("numpy.yaml", &[record], &[]).unwrap_err();
        assert!(matches!(
            err,
            GenError::Transpile {
                source: TranspileError::UnhandledType { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_generate_end_to_end() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(input.path().join("math_logic")).unwrap();
        std::fs::write(
            input.path().join("math_logic/add.json"),
            r#"{"file": "math_logic/add.yaml", "records": [
                {"kind": "query", "line_num": 4,
                 "query": {"line": "r.expr(1) + 1", "type": {"module": "rethinkdb.ast", "name": "Add"},
                           "ast": {"node": "bin_op", "value": {
                               "left": {"node": "call", "value": {
                                   "func": {"node": "attribute", "value": {"value": {"node": "name", "value": "r"}, "attr": "expr"}},
                                   "args": [{"node": "int", "value": "1"}]}},
                               "op": "add",
                               "right": {"node": "int", "value": "1"}}}},
                 "expected": {"line": "2", "type": {"module": "builtins", "name": "int"},
                              "ast": {"node": "int", "value": "2"}}}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            input.path().join("only_skips.json"),
            r#"{"file": "only_skips.yaml", "records": [{"kind": "skip", "line": "x", "reason": "y"}]}"#,
        )
        .unwrap();

        let config = GenConfig::builder()
            .test_dir(input.path())
            .output_dir(output.path())
            .build();
        let report = generate(&config, None).unwrap();

        assert_eq!(report.written, vec![output.path().join("reql_math_logic_add_test.go")]);
        assert_eq!(report.empty, 1);
        assert_eq!(report.skipped, 1);
        let text = std::fs::read_to_string(&report.written[0]).unwrap();
        assert!(text.contains("r.Expr(1).Add(1)"));
    }
}
