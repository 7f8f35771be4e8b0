//! Corpus loading.
//!
//! The polyglot YAML tests are exported by the upstream extractor as one
//! JSON file each, already split into records with parsed expressions and
//! runtime type tags.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::ast::{Expr, TypeTag};
use crate::error::{GenError, GenResult};

/// Paths containing any of these are never converted.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    // Python-only regressions
    "regression/",
    // Too expensive against a test server
    "limits",
    // Depends on server timing
    "changefeeds/squash",
    // Argument count checks, meaningless with static types
    "arity",
    // Ruby-only tests
    ".rb.",
];

static VARNAME_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[, ]+").unwrap());

/// Run options attached to a query or definition, keyed by python name.
pub type RunOpts = BTreeMap<String, Expr>;

/// An expression with its source line and runtime type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Term {
    pub line: String,
    #[serde(rename = "type")]
    pub tag: TypeTag,
    pub ast: Expr,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Definition {
    pub varname: String,
    pub term: Term,
    #[serde(default)]
    pub run_if_query: bool,
    #[serde(default)]
    pub runopts: Option<RunOpts>,
    #[serde(default)]
    pub line_num: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Query {
    pub query: Term,
    pub expected: Term,
    #[serde(default)]
    pub runopts: Option<RunOpts>,
    #[serde(default)]
    pub line_num: usize,
}

/// A Go line given verbatim in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Passthrough {
    pub line: String,
    #[serde(default)]
    pub line_num: usize,
}

/// A test the extractor already knows cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkipRecord {
    pub line: String,
    pub reason: String,
    #[serde(default)]
    pub line_num: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    #[serde(rename = "def")]
    Definition(Definition),
    Query(Query),
    Passthrough(Passthrough),
    Skip(SkipRecord),
}

impl Record {
    /// The corpus line this record came from.
    pub fn line(&self) -> &str {
        match self {
            Record::Definition(def) => &def.term.line,
            Record::Query(query) => &query.query.line,
            Record::Passthrough(line) => &line.line,
            Record::Skip(skip) => &skip.line,
        }
    }

    pub fn line_num(&self) -> usize {
        match self {
            Record::Definition(def) => def.line_num,
            Record::Query(query) => query.line_num,
            Record::Passthrough(line) => line.line_num,
            Record::Skip(skip) => skip.line_num,
        }
    }
}

fn default_description() -> String {
    "No description".to_string()
}

/// One exported test file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorpusFile {
    /// Path of the YAML source, relative to the test directory.
    pub file: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Table variables, separated by commas and/or spaces.
    #[serde(default)]
    pub table_variable_name: String,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl CorpusFile {
    pub fn load(path: &Path) -> GenResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&path.display().to_string(), &content)
    }

    pub fn from_json(label: &str, content: &str) -> GenResult<Self> {
        serde_json::from_str(content).map_err(|e| GenError::corpus(label, e.to_string()))
    }

    /// Declared table variables, sorted.
    pub fn table_vars(&self) -> Vec<String> {
        split_varnames(&self.table_variable_name)
    }

    /// `math_logic/add.yaml` → `math_logic_add`.
    pub fn module_name(&self) -> String {
        let stem = self.file.split('.').next().unwrap_or_default();
        stem.replace('/', "_")
    }
}

/// Split a `table_variable_name` value into distinct names.
pub fn split_varnames(raw: &str) -> Vec<String> {
    let names: BTreeSet<String> = VARNAME_SEPARATOR
        .split(raw.trim())
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();
    names.into_iter().collect()
}

/// Find corpus files under `test_dir`.
///
/// Returns paths relative to `test_dir`, sorted. With `only`, just that file
/// is returned (exclusions still apply).
pub fn discover(test_dir: &Path, exclusions: &[String], only: Option<&str>) -> GenResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(test_dir, test_dir, &mut found)?;
    found.sort();

    Ok(found
        .into_iter()
        .filter(|path| {
            let text = path.to_string_lossy().replace('\\', "/");
            if let Some(only) = only {
                if text != only {
                    return false;
                }
            }
            !exclusions.iter().any(|excluded| text.contains(excluded.as_str()))
        })
        .collect())
}

fn walk(root: &Path, dir: &Path, found: &mut Vec<PathBuf>) -> GenResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| GenError::corpus(dir.display(), format!("failed to read directory: {}", e)))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, found)?;
        } else if path.extension().map(|ext| ext == "json").unwrap_or(false) {
            if let Ok(relative) = path.strip_prefix(root) {
                found.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "file": "math_logic/add.yaml",
        "description": "Tests for basic usage of the add operation",
        "table_variable_name": "tbl, tbl2 tbl",
        "records": [
            {"kind": "def", "varname": "x", "line_num": 3,
             "term": {"line": "x = r.expr(1)",
                      "type": {"module": "rethinkdb.ast", "name": "Datum"},
                      "ast": {"node": "call", "value": {
                          "func": {"node": "attribute", "value": {"value": {"node": "name", "value": "r"}, "attr": "expr"}},
                          "args": [{"node": "int", "value": "1"}]}}}},
            {"kind": "query", "line_num": 5,
             "query": {"line": "x", "type": {"module": "rethinkdb.ast", "name": "Datum"},
                       "ast": {"node": "name", "value": "x"}},
             "expected": {"line": "1", "type": {"module": "builtins", "name": "int"},
                          "ast": {"node": "int", "value": "1"}},
             "runopts": {"profile": {"node": "bool", "value": true}}},
            {"kind": "passthrough", "line": "var y = 2", "line_num": 7},
            {"kind": "skip", "line": "r.expr(1).foo()", "reason": "no Go equivalent", "line_num": 9}
        ]
    }"#;

    #[test]
    fn test_parse_corpus_file() {
        let file = CorpusFile::from_json("add.json", SAMPLE).unwrap();
        assert_eq!(file.records.len(), 4);
        assert_eq!(file.module_name(), "math_logic_add");
        assert_eq!(file.table_vars(), vec!["tbl".to_string(), "tbl2".to_string()]);

        let Record::Definition(def) = &file.records[0] else {
            panic!("expected a definition");
        };
        assert_eq!(def.term.tag, TypeTag::Term);
        assert!(!def.run_if_query);

        let Record::Query(query) = &file.records[1] else {
            panic!("expected a query");
        };
        assert_eq!(query.expected.tag, TypeTag::Int);
        assert_eq!(query.runopts.as_ref().unwrap()["profile"], Expr::Bool(true));
        assert_eq!(file.records[3].line(), "r.expr(1).foo()");
        assert_eq!(file.records[3].line_num(), 9);
        assert_eq!(file.records[2].line_num(), 7);
    }

    #[test]
    fn test_invalid_corpus() {
        let err = CorpusFile::from_json("bad.json", "{\"records\": 3}").unwrap_err();
        assert!(err.to_string().starts_with("Invalid corpus file bad.json"));
    }

    #[test]
    fn test_defaults() {
        let file = CorpusFile::from_json("a.json", r#"{"file": "a.yaml"}"#).unwrap();
        assert_eq!(file.description, "No description");
        assert!(file.table_vars().is_empty());
        assert!(file.records.is_empty());
    }

    #[test]
    fn test_discover_applies_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "math_logic/add.json",
            "math_logic/sub.json",
            "regression/1234.json",
            "arity.json",
            "notes.txt",
        ] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "{}").unwrap();
        }

        let exclusions: Vec<String> = DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect();
        let found = discover(dir.path(), &exclusions, None).unwrap();
        assert_eq!(
            found,
            vec![
                PathBuf::from("math_logic/add.json"),
                PathBuf::from("math_logic/sub.json")
            ]
        );

        let only = discover(dir.path(), &exclusions, Some("math_logic/sub.json")).unwrap();
        assert_eq!(only, vec![PathBuf::from("math_logic/sub.json")]);
    }
}
