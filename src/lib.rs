//! # reqlgen: ReQL polyglot tests for Go
//!
//! Converts the language-neutral ReQL test corpus into Go test suites for
//! the gorethink driver.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use reqlgen::prelude::*;
//!
//! // Translate one python ReQL snippet
//! let go = reqlgen::translate_snippet("r.expr([1, 2, 3])[1:]", true)?;
//! // => r.Expr([]interface{}{1, 2, 3}).Slice(1, -1, r.SliceOpts{RightBound: "closed"})
//!
//! // Convert the whole corpus
//! let report = reqlgen::driver::generate(&GenConfig::discover()?, None)?;
//! ```
//!
//! ## Pipeline
//!
//! | Stage       | Module         | Produces                          |
//! |-------------|----------------|-----------------------------------|
//! | Load        | [`corpus`]     | typed records per test file       |
//! | Translate   | [`transpiler`] | Go text per expression            |
//! | Assemble    | [`assembler`]  | definitions, queries, skips       |
//! | Drive       | [`driver`]     | ordered outputs per file          |
//! | Render      | [`render`]     | `reql_<module>_test.go`           |

pub mod assembler;
pub mod ast;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod error;
pub mod naming;
pub mod parser;
pub mod render;
pub mod scope;
pub mod transpiler;
pub mod types;

pub mod prelude {
    pub use crate::assembler::{Assembler, Output};
    pub use crate::ast::*;
    pub use crate::config::GenConfig;
    pub use crate::corpus::{CorpusFile, Record};
    pub use crate::driver::{convert_files, convert_records, generate};
    pub use crate::error::*;
    pub use crate::parser::parse;
    pub use crate::render::GoTestRenderer;
    pub use crate::scope::Scope;
    pub use crate::transpiler::{Mode, Transpiler};
}

/// Parse a python expression into an expression tree.
///
/// # Example
///
/// ```
/// use reqlgen::parse;
///
/// let expr = parse("r.expr(1)").unwrap();
/// assert!(matches!(expr, reqlgen::ast::Expr::Call { .. }));
/// ```
pub fn parse(input: &str) -> Result<ast::Expr, error::GenError> {
    parser::parse(input)
}

/// Translate a python ReQL snippet to Go in query mode, with only `r` in
/// scope.
///
/// # Example
///
/// ```
/// let go = reqlgen::translate_snippet("r.expr(1) + 2", false).unwrap();
/// assert_eq!(go, "r.Expr(1).Add(2)");
/// ```
pub fn translate_snippet(input: &str, smart_bracket: bool) -> Result<String, error::GenError> {
    let expr = parser::parse(input)?;
    let scope = scope::Scope::new(Vec::<String>::new());
    transpiler::Transpiler::new(transpiler::Mode::Query, &scope)
        .smart_bracket(smart_bracket)
        .convert(&expr)
        .map_err(|source| error::GenError::Transpile {
            file: "<snippet>".to_string(),
            line_num: 1,
            line: input.to_string(),
            source,
        })
}
