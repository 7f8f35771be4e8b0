//! Go test file rendering.
//!
//! Uses Handlebars with HTML escaping disabled. Helpers:
//! - go_string: quote text as a Go string literal
//! - go_comment: flatten text so it fits in a one-line comment

use std::fs;
use std::path::{Path, PathBuf};

use handlebars::{handlebars_helper, Handlebars};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::assembler::Output;
use crate::corpus::CorpusFile;
use crate::error::{GenError, GenResult};
use crate::naming::camel;
use crate::transpiler::escape_string;

const TEMPLATE_NAME: &str = "reql_test";
const BUILTIN_TEMPLATE_PATH: &str = "templates/reql_test.go.hbs";
const BUILTIN_TEMPLATE: &str = include_str!("../templates/reql_test.go.hbs");

handlebars_helper!(go_string: |s: str| escape_string(s));
handlebars_helper!(go_comment: |s: str| s.replace(['\n', '\r'], " ").replace("*/", "* /"));

/// `reql_<module>_test.go`
pub fn output_name(module: &str) -> String {
    format!("reql_{}_test.go", module)
}

/// Marks the file as generated and points at the template it came from.
pub fn autogenerated_header(template: &str) -> String {
    format!(
        "// Code generated by reqlgen.\n\
         // Do not edit this file directly.\n\
         // The template for this file is located at:\n\
         // {}\n",
        template
    )
}

/// Present `fetch(feed, n)` queries to the template as their arguments.
fn fetch_args(go: &str) -> Option<&str> {
    go.strip_prefix("fetch(")?.strip_suffix(')')
}

/// Renders converted test files.
pub struct GoTestRenderer {
    handlebars: Handlebars<'static>,
    template_path: String,
}

impl GoTestRenderer {
    /// Renderer using the built-in template.
    pub fn new() -> GenResult<Self> {
        Self::with_template(BUILTIN_TEMPLATE, BUILTIN_TEMPLATE_PATH.to_string())
    }

    /// Renderer using a template file.
    pub fn from_template_file(path: &Path) -> GenResult<Self> {
        let source = fs::read_to_string(path)?;
        Self::with_template(&source, path.display().to_string())
    }

    fn with_template(source: &str, template_path: String) -> GenResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("go_string", Box::new(go_string));
        handlebars.register_helper("go_comment", Box::new(go_comment));
        handlebars
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| GenError::Render(format!("{}: {}", template_path, e)))?;
        Ok(Self {
            handlebars,
            template_path,
        })
    }

    pub fn template_path(&self) -> &str {
        &self.template_path
    }

    /// Render one file. `None` when there is no test code to write.
    pub fn render(&self, file: &CorpusFile, outputs: &[Output]) -> GenResult<Option<String>> {
        if !outputs.iter().any(Output::is_test_code) {
            return Ok(None);
        }

        let module = file.module_name();
        let outputs = outputs
            .iter()
            .map(output_context)
            .collect::<GenResult<Vec<_>>>()?;
        let data = json!({
            "description": file.description,
            "testfile": file.file,
            "module_name": camel(&module),
            "suite": format!("{}Suite", camel(&module)),
            "table_var_names": file.table_vars(),
            "outputs": outputs,
        });

        let body = self
            .handlebars
            .render(TEMPLATE_NAME, &data)
            .map_err(|e| GenError::Render(e.to_string()))?;
        Ok(Some(autogenerated_header(&self.template_path) + &body))
    }

    /// Render one file into `output_dir`. Returns the written path.
    pub fn write(
        &self,
        file: &CorpusFile,
        outputs: &[Output],
        output_dir: &Path,
    ) -> GenResult<Option<PathBuf>> {
        let path = output_dir.join(output_name(&file.module_name()));
        match self.render(file, outputs)? {
            Some(text) => {
                info!("Rendering {}", path.display());
                fs::write(&path, text)?;
                Ok(Some(path))
            }
            None => {
                debug!("Empty template: {}", path.display());
                Ok(None)
            }
        }
    }
}

fn output_context(output: &Output) -> GenResult<Value> {
    let mut value = serde_json::to_value(output).map_err(|e| GenError::Render(e.to_string()))?;
    if let Output::Query(query) = output {
        if let Some(args) = fetch_args(&query.line.go) {
            value["fetch_args"] = json!(args);
        }
    }
    Ok(value)
}
