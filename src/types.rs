//! Go type names for corpus type tags.

use crate::ast::TypeTag;
use crate::error::{Emit, TranspileError};
use crate::naming::camel;

/// Go type of a variable or expected result carrying values of `tag`.
///
/// Fails with `UnhandledType` on tags the mapper has no rule for; that is a
/// gap in this function, not in the test being converted.
pub fn go_type(tag: &TypeTag) -> Emit {
    let ty = match tag {
        TypeTag::Bool => "bool".to_string(),
        TypeTag::Bytes => "[]byte".to_string(),
        TypeTag::Int => "int".to_string(),
        TypeTag::Float => "float64".to_string(),
        TypeTag::Str => "string".to_string(),
        TypeTag::Time => "time.Time".to_string(),
        TypeTag::Dict => "map[interface{}]interface{}".to_string(),
        TypeTag::List => "[]interface{}".to_string(),
        TypeTag::Null => "interface{}".to_string(),
        TypeTag::Function => "func()".to_string(),
        TypeTag::Term => "r.Term".to_string(),
        TypeTag::Error(_) => "error".to_string(),
        TypeTag::DriverError(name) => name.clone(),
        TypeTag::TestHelper(name) => test_helper_type(name),
        // Constants like minval/maxval have no class of their own, the term
        // name is all there is to go on.
        TypeTag::Constant(st) => camel(st),
        TypeTag::Unknown { module, name } => {
            return Err(TranspileError::UnhandledType {
                module: module.clone(),
                name: name.clone(),
            });
        }
    };
    Ok(ty)
}

fn test_helper_type(name: &str) -> String {
    match name {
        "int_cmp" => "int".to_string(),
        "float_cmp" => "float64".to_string(),
        "err_regex" => "Err".to_string(),
        "partial" | "bag" => "compare.Expected".to_string(),
        // `Uuid` would clash with the driver's term.
        "uuid" => "compare.Regex".to_string(),
        _ => camel(name),
    }
}
