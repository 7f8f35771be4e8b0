//! Python → Go identifier conversion.

/// Go reserved words. A name colliding with one of these gets a single
/// trailing underscore.
pub const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Whether `name` is all-lower or all-upper snake case (`foo_bar`, `FOO_1`).
fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first.is_ascii_lowercase() {
        name.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    } else if first.is_ascii_uppercase() {
        name.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    } else {
        false
    }
}

/// Python `str.title()` on a single chunk: first letter upper, the rest lower.
fn title(chunk: &str) -> String {
    let mut out = String::with_capacity(chunk.len());
    let mut at_word_start = true;
    for c in chunk.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `snake_case` → `CamelCase`. A trailing `_` (the Python keyword-avoidance
/// marker) survives. Mixed-case input only gets its first letter raised.
pub fn camel(name: &str) -> String {
    if is_snake_case(name) {
        let suffix = if name.ends_with('_') { "_" } else { "" };
        let body: String = name.split('_').map(title).collect();
        body + suffix
    } else {
        upper_first(name)
    }
}

pub fn is_go_keyword(name: &str) -> bool {
    GO_KEYWORDS.contains(&name)
}

/// Append `_` to Go keywords, leave everything else alone.
pub fn escape_keyword(name: &str) -> String {
    if is_go_keyword(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Go method name for a ReQL term method.
pub fn term_name(term: &str) -> String {
    let name = match term {
        // Underscored in the python driver to dodge python keywords.
        "or_" => "Or",
        "and_" => "And",
        "not_" => "Not",
        "get_field" => "Field",
        "db" => "DB",
        "db_create" => "DBCreate",
        "db_drop" => "DBDrop",
        "db_list" => "DBList",
        "uuid" => "UUID",
        "geojson" => "GeoJSON",
        "js" => "JS",
        "json" => "JSON",
        "to_json" | "to_json_string" => "ToJSON",
        "minval" => "MinVal",
        "maxval" => "MaxVal",
        "http" => "HTTP",
        "iso8601" => "ISO8601",
        "to_iso8601" => "ToISO8601",
        _ => return camel(term),
    };
    name.to_string()
}

/// Go spelling of a bare python name (`True`, test helpers, builtins).
pub fn name_alias(name: &str) -> Option<&'static str> {
    let alias = match name {
        "True" => "true",
        "False" => "false",
        "None" | "nil" | "null" => "nil",
        "float" => "float64",
        // The test file provides an `Ast` helper standing in for datetime.
        "datetime" => "Ast",
        "len" => "maybeLen",
        "AnythingIsFine" => "compare.AnythingIsFine",
        "bag" => "compare.UnorderedMatch",
        "partial" => "compare.PartialMatch",
        "uuid" => "compare.IsUUID",
        "regex" => "compare.MatchesRegexp",
        _ => return None,
    };
    Some(alias)
}

/// Options struct type for the optional arguments of `func`.
pub fn optarg_type(func: &str) -> String {
    let derived = format!("{}Opts", camel(func));
    let name = match derived.as_str() {
        "JsOpts" => "JSOpts",
        "HttpOpts" => "HTTPOpts",
        "Iso8601Opts" => "ISO8601Opts",
        "IndexCreateFuncOpts" => "IndexCreateOpts",
        _ => derived.as_str(),
    };
    format!("r.{}", name)
}

/// Field of an options struct for the optional argument `key`.
pub fn optarg_field(key: &str) -> String {
    match key {
        "nonvoting_replica_tags" => "NonVotingReplicaTags".to_string(),
        _ => camel(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel() {
        assert_eq!(camel("index_create"), "IndexCreate");
        assert_eq!(camel("DB_LIST"), "DbList");
        assert_eq!(camel("or_"), "Or_");
        assert_eq!(camel("isoFormat"), "IsoFormat");
        assert_eq!(camel("math_logic_add"), "MathLogicAdd");
        assert_eq!(camel("iso8601"), "Iso8601");
    }

    #[test]
    fn test_camel_idempotent() {
        for name in ["index_create", "to_json", "or_", "isoFormat", "GROUP", "x"] {
            let once = camel(name);
            assert_eq!(camel(&once), once, "camel not idempotent on {}", name);
        }
    }

    #[test]
    fn test_escape_keyword_single_marker() {
        for kw in GO_KEYWORDS {
            let escaped = escape_keyword(kw);
            assert_eq!(escaped, format!("{}_", kw));
            // The escaped form is no longer a keyword, so it is left alone.
            assert_eq!(escape_keyword(&escaped), escaped);
        }
        assert_eq!(escape_keyword("tbl"), "tbl");
    }

    #[test]
    fn test_term_name() {
        assert_eq!(term_name("get_field"), "Field");
        assert_eq!(term_name("db_create"), "DBCreate");
        assert_eq!(term_name("and_"), "And");
        assert_eq!(term_name("to_json_string"), "ToJSON");
        assert_eq!(term_name("insert"), "Insert");
        assert_eq!(term_name("order_by"), "OrderBy");
    }

    #[test]
    fn test_optarg_names() {
        assert_eq!(optarg_type("insert"), "r.InsertOpts");
        assert_eq!(optarg_type("js"), "r.JSOpts");
        assert_eq!(optarg_type("index_create_func"), "r.IndexCreateOpts");
        assert_eq!(optarg_field("return_changes"), "ReturnChanges");
        assert_eq!(optarg_field("nonvoting_replica_tags"), "NonVotingReplicaTags");
    }

    #[test]
    fn test_name_alias() {
        assert_eq!(name_alias("True"), Some("true"));
        assert_eq!(name_alias("bag"), Some("compare.UnorderedMatch"));
        assert_eq!(name_alias("tbl"), None);
    }
}
