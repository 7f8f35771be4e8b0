//! Names known to hold ReQL terms within one test file.

use std::collections::BTreeSet;

/// Append-only set of variable names bound to ReQL terms.
///
/// Seeded with `r` and the file's table variables; every term-typed
/// definition that converts adds its name. Never shared between files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    names: BTreeSet<String>,
}

impl Scope {
    /// Scope for a file declaring the given table variables.
    pub fn new<I, S>(table_vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> = table_vars.into_iter().map(Into::into).collect();
        names.insert("r".to_string());
        Self { names }
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_r() {
        let scope = Scope::new(["tbl", "tbl2"]);
        assert!(scope.contains("r"));
        assert!(scope.contains("tbl2"));
        assert_eq!(scope.len(), 3);
    }

    #[test]
    fn test_grows() {
        let mut scope = Scope::new(Vec::<String>::new());
        scope.insert("q");
        scope.insert("q");
        assert_eq!(scope.iter().collect::<Vec<_>>(), vec!["q", "r"]);
    }
}
