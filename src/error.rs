//! Error types for reqlgen.

use std::fmt;

use thiserror::Error;

/// How far a skipped construct reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Only the record that contains the construct is dropped.
    Recoverable,
    /// The rest of the file is dropped too, since later records may use
    /// a binding that never materialized.
    Fatal,
}

/// A test construct that has no faithful Go rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub reason: String,
    pub severity: Severity,
}

impl Skip {
    pub fn recoverable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            severity: Severity::Recoverable,
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            severity: Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Failure while translating a single expression.
///
/// `Skip` is the only variant a caller is expected to recover from. The
/// other two mean the transpiler itself needs extending and abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranspileError {
    /// The construct cannot be represented in Go; drop the test.
    #[error("skipped: {0}")]
    Skip(Skip),

    /// Node shape the transpiler does not cover yet.
    #[error("Unhandled: {message} (while translating {node})")]
    Unhandled { message: String, node: String },

    /// Runtime type the type mapper does not cover yet.
    #[error("Don't know how to convert python type {module}.{name} to Go")]
    UnhandledType { module: String, name: String },
}

impl TranspileError {
    /// Build an `Unhandled` error carrying a dump of the offending node.
    pub fn unhandled(message: impl Into<String>, node: &impl fmt::Debug) -> Self {
        Self::Unhandled {
            message: message.into(),
            node: format!("{:?}", node),
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

impl From<Skip> for TranspileError {
    fn from(skip: Skip) -> Self {
        Self::Skip(skip)
    }
}

/// Result of translating one node: the complete Go text for it.
pub type Emit<T = String> = Result<T, TranspileError>;

/// The main error type for reqlgen operations.
#[derive(Debug, Error)]
pub enum GenError {
    /// The transpiler hit a node or type it does not cover.
    #[error("{file}:{line_num}: {source}\n    while translating: {line}")]
    Transpile {
        file: String,
        line_num: usize,
        line: String,
        #[source]
        source: TranspileError,
    },

    /// Failed to parse an expression snippet.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// A corpus file could not be read or decoded.
    #[error("Invalid corpus file {path}: {message}")]
    Corpus { path: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template rendering error.
    #[error("Render error: {0}")]
    Render(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a corpus error for the given path.
    pub fn corpus(path: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Corpus {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for reqlgen operations.
pub type GenResult<T> = Result<T, GenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GenError::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }

    #[test]
    fn test_skip_display() {
        let err = TranspileError::from(Skip::recoverable("argument checks not supported"));
        assert!(err.is_skip());
        assert_eq!(err.to_string(), "skipped: argument checks not supported");
    }

    #[test]
    fn test_unhandled_carries_node() {
        let err = TranspileError::unhandled("Can't do exponent with non 2 base", &vec![3, 4]);
        assert!(!err.is_skip());
        assert_eq!(
            err.to_string(),
            "Unhandled: Can't do exponent with non 2 base (while translating [3, 4])"
        );
    }
}
