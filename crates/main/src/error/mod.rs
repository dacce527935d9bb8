//! Error types for schema construction and value mapping.
//!
//! Every fallible operation in this crate returns [`Result`]. Errors raised
//! while walking a value are wrapped with the traversal [`Path`] at which
//! they occurred, see [`Error::at`].

use alloc::{boxed::Box, string::String};

mod path;

pub use path::{Path, PathSegment};

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A schema could not be built. Raised at scan time only.
    #[error("invalid schema for '{class}': {message}")]
    Schema { class: String, message: String },

    /// A validation expression could not be parsed.
    #[error("invalid validation expression: {0}")]
    ValidationParse(String),

    /// A value failed its property validator.
    #[error("field '{path}' {message}")]
    Validation { path: Path, message: String },

    /// A converter produced a value of the wrong type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A scalar could not be coerced into the target type.
    #[error("cannot parse {input:?} as {target}")]
    Parse { input: String, target: String },

    /// A value is not permitted at this location.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The receiver does not support mutation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A type cannot be handled by the requested operation.
    #[error("illegal type: {0}")]
    IllegalType(String),

    /// No instance could be created for a type.
    #[error("cannot instantiate '{class}': {reason}")]
    Instantiation { class: String, reason: String },

    /// The traversal context was used incorrectly.
    #[error("context error: {0}")]
    Context(String),

    /// A context injector failed.
    #[error("injector failed: {0}")]
    Injection(String),

    /// A user processor or hook reported a failure.
    #[error("{0}")]
    Processor(String),

    /// An error located at a traversal path.
    #[error("in field '{path}': {source}")]
    At { path: Path, source: Box<Error> },
}

impl Error {
    pub fn schema(class: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema {
            class: class.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn parse(input: impl Into<String>, target: impl Into<String>) -> Self {
        Error::Parse {
            input: input.into(),
            target: target.into(),
        }
    }

    pub fn custom(message: impl core::fmt::Display) -> Self {
        Error::Processor(message.to_string())
    }

    /// Attaches a traversal path to this error.
    ///
    /// Errors that already carry a path are returned unchanged, so the
    /// innermost location wins. An empty path is never attached.
    #[must_use]
    pub fn at(self, path: Path) -> Self {
        match self {
            Error::At { .. } | Error::Validation { .. } => self,
            _ if path.is_empty() => self,
            other => Error::At {
                path,
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, skipping any path wrappers.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Error::At { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the traversal path this error was raised at, if known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::At { path, .. } | Error::Validation { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    fn path(fields: &[&str]) -> Path {
        fields
            .iter()
            .map(|f| PathSegment::Field((*f).to_string()))
            .collect()
    }

    #[test]
    fn test_error_display() {
        let err = Error::schema("Profile", "duplicate name 'id'");
        assert_eq!(
            err.to_string(),
            "invalid schema for 'Profile': duplicate name 'id'"
        );

        let err = Error::Validation {
            path: path(&["server", "port"]),
            message: "must be at least 1".into(),
        };
        assert_eq!(err.to_string(), "field 'server.port' must be at least 1");
    }

    #[test]
    fn test_at_keeps_innermost_path() {
        let inner = Error::parse("abc", "i32").at(path(&["a", "b"]));
        let outer = inner.clone().at(path(&["a"]));
        assert_eq!(inner, outer);
        assert_eq!(
            outer.to_string(),
            "in field 'a.b': cannot parse \"abc\" as i32"
        );
        assert_eq!(outer.root(), &Error::parse("abc", "i32"));
    }

    #[test]
    fn test_at_ignores_empty_path() {
        let err = Error::InvalidValue("x".into()).at(Path::new());
        assert!(err.path().is_none());
    }
}
