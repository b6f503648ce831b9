use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlcrit_core::{
    config::ConfigError,
    convert::CompileError,
    criteria::CriteriaError,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
    model::ModelError,
    scope::ScopeError,
};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

// every module error funnels through the core classification
macro_rules! impl_from_core {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for Error {
                fn from(err: $err) -> Self {
                    InternalError::from(err).into()
                }
            }
        )*
    };
}

impl_from_core!(CompileError, ConfigError, CriteriaError, ModelError, ScopeError);

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A named entity or criteria handle does not exist.
    NotFound,

    /// The request clashes with existing state (aliases, a busy scope).
    Conflict,

    /// The caller supplied input that cannot be compiled.
    InvalidInput,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Conflict => Self::Conflict,
            ErrorClass::InvalidInput => Self::InvalidInput,
            ErrorClass::Internal | ErrorClass::InvariantViolation => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Model,
    Config,
    Scope,
    Criteria,
    Compile,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Model => Self::Model,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Scope => Self::Scope,
            CoreErrorOrigin::Criteria => Self::Criteria,
            CoreErrorOrigin::Compile => Self::Compile,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_violations_surface_as_internal() {
        let err = Error::from(CompileError::MissingTarget {
            operator: "=".to_string(),
        });

        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.origin, ErrorOrigin::Compile);
    }

    #[test]
    fn busy_scope_is_a_conflict() {
        let err = Error::from(CompileError::ScopeBusy);

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, CompileError::ScopeBusy.to_string());
    }

    #[test]
    fn error_serializes_with_kind_and_origin() {
        let err = Error::new(ErrorKind::NotFound, ErrorOrigin::Criteria, "gone");

        let json = serde_json::to_value(&err).expect("serialize");

        assert_eq!(
            json,
            serde_json::json!({
                "kind": "NotFound",
                "origin": "Criteria",
                "message": "gone",
            })
        );
    }
}
