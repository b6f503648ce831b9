use crate::{
    config::ConfigError, convert::CompileError, criteria::CriteriaError, model::ModelError,
    scope::ScopeError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured error with a stable internal classification.
/// Not a stable API; the facade maps it onto its public error type.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// The module error this was classified from, when there is one.
    /// The variant must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    fn with_detail(class: ErrorClass, origin: ErrorOrigin, detail: ErrorDetail) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail: Some(detail),
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
/// Origin-specific payload carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Model(ModelError),

    #[error("{0}")]
    Config(ConfigError),

    #[error("{0}")]
    Scope(ScopeError),

    #[error("{0}")]
    Criteria(CriteriaError),

    #[error("{0}")]
    Compile(CompileError),
}

impl From<ModelError> for InternalError {
    fn from(err: ModelError) -> Self {
        let class = match err {
            ModelError::DuplicateEntity { .. } | ModelError::DuplicateProperty { .. } => {
                ErrorClass::Conflict
            }
            _ => ErrorClass::InvalidInput,
        };

        Self::with_detail(class, ErrorOrigin::Model, ErrorDetail::Model(err))
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::with_detail(
            ErrorClass::InvalidInput,
            ErrorOrigin::Config,
            ErrorDetail::Config(err),
        )
    }
}

impl From<ScopeError> for InternalError {
    fn from(err: ScopeError) -> Self {
        Self::with_detail(scope_class(&err), ErrorOrigin::Scope, ErrorDetail::Scope(err))
    }
}

impl From<CriteriaError> for InternalError {
    fn from(err: CriteriaError) -> Self {
        let class = match &err {
            CriteriaError::UnknownEntity { .. } => ErrorClass::NotFound,
            CriteriaError::Scope(inner) => scope_class(inner),
        };

        Self::with_detail(class, ErrorOrigin::Criteria, ErrorDetail::Criteria(err))
    }
}

impl From<CompileError> for InternalError {
    fn from(err: CompileError) -> Self {
        let class = match &err {
            CompileError::EmptyInList { .. }
            | CompileError::UnresolvedPlaceholder { .. }
            | CompileError::MalformedTemplate { .. }
            | CompileError::JoinWithoutCondition { .. } => ErrorClass::InvalidInput,
            CompileError::AliasCollision { .. }
            | CompileError::DuplicateCriteria { .. }
            | CompileError::ScopeBusy
            | CompileError::ForeignScope { .. } => ErrorClass::Conflict,
            CompileError::MissingTarget { .. } => ErrorClass::InvariantViolation,
            CompileError::Scope(inner) => scope_class(inner),
        };

        Self::with_detail(class, ErrorOrigin::Compile, ErrorDetail::Compile(err))
    }
}

const fn scope_class(err: &ScopeError) -> ErrorClass {
    match err {
        ScopeError::Frozen | ScopeError::Busy | ScopeError::AliasAssigned { .. } => {
            ErrorClass::Conflict
        }
        ScopeError::UnknownCriteria { .. } => ErrorClass::NotFound,
        ScopeError::Exhausted => ErrorClass::Internal,
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    InvalidInput,
    Internal,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Model,
    Config,
    Scope,
    Criteria,
    Compile,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Model => "model",
            Self::Config => "config",
            Self::Scope => "scope",
            Self::Criteria => "criteria",
            Self::Compile => "compile",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
