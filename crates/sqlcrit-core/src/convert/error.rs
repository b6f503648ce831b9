use crate::scope::{CriteriaId, ScopeError};
use thiserror::Error as ThisError;

///
/// CompileError
///
/// Fatal compile outcomes. Compilation is all-or-nothing: when any of
/// these is returned no fragment or parameter is produced.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("IN list for '{column}' is empty")]
    EmptyInList { column: String },

    #[error("template placeholder '{token}' has no matching argument")]
    UnresolvedPlaceholder { token: String },

    #[error("template '{template}' is malformed: {message}")]
    MalformedTemplate { template: String, message: String },

    #[error("alias '{alias}' is used by more than one criteria in the statement")]
    AliasCollision { alias: String },

    #[error("criteria {id} appears more than once in the statement")]
    DuplicateCriteria { id: CriteriaId },

    #[error("scope is already being compiled")]
    ScopeBusy,

    #[error("criteria {id} belongs to a different compilation scope")]
    ForeignScope { id: CriteriaId },

    #[error("join participant '{entity}' has no ON condition")]
    JoinWithoutCondition { entity: String },

    #[error("'{operator}' expression has no column target")]
    MissingTarget { operator: String },

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

impl CompileError {
    /// Short stable label for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EmptyInList { .. } => "empty_in_list",
            Self::UnresolvedPlaceholder { .. } => "unresolved_placeholder",
            Self::MalformedTemplate { .. } => "malformed_template",
            Self::AliasCollision { .. } => "alias_collision",
            Self::DuplicateCriteria { .. } => "duplicate_criteria",
            Self::ScopeBusy => "scope_busy",
            Self::ForeignScope { .. } => "foreign_scope",
            Self::JoinWithoutCondition { .. } => "join_without_condition",
            Self::MissingTarget { .. } => "missing_target",
            Self::Scope(_) => "scope",
        }
    }
}
