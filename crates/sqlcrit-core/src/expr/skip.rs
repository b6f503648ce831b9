use crate::scope::CriteriaId;
use thiserror::Error as ThisError;

///
/// SkipReason
///
/// Why a builder produced no expression. Skips are soft: the criteria
/// drops the condition, logs it, and keeps going. Structural reasons
/// flag inputs that can never form a valid predicate (as opposed to an
/// optional condition that was simply absent).
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SkipReason {
    #[error("column target is blank")]
    BlankTarget,

    #[error("no column target was given")]
    MissingTarget,

    #[error("expression has no owning criteria to resolve '{property}' against")]
    MissingOwner { property: String },

    #[error("owning criteria {id} is not registered in the scope")]
    UnknownOwner { id: CriteriaId },

    #[error("entity '{entity}' has no mapped property '{property}'")]
    UnresolvedProperty { entity: String, property: String },

    #[error("entity '{entity}' has no primary key column")]
    UnresolvedId { entity: String },

    #[error("value is null")]
    NullValue,

    #[error("a list value was given to a single-value operator")]
    ListForScalar,

    #[error("value collection is null or empty")]
    EmptyCollection,

    #[error("range bound is missing")]
    MissingBound,

    #[error("fuzzy match text is empty")]
    EmptyText,

    #[error("template text is missing or blank")]
    MissingTemplate,

    #[error("no subquery was given")]
    MissingSubquery,

    #[error("column equality has no right-hand side")]
    MissingOther,

    #[error("nested group has no children")]
    EmptyNested,
}

impl SkipReason {
    /// True when the input can never form a predicate, regardless of
    /// which optional values happened to be present.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::EmptyCollection
                | Self::MissingBound
                | Self::MissingTemplate
                | Self::MissingSubquery
                | Self::MissingOther
                | Self::EmptyNested
        )
    }

    /// Short stable label for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BlankTarget => "blank_target",
            Self::MissingTarget => "missing_target",
            Self::MissingOwner { .. } => "missing_owner",
            Self::UnknownOwner { .. } => "unknown_owner",
            Self::UnresolvedProperty { .. } => "unresolved_property",
            Self::UnresolvedId { .. } => "unresolved_id",
            Self::NullValue => "null_value",
            Self::ListForScalar => "list_for_scalar",
            Self::EmptyCollection => "empty_collection",
            Self::MissingBound => "missing_bound",
            Self::EmptyText => "empty_text",
            Self::MissingTemplate => "missing_template",
            Self::MissingSubquery => "missing_subquery",
            Self::MissingOther => "missing_other",
            Self::EmptyNested => "empty_nested",
        }
    }
}
