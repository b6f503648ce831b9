//! Module: expr
//! Responsibility: immutable predicate nodes and the builders that
//! validate and resolve them.
//! Does not own: SQL rendering, parameter allocation.
//!
//! Every node is a single `Expression` whose `matched` mode and `target`
//! are decided together when the builder resolves its column, so the two
//! can never disagree.

mod builder;
mod ops;
mod skip;
pub(crate) mod template;

#[cfg(test)]
mod tests;

use crate::{criteria::Criteria, model::Column, scope::CriteriaId, value::Value};
use std::{collections::BTreeMap, sync::OnceLock};

// re-exports
pub use builder::{
    BetweenBuilder, ColumnEqualBuilder, ComparisonBuilder, ExistsBuilder, FuzzyBuilder,
    NestedBuilder, NullableBuilder, RangeBuilder, SubqueryBuilder, TemplateBuilder,
};
pub use ops::{
    BetweenOp, CompareOp, FuzzyOp, MatchMode, NullOp, RangeOp, Slot, SubqueryOp, Wildcard,
};
pub use skip::SkipReason;

use builder::Resolution;

///
/// Target
/// The column an expression tests.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Target {
    /// Caller-supplied SQL column text, used verbatim.
    Raw(String),
    /// Column resolved through entity metadata.
    Resolved(Column),
}

impl Target {
    /// Physical column text as written in SQL, without qualification.
    #[must_use]
    pub fn sql_name(&self) -> &str {
        match self {
            Self::Raw(text) => text,
            Self::Resolved(column) => &column.name,
        }
    }

    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

///
/// ColumnSide
/// Right-hand side of a column equality.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnSide {
    pub criteria: CriteriaId,
    pub alias: Option<String>,
    pub target: Target,
}

///
/// TemplateArgs
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateArgs {
    pub positional: Vec<Value>,
    pub named: BTreeMap<String, Value>,
}

impl TemplateArgs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

///
/// ExprKind
/// Variant payload of an expression.
///

#[derive(Clone, Debug)]
pub enum ExprKind {
    Compare {
        op: CompareOp,
        value: Value,
    },
    Range {
        op: RangeOp,
        values: Vec<Value>,
    },
    Between {
        op: BetweenOp,
        begin: Value,
        end: Value,
    },
    Fuzzy {
        op: FuzzyOp,
        text: String,
        wildcard: Wildcard,
        escape: Option<char>,
    },
    Nullable {
        op: NullOp,
    },
    /// Template text lives in the expression target (`Target::Raw`).
    Template {
        args: TemplateArgs,
        column: Option<Target>,
    },
    ColumnEqual {
        other: ColumnSide,
    },
    Exists {
        negated: bool,
        subquery: Box<Criteria>,
    },
    Subquery {
        op: SubqueryOp,
        subquery: Box<Criteria>,
    },
    Nested {
        negated: bool,
        children: Vec<Expression>,
    },
}

///
/// Expression
///
/// One predicate node. Immutable once built, except for the owner handle
/// which may be bound exactly once (first writer wins).
///

#[derive(Clone, Debug)]
pub struct Expression {
    owner: OnceLock<CriteriaId>,
    alias: Option<String>,
    slot: Slot,
    matched: MatchMode,
    target: Option<Target>,
    kind: ExprKind,
}

impl Expression {
    pub(crate) fn from_parts(
        owner: Option<CriteriaId>,
        alias: Option<String>,
        slot: Slot,
        resolution: Resolution,
        kind: ExprKind,
    ) -> Self {
        let (matched, target) = resolution.into_parts();
        let mut expr = Self {
            owner: OnceLock::new(),
            alias,
            slot,
            matched,
            target,
            kind,
        };
        if let Some(id) = owner {
            expr.bind_owner(id);
        }

        expr
    }

    // ------------------------------------------------------------------
    // Builder entry points
    // ------------------------------------------------------------------

    #[must_use]
    pub fn compare(op: CompareOp) -> ComparisonBuilder {
        ComparisonBuilder::new(op)
    }

    #[must_use]
    pub fn range(op: RangeOp) -> RangeBuilder {
        RangeBuilder::new(op)
    }

    #[must_use]
    pub fn between(op: BetweenOp) -> BetweenBuilder {
        BetweenBuilder::new(op)
    }

    #[must_use]
    pub fn fuzzy(op: FuzzyOp) -> FuzzyBuilder {
        FuzzyBuilder::new(op)
    }

    #[must_use]
    pub fn nullable(op: NullOp) -> NullableBuilder {
        NullableBuilder::new(op)
    }

    #[must_use]
    pub fn template(text: impl Into<String>) -> TemplateBuilder {
        TemplateBuilder::new(text)
    }

    #[must_use]
    pub fn column_equal() -> ColumnEqualBuilder {
        ColumnEqualBuilder::new()
    }

    #[must_use]
    pub fn exists(negated: bool) -> ExistsBuilder {
        ExistsBuilder::new(negated)
    }

    #[must_use]
    pub fn subquery(op: SubqueryOp) -> SubqueryBuilder {
        SubqueryBuilder::new(op)
    }

    #[must_use]
    pub fn nested(negated: bool) -> NestedBuilder {
        NestedBuilder::new(negated)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn owner(&self) -> Option<CriteriaId> {
        self.owner.get().copied()
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    #[must_use]
    pub const fn matched(&self) -> MatchMode {
        self.matched
    }

    #[must_use]
    pub const fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// SQL operator text for diagnostics (`=`, `NOT IN`, `EXISTS`, ...).
    #[must_use]
    pub fn operator(&self) -> String {
        match &self.kind {
            ExprKind::Compare { op, .. } => op.to_string(),
            ExprKind::Range { op, .. } => op.to_string(),
            ExprKind::Between { op, .. } => op.to_string(),
            ExprKind::Fuzzy { op, .. } => op.to_string(),
            ExprKind::Nullable { op } => op.to_string(),
            ExprKind::Template { .. } => "TEMPLATE".to_string(),
            ExprKind::ColumnEqual { .. } => "=".to_string(),
            ExprKind::Exists { negated: false, .. } => "EXISTS".to_string(),
            ExprKind::Exists { negated: true, .. } => "NOT EXISTS".to_string(),
            ExprKind::Subquery { op, .. } => op.to_string(),
            ExprKind::Nested { negated: false, .. } => "NESTED".to_string(),
            ExprKind::Nested { negated: true, .. } => "NOT NESTED".to_string(),
        }
    }

    /// True when this node or any nested child correlates two columns.
    #[must_use]
    pub fn has_column_equal(&self) -> bool {
        match &self.kind {
            ExprKind::ColumnEqual { .. } => true,
            ExprKind::Nested { children, .. } => children.iter().any(Self::has_column_equal),
            _ => false,
        }
    }

    /// Copy with a replacement payload and owner. Used when a criteria is
    /// derived under fresh ids.
    pub(crate) fn rebuilt(&self, owner: Option<CriteriaId>, kind: ExprKind) -> Self {
        Self {
            owner: owner.map_or_else(OnceLock::new, OnceLock::from),
            alias: self.alias.clone(),
            slot: self.slot,
            matched: self.matched,
            target: self.target.clone(),
            kind,
        }
    }

    /// Bind the owning criteria if none is bound yet. Nested children
    /// are bound recursively. Returns true when this call set the owner.
    pub fn bind_owner(&mut self, id: CriteriaId) -> bool {
        let bound = self.owner.set(id).is_ok();
        if let ExprKind::Nested { children, .. } = &mut self.kind {
            for child in children {
                child.bind_owner(id);
            }
        }

        bound
    }
}
