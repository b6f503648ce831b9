//! Module: criteria
//! Responsibility: per-(sub)query accumulator of predicates, projections,
//! grouping, ordering, pagination and join participants.
//! Does not own: rendering (see `convert`), counters (see `scope`).

mod fluent;
mod join;
mod order;
mod page;
mod select;

#[cfg(test)]
mod tests;

use crate::{
    convert::{self, CompileError, CompiledCriteria},
    expr::{
        BetweenBuilder, ColumnEqualBuilder, ColumnSide, ComparisonBuilder, ExistsBuilder,
        ExprKind, Expression, FuzzyBuilder, NestedBuilder, NullableBuilder, RangeBuilder,
        SkipReason, SubqueryBuilder, Target, TemplateBuilder,
    },
    model::EntityModel,
    obs::sink::{self, MetricsEvent},
    scope::{CompilationScope, CriteriaId, ScopeError},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use thiserror::Error as ThisError;

// re-exports
pub use join::{JoinKind, JoinSpec};
pub use order::{Direction, Grouping, OrderBy};
pub use page::{PageRange, Pagination, RowRange, Window};
pub use select::{Aggregate, Selection};

///
/// RenderFlags
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderFlags {
    pub distinct: bool,
    pub contains_func: bool,
    /// Suppress the implicit default column list.
    pub only_func: bool,
    /// Render resolved columns as `column AS property`.
    pub use_prop_alias: bool,
    /// Keep ORDER BY inside a wrapped count statement.
    pub keep_order_by: bool,
}

///
/// ResultShape
/// Result-mapping hints carried through to callers untouched.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultShape {
    pub result_map: Option<String>,
    pub result_type: Option<String>,
    pub map_key: Option<String>,
    pub map_type: Option<String>,
}

///
/// Criteria
///
/// Query accumulator for one entity. Every criteria is registered in its
/// scope and addressed by a `CriteriaId`.
///
/// Cloning copies every field and keeps the same id, so a clone is an
/// alternative version of the same query: compile one or the other, not
/// both in one statement. `derive` produces a sibling in the same lineage
/// with its own id and alias; `sibling` produces an empty one.
///

#[derive(Clone, Debug)]
pub struct Criteria {
    scope: CompilationScope,
    id: CriteriaId,
    entity: Arc<EntityModel>,
    parent: Option<CriteriaId>,
    predicates: Vec<Expression>,
    selections: Vec<Selection>,
    ignored: BTreeSet<String>,
    groups: Vec<Grouping>,
    orders: Vec<OrderBy>,
    pagination: Pagination,
    flags: RenderFlags,
    shape: ResultShape,
    joins: Vec<Self>,
    join: JoinSpec,
    qualify: Option<bool>,
}

impl Criteria {
    /// Root criteria over a named entity.
    pub fn new(scope: &CompilationScope, entity: &str) -> Result<Self, CriteriaError> {
        Self::register(scope, entity, None)
    }

    fn register(
        scope: &CompilationScope,
        entity: &str,
        parent: Option<CriteriaId>,
    ) -> Result<Self, CriteriaError> {
        let model = scope
            .metadata()
            .entity(entity)
            .ok_or_else(|| CriteriaError::UnknownEntity {
                entity: entity.to_string(),
            })?;
        let id = scope.register(model.clone(), parent)?;

        sink::record(MetricsEvent::CriteriaCreated {
            entity: &model.name,
        });

        Ok(Self {
            scope: scope.clone(),
            id,
            entity: model,
            parent,
            predicates: Vec::new(),
            selections: Vec::new(),
            ignored: BTreeSet::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            pagination: Pagination::default(),
            flags: RenderFlags::default(),
            shape: ResultShape::default(),
            joins: Vec::new(),
            join: JoinSpec::default(),
            qualify: None,
        })
    }

    /// Child criteria in the same scope whose parent is this one.
    pub fn sub_query(&self, entity: &str) -> Result<Self, CriteriaError> {
        Self::register(&self.scope, entity, Some(self.id))
    }

    /// `sub_query` followed by a configuration closure.
    pub fn nested_query(
        &self,
        entity: &str,
        f: impl FnOnce(&mut Self),
    ) -> Result<Self, CriteriaError> {
        let mut sub = self.sub_query(entity)?;
        f(&mut sub);

        Ok(sub)
    }

    /// Fresh, empty criteria over the same entity and parent, with its
    /// own id and alias.
    pub fn sibling(&self) -> Result<Self, CriteriaError> {
        Self::register(&self.scope, &self.entity.name, self.parent)
    }

    /// Deep copy registered under fresh ids: same entity and parent, with
    /// predicates, projections, grouping, ordering, pagination and joins
    /// copied. Subqueries and join participants are derived as well, and
    /// every reference to a copied criteria (owners, column equalities)
    /// is rebound to its copy. An explicit alias is not carried over.
    pub fn derive(&self) -> Result<Self, CriteriaError> {
        let mut remap = BTreeMap::new();

        self.derive_under(self.parent, &mut remap)
    }

    fn derive_under(
        &self,
        parent: Option<CriteriaId>,
        remap: &mut BTreeMap<CriteriaId, CriteriaId>,
    ) -> Result<Self, CriteriaError> {
        let mut copy = Self::register(&self.scope, &self.entity.name, parent)?;
        remap.insert(self.id, copy.id);

        copy.selections.clone_from(&self.selections);
        copy.ignored.clone_from(&self.ignored);
        copy.groups.clone_from(&self.groups);
        copy.orders.clone_from(&self.orders);
        copy.pagination = self.pagination;
        copy.flags = self.flags;
        copy.shape.clone_from(&self.shape);
        copy.join = self.join;
        copy.qualify = self.qualify;

        for child in &self.joins {
            let joined = child.derive_under(remapped(remap, child.parent), remap)?;
            copy.joins.push(joined);
        }
        for expr in &self.predicates {
            let derived = derive_expr(expr, remap)?;
            copy.predicates.push(derived);
        }

        Ok(copy)
    }

    /// Fix an explicit alias. Fails once any alias has been assigned.
    pub fn with_alias(&mut self, alias: impl Into<String>) -> Result<&mut Self, CriteriaError> {
        self.scope.assign_alias(self.id, alias.into())?;

        Ok(self)
    }

    /// Stable alias, assigning the next default alias on first use.
    pub fn alias(&self) -> Result<String, ScopeError> {
        self.scope.alias_of(self.id)
    }

    /// Compile into SQL fragments and an ordered parameter map.
    pub fn compile(&self) -> Result<CompiledCriteria, CompileError> {
        convert::compile(self)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn scope(&self) -> &CompilationScope {
        &self.scope
    }

    #[must_use]
    pub const fn id(&self) -> CriteriaId {
        self.id
    }

    #[must_use]
    pub fn entity(&self) -> &EntityModel {
        &self.entity
    }

    #[must_use]
    pub const fn parent(&self) -> Option<CriteriaId> {
        self.parent
    }

    #[must_use]
    pub fn predicates(&self) -> &[Expression] {
        &self.predicates
    }

    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Properties excluded from the default projection.
    #[must_use]
    pub const fn ignored(&self) -> &BTreeSet<String> {
        &self.ignored
    }

    #[must_use]
    pub fn groups(&self) -> &[Grouping] {
        &self.groups
    }

    #[must_use]
    pub fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    #[must_use]
    pub const fn flags(&self) -> &RenderFlags {
        &self.flags
    }

    #[must_use]
    pub const fn shape(&self) -> &ResultShape {
        &self.shape
    }

    #[must_use]
    pub fn joins(&self) -> &[Self] {
        &self.joins
    }

    #[must_use]
    pub const fn join_spec(&self) -> JoinSpec {
        self.join
    }

    /// Per-criteria qualification override, if set.
    #[must_use]
    pub const fn qualify_override(&self) -> Option<bool> {
        self.qualify
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// Append a predicate (SQL `WHERE`). Skipped conditions are dropped,
    /// logged and counted.
    pub fn filter(&mut self, condition: impl Condition) -> &mut Self {
        match condition.resolve_in(self) {
            Ok(mut expr) => {
                expr.bind_owner(self.id);
                self.predicates.push(expr);
            }
            Err(reason) => self.skip(&reason),
        }

        self
    }

    fn skip(&self, reason: &SkipReason) {
        tracing::debug!(
            entity = %self.entity.name,
            criteria = %self.id,
            reason = %reason,
            "condition skipped"
        );
        sink::record(MetricsEvent::ExpressionSkipped {
            reason: reason.label(),
            structural: reason.is_structural(),
        });
    }

    /// Empty criteria sharing this one's identity, for collecting the
    /// children of a nested group.
    fn scratch(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            id: self.id,
            entity: self.entity.clone(),
            parent: self.parent,
            predicates: Vec::new(),
            selections: Vec::new(),
            ignored: BTreeSet::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            pagination: Pagination::default(),
            flags: RenderFlags::default(),
            shape: ResultShape::default(),
            joins: Vec::new(),
            join: JoinSpec::default(),
            qualify: None,
        }
    }

    /// Resolve a property on this criteria's entity.
    fn resolve_property(&self, property: &str) -> Result<Target, SkipReason> {
        if property.trim().is_empty() {
            return Err(SkipReason::BlankTarget);
        }

        self.scope
            .metadata()
            .resolve_column(&self.entity.name, property)
            .map(Target::Resolved)
            .ok_or_else(|| SkipReason::UnresolvedProperty {
                entity: self.entity.name.clone(),
                property: property.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Joins
    // ------------------------------------------------------------------

    /// Register a join participant. Its predicates become the ON clause.
    pub fn join(&mut self, child: Self) -> &mut Self {
        self.joins.push(child);
        self
    }

    /// How this criteria joins when it is a participant.
    pub const fn join_kind(&mut self, kind: JoinKind) -> &mut Self {
        self.join.kind = kind;
        self
    }

    /// Fetch this participant's columns into the master projection.
    pub const fn fetch(&mut self, fetch: bool) -> &mut Self {
        self.join.fetch = fetch;
        self
    }

    /// Force qualification on or off for this criteria's columns.
    pub const fn qualify(&mut self, qualify: bool) -> &mut Self {
        self.qualify = Some(qualify);
        self
    }
}

fn remapped(
    remap: &BTreeMap<CriteriaId, CriteriaId>,
    id: Option<CriteriaId>,
) -> Option<CriteriaId> {
    id.map(|id| remap.get(&id).copied().unwrap_or(id))
}

fn derive_expr(
    expr: &Expression,
    remap: &mut BTreeMap<CriteriaId, CriteriaId>,
) -> Result<Expression, CriteriaError> {
    let kind = match expr.kind() {
        ExprKind::ColumnEqual { other } => ExprKind::ColumnEqual {
            other: ColumnSide {
                criteria: remap.get(&other.criteria).copied().unwrap_or(other.criteria),
                ..other.clone()
            },
        },
        ExprKind::Exists { negated, subquery } => ExprKind::Exists {
            negated: *negated,
            subquery: Box::new(subquery.derive_under(remapped(remap, subquery.parent), remap)?),
        },
        ExprKind::Subquery { op, subquery } => ExprKind::Subquery {
            op: *op,
            subquery: Box::new(subquery.derive_under(remapped(remap, subquery.parent), remap)?),
        },
        ExprKind::Nested { negated, children } => ExprKind::Nested {
            negated: *negated,
            children: children
                .iter()
                .map(|child| derive_expr(child, remap))
                .collect::<Result<_, _>>()?,
        },
        other => other.clone(),
    };

    Ok(expr.rebuilt(remapped(remap, expr.owner()), kind))
}

///
/// Condition
///
/// Anything `Criteria::filter` accepts: a built expression, a builder
/// result, or an unbuilt builder (which adopts the criteria as owner).
///

pub trait Condition {
    fn resolve_in(self, criteria: &Criteria) -> Result<Expression, SkipReason>;
}

impl Condition for Expression {
    fn resolve_in(self, _: &Criteria) -> Result<Expression, SkipReason> {
        Ok(self)
    }
}

impl Condition for Result<Expression, SkipReason> {
    fn resolve_in(self, _: &Criteria) -> Result<Expression, SkipReason> {
        self
    }
}

macro_rules! impl_condition_for_builders {
    ($($builder:ty),* $(,)?) => {
        $(
            impl Condition for $builder {
                fn resolve_in(self, criteria: &Criteria) -> Result<Expression, SkipReason> {
                    self.adopt(criteria).build()
                }
            }
        )*
    };
}

impl_condition_for_builders!(
    BetweenBuilder,
    ColumnEqualBuilder,
    ComparisonBuilder,
    ExistsBuilder,
    FuzzyBuilder,
    NestedBuilder,
    NullableBuilder,
    RangeBuilder,
    SubqueryBuilder,
    TemplateBuilder,
);

///
/// CriteriaError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CriteriaError {
    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error(transparent)]
    Scope(#[from] ScopeError),
}
