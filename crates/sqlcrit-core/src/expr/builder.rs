//! Per-variant expression builders.
//!
//! Builders collect raw caller input and validate it in `build()`.
//! Anything that cannot form a predicate comes back as a `SkipReason`
//! instead of an error so optional-condition chains stay fluent.

use crate::{
    criteria::Criteria,
    expr::{
        BetweenOp, ColumnSide, CompareOp, ExprKind, Expression, FuzzyOp, MatchMode, NullOp,
        RangeOp, SkipReason, Slot, SubqueryOp, Target, TemplateArgs, Wildcard,
    },
    model::Column,
    obs::sink::{self, MetricsEvent},
    scope::{CompilationScope, CriteriaId},
    value::{IntoValue, Value},
};

///
/// Resolution
/// Column resolution outcome; the only source of `matched` + `target`.
///

#[derive(Clone, Debug)]
pub(crate) enum Resolution {
    Immediate(String),
    Standard(Column),
    Exists,
}

impl Resolution {
    pub(crate) fn into_parts(self) -> (MatchMode, Option<Target>) {
        match self {
            Self::Immediate(raw) => (MatchMode::Immediate, Some(Target::Raw(raw))),
            Self::Standard(column) => (MatchMode::Standard, Some(Target::Resolved(column))),
            Self::Exists => (MatchMode::Exists, None),
        }
    }
}

impl From<Target> for Resolution {
    fn from(target: Target) -> Self {
        match target {
            Target::Raw(raw) => Self::Immediate(raw),
            Target::Resolved(column) => Self::Standard(column),
        }
    }
}

///
/// Owner
/// Criteria handle plus the scope needed to resolve against it.
///

#[derive(Clone, Debug)]
pub(crate) struct Owner {
    scope: CompilationScope,
    id: CriteriaId,
}

impl Owner {
    pub(crate) fn of(criteria: &Criteria) -> Self {
        Self {
            scope: criteria.scope().clone(),
            id: criteria.id(),
        }
    }

    pub(crate) const fn id(&self) -> CriteriaId {
        self.id
    }

    fn entity_name(&self) -> Result<String, SkipReason> {
        self.scope
            .entity_of(self.id)
            .map(|entity| entity.name.clone())
            .map_err(|_| SkipReason::UnknownOwner { id: self.id })
    }
}

///
/// ColumnSpec
///

#[derive(Clone, Debug, Default)]
pub(crate) enum ColumnSpec {
    #[default]
    Unset,
    Property(String),
    Raw(String),
    Id,
}

impl ColumnSpec {
    const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

fn resolve_target(spec: &ColumnSpec, owner: Option<&Owner>) -> Result<Target, SkipReason> {
    match spec {
        ColumnSpec::Unset => Err(SkipReason::MissingTarget),
        ColumnSpec::Raw(raw) if raw.trim().is_empty() => Err(SkipReason::BlankTarget),
        ColumnSpec::Raw(raw) => Ok(Target::Raw(raw.clone())),
        ColumnSpec::Property(property) if property.trim().is_empty() => {
            Err(SkipReason::BlankTarget)
        }
        ColumnSpec::Property(property) => {
            let owner = owner.ok_or_else(|| SkipReason::MissingOwner {
                property: property.clone(),
            })?;
            let entity = owner.entity_name()?;

            owner
                .scope
                .metadata()
                .resolve_column(&entity, property)
                .map(Target::Resolved)
                .ok_or_else(|| SkipReason::UnresolvedProperty {
                    entity,
                    property: property.clone(),
                })
        }
        ColumnSpec::Id => {
            let owner = owner.ok_or_else(|| SkipReason::MissingOwner {
                property: "id".to_string(),
            })?;
            let entity = owner.entity_name()?;

            owner
                .scope
                .metadata()
                .resolve_id_column(&entity)
                .map(Target::Resolved)
                .ok_or(SkipReason::UnresolvedId { entity })
        }
    }
}

///
/// Head
/// Fields shared by every builder.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Head {
    column: ColumnSpec,
    alias: Option<String>,
    slot: Slot,
    owner: Option<Owner>,
}

impl Head {
    fn resolve(&self) -> Result<Resolution, SkipReason> {
        resolve_target(&self.column, self.owner.as_ref()).map(Resolution::from)
    }

    fn finish(self, resolution: Resolution, kind: ExprKind) -> Expression {
        Expression::from_parts(
            self.owner.as_ref().map(Owner::id),
            self.alias,
            self.slot,
            resolution,
            kind,
        )
    }
}

// Slot and owner setters, shared by every builder.
macro_rules! slot_setters {
    () => {
        /// Conjunction joining this predicate to the previous one.
        #[must_use]
        pub fn slot(mut self, slot: Slot) -> Self {
            self.head.slot = slot;
            self
        }

        #[must_use]
        pub fn and(self) -> Self {
            self.slot(Slot::And)
        }

        #[must_use]
        pub fn or(self) -> Self {
            self.slot(Slot::Or)
        }

        /// Resolve properties against `criteria` and bind it as owner.
        #[must_use]
        pub fn owner(mut self, criteria: &Criteria) -> Self {
            self.head.owner = Some(Owner::of(criteria));
            self
        }

        /// Bind `criteria` as owner unless one was already chosen.
        #[must_use]
        pub(crate) fn adopt(mut self, criteria: &Criteria) -> Self {
            if self.head.owner.is_none() {
                self.head.owner = Some(Owner::of(criteria));
            }
            self
        }
    };
}

// Column target setters for builders that test a column.
macro_rules! column_setters {
    () => {
        /// Target a logical property, resolved through entity metadata.
        #[must_use]
        pub fn col(mut self, property: impl Into<String>) -> Self {
            self.head.column = ColumnSpec::Property(property.into());
            self
        }

        /// Target raw SQL column text, used verbatim.
        #[must_use]
        pub fn raw(mut self, column: impl Into<String>) -> Self {
            self.head.column = ColumnSpec::Raw(column.into());
            self
        }

        /// Target the owner's primary key column.
        #[must_use]
        pub fn id(mut self) -> Self {
            self.head.column = ColumnSpec::Id;
            self
        }

        /// Qualify the column with this alias instead of the owner's.
        #[must_use]
        pub fn alias(mut self, alias: impl Into<String>) -> Self {
            self.head.alias = Some(alias.into());
            self
        }
    };
}

///
/// ComparisonBuilder
///

#[derive(Clone, Debug)]
pub struct ComparisonBuilder {
    head: Head,
    op: CompareOp,
    value: Option<Value>,
}

impl ComparisonBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new(op: CompareOp) -> Self {
        Self {
            head: Head::default(),
            op,
            value: None,
        }
    }

    #[must_use]
    pub fn value(mut self, value: impl IntoValue) -> Self {
        self.value = Some(value.into_value());
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let resolution = self.head.resolve()?;
        let value = match self.value {
            None | Some(Value::Null) => return Err(SkipReason::NullValue),
            Some(Value::List(_)) => return Err(SkipReason::ListForScalar),
            Some(value) => value,
        };

        Ok(self.head.finish(
            resolution,
            ExprKind::Compare { op: self.op, value },
        ))
    }
}

///
/// RangeBuilder
/// IN / NOT IN. A scalar value is treated as a one-element list.
///

#[derive(Clone, Debug)]
pub struct RangeBuilder {
    head: Head,
    op: RangeOp,
    values: Option<Value>,
}

impl RangeBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new(op: RangeOp) -> Self {
        Self {
            head: Head::default(),
            op,
            values: None,
        }
    }

    #[must_use]
    pub fn values(mut self, values: impl IntoValue) -> Self {
        self.values = Some(values.into_value());
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let resolution = self.head.resolve()?;
        let values = match self.values {
            None | Some(Value::Null) => return Err(SkipReason::EmptyCollection),
            Some(values) => values.into_elements(),
        };
        if values.is_empty() {
            return Err(SkipReason::EmptyCollection);
        }

        Ok(self.head.finish(
            resolution,
            ExprKind::Range {
                op: self.op,
                values,
            },
        ))
    }
}

///
/// BetweenBuilder
///

#[derive(Clone, Debug)]
pub struct BetweenBuilder {
    head: Head,
    op: BetweenOp,
    begin: Option<Value>,
    end: Option<Value>,
}

impl BetweenBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new(op: BetweenOp) -> Self {
        Self {
            head: Head::default(),
            op,
            begin: None,
            end: None,
        }
    }

    #[must_use]
    pub fn bounds(self, begin: impl IntoValue, end: impl IntoValue) -> Self {
        self.begin(begin).end(end)
    }

    #[must_use]
    pub fn begin(mut self, begin: impl IntoValue) -> Self {
        self.begin = Some(begin.into_value());
        self
    }

    #[must_use]
    pub fn end(mut self, end: impl IntoValue) -> Self {
        self.end = Some(end.into_value());
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let resolution = self.head.resolve()?;
        let bound = |value: Option<Value>| match value {
            None | Some(Value::Null) => Err(SkipReason::MissingBound),
            Some(Value::List(_)) => Err(SkipReason::ListForScalar),
            Some(value) => Ok(value),
        };
        let begin = bound(self.begin)?;
        let end = bound(self.end)?;

        Ok(self.head.finish(
            resolution,
            ExprKind::Between {
                op: self.op,
                begin,
                end,
            },
        ))
    }
}

///
/// FuzzyBuilder
/// LIKE / NOT LIKE. The wildcard is applied at compile time.
///

#[derive(Clone, Debug)]
pub struct FuzzyBuilder {
    head: Head,
    op: FuzzyOp,
    text: Option<Value>,
    wildcard: Wildcard,
    escape: Option<char>,
}

impl FuzzyBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new(op: FuzzyOp) -> Self {
        Self {
            head: Head::default(),
            op,
            text: None,
            wildcard: Wildcard::default(),
            escape: None,
        }
    }

    #[must_use]
    pub fn text(mut self, text: impl IntoValue) -> Self {
        self.text = Some(text.into_value());
        self
    }

    #[must_use]
    pub const fn wildcard(mut self, wildcard: Wildcard) -> Self {
        self.wildcard = wildcard;
        self
    }

    #[must_use]
    pub const fn escape(mut self, escape: char) -> Self {
        self.escape = Some(escape);
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let resolution = self.head.resolve()?;
        let text = match self.text {
            None | Some(Value::Null) => return Err(SkipReason::NullValue),
            Some(Value::List(_)) => return Err(SkipReason::ListForScalar),
            Some(Value::Text(text)) => text,
            Some(other) => other.to_string(),
        };
        if text.is_empty() {
            return Err(SkipReason::EmptyText);
        }

        Ok(self.head.finish(
            resolution,
            ExprKind::Fuzzy {
                op: self.op,
                text,
                wildcard: self.wildcard,
                escape: self.escape,
            },
        ))
    }
}

///
/// NullableBuilder
///

#[derive(Clone, Debug)]
pub struct NullableBuilder {
    head: Head,
    op: NullOp,
}

impl NullableBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new(op: NullOp) -> Self {
        Self {
            head: Head::default(),
            op,
        }
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let resolution = self.head.resolve()?;

        Ok(self
            .head
            .finish(resolution, ExprKind::Nullable { op: self.op }))
    }
}

///
/// TemplateBuilder
///
/// Raw SQL fragment with `{0}`, `{name}` and `{@}` placeholders. The
/// column target is optional and only needed when `{@}` is used.
///

#[derive(Clone, Debug)]
pub struct TemplateBuilder {
    head: Head,
    text: String,
    args: TemplateArgs,
}

impl TemplateBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            head: Head::default(),
            text: text.into(),
            args: TemplateArgs::default(),
        }
    }

    /// Append the next positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl IntoValue) -> Self {
        self.args.positional.push(value.into_value());
        self
    }

    /// Set a named argument; a repeated name replaces the earlier value.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.args.named.insert(name.into(), value.into_value());
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        if self.text.trim().is_empty() {
            return Err(SkipReason::MissingTemplate);
        }
        let column = if self.head.column.is_unset() {
            None
        } else {
            Some(resolve_target(&self.head.column, self.head.owner.as_ref())?)
        };

        Ok(self.head.finish(
            Resolution::Immediate(self.text),
            ExprKind::Template {
                args: self.args,
                column,
            },
        ))
    }
}

///
/// ColumnEqualBuilder
/// `left = right` across two criteria; binds no value.
///

#[derive(Clone, Debug)]
pub struct ColumnEqualBuilder {
    head: Head,
    other: Option<OtherSide>,
}

#[derive(Clone, Debug)]
struct OtherSide {
    owner: Owner,
    column: ColumnSpec,
    alias: Option<String>,
}

impl ColumnEqualBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new() -> Self {
        Self {
            head: Head::default(),
            other: None,
        }
    }

    /// Right side: a property of another criteria.
    #[must_use]
    pub fn other(self, criteria: &Criteria, property: impl Into<String>) -> Self {
        self.other_spec(criteria, ColumnSpec::Property(property.into()))
    }

    /// Right side: raw column text attributed to another criteria.
    #[must_use]
    pub fn other_raw(self, criteria: &Criteria, column: impl Into<String>) -> Self {
        self.other_spec(criteria, ColumnSpec::Raw(column.into()))
    }

    /// Right side: the primary key of another criteria.
    #[must_use]
    pub fn other_id(self, criteria: &Criteria) -> Self {
        self.other_spec(criteria, ColumnSpec::Id)
    }

    /// Qualify the right side with this alias instead of its criteria's.
    #[must_use]
    pub fn other_alias(mut self, alias: impl Into<String>) -> Self {
        if let Some(other) = self.other.as_mut() {
            other.alias = Some(alias.into());
        }
        self
    }

    fn other_spec(mut self, criteria: &Criteria, column: ColumnSpec) -> Self {
        self.other = Some(OtherSide {
            owner: Owner::of(criteria),
            column,
            alias: None,
        });
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let resolution = self.head.resolve()?;
        let other = self.other.ok_or(SkipReason::MissingOther)?;
        let target = resolve_target(&other.column, Some(&other.owner))?;

        Ok(self.head.finish(
            resolution,
            ExprKind::ColumnEqual {
                other: ColumnSide {
                    criteria: other.owner.id(),
                    alias: other.alias,
                    target,
                },
            },
        ))
    }
}

impl Default for ColumnEqualBuilder {
    fn default() -> Self {
        Self::new()
    }
}

///
/// ExistsBuilder
///

#[derive(Clone, Debug)]
pub struct ExistsBuilder {
    head: Head,
    negated: bool,
    subquery: Option<Criteria>,
}

impl ExistsBuilder {
    slot_setters!();

    #[must_use]
    pub fn new(negated: bool) -> Self {
        Self {
            head: Head::default(),
            negated,
            subquery: None,
        }
    }

    #[must_use]
    pub fn query(mut self, subquery: Criteria) -> Self {
        self.subquery = Some(subquery);
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let subquery = self.subquery.ok_or(SkipReason::MissingSubquery)?;

        Ok(self.head.finish(
            Resolution::Exists,
            ExprKind::Exists {
                negated: self.negated,
                subquery: Box::new(subquery),
            },
        ))
    }
}

///
/// SubqueryBuilder
/// `column OP (SELECT ...)`.
///

#[derive(Clone, Debug)]
pub struct SubqueryBuilder {
    head: Head,
    op: SubqueryOp,
    subquery: Option<Criteria>,
}

impl SubqueryBuilder {
    slot_setters!();
    column_setters!();

    #[must_use]
    pub fn new(op: SubqueryOp) -> Self {
        Self {
            head: Head::default(),
            op,
            subquery: None,
        }
    }

    #[must_use]
    pub fn query(mut self, subquery: Criteria) -> Self {
        self.subquery = Some(subquery);
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        let resolution = self.head.resolve()?;
        let subquery = self.subquery.ok_or(SkipReason::MissingSubquery)?;

        Ok(self.head.finish(
            resolution,
            ExprKind::Subquery {
                op: self.op,
                subquery: Box::new(subquery),
            },
        ))
    }
}

///
/// NestedBuilder
/// Parenthesized group of child predicates.
///

#[derive(Clone, Debug)]
pub struct NestedBuilder {
    head: Head,
    negated: bool,
    children: Vec<Expression>,
}

impl NestedBuilder {
    slot_setters!();

    #[must_use]
    pub fn new(negated: bool) -> Self {
        Self {
            head: Head::default(),
            negated,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn child(mut self, child: Expression) -> Self {
        self.children.push(child);
        self
    }

    /// Append a built child, dropping skipped ones.
    #[must_use]
    pub fn push(self, child: Result<Expression, SkipReason>) -> Self {
        match child {
            Ok(child) => self.child(child),
            Err(reason) => {
                tracing::debug!(reason = %reason, "nested child skipped");
                sink::record(MetricsEvent::ExpressionSkipped {
                    reason: reason.label(),
                    structural: reason.is_structural(),
                });
                self
            }
        }
    }

    /// Append already-built children in order.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Expression>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn build(self) -> Result<Expression, SkipReason> {
        if self.children.is_empty() {
            return Err(SkipReason::EmptyNested);
        }

        Ok(self.head.finish(
            Resolution::Exists,
            ExprKind::Nested {
                negated: self.negated,
                children: self.children,
            },
        ))
    }
}
