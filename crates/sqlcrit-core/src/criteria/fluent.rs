//! Fluent shorthands over the expression builders.
//!
//! Each condition method resolves a logical property against this
//! criteria and appends the result through `filter`, so skipped inputs
//! behave exactly as they do for hand-built expressions.

use crate::{
    criteria::{
        Aggregate, Criteria, Direction, Grouping, OrderBy, PageRange, RowRange, Selection,
    },
    expr::{
        BetweenOp, CompareOp, Expression, FuzzyOp, NullOp, RangeOp, Slot, SubqueryOp, Wildcard,
    },
    value::IntoValue,
};

impl Criteria {
    // ------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------

    fn compare(
        &mut self,
        slot: Slot,
        op: CompareOp,
        property: &str,
        value: impl IntoValue,
    ) -> &mut Self {
        self.filter(
            Expression::compare(op)
                .slot(slot)
                .col(property)
                .value(value),
        )
    }

    pub fn col_eq(&mut self, slot: Slot, property: &str, value: impl IntoValue) -> &mut Self {
        self.compare(slot, CompareOp::Eq, property, value)
    }

    pub fn col_ne(&mut self, slot: Slot, property: &str, value: impl IntoValue) -> &mut Self {
        self.compare(slot, CompareOp::Ne, property, value)
    }

    pub fn col_gt(&mut self, slot: Slot, property: &str, value: impl IntoValue) -> &mut Self {
        self.compare(slot, CompareOp::Gt, property, value)
    }

    pub fn col_ge(&mut self, slot: Slot, property: &str, value: impl IntoValue) -> &mut Self {
        self.compare(slot, CompareOp::Ge, property, value)
    }

    pub fn col_lt(&mut self, slot: Slot, property: &str, value: impl IntoValue) -> &mut Self {
        self.compare(slot, CompareOp::Lt, property, value)
    }

    pub fn col_le(&mut self, slot: Slot, property: &str, value: impl IntoValue) -> &mut Self {
        self.compare(slot, CompareOp::Le, property, value)
    }

    /// Primary key equality.
    pub fn id_eq(&mut self, slot: Slot, value: impl IntoValue) -> &mut Self {
        self.filter(Expression::compare(CompareOp::Eq).slot(slot).id().value(value))
    }

    // ------------------------------------------------------------------
    // Range
    // ------------------------------------------------------------------

    pub fn col_in(&mut self, slot: Slot, property: &str, values: impl IntoValue) -> &mut Self {
        self.filter(
            Expression::range(RangeOp::In)
                .slot(slot)
                .col(property)
                .values(values),
        )
    }

    pub fn col_not_in(&mut self, slot: Slot, property: &str, values: impl IntoValue) -> &mut Self {
        self.filter(
            Expression::range(RangeOp::NotIn)
                .slot(slot)
                .col(property)
                .values(values),
        )
    }

    /// Primary key membership.
    pub fn id_in(&mut self, slot: Slot, values: impl IntoValue) -> &mut Self {
        self.filter(Expression::range(RangeOp::In).slot(slot).id().values(values))
    }

    pub fn col_between(
        &mut self,
        slot: Slot,
        property: &str,
        begin: impl IntoValue,
        end: impl IntoValue,
    ) -> &mut Self {
        self.filter(
            Expression::between(BetweenOp::Between)
                .slot(slot)
                .col(property)
                .bounds(begin, end),
        )
    }

    pub fn col_not_between(
        &mut self,
        slot: Slot,
        property: &str,
        begin: impl IntoValue,
        end: impl IntoValue,
    ) -> &mut Self {
        self.filter(
            Expression::between(BetweenOp::NotBetween)
                .slot(slot)
                .col(property)
                .bounds(begin, end),
        )
    }

    // ------------------------------------------------------------------
    // Fuzzy / null
    // ------------------------------------------------------------------

    pub fn col_like(
        &mut self,
        slot: Slot,
        property: &str,
        text: impl IntoValue,
        wildcard: Wildcard,
    ) -> &mut Self {
        self.filter(
            Expression::fuzzy(FuzzyOp::Like)
                .slot(slot)
                .col(property)
                .text(text)
                .wildcard(wildcard),
        )
    }

    pub fn col_not_like(
        &mut self,
        slot: Slot,
        property: &str,
        text: impl IntoValue,
        wildcard: Wildcard,
    ) -> &mut Self {
        self.filter(
            Expression::fuzzy(FuzzyOp::NotLike)
                .slot(slot)
                .col(property)
                .text(text)
                .wildcard(wildcard),
        )
    }

    pub fn col_null(&mut self, slot: Slot, property: &str) -> &mut Self {
        self.filter(Expression::nullable(NullOp::IsNull).slot(slot).col(property))
    }

    pub fn col_not_null(&mut self, slot: Slot, property: &str) -> &mut Self {
        self.filter(
            Expression::nullable(NullOp::IsNotNull)
                .slot(slot)
                .col(property),
        )
    }

    // ------------------------------------------------------------------
    // Template / correlation / subqueries
    // ------------------------------------------------------------------

    /// Raw SQL fragment with positional `{0}`, `{1}`, ... arguments.
    pub fn template<I, V>(&mut self, slot: Slot, text: &str, args: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        let builder = args
            .into_iter()
            .fold(Expression::template(text).slot(slot), |b, arg| b.arg(arg));

        self.filter(builder)
    }

    /// `this.property = other.other_property`.
    pub fn col_equal(
        &mut self,
        slot: Slot,
        property: &str,
        other: &Self,
        other_property: &str,
    ) -> &mut Self {
        self.filter(
            Expression::column_equal()
                .slot(slot)
                .col(property)
                .other(other, other_property),
        )
    }

    pub fn exists(&mut self, slot: Slot, subquery: Self) -> &mut Self {
        self.filter(Expression::exists(false).slot(slot).query(subquery))
    }

    pub fn not_exists(&mut self, slot: Slot, subquery: Self) -> &mut Self {
        self.filter(Expression::exists(true).slot(slot).query(subquery))
    }

    /// `property OP (SELECT ...)`.
    pub fn col_sub(
        &mut self,
        slot: Slot,
        property: &str,
        op: SubqueryOp,
        subquery: Self,
    ) -> &mut Self {
        self.filter(
            Expression::subquery(op)
                .slot(slot)
                .col(property)
                .query(subquery),
        )
    }

    /// Parenthesized group. Conditions added inside `f` become the
    /// group's children; anything else the closure sets is discarded.
    pub fn nested(&mut self, slot: Slot, negated: bool, f: impl FnOnce(&mut Self)) -> &mut Self {
        let mut scratch = self.scratch();
        f(&mut scratch);

        self.filter(
            Expression::nested(negated)
                .slot(slot)
                .children(scratch.predicates),
        )
    }

    // ------------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------------

    pub fn select(&mut self, selection: Selection) -> &mut Self {
        self.selections.push(selection);
        self
    }

    /// Project a mapped property, optionally aliased.
    pub fn col_select(&mut self, property: &str, alias: Option<&str>) -> &mut Self {
        match self.resolve_property(property) {
            Ok(target) => self.select(Selection::Column {
                target,
                alias: alias.map(str::to_string),
            }),
            Err(reason) => {
                self.skip(&reason);
                self
            }
        }
    }

    /// Project raw SQL text.
    pub fn native_select(&mut self, sql: &str, alias: Option<&str>) -> &mut Self {
        self.select(Selection::Native {
            sql: sql.to_string(),
            alias: alias.map(str::to_string),
        })
    }

    /// Aggregate projection over a property, or over `*` when `property`
    /// is `None`.
    pub fn func_select(
        &mut self,
        func: Aggregate,
        property: Option<&str>,
        alias: Option<&str>,
    ) -> &mut Self {
        self.push_func(func, property, alias, false)
    }

    /// `FUNC(DISTINCT column)`.
    pub fn func_select_distinct(
        &mut self,
        func: Aggregate,
        property: &str,
        alias: Option<&str>,
    ) -> &mut Self {
        self.push_func(func, Some(property), alias, true)
    }

    fn push_func(
        &mut self,
        func: Aggregate,
        property: Option<&str>,
        alias: Option<&str>,
        distinct: bool,
    ) -> &mut Self {
        let target = match property.map(|p| self.resolve_property(p)).transpose() {
            Ok(target) => target,
            Err(reason) => {
                self.skip(&reason);
                return self;
            }
        };

        self.flags.contains_func = true;
        self.select(Selection::Function {
            func,
            target,
            distinct,
            alias: alias.map(str::to_string),
        })
    }

    /// Exclude a property from the implicit default projection.
    pub fn col_ignore(&mut self, property: &str) -> &mut Self {
        self.ignored.insert(property.to_string());
        self
    }

    // ------------------------------------------------------------------
    // Grouping / ordering
    // ------------------------------------------------------------------

    pub fn group_by(&mut self, property: &str) -> &mut Self {
        match self.resolve_property(property) {
            Ok(target) => self.groups.push(Grouping::Column(target)),
            Err(reason) => self.skip(&reason),
        }
        self
    }

    pub fn native_group_by(&mut self, sql: &str) -> &mut Self {
        self.groups.push(Grouping::Native(sql.to_string()));
        self
    }

    pub fn asc(&mut self, property: &str) -> &mut Self {
        self.order(property, Direction::Asc)
    }

    pub fn desc(&mut self, property: &str) -> &mut Self {
        self.order(property, Direction::Desc)
    }

    fn order(&mut self, property: &str, direction: Direction) -> &mut Self {
        match self.resolve_property(property) {
            Ok(target) => self.orders.push(OrderBy::Column { target, direction }),
            Err(reason) => self.skip(&reason),
        }
        self
    }

    /// Raw ORDER BY item, direction included (`"created_at DESC"`).
    pub fn native_order(&mut self, sql: &str) -> &mut Self {
        self.orders.push(OrderBy::Native(sql.to_string()));
        self
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    /// Rows `[start, end)`, 0-based. Wins over a page range.
    pub const fn range(&mut self, start: u64, end: u64) -> &mut Self {
        self.pagination.rows = Some(RowRange { start, end });
        self
    }

    /// Pages `start..=end`, 1-based, `size` rows each.
    pub const fn page_range(&mut self, start: u64, end: u64, size: u64) -> &mut Self {
        self.pagination.pages = Some(PageRange { start, end, size });
        self
    }

    // ------------------------------------------------------------------
    // Flags / result shape
    // ------------------------------------------------------------------

    pub const fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.flags.distinct = distinct;
        self
    }

    pub const fn contains_func(&mut self, contains_func: bool) -> &mut Self {
        self.flags.contains_func = contains_func;
        self
    }

    pub const fn only_func(&mut self, only_func: bool) -> &mut Self {
        self.flags.only_func = only_func;
        self
    }

    pub const fn use_prop_alias(&mut self, use_prop_alias: bool) -> &mut Self {
        self.flags.use_prop_alias = use_prop_alias;
        self
    }

    pub const fn keep_order_by(&mut self, keep_order_by: bool) -> &mut Self {
        self.flags.keep_order_by = keep_order_by;
        self
    }

    pub fn result_map(&mut self, result_map: &str) -> &mut Self {
        self.shape.result_map = Some(result_map.to_string());
        self
    }

    pub fn result_type(&mut self, result_type: &str) -> &mut Self {
        self.shape.result_type = Some(result_type.to_string());
        self
    }

    pub fn map_key(&mut self, map_key: &str) -> &mut Self {
        self.shape.map_key = Some(map_key.to_string());
        self
    }

    pub fn map_type(&mut self, map_type: &str) -> &mut Self {
        self.shape.map_type = Some(map_type.to_string());
        self
    }
}
