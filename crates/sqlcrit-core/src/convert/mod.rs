//! Module: convert
//! Responsibility: compile a finished criteria tree into SQL fragments
//! plus an ordered parameter map.
//! Does not own: criteria construction, statement execution.
//!
//! Compilation freezes the scope, assigns every reachable alias, then
//! renders in a fixed order (FROM with join conditions, WHERE, GROUP BY,
//! ORDER BY) so parameter names follow reading order. Subqueries are
//! rendered depth-first into the same parameter map.

mod error;
mod predicate;
mod projection;


use crate::{
    config::{CompileConfig, QualifyMode},
    criteria::{Criteria, ResultShape, Window},
    expr::{ExprKind, Expression, Target},
    obs::sink::{self, MetricsEvent},
    scope::{CriteriaId, FreezeGuard, ParameterMap, ScopeError},
    value::Value,
};
use std::collections::{BTreeMap, BTreeSet};

// re-exports
pub use error::CompileError;

///
/// CompiledCriteria
///
/// Keyword-less SQL fragments of one compiled statement. `statement()`
/// and `count_statement()` assemble them with keywords.
///

#[derive(Clone, Debug)]
pub struct CompiledCriteria {
    select_sql: String,
    from_sql: String,
    where_sql: String,
    group_sql: String,
    order_sql: String,
    window: Option<Window>,
    parameters: ParameterMap,
    distinct: bool,
    keep_order_by: bool,
    shape: ResultShape,
}

impl CompiledCriteria {
    /// Projection list, `DISTINCT ` prefix included when set.
    #[must_use]
    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    /// Table, alias and join clauses.
    #[must_use]
    pub fn from_sql(&self) -> &str {
        &self.from_sql
    }

    #[must_use]
    pub fn where_sql(&self) -> &str {
        &self.where_sql
    }

    #[must_use]
    pub fn group_sql(&self) -> &str {
        &self.group_sql
    }

    #[must_use]
    pub fn order_sql(&self) -> &str {
        &self.order_sql
    }

    #[must_use]
    pub const fn window(&self) -> Option<Window> {
        self.window
    }

    #[must_use]
    pub const fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    #[must_use]
    pub fn into_parameters(self) -> ParameterMap {
        self.parameters
    }

    #[must_use]
    pub const fn shape(&self) -> &ResultShape {
        &self.shape
    }

    /// Full `SELECT` statement.
    #[must_use]
    pub fn statement(&self) -> String {
        let mut sql = assemble(
            &self.select_sql,
            &self.from_sql,
            &self.where_sql,
            &self.group_sql,
            &self.order_sql,
        );
        push_window(&mut sql, self.window);

        sql
    }

    /// Row-count statement over the same filter. Grouped or distinct
    /// queries are wrapped; ORDER BY is dropped unless `keep_order_by`.
    #[must_use]
    pub fn count_statement(&self) -> String {
        if self.group_sql.is_empty() && !self.distinct {
            return assemble("COUNT(*)", &self.from_sql, &self.where_sql, "", "");
        }

        let order = if self.keep_order_by {
            self.order_sql.as_str()
        } else {
            ""
        };
        let inner = assemble(
            &self.select_sql,
            &self.from_sql,
            &self.where_sql,
            &self.group_sql,
            order,
        );

        format!("SELECT COUNT(*) FROM ({inner}) total")
    }
}

fn assemble(select: &str, from: &str, where_sql: &str, group: &str, order: &str) -> String {
    let mut sql = format!("SELECT {select} FROM {from}");
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_sql);
    }
    if !group.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(group);
    }
    if !order.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }

    sql
}

fn push_window(sql: &mut String, window: Option<Window>) {
    if let Some(window) = window {
        sql.push_str(&format!(" LIMIT {} OFFSET {}", window.limit, window.offset));
    }
}

/// Compile a criteria tree. Fails with `ScopeBusy` if another compile
/// currently holds the scope.
pub fn compile(criteria: &Criteria) -> Result<CompiledCriteria, CompileError> {
    let entity = criteria.entity().name.as_str();

    match compile_frozen(criteria) {
        Ok((compiled, stats)) => {
            tracing::trace!(
                entity,
                criteria = %criteria.id(),
                parameters = compiled.parameters.len(),
                "criteria compiled"
            );
            sink::record(MetricsEvent::CompileFinished {
                entity,
                predicates: stats.predicates,
                parameters: compiled.parameters.len() as u64,
                subqueries: stats.subqueries,
            });

            Ok(compiled)
        }
        Err(err) => {
            tracing::debug!(entity, criteria = %criteria.id(), error = %err, "compile failed");
            sink::record(MetricsEvent::CompileFailed {
                entity,
                error: err.label(),
            });

            Err(err)
        }
    }
}

fn compile_frozen(criteria: &Criteria) -> Result<(CompiledCriteria, Stats), CompileError> {
    let guard = criteria.scope().freeze().map_err(|err| match err {
        ScopeError::Busy => CompileError::ScopeBusy,
        other => other.into(),
    })?;

    let mut converter = Converter::prepare(&guard, criteria)?;
    let parts = converter.query(criteria, false)?;

    let compiled = CompiledCriteria {
        select_sql: parts.select,
        from_sql: parts.from,
        where_sql: parts.where_sql,
        group_sql: parts.group,
        order_sql: parts.order,
        window: parts.window,
        parameters: converter.parameters,
        distinct: criteria.flags().distinct,
        keep_order_by: criteria.flags().keep_order_by,
        shape: criteria.shape().clone(),
    };

    Ok((compiled, converter.stats))
}

///
/// Stats
///

#[derive(Clone, Copy, Debug, Default)]
struct Stats {
    predicates: u64,
    subqueries: u64,
}

///
/// QueryParts
/// Rendered fragments of one (sub)query.
///

struct QueryParts {
    select: String,
    from: String,
    where_sql: String,
    group: String,
    order: String,
    window: Option<Window>,
}

impl QueryParts {
    fn statement(&self) -> String {
        let mut sql = assemble(
            &self.select,
            &self.from,
            &self.where_sql,
            &self.group,
            &self.order,
        );
        push_window(&mut sql, self.window);

        sql
    }
}

///
/// Converter
/// Render state for one compile; lives only while the scope is frozen.
///

struct Converter<'a> {
    guard: &'a FreezeGuard,
    config: &'a CompileConfig,
    aliases: BTreeMap<CriteriaId, String>,
    positions: BTreeMap<String, CriteriaId>,
    visited: BTreeSet<CriteriaId>,
    overrides: BTreeMap<CriteriaId, bool>,
    qualify_default: bool,
    parameters: ParameterMap,
    stats: Stats,
}

impl<'a> Converter<'a> {
    /// Assign every reachable alias and settle qualification before any
    /// SQL is written.
    fn prepare(guard: &'a FreezeGuard, root: &Criteria) -> Result<Self, CompileError> {
        let mut converter = Self {
            guard,
            config: guard.scope().config(),
            aliases: BTreeMap::new(),
            positions: BTreeMap::new(),
            visited: BTreeSet::new(),
            overrides: BTreeMap::new(),
            qualify_default: false,
            parameters: ParameterMap::new(),
            stats: Stats::default(),
        };

        let mut correlated = false;
        converter.visit(root, &mut correlated)?;

        converter.qualify_default = match converter.config.qualify {
            QualifyMode::Always => true,
            QualifyMode::Never => false,
            QualifyMode::Auto => correlated,
        };

        Ok(converter)
    }

    fn visit(&mut self, criteria: &Criteria, correlated: &mut bool) -> Result<(), CompileError> {
        let id = criteria.id();
        if !criteria.scope().shares_with(self.guard.scope()) {
            return Err(CompileError::ForeignScope { id });
        }

        // one FROM target per criteria
        if !self.visited.insert(id) {
            return Err(CompileError::DuplicateCriteria { id });
        }
        let alias = self.ensure_alias(id)?;
        if self.positions.insert(alias.clone(), id).is_some() {
            return Err(CompileError::AliasCollision { alias });
        }
        if let Some(qualify) = criteria.qualify_override() {
            self.overrides.insert(id, qualify);
        }
        if !criteria.joins().is_empty() {
            *correlated = true;
        }

        for expr in criteria.predicates() {
            self.visit_expr(expr, correlated)?;
        }
        for child in criteria.joins() {
            self.visit(child, correlated)?;
        }

        Ok(())
    }

    fn visit_expr(&mut self, expr: &Expression, correlated: &mut bool) -> Result<(), CompileError> {
        if let Some(owner) = expr.owner() {
            self.ensure_alias(owner)?;
        }

        match expr.kind() {
            ExprKind::ColumnEqual { other } => {
                *correlated = true;
                self.ensure_alias(other.criteria)?;
            }
            ExprKind::Exists { subquery, .. } | ExprKind::Subquery { subquery, .. } => {
                self.visit(subquery, correlated)?;
            }
            ExprKind::Nested { children, .. } => {
                for child in children {
                    self.visit_expr(child, correlated)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn ensure_alias(&mut self, id: CriteriaId) -> Result<String, CompileError> {
        if let Some(alias) = self.aliases.get(&id) {
            return Ok(alias.clone());
        }
        let alias = self.guard.alias_of(id)?;
        self.aliases.insert(id, alias.clone());

        Ok(alias)
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    fn alias(&self, id: CriteriaId) -> Result<&str, CompileError> {
        self.aliases
            .get(&id)
            .map(String::as_str)
            .ok_or(CompileError::Scope(ScopeError::UnknownCriteria { id }))
    }

    fn qualifies(&self, id: CriteriaId) -> bool {
        self.overrides
            .get(&id)
            .copied()
            .unwrap_or(self.qualify_default)
    }

    /// Column text under the current qualification policy. An explicit
    /// alias always prefixes.
    fn column(
        &self,
        owner: CriteriaId,
        alias: Option<&str>,
        target: &Target,
    ) -> Result<String, CompileError> {
        let name = target.sql_name();
        if let Some(alias) = alias {
            return Ok(format!("{alias}.{name}"));
        }

        match target {
            Target::Resolved(_) if self.qualifies(owner) => {
                Ok(format!("{}.{name}", self.alias(owner)?))
            }
            _ => Ok(name.to_string()),
        }
    }

    /// Column text for correlations: always qualified, except raw text
    /// without an explicit alias.
    fn correlated_column(
        &self,
        owner: CriteriaId,
        alias: Option<&str>,
        target: &Target,
    ) -> Result<String, CompileError> {
        let name = target.sql_name();
        match (alias, target) {
            (Some(alias), _) => Ok(format!("{alias}.{name}")),
            (None, Target::Raw(raw)) => Ok(raw.clone()),
            (None, Target::Resolved(_)) => Ok(format!("{}.{name}", self.alias(owner)?)),
        }
    }

    /// Bind one value under a fresh parameter name; returns its placeholder.
    fn bind(&mut self, value: Value) -> String {
        let name = self.guard.scope().next_parameter_name();
        let placeholder = self.config.placeholder(&name, self.parameters.len() + 1);
        self.parameters.record(name, value);

        placeholder
    }

    /// Bind each element; returns `:p1,:p2,...`.
    fn bind_list(&mut self, values: Vec<Value>, column: &str) -> Result<String, CompileError> {
        if values.is_empty() {
            return Err(CompileError::EmptyInList {
                column: column.to_string(),
            });
        }

        Ok(values
            .into_iter()
            .map(|value| self.bind(value))
            .collect::<Vec<_>>()
            .join(","))
    }

    /// Render one (sub)query in parameter order.
    fn query(&mut self, criteria: &Criteria, exists: bool) -> Result<QueryParts, CompileError> {
        let from = self.from_clause(criteria)?;
        let where_sql = self.predicates(criteria, criteria.predicates())?;
        let group = self.group_clause(criteria)?;
        let order = self.order_clause(criteria)?;
        let select = if exists && criteria.selections().is_empty() {
            "1".to_string()
        } else {
            self.select_clause(criteria)?
        };

        Ok(QueryParts {
            select,
            from,
            where_sql,
            group,
            order,
            window: criteria.pagination().window(),
        })
    }
}
