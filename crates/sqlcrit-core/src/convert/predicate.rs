use crate::{
    convert::{CompileError, Converter},
    criteria::Criteria,
    expr::{ExprKind, Expression, Target, TemplateArgs, template},
    scope::CriteriaId,
    value::Value,
};

impl Converter<'_> {
    /// Render an ordered predicate list. The first entry has no
    /// connector; every later one is prefixed by its own slot.
    pub(super) fn predicates(
        &mut self,
        criteria: &Criteria,
        list: &[Expression],
    ) -> Result<String, CompileError> {
        let mut sql = String::new();
        for (i, expr) in list.iter().enumerate() {
            let fragment = self.expression(criteria, expr)?;
            if i > 0 {
                sql.push(' ');
                sql.push_str(&expr.slot().to_string());
                sql.push(' ');
            }
            sql.push_str(&fragment);
            self.stats.predicates += 1;
        }

        Ok(sql)
    }

    fn expression(&mut self, criteria: &Criteria, expr: &Expression) -> Result<String, CompileError> {
        let owner = expr.owner().unwrap_or_else(|| criteria.id());

        match expr.kind() {
            ExprKind::Compare { op, value } => {
                let column = self.subject(owner, expr)?;
                let placeholder = self.bind(value.clone());

                Ok(format!("{column} {op} {placeholder}"))
            }

            ExprKind::Range { op, values } => {
                let column = self.subject(owner, expr)?;
                let placeholders = self.bind_list(values.clone(), &column)?;

                Ok(format!("{column} {op} ({placeholders})"))
            }

            ExprKind::Between { op, begin, end } => {
                let column = self.subject(owner, expr)?;
                let low = self.bind(begin.clone());
                let high = self.bind(end.clone());

                Ok(format!("{column} {op} {low} AND {high}"))
            }

            ExprKind::Fuzzy {
                op,
                text,
                wildcard,
                escape,
            } => {
                let column = self.subject(owner, expr)?;
                let placeholder = self.bind(Value::Text(wildcard.apply(text)));
                let mut sql = format!("{column} {op} {placeholder}");
                if let Some(escape) = escape {
                    let escape = if *escape == '\'' {
                        "''".to_string()
                    } else {
                        escape.to_string()
                    };
                    sql.push_str(&format!(" ESCAPE '{escape}'"));
                }

                Ok(sql)
            }

            ExprKind::Nullable { op } => {
                let column = self.subject(owner, expr)?;

                Ok(format!("{column} {op}"))
            }

            ExprKind::Template { args, column } => {
                self.template(owner, expr, args, column.as_ref())
            }

            ExprKind::ColumnEqual { other } => {
                let target = target_of(expr)?;
                let left = self.correlated_column(owner, expr.alias(), target)?;
                let right =
                    self.correlated_column(other.criteria, other.alias.as_deref(), &other.target)?;

                Ok(format!("{left} = {right}"))
            }

            ExprKind::Exists { negated, subquery } => {
                self.stats.subqueries += 1;
                let sql = self.query(subquery, true)?.statement();
                let not = if *negated { "NOT " } else { "" };

                Ok(format!("{not}EXISTS ({sql})"))
            }

            ExprKind::Subquery { op, subquery } => {
                let column = self.subject(owner, expr)?;
                self.stats.subqueries += 1;
                let sql = self.query(subquery, false)?.statement();

                Ok(format!("{column} {op} ({sql})"))
            }

            ExprKind::Nested { negated, children } => {
                let inner = self.predicates(criteria, children)?;
                let not = if *negated { "NOT " } else { "" };

                Ok(format!("{not}({inner})"))
            }
        }
    }

    fn subject(&self, owner: CriteriaId, expr: &Expression) -> Result<String, CompileError> {
        self.column(owner, expr.alias(), target_of(expr)?)
    }

    /// Expand template tokens; every token occurrence binds fresh.
    fn template(
        &mut self,
        owner: CriteriaId,
        expr: &Expression,
        args: &TemplateArgs,
        column: Option<&Target>,
    ) -> Result<String, CompileError> {
        let text = target_of(expr)?.sql_name();
        let segments = template::parse(text).map_err(|err| CompileError::MalformedTemplate {
            template: text.to_string(),
            message: err.to_string(),
        })?;

        let mut sql = String::with_capacity(text.len());
        for segment in segments {
            match segment {
                template::Segment::Text(literal) => sql.push_str(&literal),
                template::Segment::Positional(index) => {
                    let value = args.positional.get(index).ok_or_else(|| {
                        CompileError::UnresolvedPlaceholder {
                            token: format!("{{{index}}}"),
                        }
                    })?;
                    sql.push_str(&self.bind_argument(value, text)?);
                }
                template::Segment::Named(name) => {
                    let value = args.named.get(name).ok_or_else(|| {
                        CompileError::UnresolvedPlaceholder {
                            token: format!("{{{name}}}"),
                        }
                    })?;
                    sql.push_str(&self.bind_argument(value, text)?);
                }
                template::Segment::Column => {
                    let target = column.ok_or_else(|| CompileError::UnresolvedPlaceholder {
                        token: "{@}".to_string(),
                    })?;
                    sql.push_str(&self.column(owner, expr.alias(), target)?);
                }
            }
        }

        Ok(sql)
    }

    /// Lists expand to a comma-separated placeholder run.
    fn bind_argument(&mut self, value: &Value, template: &str) -> Result<String, CompileError> {
        match value {
            Value::List(items) => self.bind_list(items.clone(), template),
            other => Ok(self.bind(other.clone())),
        }
    }
}

fn target_of(expr: &Expression) -> Result<&Target, CompileError> {
    expr.target().ok_or_else(|| CompileError::MissingTarget {
        operator: expr.operator(),
    })
}
