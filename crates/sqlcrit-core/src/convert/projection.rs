use crate::{
    convert::{CompileError, Converter},
    criteria::{Criteria, Grouping, OrderBy, Selection},
    expr::Target,
};

impl Converter<'_> {
    /// `table alias` followed by every join participant, depth first.
    /// Join conditions are rendered here, before WHERE, so their
    /// parameters come first.
    pub(super) fn from_clause(&mut self, criteria: &Criteria) -> Result<String, CompileError> {
        let mut sql = format!(
            "{} {}",
            criteria.entity().table,
            self.alias(criteria.id())?
        );
        self.push_joins(&mut sql, criteria)?;

        Ok(sql)
    }

    fn push_joins(&mut self, sql: &mut String, master: &Criteria) -> Result<(), CompileError> {
        for child in master.joins() {
            if child.predicates().is_empty() {
                return Err(CompileError::JoinWithoutCondition {
                    entity: child.entity().name.clone(),
                });
            }

            let on = self.predicates(child, child.predicates())?;
            let alias = self.alias(child.id())?.to_string();
            sql.push_str(&format!(
                " {} {} {alias} ON {on}",
                child.join_spec().kind,
                child.entity().table,
            ));
            self.push_joins(sql, child)?;
        }

        Ok(())
    }

    /// Projection list. Falls back to `*` when nothing is selected.
    pub(super) fn select_clause(&self, criteria: &Criteria) -> Result<String, CompileError> {
        let mut items = self.select_items(criteria)?;
        for child in criteria.joins() {
            self.fetch_items(child, &mut items)?;
        }

        let list = if items.is_empty() {
            "*".to_string()
        } else {
            items.join(", ")
        };

        if criteria.flags().distinct {
            Ok(format!("DISTINCT {list}"))
        } else {
            Ok(list)
        }
    }

    fn fetch_items(&self, child: &Criteria, items: &mut Vec<String>) -> Result<(), CompileError> {
        if child.join_spec().fetch {
            items.extend(self.select_items(child)?);
        }
        for grandchild in child.joins() {
            self.fetch_items(grandchild, items)?;
        }

        Ok(())
    }

    /// Default mapped columns (minus ignored ones) when there is no plain
    /// selection and `only_func` is off, then explicit selections in order.
    fn select_items(&self, criteria: &Criteria) -> Result<Vec<String>, CompileError> {
        let mut items = Vec::new();
        let owner = criteria.id();
        let prop_alias = criteria.flags().use_prop_alias;

        let has_plain = criteria.selections().iter().any(Selection::is_plain);
        if !has_plain && !criteria.flags().only_func {
            for column in &criteria.entity().columns {
                if criteria.ignored().contains(&column.property) {
                    continue;
                }
                let target = Target::Resolved(column.clone());
                let sql = self.column(owner, None, &target)?;
                items.push(with_alias(sql, None, prop_alias.then_some(&column.property)));
            }
        }

        for selection in criteria.selections() {
            let item = match selection {
                Selection::Column { target, alias } => {
                    let sql = self.column(owner, None, target)?;
                    let property = match target {
                        Target::Resolved(column) if prop_alias => Some(&column.property),
                        _ => None,
                    };
                    with_alias(sql, alias.as_ref(), property)
                }
                Selection::Native { sql, alias } => with_alias(sql.clone(), alias.as_ref(), None),
                Selection::Function {
                    func,
                    target,
                    distinct,
                    alias,
                } => {
                    let arg = match target {
                        Some(target) => self.column(owner, None, target)?,
                        None => "*".to_string(),
                    };
                    let distinct = if *distinct { "DISTINCT " } else { "" };
                    with_alias(format!("{func}({distinct}{arg})"), alias.as_ref(), None)
                }
            };
            items.push(item);
        }

        Ok(items)
    }

    pub(super) fn group_clause(&self, criteria: &Criteria) -> Result<String, CompileError> {
        let items = criteria
            .groups()
            .iter()
            .map(|group| match group {
                Grouping::Column(target) => self.column(criteria.id(), None, target),
                Grouping::Native(sql) => Ok(sql.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items.join(", "))
    }

    pub(super) fn order_clause(&self, criteria: &Criteria) -> Result<String, CompileError> {
        let items = criteria
            .orders()
            .iter()
            .map(|order| match order {
                OrderBy::Column { target, direction } => self
                    .column(criteria.id(), None, target)
                    .map(|column| format!("{column} {direction}")),
                OrderBy::Native(sql) => Ok(sql.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items.join(", "))
    }
}

// explicit alias wins over the property alias
fn with_alias(sql: String, alias: Option<&String>, property: Option<&String>) -> String {
    match alias.or(property) {
        Some(alias) => format!("{sql} AS {alias}"),
        None => sql,
    }
}
