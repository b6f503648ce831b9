use crate::model::{ModelError, column::Column};
use std::collections::BTreeSet;

///
/// EntityModel
/// Runtime table mapping for one entity.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityModel {
    /// Stable entity name used by callers and the registry.
    pub name: String,
    /// Physical table name.
    pub table: String,
    /// Ordered column list (authoritative for default projections).
    pub columns: Vec<Column>,
}

impl EntityModel {
    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column mapping.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Look up a column by logical property name.
    #[must_use]
    pub fn property(&self, property: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// The primary key column, if one is mapped.
    #[must_use]
    pub fn id_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary())
    }

    /// Check structural invariants before the model is registered.
    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::BlankEntityName);
        }
        if self.table.trim().is_empty() {
            return Err(ModelError::BlankTable {
                entity: self.name.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() || column.property.trim().is_empty() {
                return Err(ModelError::BlankColumn {
                    entity: self.name.clone(),
                });
            }
            if !seen.insert(column.property.as_str()) {
                return Err(ModelError::DuplicateProperty {
                    entity: self.name.clone(),
                    property: column.property.clone(),
                });
            }
        }

        let primaries = self.columns.iter().filter(|c| c.is_primary()).count();
        if primaries > 1 {
            return Err(ModelError::MultiplePrimaryKeys {
                entity: self.name.clone(),
            });
        }

        Ok(())
    }
}
