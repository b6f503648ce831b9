//! Metadata boundary: entity and column mappings consumed by the
//! criteria layer.
//!
//! Reflection and discovery live outside this crate. Callers either
//! implement `MetadataSource` themselves or populate a `MetadataRegistry`.

pub mod column;
pub mod entity;

#[cfg(test)]
mod tests;

use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error as ThisError;

// re-exports
pub use column::{Column, ColumnFlags};
pub use entity::EntityModel;

///
/// MetadataSource
///
/// Upstream collaborator that maps entity names to table metadata.
/// Lookups must be deterministic and side-effect free.
///

pub trait MetadataSource: Send + Sync {
    /// Resolve an entity model by name.
    fn entity(&self, name: &str) -> Option<Arc<EntityModel>>;

    /// Resolve a logical property to its mapped column.
    fn resolve_column(&self, entity: &str, property: &str) -> Option<Column> {
        self.entity(entity)
            .and_then(|model| model.property(property).cloned())
    }

    /// Resolve the primary key column of an entity.
    fn resolve_id_column(&self, entity: &str) -> Option<Column> {
        self.entity(entity)
            .and_then(|model| model.id_column().cloned())
    }
}

///
/// MetadataRegistry
/// In-memory `MetadataSource` keyed by entity name.
///

#[derive(Clone, Debug, Default)]
pub struct MetadataRegistry {
    entities: BTreeMap<String, Arc<EntityModel>>,
}

impl MetadataRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entity model after validating it.
    pub fn register(&mut self, model: EntityModel) -> Result<(), ModelError> {
        model.validate()?;
        if self.entities.contains_key(&model.name) {
            return Err(ModelError::DuplicateEntity { entity: model.name });
        }
        self.entities.insert(model.name.clone(), Arc::new(model));

        Ok(())
    }

    /// Builder-style registration.
    pub fn with(mut self, model: EntityModel) -> Result<Self, ModelError> {
        self.register(model)?;

        Ok(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl MetadataSource for MetadataRegistry {
    fn entity(&self, name: &str) -> Option<Arc<EntityModel>> {
        self.entities.get(name).cloned()
    }
}

///
/// ModelError
/// Structural problems detected while registering entity metadata.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("entity name must not be blank")]
    BlankEntityName,

    #[error("entity '{entity}' has a blank table name")]
    BlankTable { entity: String },

    #[error("entity '{entity}' has a column with a blank name or property")]
    BlankColumn { entity: String },

    #[error("entity '{entity}' maps property '{property}' more than once")]
    DuplicateProperty { entity: String, property: String },

    #[error("entity '{entity}' declares more than one primary key column")]
    MultiplePrimaryKeys { entity: String },

    #[error("entity '{entity}' is already registered")]
    DuplicateEntity { entity: String },
}
