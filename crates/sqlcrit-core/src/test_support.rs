//! Shared fixtures for core tests.

use crate::{
    config::CompileConfig,
    model::{Column, EntityModel, MetadataRegistry},
    scope::CompilationScope,
};
use std::sync::Arc;

/// `Order` → `t_order`, with a logical-delete flag and a version column.
#[must_use]
pub(crate) fn order_model() -> EntityModel {
    EntityModel::new("Order", "t_order")
        .column(Column::new("id", "id").primary())
        .column(Column::new("status", "status"))
        .column(Column::new("userId", "user_id"))
        .column(Column::new("amount", "amount"))
        .column(Column::new("deleted", "deleted").logical_delete())
        .column(Column::new("version", "version").version())
}

/// `Item` → `t_item`; `a` and `b` are plain test columns.
#[must_use]
pub(crate) fn item_model() -> EntityModel {
    EntityModel::new("Item", "t_item")
        .column(Column::new("id", "id").primary())
        .column(Column::new("a", "a"))
        .column(Column::new("b", "b"))
        .column(Column::new("orderId", "order_id"))
        .column(Column::new("name", "name"))
}

/// `User` → `t_user`.
#[must_use]
pub(crate) fn user_model() -> EntityModel {
    EntityModel::new("User", "t_user")
        .column(Column::new("id", "id").primary())
        .column(Column::new("name", "name"))
        .column(Column::new("email", "email").unique())
}

/// Registry holding every fixture entity.
#[must_use]
pub(crate) fn registry() -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();
    for model in [order_model(), item_model(), user_model()] {
        registry.register(model).expect("fixture models are valid");
    }

    registry
}

/// Fresh scope over the fixture registry with the default config.
#[must_use]
pub(crate) fn scope() -> CompilationScope {
    CompilationScope::new(registry())
}

/// Fresh scope over the fixture registry with an explicit config.
#[must_use]
pub(crate) fn scope_with(config: CompileConfig) -> CompilationScope {
    CompilationScope::with_config(Arc::new(registry()), config)
}
