use crate::model::{Column, EntityModel, MetadataRegistry, MetadataSource, ModelError};

fn order_model() -> EntityModel {
    EntityModel::new("Order", "t_order")
        .column(Column::new("id", "id").primary())
        .column(Column::new("status", "status"))
        .column(Column::new("userId", "user_id"))
        .column(Column::new("version", "version").version())
}

#[test]
fn resolve_column_maps_property_to_physical_name() {
    let registry = MetadataRegistry::new().with(order_model()).expect("register");

    let column = registry
        .resolve_column("Order", "userId")
        .expect("mapped property");

    assert_eq!(column.name, "user_id");
    assert_eq!(column.property, "userId");
}

#[test]
fn resolve_column_misses_for_unknown_property_or_entity() {
    let registry = MetadataRegistry::new().with(order_model()).expect("register");

    assert!(registry.resolve_column("Order", "missing").is_none());
    assert!(registry.resolve_column("Nope", "status").is_none());
}

#[test]
fn resolve_id_column_returns_primary_key() {
    let registry = MetadataRegistry::new().with(order_model()).expect("register");

    let id = registry.resolve_id_column("Order").expect("primary key");

    assert!(id.flags.primary);
    assert!(id.flags.unique);
    assert_eq!(id.name, "id");
}

#[test]
fn duplicate_property_is_rejected() {
    let model = EntityModel::new("Order", "t_order")
        .column(Column::new("status", "status"))
        .column(Column::new("status", "state"));

    let err = MetadataRegistry::new().with(model).expect_err("duplicate");

    assert_eq!(
        err,
        ModelError::DuplicateProperty {
            entity: "Order".to_string(),
            property: "status".to_string(),
        }
    );
}

#[test]
fn duplicate_entity_is_rejected() {
    let mut registry = MetadataRegistry::new();
    registry.register(order_model()).expect("first");

    let err = registry.register(order_model()).expect_err("second");

    assert!(matches!(err, ModelError::DuplicateEntity { .. }));
    assert_eq!(registry.len(), 1);
}

#[test]
fn multiple_primary_keys_are_rejected() {
    let model = EntityModel::new("Pair", "t_pair")
        .column(Column::new("a", "a").primary())
        .column(Column::new("b", "b").primary());

    assert!(matches!(
        model.validate(),
        Err(ModelError::MultiplePrimaryKeys { .. })
    ));
}
