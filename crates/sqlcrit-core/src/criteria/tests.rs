use crate::{
    criteria::{Aggregate, Criteria, CriteriaError, Direction, Grouping, OrderBy, Selection},
    expr::{CompareOp, ExprKind, Expression, Slot, Target, Wildcard},
    obs::metrics,
    scope::{CompilationScope, ScopeError},
    test_support,
};

fn order(scope: &CompilationScope) -> Criteria {
    Criteria::new(scope, "Order").expect("order criteria")
}

#[test]
fn unknown_entity_is_rejected() {
    let scope = test_support::scope();

    let err = Criteria::new(&scope, "Ghost").expect_err("unknown entity");

    assert_eq!(
        err,
        CriteriaError::UnknownEntity {
            entity: "Ghost".to_string()
        }
    );
    assert_eq!(scope.criteria_count(), 0);
}

#[test]
fn fluent_conditions_append_in_call_order() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    criteria
        .col_eq(Slot::And, "status", "PAID")
        .col_gt(Slot::Or, "amount", 10)
        .col_null(Slot::And, "deleted")
        .col_like(Slot::And, "status", "PA", Wildcard::Prefix);

    let slots: Vec<_> = criteria.predicates().iter().map(Expression::slot).collect();
    assert_eq!(slots, vec![Slot::And, Slot::Or, Slot::And, Slot::And]);
    assert!(
        criteria
            .predicates()
            .iter()
            .all(|expr| expr.owner() == Some(criteria.id()))
    );
}

#[test]
fn skipped_conditions_are_dropped_and_counted() {
    metrics::reset_all();
    let scope = test_support::scope();
    let mut criteria = order(&scope);
    let empty: Vec<i64> = Vec::new();
    let absent: Option<String> = None;

    criteria
        .col_eq(Slot::And, "nope", 1)
        .col_in(Slot::And, "id", empty)
        .col_eq(Slot::And, "status", absent)
        .col_eq(Slot::And, "status", "OPEN");

    assert_eq!(criteria.predicates().len(), 1);
    metrics::with_state(|state| {
        assert_eq!(state.ops.expressions_skipped, 3);
        assert_eq!(state.ops.structural_skips, 1);
        assert_eq!(state.skips.get("empty_collection"), Some(&1));
    });
}

#[test]
fn filter_accepts_builders_and_built_expressions() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    let built = Expression::compare(CompareOp::Ne)
        .raw("status")
        .value("VOID")
        .build();

    criteria
        .filter(Expression::compare(CompareOp::Eq).col("userId").value(3))
        .filter(built);

    assert_eq!(criteria.predicates().len(), 2);
    assert_eq!(criteria.predicates()[1].owner(), Some(criteria.id()));
}

#[test]
fn explicit_owner_survives_filter() {
    let scope = test_support::scope();
    let master = order(&scope);
    let mut joined = master.sub_query("Item").expect("item");

    joined.filter(
        Expression::compare(CompareOp::Eq)
            .owner(&master)
            .col("status")
            .value("PAID"),
    );

    assert_eq!(joined.predicates()[0].owner(), Some(master.id()));
}

#[test]
fn with_alias_only_succeeds_once() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    criteria.with_alias("o").expect("first alias");
    let err = criteria.with_alias("x").expect_err("second alias");

    assert!(matches!(
        err,
        CriteriaError::Scope(ScopeError::AliasAssigned { ref alias, .. }) if alias == "o"
    ));
    assert_eq!(criteria.alias().expect("alias"), "o");
}

#[test]
fn default_alias_is_stable_once_assigned() {
    let scope = test_support::scope();
    let criteria = order(&scope);

    let first = criteria.alias().expect("alias");
    let second = criteria.alias().expect("alias");

    assert_eq!(first, "t1");
    assert_eq!(first, second);
}

#[test]
fn clone_keeps_identity_and_shares_scope() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);
    criteria.col_eq(Slot::And, "status", "PAID");

    let mut copy = criteria.clone();
    copy.col_eq(Slot::And, "amount", 5);

    assert_eq!(copy.id(), criteria.id());
    assert!(copy.scope().shares_with(criteria.scope()));
    assert_eq!(criteria.predicates().len(), 1);
    assert_eq!(copy.predicates().len(), 2);
}

#[test]
fn derive_copies_structure_under_a_fresh_id() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);
    criteria.with_alias("o").expect("alias");
    criteria
        .col_eq(Slot::And, "status", "PAID")
        .desc("status")
        .page_range(1, 2, 10);

    let copy = criteria.derive().expect("derive");

    assert_ne!(copy.id(), criteria.id());
    assert_eq!(copy.parent(), criteria.parent());
    assert_eq!(copy.orders(), criteria.orders());
    assert_eq!(copy.pagination(), criteria.pagination());
    assert_eq!(copy.predicates().len(), 1);
    assert_eq!(copy.predicates()[0].owner(), Some(copy.id()));
    assert_eq!(criteria.predicates()[0].owner(), Some(criteria.id()));
    assert_eq!(scope.assigned_alias(copy.id()).expect("slot"), None);
}

#[test]
fn derive_rebinds_nested_and_correlated_references() {
    let scope = test_support::scope();
    let mut root = order(&scope);
    let mut items = root.sub_query("Item").expect("item");
    items.col_equal(Slot::And, "orderId", &root, "id");
    root.exists(Slot::And, items);

    let copy = root.derive().expect("derive");

    let ExprKind::Exists { subquery, .. } = copy.predicates()[0].kind() else {
        panic!("expected EXISTS");
    };
    assert_eq!(subquery.parent(), Some(copy.id()));
    let ExprKind::ColumnEqual { other } = subquery.predicates()[0].kind() else {
        panic!("expected column equality");
    };
    assert_eq!(other.criteria, copy.id());
    assert_eq!(subquery.predicates()[0].owner(), Some(subquery.id()));
    assert_eq!(scope.criteria_count(), 4);
}

#[test]
fn sibling_gets_a_new_id_with_the_same_parent() {
    let scope = test_support::scope();
    let root = order(&scope);
    let sub = root.sub_query("Item").expect("item");

    let sibling = sub.sibling().expect("sibling");

    assert_ne!(sibling.id(), sub.id());
    assert_eq!(sibling.parent(), Some(root.id()));
    assert_eq!(sibling.entity().name, "Item");
    assert!(sibling.predicates().is_empty());
}

#[test]
fn nested_query_runs_the_closure_on_a_child() {
    let scope = test_support::scope();
    let root = order(&scope);

    let sub = root
        .nested_query("Item", |item| {
            item.col_eq(Slot::And, "a", 1);
        })
        .expect("nested query");

    assert_eq!(sub.parent(), Some(root.id()));
    assert_eq!(scope.parent_of(sub.id()).expect("parent"), Some(root.id()));
    assert_eq!(sub.predicates().len(), 1);
}

#[test]
fn nested_group_collects_children_owned_by_the_parent() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    criteria.col_eq(Slot::And, "status", "PAID").nested(Slot::Or, true, |group| {
        group.col_gt(Slot::And, "amount", 10).col_lt(Slot::And, "amount", 20);
    });

    let ExprKind::Nested { negated, children } = criteria.predicates()[1].kind() else {
        panic!("expected nested group");
    };
    assert!(*negated);
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|c| c.owner() == Some(criteria.id())));
    assert_eq!(criteria.predicates()[1].slot(), Slot::Or);
}

#[test]
fn empty_nested_group_is_skipped() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    criteria.nested(Slot::And, false, |group| {
        group.col_eq(Slot::And, "missing", 1);
    });

    assert!(criteria.predicates().is_empty());
}

#[test]
fn projections_resolve_properties() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    criteria
        .col_select("userId", Some("uid"))
        .col_select("nope", None)
        .native_select("NOW()", Some("now"))
        .func_select(Aggregate::Sum, Some("amount"), Some("total"));

    assert_eq!(criteria.selections().len(), 3);
    assert!(matches!(
        &criteria.selections()[0],
        Selection::Column { target: Target::Resolved(col), alias: Some(a) }
            if col.name == "user_id" && a == "uid"
    ));
    assert!(criteria.flags().contains_func);
}

#[test]
fn grouping_and_ordering_keep_call_order() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    criteria
        .group_by("status")
        .native_group_by("DATE(created_at)")
        .desc("amount")
        .asc("id")
        .native_order("user_id DESC");

    assert!(matches!(&criteria.groups()[0], Grouping::Column(t) if t.sql_name() == "status"));
    assert!(matches!(&criteria.groups()[1], Grouping::Native(sql) if sql == "DATE(created_at)"));
    assert!(matches!(
        &criteria.orders()[0],
        OrderBy::Column { direction: Direction::Desc, .. }
    ));
    assert_eq!(criteria.orders().len(), 3);
}

#[test]
fn result_shape_is_carried_untouched() {
    let scope = test_support::scope();
    let mut criteria = order(&scope);

    criteria
        .result_map("orderMap")
        .result_type("app.Order")
        .map_key("id")
        .map_type("java.util.HashMap");

    let shape = criteria.shape();
    assert_eq!(shape.result_map.as_deref(), Some("orderMap"));
    assert_eq!(shape.result_type.as_deref(), Some("app.Order"));
    assert_eq!(shape.map_key.as_deref(), Some("id"));
    assert_eq!(shape.map_type.as_deref(), Some("java.util.HashMap"));
}

#[test]
fn creation_is_counted_per_entity() {
    metrics::reset_all();
    let scope = test_support::scope();
    let root = order(&scope);
    let _item = root.sub_query("Item").expect("item");
    let _other = root.sibling().expect("sibling");

    metrics::with_state(|state| {
        assert_eq!(state.ops.criteria_created, 3);
        assert_eq!(state.entities.get("Order").map(|e| e.criteria_created), Some(2));
    });
}
