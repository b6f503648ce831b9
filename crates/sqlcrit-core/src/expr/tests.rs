use crate::{
    criteria::Criteria,
    expr::{
        CompareOp, ExprKind, Expression, FuzzyOp, MatchMode, NullOp, RangeOp, SkipReason, Slot,
        Target, Wildcard,
    },
    scope::CompilationScope,
    test_support,
    value::Value,
};
use proptest::prelude::*;

fn order(scope: &CompilationScope) -> Criteria {
    Criteria::new(scope, "Order").expect("order criteria")
}

#[test]
fn property_target_resolves_to_standard_column() {
    let scope = test_support::scope();
    let criteria = order(&scope);

    let expr = Expression::compare(CompareOp::Eq)
        .col("userId")
        .value(7)
        .owner(&criteria)
        .build()
        .expect("resolved");

    assert_eq!(expr.matched(), MatchMode::Standard);
    assert!(matches!(
        expr.target(),
        Some(Target::Resolved(column)) if column.name == "user_id"
    ));
    assert_eq!(expr.owner(), Some(criteria.id()));
}

#[test]
fn raw_target_is_immediate_and_needs_no_owner() {
    let expr = Expression::nullable(NullOp::IsNull)
        .raw("o.deleted_at")
        .build()
        .expect("raw target");

    assert_eq!(expr.matched(), MatchMode::Immediate);
    assert_eq!(expr.target(), Some(&Target::Raw("o.deleted_at".to_string())));
    assert_eq!(expr.owner(), None);
}

#[test]
fn blank_and_missing_targets_are_skipped() {
    let blank = Expression::compare(CompareOp::Eq).raw("  ").value(1).build();
    let missing = Expression::compare(CompareOp::Eq).value(1).build();

    assert_eq!(blank.expect_err("blank"), SkipReason::BlankTarget);
    assert_eq!(missing.expect_err("missing"), SkipReason::MissingTarget);
}

#[test]
fn property_without_owner_is_skipped() {
    let err = Expression::compare(CompareOp::Eq)
        .col("status")
        .value("PAID")
        .build()
        .expect_err("no owner");

    assert_eq!(
        err,
        SkipReason::MissingOwner {
            property: "status".to_string()
        }
    );
}

#[test]
fn unknown_property_is_skipped() {
    let scope = test_support::scope();
    let criteria = order(&scope);

    let err = Expression::compare(CompareOp::Eq)
        .col("nope")
        .value(1)
        .owner(&criteria)
        .build()
        .expect_err("unresolved");

    assert_eq!(
        err,
        SkipReason::UnresolvedProperty {
            entity: "Order".to_string(),
            property: "nope".to_string(),
        }
    );
    assert!(!err.is_structural());
}

#[test]
fn null_and_list_values_are_skipped_for_comparisons() {
    let absent: Option<i64> = None;
    let null = Expression::compare(CompareOp::Gt)
        .raw("amount")
        .value(absent)
        .build();
    let list = Expression::compare(CompareOp::Eq)
        .raw("amount")
        .value(vec![1, 2])
        .build();

    assert_eq!(null.expect_err("null"), SkipReason::NullValue);
    assert_eq!(list.expect_err("list"), SkipReason::ListForScalar);
}

#[test]
fn in_list_empty_fails_and_singleton_or_multi_succeed() {
    let empty: Vec<i64> = Vec::new();
    let err = Expression::range(RangeOp::In)
        .raw("id")
        .values(empty)
        .build()
        .expect_err("empty");
    assert_eq!(err, SkipReason::EmptyCollection);
    assert!(err.is_structural());

    let single = Expression::range(RangeOp::In)
        .raw("id")
        .values(5)
        .build()
        .expect("singleton");
    assert!(matches!(single.kind(), ExprKind::Range { values, .. } if values.len() == 1));

    let multi = Expression::range(RangeOp::NotIn)
        .raw("id")
        .values([1, 2, 3])
        .build()
        .expect("multi");
    assert!(matches!(multi.kind(), ExprKind::Range { values, .. } if values.len() == 3));
    assert_eq!(multi.operator(), "NOT IN");
}

#[test]
fn between_requires_both_bounds() {
    let err = Expression::between(crate::expr::BetweenOp::Between)
        .raw("amount")
        .begin(1)
        .build()
        .expect_err("missing end");

    assert_eq!(err, SkipReason::MissingBound);
}

#[test]
fn fuzzy_rejects_empty_text_and_keeps_escape() {
    let empty = Expression::fuzzy(FuzzyOp::Like).raw("name").text("").build();
    assert_eq!(empty.expect_err("empty"), SkipReason::EmptyText);

    let expr = Expression::fuzzy(FuzzyOp::NotLike)
        .raw("name")
        .text("50%")
        .wildcard(Wildcard::Prefix)
        .escape('\\')
        .build()
        .expect("fuzzy");

    assert!(matches!(
        expr.kind(),
        ExprKind::Fuzzy { text, wildcard: Wildcard::Prefix, escape: Some('\\'), .. } if text == "50%"
    ));
}

#[test]
fn template_without_text_is_skipped() {
    let err = Expression::template("   ").arg(1).build().expect_err("blank");

    assert_eq!(err, SkipReason::MissingTemplate);
}

#[test]
fn template_keeps_text_as_raw_target() {
    let expr = Expression::template("DATE(created_at) = {0}")
        .arg("2024-01-01")
        .build()
        .expect("template");

    assert_eq!(expr.matched(), MatchMode::Immediate);
    assert_eq!(
        expr.target().map(Target::sql_name),
        Some("DATE(created_at) = {0}")
    );
}

#[test]
fn nested_without_children_is_skipped() {
    let err = Expression::nested(false).build().expect_err("empty");

    assert_eq!(err, SkipReason::EmptyNested);
}

#[test]
fn nested_push_drops_skipped_children() {
    let expr = Expression::nested(true)
        .push(Expression::compare(CompareOp::Eq).raw("a").value(1).build())
        .push(Expression::compare(CompareOp::Eq).raw("").value(2).build())
        .build()
        .expect("nested");

    assert_eq!(expr.matched(), MatchMode::Exists);
    assert!(expr.target().is_none());
    assert!(matches!(expr.kind(), ExprKind::Nested { children, negated: true } if children.len() == 1));
}

#[test]
fn exists_without_subquery_is_skipped() {
    let err = Expression::exists(false).build().expect_err("no subquery");

    assert_eq!(err, SkipReason::MissingSubquery);
}

#[test]
fn owner_binding_is_first_writer_wins_and_recursive() {
    let scope = test_support::scope();
    let first = order(&scope);
    let second = order(&scope);

    let mut expr = Expression::nested(false)
        .child(
            Expression::compare(CompareOp::Eq)
                .raw("a")
                .value(1)
                .build()
                .expect("child"),
        )
        .slot(Slot::Or)
        .build()
        .expect("nested");

    assert!(expr.bind_owner(first.id()));
    assert!(!expr.bind_owner(second.id()));
    assert_eq!(expr.owner(), Some(first.id()));

    let ExprKind::Nested { children, .. } = expr.kind() else {
        panic!("nested kind");
    };
    assert_eq!(children[0].owner(), Some(first.id()));
}

#[test]
fn column_equal_resolves_both_sides() {
    let scope = test_support::scope();
    let order = order(&scope);
    let item = order.sub_query("Item").expect("item");

    let expr = Expression::column_equal()
        .col("orderId")
        .owner(&item)
        .other(&order, "id")
        .build()
        .expect("column equal");

    let ExprKind::ColumnEqual { other } = expr.kind() else {
        panic!("column equal kind");
    };
    assert_eq!(other.criteria, order.id());
    assert_eq!(other.target.sql_name(), "id");
    assert!(expr.has_column_equal());
}

#[test]
fn column_equal_without_other_side_is_skipped() {
    let err = Expression::column_equal()
        .raw("a")
        .build()
        .expect_err("no other");

    assert_eq!(err, SkipReason::MissingOther);
}

///
/// PROPERTIES
///

#[derive(Clone, Debug)]
enum TargetInput {
    Unset,
    Raw(String),
    Property(String),
    Id,
}

fn arb_target() -> impl Strategy<Value = TargetInput> {
    prop_oneof![
        Just(TargetInput::Unset),
        "[ a-z_.]{0,8}".prop_map(TargetInput::Raw),
        prop_oneof![
            Just("status".to_string()),
            Just("userId".to_string()),
            Just("missing".to_string()),
            Just(String::new()),
        ]
        .prop_map(TargetInput::Property),
        Just(TargetInput::Id),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,6}".prop_map(Value::Text),
        prop::collection::vec(any::<i64>().prop_map(Value::Int), 0..3).prop_map(Value::List),
    ]
}

fn build_with(
    variant: u8,
    target: &TargetInput,
    value: Value,
    owner: Option<&Criteria>,
) -> Result<Expression, SkipReason> {
    macro_rules! apply {
        ($builder:expr) => {{
            let builder = match target {
                TargetInput::Unset => $builder,
                TargetInput::Raw(raw) => $builder.raw(raw.clone()),
                TargetInput::Property(p) => $builder.col(p.clone()),
                TargetInput::Id => $builder.id(),
            };
            match owner {
                Some(owner) => builder.owner(owner).build(),
                None => builder.build(),
            }
        }};
    }

    match variant % 4 {
        0 => apply!(Expression::compare(CompareOp::Eq).value(value.clone())),
        1 => apply!(Expression::range(RangeOp::In).values(value.clone())),
        2 => apply!(Expression::fuzzy(FuzzyOp::Like).text(value.clone())),
        _ => apply!(Expression::nullable(NullOp::IsNotNull)),
    }
}

proptest! {
    #[test]
    fn matched_mode_always_agrees_with_target(
        variant in any::<u8>(),
        target in arb_target(),
        value in arb_value(),
        with_owner in any::<bool>(),
    ) {
        let scope = test_support::scope();
        let criteria = order(&scope);
        let owner = with_owner.then_some(&criteria);

        if let Ok(expr) = build_with(variant, &target, value, owner) {
            match expr.matched() {
                MatchMode::Immediate => prop_assert!(matches!(expr.target(), Some(Target::Raw(_)))),
                MatchMode::Standard => prop_assert!(matches!(expr.target(), Some(Target::Resolved(_)))),
                MatchMode::Exists => prop_assert!(expr.target().is_none()),
            }
            match target {
                TargetInput::Raw(_) => prop_assert_eq!(expr.matched(), MatchMode::Immediate),
                TargetInput::Property(_) | TargetInput::Id => {
                    prop_assert_eq!(expr.matched(), MatchMode::Standard);
                }
                TargetInput::Unset => prop_assert!(false, "unset target must not build"),
            }
        }
    }
}
