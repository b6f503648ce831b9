use crate::value::{IntoValue, Value, ValueTag};
use time::{Date, Month};

#[test]
fn option_none_converts_to_null() {
    let absent: Option<&str> = None;

    assert_eq!(absent.into_value(), Value::Null);
    assert_eq!(Some("x").into_value(), Value::Text("x".to_string()));
}

#[test]
fn integers_widen_by_signedness() {
    assert_eq!(7i8.into_value(), Value::Int(7));
    assert_eq!((-3i32).into_value(), Value::Int(-3));
    assert_eq!(7u16.into_value(), Value::Uint(7));
}

#[test]
fn vec_converts_to_list_preserving_order() {
    let value = vec![3, 1, 2].into_value();

    assert_eq!(
        value,
        Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)])
    );
    assert_eq!(value.tag(), ValueTag::List);
}

#[test]
fn into_elements_flattens_one_level() {
    let list = Value::List(vec![Value::Int(1), Value::List(vec![Value::Int(2)])]);

    assert_eq!(
        list.into_elements(),
        vec![Value::Int(1), Value::List(vec![Value::Int(2)])]
    );
    assert_eq!(Value::Bool(true).into_elements(), vec![Value::Bool(true)]);
}

#[test]
fn display_renders_human_readable_forms() {
    let date = Date::from_calendar_date(2024, Month::January, 2).expect("valid date");

    assert_eq!(Value::Null.to_string(), "NULL");
    assert_eq!(Value::Date(date).to_string(), "2024-01-02");
    assert_eq!(Value::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
    assert_eq!(
        Value::List(vec![Value::Int(1), Value::Text("a".into())]).to_string(),
        "[1, a]"
    );
}

#[test]
fn serde_roundtrip_keeps_variant() {
    let value = Value::List(vec![Value::Text("PAID".into()), Value::Uint(9)]);
    let json = serde_json::to_string(&value).expect("serialize");
    let back: Value = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(back, value);
}
