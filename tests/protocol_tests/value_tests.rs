//! Value Coercion Tests
//!
//! Tests verify:
//! - Coercion per registered type
//! - Degrading to NaN instead of failing
//! - Unknown fields default to strings

use tsquery::{TypeRegistry, Value, ValueType};

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with("n", ValueType::Integer)
        .with("ns", ValueType::IntegerList)
        .with("ss", ValueType::StringList)
        .with("b", ValueType::Boolean)
}

#[test]
fn test_integer_coercion() {
    assert_eq!(registry().coerce("n", "42"), Value::Number(42.0));
    assert_eq!(registry().coerce("n", "-3.5"), Value::Number(-3.5));
}

#[test]
fn test_non_numeric_becomes_nan() {
    match registry().coerce("n", "abc") {
        Value::Number(n) => assert!(n.is_nan()),
        other => panic!("Expected number, got {:?}", other),
    }
    match registry().coerce("n", "") {
        Value::Number(n) => assert!(n.is_nan()),
        other => panic!("Expected number, got {:?}", other),
    }
}

#[test]
fn test_integer_coercion_uses_numeric_prefix() {
    assert_eq!(registry().coerce("n", "12abc"), Value::Number(12.0));
    assert_eq!(registry().coerce("n", " 8"), Value::Number(8.0));
    match registry().coerce("n", "inf") {
        Value::Number(n) => assert!(n.is_nan()),
        other => panic!("Expected number, got {:?}", other),
    }
}

#[test]
fn test_integer_list_coercion() {
    match registry().coerce("ns", "1,2,x") {
        Value::NumberList(list) => {
            assert_eq!(list.len(), 3);
            assert_eq!(list[0], 1.0);
            assert_eq!(list[1], 2.0);
            assert!(list[2].is_nan());
        }
        other => panic!("Expected number list, got {:?}", other),
    }
}

#[test]
fn test_string_list_coercion() {
    assert_eq!(
        registry().coerce("ss", "a,b,,c"),
        Value::StringList(vec!["a".into(), "b".into(), "".into(), "c".into()])
    );
}

#[test]
fn test_boolean_coercion() {
    assert_eq!(registry().coerce("b", "1"), Value::Bool(true));
    assert_eq!(registry().coerce("b", "0"), Value::Bool(true));
    assert_eq!(registry().coerce("b", ""), Value::Bool(false));
}

#[test]
fn test_unknown_field_is_string() {
    assert_eq!(registry().lookup("whatever"), ValueType::String);
    assert_eq!(registry().coerce("whatever", "12"), Value::String("12".into()));
}

#[test]
fn test_builtin_registry_types_common_fields() {
    let registry = TypeRegistry::builtin();
    assert_eq!(registry.lookup("clid"), ValueType::Integer);
    assert_eq!(registry.lookup("id"), ValueType::Integer);
    assert_eq!(registry.lookup("client_servergroups"), ValueType::IntegerList);
    assert_eq!(registry.lookup("client_nickname"), ValueType::String);
    assert_eq!(registry.lookup("msg"), ValueType::String);
}

#[test]
fn test_value_accessors() {
    assert_eq!(Value::Number(3.0).as_u64(), Some(3));
    assert_eq!(Value::String("x".into()).as_str(), Some("x"));
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert!(Value::Unset.is_unset());
    assert_eq!(Value::Unset.to_wire_text(), None);
    assert_eq!(Value::NumberList(vec![1.0, 2.0]).to_wire_text().as_deref(), Some("1,2"));
}
