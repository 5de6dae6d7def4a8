//! End-to-end conversion, unification and placeholder scenarios.

use bigdecimal::BigDecimal;
use nebula_convert::prelude::*;
use nebula_convert::{ConvertErrorKind, PrimitiveType, conversion_safety};
use pretty_assertions::assert_eq;

// ============================================================================
// CONVERSION
// ============================================================================

#[test]
fn tuple_of_numeric_text_into_number_list() {
    let value = Value::tuple([Value::from("1"), Value::from("2.5")]);
    let got = convert(&value, &Type::list(Type::Number)).unwrap();
    assert_eq!(
        got,
        Value::list(
            Type::Number,
            [Value::from(1), Value::number("2.5".parse::<BigDecimal>().unwrap())]
        )
        .unwrap()
    );
}

#[test]
fn object_into_text_map() {
    let value = Value::object([("a", Value::from("x"))]);
    let got = convert(&value, &Type::map(Type::String)).unwrap();
    assert_eq!(got, Value::map(Type::String, [("a", Value::from("x"))]).unwrap());
}

#[test]
fn list_into_set_drops_duplicates_and_is_unsafe() {
    let value = Value::list(Type::Number, [Value::from(1), Value::from(1), Value::from(2)])
        .unwrap();
    let got = convert(&value, &Type::set(Type::Number)).unwrap();
    assert_eq!(
        got,
        Value::set(Type::Number, [Value::from(1), Value::from(2)]).unwrap()
    );
    assert_eq!(
        conversion_safety(&Type::list(Type::Number), &Type::set(Type::Number)),
        Some(Safety::Unsafe)
    );
}

#[test]
fn list_of_sets_into_set_of_sets_drops_reordered_duplicates() {
    let numbers = |items: [i64; 2]| Value::set(Type::Number, items.map(Value::from)).unwrap();
    let value = Value::list(Type::set(Type::Number), [numbers([1, 2]), numbers([2, 1])]).unwrap();

    let got = convert(&value, &Type::set(Type::set(Type::Number))).unwrap();
    assert_eq!(got.items().unwrap().len(), 1);
    assert_eq!(
        got,
        Value::set(Type::set(Type::Number), [numbers([2, 1])]).unwrap()
    );
}

#[test]
fn set_of_text_sets_into_set_of_number_sets_dedups_after_converting() {
    let texts = |items: [&str; 2]| Value::set(Type::String, items.map(Value::from)).unwrap();
    let value = Value::set(
        Type::set(Type::String),
        [texts(["1", "2"]), texts(["2", "1.0"])],
    )
    .unwrap();
    assert_eq!(value.items().unwrap().len(), 2);

    let got = convert(&value, &Type::set(Type::set(Type::Number))).unwrap();
    assert_eq!(got.items().unwrap().len(), 1);
}

#[test]
fn tuple_arity_mismatch_reports_both_lengths() {
    let value = Value::tuple([Value::from(1), Value::from(2)]);
    let err = convert(&value, &Type::tuple([Type::String, Type::String, Type::String]))
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ConvertErrorKind::ArityMismatch {
            expected: 3,
            actual: 2,
        }
    );
}

#[test]
fn nested_error_path_points_at_failing_value() {
    let value = Value::object([(
        "servers",
        Value::tuple([
            Value::object([("port", Value::from("80"))]),
            Value::object([("port", Value::from("eighty"))]),
        ]),
    )]);
    let want = Type::object([("servers", Type::list(Type::object([("port", Type::Number)])))]);
    let err = convert(&value, &want).unwrap_err();
    assert_eq!(err.path(), &Path::root().attr("servers").index(1).attr("port"));
    assert_eq!(
        err.kind(),
        &ConvertErrorKind::InvalidPrimitiveLiteral {
            target: PrimitiveType::Number,
            text: "eighty".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        r#".servers[1].port: a number is required, but "eighty" is not a valid number"#
    );
}

#[test]
fn map_into_object_with_unsupported_key() {
    let value = Value::map(
        Type::String,
        [("name", Value::from("web")), ("colour", Value::from("red"))],
    )
    .unwrap();
    let want = Type::object([("name", Type::String)]);
    let err = convert(&value, &want).unwrap_err();
    assert_eq!(
        err.kind(),
        &ConvertErrorKind::UnsupportedAttribute {
            name: "colour".into(),
        }
    );
}

#[test]
fn map_into_object_missing_required_key() {
    let value = Value::map(Type::String, [("name", Value::from("web"))]).unwrap();
    let want = Type::object([("name", Type::String), ("image", Type::String)]);
    let err = convert(&value, &want).unwrap_err();
    assert_eq!(
        err.kind(),
        &ConvertErrorKind::MissingRequiredAttribute {
            name: "image".into(),
        }
    );
}

#[test]
fn null_and_unknown_skip_element_checks() {
    let want = Type::list(Type::Number);
    let null = Value::null(Type::tuple([Type::String, Type::String]));
    let unknown = Value::unknown(Type::tuple([Type::String]));
    assert_eq!(convert(&null, &want).unwrap(), Value::null(want.clone()));
    assert_eq!(convert(&unknown, &want).unwrap(), Value::unknown(want));
}

// ============================================================================
// DYNAMIC PLACEHOLDERS
// ============================================================================

#[test]
fn deferred_conversion_error_is_relative_to_outer_value() {
    let declared = Type::object([("items", Type::Dynamic)]);
    let want = Type::object([("items", Type::list(Type::Bool))]);
    let conversion = get_conversion(&declared, &want, Safety::Unsafe).unwrap();

    let value = Value::object([(
        "items",
        Value::tuple([Value::from("true"), Value::from("maybe")]),
    )]);
    let err = conversion.apply(&value).unwrap_err();
    assert_eq!(err.path(), &Path::root().attr("items").index(1));
}

#[test]
fn deferred_conversion_of_unknown_placeholder() {
    let conversion = get_conversion(&Type::Dynamic, &Type::map(Type::String), Safety::Safe)
        .unwrap();
    assert_eq!(
        conversion.apply(&Value::unknown(Type::Dynamic)).unwrap(),
        Value::unknown(Type::map(Type::String))
    );
}

#[test]
fn dynamic_target_accepts_anything() {
    let value = Value::tuple([Value::from(1), Value::from(true)]);
    assert_eq!(convert(&value, &Type::Dynamic).unwrap(), value);
}

#[test]
fn replace_placeholders_from_object_into_map() {
    let got = replace_placeholders(
        &Type::object([("a", Type::Number)]),
        &Type::map(Type::Dynamic),
    )
    .unwrap();
    assert_eq!(got, Type::map(Type::Number));
}

#[test]
fn replace_placeholders_nested() {
    let concrete = Type::object([
        ("name", Type::String),
        ("ports", Type::list(Type::Number)),
    ]);
    let declared = Type::object([
        ("name", Type::String),
        ("ports", Type::list(Type::Dynamic)),
    ]);
    assert_eq!(replace_placeholders(&concrete, &declared).unwrap(), concrete);
}

// ============================================================================
// UNIFICATION
// ============================================================================

#[test]
fn unify_number_and_text() {
    assert_eq!(
        unify(&[Type::Number, Type::String], Safety::Unsafe).unwrap(),
        Type::String
    );
    let err = unify(&[Type::Number, Type::String], Safety::Safe).unwrap_err();
    assert_eq!(err.code(), "CONVERT:UNIFY");
}

#[test]
fn unify_conversions_convert_each_branch() {
    let types = [
        Type::object([("a", Type::Number)]),
        Type::map(Type::String),
    ];
    let (ty, conversions) =
        nebula_convert::unify_with_conversions(&types, Safety::Unsafe).unwrap();
    assert_eq!(ty, Type::map(Type::String));
    let got = conversions[0]
        .apply(&Value::object([("a", Value::from(3))]))
        .unwrap();
    assert_eq!(got, Value::map(Type::String, [("a", Value::from("3"))]).unwrap());
}

// ============================================================================
// ENGINE
// ============================================================================

#[test]
fn converter_matches_free_functions() {
    let converter = Converter::new();
    let value = Value::map(Type::String, [("on", Value::from("false"))]).unwrap();
    let want = Type::object([("on", Type::Bool)]);
    assert_eq!(
        converter.convert(&value, &want).unwrap(),
        convert(&value, &want).unwrap()
    );
}
