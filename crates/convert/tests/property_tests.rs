//! Property-based tests for nebula-convert.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use nebula_convert::prelude::*;
use proptest::prelude::*;

fn primitive_type() -> impl Strategy<Value = Type> {
    prop_oneof![Just(Type::String), Just(Type::Number), Just(Type::Bool)]
}

fn any_type() -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![primitive_type(), Just(Type::Dynamic)];
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::list),
            inner.clone().prop_map(Type::set),
            inner.clone().prop_map(Type::map),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Type::tuple),
            prop::collection::btree_map("[a-d]", inner, 0..4).prop_map(Type::object),
        ]
    })
}

/// Up to 60 significant digits with exponents well past any fixed-width decimal.
fn number() -> impl Strategy<Value = BigDecimal> {
    ("-?[0-9]{1,60}", -80_i64..=80).prop_map(|(digits, exponent)| {
        BigDecimal::from_str(&format!("{digits}e{exponent}")).unwrap()
    })
}

fn primitive_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        ".{0,12}".prop_map(Value::from),
        number().prop_map(Value::number),
        any::<bool>().prop_map(Value::from),
    ]
}

fn concrete_value() -> impl Strategy<Value = Value> {
    primitive_value().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::tuple),
            prop::collection::btree_map("[a-d]", inner, 0..4).prop_map(Value::object),
        ]
    })
}

// ============================================================================
// IDENTITY: convert(v, type_of(v)) == v
// ============================================================================

proptest! {
    #[test]
    fn convert_to_own_type_is_identity(v in concrete_value()) {
        let ty = v.ty();
        prop_assert_eq!(convert(&v, &ty).unwrap(), v);
    }

    #[test]
    fn convert_to_dynamic_is_identity(v in concrete_value()) {
        prop_assert_eq!(convert(&v, &Type::Dynamic).unwrap(), v);
    }
}

// ============================================================================
// NULL AND UNKNOWN: propagate to the target type without inspecting data
// ============================================================================

proptest! {
    #[test]
    fn null_converts_to_null_of_target(from in primitive_type(), to in primitive_type()) {
        let got = convert(&Value::null(from.clone()), &to);
        if get_conversion(&from, &to, Safety::Unsafe).is_some() {
            prop_assert_eq!(got.unwrap(), Value::null(to));
        } else {
            prop_assert!(got.is_err());
        }
    }

    #[test]
    fn unknown_converts_to_unknown_of_target(ty in any_type()) {
        let got = convert(&Value::unknown(Type::Dynamic), &ty).unwrap();
        prop_assert_eq!(got, Value::unknown(ty));
    }
}

// ============================================================================
// NUMBERS: text rendering round-trips exactly
// ============================================================================

proptest! {
    #[test]
    fn number_text_round_trip(n in number()) {
        let v = Value::number(n);
        let text = convert(&v, &Type::String).unwrap();
        prop_assert_eq!(convert(&text, &Type::Number).unwrap(), v);
    }

    #[test]
    fn bool_text_round_trip(b in any::<bool>()) {
        let text = convert(&Value::from(b), &Type::String).unwrap();
        prop_assert_eq!(convert(&text, &Type::Bool).unwrap(), Value::from(b));
    }
}

// ============================================================================
// UNIFICATION AND PLACEHOLDERS
// ============================================================================

proptest! {
    #[test]
    fn unify_single_type_is_unchanged(ty in any_type()) {
        prop_assert_eq!(unify(std::slice::from_ref(&ty), Safety::Safe).unwrap(), ty);
    }

    #[test]
    fn unify_with_dynamic_is_the_other_type(ty in any_type()) {
        let types = [Type::Dynamic, ty.clone()];
        prop_assert_eq!(unify(&types, Safety::Safe).unwrap(), ty);
    }

    #[test]
    fn unify_result_accepts_every_input(a in primitive_type(), b in primitive_type()) {
        if let Ok(unified) = unify(&[a.clone(), b.clone()], Safety::Unsafe) {
            prop_assert!(get_conversion(&a, &unified, Safety::Unsafe).is_some());
            prop_assert!(get_conversion(&b, &unified, Safety::Unsafe).is_some());
        }
    }

    #[test]
    fn safe_unify_ignores_input_order(
        (types, shuffled) in prop::collection::vec(any_type(), 1..6)
            .prop_flat_map(|types| (Just(types.clone()), Just(types).prop_shuffle()))
    ) {
        prop_assert_eq!(
            unify(&types, Safety::Safe).ok(),
            unify(&shuffled, Safety::Safe).ok()
        );
    }

    #[test]
    fn replace_into_dynamic_returns_input(ty in any_type()) {
        prop_assert_eq!(replace_placeholders(&ty, &Type::Dynamic).unwrap(), ty);
    }

    #[test]
    fn replace_from_dynamic_returns_declared(ty in any_type()) {
        prop_assert_eq!(replace_placeholders(&Type::Dynamic, &ty).unwrap(), ty);
    }
}

// ============================================================================
// SETS: list to set keeps each distinct item once, in first-seen order
// ============================================================================

proptest! {
    #[test]
    fn list_to_set_dedups(items in prop::collection::vec(0_i64..5, 0..12)) {
        let list = Value::list(Type::Number, items.iter().copied().map(Value::from)).unwrap();
        let set = convert(&list, &Type::set(Type::Number)).unwrap();

        let mut expected: Vec<Value> = Vec::new();
        for item in items.into_iter().map(Value::from) {
            if !expected.contains(&item) {
                expected.push(item);
            }
        }
        prop_assert_eq!(set.items().unwrap(), expected.as_slice());
    }
}
