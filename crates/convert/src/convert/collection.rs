//! Conversions into lists, sets and maps from homogeneous sources and tuples.

use std::collections::BTreeMap;
use std::iter;

use super::{Conversion, Safety, convert_each, get_conversion, settle_elements, shape_fault};
use crate::convert::dynamic::replace_placeholders;
use crate::error::{ConvertError, ConvertResult};
use crate::path::PathStep;
use crate::types::Type;
use crate::unify::unify_types;
use crate::value::{Value, dedup_set_items};

/// List or set source into a list.
pub(super) fn to_list(from_ety: &Type, to_ety: &Type, safety: Safety) -> Option<Conversion> {
    let element_conversion = get_conversion(from_ety, to_ety, safety)?;
    let to_ety = to_ety.clone();
    Some(Conversion::new(move |value| {
        let (element, items) = homogeneous_items(value)?;
        let (element, items) = convert_homogeneous(element, items, &element_conversion, &to_ety)?;
        Ok(Value::List { element, items })
    }))
}

/// List or set source into a set.
pub(super) fn to_set(from_ety: &Type, to_ety: &Type, safety: Safety) -> Option<Conversion> {
    let element_conversion = get_conversion(from_ety, to_ety, safety)?;
    let to_ety = to_ety.clone();
    Some(Conversion::new(move |value| {
        let (element, items) = homogeneous_items(value)?;
        let (element, items) = convert_homogeneous(element, items, &element_conversion, &to_ety)?;
        Ok(Value::Set {
            element,
            items: dedup_set_items(items),
        })
    }))
}

pub(super) fn tuple_to_list(
    from_etys: &[Type],
    to_ety: &Type,
    safety: Safety,
) -> Option<Conversion> {
    let (target, conversions) = positional_conversions(from_etys, to_ety, safety)?;
    Some(Conversion::new(move |value| {
        let (element, items) = convert_positional(value, &conversions, &target)?;
        Ok(Value::List { element, items })
    }))
}

pub(super) fn tuple_to_set(
    from_etys: &[Type],
    to_ety: &Type,
    safety: Safety,
) -> Option<Conversion> {
    let (target, conversions) = positional_conversions(from_etys, to_ety, safety)?;
    Some(Conversion::new(move |value| {
        let (element, items) = convert_positional(value, &conversions, &target)?;
        Ok(Value::Set {
            element,
            items: dedup_set_items(items),
        })
    }))
}

pub(super) fn map_to_map(from_ety: &Type, to_ety: &Type, safety: Safety) -> Option<Conversion> {
    let element_conversion = get_conversion(from_ety, to_ety, safety)?;
    let to_ety = to_ety.clone();
    Some(Conversion::new(move |value| {
        let Value::Map { element, entries } = value else {
            return Err(shape_fault("map", value));
        };
        if entries.is_empty() {
            return Ok(Value::Map {
                element: empty_element(element, &to_ety)?,
                entries: BTreeMap::new(),
            });
        }

        let (keys, values): (Vec<&String>, Vec<&Value>) = entries.iter().unzip();
        let step = |i: usize| PathStep::Key(keys[i].clone());
        let converted = convert_each(values, iter::repeat(&element_conversion), step)?;
        let (element, converted) = settle_elements(converted, &to_ety, step)?;
        Ok(Value::Map {
            element,
            entries: keys.into_iter().cloned().zip(converted).collect(),
        })
    }))
}

fn homogeneous_items(value: &Value) -> ConvertResult<(&Type, &[Value])> {
    match value {
        Value::List { element, items } | Value::Set { element, items } => Ok((element, items)),
        _ => Err(shape_fault("list or set", value)),
    }
}

fn convert_homogeneous(
    element: &Type,
    items: &[Value],
    conversion: &Conversion,
    to_ety: &Type,
) -> ConvertResult<(Type, Vec<Value>)> {
    if items.is_empty() {
        return Ok((empty_element(element, to_ety)?, Vec::new()));
    }
    let converted = convert_each(items, iter::repeat(conversion), PathStep::Index)?;
    settle_elements(converted, to_ety, PathStep::Index)
}

/// Element type of an empty result: nothing to inspect but the source's
/// declared element type.
fn empty_element(source_element: &Type, to_ety: &Type) -> ConvertResult<Type> {
    Ok(replace_placeholders(source_element, to_ety)?.without_optional_attributes_deep())
}

/// Target element type plus one conversion per tuple position.
fn positional_conversions(
    from_etys: &[Type],
    to_ety: &Type,
    safety: Safety,
) -> Option<(Type, Vec<Conversion>)> {
    let target = if to_ety.is_dynamic() && !from_etys.is_empty() {
        unify_types(from_etys, safety)?
    } else {
        to_ety.clone()
    };
    let conversions = from_etys
        .iter()
        .map(|ety| get_conversion(ety, &target, safety))
        .collect::<Option<Vec<_>>>()?;
    Some((target, conversions))
}

fn convert_positional(
    value: &Value,
    conversions: &[Conversion],
    target: &Type,
) -> ConvertResult<(Type, Vec<Value>)> {
    let Value::Tuple(items) = value else {
        return Err(shape_fault("tuple", value));
    };
    if items.len() != conversions.len() {
        return Err(ConvertError::arity_mismatch(conversions.len(), items.len()));
    }
    if items.is_empty() {
        return Ok((target.without_optional_attributes_deep(), Vec::new()));
    }
    let converted = convert_each(items, conversions, PathStep::Index)?;
    settle_elements(converted, target, PathStep::Index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert;
    use crate::error::ConvertErrorKind;
    use crate::path::Path;
    use bigdecimal::BigDecimal;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tuple_of_strings_to_number_list() {
        let v = Value::tuple([Value::from("1"), Value::from("2.5")]);
        let got = convert(&v, &Type::list(Type::Number)).unwrap();
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
    fn test_tuple_to_dynamic_list_unifies_elements() {
        let v = Value::tuple([Value::from(1), Value::from("a")]);
        let got = convert(&v, &Type::list(Type::Dynamic)).unwrap();
        assert_eq!(
            got,
            Value::list(Type::String, [Value::from("1"), Value::from("a")]).unwrap()
        );
    }

    #[test]
    fn test_empty_tuple_to_dynamic_list_keeps_placeholder_element() {
        let got = convert(&Value::tuple([]), &Type::list(Type::Dynamic)).unwrap();
        assert_eq!(got.ty(), Type::list(Type::Dynamic));
        assert!(got.items().unwrap().is_empty());
    }

    #[test]
    fn test_empty_tuple_to_list() {
        let got = convert(&Value::tuple([]), &Type::list(Type::Bool)).unwrap();
        assert_eq!(got, Value::list(Type::Bool, []).unwrap());
    }

    #[test]
    fn test_list_to_set_dedups() {
        let v =
            Value::list(Type::Number, [Value::from(1), Value::from(1), Value::from(2)]).unwrap();
        let got = convert(&v, &Type::set(Type::Number)).unwrap();
        assert_eq!(got.items().unwrap(), &[Value::from(1), Value::from(2)]);
    }

    #[test]
    fn test_set_to_list_is_safe() {
        let v = Value::set(Type::Bool, [Value::from(true)]).unwrap();
        let conv =
            get_conversion(&Type::set(Type::Bool), &Type::list(Type::String), Safety::Safe)
                .unwrap();
        assert_eq!(
            conv.apply(&v).unwrap(),
            Value::list(Type::String, [Value::from("true")]).unwrap()
        );
    }

    #[test]
    fn test_element_error_carries_index() {
        let v = Value::list(Type::String, [Value::from("1"), Value::from("x")]).unwrap();
        let err = convert(&v, &Type::list(Type::Number)).unwrap_err();
        assert_eq!(err.path(), &Path::root().index(1));
    }

    #[test]
    fn test_map_error_carries_key() {
        let v = Value::map(Type::String, [("a", Value::from("1")), ("b", Value::from("no"))])
            .unwrap();
        let err = convert(&v, &Type::map(Type::Bool)).unwrap_err();
        assert_eq!(err.path(), &Path::root().key("a"));
        assert!(matches!(err.kind(), ConvertErrorKind::InvalidPrimitiveLiteral { .. }));
    }

    #[test]
    fn test_map_to_map() {
        let v = Value::map(Type::Number, [("x", Value::from(5))]).unwrap();
        let got = convert(&v, &Type::map(Type::String)).unwrap();
        assert_eq!(got, Value::map(Type::String, [("x", Value::from("5"))]).unwrap());
    }

    #[test]
    fn test_empty_map_to_dynamic_map_keeps_source_element() {
        let v = Value::map(Type::Number, Vec::<(String, Value)>::new()).unwrap();
        let got = convert(&v, &Type::map(Type::Dynamic)).unwrap();
        assert_eq!(got.ty(), Type::map(Type::Number));
    }

    #[test]
    fn test_tuple_arity_checked_on_apply() {
        let conv = get_conversion(
            &Type::tuple([Type::Number, Type::Number]),
            &Type::list(Type::Number),
            Safety::Safe,
        )
        .unwrap();
        let err = conv.apply(&Value::tuple([Value::from(1)])).unwrap_err();
        assert_eq!(err.kind(), &ConvertErrorKind::ArityMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_tuple_to_set_requires_unsafe() {
        let from = Type::tuple([Type::Number]);
        assert!(get_conversion(&from, &Type::set(Type::Number), Safety::Safe).is_none());
        assert!(get_conversion(&from, &Type::set(Type::Number), Safety::Unsafe).is_some());
    }

    #[test]
    fn test_unknown_items_survive() {
        let v = Value::list(Type::String, [Value::unknown(Type::String), Value::from("2")])
            .unwrap();
        let got = convert(&v, &Type::list(Type::Number)).unwrap();
        assert_eq!(
            got.items().unwrap(),
            &[Value::unknown(Type::Number), Value::from(2)]
        );
    }
}
