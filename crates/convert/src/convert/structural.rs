//! Conversions into tuples and objects, and from objects into maps.

use std::collections::BTreeMap;

use super::{
    Conversion, Safety, convert, convert_each, get_conversion, settle_elements, shape_fault,
};
use crate::error::{ConvertError, ConvertResult};
use crate::path::PathStep;
use crate::types::{ObjectType, Type};
use crate::unify::unify_types;
use crate::value::Value;

pub(super) fn tuple_to_tuple(
    from_etys: &[Type],
    to_etys: &[Type],
    safety: Safety,
) -> Option<Conversion> {
    if from_etys.len() != to_etys.len() {
        return None;
    }
    let conversions = from_etys
        .iter()
        .zip(to_etys)
        .map(|(from, to)| get_conversion(from, to, safety))
        .collect::<Option<Vec<_>>>()?;

    Some(Conversion::new(move |value| {
        let Value::Tuple(items) = value else {
            return Err(shape_fault("tuple", value));
        };
        if items.len() != conversions.len() {
            return Err(ConvertError::arity_mismatch(conversions.len(), items.len()));
        }
        Ok(Value::Tuple(convert_each(items, &conversions, PathStep::Index)?))
    }))
}

/// Every source attribute must exist in the target. Target attributes
/// missing from the source must be optional; they come out null.
pub(super) fn object_to_object(
    from_obj: &ObjectType,
    to_obj: &ObjectType,
    safety: Safety,
) -> Option<Conversion> {
    if from_obj.attributes().keys().any(|name| !to_obj.has_attribute(name)) {
        return None;
    }
    let mut conversions = Vec::with_capacity(to_obj.len());
    for (name, to_aty) in to_obj.attributes() {
        match from_obj.attribute(name) {
            Some(from_aty) => conversions.push(Some(get_conversion(from_aty, to_aty, safety)?)),
            None if to_obj.is_optional(name) => conversions.push(None),
            None => return None,
        }
    }
    let to_obj = to_obj.clone();

    Some(Conversion::new(move |value| {
        let Value::Object(attrs) = value else {
            return Err(shape_fault("object", value));
        };
        reject_extra_names(attrs.keys(), &to_obj)?;

        let mut out = BTreeMap::new();
        for ((name, aty), conversion) in to_obj.attributes().iter().zip(&conversions) {
            let converted = match (attrs.get(name), conversion) {
                (Some(v), Some(conversion)) => conversion.apply(v),
                // Present in this value although the source type omits it.
                (Some(v), None) => convert(v, aty),
                (None, _) => {
                    out.insert(name.clone(), absent_attribute(name, aty, &to_obj)?);
                    continue;
                }
            };
            let converted = converted.map_err(|e| e.within(PathStep::Attr(name.clone())))?;
            out.insert(name.clone(), converted);
        }
        Ok(Value::Object(out))
    }))
}

/// Attribute values become map entries, widened to a common element type
/// when the target element is dynamic.
pub(super) fn object_to_map(
    from_obj: &ObjectType,
    to_ety: &Type,
    safety: Safety,
) -> Option<Conversion> {
    let target = if to_ety.is_dynamic() && !from_obj.is_empty() {
        let types: Vec<Type> = from_obj.attributes().values().cloned().collect();
        unify_types(&types, safety)?
    } else {
        to_ety.clone()
    };
    let conversions = from_obj
        .attributes()
        .iter()
        .map(|(name, aty)| Some((name.clone(), get_conversion(aty, &target, safety)?)))
        .collect::<Option<BTreeMap<_, _>>>()?;

    Some(Conversion::new(move |value| {
        let Value::Object(attrs) = value else {
            return Err(shape_fault("object", value));
        };
        if attrs.is_empty() {
            return Ok(Value::Map {
                element: target.without_optional_attributes_deep(),
                entries: BTreeMap::new(),
            });
        }

        let mut names = Vec::with_capacity(attrs.len());
        let mut converted = Vec::with_capacity(attrs.len());
        for (name, v) in attrs {
            let conversion = conversions
                .get(name)
                .ok_or_else(|| shape_fault("object", value))?;
            let v = conversion
                .apply(v)
                .map_err(|e| e.within(PathStep::Attr(name.clone())))?;
            names.push(name);
            converted.push(v);
        }
        let (element, converted) =
            settle_elements(converted, &target, |i| PathStep::Attr(names[i].clone()))?;
        Ok(Value::Map {
            element,
            entries: names.into_iter().cloned().zip(converted).collect(),
        })
    }))
}

/// Keys become attributes. Whether the keys fit is only known per value.
pub(super) fn map_to_object(
    from_ety: &Type,
    to_obj: &ObjectType,
    safety: Safety,
) -> Option<Conversion> {
    let conversions = to_obj
        .attributes()
        .values()
        .map(|aty| get_conversion(from_ety, aty, safety))
        .collect::<Option<Vec<_>>>()?;
    let to_obj = to_obj.clone();

    Some(Conversion::new(move |value| {
        let Value::Map { entries, .. } = value else {
            return Err(shape_fault("map", value));
        };
        reject_extra_names(entries.keys(), &to_obj)?;

        let mut out = BTreeMap::new();
        for ((name, aty), conversion) in to_obj.attributes().iter().zip(&conversions) {
            let converted = match entries.get(name) {
                Some(v) => conversion
                    .apply(v)
                    .map_err(|e| e.within(PathStep::Key(name.clone())))?,
                None => absent_attribute(name, aty, &to_obj)?,
            };
            out.insert(name.clone(), converted);
        }
        Ok(Value::Object(out))
    }))
}

fn reject_extra_names<'a>(
    mut names: impl Iterator<Item = &'a String>,
    to_obj: &ObjectType,
) -> ConvertResult<()> {
    match names.find(|name| !to_obj.has_attribute(name)) {
        Some(extra) => Err(ConvertError::unsupported_attribute(extra.as_str())),
        None => Ok(()),
    }
}

fn absent_attribute(name: &str, aty: &Type, to_obj: &ObjectType) -> ConvertResult<Value> {
    if to_obj.is_optional(name) {
        Ok(Value::Null(aty.without_optional_attributes_deep()))
    } else {
        Err(ConvertError::missing_attribute(name))
    }
}
