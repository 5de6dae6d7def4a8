//! Conversions involving the dynamic placeholder.

use std::collections::BTreeMap;

use tracing::trace;

use super::{Conversion, Safety, convert};
use crate::error::{ConvertError, ConvertResult};
use crate::types::{ObjectType, Type};
use crate::unify::unify_types;
use crate::value::Value;

/// Conversion into [`Type::Dynamic`]: the value is kept as is.
pub(super) fn passthrough() -> Conversion {
    Conversion::new(|value| Ok(value.clone()))
}

/// Conversion out of [`Type::Dynamic`]. The actual type is only known once
/// a value arrives, so the real conversion is chosen then.
pub(super) fn fixup(target: &Type) -> Conversion {
    let target = target.clone();
    let placeholder_target = target.without_optional_attributes_deep();
    Conversion::new(move |value| match value {
        Value::Unknown(ty) if ty.is_dynamic() => Ok(Value::Unknown(placeholder_target.clone())),
        Value::Null(ty) if ty.is_dynamic() => Ok(Value::Null(placeholder_target.clone())),
        _ => convert(value, &target).inspect_err(|e| {
            trace!(from = %value.ty(), to = %target, error = %e, "deferred conversion failed");
        }),
    })
}

/// Refines `declared` using the concrete structure of `input`.
///
/// Wherever `declared` has [`Type::Dynamic`] the corresponding part of
/// `input` is used instead. Fully concrete parts of `declared` win.
/// Optional attribute markers of `declared` are kept.
///
/// The two types must be convert-compatible; otherwise the result is an
/// internal consistency fault.
///
/// ```rust
/// use nebula_convert::{replace_placeholders, Type};
///
/// let got = replace_placeholders(
///     &Type::object([("a", Type::Number)]),
///     &Type::map(Type::Dynamic),
/// )
/// .unwrap();
/// assert_eq!(got, Type::map(Type::Number));
/// ```
pub fn replace_placeholders(input: &Type, declared: &Type) -> ConvertResult<Type> {
    if input.is_dynamic() {
        return Ok(declared.clone());
    }

    match declared {
        Type::Dynamic => Ok(input.clone()),

        Type::String | Type::Number | Type::Bool | Type::Capsule(_) => Ok(declared.clone()),

        Type::Map(ety) => match input {
            Type::Map(input_ety) => Ok(Type::map(replace_placeholders(input_ety, ety)?)),
            Type::Object(obj) => {
                let merged = merged_attribute_type(obj);
                Ok(Type::map(replace_placeholders(&merged, ety)?))
            }
            _ => Err(incompatible_shapes(input, declared)),
        },

        Type::Object(obj) => replace_in_object(input, obj, declared),

        Type::List(ety) => Ok(Type::list(replace_in_sequence_element(input, ety, declared)?)),
        Type::Set(ety) => Ok(Type::set(replace_in_sequence_element(input, ety, declared)?)),

        Type::Tuple(etys) => match input {
            Type::Tuple(input_etys) if input_etys.len() == etys.len() => {
                let refined = input_etys
                    .iter()
                    .zip(etys)
                    .map(|(i, d)| replace_placeholders(i, d))
                    .collect::<ConvertResult<Vec<_>>>()?;
                Ok(Type::Tuple(refined))
            }
            _ => Err(incompatible_shapes(input, declared)),
        },
    }
}

fn replace_in_object(input: &Type, obj: &ObjectType, declared: &Type) -> ConvertResult<Type> {
    let attributes = match input {
        Type::Map(input_ety) => obj
            .attributes()
            .iter()
            .map(|(name, aty)| Ok((name.clone(), replace_placeholders(input_ety, aty)?)))
            .collect::<ConvertResult<BTreeMap<_, _>>>()?,
        Type::Object(input_obj) => obj
            .attributes()
            .iter()
            .map(|(name, aty)| {
                let refined = match input_obj.attribute(name) {
                    Some(input_aty) => replace_placeholders(input_aty, aty)?,
                    None => aty.clone(),
                };
                Ok((name.clone(), refined))
            })
            .collect::<ConvertResult<BTreeMap<_, _>>>()?,
        _ => return Err(incompatible_shapes(input, declared)),
    };
    Ok(Type::Object(
        ObjectType::new(attributes).with_optional(obj.optional_attributes().iter().cloned()),
    ))
}

fn replace_in_sequence_element(input: &Type, ety: &Type, declared: &Type) -> ConvertResult<Type> {
    match input {
        Type::List(input_ety) | Type::Set(input_ety) => replace_placeholders(input_ety, ety),
        Type::Tuple(input_etys) => {
            let merged = unify_types(input_etys, Safety::Unsafe).unwrap_or(Type::Dynamic);
            replace_placeholders(&merged, ety)
        }
        _ => Err(incompatible_shapes(input, declared)),
    }
}

fn merged_attribute_type(obj: &ObjectType) -> Type {
    let types: Vec<Type> = obj.attributes().values().cloned().collect();
    unify_types(&types, Safety::Unsafe).unwrap_or(Type::Dynamic)
}

fn incompatible_shapes(input: &Type, declared: &Type) -> ConvertError {
    ConvertError::internal(format!(
        "cannot refine {declared} from {input}: the types are not convert-compatible"
    ))
}
