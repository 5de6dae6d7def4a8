//! Explains why no conversion exists between two types.
//!
//! Only consulted after [`get_conversion`] has already said no, so it may
//! spend extra effort locating the innermost offending part.

use super::{Safety, get_conversion};
use crate::error::ConvertError;
use crate::path::PathStep;
use crate::types::{ObjectType, Type};
use crate::unify::unify;

pub(crate) fn explain(from: &Type, to: &Type) -> ConvertError {
    match (from, to) {
        (Type::Tuple(from_etys), Type::Tuple(to_etys)) => {
            if from_etys.len() != to_etys.len() {
                return ConvertError::arity_mismatch(to_etys.len(), from_etys.len());
            }
            first_failing(
                from_etys
                    .iter()
                    .zip(to_etys)
                    .enumerate()
                    .map(|(i, (f, t))| (PathStep::Index(i), f, t)),
                from,
                to,
            )
        }

        (Type::Object(from_obj), Type::Object(to_obj)) => {
            explain_object(from_obj, to_obj, from, to)
        }

        (Type::Map(from_ety), Type::Object(to_obj)) => first_failing(
            to_obj
                .attributes()
                .iter()
                .map(|(name, aty)| (PathStep::Key(name.clone()), from_ety.as_ref(), aty)),
            from,
            to,
        ),

        (Type::Tuple(from_etys), Type::List(to_ety) | Type::Set(to_ety)) => {
            if to_ety.is_dynamic() {
                return unify(from_etys, Safety::Unsafe)
                    .err()
                    .unwrap_or_else(|| ConvertError::incompatible(from, to));
            }
            first_failing(
                from_etys
                    .iter()
                    .enumerate()
                    .map(|(i, f)| (PathStep::Index(i), f, to_ety.as_ref())),
                from,
                to,
            )
        }

        (Type::Object(from_obj), Type::Map(to_ety)) => {
            if to_ety.is_dynamic() {
                let types: Vec<Type> = from_obj.attributes().values().cloned().collect();
                return unify(&types, Safety::Unsafe)
                    .err()
                    .unwrap_or_else(|| ConvertError::incompatible(from, to));
            }
            first_failing(
                from_obj
                    .attributes()
                    .iter()
                    .map(|(name, f)| (PathStep::Attr(name.clone()), f, to_ety.as_ref())),
                from,
                to,
            )
        }

        _ => ConvertError::incompatible(from, to),
    }
}

fn explain_object(
    from_obj: &ObjectType,
    to_obj: &ObjectType,
    from: &Type,
    to: &Type,
) -> ConvertError {
    if let Some(extra) = from_obj.attributes().keys().find(|name| !to_obj.has_attribute(name)) {
        return ConvertError::unsupported_attribute(extra.as_str());
    }
    let missing = to_obj
        .attributes()
        .keys()
        .find(|name| !from_obj.has_attribute(name) && !to_obj.is_optional(name));
    if let Some(missing) = missing {
        return ConvertError::missing_attribute(missing.as_str());
    }
    first_failing(
        to_obj.attributes().iter().filter_map(|(name, t)| {
            from_obj
                .attribute(name)
                .map(|f| (PathStep::Attr(name.clone()), f, t))
        }),
        from,
        to,
    )
}

/// Explains the first part that has no conversion, attributed to its step.
fn first_failing<'a>(
    parts: impl IntoIterator<Item = (PathStep, &'a Type, &'a Type)>,
    from: &Type,
    to: &Type,
) -> ConvertError {
    parts
        .into_iter()
        .find(|(_, f, t)| get_conversion(f, t, Safety::Unsafe).is_none())
        .map(|(step, f, t)| explain(f, t).within(step))
        .unwrap_or_else(|| ConvertError::incompatible(from, to))
}
