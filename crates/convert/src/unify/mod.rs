//! Unification: the narrowest type a group of types can all convert into.
//!
//! Inputs of one structural kind are unified part by part (element types
//! of lists, attributes of objects, positions of tuples). Anything else
//! falls back to picking the most general input, following a fixed
//! preference order, that every other input converts to.
//!
//! In [`Safety::Safe`] mode no primitive is ever widened, at any depth:
//! `[number, string]` has no safe common type even though a number
//! converts to a string without loss.

mod order;

use tracing::trace;

use crate::convert::{Conversion, Safety, get_conversion};
use crate::error::{ConvertError, ConvertResult};
use crate::types::Type;

/// Unifies `types`.
///
/// Fails with `EmptyUnification` for an empty input and with
/// `UnificationFailure` naming the first pair, in input order, that has no
/// common type.
///
/// ```rust
/// use nebula_convert::{unify, Safety, Type};
///
/// let ty = unify(&[Type::Number, Type::String], Safety::Unsafe).unwrap();
/// assert_eq!(ty, Type::String);
/// assert!(unify(&[Type::Number, Type::String], Safety::Safe).is_err());
/// ```
pub fn unify(types: &[Type], safety: Safety) -> ConvertResult<Type> {
    if types.is_empty() {
        return Err(ConvertError::empty_unification());
    }
    match unify_types(types, safety) {
        Some(ty) => {
            trace!(inputs = types.len(), result = %ty, ?safety, "unified types");
            Ok(ty)
        }
        None => Err(first_incompatible_pair(types, safety)),
    }
}

/// Like [`unify`], also returning one conversion per input into the result.
pub fn unify_with_conversions(
    types: &[Type],
    safety: Safety,
) -> ConvertResult<(Type, Vec<Conversion>)> {
    let unified = unify(types, safety)?;
    let conversions = types
        .iter()
        .map(|ty| {
            if ty == &unified {
                return Ok(Conversion::identity());
            }
            get_conversion(ty, &unified, safety).ok_or_else(|| {
                ConvertError::internal(format!("unified type {unified} is not reachable from {ty}"))
            })
        })
        .collect::<ConvertResult<Vec<_>>>()?;
    Ok((unified, conversions))
}

/// Unification without diagnostics; `None` if there is no common type.
pub(crate) fn unify_types(types: &[Type], safety: Safety) -> Option<Type> {
    let refs: Vec<&Type> = types.iter().collect();
    unify_refs(&refs, safety)
}

fn unify_refs(types: &[&Type], safety: Safety) -> Option<Type> {
    if types.is_empty() {
        return None;
    }
    // Placeholders go along with whatever the others settle on.
    let concrete: Vec<&Type> = types.iter().copied().filter(|ty| !ty.is_dynamic()).collect();
    let Some(&first) = concrete.first() else {
        return Some(Type::Dynamic);
    };
    if concrete.iter().all(|&ty| ty == first) {
        return Some(first.clone());
    }

    let census = Census::of(&concrete);
    let n = concrete.len();
    if census.maps == n {
        unify_collections(&concrete, Type::map, safety)
    } else if census.maps > 0 && census.maps + census.objects == n {
        unify_objects_as_map(&concrete, safety)
    } else if census.lists == n {
        unify_collections(&concrete, Type::list, safety)
    } else if census.lists > 0 && census.lists + census.tuples == n {
        unify_tuples_as_list(&concrete, safety)
    } else if census.sets == n {
        unify_collections(&concrete, Type::set, safety)
    } else if census.objects == n {
        unify_objects(&concrete, safety)
    } else if census.tuples == n {
        unify_tuples(&concrete, safety)
    } else if census.objects > 0 && census.tuples > 0 {
        None
    } else {
        unify_by_preference(&concrete, safety)
    }
}

#[derive(Default)]
struct Census {
    lists: usize,
    sets: usize,
    maps: usize,
    tuples: usize,
    objects: usize,
}

impl Census {
    fn of(types: &[&Type]) -> Self {
        let mut census = Self::default();
        for ty in types {
            match ty {
                Type::List(_) => census.lists += 1,
                Type::Set(_) => census.sets += 1,
                Type::Map(_) => census.maps += 1,
                Type::Tuple(_) => census.tuples += 1,
                Type::Object(_) => census.objects += 1,
                Type::String | Type::Number | Type::Bool | Type::Capsule(_) | Type::Dynamic => {}
            }
        }
        census
    }
}

/// All inputs are the same collection kind: unify the element types.
fn unify_collections(types: &[&Type], make: fn(Type) -> Type, safety: Safety) -> Option<Type> {
    let elements: Vec<&Type> = types.iter().filter_map(|ty| ty.element_type()).collect();
    let unified = make(unify_refs(&elements, safety)?);
    all_convert_to(types, unified, safety)
}

fn unify_objects(types: &[&Type], safety: Safety) -> Option<Type> {
    let objects: Vec<_> = types.iter().filter_map(|ty| ty.object_type()).collect();
    let (first, rest) = objects.split_first()?;
    if rest.iter().any(|obj| !obj.same_attribute_names(first)) {
        return if safety.allows_unsafe() {
            unify_objects_as_map(types, safety)
        } else {
            None
        };
    }

    let mut attributes = Vec::with_capacity(first.len());
    for name in first.attributes().keys() {
        let candidates: Vec<&Type> = objects.iter().filter_map(|obj| obj.attribute(name)).collect();
        attributes.push((name.clone(), unify_refs(&candidates, safety)?));
    }
    all_convert_to(types, Type::object(attributes), safety)
}

/// Maps and objects together: every attribute and element type joins one
/// element type.
fn unify_objects_as_map(types: &[&Type], safety: Safety) -> Option<Type> {
    let mut elements = Vec::new();
    for ty in types {
        match ty {
            Type::Map(ety) => elements.push(ety.as_ref()),
            Type::Object(obj) => elements.extend(obj.attributes().values()),
            _ => return None,
        }
    }
    let unified = Type::map(unify_refs(&elements, safety)?);
    all_convert_to(types, unified, safety)
}

fn unify_tuples(types: &[&Type], safety: Safety) -> Option<Type> {
    let tuples: Vec<&[Type]> = types.iter().filter_map(|ty| ty.tuple_elements()).collect();
    let (first, rest) = tuples.split_first()?;
    if rest.iter().any(|etys| etys.len() != first.len()) {
        return if safety.allows_unsafe() {
            unify_tuples_as_list(types, safety)
        } else {
            None
        };
    }

    let mut elements = Vec::with_capacity(first.len());
    for i in 0..first.len() {
        let candidates: Vec<&Type> = tuples.iter().map(|etys| &etys[i]).collect();
        elements.push(unify_refs(&candidates, safety)?);
    }
    all_convert_to(types, Type::Tuple(elements), safety)
}

/// Lists and tuples together: every element type joins one list element.
fn unify_tuples_as_list(types: &[&Type], safety: Safety) -> Option<Type> {
    let mut elements = Vec::new();
    for ty in types {
        match ty {
            Type::List(ety) => elements.push(ety.as_ref()),
            Type::Tuple(etys) => elements.extend(etys),
            _ => return None,
        }
    }
    let element = if elements.is_empty() {
        Type::Dynamic
    } else {
        unify_refs(&elements, safety)?
    };
    all_convert_to(types, Type::list(element), safety)
}

/// Mixed kinds: the most preferred input every other input converts to.
fn unify_by_preference(types: &[&Type], safety: Safety) -> Option<Type> {
    order::preference_order(types).into_iter().find_map(|idx| {
        let want = types[idx];
        types
            .iter()
            .all(|&ty| ty == want || converts_for_unify(ty, want, safety))
            .then(|| want.clone())
    })
}

fn all_convert_to(types: &[&Type], unified: Type, safety: Safety) -> Option<Type> {
    types
        .iter()
        .all(|&ty| ty == &unified || converts_for_unify(ty, &unified, safety))
        .then_some(unified)
}

fn converts_for_unify(from: &Type, to: &Type, safety: Safety) -> bool {
    get_conversion(from, to, safety).is_some()
        && (safety.allows_unsafe() || !widens_primitive(from, to))
}

/// True if converting `from` to `to` turns some primitive into a different
/// primitive somewhere inside.
fn widens_primitive(from: &Type, to: &Type) -> bool {
    match (from, to) {
        (Type::String | Type::Number | Type::Bool, Type::String | Type::Number | Type::Bool) => {
            from != to
        }
        (
            Type::List(f) | Type::Set(f) | Type::Map(f),
            Type::List(t) | Type::Set(t) | Type::Map(t),
        ) => widens_primitive(f, t),
        (Type::Tuple(fs), Type::Tuple(ts)) => {
            fs.iter().zip(ts).any(|(f, t)| widens_primitive(f, t))
        }
        (Type::Tuple(fs), Type::List(t) | Type::Set(t)) => {
            fs.iter().any(|f| widens_primitive(f, t))
        }
        (Type::Object(f), Type::Object(t)) => f
            .attributes()
            .iter()
            .filter_map(|(name, fa)| t.attribute(name).map(|ta| (fa, ta)))
            .any(|(fa, ta)| widens_primitive(fa, ta)),
        (Type::Object(f), Type::Map(t)) => {
            f.attributes().values().any(|fa| widens_primitive(fa, t))
        }
        (Type::Map(f), Type::Object(t)) => {
            t.attributes().values().any(|ta| widens_primitive(f, ta))
        }
        _ => false,
    }
}

fn first_incompatible_pair(types: &[Type], safety: Safety) -> ConvertError {
    for (i, left) in types.iter().enumerate() {
        for right in &types[i + 1..] {
            if unify_refs(&[left, right], safety).is_none() {
                return ConvertError::unification_failure(left, right);
            }
        }
    }
    // Every pair has a common type but the whole group does not.
    ConvertError::unification_failure(&types[0], &types[types.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertErrorKind;
    use crate::types::ObjectType;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_number_and_string() {
        assert_eq!(
            unify(&[Type::Number, Type::String], Safety::Unsafe).unwrap(),
            Type::String
        );
        let err = unify(&[Type::Number, Type::String], Safety::Safe).unwrap_err();
        assert_eq!(
            err.kind(),
            &ConvertErrorKind::UnificationFailure {
                left: Type::Number,
                right: Type::String,
            }
        );
    }

    #[test]
    fn test_single_type_unchanged() {
        let ty = Type::object([("a", Type::list(Type::Bool))]);
        assert_eq!(unify(std::slice::from_ref(&ty), Safety::Safe).unwrap(), ty);
    }

    #[test]
    fn test_empty_input() {
        let err = unify(&[], Safety::Unsafe).unwrap_err();
        assert_eq!(err.kind(), &ConvertErrorKind::EmptyUnification);
    }

    #[test]
    fn test_dynamic_yields_other_type() {
        assert_eq!(
            unify(&[Type::Dynamic, Type::Number], Safety::Safe).unwrap(),
            Type::Number
        );
        assert_eq!(
            unify(&[Type::Dynamic, Type::Dynamic], Safety::Safe).unwrap(),
            Type::Dynamic
        );
    }

    #[test]
    fn test_lists_unify_elements() {
        let got = unify(
            &[Type::list(Type::Number), Type::list(Type::Dynamic)],
            Safety::Safe,
        )
        .unwrap();
        assert_eq!(got, Type::list(Type::Number));
    }

    #[test]
    fn test_nested_widening_needs_unsafe() {
        let types = [Type::list(Type::Number), Type::list(Type::String)];
        assert!(unify(&types, Safety::Safe).is_err());
        assert_eq!(unify(&types, Safety::Unsafe).unwrap(), Type::list(Type::String));
    }

    #[test]
    fn test_list_preferred_over_set() {
        let types = [Type::set(Type::Number), Type::list(Type::Number)];
        assert_eq!(unify(&types, Safety::Safe).unwrap(), Type::list(Type::Number));
    }

    #[test]
    fn test_objects_with_same_attributes() {
        let types = [
            Type::object([("a", Type::Number), ("b", Type::Dynamic)]),
            Type::object([("a", Type::Number), ("b", Type::Bool)]),
        ];
        assert_eq!(
            unify(&types, Safety::Safe).unwrap(),
            Type::object([("a", Type::Number), ("b", Type::Bool)])
        );
    }

    #[test]
    fn test_objects_with_different_attributes_fall_back_to_map() {
        let types = [
            Type::object([("a", Type::String)]),
            Type::object([("b", Type::String)]),
        ];
        assert!(unify(&types, Safety::Safe).is_err());
        assert_eq!(unify(&types, Safety::Unsafe).unwrap(), Type::map(Type::String));
    }

    #[test]
    fn test_objects_with_maps() {
        let types = [Type::object([("a", Type::Bool)]), Type::map(Type::Bool)];
        assert_eq!(unify(&types, Safety::Safe).unwrap(), Type::map(Type::Bool));
    }

    #[test]
    fn test_tuples() {
        let same = [
            Type::tuple([Type::Number, Type::Dynamic]),
            Type::tuple([Type::Number, Type::String]),
        ];
        assert_eq!(
            unify(&same, Safety::Safe).unwrap(),
            Type::tuple([Type::Number, Type::String])
        );

        let different = [Type::tuple([Type::Number]), Type::tuple([Type::Number, Type::Number])];
        assert!(unify(&different, Safety::Safe).is_err());
        assert_eq!(
            unify(&different, Safety::Unsafe).unwrap(),
            Type::list(Type::Number)
        );
    }

    #[test]
    fn test_tuples_with_lists() {
        let types = [Type::tuple([Type::Bool, Type::Bool]), Type::list(Type::Bool)];
        assert_eq!(unify(&types, Safety::Safe).unwrap(), Type::list(Type::Bool));
    }

    #[test]
    fn test_objects_and_tuples_never_unify() {
        let types = [Type::Object(ObjectType::default()), Type::tuple([])];
        assert!(unify(&types, Safety::Unsafe).is_err());
    }

    #[test]
    fn test_first_incompatible_pair_in_input_order() {
        let types = [Type::Number, Type::String, Type::Bool];
        let err = unify(&types, Safety::Safe).unwrap_err();
        assert_eq!(
            err.kind(),
            &ConvertErrorKind::UnificationFailure {
                left: Type::Number,
                right: Type::String,
            }
        );
    }

    #[test]
    fn test_order_independent_in_safe_mode() {
        let types = vec![
            Type::set(Type::Number),
            Type::list(Type::Number),
            Type::Dynamic,
            Type::list(Type::Dynamic),
        ];
        let expected = unify(&types, Safety::Safe).unwrap();
        assert_eq!(expected, Type::list(Type::Number));
        for rotation in 1..types.len() {
            let mut permuted = types.clone();
            permuted.rotate_left(rotation);
            assert_eq!(unify(&permuted, Safety::Safe).unwrap(), expected);
            permuted.reverse();
            assert_eq!(unify(&permuted, Safety::Safe).unwrap(), expected);
        }
    }

    #[test]
    fn test_unify_with_conversions() {
        let types = [Type::Number, Type::String, Type::Bool];
        let (ty, conversions) = unify_with_conversions(&types, Safety::Unsafe).unwrap();
        assert_eq!(ty, Type::String);
        assert_eq!(conversions.len(), 3);
        assert_eq!(conversions[0].apply(&Value::from(4)).unwrap(), Value::from("4"));
        assert_eq!(conversions[1].apply(&Value::from("x")).unwrap(), Value::from("x"));
        assert_eq!(conversions[2].apply(&Value::from(true)).unwrap(), Value::from("true"));
    }
}
