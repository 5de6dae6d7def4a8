//! Conversion between structural types
//!
//! A [`Conversion`] is built once per `(source type, target type, safety)`
//! triple by [`get_conversion`] and can then be applied to any number of
//! values. Building inspects only types; applying inspects only values.
//!
//! ## Safety
//!
//! Safe conversions never lose information (number to string, set to
//! list). Unsafe conversions may fail on particular data or discard order
//! and duplicates (string to number, list to set, map to object).
//! [`convert`] always permits unsafe conversions.
//!
//! ## Null and unknown values
//!
//! A null converts to a null of the target type and an unknown to an
//! unknown of the target type. Element conversions are never run for
//! them, but the shape check on the *types* (tuple arity, attribute names)
//! still happens when the conversion is built.

mod collection;
pub(crate) mod dynamic;
pub(crate) mod mismatch;
mod primitive;
mod structural;

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{ConvertError, ConvertResult};
use crate::path::{Path, PathStep};
use crate::types::Type;
use crate::unify::unify;
use crate::value::Value;

pub use dynamic::replace_placeholders;
pub use primitive::convert_primitive;

/// Whether a conversion may lose information or fail on valid data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Safety {
    Safe,
    Unsafe,
}

impl Safety {
    pub const fn allows_unsafe(self) -> bool {
        matches!(self, Self::Unsafe)
    }
}

type ConvertFn = dyn Fn(&Value) -> ConvertResult<Value> + Send + Sync;

/// A reusable conversion from values of one type to another.
///
/// Cheap to clone; safe to share between threads.
#[derive(Clone)]
pub struct Conversion {
    inner: Arc<ConvertFn>,
}

impl Conversion {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> ConvertResult<Value> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Returns its input unchanged.
    pub fn identity() -> Self {
        Self::new(|value| Ok(value.clone()))
    }

    /// Converts `value`. Error paths are relative to `value`.
    pub fn apply(&self, value: &Value) -> ConvertResult<Value> {
        (self.inner)(value)
    }

    /// Converts `value`, which sits at `outer` inside some larger value.
    /// Error paths are relative to that larger value.
    pub fn apply_at(&self, value: &Value, outer: &Path) -> ConvertResult<Value> {
        self.apply(value).map_err(|e| e.rebased(outer))
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion").finish_non_exhaustive()
    }
}

/// Converts `value` to type `want`, permitting unsafe conversions.
///
/// ```rust
/// use nebula_convert::{convert, Type, Value};
///
/// let v = convert(&Value::from("42"), &Type::Number).unwrap();
/// assert_eq!(v, Value::from(42));
/// ```
pub fn convert(value: &Value, want: &Type) -> ConvertResult<Value> {
    let from = value.ty();
    if &from == want {
        return Ok(value.clone());
    }
    match get_conversion(&from, want, Safety::Unsafe) {
        Some(conversion) => conversion.apply(value),
        None => Err(mismatch::explain(&from, want)),
    }
}

/// Builds a conversion from `from` to `to`, or `None` if none exists in
/// the given mode.
pub fn get_conversion(from: &Type, to: &Type, safety: Safety) -> Option<Conversion> {
    let known = conversion_for_known(from, to, safety)?;
    if to.is_dynamic() || from.is_dynamic() {
        // Passthrough and deferred fixup deal with null and unknown themselves.
        return Some(known);
    }
    let target = to.without_optional_attributes_deep();
    Some(Conversion::new(move |value| match value {
        Value::Unknown(ty) => Ok(Value::Unknown(replace_placeholders(ty, &target)?)),
        Value::Null(ty) => Ok(Value::Null(replace_placeholders(ty, &target)?)),
        _ => known.apply(value),
    }))
}

/// The best mode in which `from` converts to `to`, if any.
pub fn conversion_safety(from: &Type, to: &Type) -> Option<Safety> {
    if conversion_for_known(from, to, Safety::Safe).is_some() {
        Some(Safety::Safe)
    } else if conversion_for_known(from, to, Safety::Unsafe).is_some() {
        Some(Safety::Unsafe)
    } else {
        None
    }
}

/// Dispatch on the (target, source) variant pair. Both matches are
/// exhaustive so a new variant cannot fall into an existing arm unnoticed.
fn conversion_for_known(from: &Type, to: &Type, safety: Safety) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::identity());
    }

    match to {
        Type::Dynamic => Some(dynamic::passthrough()),

        Type::String | Type::Number | Type::Bool => match from {
            Type::Dynamic => Some(dynamic::fixup(to)),
            Type::String | Type::Number | Type::Bool => primitive::conversion(from, to, safety),
            Type::List(_)
            | Type::Set(_)
            | Type::Map(_)
            | Type::Tuple(_)
            | Type::Object(_)
            | Type::Capsule(_) => None,
        },

        Type::List(to_ety) => match from {
            Type::Dynamic => Some(dynamic::fixup(to)),
            Type::List(from_ety) | Type::Set(from_ety) => {
                collection::to_list(from_ety, to_ety, safety)
            }
            Type::Tuple(from_etys) => collection::tuple_to_list(from_etys, to_ety, safety),
            Type::String
            | Type::Number
            | Type::Bool
            | Type::Map(_)
            | Type::Object(_)
            | Type::Capsule(_) => None,
        },

        Type::Set(to_ety) => match from {
            Type::Dynamic => Some(dynamic::fixup(to)),
            Type::Set(from_ety) => collection::to_set(from_ety, to_ety, safety),
            // Order and duplicate count are discarded.
            Type::List(from_ety) => {
                if safety.allows_unsafe() {
                    collection::to_set(from_ety, to_ety, safety)
                } else {
                    None
                }
            }
            Type::Tuple(from_etys) => {
                if safety.allows_unsafe() {
                    collection::tuple_to_set(from_etys, to_ety, safety)
                } else {
                    None
                }
            }
            Type::String
            | Type::Number
            | Type::Bool
            | Type::Map(_)
            | Type::Object(_)
            | Type::Capsule(_) => None,
        },

        Type::Map(to_ety) => match from {
            Type::Dynamic => Some(dynamic::fixup(to)),
            Type::Map(from_ety) => collection::map_to_map(from_ety, to_ety, safety),
            Type::Object(from_obj) => structural::object_to_map(from_obj, to_ety, safety),
            Type::String
            | Type::Number
            | Type::Bool
            | Type::List(_)
            | Type::Set(_)
            | Type::Tuple(_)
            | Type::Capsule(_) => None,
        },

        Type::Tuple(to_etys) => match from {
            Type::Dynamic => Some(dynamic::fixup(to)),
            Type::Tuple(from_etys) => structural::tuple_to_tuple(from_etys, to_etys, safety),
            Type::String
            | Type::Number
            | Type::Bool
            | Type::List(_)
            | Type::Set(_)
            | Type::Map(_)
            | Type::Object(_)
            | Type::Capsule(_) => None,
        },

        Type::Object(to_obj) => match from {
            Type::Dynamic => Some(dynamic::fixup(to)),
            Type::Object(from_obj) => structural::object_to_object(from_obj, to_obj, safety),
            // Map keys are only known once there is data.
            Type::Map(from_ety) => {
                if safety.allows_unsafe() {
                    structural::map_to_object(from_ety, to_obj, safety)
                } else {
                    None
                }
            }
            Type::String
            | Type::Number
            | Type::Bool
            | Type::List(_)
            | Type::Set(_)
            | Type::Tuple(_)
            | Type::Capsule(_) => None,
        },

        // Equal capsule types were handled above.
        Type::Capsule(_) => match from {
            Type::Dynamic => Some(dynamic::fixup(to)),
            Type::String
            | Type::Number
            | Type::Bool
            | Type::List(_)
            | Type::Set(_)
            | Type::Map(_)
            | Type::Tuple(_)
            | Type::Object(_)
            | Type::Capsule(_) => None,
        },
    }
}

/// Applies the paired conversion to each value, attributing failures to
/// `step(i)`.
fn convert_each<'a>(
    values: impl IntoIterator<Item = &'a Value>,
    conversions: impl IntoIterator<Item = &'a Conversion>,
    step: impl Fn(usize) -> PathStep,
) -> ConvertResult<Vec<Value>> {
    values
        .into_iter()
        .zip(conversions)
        .enumerate()
        .map(|(i, (value, conversion))| conversion.apply(value).map_err(|e| e.within(step(i))))
        .collect()
}

/// Decides the element type of a freshly converted collection.
///
/// When `declared` is free of placeholders every item already has that
/// type. Otherwise items may have come out with different types, so they
/// are unified and converted once more.
fn settle_elements(
    items: Vec<Value>,
    declared: &Type,
    step: impl Fn(usize) -> PathStep,
) -> ConvertResult<(Type, Vec<Value>)> {
    if !declared.has_dynamic() {
        return Ok((declared.without_optional_attributes_deep(), items));
    }

    let types: Vec<Type> = items.iter().map(Value::ty).collect();
    let Some(first) = types.first() else {
        return Ok((declared.without_optional_attributes_deep(), items));
    };
    if types.iter().all(|ty| ty == first) {
        return Ok((first.clone(), items));
    }

    let element = unify(&types, Safety::Unsafe)?;
    trace!(%declared, %element, "unified heterogeneous collection elements");
    let items = items
        .iter()
        .enumerate()
        .map(|(i, item)| convert(item, &element).map_err(|e| e.within(step(i))))
        .collect::<ConvertResult<Vec<_>>>()?;
    Ok((element, items))
}

/// A conversion was applied to a value whose shape does not match the
/// source type it was built for.
fn shape_fault(expected: &str, value: &Value) -> ConvertError {
    ConvertError::internal(format!(
        "conversion built for a {expected} was applied to a value of type {}",
        value.ty()
    ))
}
