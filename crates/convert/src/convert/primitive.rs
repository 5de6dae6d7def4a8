//! Conversions among string, number and bool.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use super::{Conversion, Safety};
use crate::error::{ConvertError, ConvertResult};
use crate::types::{PrimitiveType, Type};
use crate::value::Value;

/// Converts a primitive (or null/unknown) value to `target`.
///
/// - string → number: the text must be a decimal literal;
/// - string → bool: only the exact tokens `true` and `false`;
/// - number/bool → string: always succeeds, numbers render canonically;
/// - number ↔ bool: never.
pub fn convert_primitive(value: &Value, target: PrimitiveType) -> ConvertResult<Value> {
    match value {
        Value::Null(_) => Ok(Value::Null(target.to_type())),
        Value::Unknown(_) => Ok(Value::Unknown(target.to_type())),

        Value::String(text) => match target {
            PrimitiveType::String => Ok(value.clone()),
            PrimitiveType::Number => parse_number(text)
                .map(Value::Number)
                .ok_or_else(|| ConvertError::invalid_literal(target, text.as_str())),
            PrimitiveType::Bool => match text.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(ConvertError::invalid_literal(target, text.as_str())),
            },
        },

        Value::Number(n) => match target {
            PrimitiveType::String => Ok(Value::String(render_number(n))),
            PrimitiveType::Number => Ok(value.clone()),
            PrimitiveType::Bool => Err(ConvertError::incompatible(&Type::Number, &Type::Bool)),
        },

        Value::Bool(b) => match target {
            PrimitiveType::String => Ok(Value::String(b.to_string())),
            PrimitiveType::Bool => Ok(value.clone()),
            PrimitiveType::Number => Err(ConvertError::incompatible(&Type::Bool, &Type::Number)),
        },

        Value::List { .. }
        | Value::Set { .. }
        | Value::Map { .. }
        | Value::Tuple(_)
        | Value::Object(_)
        | Value::Capsule(_) => Err(ConvertError::incompatible(&value.ty(), &target.to_type())),
    }
}

pub(super) fn conversion(from: &Type, to: &Type, safety: Safety) -> Option<Conversion> {
    let from = from.as_primitive()?;
    let to = to.as_primitive()?;
    match primitive_safety(from, to)? {
        Safety::Unsafe if !safety.allows_unsafe() => None,
        Safety::Safe | Safety::Unsafe => {
            Some(Conversion::new(move |value| convert_primitive(value, to)))
        }
    }
}

fn primitive_safety(from: PrimitiveType, to: PrimitiveType) -> Option<Safety> {
    use PrimitiveType::{Bool, Number, String};
    match (from, to) {
        (String, String) | (Number, Number) | (Bool, Bool) => Some(Safety::Safe),
        (Number | Bool, String) => Some(Safety::Safe),
        (String, Number | Bool) => Some(Safety::Unsafe),
        (Number, Bool) | (Bool, Number) => None,
    }
}

/// Parses a decimal literal: optional sign, digits, optional fraction and
/// optional exponent. No whitespace, separators or special values. Any
/// magnitude and precision is accepted.
pub(crate) fn parse_number(text: &str) -> Option<BigDecimal> {
    let well_formed = !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !well_formed {
        return None;
    }
    BigDecimal::from_str(text).ok().map(|n| n.normalized())
}

/// Shortest decimal rendering; no exponent, no trailing zeros.
pub(crate) fn render_number(n: &BigDecimal) -> String {
    n.normalized().to_plain_string()
}
