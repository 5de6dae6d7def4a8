//! # nebula-convert
//!
//! Type conversion, unification and dynamic placeholder resolution for the
//! structural value model used by Nebula configuration.
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_convert::prelude::*;
//!
//! // Tuple of strings into a list of numbers
//! let value = Value::tuple([Value::from("1"), Value::from("2.5")]);
//! let list = convert(&value, &Type::list(Type::Number)).unwrap();
//! assert_eq!(list.ty(), Type::list(Type::Number));
//!
//! // Common type of heterogeneous branches
//! let ty = unify(&[Type::Number, Type::String], Safety::Unsafe).unwrap();
//! assert_eq!(ty, Type::String);
//! ```
//!
//! ## Components
//!
//! - [`types`]: the closed type algebra, including the [`Type::Dynamic`]
//!   placeholder and opaque capsule types
//! - [`value`]: typed values, with null and unknown at every type
//! - [`convert`]: reusable conversions and their safe/unsafe classification
//! - [`unify`]: common supertype of a group of types
//! - [`Converter`]: the same operations behind depth limits and a cache
//!
//! Every error carries a [`Path`] to the failing part of the input value.

// ConvertError carries the offending types and a path; boxing it would add
// an allocation to every failed element conversion.
#![allow(clippy::result_large_err)]

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod path;
pub mod types;
pub mod unify;
pub mod value;

pub use config::ConverterConfig;
pub use convert::{
    Conversion, Safety, conversion_safety, convert, convert_primitive, get_conversion,
    replace_placeholders,
};
pub use engine::Converter;
pub use error::{ConvertError, ConvertErrorKind, ConvertResult};
pub use path::{Path, PathStep};
pub use types::{CapsuleType, ObjectType, PrimitiveType, Type};
pub use unify::{unify, unify_with_conversions};
pub use value::{Capsule, Value};

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Conversion, ConvertError, ConvertResult, Converter, Path, Safety, Type, Value, convert,
        get_conversion, replace_placeholders, unify,
    };
}
