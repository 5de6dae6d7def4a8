//! Error types for conversion and unification
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. Every error
//! carries a [`Path`] locating the failing sub-value relative to the value
//! handed to the outermost conversion.

use thiserror::Error;

use crate::path::{Path, PathStep};
use crate::types::{PrimitiveType, Type};

/// Result alias used throughout the crate.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// What went wrong, independent of where.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertErrorKind {
    /// No conversion path exists between the two types
    #[error("cannot convert {from} to {to}")]
    IncompatibleType { from: Type, to: Type },

    /// Text does not parse as the requested primitive
    #[error("a {target} is required, but {text:?} is not a valid {target}")]
    InvalidPrimitiveLiteral { target: PrimitiveType, text: String },

    /// Tuple lengths differ
    #[error("tuple of {expected} elements required, but have {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Source has an attribute or key the target object does not declare
    #[error("unsupported attribute {name:?}")]
    UnsupportedAttribute { name: String },

    /// Target object requires an attribute the source does not provide
    #[error("attribute {name:?} is required")]
    MissingRequiredAttribute { name: String },

    /// First pair of input types, in input order, with no common type
    #[error("no common type for {left} and {right}")]
    UnificationFailure { left: Type, right: Type },

    /// Unification was asked to combine zero types
    #[error("cannot unify an empty set of types")]
    EmptyUnification,

    /// The caller broke a precondition (e.g. types not convert-compatible)
    #[error("internal consistency fault: {message}")]
    InternalConsistencyFault { message: String },

    /// Type nesting exceeds the configured limit
    #[error("type nesting depth {depth} exceeds maximum of {limit}")]
    DepthLimitExceeded { limit: usize, depth: usize },
}

/// A [`ConvertErrorKind`] attributed to a location inside the converted value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{}", location(.path), .kind)]
pub struct ConvertError {
    kind: ConvertErrorKind,
    path: Path,
}

fn location(path: &Path) -> String {
    if path.is_root() {
        String::new()
    } else {
        format!("{path}: ")
    }
}

impl ConvertError {
    pub fn new(kind: ConvertErrorKind) -> Self {
        Self {
            kind,
            path: Path::root(),
        }
    }

    pub fn kind(&self) -> &ConvertErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get error code for categorization
    pub fn code(&self) -> &'static str {
        match self.kind {
            ConvertErrorKind::IncompatibleType { .. } => "CONVERT:INCOMPATIBLE_TYPE",
            ConvertErrorKind::InvalidPrimitiveLiteral { .. } => "CONVERT:INVALID_LITERAL",
            ConvertErrorKind::ArityMismatch { .. } => "CONVERT:ARITY_MISMATCH",
            ConvertErrorKind::UnsupportedAttribute { .. } => "CONVERT:UNSUPPORTED_ATTR",
            ConvertErrorKind::MissingRequiredAttribute { .. } => "CONVERT:MISSING_ATTR",
            ConvertErrorKind::UnificationFailure { .. } => "CONVERT:UNIFY",
            ConvertErrorKind::EmptyUnification => "CONVERT:UNIFY_EMPTY",
            ConvertErrorKind::InternalConsistencyFault { .. } => "CONVERT:INTERNAL",
            ConvertErrorKind::DepthLimitExceeded { .. } => "CONVERT:DEPTH_LIMIT",
        }
    }

    /// True for caller precondition violations rather than data-dependent failures.
    pub fn is_internal_fault(&self) -> bool {
        matches!(self.kind, ConvertErrorKind::InternalConsistencyFault { .. })
    }

    /// Makes the error relative to the value enclosing the failing one.
    pub fn within(mut self, step: PathStep) -> Self {
        self.path.prepend(step);
        self
    }

    /// Makes the error relative to a value `outer` steps further out.
    pub fn rebased(mut self, outer: &Path) -> Self {
        self.path.rebase(outer);
        self
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    pub fn incompatible(from: &Type, to: &Type) -> Self {
        Self::new(ConvertErrorKind::IncompatibleType {
            from: from.clone(),
            to: to.clone(),
        })
    }

    pub fn invalid_literal(target: PrimitiveType, text: impl Into<String>) -> Self {
        Self::new(ConvertErrorKind::InvalidPrimitiveLiteral {
            target,
            text: text.into(),
        })
    }

    pub fn arity_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ConvertErrorKind::ArityMismatch { expected, actual })
    }

    pub fn unsupported_attribute(name: impl Into<String>) -> Self {
        Self::new(ConvertErrorKind::UnsupportedAttribute { name: name.into() })
    }

    pub fn missing_attribute(name: impl Into<String>) -> Self {
        Self::new(ConvertErrorKind::MissingRequiredAttribute { name: name.into() })
    }

    pub fn unification_failure(left: &Type, right: &Type) -> Self {
        Self::new(ConvertErrorKind::UnificationFailure {
            left: left.clone(),
            right: right.clone(),
        })
    }

    pub fn empty_unification() -> Self {
        Self::new(ConvertErrorKind::EmptyUnification)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ConvertErrorKind::InternalConsistencyFault {
            message: message.into(),
        })
    }

    pub fn depth_limit(limit: usize, depth: usize) -> Self {
        Self::new(ConvertErrorKind::DepthLimitExceeded { limit, depth })
    }
}
