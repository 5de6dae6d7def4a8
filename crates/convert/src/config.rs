//! Converter configuration
//!
//! Limits and cache sizing for [`Converter`](crate::Converter). Every field
//! has a default, so a partial document deserializes cleanly.

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, ConvertResult};
use crate::types::Type;

/// Configuration for a [`Converter`](crate::Converter).
///
/// # Example
///
/// ```
/// use nebula_convert::ConverterConfig;
///
/// let config = ConverterConfig::default();
/// assert_eq!(config.max_type_depth, 100);
///
/// let strict = ConverterConfig::strict();
/// assert_eq!(strict.max_type_depth, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Maximum number of memoized conversions; 0 disables the cache
    pub cache_capacity: u64,

    /// Maximum nesting depth of any type handed to the converter
    pub max_type_depth: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1024,
            max_type_depth: 100,
        }
    }
}

impl ConverterConfig {
    /// Tight limits for types derived from untrusted input
    pub fn strict() -> Self {
        Self {
            cache_capacity: 256,
            max_type_depth: 32,
        }
    }

    /// Generous limits for trusted environments
    pub fn permissive() -> Self {
        Self {
            cache_capacity: 16_384,
            max_type_depth: 256,
        }
    }

    /// Validate type nesting depth
    #[inline]
    pub fn check_type_depth(&self, ty: &Type) -> ConvertResult<()> {
        let depth = ty.depth();
        if depth > self.max_type_depth {
            Err(ConvertError::depth_limit(self.max_type_depth, depth))
        } else {
            Ok(())
        }
    }
}
