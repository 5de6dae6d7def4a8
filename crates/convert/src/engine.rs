//! Conversion engine with caching support
//!
//! [`Converter`] wraps the free functions of this crate with configured
//! depth limits and, with the `cache` feature, memoizes built conversions
//! per `(source, target, safety)` triple. Memoization never changes a
//! result; a cached `None` means "no conversion" just like a fresh one.

use tracing::{debug, trace};

use crate::config::ConverterConfig;
use crate::convert::{Conversion, Safety, get_conversion, mismatch, replace_placeholders};
use crate::error::ConvertResult;
use crate::types::Type;
use crate::unify::{unify, unify_with_conversions};
use crate::value::Value;

#[cfg(feature = "cache")]
type ConversionCache = moka::sync::Cache<(Type, Type, Safety), Option<Conversion>>;

/// Conversion engine holding limits and an optional conversion cache.
///
/// Cheap to share: every method takes `&self`.
pub struct Converter {
    config: ConverterConfig,
    #[cfg(feature = "cache")]
    cache: Option<ConversionCache>,
}

impl Converter {
    /// Create a converter with default configuration
    pub fn new() -> Self {
        Self::from_config(ConverterConfig::default())
    }

    pub fn from_config(config: ConverterConfig) -> Self {
        #[cfg(feature = "cache")]
        let cache = (config.cache_capacity > 0).then(|| {
            debug!(cache_size = config.cache_capacity, "Created converter with cache");
            moka::sync::Cache::builder()
                .max_capacity(config.cache_capacity)
                .build()
        });

        Self {
            config,
            #[cfg(feature = "cache")]
            cache,
        }
    }

    /// Create a converter with a cache of the specified size
    pub fn with_cache_size(size: u64) -> Self {
        Self::from_config(ConverterConfig {
            cache_capacity: size,
            ..ConverterConfig::default()
        })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds (or fetches) the conversion from `from` to `to`.
    pub fn conversion(
        &self,
        from: &Type,
        to: &Type,
        safety: Safety,
    ) -> ConvertResult<Option<Conversion>> {
        self.config.check_type_depth(from)?;
        self.config.check_type_depth(to)?;
        Ok(self.lookup(from, to, safety))
    }

    #[cfg(feature = "cache")]
    fn lookup(&self, from: &Type, to: &Type, safety: Safety) -> Option<Conversion> {
        match &self.cache {
            Some(cache) => cache.get_with((from.clone(), to.clone(), safety), || {
                trace!(%from, %to, ?safety, "Building conversion");
                get_conversion(from, to, safety)
            }),
            None => get_conversion(from, to, safety),
        }
    }

    #[cfg(not(feature = "cache"))]
    fn lookup(&self, from: &Type, to: &Type, safety: Safety) -> Option<Conversion> {
        get_conversion(from, to, safety)
    }

    /// Converts `value` to `want`, permitting unsafe conversions.
    pub fn convert(&self, value: &Value, want: &Type) -> ConvertResult<Value> {
        let from = value.ty();
        trace!(from = %from, to = %want, "Converting value");
        if &from == want {
            return Ok(value.clone());
        }
        match self.conversion(&from, want, Safety::Unsafe)? {
            Some(conversion) => conversion.apply(value),
            None => {
                let err = mismatch::explain(&from, want);
                debug!(from = %from, to = %want, error = %err, "No conversion available");
                Err(err)
            }
        }
    }

    pub fn unify(&self, types: &[Type], safety: Safety) -> ConvertResult<Type> {
        self.check_all(types)?;
        unify(types, safety)
    }

    pub fn unify_with_conversions(
        &self,
        types: &[Type],
        safety: Safety,
    ) -> ConvertResult<(Type, Vec<Conversion>)> {
        self.check_all(types)?;
        unify_with_conversions(types, safety)
    }

    pub fn replace_placeholders(&self, input: &Type, declared: &Type) -> ConvertResult<Type> {
        self.config.check_type_depth(input)?;
        self.config.check_type_depth(declared)?;
        replace_placeholders(input, declared)
    }

    /// Clear the cache (if caching is enabled)
    #[cfg(feature = "cache")]
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            cache.run_pending_tasks();
            debug!("Conversion cache cleared");
        }
    }

    #[cfg(not(feature = "cache"))]
    pub fn clear_cache(&self) {}

    /// Number of memoized conversions; always 0 without a cache
    #[cfg(feature = "cache")]
    pub fn cached_conversions(&self) -> u64 {
        self.cache.as_ref().map_or(0, |cache| {
            cache.run_pending_tasks();
            cache.entry_count()
        })
    }

    #[cfg(not(feature = "cache"))]
    pub fn cached_conversions(&self) -> u64 {
        0
    }

    fn check_all(&self, types: &[Type]) -> ConvertResult<()> {
        types.iter().try_for_each(|ty| self.config.check_type_depth(ty))
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}
