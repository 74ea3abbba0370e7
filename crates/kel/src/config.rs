//! Service configuration.
//!
//! Loaded from a JSON file; every field is optional:
//!
//! ```json
//! { "complexityLimit": 3, "cacheCapacity": 128, "includeStandardLibrary": true }
//! ```

use std::fs;
use std::path::Path;

use kel_resolve::{DEFAULT_COMPLEXITY_LIMIT, ValidationOptions};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Default number of typed ASTs kept by [`crate::ExpressionCache`].
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceConfig {
    /// Nesting depth of loops and filters before a complexity warning
    pub complexity_limit: usize,
    /// Typed ASTs memoized per service; `0` disables caching
    pub cache_capacity: usize,
    /// Install the built-in function library above the scope chain
    pub include_standard_library: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            complexity_limit: DEFAULT_COMPLEXITY_LIMIT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            include_standard_library: true,
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ServiceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ServiceError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            complexity_limit: self.complexity_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{"complexityLimit": 5}"#).unwrap();
        assert_eq!(config.complexity_limit, 5);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(config.include_standard_library);
        assert_eq!(config.validation_options().complexity_limit, 5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<ServiceConfig>(r#"{"complexity": 5}"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ServiceConfig::from_file("/nonexistent/kel.json").unwrap_err();
        assert!(matches!(err, ServiceError::Io { .. }));
    }
}
