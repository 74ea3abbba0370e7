//! Service-level failures.
//!
//! Semantic problems in an expression are never errors here; they come back
//! as [`kel_resolve::Diagnostic`]s. A [`ServiceError`] means the service
//! could not be built or could not run at all.

use std::io;
use std::path::PathBuf;

use kel_resolve::{FactoryError, GenerationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Registry or scope payload could not be decoded.
    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// The scope graph violates a generation precondition.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize output: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_error_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ServiceError::Serialize(source);
        assert!(err.to_string().starts_with("failed to serialize output: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
