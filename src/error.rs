//! Error types for the flannel operator

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during operator operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required dependency was missing at construction time
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(kube::Error),

    /// Custom resource registration failed
    #[error("resource registration error: {0}")]
    RegistrationError(String),

    /// The watch stream reported a failure or went away
    #[error("watch stream error: {0}")]
    WatchError(String),

    /// Boot retries were exhausted; wraps the terminal attempt error
    #[error("operator boot failed after exhausting retries: {0}")]
    BootFailed(Arc<Error>),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invariant violation that should never happen at runtime
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for operator operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_field() {
        let err = Error::ConfigError("config.back_off must not be empty".to_string());
        assert!(err.to_string().contains("config.back_off"));
    }

    #[test]
    fn test_boot_failed_preserves_cause() {
        let cause = Arc::new(Error::RegistrationError("conflict".to_string()));
        let err = Error::BootFailed(cause);
        assert!(err.to_string().contains("exhausting retries"));
        assert!(err.to_string().contains("conflict"));
    }
}
