//! Capability error types.

use thiserror::Error;

/// Errors raised while registering or invoking a capability.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// No capability with this name is registered.
    #[error("Capability not found: {0}")]
    NotFound(String),

    /// A capability with this name is already registered.
    #[error("Capability '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The arguments do not match the capability's parameter contract.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The capability ran and failed.
    #[error("Capability execution failed: {0}")]
    ExecutionFailed(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CapabilityError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create an execution failure.
    #[must_use]
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}

/// Result of invoking a capability.
pub type CapabilityResult = Result<serde_json::Value, CapabilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CapabilityError::not_found("setTheme").to_string(),
            "Capability not found: setTheme"
        );
        assert_eq!(
            CapabilityError::invalid_args("missing `theme`").to_string(),
            "Invalid arguments: missing `theme`"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: CapabilityError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.to_string(), "disk full");
    }
}
