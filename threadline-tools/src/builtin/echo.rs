//! Echo capability, handy for exercising tool-call round trips.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::{
    capability::Capability,
    definition::CapabilityDefinition,
    errors::{CapabilityError, CapabilityResult},
    schema::SchemaBuilder,
};

#[derive(Deserialize)]
struct EchoArgs {
    message: String,
}

/// Returns the `message` argument as `{"echo": message}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoCapability;

impl EchoCapability {
    /// Capability name.
    pub const NAME: &'static str = "echo";
}

#[async_trait]
impl Capability for EchoCapability {
    fn definition(&self) -> CapabilityDefinition {
        CapabilityDefinition::new(Self::NAME, "Returns back the `message` you provide")
            .with_parameters(
                SchemaBuilder::new()
                    .string("message", "The text to echo back", true)
                    .build(),
            )
    }

    async fn invoke(&self, args: JsonValue) -> CapabilityResult {
        let EchoArgs { message } = serde_json::from_value(args)
            .map_err(|e| CapabilityError::invalid_args(e.to_string()))?;
        Ok(json!({ "echo": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo() {
        let result = EchoCapability
            .invoke(json!({"message": "ping"}))
            .await
            .unwrap();
        assert_eq!(result, json!({"echo": "ping"}));
    }

    #[tokio::test]
    async fn test_echo_requires_message() {
        assert!(EchoCapability.invoke(json!({"text": "ping"})).await.is_err());
    }
}
