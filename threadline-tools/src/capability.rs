//! Core capability trait and closure-backed implementation.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;

use crate::{definition::CapabilityDefinition, errors::CapabilityResult};

/// A locally owned operation the agent may ask the client to perform.
///
/// Capabilities may have side effects outside the transcript (changing the
/// display theme, for example); the value they return is serialized into the
/// tool result message.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use threadline_tools::{Capability, CapabilityDefinition, CapabilityResult};
///
/// struct Clock;
///
/// #[async_trait]
/// impl Capability for Clock {
///     fn definition(&self) -> CapabilityDefinition {
///         CapabilityDefinition::new("now", "Current time in seconds")
///     }
///
///     async fn invoke(&self, _args: Value) -> CapabilityResult {
///         Ok(json!({"seconds": 0}))
///     }
/// }
/// ```
#[async_trait]
pub trait Capability: Send + Sync {
    /// The descriptor advertised to the server.
    fn definition(&self) -> CapabilityDefinition;

    /// Run the capability with decoded arguments.
    async fn invoke(&self, args: JsonValue) -> CapabilityResult;

    /// Get the capability name.
    fn name(&self) -> String {
        self.definition().name
    }
}

/// Type-erased shared capability.
pub type BoxedCapability = Arc<dyn Capability>;

/// A capability backed by an async closure.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use threadline_tools::{Capability, CapabilityError, FunctionCapability, SchemaBuilder};
///
/// let upper = FunctionCapability::new(
///     "upper",
///     "Upper-case a string",
///     SchemaBuilder::new().string("text", "Input", true).build(),
///     |args| async move {
///         let text = args["text"].as_str().unwrap_or_default().to_uppercase();
///         Ok::<_, CapabilityError>(json!({ "text": text }))
///     },
/// );
/// assert_eq!(upper.name(), "upper");
/// ```
pub struct FunctionCapability<F> {
    definition: CapabilityDefinition,
    function: F,
}

impl<F, Fut> FunctionCapability<F>
where
    F: Fn(JsonValue) -> Fut + Send + Sync,
    Fut: Future<Output = CapabilityResult> + Send,
{
    /// Create a new function capability.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: impl Into<JsonValue>,
        function: F,
    ) -> Self {
        Self {
            definition: CapabilityDefinition::new(name, description).with_parameters(parameters),
            function,
        }
    }
}

#[async_trait]
impl<F, Fut> Capability for FunctionCapability<F>
where
    F: Fn(JsonValue) -> Fut + Send + Sync,
    Fut: Future<Output = CapabilityResult> + Send,
{
    fn definition(&self) -> CapabilityDefinition {
        self.definition.clone()
    }

    async fn invoke(&self, args: JsonValue) -> CapabilityResult {
        (self.function)(args).await
    }
}

impl<F> std::fmt::Debug for FunctionCapability<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionCapability")
            .field("name", &self.definition.name)
            .finish()
    }
}
