//! Capability descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use threadline_protocol::ToolDescriptor;

use crate::schema::SchemaBuilder;

/// Name, description and parameter contract of a capability.
///
/// This is what the server sees at run start; it serializes to the AG-UI
/// tool shape `{name, description, parameters}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    /// Capability name, matched against `toolCallName`.
    pub name: String,
    /// Human-readable description for the agent.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: JsonValue,
}

impl CapabilityDefinition {
    /// Create a definition that takes no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: SchemaBuilder::new().build(),
        }
    }

    /// Set the parameters schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: impl Into<JsonValue>) -> Self {
        self.parameters = schema.into();
        self
    }

    /// The wire descriptor forwarded at run start.
    #[must_use]
    pub fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

impl From<CapabilityDefinition> for ToolDescriptor {
    fn from(def: CapabilityDefinition) -> Self {
        Self {
            name: def.name,
            description: def.description,
            parameters: def.parameters,
        }
    }
}
