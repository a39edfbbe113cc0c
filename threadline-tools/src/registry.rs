//! Capability registry.
//!
//! The registry is populated once at startup and then shared read-only (behind
//! an `Arc`) by the run controller, which forwards its descriptors, and by the
//! event interpreter, which invokes capabilities by name.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use threadline_protocol::ToolDescriptor;
use tracing::debug;

use crate::{
    capability::{BoxedCapability, Capability},
    definition::CapabilityDefinition,
    errors::{CapabilityError, CapabilityResult},
};

/// Named capabilities, kept in registration order.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use threadline_tools::{CapabilityRegistry, EchoCapability};
///
/// let mut registry = CapabilityRegistry::new();
/// registry.register(EchoCapability).unwrap();
///
/// assert!(registry.contains("echo"));
/// assert_eq!(registry.descriptors()[0].name, "echo");
/// ```
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: IndexMap<String, BoxedCapability>,
}

impl CapabilityRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::AlreadyRegistered`] if the name is taken.
    pub fn register<C: Capability + 'static>(&mut self, capability: C) -> Result<(), CapabilityError> {
        self.register_shared(Arc::new(capability))
    }

    /// Register an already shared capability.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::AlreadyRegistered`] if the name is taken.
    pub fn register_shared(&mut self, capability: BoxedCapability) -> Result<(), CapabilityError> {
        let name = capability.name();
        if self.capabilities.contains_key(&name) {
            return Err(CapabilityError::AlreadyRegistered(name));
        }
        self.capabilities.insert(name, capability);
        Ok(())
    }

    /// Register a capability, replacing any existing one with the same name.
    ///
    /// Returns the replaced capability.
    pub fn register_replace<C: Capability + 'static>(&mut self, capability: C) -> Option<BoxedCapability> {
        let name = capability.name();
        self.capabilities.insert(name, Arc::new(capability))
    }

    /// Builder-style registration with replace semantics.
    #[must_use]
    pub fn with<C: Capability + 'static>(mut self, capability: C) -> Self {
        self.register_replace(capability);
        self
    }

    /// Unregister a capability by name.
    pub fn unregister(&mut self, name: &str) -> Option<BoxedCapability> {
        self.capabilities.shift_remove(name)
    }

    /// Definitions of every registered capability, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<CapabilityDefinition> {
        self.capabilities.values().map(|c| c.definition()).collect()
    }

    /// Wire descriptors forwarded at run start.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.capabilities
            .values()
            .map(|c| c.definition().into())
            .collect()
    }

    /// Invoke a capability by name.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::NotFound`] for an unknown name, or whatever
    /// the capability itself returns.
    pub async fn invoke(&self, name: &str, args: JsonValue) -> CapabilityResult {
        let capability = self
            .capabilities
            .get(name)
            .ok_or_else(|| CapabilityError::not_found(name))?;

        debug!(capability = name, "invoking capability");
        capability.invoke(args).await
    }

    /// Check if a capability exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Get a capability by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedCapability> {
        self.capabilities.get(name)
    }

    /// All registered names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }

    /// Get the number of registered capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .finish()
    }
}
