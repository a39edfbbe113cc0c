//! # threadline-tools
//!
//! Capabilities a threadline client advertises to the agent and runs locally
//! when the agent calls them.
//!
//! ## Core Concepts
//!
//! - **[`Capability`]**: an async operation with a name, description and
//!   JSON-Schema parameter contract
//! - **[`CapabilityRegistry`]**: the fixed set of capabilities for a client
//! - **[`SchemaBuilder`]**: fluent construction of parameter schemas
//! - **Built-ins**: [`ThemeCapability`] (`setTheme`) and [`EchoCapability`] (`echo`)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use threadline_tools::{default_registry, Theme, ThemeState};
//!
//! # tokio_test_block_on(async {
//! let theme = Arc::new(ThemeState::default());
//! let registry = default_registry(theme.clone());
//!
//! registry
//!     .invoke("setTheme", serde_json::json!({"theme": "dark"}))
//!     .await
//!     .unwrap();
//! assert_eq!(theme.current(), Theme::Dark);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod builtin;
pub mod capability;
pub mod definition;
pub mod errors;
pub mod registry;
pub mod schema;

pub use builtin::{
    default_registry, EchoCapability, Theme, ThemeCapability, ThemeSink, ThemeState,
};
pub use capability::{BoxedCapability, Capability, FunctionCapability};
pub use definition::CapabilityDefinition;
pub use errors::{CapabilityError, CapabilityResult};
pub use registry::CapabilityRegistry;
pub use schema::SchemaBuilder;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Capability, CapabilityDefinition, CapabilityError, CapabilityRegistry, CapabilityResult,
        FunctionCapability, SchemaBuilder,
    };
}
