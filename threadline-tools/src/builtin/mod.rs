//! Capabilities shipped with threadline.

mod echo;
mod theme;

use std::sync::Arc;

pub use echo::EchoCapability;
pub use theme::{Theme, ThemeCapability, ThemeSink, ThemeState};

use crate::registry::CapabilityRegistry;

/// A registry holding `setTheme` (writing to `theme_sink`) and `echo`.
#[must_use]
pub fn default_registry(theme_sink: Arc<dyn ThemeSink>) -> CapabilityRegistry {
    CapabilityRegistry::new()
        .with(ThemeCapability::new(theme_sink))
        .with(EchoCapability)
}
