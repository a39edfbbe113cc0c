//! Display theme capability.
//!
//! The capability never touches UI state directly. It writes through a
//! [`ThemeSink`]; [`ThemeState`] is the in-process sink that rendering code
//! can observe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::{
    capability::Capability,
    definition::CapabilityDefinition,
    errors::{CapabilityError, CapabilityResult},
    schema::SchemaBuilder,
};

/// Available display themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
    /// Cupcake theme.
    Cupcake,
}

impl Theme {
    /// Every theme, in advertised order.
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::Cupcake];

    /// The theme's name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Cupcake => "cupcake",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or_else(|| CapabilityError::invalid_args(format!("unknown theme '{}'", s)))
    }
}

/// Receiver of theme changes.
#[cfg_attr(test, mockall::automock)]
pub trait ThemeSink: Send + Sync {
    /// Apply a theme.
    fn set_theme(&self, theme: Theme);
}

/// Observable current theme.
#[derive(Debug)]
pub struct ThemeState {
    tx: watch::Sender<Theme>,
}

impl ThemeState {
    /// Create a state holding `initial`.
    #[must_use]
    pub fn new(initial: Theme) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// The current theme.
    #[must_use]
    pub fn current(&self) -> Theme {
        *self.tx.borrow()
    }

    /// Watch for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.tx.subscribe()
    }
}

impl Default for ThemeState {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl ThemeSink for ThemeState {
    fn set_theme(&self, theme: Theme) {
        self.tx.send_replace(theme);
    }
}

#[derive(Deserialize)]
struct SetThemeArgs {
    theme: String,
}

/// The `setTheme` capability.
pub struct ThemeCapability {
    sink: Arc<dyn ThemeSink>,
}

impl ThemeCapability {
    /// Capability name.
    pub const NAME: &'static str = "setTheme";

    /// Create the capability writing to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn ThemeSink>) -> Self {
        Self { sink }
    }
}

impl std::fmt::Debug for ThemeCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeCapability").finish_non_exhaustive()
    }
}

#[async_trait]
impl Capability for ThemeCapability {
    fn definition(&self) -> CapabilityDefinition {
        let names: Vec<&str> = Theme::ALL.iter().map(Theme::as_str).collect();
        CapabilityDefinition::new(
            Self::NAME,
            "Set the theme for the application. Available themes: light, dark, cupcake.",
        )
        .with_parameters(
            SchemaBuilder::new()
                .enum_values("theme", "The theme to set for the application", &names, true)
                .build(),
        )
    }

    async fn invoke(&self, args: JsonValue) -> CapabilityResult {
        let args: SetThemeArgs = serde_json::from_value(args)
            .map_err(|e| CapabilityError::invalid_args(e.to_string()))?;
        let theme: Theme = args.theme.parse()?;

        info!(%theme, "theme changed");
        self.sink.set_theme(theme);
        Ok(json!({ "theme": theme }))
    }
}
