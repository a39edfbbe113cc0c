//! JSON schema construction for capability parameters.

use indexmap::IndexMap;
use serde_json::{json, Map, Value as JsonValue};

/// Fluent builder for an object parameter schema.
///
/// # Example
///
/// ```rust
/// use threadline_tools::SchemaBuilder;
///
/// let schema = SchemaBuilder::new()
///     .enum_values("theme", "Theme to apply", &["light", "dark"], true)
///     .build();
/// assert_eq!(schema["required"][0], "theme");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    properties: IndexMap<String, JsonValue>,
    required: Vec<String>,
    description: Option<String>,
}

impl SchemaBuilder {
    /// Create a new empty schema builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string property.
    #[must_use]
    pub fn string(self, name: &str, desc: &str, required: bool) -> Self {
        self.typed(name, "string", desc, required)
    }

    /// Add an integer property.
    #[must_use]
    pub fn integer(self, name: &str, desc: &str, required: bool) -> Self {
        self.typed(name, "integer", desc, required)
    }

    /// Add a number property.
    #[must_use]
    pub fn number(self, name: &str, desc: &str, required: bool) -> Self {
        self.typed(name, "number", desc, required)
    }

    /// Add a boolean property.
    #[must_use]
    pub fn boolean(self, name: &str, desc: &str, required: bool) -> Self {
        self.typed(name, "boolean", desc, required)
    }

    /// Add a string property restricted to fixed values.
    #[must_use]
    pub fn enum_values(self, name: &str, desc: &str, values: &[&str], required: bool) -> Self {
        self.raw(
            name,
            json!({
                "type": "string",
                "description": desc,
                "enum": values
            }),
            required,
        )
    }

    /// Add a raw JSON property.
    #[must_use]
    pub fn raw(mut self, name: &str, schema: JsonValue, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required && !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    /// Set the schema description.
    #[must_use]
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Build the schema.
    #[must_use]
    pub fn build(self) -> JsonValue {
        let mut schema = Map::new();
        schema.insert("type".into(), JsonValue::from("object"));
        schema.insert(
            "properties".into(),
            JsonValue::Object(self.properties.into_iter().collect()),
        );
        if !self.required.is_empty() {
            schema.insert("required".into(), JsonValue::from(self.required));
        }
        if let Some(desc) = self.description {
            schema.insert("description".into(), JsonValue::from(desc));
        }
        JsonValue::Object(schema)
    }

    fn typed(self, name: &str, ty: &str, desc: &str, required: bool) -> Self {
        self.raw(name, json!({ "type": ty, "description": desc }), required)
    }
}
