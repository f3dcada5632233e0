//! Tool Specifications and Invocations
//!
//! Tools are advertised to the remote model as [`ToolSpecification`]s and
//! requested back as [`ToolInvocation`]s, either through the structured
//! `tool_calls` channel or reconstructed from text by the reconciler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Opaque correlation token echoed back by the tool result message
    pub id: String,

    /// Tool identifier (matches a [`ToolSpecification::name`])
    pub name: String,

    /// Raw JSON argument text, passed through verbatim
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Create an invocation with a freshly generated correlation id
    pub fn with_fresh_id(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::new(new_call_id(), name, arguments)
    }

    /// Parse the argument text as JSON
    pub fn arguments_value(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.arguments)
    }
}

/// Generate a correlation id for a tool call the server did not label
pub fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

/// Parameter schema of a tool (JSON Schema object subset)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    /// JSON Schema type, `"object"` when absent
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    /// Property name to property schema, in declaration order
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Names of required properties
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolParameters {
    pub fn object() -> Self {
        Self {
            schema_type: Some("object".into()),
            ..Default::default()
        }
    }

    /// Add an optional property
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Add a required property
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>, schema: Value) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Fraction of declared properties present as keys in `object`
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self, object: &Map<String, Value>) -> f64 {
        if self.properties.is_empty() {
            return 0.0;
        }
        let present = self
            .properties
            .keys()
            .filter(|name| object.contains_key(name.as_str()))
            .count();
        present as f64 / self.properties.len() as f64
    }

    /// Whether every required name is a key of `object`
    pub fn required_present(&self, object: &Map<String, Value>) -> bool {
        self.required
            .iter()
            .all(|name| object.contains_key(name.as_str()))
    }
}

/// Tool definition advertised to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpecification {
    /// Unique tool identifier within one request
    pub name: String,

    /// Human-readable description (shown to LLM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ToolParameters>,
}

impl ToolSpecification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn parameters(mut self, parameters: ToolParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }
}
