//! Agent card - the self-describing capability descriptor used for discovery

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Runtime type an agent declares for a context input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    /// Check a context value against this declared type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

/// Human-readable name for a JSON value's runtime type, used in
/// type-mismatch errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declaration for one context input field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
}

impl InputSpec {
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
        }
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
        }
    }
}

/// Declaration of an agent's output artifact shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(rename = "type")]
    pub output_type: String,
    pub schema: Value,
}

/// What an agent can do: declared inputs, output shape, supported actions.
///
/// Inputs use a BTreeMap so validation walks fields in a stable order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub description: String,
    pub inputs: BTreeMap<String, InputSpec>,
    pub outputs: OutputSpec,
    pub actions: Vec<String>,
}

/// The discovery document one agent exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub version: String,
    pub description: String,
    pub capabilities: AgentCapabilities,
    pub protocols: Vec<String>,
    pub authentication: Vec<String>,
}

impl AgentCard {
    pub fn new(name: &str, version: &str, capabilities: AgentCapabilities) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: capabilities.description.clone(),
            capabilities,
            protocols: vec!["a2a".to_string()],
            authentication: vec!["bearer".to_string()],
        }
    }
}
