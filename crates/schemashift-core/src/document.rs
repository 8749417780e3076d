//! Declarative document contract.
//!
//! A document lists named object declarations that columns of a realm refer to
//! by name. It is the input of type resolution.

use jsonschema::JSONSchema;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Parsed declarative document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<FeatureDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequences: Vec<FeatureDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<FeatureDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<FeatureDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_triggers: Vec<FeatureDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregates: Vec<FeatureDecl>,
}

impl Document {
    /// Validate `json` against the document JSON Schema, then decode it.
    pub fn from_json(json: &Value) -> Result<Self> {
        validate_document_json(json)?;
        serde_json::from_value(json.clone()).map_err(|err| Error::InvalidDocument(err.to_string()))
    }
}

/// Enum declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumDecl {
    pub name: String,
    pub schema: SchemaRef,
    pub values: Vec<String>,
}

/// Declaration of a feature only some builds convert (domain, sequence, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub definition: Value,
}

/// Reference to a schema: `$schema.<name>`, `schema.<name>` or `<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SchemaRef(pub String);

impl SchemaRef {
    /// Reference in canonical `$schema.<name>` form.
    pub fn named(name: &str) -> Self {
        SchemaRef(format!("$schema.{name}"))
    }

    /// Extract the referenced schema name.
    pub fn schema_name(&self) -> Result<&str> {
        let raw = self.0.trim();
        let name = raw
            .strip_prefix("$schema.")
            .or_else(|| raw.strip_prefix("schema."))
            .unwrap_or(raw);
        if name.is_empty() || name.contains('.') || name.starts_with('$') {
            return Err(Error::InvalidReference(format!(
                "cannot extract schema name from reference {:?}",
                self.0
            )));
        }
        Ok(name)
    }
}

/// Validate a document JSON value against the schema derived from [`Document`].
pub fn validate_document_json(json: &Value) -> Result<()> {
    let schema = serde_json::to_value(schema_for!(Document))
        .map_err(|err| Error::Internal(err.to_string()))?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| Error::Internal(err.to_string()))?;

    if let Err(errors) = compiled.validate(json) {
        let messages: Vec<String> = errors
            .map(|err| {
                let path = err.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("{path}: {err}")
            })
            .collect();
        return Err(Error::InvalidDocument(messages.join("; ")));
    }
    Ok(())
}
