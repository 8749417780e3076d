use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use serde::{Deserialize, Serialize};

use crate::types::{ObjectKey, ObjectKind};

/// Schema-level definition that is neither a table nor a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObjectRecord", into = "ObjectRecord")]
pub enum Object {
    Enum(EnumType),
    /// Object of a kind this build carries but does not interpret.
    Other(OpaqueObject),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Enum(_) => ObjectKind::Enum,
            Object::Other(other) => other.kind.clone(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Object::Enum(e) => &e.name,
            Object::Other(other) => &other.name,
        }
    }

    /// Name of the owning schema.
    pub fn schema(&self) -> &str {
        match self {
            Object::Enum(e) => &e.schema,
            Object::Other(other) => &other.schema,
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.schema(), self.kind(), self.name())
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            Object::Enum(e) => Some(e),
            Object::Other(_) => None,
        }
    }
}

impl From<EnumType> for Object {
    fn from(value: EnumType) -> Self {
        Object::Enum(value)
    }
}

impl JsonSchema for Object {
    fn schema_name() -> String {
        "Object".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> schemars::schema::Schema {
        ObjectRecord::json_schema(generator)
    }
}

/// Postgres enum type. Value order is part of the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumType {
    pub name: String,
    pub schema: String,
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(schema: impl Into<String>, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            schema: schema.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Object kept verbatim: kind tag, identity and raw definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OpaqueObject {
    pub kind: ObjectKind,
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub definition: serde_json::Value,
}

/// Flat on-disk shape of an [`Object`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ObjectRecord {
    kind: ObjectKind,
    name: String,
    schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    definition: serde_json::Value,
}

impl TryFrom<ObjectRecord> for Object {
    type Error = String;

    fn try_from(record: ObjectRecord) -> Result<Self, Self::Error> {
        match record.kind {
            ObjectKind::Enum => {
                let values = record
                    .values
                    .ok_or_else(|| format!("enum {:?} has no values", record.name))?;
                Ok(Object::Enum(EnumType {
                    name: record.name,
                    schema: record.schema,
                    values,
                }))
            }
            kind => Ok(Object::Other(OpaqueObject {
                kind,
                name: record.name,
                schema: record.schema,
                definition: record.definition,
            })),
        }
    }
}

impl From<Object> for ObjectRecord {
    fn from(object: Object) -> Self {
        match object {
            Object::Enum(e) => ObjectRecord {
                kind: ObjectKind::Enum,
                name: e.name,
                schema: e.schema,
                values: Some(e.values),
                definition: serde_json::Value::Null,
            },
            Object::Other(other) => ObjectRecord {
                kind: other.kind,
                name: other.name,
                schema: other.schema,
                values: None,
                definition: other.definition,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kinds_deserialize_as_opaque() {
        let json = serde_json::json!({
            "kind": "domain",
            "name": "email",
            "schema": "public",
            "definition": {"base": "text"}
        });
        let object: Object = serde_json::from_value(json).unwrap();
        assert_eq!(object.kind(), ObjectKind::Domain);
        assert_eq!(object.name(), "email");
        assert!(object.as_enum().is_none());
    }

    #[test]
    fn enums_round_trip_with_kind_tag() {
        let object = Object::Enum(EnumType::new("public", "mood", ["sad", "ok"]));
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["kind"], "enum");
        assert_eq!(json["values"], serde_json::json!(["sad", "ok"]));
        let back: Object = serde_json::from_value(json).unwrap();
        assert_eq!(back, object);
    }

    #[test]
    fn enum_without_values_is_rejected() {
        let json = serde_json::json!({"kind": "enum", "name": "mood", "schema": "public"});
        assert!(serde_json::from_value::<Object>(json).is_err());
    }
}
