use std::fmt;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use serde::{Deserialize, Serialize};

/// Kind tag shared by every schema-level object.
///
/// Serialized as its lowercase tag so snapshots written by a build that knows
/// more kinds still load here as [`ObjectKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectKind {
    Enum,
    Domain,
    Sequence,
    Composite,
    Extension,
    Other(String),
}

impl ObjectKind {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectKind::Enum => "enum",
            ObjectKind::Domain => "domain",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Composite => "composite",
            ObjectKind::Extension => "extension",
            ObjectKind::Other(tag) => tag.as_str(),
        }
    }
}

impl From<String> for ObjectKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "enum" => ObjectKind::Enum,
            "domain" => ObjectKind::Domain,
            "sequence" => ObjectKind::Sequence,
            "composite" => ObjectKind::Composite,
            "extension" => ObjectKind::Extension,
            _ => ObjectKind::Other(value),
        }
    }
}

impl From<ObjectKind> for String {
    fn from(value: ObjectKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for ObjectKind {
    fn schema_name() -> String {
        "ObjectKind".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> schemars::schema::Schema {
        <String as JsonSchema>::json_schema(generator)
    }
}

/// Named, unresolved pointer to an object declared elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TypeRef {
    pub kind: ObjectKind,
    pub name: String,
    /// Owning schema, when the reference is qualified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Stable address of an object inside a realm.
///
/// Columns hold keys rather than copies, so every column resolved against the
/// same declaration reaches the same object instance through
/// [`crate::Realm::object`].
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct ObjectKey {
    pub schema: String,
    pub kind: ObjectKind,
    pub name: String,
}

impl ObjectKey {
    pub fn new(schema: impl Into<String>, kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\".\"{}\"", self.schema, self.name)
    }
}

/// Type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// Concrete built-in type such as `int4` or `text`.
    Primitive { name: String },
    /// `element[]`.
    Array { element: Box<ColumnType> },
    /// Reference waiting for type resolution.
    Ref(TypeRef),
    /// Resolved reference to an object of the realm.
    Object(ObjectKey),
}

impl ColumnType {
    pub fn primitive(name: impl Into<String>) -> Self {
        ColumnType::Primitive { name: name.into() }
    }

    pub fn array(element: ColumnType) -> Self {
        ColumnType::Array {
            element: Box::new(element),
        }
    }

    pub fn reference(kind: ObjectKind, name: impl Into<String>) -> Self {
        ColumnType::Ref(TypeRef {
            kind,
            name: name.into(),
            schema: None,
        })
    }

    /// Reference pinned to the object of `schema`.
    pub fn qualified_reference(
        kind: ObjectKind,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ColumnType::Ref(TypeRef {
            kind,
            name: name.into(),
            schema: Some(schema.into()),
        })
    }

    /// Innermost element type, looking through any number of array wrappers.
    pub fn element(&self) -> &ColumnType {
        match self {
            ColumnType::Array { element } => element.element(),
            other => other,
        }
    }

    pub fn element_mut(&mut self) -> &mut ColumnType {
        match self {
            ColumnType::Array { element } => element.element_mut(),
            other => other,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ColumnType::Array { .. })
    }

    /// Reference still waiting for resolution, if any.
    pub fn unresolved(&self) -> Option<&TypeRef> {
        match self.element() {
            ColumnType::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    /// Object this type points at once resolved, if any.
    pub fn object_key(&self) -> Option<&ObjectKey> {
        match self.element() {
            ColumnType::Object(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Primitive { name } => f.write_str(name),
            ColumnType::Array { element } => write!(f, "{element}[]"),
            ColumnType::Ref(reference) => match &reference.schema {
                Some(schema) => write!(f, "{schema}.{}", reference.name),
                None => f.write_str(&reference.name),
            },
            ColumnType::Object(key) => write!(f, "{key}"),
        }
    }
}
