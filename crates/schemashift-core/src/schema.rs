use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::object::Object;
use crate::types::{ColumnType, ObjectKey, ObjectKind};

/// Top-level snapshot of a database.
///
/// Objects live inside their schema and are addressed by [`ObjectKey`], so a
/// realm doubles as the arena that resolved column types point into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Realm {
    /// Schemas captured from the database, in inspection order.
    pub schemas: Vec<Schema>,
}

impl Realm {
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self { schemas }
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.iter_mut().find(|s| s.name == name)
    }

    /// Object addressed by `key`.
    pub fn object(&self, key: &ObjectKey) -> Option<&Object> {
        self.schema(&key.schema)?.object(&key.kind, &key.name)
    }

    /// Object a column type points at, if the type is resolved.
    pub fn object_of(&self, ty: &ColumnType) -> Option<&Object> {
        ty.object_key().and_then(|key| self.object(key))
    }
}

/// A Postgres namespace with its tables, views, routines and objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub funcs: Vec<Func>,
    /// Kind-heterogeneous schema objects (enums, domains, ...).
    #[serde(default)]
    pub objects: Vec<Object>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_objects(mut self, objects: Vec<Object>) -> Self {
        self.objects = objects;
        self
    }

    /// True when the schema holds no table, view, function or object.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.views.is_empty()
            && self.funcs.is_empty()
            && self.objects.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn object(&self, kind: &ObjectKind, name: &str) -> Option<&Object> {
        self.objects
            .iter()
            .find(|o| &o.kind() == kind && o.name() == name)
    }

    /// First object matching `pred`, in schema order.
    pub fn find_object(&self, pred: impl Fn(&Object) -> bool) -> Option<&Object> {
        self.objects.iter().find(|o| pred(o))
    }

    pub fn add_objects(&mut self, objects: impl IntoIterator<Item = Object>) {
        self.objects.extend(objects);
    }
}

/// A base table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            ..Self::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Column metadata for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A view and its query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct View {
    pub name: String,
    pub definition: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Whether a routine is a function or a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FuncKind {
    Function,
    Procedure,
}

/// A stored function or procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Func {
    pub name: String,
    pub kind: FuncKind,
    pub body: String,
}

/// A trigger attached to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Trigger {
    pub name: String,
    pub body: String,
}
