//! Core contracts for schemashift.
//!
//! This crate defines the realm snapshot model, the change model produced by
//! diffing, the declarative document contract consumed by type resolution,
//! and the error type shared by every other crate.

pub mod change;
pub mod document;
pub mod error;
pub mod object;
pub mod schema;
pub mod types;
pub mod validation;

pub use change::{Change, ChangeKind, TableChange};
pub use document::{Document, EnumDecl, FeatureDecl, SchemaRef, validate_document_json};
pub use error::{Error, Result};
pub use object::{EnumType, Object, OpaqueObject};
pub use schema::{Column, Func, FuncKind, Realm, Schema, Table, Trigger, View};
pub use types::{ColumnType, ObjectKey, ObjectKind, TypeRef};
pub use validation::{unresolved_columns, validate_realm};

/// Current contract version for realm and document JSON artifacts.
pub const SNAPSHOT_VERSION: &str = "0.1";
