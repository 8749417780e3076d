use thiserror::Error;

use crate::types::ObjectKind;

/// Core error type shared across schemashift crates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The document declares a feature the running build does not support.
    #[error("{feature} are not supported by this build. {hint}")]
    UnsupportedFeature { feature: String, hint: String },
    /// Two declarations (or a declaration and an existing object) share a name.
    #[error("duplicate {kind} {name:?}")]
    DuplicateObject { kind: ObjectKind, name: String },
    /// A schema reference does not resolve inside the realm.
    #[error("schema {schema:?} {context} was not found in realm")]
    SchemaNotFound { schema: String, context: String },
    /// A type reference names an object that was never declared.
    #[error("{kind} {name:?} was not found in realm")]
    ObjectNotFound { kind: ObjectKind, name: String },
    /// A reference string could not be parsed.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    /// The document does not match the document contract.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// A change cannot be lowered under the policy of its object kind.
    #[error("unsupported change: {0}")]
    UnsupportedChange(String),
    /// The realm violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Inputs that passed resolution are inconsistent.
    #[error("internal error: {0}")]
    Internal(String),
    /// Database error or inspector failure.
    #[error("database error: {0}")]
    Db(String),
}

impl Error {
    /// Build the error raised by a declaration guard of a restricted build.
    pub fn unsupported_feature(feature: impl Into<String>, capability: &str) -> Self {
        Error::UnsupportedFeature {
            feature: feature.into(),
            hint: format!("Use a build that provides the `{capability}` capability."),
        }
    }
}

/// Convenience alias for results returned by schemashift crates.
pub type Result<T> = std::result::Result<T, Error>;
