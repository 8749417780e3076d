//! Object kind registry.
//!
//! Each kind the build understands registers a handler carrying its identity
//! key, structural equality, modify policy and statement rendering. The diff
//! engine and the planner dispatch through the registry and never match on
//! concrete object variants.

use std::fmt;
use std::sync::Arc;

use schemashift_core::{EnumType, Error, Object, ObjectKind, Result};

use crate::lower::{qualified, quote_literal};

/// How a modified object of a kind is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyPolicy {
    /// Changed in place through [`ObjectKindHandler::alter`].
    Alter,
    /// Dropped and created again.
    Recreate,
    /// Modifications are refused.
    Reject,
}

/// Behavior registered for one object kind.
pub trait ObjectKindHandler: Send + Sync {
    fn kind(&self) -> ObjectKind;

    /// Identity key of `object` when it belongs to this kind.
    fn identity<'a>(&self, object: &'a Object) -> Option<&'a str> {
        (object.kind() == self.kind()).then(|| object.name())
    }

    /// Whether two objects with the same identity have the same definition.
    fn same_definition(&self, from: &Object, to: &Object) -> bool;

    fn modify_policy(&self) -> ModifyPolicy;

    /// Human label used in change comments, e.g. `enum type "mood"`.
    fn label(&self, object: &Object) -> String {
        format!("{} {:?}", object.kind(), object.name())
    }

    /// Create and drop statements for `object`.
    fn create_drop(&self, object: &Object) -> Result<(String, String)>;

    /// In-place alteration statements, used under [`ModifyPolicy::Alter`].
    fn alter(&self, from: &Object, _to: &Object) -> Result<Vec<String>> {
        Err(Error::UnsupportedChange(format!(
            "{} cannot be altered in place",
            self.label(from)
        )))
    }
}

/// Registered kind handlers, in registration order.
#[derive(Clone, Default)]
pub struct KindRegistry {
    handlers: Vec<Arc<dyn ObjectKindHandler>>,
}

impl KindRegistry {
    /// Registry without any kind; every object is skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Kinds supported by the community build.
    pub fn community() -> Self {
        let mut registry = Self::empty();
        registry.register(EnumKind);
        registry
    }

    /// Register `handler`, replacing any handler already registered for its kind.
    pub fn register(&mut self, handler: impl ObjectKindHandler + 'static) {
        let handler: Arc<dyn ObjectKindHandler> = Arc::new(handler);
        let kind = handler.kind();
        match self.handlers.iter_mut().find(|h| h.kind() == kind) {
            Some(slot) => *slot = handler,
            None => self.handlers.push(handler),
        }
    }

    pub fn get(&self, kind: &ObjectKind) -> Option<&dyn ObjectKindHandler> {
        self.handlers
            .iter()
            .find(|h| &h.kind() == kind)
            .map(|h| h.as_ref())
    }

    pub fn handler_for(&self, object: &Object) -> Option<&dyn ObjectKindHandler> {
        self.get(&object.kind())
    }

    pub fn kinds(&self) -> Vec<ObjectKind> {
        self.handlers.iter().map(|h| h.kind()).collect()
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

/// Postgres enum types.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumKind;

impl EnumKind {
    fn expect<'a>(&self, object: &'a Object) -> Result<&'a EnumType> {
        object.as_enum().ok_or_else(|| {
            Error::Internal(format!(
                "{} {:?} routed to the enum handler",
                object.kind(),
                object.name()
            ))
        })
    }
}

impl ObjectKindHandler for EnumKind {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Enum
    }

    fn same_definition(&self, from: &Object, to: &Object) -> bool {
        match (from.as_enum(), to.as_enum()) {
            (Some(from), Some(to)) => from.values == to.values,
            _ => false,
        }
    }

    fn modify_policy(&self) -> ModifyPolicy {
        ModifyPolicy::Alter
    }

    fn label(&self, object: &Object) -> String {
        format!("enum type {:?}", object.name())
    }

    fn create_drop(&self, object: &Object) -> Result<(String, String)> {
        let e = self.expect(object)?;
        let name = qualified(&e.schema, &e.name);
        let values: Vec<String> = e.values.iter().map(|v| quote_literal(v)).collect();
        Ok((
            format!("CREATE TYPE {name} AS ENUM ({})", values.join(", ")),
            format!("DROP TYPE {name}"),
        ))
    }

    /// Only additions are supported: existing values must survive in their
    /// original relative order.
    fn alter(&self, from: &Object, to: &Object) -> Result<Vec<String>> {
        let (from, to) = (self.expect(from)?, self.expect(to)?);
        if let Some(dropped) = from.values.iter().find(|v| !to.values.contains(v)) {
            return Err(Error::UnsupportedChange(format!(
                "dropping enum ({}) value {:?} is not supported",
                from.name, dropped
            )));
        }
        let kept: Vec<&String> = to
            .values
            .iter()
            .filter(|v| from.values.contains(v))
            .collect();
        if !kept.iter().copied().eq(from.values.iter()) {
            return Err(Error::UnsupportedChange(format!(
                "reordering enum ({}) values is not supported",
                from.name
            )));
        }

        let name = qualified(&to.schema, &to.name);
        let last_kept = to.values.iter().rposition(|v| from.values.contains(v));
        let mut statements = Vec::new();
        for (idx, value) in to.values.iter().enumerate() {
            if from.values.contains(value) {
                continue;
            }
            let position = match (idx, last_kept) {
                (_, None) => String::new(),
                (idx, Some(last)) if idx > last => String::new(),
                (0, Some(_)) => format!(" BEFORE {}", quote_literal(&from.values[0])),
                (idx, Some(_)) => format!(" AFTER {}", quote_literal(&to.values[idx - 1])),
            };
            statements.push(format!(
                "ALTER TYPE {name} ADD VALUE {}{position}",
                quote_literal(value)
            ));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood(values: &[&str]) -> Object {
        EnumType::new("public", "mood", values.iter().copied()).into()
    }

    #[test]
    fn enum_equality_is_order_sensitive() {
        assert!(EnumKind.same_definition(&mood(&["a", "b"]), &mood(&["a", "b"])));
        assert!(!EnumKind.same_definition(&mood(&["a", "b"]), &mood(&["b", "a"])));
    }

    #[test]
    fn enum_create_drop_pair() {
        let (create, drop) = EnumKind.create_drop(&mood(&["sad", "it's ok"])).unwrap();
        assert_eq!(
            create,
            r#"CREATE TYPE "public"."mood" AS ENUM ('sad', 'it''s ok')"#
        );
        assert_eq!(drop, r#"DROP TYPE "public"."mood""#);
    }

    #[test]
    fn enum_alter_positions_new_values() {
        let statements = EnumKind
            .alter(&mood(&["b", "d"]), &mood(&["a", "b", "c", "d", "e", "f"]))
            .unwrap();
        assert_eq!(
            statements,
            vec![
                r#"ALTER TYPE "public"."mood" ADD VALUE 'a' BEFORE 'b'"#,
                r#"ALTER TYPE "public"."mood" ADD VALUE 'c' AFTER 'b'"#,
                r#"ALTER TYPE "public"."mood" ADD VALUE 'e'"#,
                r#"ALTER TYPE "public"."mood" ADD VALUE 'f'"#,
            ]
        );
    }

    #[test]
    fn enum_alter_rejects_drops_and_reorders() {
        let err = EnumKind.alter(&mood(&["a", "b"]), &mood(&["a"])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedChange(msg) if msg.contains("dropping")));
        let err = EnumKind
            .alter(&mood(&["a", "b"]), &mood(&["b", "a"]))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedChange(msg) if msg.contains("reordering")));
    }

    #[test]
    fn registry_replaces_handlers_of_the_same_kind() {
        let mut registry = KindRegistry::community();
        registry.register(EnumKind);
        assert_eq!(registry.kinds(), vec![ObjectKind::Enum]);
        assert!(registry.get(&ObjectKind::Domain).is_none());
        assert!(KindRegistry::empty().handler_for(&mood(&["a"])).is_none());
    }
}
