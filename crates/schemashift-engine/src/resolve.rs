//! Type resolution.
//!
//! Turns named type references found in table columns into keys of objects
//! attached to the realm. Every check runs before the realm is touched, so a
//! failed resolve leaves the realm as it was.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use schemashift_core::{
    Column, ColumnType, Document, EnumDecl, EnumType, Error, Object, ObjectKey, ObjectKind, Realm,
    Result,
};

use crate::hooks::{Capabilities, Community};

/// What a successful resolve changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveSummary {
    /// Objects attached to the realm.
    pub objects: usize,
    /// Column types rewritten to point at an object.
    pub columns: usize,
}

/// Resolves document declarations into a realm.
#[derive(Clone)]
pub struct Resolver {
    capabilities: Arc<dyn Capabilities>,
}

/// Column position inside a realm plus the key it resolves to.
struct Rewrite {
    schema: usize,
    table: usize,
    column: usize,
    key: ObjectKey,
}

impl Resolver {
    pub fn new(capabilities: Arc<dyn Capabilities>) -> Self {
        Self { capabilities }
    }

    pub fn community() -> Self {
        Self::new(Arc::new(Community))
    }

    /// Attach the objects declared by `doc` to `realm` and point every column
    /// referencing them at the attached object.
    pub fn resolve(&self, doc: &Document, realm: &mut Realm) -> Result<ResolveSummary> {
        let converted = self.run_guards(doc, realm)?;
        check_converted(realm, &converted)?;

        let declared = index_declarations(doc)?;
        let mut owners: Vec<(&EnumDecl, &str)> = Vec::with_capacity(doc.enums.len());
        for decl in &doc.enums {
            let schema_name = decl.schema.schema_name()?;
            let schema = realm.schema(schema_name).ok_or_else(|| Error::SchemaNotFound {
                schema: schema_name.to_string(),
                context: format!("of enum {:?}", decl.name),
            })?;
            if schema.object(&ObjectKind::Enum, &decl.name).is_some() {
                return Err(Error::DuplicateObject {
                    kind: ObjectKind::Enum,
                    name: decl.name.clone(),
                });
            }
            owners.push((decl, schema_name));
        }

        let rewrites = collect_rewrites(realm, &declared)?;

        let summary = ResolveSummary {
            objects: owners.len() + converted.len(),
            columns: rewrites.len(),
        };
        for object in converted {
            let schema_name = object.schema().to_string();
            let schema = realm.schema_mut(&schema_name).ok_or_else(|| Error::SchemaNotFound {
                schema: schema_name.clone(),
                context: format!("of {} {:?}", object.kind(), object.name()),
            })?;
            debug!(schema = %schema_name, kind = %object.kind(), name = object.name(), "attaching converted object");
            schema.add_objects([object]);
        }
        for (decl, schema_name) in owners {
            let object: Object =
                EnumType::new(schema_name, decl.name.clone(), decl.values.iter().cloned()).into();
            let schema = realm.schema_mut(schema_name).ok_or_else(|| Error::SchemaNotFound {
                schema: schema_name.to_string(),
                context: format!("of enum {:?}", decl.name),
            })?;
            debug!(schema = schema_name, name = %decl.name, "attaching enum");
            schema.add_objects([object]);
        }
        for rewrite in rewrites {
            let column = column_mut(realm, &rewrite)?;
            *column.ty.element_mut() = ColumnType::Object(rewrite.key);
        }

        self.capabilities.normalize_realm(realm)?;

        info!(
            objects = summary.objects,
            columns = summary.columns,
            "types resolved"
        );
        Ok(summary)
    }

    /// Objects built by the declaration conversions, in document section order.
    fn run_guards(&self, doc: &Document, realm: &Realm) -> Result<Vec<Object>> {
        let caps = self.capabilities.as_ref();
        let mut converted = caps.convert_domains(&doc.domains, realm)?;
        converted.extend(caps.convert_sequences(&doc.sequences, realm)?);
        converted.extend(caps.convert_policies(&doc.policies, realm)?);
        converted.extend(caps.convert_extensions(&doc.extensions, realm)?);
        converted.extend(caps.convert_event_triggers(&doc.event_triggers, realm)?);
        converted.extend(caps.convert_aggregates(&doc.aggregates, realm)?);
        Ok(converted)
    }
}

/// Converted objects need an existing schema and a (kind, name) unused there.
fn check_converted(realm: &Realm, converted: &[Object]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for object in converted {
        let schema = realm.schema(object.schema()).ok_or_else(|| Error::SchemaNotFound {
            schema: object.schema().to_string(),
            context: format!("of {} {:?}", object.kind(), object.name()),
        })?;
        let taken = schema.object(&object.kind(), object.name()).is_some();
        if taken || !seen.insert(object.key()) {
            return Err(Error::DuplicateObject {
                kind: object.kind(),
                name: object.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Enum name to the key it will be attached under.
fn index_declarations(doc: &Document) -> Result<BTreeMap<&str, ObjectKey>> {
    let mut declared = BTreeMap::new();
    for decl in &doc.enums {
        let key = ObjectKey::new(decl.schema.schema_name()?, ObjectKind::Enum, &decl.name);
        if declared.insert(decl.name.as_str(), key).is_some() {
            return Err(Error::DuplicateObject {
                kind: ObjectKind::Enum,
                name: decl.name.clone(),
            });
        }
    }
    Ok(declared)
}

/// Enum references in column types, looked up among the declarations and then
/// among enums already present in the column's own schema. A qualified
/// reference only matches an enum of its schema. References to other kinds are
/// left alone.
fn collect_rewrites(realm: &Realm, declared: &BTreeMap<&str, ObjectKey>) -> Result<Vec<Rewrite>> {
    let mut rewrites = Vec::new();
    for (s, schema) in realm.schemas.iter().enumerate() {
        for (t, table) in schema.tables.iter().enumerate() {
            for (c, column) in table.columns.iter().enumerate() {
                let Some(reference) = column.ty.unresolved() else {
                    continue;
                };
                if reference.kind != ObjectKind::Enum {
                    continue;
                }
                let owner = reference.schema.as_deref();
                let declared_key = declared
                    .get(reference.name.as_str())
                    .filter(|key| owner.is_none_or(|owner| key.schema == owner));
                let key = match declared_key {
                    Some(key) => key.clone(),
                    None => owner
                        .map_or(Some(schema), |owner| realm.schema(owner))
                        .and_then(|s| s.object(&ObjectKind::Enum, &reference.name))
                        .map(Object::key)
                        .ok_or_else(|| Error::ObjectNotFound {
                            kind: ObjectKind::Enum,
                            name: reference.name.clone(),
                        })?,
                };
                rewrites.push(Rewrite {
                    schema: s,
                    table: t,
                    column: c,
                    key,
                });
            }
        }
    }
    Ok(rewrites)
}

fn column_mut<'a>(realm: &'a mut Realm, at: &Rewrite) -> Result<&'a mut Column> {
    realm
        .schemas
        .get_mut(at.schema)
        .and_then(|s| s.tables.get_mut(at.table))
        .and_then(|t| t.columns.get_mut(at.column))
        .ok_or_else(|| Error::Internal(format!("column position of {} moved", at.key)))
}
