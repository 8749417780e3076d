//! Realm to document export.

use tracing::debug;

use schemashift_core::{Document, EnumDecl, Realm, Result, SchemaRef};

use crate::hooks::Capabilities;

/// Declarations describing the objects of `realm`.
///
/// Enums are exported directly; other kinds are left to the
/// `schema_objects_spec` and `realm_objects_spec` extension points.
pub fn export_document(realm: &Realm, capabilities: &dyn Capabilities) -> Result<Document> {
    let mut doc = Document::default();
    for schema in &realm.schemas {
        doc.enums.extend(schema.objects.iter().filter_map(|object| {
            object.as_enum().map(|e| EnumDecl {
                name: e.name.clone(),
                schema: SchemaRef::named(&schema.name),
                values: e.values.clone(),
            })
        }));
        capabilities.schema_objects_spec(&mut doc, schema)?;
    }
    capabilities.realm_objects_spec(&mut doc, realm)?;

    debug!(enums = doc.enums.len(), "document exported");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Community;
    use schemashift_core::{EnumType, OpaqueObject, Object, ObjectKind, Schema};

    #[test]
    fn exports_enums_with_canonical_schema_references() {
        let realm = Realm::new(vec![
            Schema::new("public").with_objects(vec![
                EnumType::new("public", "mood", ["sad", "ok"]).into(),
                Object::Other(OpaqueObject {
                    kind: ObjectKind::Domain,
                    name: "email".to_string(),
                    schema: "public".to_string(),
                    definition: serde_json::Value::Null,
                }),
            ]),
        ]);
        let doc = export_document(&realm, &Community).unwrap();
        assert_eq!(doc.enums.len(), 1);
        assert_eq!(doc.enums[0].schema.0, "$schema.public");
        assert_eq!(doc.enums[0].values, vec!["sad", "ok"]);
        assert!(doc.domains.is_empty());
    }
}
