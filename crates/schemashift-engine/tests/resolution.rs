use schemashift_core::{
    Column, ColumnType, Document, EnumDecl, Error, FeatureDecl, ObjectKey, ObjectKind, Realm,
    Schema, SchemaRef, Table, unresolved_columns, validate_realm,
};
use schemashift_engine::{Engine, Resolver, export_document};
use std::fs;
use std::path::Path;

fn load_json(name: &str) -> serde_json::Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse json")
}

fn shop() -> (Document, Realm) {
    let doc = Document::from_json(&load_json("shop.document.json")).expect("valid document");
    let realm: Realm =
        serde_json::from_value(load_json("shop.realm.json")).expect("parse realm json");
    (doc, realm)
}

fn mood_decl(name: &str) -> EnumDecl {
    EnumDecl {
        name: name.to_string(),
        schema: SchemaRef::named("public"),
        values: vec!["sad".to_string(), "ok".to_string(), "happy".to_string()],
    }
}

fn mood_realm() -> Realm {
    Realm::new(vec![Schema::new("public").with_tables(vec![Table::new(
        "t",
        vec![
            Column::new("m", ColumnType::reference(ObjectKind::Enum, "mood")),
            Column::new(
                "ms",
                ColumnType::array(ColumnType::reference(ObjectKind::Enum, "mood")),
            ),
        ],
    )])])
}

#[test]
fn resolved_columns_point_at_the_attached_object() {
    let mut realm = mood_realm();
    let doc = Document {
        enums: vec![mood_decl("mood")],
        ..Document::default()
    };
    Resolver::community()
        .resolve(&doc, &mut realm)
        .expect("resolve mood");

    let public = realm.schema("public").expect("public schema");
    assert_eq!(public.objects.len(), 1);
    let attached = &public.objects[0];
    let mood = attached.as_enum().expect("enum object");
    assert_eq!(mood.name, "mood");
    assert_eq!(mood.values, vec!["sad", "ok", "happy"]);

    let table = public.table("t").expect("table t");
    let plain = realm
        .object_of(&table.columns[0].ty)
        .expect("plain column resolved");
    let element = realm
        .object_of(&table.columns[1].ty)
        .expect("array column resolved");
    assert!(std::ptr::eq(plain, attached));
    assert!(std::ptr::eq(element, attached));
    assert!(table.columns[1].ty.is_array());
}

#[test]
fn fixture_realm_resolves_completely() {
    let (doc, mut realm) = shop();
    let summary = Engine::community()
        .resolver()
        .resolve(&doc, &mut realm)
        .expect("resolve shop");
    assert_eq!(summary.objects, 2);
    assert_eq!(summary.columns, 3);
    assert!(unresolved_columns(&realm).is_empty());
    validate_realm(&realm).expect("resolved realm is valid");

    let orders = realm.schemas[0].table("orders").expect("orders");
    assert_eq!(
        orders.columns[1].ty.object_key(),
        Some(&ObjectKey::new("public", ObjectKind::Enum, "status"))
    );
    assert_eq!(orders.columns[1].ty.object_key(), orders.columns[2].ty.object_key());
}

#[test]
fn domain_declaration_is_rejected_without_partial_attach() {
    let mut realm = mood_realm();
    let before = realm.clone();
    let doc = Document {
        domains: vec![FeatureDecl {
            name: "email".to_string(),
            schema: Some(SchemaRef::named("public")),
            definition: serde_json::json!({"base": "text"}),
        }],
        ..Document::default()
    };
    let err = Resolver::community()
        .resolve(&doc, &mut realm)
        .expect_err("domains are guarded");
    assert!(matches!(err, Error::UnsupportedFeature { .. }));
    assert!(err.to_string().contains("domains are not supported"));
    assert!(realm.schemas[0].objects.is_empty());
    assert_eq!(realm, before);
}

#[test]
fn duplicate_declarations_fail_before_attaching() {
    let mut realm = mood_realm();
    let doc = Document {
        enums: vec![mood_decl("status"), mood_decl("status")],
        ..Document::default()
    };
    let err = Resolver::community()
        .resolve(&doc, &mut realm)
        .expect_err("duplicate status");
    assert_eq!(
        err,
        Error::DuplicateObject {
            kind: ObjectKind::Enum,
            name: "status".to_string()
        }
    );
    assert!(realm.schemas[0].objects.is_empty());
}

#[test]
fn empty_document_on_resolved_realm_is_a_no_op() {
    let (doc, mut realm) = shop();
    let resolver = Resolver::community();
    resolver.resolve(&doc, &mut realm).expect("first resolve");
    let resolved = realm.clone();

    let summary = resolver
        .resolve(&Document::default(), &mut realm)
        .expect("empty resolve");
    assert_eq!(summary.objects, 0);
    assert_eq!(summary.columns, 0);
    assert_eq!(realm, resolved);
}

#[test]
fn exported_document_resolves_into_the_same_realm() {
    let (doc, mut realm) = shop();
    let engine = Engine::community();
    engine.resolver().resolve(&doc, &mut realm).expect("resolve");

    let exported = export_document(&realm, engine.capabilities()).expect("export");
    assert_eq!(exported.enums.len(), 2);

    let json = serde_json::to_value(&exported).expect("serialize document");
    let reparsed = Document::from_json(&json).expect("exported document validates");

    let (_, mut fresh) = shop();
    engine
        .resolver()
        .resolve(&reparsed, &mut fresh)
        .expect("resolve exported");
    assert_eq!(fresh, realm);
}
