use schemashift_core::{
    Change, ChangeKind, Column, ColumnType, EnumType, Object, ObjectKind, OpaqueObject, Realm,
    Schema, Table,
};
use schemashift_engine::{DiffOptions, Differ, Engine};

fn status(values: &[&str]) -> Object {
    EnumType::new("public", "status", values.iter().copied()).into()
}

fn named_enum(name: &str) -> Object {
    EnumType::new("public", name, ["x", "y"]).into()
}

fn public(objects: Vec<Object>) -> Schema {
    Schema::new("public").with_objects(objects)
}

/// Built from scratch on every call so two realms never share storage.
fn sample_realm(values: &[&str]) -> Realm {
    let status_key = status(values).key();
    Realm::new(vec![
        Schema::new("public")
            .with_tables(vec![Table::new(
                "orders",
                vec![
                    Column::new("id", ColumnType::primitive("int8")),
                    Column::new("status", ColumnType::Object(status_key)),
                ],
            )])
            .with_objects(vec![status(values), named_enum("mood")]),
        Schema::new("audit").with_tables(vec![Table::new(
            "events",
            vec![Column::new("payload", ColumnType::primitive("jsonb")).nullable()],
        )]),
    ])
}

#[test]
fn diffing_a_schema_with_itself_is_empty() {
    let realm = sample_realm(&["a", "b"]);
    let differ = Differ::community();
    for schema in &realm.schemas {
        assert!(differ.diff_schema(schema, schema).expect("diff").is_empty());
        assert!(differ.diff_objects(schema, schema).expect("diff").is_empty());
    }
    assert!(
        differ
            .diff_realm(&realm, &realm, &DiffOptions::default())
            .expect("diff")
            .is_empty()
    );
}

#[test]
fn enum_value_order_is_significant() {
    let differ = Differ::community();
    let e1 = public(vec![status(&["a", "b"])]);
    let e2 = public(vec![status(&["b", "a"])]);

    let changes = differ.diff_objects(&e1, &e2).expect("diff");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind(), ChangeKind::ModifyObject);
    assert!(differ.diff_objects(&e1, &e1).expect("diff").is_empty());
}

#[test]
fn disjoint_sets_produce_only_drops_then_adds() {
    let from = public(vec![named_enum("a"), named_enum("b"), named_enum("c")]);
    let to = public(vec![named_enum("x"), named_enum("y")]);

    let changes = Differ::community().diff_objects(&from, &to).expect("diff");
    let labels: Vec<String> = changes.iter().map(|c| c.to_string()).collect();
    assert_eq!(
        labels,
        vec![
            "- enum public.a",
            "- enum public.b",
            "- enum public.c",
            "+ enum public.x",
            "+ enum public.y",
        ]
    );
}

#[test]
fn independently_built_realms_diff_identically() {
    let differ = Differ::community();
    let first = differ
        .diff_realm(
            &sample_realm(&["a", "b"]),
            &sample_realm(&["a", "b", "c"]),
            &DiffOptions::default(),
        )
        .expect("diff");
    let second = differ
        .diff_realm(
            &sample_realm(&["a", "b"]),
            &sample_realm(&["a", "b", "c"]),
            &DiffOptions::default(),
        )
        .expect("diff");
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);

    let left = sample_realm(&["a"]);
    let right = sample_realm(&["b"]);
    let first = differ
        .diff_schema(&left.schemas[0], &right.schemas[0])
        .expect("diff");
    let second = differ
        .diff_schema(&left.schemas[0], &right.schemas[0])
        .expect("diff");
    assert_eq!(first, second);
}

#[test]
fn unknown_kinds_never_show_up_in_changes() {
    let policy = Object::Other(OpaqueObject {
        kind: ObjectKind::Other("policy".to_string()),
        name: "tenant_isolation".to_string(),
        schema: "public".to_string(),
        definition: serde_json::json!({"using": "tenant_id = current_tenant()"}),
    });
    let from = public(vec![policy, status(&["a"])]);
    let to = public(vec![status(&["a"])]);

    let differ = Differ::community();
    assert!(differ.diff_objects(&from, &to).expect("diff").is_empty());
    assert!(differ.diff_objects(&to, &from).expect("diff").is_empty());
}

#[test]
fn schema_level_changes_wrap_their_contents() {
    let from = sample_realm(&["a"]);
    let mut to = sample_realm(&["a"]);
    to.schemas.retain(|s| s.name != "audit");
    to.schemas.push(Schema::new("billing").with_tables(vec![Table::new(
        "invoices",
        vec![Column::new("id", ColumnType::primitive("int8"))],
    )]));

    let changes = Engine::community()
        .differ()
        .diff_realm(&from, &to, &DiffOptions::default())
        .expect("diff");
    let labels: Vec<String> = changes.iter().map(|c| c.to_string()).collect();
    assert_eq!(
        labels,
        vec!["- schema audit", "+ schema billing", "+ table billing.invoices"]
    );

    let skipped = Differ::community()
        .diff_realm(
            &from,
            &to,
            &DiffOptions::default().skip(ChangeKind::DropSchema),
        )
        .expect("diff");
    assert!(
        skipped
            .iter()
            .all(|c| !matches!(c, Change::DropSchema { .. }))
    );
    assert_eq!(skipped.len(), 2);
}
