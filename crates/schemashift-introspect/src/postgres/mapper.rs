use std::collections::BTreeSet;

use tracing::debug;

use schemashift_core::{Column, ColumnType, EnumType, Object, ObjectKey, ObjectKind, Table};

use crate::options::InspectOptions;

use super::queries::{RawColumn, RawEnumType, RawTable};

const ENUM_TYPE: &str = "e";

pub fn filter_schemas(raw: Vec<String>, opts: &InspectOptions) -> Vec<String> {
    raw.into_iter()
        .filter(|schema| {
            let is_system = schema.starts_with("pg_") || schema == "information_schema";
            match &opts.schemas {
                Some(list) => list.iter().any(|item| item == schema),
                None => opts.include_system_schemas || !is_system,
            }
        })
        .collect()
}

pub fn map_table(raw: RawTable, opts: &InspectOptions) -> Table {
    if let Some(strategy) = &raw.partition_strategy {
        debug!(
            oid = raw.oid,
            schema = %raw.table_schema,
            table = %raw.table_name,
            strategy = %strategy,
            key = ?raw.partition_attrs,
            exprs = ?raw.partition_exprs,
            attrs = %raw.attrs,
            "partitioned table"
        );
    }

    Table {
        name: raw.table_name,
        comment: if opts.include_comments {
            raw.comment
        } else {
            None
        },
        ..Table::default()
    }
}

/// Columns with enum types become references qualified by the type's schema;
/// when the enum was inspected (`enums` holds its key) the reference is linked
/// to it directly.
pub fn map_columns(raw: Vec<RawColumn>, enums: &BTreeSet<ObjectKey>) -> Vec<Column> {
    raw.into_iter()
        .map(|col| {
            let ty = if col.type_kind == ENUM_TYPE {
                enum_type(enums, col.udt_schema, col.udt_name)
            } else if col.element_kind.as_deref() == Some(ENUM_TYPE) {
                match (col.element_schema, col.element_name) {
                    (Some(schema), Some(name)) => ColumnType::array(enum_type(enums, schema, name)),
                    _ => ColumnType::primitive(col.data_type),
                }
            } else {
                ColumnType::primitive(col.data_type)
            };
            Column {
                name: col.name,
                ty,
                nullable: col.is_nullable,
                default: col.default,
            }
        })
        .collect()
}

fn enum_type(enums: &BTreeSet<ObjectKey>, schema: String, name: String) -> ColumnType {
    let key = ObjectKey::new(schema, ObjectKind::Enum, name);
    if enums.contains(&key) {
        ColumnType::Object(key)
    } else {
        ColumnType::qualified_reference(ObjectKind::Enum, key.schema, key.name)
    }
}

pub fn map_enums(raw: Vec<RawEnumType>) -> Vec<Object> {
    raw.into_iter()
        .map(|en| EnumType::new(en.schema, en.name, en.labels).into())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str, udt: &str, kind: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            udt_schema: "app".to_string(),
            udt_name: udt.to_string(),
            type_kind: kind.to_string(),
            element_schema: None,
            element_name: None,
            element_kind: None,
            is_nullable: false,
            default: None,
        }
    }

    fn array_of_enum(name: &str, element: &str) -> RawColumn {
        RawColumn {
            element_schema: Some("app".to_string()),
            element_name: Some(element.to_string()),
            element_kind: Some("e".to_string()),
            is_nullable: true,
            ..column(name, &format!("{element}[]"), &format!("_{element}"), "b")
        }
    }

    #[test]
    fn system_schemas_are_filtered_by_default() {
        let raw = vec![
            "app".to_string(),
            "information_schema".to_string(),
            "pg_catalog".to_string(),
            "public".to_string(),
        ];
        let opts = InspectOptions::default();
        assert_eq!(filter_schemas(raw.clone(), &opts), vec!["app", "public"]);

        let only_app = InspectOptions {
            schemas: Some(vec!["app".to_string()]),
            ..InspectOptions::default()
        };
        assert_eq!(filter_schemas(raw, &only_app), vec!["app"]);
    }

    #[test]
    fn enum_columns_map_to_references() {
        let columns = map_columns(
            vec![
                column("id", "bigint", "int8", "b"),
                column("mood", "app.mood", "mood", "e"),
                array_of_enum("moods", "mood"),
            ],
            &BTreeSet::new(),
        );
        assert_eq!(columns[0].ty, ColumnType::primitive("bigint"));
        let mood = || ColumnType::qualified_reference(ObjectKind::Enum, "app", "mood");
        assert_eq!(columns[1].ty, mood());
        assert_eq!(columns[2].ty, ColumnType::array(mood()));
        assert!(columns[2].nullable);
    }

    #[test]
    fn inspected_enums_are_linked() {
        let key = ObjectKey::new("app", ObjectKind::Enum, "mood");
        let enums = BTreeSet::from([key.clone()]);
        let columns = map_columns(
            vec![column("mood", "app.mood", "mood", "e"), array_of_enum("moods", "mood")],
            &enums,
        );
        assert_eq!(columns[0].ty, ColumnType::Object(key.clone()));
        assert_eq!(columns[1].ty, ColumnType::array(ColumnType::Object(key)));
    }

    #[test]
    fn tables_drop_comments_when_disabled() {
        let raw = || RawTable {
            oid: 16384,
            table_schema: "app".to_string(),
            table_name: "users".to_string(),
            comment: Some("people".to_string()),
            partition_attrs: None,
            partition_strategy: None,
            partition_exprs: None,
            attrs: "{}".to_string(),
        };
        assert_eq!(
            map_table(raw(), &InspectOptions::default()).comment.as_deref(),
            Some("people")
        );
        let opts = InspectOptions {
            include_comments: false,
            ..InspectOptions::default()
        };
        let table = map_table(raw(), &opts);
        assert_eq!(table.name, "users");
        assert!(table.comment.is_none());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn enums_keep_label_order() {
        let objects = map_enums(vec![RawEnumType {
            schema: "app".to_string(),
            name: "mood".to_string(),
            labels: vec!["sad".to_string(), "ok".to_string(), "happy".to_string()],
        }]);
        let mood = objects[0].as_enum().expect("enum");
        assert_eq!(mood.values, vec!["sad", "ok", "happy"]);
        assert_eq!(objects[0].key(), ObjectKey::new("app", ObjectKind::Enum, "mood"));
    }
}
