//! Object diff engine.
//!
//! Every comparison follows the same deterministic shape: walk `from` in its
//! original order emitting drops and modifications, then walk `to` in its
//! original order emitting additions.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use schemashift_core::{
    Change, ChangeKind, Column, Error, Realm, Result, Schema, Table, TableChange, View,
};

use crate::hooks::{Capabilities, Community};
use crate::kinds::KindRegistry;

/// Options that control which changes a diff reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Change kinds removed from the result.
    #[serde(default)]
    pub skip: BTreeSet<ChangeKind>,
}

impl DiffOptions {
    pub fn skip(mut self, kind: ChangeKind) -> Self {
        self.skip.insert(kind);
        self
    }
}

/// Compares snapshots through the capability table and kind registry.
#[derive(Clone)]
pub struct Differ {
    capabilities: Arc<dyn Capabilities>,
    kinds: KindRegistry,
}

impl Differ {
    pub fn new(capabilities: Arc<dyn Capabilities>, kinds: KindRegistry) -> Self {
        Self {
            capabilities,
            kinds,
        }
    }

    pub fn community() -> Self {
        Self::new(Arc::new(Community), KindRegistry::community())
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    /// Changes turning realm `from` into realm `to`.
    pub fn diff_realm(&self, from: &Realm, to: &Realm, opts: &DiffOptions) -> Result<Vec<Change>> {
        let mut changes = Vec::new();

        for s1 in &from.schemas {
            match to.schema(&s1.name) {
                Some(s2) => changes.extend(self.diff_schema(s1, s2)?),
                None => changes.push(Change::DropSchema { schema: s1.clone() }),
            }
        }
        for s2 in &to.schemas {
            if from.schema(&s2.name).is_none() {
                let empty = Schema::new(s2.name.clone());
                changes.push(Change::AddSchema {
                    schema: empty.clone(),
                });
                changes.extend(self.diff_schema(&empty, s2)?);
            }
        }
        changes.extend(self.capabilities.realm_object_diff(from, to)?);

        let mut changes = self.capabilities.detect_renames(changes);
        if !opts.skip.is_empty() {
            changes.retain(|c| !opts.skip.contains(&c.kind()));
        }

        info!(
            flavor = self.capabilities.name(),
            from_schemas = from.schemas.len(),
            to_schemas = to.schemas.len(),
            changes = changes.len(),
            "realm diffed"
        );
        Ok(changes)
    }

    /// Changes turning schema `from` into schema `to`: tables, views,
    /// routines, then schema objects.
    pub fn diff_schema(&self, from: &Schema, to: &Schema) -> Result<Vec<Change>> {
        let mut changes = self.diff_tables(from, to)?;
        changes.extend(self.diff_views(from, to));
        changes.extend(self.capabilities.func_diff(from, to)?);
        changes.extend(self.diff_objects(from, to)?);
        debug!(schema = %to.name, changes = changes.len(), "schema diffed");
        Ok(changes)
    }

    /// Changes to the objects of every registered kind. Objects of kinds
    /// without a handler are ignored on both sides.
    pub fn diff_objects(&self, from: &Schema, to: &Schema) -> Result<Vec<Change>> {
        let mut changes = Vec::new();

        for o1 in &from.objects {
            let Some(handler) = self.kinds.handler_for(o1) else {
                trace!(kind = %o1.kind(), name = o1.name(), "skipping unsupported object");
                continue;
            };
            check_owner(from, o1)?;
            let Some(name) = handler.identity(o1) else {
                continue;
            };
            match to.find_object(|o| handler.identity(o) == Some(name)) {
                None => changes.push(Change::DropObject { object: o1.clone() }),
                Some(o2) => {
                    check_owner(to, o2)?;
                    if !handler.same_definition(o1, o2) {
                        changes.push(Change::ModifyObject {
                            from: o1.clone(),
                            to: o2.clone(),
                        });
                    }
                }
            }
        }

        for o2 in &to.objects {
            let Some(handler) = self.kinds.handler_for(o2) else {
                trace!(kind = %o2.kind(), name = o2.name(), "skipping unsupported object");
                continue;
            };
            let Some(name) = handler.identity(o2) else {
                continue;
            };
            if from
                .find_object(|o| handler.identity(o) == Some(name))
                .is_none()
            {
                check_owner(to, o2)?;
                changes.push(Change::AddObject { object: o2.clone() });
            }
        }

        Ok(changes)
    }

    pub fn diff_tables(&self, from: &Schema, to: &Schema) -> Result<Vec<Change>> {
        let mut changes = Vec::new();

        for t1 in &from.tables {
            let Some(t2) = to.table(&t1.name) else {
                changes.push(Change::DropTable {
                    schema: from.name.clone(),
                    table: t1.clone(),
                });
                continue;
            };
            let table_changes = self.table_changes(t1, t2)?;
            if !table_changes.is_empty() {
                changes.push(Change::ModifyTable {
                    schema: to.name.clone(),
                    from: t1.clone(),
                    to: t2.clone(),
                    changes: table_changes,
                });
            }
            changes.extend(self.capabilities.trigger_diff(&to.name, t1, t2)?);
        }

        for t2 in &to.tables {
            if from.table(&t2.name).is_none() {
                changes.push(Change::AddTable {
                    schema: to.name.clone(),
                    table: t2.clone(),
                });
            }
        }

        Ok(changes)
    }

    pub fn diff_views(&self, from: &Schema, to: &Schema) -> Vec<Change> {
        let mut changes = Vec::new();

        for v1 in &from.views {
            match to.view(&v1.name) {
                None => changes.push(Change::DropView {
                    schema: from.name.clone(),
                    view: v1.clone(),
                }),
                Some(v2) => {
                    if view_changed(v1, v2)
                        || !self.capabilities.view_attr_changes(v1, v2).is_empty()
                    {
                        changes.push(Change::ModifyView {
                            schema: to.name.clone(),
                            from: v1.clone(),
                            to: v2.clone(),
                        });
                    }
                }
            }
        }

        for v2 in &to.views {
            if from.view(&v2.name).is_none() {
                changes.push(Change::AddView {
                    schema: to.name.clone(),
                    view: v2.clone(),
                });
            }
        }

        changes
    }

    fn table_changes(&self, from: &Table, to: &Table) -> Result<Vec<TableChange>> {
        let mut changes = Vec::new();

        for c1 in &from.columns {
            match to.column(&c1.name) {
                None => changes.push(TableChange::DropColumn { column: c1.clone() }),
                Some(c2) if column_changed(c1, c2) => changes.push(TableChange::ModifyColumn {
                    from: c1.clone(),
                    to: c2.clone(),
                }),
                Some(_) => {}
            }
        }
        for c2 in &to.columns {
            if from.column(&c2.name).is_none() {
                changes.push(TableChange::AddColumn { column: c2.clone() });
            }
        }
        if from.comment != to.comment {
            changes.push(TableChange::ModifyAttr {
                name: "comment".to_string(),
                from: from.comment.clone(),
                to: to.comment.clone(),
            });
        }
        changes.extend(self.capabilities.table_attr_diff(from, to)?);

        Ok(changes)
    }
}

/// Resolved types compare by object key, so two columns of the same enum are
/// equal even when the enum's values differ; that difference is reported on
/// the enum itself.
fn column_changed(from: &Column, to: &Column) -> bool {
    from.ty != to.ty || from.nullable != to.nullable || from.default != to.default
}

fn view_changed(from: &View, to: &View) -> bool {
    from.definition.trim() != to.definition.trim() || from.comment != to.comment
}

/// The object's back-reference must name the schema holding it; comments and
/// statements are phrased from it.
fn check_owner(schema: &Schema, object: &schemashift_core::Object) -> Result<()> {
    if object.schema() == schema.name {
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "schema {:?} not found for {} reference {:?} (stored in {:?})",
            object.schema(),
            object.kind(),
            object.name(),
            schema.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemashift_core::{ColumnType, EnumType, Object, ObjectKind, OpaqueObject};

    fn schema(objects: Vec<Object>) -> Schema {
        Schema::new("public").with_objects(objects)
    }

    fn status(values: &[&str]) -> Object {
        EnumType::new("public", "status", values.iter().copied()).into()
    }

    #[test]
    fn same_schema_yields_no_changes() {
        let s = schema(vec![status(&["a", "b"])]);
        assert!(Differ::community().diff_objects(&s, &s).unwrap().is_empty());
    }

    #[test]
    fn reordered_values_are_a_modification() {
        let changes = Differ::community()
            .diff_objects(&schema(vec![status(&["a", "b"])]), &schema(vec![status(&["b", "a"])]))
            .unwrap();
        assert_eq!(
            changes,
            vec![Change::ModifyObject {
                from: status(&["a", "b"]),
                to: status(&["b", "a"]),
            }]
        );
    }

    #[test]
    fn unsupported_kinds_are_skipped() {
        let domain = Object::Other(OpaqueObject {
            kind: ObjectKind::Domain,
            name: "email".to_string(),
            schema: "public".to_string(),
            definition: serde_json::Value::Null,
        });
        let changes = Differ::community()
            .diff_objects(&schema(vec![domain]), &schema(Vec::new()))
            .unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn misplaced_object_is_an_internal_error() {
        let stray: Object = EnumType::new("elsewhere", "status", ["a"]).into();
        let err = Differ::community()
            .diff_objects(&schema(vec![stray]), &schema(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn tables_report_column_changes() {
        let from = Schema::new("public").with_tables(vec![Table::new(
            "t",
            vec![
                Column::new("id", ColumnType::primitive("int4")),
                Column::new("old", ColumnType::primitive("text")),
            ],
        )]);
        let to = Schema::new("public").with_tables(vec![Table::new(
            "t",
            vec![
                Column::new("id", ColumnType::primitive("int8")),
                Column::new("new", ColumnType::primitive("text")).nullable(),
            ],
        )]);
        let changes = Differ::community().diff_tables(&from, &to).unwrap();
        let Change::ModifyTable { changes, .. } = &changes[0] else {
            panic!("expected table modification");
        };
        let kinds: Vec<&str> = changes
            .iter()
            .map(|c| match c {
                TableChange::AddColumn { .. } => "add",
                TableChange::DropColumn { .. } => "drop",
                TableChange::ModifyColumn { .. } => "modify",
                TableChange::ModifyAttr { .. } => "attr",
            })
            .collect();
        assert_eq!(kinds, vec!["modify", "drop", "add"]);
    }

    #[test]
    fn skip_option_filters_change_kinds() {
        let from = Realm::new(vec![schema(vec![status(&["a"])])]);
        let to = Realm::new(vec![schema(Vec::new())]);
        let differ = Differ::community();
        let all = differ.diff_realm(&from, &to, &DiffOptions::default()).unwrap();
        assert_eq!(all.len(), 1);
        let filtered = differ
            .diff_realm(&from, &to, &DiffOptions::default().skip(ChangeKind::DropObject))
            .unwrap();
        assert!(filtered.is_empty());
    }
}
