use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::Object;
use crate::schema::{Column, Func, Schema, Table, Trigger, View};

/// A single difference between two snapshots.
///
/// Every variant carries the entities it originated from so that lowering can
/// render forward and reverse commands without going back to the realms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    AddSchema { schema: Schema },
    DropSchema { schema: Schema },
    AddObject { object: Object },
    DropObject { object: Object },
    ModifyObject { from: Object, to: Object },
    AddTable { schema: String, table: Table },
    DropTable { schema: String, table: Table },
    ModifyTable {
        schema: String,
        from: Table,
        to: Table,
        changes: Vec<TableChange>,
    },
    AddView { schema: String, view: View },
    DropView { schema: String, view: View },
    ModifyView { schema: String, from: View, to: View },
    RenameView { schema: String, from: View, to: View },
    AddFunc { schema: String, func: Func },
    DropFunc { schema: String, func: Func },
    ModifyFunc { schema: String, from: Func, to: Func },
    RenameFunc { schema: String, from: Func, to: Func },
    AddProc { schema: String, proc: Func },
    DropProc { schema: String, proc: Func },
    ModifyProc { schema: String, from: Func, to: Func },
    RenameProc { schema: String, from: Func, to: Func },
    AddTrigger {
        schema: String,
        table: String,
        trigger: Trigger,
    },
    DropTrigger {
        schema: String,
        table: String,
        trigger: Trigger,
    },
    ModifyTrigger {
        schema: String,
        table: String,
        from: Trigger,
        to: Trigger,
    },
    RenameTrigger {
        schema: String,
        table: String,
        from: Trigger,
        to: Trigger,
    },
    /// Database-level object (extension, role, ...) added.
    AddRealmObject { object: Object },
    /// Database-level object dropped.
    DropRealmObject { object: Object },
}

/// Fieldless tag of a [`Change`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    AddSchema,
    DropSchema,
    AddObject,
    DropObject,
    ModifyObject,
    AddTable,
    DropTable,
    ModifyTable,
    AddView,
    DropView,
    ModifyView,
    RenameView,
    AddFunc,
    DropFunc,
    ModifyFunc,
    RenameFunc,
    AddProc,
    DropProc,
    ModifyProc,
    RenameProc,
    AddTrigger,
    DropTrigger,
    ModifyTrigger,
    RenameTrigger,
    AddRealmObject,
    DropRealmObject,
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::AddSchema { .. } => ChangeKind::AddSchema,
            Change::DropSchema { .. } => ChangeKind::DropSchema,
            Change::AddObject { .. } => ChangeKind::AddObject,
            Change::DropObject { .. } => ChangeKind::DropObject,
            Change::ModifyObject { .. } => ChangeKind::ModifyObject,
            Change::AddTable { .. } => ChangeKind::AddTable,
            Change::DropTable { .. } => ChangeKind::DropTable,
            Change::ModifyTable { .. } => ChangeKind::ModifyTable,
            Change::AddView { .. } => ChangeKind::AddView,
            Change::DropView { .. } => ChangeKind::DropView,
            Change::ModifyView { .. } => ChangeKind::ModifyView,
            Change::RenameView { .. } => ChangeKind::RenameView,
            Change::AddFunc { .. } => ChangeKind::AddFunc,
            Change::DropFunc { .. } => ChangeKind::DropFunc,
            Change::ModifyFunc { .. } => ChangeKind::ModifyFunc,
            Change::RenameFunc { .. } => ChangeKind::RenameFunc,
            Change::AddProc { .. } => ChangeKind::AddProc,
            Change::DropProc { .. } => ChangeKind::DropProc,
            Change::ModifyProc { .. } => ChangeKind::ModifyProc,
            Change::RenameProc { .. } => ChangeKind::RenameProc,
            Change::AddTrigger { .. } => ChangeKind::AddTrigger,
            Change::DropTrigger { .. } => ChangeKind::DropTrigger,
            Change::ModifyTrigger { .. } => ChangeKind::ModifyTrigger,
            Change::RenameTrigger { .. } => ChangeKind::RenameTrigger,
            Change::AddRealmObject { .. } => ChangeKind::AddRealmObject,
            Change::DropRealmObject { .. } => ChangeKind::DropRealmObject,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::AddSchema { schema } => write!(f, "+ schema {}", schema.name),
            Change::DropSchema { schema } => write!(f, "- schema {}", schema.name),
            Change::AddObject { object } => {
                write!(f, "+ {} {}.{}", object.kind(), object.schema(), object.name())
            }
            Change::DropObject { object } => {
                write!(f, "- {} {}.{}", object.kind(), object.schema(), object.name())
            }
            Change::ModifyObject { to, .. } => {
                write!(f, "~ {} {}.{}", to.kind(), to.schema(), to.name())
            }
            Change::AddTable { schema, table } => write!(f, "+ table {schema}.{}", table.name),
            Change::DropTable { schema, table } => write!(f, "- table {schema}.{}", table.name),
            Change::ModifyTable {
                schema, to, changes, ..
            } => write!(
                f,
                "~ table {schema}.{} ({} change(s))",
                to.name,
                changes.len()
            ),
            Change::AddView { schema, view } => write!(f, "+ view {schema}.{}", view.name),
            Change::DropView { schema, view } => write!(f, "- view {schema}.{}", view.name),
            Change::ModifyView { schema, to, .. } => write!(f, "~ view {schema}.{}", to.name),
            Change::RenameView { schema, from, to } => {
                write!(f, "> view {schema}.{} -> {}", from.name, to.name)
            }
            Change::AddFunc { schema, func } => write!(f, "+ function {schema}.{}", func.name),
            Change::DropFunc { schema, func } => write!(f, "- function {schema}.{}", func.name),
            Change::ModifyFunc { schema, to, .. } => {
                write!(f, "~ function {schema}.{}", to.name)
            }
            Change::RenameFunc { schema, from, to } => {
                write!(f, "> function {schema}.{} -> {}", from.name, to.name)
            }
            Change::AddProc { schema, proc } => write!(f, "+ procedure {schema}.{}", proc.name),
            Change::DropProc { schema, proc } => write!(f, "- procedure {schema}.{}", proc.name),
            Change::ModifyProc { schema, to, .. } => {
                write!(f, "~ procedure {schema}.{}", to.name)
            }
            Change::RenameProc { schema, from, to } => {
                write!(f, "> procedure {schema}.{} -> {}", from.name, to.name)
            }
            Change::AddTrigger {
                schema,
                table,
                trigger,
            } => write!(f, "+ trigger {schema}.{table}.{}", trigger.name),
            Change::DropTrigger {
                schema,
                table,
                trigger,
            } => write!(f, "- trigger {schema}.{table}.{}", trigger.name),
            Change::ModifyTrigger {
                schema, table, to, ..
            } => write!(f, "~ trigger {schema}.{table}.{}", to.name),
            Change::RenameTrigger {
                schema,
                table,
                from,
                to,
            } => write!(f, "> trigger {schema}.{table}.{} -> {}", from.name, to.name),
            Change::AddRealmObject { object } => {
                write!(f, "+ {} {}", object.kind(), object.name())
            }
            Change::DropRealmObject { object } => {
                write!(f, "- {} {}", object.kind(), object.name())
            }
        }
    }
}

/// Column- and attribute-level change inside a modified table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableChange {
    AddColumn { column: Column },
    DropColumn { column: Column },
    ModifyColumn { from: Column, to: Column },
    /// Table attribute (comment, storage option, ...) changed.
    ModifyAttr {
        name: String,
        from: Option<String>,
        to: Option<String>,
    },
}
