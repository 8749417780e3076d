//! Lowering of changes into forward and reverse commands.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use schemashift_core::{Change, Column, Error, Object, Result, Table, TableChange};

use crate::hooks::{Capabilities, Community};
use crate::kinds::{KindRegistry, ModifyPolicy, ObjectKindHandler};

/// A change rendered as an executable command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedChange {
    /// Change this command was lowered from.
    pub source: Change,
    pub cmd: String,
    /// Command undoing `cmd`, when one exists.
    pub reverse: Option<String>,
    pub comment: String,
}

impl PlannedChange {
    pub fn new(source: &Change, cmd: String, reverse: Option<String>, comment: String) -> Self {
        Self {
            source: source.clone(),
            cmd,
            reverse,
            comment,
        }
    }
}

/// Ordered list of planned changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    /// True when every planned change carries a reverse command.
    pub fn reversible(&self) -> bool {
        self.changes.iter().all(|c| c.reverse.is_some())
    }

    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.cmd.as_str())
    }

    /// Reverse commands in undo order.
    pub fn reverse_statements(&self) -> Vec<&str> {
        self.changes
            .iter()
            .rev()
            .filter_map(|c| c.reverse.as_deref())
            .collect()
    }
}

/// Orders changes and lowers them into a [`Plan`].
#[derive(Clone)]
pub struct Planner {
    capabilities: Arc<dyn Capabilities>,
    kinds: KindRegistry,
}

impl Planner {
    pub fn new(capabilities: Arc<dyn Capabilities>, kinds: KindRegistry) -> Self {
        Self {
            capabilities,
            kinds,
        }
    }

    pub fn community() -> Self {
        Self::new(Arc::new(Community), KindRegistry::community())
    }

    /// Verify, order and lower `changes`.
    pub fn plan(&self, changes: Vec<Change>) -> Result<Plan> {
        self.capabilities.verify_changes(&changes)?;
        let changes = self.capabilities.sort_changes(changes);
        let changes = self.capabilities.detach_cycles(changes)?;

        let mut plan = Plan::default();
        for change in &changes {
            plan.changes.extend(self.lower(change)?);
        }
        info!(
            changes = changes.len(),
            statements = plan.changes.len(),
            "plan lowered"
        );
        Ok(plan)
    }

    /// Lower a single change.
    pub fn lower(&self, change: &Change) -> Result<Vec<PlannedChange>> {
        let caps = self.capabilities.as_ref();
        match change {
            Change::AddSchema { schema } => {
                let name = quote_ident(&schema.name);
                Ok(vec![PlannedChange::new(
                    change,
                    format!("CREATE SCHEMA {name}"),
                    Some(format!("DROP SCHEMA {name} CASCADE")),
                    format!("add new schema named {:?}", schema.name),
                )])
            }
            Change::DropSchema { schema } => {
                let name = quote_ident(&schema.name);
                // CASCADE takes the contents along; CREATE SCHEMA only restores an empty one.
                let reverse = schema
                    .is_empty()
                    .then(|| format!("CREATE SCHEMA {name}"));
                Ok(vec![PlannedChange::new(
                    change,
                    format!("DROP SCHEMA {name} CASCADE"),
                    reverse,
                    format!("drop schema named {:?}", schema.name),
                )])
            }
            Change::AddObject { object } => self.lower_object(change, object, |h| {
                let (create, drop) = h.create_drop(object)?;
                Ok(vec![PlannedChange::new(
                    change,
                    create,
                    Some(drop),
                    format!("create {}", h.label(object)),
                )])
            }),
            Change::DropObject { object } => self.lower_object(change, object, |h| {
                let (create, drop) = h.create_drop(object)?;
                Ok(vec![PlannedChange::new(
                    change,
                    drop,
                    Some(create),
                    format!("drop {}", h.label(object)),
                )])
            }),
            Change::ModifyObject { from, to } => {
                self.lower_object(change, from, |h| lower_modify(h, change, from, to))
            }
            Change::AddTable { schema, table } => {
                let (create, drop) = create_drop_table(schema, table);
                let mut planned = vec![PlannedChange::new(
                    change,
                    create,
                    Some(drop),
                    format!("create {:?} table", table.name),
                )];
                if let Some(comment) = &table.comment {
                    planned.push(PlannedChange::new(
                        change,
                        comment_on_table(schema, &table.name, Some(comment)),
                        None,
                        format!("set comment to table: {:?}", table.name),
                    ));
                }
                planned.extend(caps.lower_table_attrs(change)?);
                Ok(planned)
            }
            Change::DropTable { schema, table } => {
                let (create, drop) = create_drop_table(schema, table);
                Ok(vec![PlannedChange::new(
                    change,
                    drop,
                    Some(create),
                    format!("drop {:?} table", table.name),
                )])
            }
            Change::ModifyTable {
                schema,
                from,
                changes,
                ..
            } => {
                let mut planned = Vec::new();
                let (forward, reverse) = alter_table_clauses(changes);
                if !forward.is_empty() {
                    let name = qualified(schema, &from.name);
                    planned.push(PlannedChange::new(
                        change,
                        format!("ALTER TABLE {name} {}", forward.join(", ")),
                        Some(format!("ALTER TABLE {name} {}", reverse.join(", "))),
                        format!("modify {:?} table", from.name),
                    ));
                }
                for attr in changes {
                    if let TableChange::ModifyAttr { name, from: old, to } = attr {
                        if name == "comment" {
                            planned.push(PlannedChange::new(
                                change,
                                comment_on_table(schema, &from.name, to.as_deref()),
                                Some(comment_on_table(schema, &from.name, old.as_deref())),
                                format!("set comment to table: {:?}", from.name),
                            ));
                        }
                    }
                }
                planned.extend(caps.lower_table_attrs(change)?);
                Ok(planned)
            }
            Change::AddView { .. }
            | Change::DropView { .. }
            | Change::ModifyView { .. }
            | Change::RenameView { .. } => caps.lower_view(change),
            Change::AddFunc { .. }
            | Change::DropFunc { .. }
            | Change::ModifyFunc { .. }
            | Change::RenameFunc { .. } => caps.lower_func(change),
            Change::AddProc { .. }
            | Change::DropProc { .. }
            | Change::ModifyProc { .. }
            | Change::RenameProc { .. } => caps.lower_proc(change),
            Change::AddTrigger { .. }
            | Change::DropTrigger { .. }
            | Change::ModifyTrigger { .. }
            | Change::RenameTrigger { .. } => caps.lower_trigger(change),
            Change::AddRealmObject { .. } | Change::DropRealmObject { .. } => {
                caps.lower_realm_object(change)
            }
        }
    }

    fn lower_object(
        &self,
        change: &Change,
        object: &Object,
        lower: impl FnOnce(&dyn ObjectKindHandler) -> Result<Vec<PlannedChange>>,
    ) -> Result<Vec<PlannedChange>> {
        match self.kinds.handler_for(object) {
            Some(handler) => lower(handler),
            None => {
                debug!(kind = %object.kind(), name = object.name(), %change, "no handler, nothing to lower");
                Ok(Vec::new())
            }
        }
    }
}

fn lower_modify(
    handler: &dyn ObjectKindHandler,
    change: &Change,
    from: &Object,
    to: &Object,
) -> Result<Vec<PlannedChange>> {
    match handler.modify_policy() {
        ModifyPolicy::Alter => {
            let comment = format!("alter {}", handler.label(to));
            Ok(handler
                .alter(from, to)?
                .into_iter()
                .map(|cmd| PlannedChange::new(change, cmd, None, comment.clone()))
                .collect())
        }
        ModifyPolicy::Recreate => {
            let (create_from, drop_from) = handler.create_drop(from)?;
            let (create_to, drop_to) = handler.create_drop(to)?;
            Ok(vec![
                PlannedChange::new(
                    change,
                    drop_from,
                    Some(create_from),
                    format!("drop {}", handler.label(from)),
                ),
                PlannedChange::new(
                    change,
                    create_to,
                    Some(drop_to),
                    format!("create {}", handler.label(to)),
                ),
            ])
        }
        ModifyPolicy::Reject => Err(Error::UnsupportedChange(format!(
            "{} cannot be modified",
            handler.label(from)
        ))),
    }
}

fn create_drop_table(schema: &str, table: &Table) -> (String, String) {
    let name = qualified(schema, &table.name);
    let columns: Vec<String> = table.columns.iter().map(column_definition).collect();
    (
        format!("CREATE TABLE {name} ({})", columns.join(", ")),
        format!("DROP TABLE {name}"),
    )
}

fn column_definition(column: &Column) -> String {
    let mut def = format!("{} {}", quote_ident(&column.name), column.ty);
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(default);
    }
    def
}

/// Forward and reverse `ALTER TABLE` clauses for column changes.
fn alter_table_clauses(changes: &[TableChange]) -> (Vec<String>, Vec<String>) {
    let mut forward = Vec::new();
    let mut reverse = Vec::new();
    for change in changes {
        match change {
            TableChange::AddColumn { column } => {
                forward.push(format!("ADD COLUMN {}", column_definition(column)));
                reverse.push(format!("DROP COLUMN {}", quote_ident(&column.name)));
            }
            TableChange::DropColumn { column } => {
                forward.push(format!("DROP COLUMN {}", quote_ident(&column.name)));
                reverse.push(format!("ADD COLUMN {}", column_definition(column)));
            }
            TableChange::ModifyColumn { from, to } => {
                forward.extend(alter_column(from, to));
                reverse.extend(alter_column(to, from));
            }
            TableChange::ModifyAttr { .. } => {}
        }
    }
    (forward, reverse)
}

fn alter_column(from: &Column, to: &Column) -> Vec<String> {
    let name = quote_ident(&to.name);
    let mut clauses = Vec::new();
    if from.ty != to.ty {
        clauses.push(format!("ALTER COLUMN {name} TYPE {}", to.ty));
    }
    if from.nullable != to.nullable {
        let action = if to.nullable { "DROP" } else { "SET" };
        clauses.push(format!("ALTER COLUMN {name} {action} NOT NULL"));
    }
    if from.default != to.default {
        match &to.default {
            Some(default) => clauses.push(format!("ALTER COLUMN {name} SET DEFAULT {default}")),
            None => clauses.push(format!("ALTER COLUMN {name} DROP DEFAULT")),
        }
    }
    clauses
}

fn comment_on_table(schema: &str, table: &str, comment: Option<&str>) -> String {
    let value = comment.map_or_else(|| "NULL".to_string(), quote_literal);
    format!("COMMENT ON TABLE {} IS {value}", qualified(schema, table))
}

/// `"name"` with embedded quotes doubled.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `'value'` with embedded quotes doubled.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(crate) fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}
