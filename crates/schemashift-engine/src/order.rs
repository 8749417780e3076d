//! Default dependency ordering for change lists.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use schemashift_core::{Change, ObjectKey, Table};

/// Order `changes` so that every change runs after the changes it depends on.
///
/// Dependencies considered:
/// - a created schema before anything created inside it
/// - a created or altered object before tables whose columns use it
/// - tables using an object dropped or rewritten before the object is dropped
/// - every non-schema change before a schema drop
///
/// Independent changes keep their input order. Changes caught in a cycle are
/// appended in input order.
pub fn sort_changes(changes: Vec<Change>) -> Vec<Change> {
    let graph = build_adjacency(&changes);
    let order = match toposort(&graph) {
        Ok(order) => order,
        Err((mut order, cycle)) => {
            warn!(changes = cycle.len(), "dependency cycle, keeping input order");
            order.extend(cycle);
            order
        }
    };

    let mut slots: Vec<Option<Change>> = changes.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots.get_mut(idx).and_then(Option::take))
        .collect()
}

/// Edges `i -> j` meaning change `i` must run before change `j`.
fn build_adjacency(changes: &[Change]) -> BTreeMap<usize, BTreeSet<usize>> {
    let mut graph: BTreeMap<usize, BTreeSet<usize>> =
        (0..changes.len()).map(|idx| (idx, BTreeSet::new())).collect();

    for (i, first) in changes.iter().enumerate() {
        for (j, second) in changes.iter().enumerate() {
            if i != j && must_precede(first, second) {
                graph.entry(i).or_default().insert(j);
            }
        }
    }

    graph
}

fn must_precede(first: &Change, second: &Change) -> bool {
    match (first, second) {
        (Change::AddSchema { schema }, other) => {
            !matches!(other, Change::AddSchema { .. } | Change::DropSchema { .. })
                && target_schema(other) == Some(schema.name.as_str())
        }
        // DROP SCHEMA cascades into objects other schemas may still use.
        (other, Change::DropSchema { .. }) => {
            !matches!(other, Change::AddSchema { .. } | Change::DropSchema { .. })
        }
        (Change::AddObject { object }, other) | (Change::ModifyObject { to: object, .. }, other) => {
            let key = object.key();
            new_tables(other).any(|table| uses(table, &key))
        }
        (other, Change::DropObject { object }) => {
            let key = object.key();
            old_tables(other).any(|table| uses(table, &key))
        }
        _ => false,
    }
}

fn target_schema(change: &Change) -> Option<&str> {
    match change {
        Change::AddSchema { schema } | Change::DropSchema { schema } => Some(&schema.name),
        Change::AddObject { object }
        | Change::DropObject { object }
        | Change::ModifyObject { to: object, .. } => Some(object.schema()),
        Change::AddTable { schema, .. }
        | Change::DropTable { schema, .. }
        | Change::ModifyTable { schema, .. }
        | Change::AddView { schema, .. }
        | Change::DropView { schema, .. }
        | Change::ModifyView { schema, .. }
        | Change::RenameView { schema, .. }
        | Change::AddFunc { schema, .. }
        | Change::DropFunc { schema, .. }
        | Change::ModifyFunc { schema, .. }
        | Change::RenameFunc { schema, .. }
        | Change::AddProc { schema, .. }
        | Change::DropProc { schema, .. }
        | Change::ModifyProc { schema, .. }
        | Change::RenameProc { schema, .. }
        | Change::AddTrigger { schema, .. }
        | Change::DropTrigger { schema, .. }
        | Change::ModifyTrigger { schema, .. }
        | Change::RenameTrigger { schema, .. } => Some(schema),
        Change::AddRealmObject { .. } | Change::DropRealmObject { .. } => None,
    }
}

/// Tables as they exist after the change.
fn new_tables(change: &Change) -> impl Iterator<Item = &Table> {
    match change {
        Change::AddTable { table, .. } => Some(table),
        Change::ModifyTable { to, .. } => Some(to),
        _ => None,
    }
    .into_iter()
}

/// Tables as they existed before the change.
fn old_tables(change: &Change) -> impl Iterator<Item = &Table> {
    match change {
        Change::DropTable { table, .. } => Some(table),
        Change::ModifyTable { from, .. } => Some(from),
        _ => None,
    }
    .into_iter()
}

fn uses(table: &Table, key: &ObjectKey) -> bool {
    table
        .columns
        .iter()
        .any(|column| column.ty.object_key() == Some(key))
}

/// Kahn's algorithm; the ready set is ordered by input position so the output
/// is deterministic. On a cycle returns the sorted prefix and the rest.
fn toposort(
    graph: &BTreeMap<usize, BTreeSet<usize>>,
) -> Result<Vec<usize>, (Vec<usize>, Vec<usize>)> {
    let mut indegree: BTreeMap<usize, usize> = graph.keys().map(|node| (*node, 0)).collect();
    for targets in graph.values() {
        for target in targets {
            *indegree.entry(*target).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then_some(*node))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(node) = ready.pop_first() {
        order.push(node);

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(*target);
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle: Vec<usize> = indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect();
        Err((order, cycle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemashift_core::{Column, ColumnType, EnumType, ObjectKind, Schema};

    fn mood_key() -> ObjectKey {
        ObjectKey::new("public", ObjectKind::Enum, "mood")
    }

    fn table_using_mood() -> Table {
        Table::new(
            "t",
            vec![Column::new("m", ColumnType::Object(mood_key()))],
        )
    }

    #[test]
    fn creates_enum_before_table_using_it() {
        let changes = vec![
            Change::AddTable {
                schema: "public".to_string(),
                table: table_using_mood(),
            },
            Change::AddObject {
                object: EnumType::new("public", "mood", ["a"]).into(),
            },
        ];
        let sorted = sort_changes(changes);
        assert!(matches!(sorted[0], Change::AddObject { .. }));
        assert!(matches!(sorted[1], Change::AddTable { .. }));
    }

    #[test]
    fn drops_table_before_enum_it_uses() {
        let changes = vec![
            Change::DropObject {
                object: EnumType::new("public", "mood", ["a"]).into(),
            },
            Change::DropTable {
                schema: "public".to_string(),
                table: table_using_mood(),
            },
        ];
        let sorted = sort_changes(changes);
        assert!(matches!(sorted[0], Change::DropTable { .. }));
        assert!(matches!(sorted[1], Change::DropObject { .. }));
    }

    #[test]
    fn schema_creation_first_and_drop_last() {
        let changes = vec![
            Change::DropSchema {
                schema: Schema::new("old"),
            },
            Change::DropTable {
                schema: "old".to_string(),
                table: Table::new("x", Vec::new()),
            },
            Change::AddTable {
                schema: "new".to_string(),
                table: Table::new("y", Vec::new()),
            },
            Change::AddSchema {
                schema: Schema::new("new"),
            },
        ];
        let kinds: Vec<String> = sort_changes(changes)
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "- table old.x",
                "+ schema new",
                "+ table new.y",
                "- schema old"
            ]
        );
    }

    #[test]
    fn schema_drop_waits_for_changes_in_other_schemas() {
        let old_mood = ObjectKey::new("old", ObjectKind::Enum, "mood");
        let from = Table::new("t", vec![Column::new("m", ColumnType::Object(old_mood))]);
        let to = Table::new("t", vec![Column::new("m", ColumnType::primitive("text"))]);
        let changes = vec![
            Change::DropSchema {
                schema: Schema::new("old")
                    .with_objects(vec![EnumType::new("old", "mood", ["a"]).into()]),
            },
            Change::ModifyTable {
                schema: "public".to_string(),
                from,
                to,
                changes: Vec::new(),
            },
        ];
        let sorted = sort_changes(changes);
        assert!(matches!(sorted[0], Change::ModifyTable { .. }));
        assert!(matches!(sorted[1], Change::DropSchema { .. }));
    }

    #[test]
    fn independent_changes_keep_input_order() {
        let changes: Vec<Change> = ["a", "b", "c"]
            .into_iter()
            .map(|name| Change::AddObject {
                object: EnumType::new("public", name, ["x"]).into(),
            })
            .collect();
        assert_eq!(sort_changes(changes.clone()), changes);
    }

    #[test]
    fn toposort_reports_cycle() {
        let graph: BTreeMap<usize, BTreeSet<usize>> = [
            (0, BTreeSet::from([1])),
            (1, BTreeSet::from([0])),
            (2, BTreeSet::new()),
        ]
        .into_iter()
        .collect();
        let (order, cycle) = toposort(&graph).unwrap_err();
        assert_eq!(order, vec![2]);
        assert_eq!(cycle, vec![0, 1]);
    }
}
