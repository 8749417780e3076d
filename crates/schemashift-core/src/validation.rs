use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::Realm;

/// Validate internal consistency of a realm.
///
/// This checks:
/// - duplicate schemas/tables/views/columns
/// - duplicate (kind, name) objects within a schema
/// - objects whose owning schema name disagrees with their container
/// - resolved column types that do not address an object of this realm
pub fn validate_realm(realm: &Realm) -> Result<()> {
    let mut schemas = BTreeSet::new();

    for schema in &realm.schemas {
        if !schemas.insert(schema.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate schema name: {}",
                schema.name
            )));
        }

        let mut objects = BTreeSet::new();
        for object in &schema.objects {
            if object.schema() != schema.name {
                return Err(Error::InvalidSchema(format!(
                    "{} {} is owned by schema {} but stored in {}",
                    object.kind(),
                    object.name(),
                    object.schema(),
                    schema.name
                )));
            }
            if !objects.insert((object.kind(), object.name())) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate {} name: {}.{}",
                    object.kind(),
                    schema.name,
                    object.name()
                )));
            }
        }

        let mut relations = BTreeSet::new();
        for view in &schema.views {
            if !relations.insert(view.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate view name: {}.{}",
                    schema.name, view.name
                )));
            }
        }

        for table in &schema.tables {
            if !relations.insert(table.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate table name: {}.{}",
                    schema.name, table.name
                )));
            }

            let mut columns = BTreeSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate column name: {}.{}.{}",
                        schema.name, table.name, column.name
                    )));
                }
            }
        }
    }

    for schema in &realm.schemas {
        for table in &schema.tables {
            for column in &table.columns {
                if let Some(key) = column.ty.object_key() {
                    if realm.object(key).is_none() {
                        return Err(Error::InvalidSchema(format!(
                            "column {}.{}.{} points at {} {} outside the realm",
                            schema.name, table.name, column.name, key.kind, key
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Names of columns whose type still waits for resolution, as `schema.table.column`.
pub fn unresolved_columns(realm: &Realm) -> Vec<String> {
    let mut names = Vec::new();
    for schema in &realm.schemas {
        for table in &schema.tables {
            for column in &table.columns {
                if column.ty.unresolved().is_some() {
                    names.push(format!("{}.{}.{}", schema.name, table.name, column.name));
                }
            }
        }
    }
    names
}
