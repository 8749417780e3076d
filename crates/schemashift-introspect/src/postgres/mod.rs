use std::collections::BTreeSet;
use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info};

use schemashift_core::{Realm, Result, Schema};

use crate::hooks::{CommunityInspect, InspectHooks};
use crate::inspector::Inspector;
use crate::options::InspectOptions;

mod mapper;
mod queries;

/// Inspector for PostgreSQL databases.
#[derive(Clone)]
pub struct PostgresInspector {
    pool: PgPool,
    hooks: Arc<dyn InspectHooks>,
}

impl PostgresInspector {
    /// Create an inspector with the no-op inspection hooks.
    pub fn new(pool: PgPool) -> Self {
        Self::with_hooks(pool, Arc::new(CommunityInspect))
    }

    pub fn with_hooks(pool: PgPool, hooks: Arc<dyn InspectHooks>) -> Self {
        Self { pool, hooks }
    }
}

#[async_trait::async_trait]
impl Inspector for PostgresInspector {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn inspect(&self, opts: &InspectOptions) -> Result<Realm> {
        inspect(&self.pool, self.hooks.as_ref(), opts).await
    }
}

/// Inspect Postgres with the no-op inspection hooks.
pub async fn inspect_postgres(pool: &PgPool, opts: &InspectOptions) -> Result<Realm> {
    inspect(pool, &CommunityInspect, opts).await
}

async fn inspect(
    pool: &PgPool,
    hooks: &dyn InspectHooks,
    opts: &InspectOptions,
) -> Result<Realm> {
    let names = mapper::filter_schemas(queries::list_schemas(pool).await?, opts);
    let mut schemas: Vec<Schema> = names.iter().map(Schema::new).collect();
    if schemas.is_empty() {
        info!("no schema matched the inspect options");
        return Ok(Realm::default());
    }

    let mut enums = BTreeSet::new();
    if opts.include_types {
        for object in mapper::map_enums(queries::list_enums(pool, &names).await?) {
            enums.insert(object.key());
            if let Some(schema) = schemas.iter_mut().find(|s| s.name == object.schema()) {
                schema.objects.push(object);
            }
        }
    }

    let raw_tables = queries::list_tables(pool, &names, opts.tables.as_deref()).await?;
    for raw in raw_tables {
        let schema_name = raw.table_schema.clone();
        let mut table = mapper::map_table(raw, opts);
        let raw_columns = queries::list_columns(pool, &schema_name, &table.name).await?;
        table.columns = mapper::map_columns(raw_columns, &enums);
        debug!(schema = %schema_name, table = %table.name, columns = table.columns.len(), "table inspected");

        if let Some(schema) = schemas.iter_mut().find(|s| s.name == schema_name) {
            schema.tables.push(table);
        }
    }

    let mut realm = Realm::new(schemas);
    run_hooks(pool, hooks, &mut realm, opts).await?;

    info!(
        schemas = realm.schemas.len(),
        tables = realm.schemas.iter().map(|s| s.tables.len()).sum::<usize>(),
        enums = enums.len(),
        "postgres inspected"
    );
    Ok(realm)
}

async fn run_hooks(
    pool: &PgPool,
    hooks: &dyn InspectHooks,
    realm: &mut Realm,
    opts: &InspectOptions,
) -> Result<()> {
    hooks.inspect_views(pool, realm, opts).await?;
    hooks.inspect_funcs(pool, realm, opts).await?;
    hooks.inspect_types(pool, realm, opts).await?;
    hooks.inspect_objects(pool, realm, opts).await?;
    hooks.inspect_triggers(pool, realm, opts).await?;
    hooks.inspect_deps(pool, realm, opts).await?;
    hooks.inspect_realm_objects(pool, realm, opts).await
}

