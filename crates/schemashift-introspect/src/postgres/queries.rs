use sqlx::PgPool;

use schemashift_core::{Error, Result};

fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

pub async fn list_schemas(pool: &PgPool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select nspname::text
        from pg_namespace
        order by nspname
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

#[derive(Debug, sqlx::FromRow)]
pub struct RawTable {
    pub oid: i64,
    pub table_schema: String,
    pub table_name: String,
    pub comment: Option<String>,
    pub partition_attrs: Option<String>,
    pub partition_strategy: Option<String>,
    pub partition_exprs: Option<String>,
    pub attrs: String,
}

/// Base tables of `schemas`, excluding partitions and tables owned by an
/// extension, optionally restricted to `tables`.
pub async fn list_tables(
    pool: &PgPool,
    schemas: &[String],
    tables: Option<&[String]>,
) -> Result<Vec<RawTable>> {
    sqlx::query_as::<_, RawTable>(
        r#"
        select
          t3.oid::int8 as oid,
          t1.table_schema::text as table_schema,
          t1.table_name::text as table_name,
          pg_catalog.obj_description(t3.oid, 'pg_class') as comment,
          t4.partattrs::text as partition_attrs,
          t4.partstrat::text as partition_strategy,
          pg_get_expr(t4.partexprs, t4.partrelid) as partition_exprs,
          '{}'::text as attrs
        from information_schema.tables as t1
        join pg_catalog.pg_namespace as t2 on t2.nspname = t1.table_schema
        join pg_catalog.pg_class as t3 on t3.relnamespace = t2.oid and t3.relname = t1.table_name
        left join pg_catalog.pg_partitioned_table as t4 on t4.partrelid = t3.oid
        left join pg_depend as t5
          on t5.classid = 'pg_catalog.pg_class'::regclass::oid
          and t5.objid = t3.oid
          and t5.deptype = 'e'
        where t1.table_type = 'BASE TABLE'
          and not coalesce(t3.relispartition, false)
          and t1.table_schema::text = any($1)
          and ($2::text[] is null or t1.table_name::text = any($2))
          and t5.objid is null
        order by t1.table_schema, t1.table_name
        "#,
    )
    .bind(schemas)
    .bind(tables)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

#[derive(Debug, sqlx::FromRow)]
pub struct RawColumn {
    pub name: String,
    /// `format_type` rendering, e.g. `character varying(20)` or `mood[]`.
    pub data_type: String,
    pub udt_schema: String,
    pub udt_name: String,
    /// `pg_type.typtype` of the column type (`e` for enums).
    pub type_kind: String,
    pub element_schema: Option<String>,
    pub element_name: Option<String>,
    /// `pg_type.typtype` of the array element type, for array columns.
    pub element_kind: Option<String>,
    pub is_nullable: bool,
    pub default: Option<String>,
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type,
          tn.nspname::text as udt_schema,
          t.typname::text as udt_name,
          t.typtype::text as type_kind,
          en.nspname::text as element_schema,
          et.typname::text as element_name,
          et.typtype::text as element_kind,
          (not a.attnotnull) as is_nullable,
          pg_get_expr(ad.adbin, ad.adrelid) as "default"
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        join pg_type t on t.oid = a.atttypid
        join pg_namespace tn on tn.oid = t.typnamespace
        left join pg_type et on et.oid = t.typelem and t.typcategory = 'A'
        left join pg_namespace en on en.oid = et.typnamespace
        left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

#[derive(Debug, sqlx::FromRow)]
pub struct RawEnumType {
    pub schema: String,
    pub name: String,
    pub labels: Vec<String>,
}

pub async fn list_enums(pool: &PgPool, schemas: &[String]) -> Result<Vec<RawEnumType>> {
    sqlx::query_as::<_, RawEnumType>(
        r#"
        select
          n.nspname::text as schema,
          t.typname::text as name,
          array_agg(e.enumlabel::text order by e.enumsortorder) as labels
        from pg_type t
        join pg_namespace n on n.oid = t.typnamespace
        join pg_enum e on e.enumtypid = t.oid
        where n.nspname::text = any($1)
        group by n.nspname, t.typname
        order by n.nspname, t.typname
        "#,
    )
    .bind(schemas)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}
