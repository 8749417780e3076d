mod connection;
mod logging;
mod output;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use schemars::schema_for;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use schemashift_core::{
    Change, ChangeKind, Document, Error as CoreError, Realm, SNAPSHOT_VERSION, validate_realm,
};
use schemashift_engine::{DiffOptions, Engine, ExtensionPoint, PlannedChange};
use schemashift_introspect::{InspectOptions, Inspector, PostgresInspector};

use connection::{detect_engine, redact_connection_string};
use output::{emit_json, emit_text, read_json};
use settings::{LogFormat, Settings, load_settings};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("logging error: {0}")]
    Logging(String),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "schemashift", version, about = "Schema diffing and type resolution")]
struct Cli {
    /// Config file (defaults to ./schemashift.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve document declarations into a realm snapshot.
    Resolve(ResolveArgs),
    /// Compute the changes between two realm snapshots.
    Diff(DiffArgs),
    /// Order and lower the changes between two realm snapshots.
    Plan(PlanArgs),
    /// Inspect a live database into a realm snapshot.
    Inspect(InspectArgs),
    /// List extension points and registered object kinds.
    Capabilities,
    /// Print the JSON Schema of realm or document files.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[arg(long, value_name = "REALM_JSON")]
    realm: PathBuf,
    #[arg(long, value_name = "DOCUMENT_JSON")]
    document: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Current realm snapshot.
    #[arg(long, value_name = "REALM_JSON")]
    from: PathBuf,
    /// Desired realm snapshot.
    #[arg(long, value_name = "REALM_JSON")]
    to: PathBuf,
    /// Document resolved into the desired realm before diffing.
    #[arg(long, value_name = "DOCUMENT_JSON")]
    document: Option<PathBuf>,
    /// Change kind to leave out (e.g. drop_table); repeatable.
    #[arg(long, value_name = "KIND", value_parser = parse_change_kind)]
    skip: Vec<ChangeKind>,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    diff: DiffArgs,
    /// Print statements as SQL instead of JSON.
    #[arg(long, default_value_t = false)]
    sql: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Database connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: String,
    /// Schema name(s) to include.
    #[arg(long, value_name = "SCHEMA")]
    schema: Vec<String>,
    /// Table name(s) to include.
    #[arg(long, value_name = "TABLE")]
    table: Vec<String>,
    /// Include system schemas such as pg_catalog.
    #[arg(long, default_value_t = false)]
    include_system_schemas: bool,
    /// Skip enum types; enum columns stay unresolved references.
    #[arg(long, default_value_t = false)]
    no_types: bool,
    /// Leave out table comments.
    #[arg(long, default_value_t = false)]
    no_comments: bool,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(value_enum, default_value_t = SchemaTarget::Realm)]
    target: SchemaTarget,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaTarget {
    Realm,
    Document,
}

#[derive(Debug, Serialize)]
struct DiffReport {
    version: &'static str,
    changes: Vec<Change>,
}

#[derive(Debug, Serialize)]
struct PlanReport {
    version: &'static str,
    reversible: bool,
    changes: Vec<PlannedChange>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if cli.json_logs {
        settings.log.format = LogFormat::Json;
    }
    logging::init_logging(&settings.log)?;

    let engine = Engine::community();
    match cli.command {
        Command::Resolve(args) => run_resolve(&engine, args),
        Command::Diff(args) => run_diff(&engine, &settings, args),
        Command::Plan(args) => run_plan(&engine, &settings, args),
        Command::Inspect(args) => run_inspect(args).await,
        Command::Capabilities => run_capabilities(&engine),
        Command::Schema(args) => run_schema(args),
    }
}

fn load_realm(path: &Path) -> CliResult<Realm> {
    let realm: Realm = serde_json::from_value(read_json(path)?)
        .map_err(|err| CliError::Input(format!("{}: {err}", path.display())))?;
    validate_realm(&realm)?;
    Ok(realm)
}

fn load_document(path: &Path) -> CliResult<Document> {
    Ok(Document::from_json(&read_json(path)?)?)
}

fn run_resolve(engine: &Engine, args: ResolveArgs) -> CliResult<()> {
    let mut realm = load_realm(&args.realm)?;
    let doc = load_document(&args.document)?;

    let summary = engine.resolver().resolve(&doc, &mut realm)?;
    validate_realm(&realm)?;
    tracing::info!(
        event = "resolve_finished",
        objects = summary.objects,
        columns = summary.columns
    );

    emit_json(args.out.as_deref(), &realm)
}

fn diff_changes(engine: &Engine, settings: &Settings, args: &DiffArgs) -> CliResult<Vec<Change>> {
    let from = load_realm(&args.from)?;
    let mut to = load_realm(&args.to)?;
    if let Some(path) = &args.document {
        let doc = load_document(path)?;
        engine.resolver().resolve(&doc, &mut to)?;
    }

    let opts = DiffOptions {
        skip: settings
            .diff
            .skip
            .iter()
            .chain(args.skip.iter())
            .copied()
            .collect(),
    };
    Ok(engine.differ().diff_realm(&from, &to, &opts)?)
}

fn run_diff(engine: &Engine, settings: &Settings, args: DiffArgs) -> CliResult<()> {
    let changes = diff_changes(engine, settings, &args)?;
    tracing::info!(event = "diff_finished", changes = changes.len());

    let report = DiffReport {
        version: SNAPSHOT_VERSION,
        changes,
    };
    emit_json(args.out.as_deref(), &report)
}

fn run_plan(engine: &Engine, settings: &Settings, args: PlanArgs) -> CliResult<()> {
    let changes = diff_changes(engine, settings, &args.diff)?;
    let plan = engine.planner().plan(changes)?;
    tracing::info!(
        event = "plan_finished",
        statements = plan.changes.len(),
        reversible = plan.reversible()
    );

    if args.sql {
        let mut script = String::new();
        for change in &plan.changes {
            script.push_str(&format!("-- {}\n{};\n", change.comment, change.cmd));
        }
        return emit_text(args.diff.out.as_deref(), &script);
    }

    let report = PlanReport {
        version: SNAPSHOT_VERSION,
        reversible: plan.reversible(),
        changes: plan.changes,
    };
    emit_json(args.diff.out.as_deref(), &report)
}

async fn run_inspect(args: InspectArgs) -> CliResult<()> {
    let engine = detect_engine(&args.conn)?;
    tracing::info!(
        event = "inspect_started",
        engine,
        connection = %redact_connection_string(&args.conn)
    );

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&args.conn)
        .await?;

    let opts = InspectOptions {
        schemas: (!args.schema.is_empty()).then_some(args.schema),
        tables: (!args.table.is_empty()).then_some(args.table),
        include_system_schemas: args.include_system_schemas,
        include_types: !args.no_types,
        include_comments: !args.no_comments,
    };
    let realm = PostgresInspector::new(pool).inspect(&opts).await?;
    validate_realm(&realm)?;
    tracing::info!(event = "inspect_finished", schemas = realm.schemas.len());

    emit_json(args.out.as_deref(), &realm)
}

fn run_capabilities(engine: &Engine) -> CliResult<()> {
    let caps = engine.capabilities();
    let mut text = format!("flavor: {}\n\nextension points:\n", caps.name());
    for point in ExtensionPoint::ALL {
        let state = if caps.provides(point) {
            "provided"
        } else {
            "default"
        };
        text.push_str(&format!(
            "  {:<24} {:<10} {state}\n",
            point.as_str(),
            format!("{:?}", point.stage()).to_lowercase()
        ));
    }
    text.push_str("\nobject kinds:\n");
    for kind in engine.kinds().kinds() {
        text.push_str(&format!("  {kind}\n"));
    }
    emit_text(None, &text)
}

fn run_schema(args: SchemaArgs) -> CliResult<()> {
    match args.target {
        SchemaTarget::Realm => emit_json(None, &schema_for!(Realm)),
        SchemaTarget::Document => emit_json(None, &schema_for!(Document)),
    }
}

fn parse_change_kind(raw: &str) -> Result<ChangeKind, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown change kind {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_kinds_parse_from_snake_case() {
        assert_eq!(parse_change_kind("drop_table"), Ok(ChangeKind::DropTable));
        assert!(parse_change_kind("DropTable").is_err());
    }

    #[test]
    fn cli_parses_plan_flags() {
        let cli = Cli::try_parse_from([
            "schemashift",
            "plan",
            "--from",
            "a.json",
            "--to",
            "b.json",
            "--skip",
            "drop_schema",
            "--sql",
        ])
        .unwrap();
        match cli.command {
            Command::Plan(args) => {
                assert!(args.sql);
                assert_eq!(args.diff.skip, vec![ChangeKind::DropSchema]);
                assert!(args.diff.document.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
