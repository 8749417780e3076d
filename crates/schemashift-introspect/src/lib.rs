//! Database inspectors producing realm snapshots.

pub mod hooks;
pub mod inspector;
pub mod options;
pub mod postgres;

pub use hooks::{CommunityInspect, InspectHooks};
pub use inspector::Inspector;
pub use options::InspectOptions;
pub use postgres::{PostgresInspector, inspect_postgres};

pub use schemashift_core::Realm;
