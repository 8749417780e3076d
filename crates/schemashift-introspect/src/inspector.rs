use async_trait::async_trait;

use schemashift_core::{Realm, Result};

use crate::options::InspectOptions;

/// Trait implemented by database inspectors.
#[async_trait]
pub trait Inspector {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Inspect the database and return a realm snapshot.
    async fn inspect(&self, opts: &InspectOptions) -> Result<Realm>;
}
