//! Inspection extension points.
//!
//! The base inspector only reads schemas, base tables, columns and enums.
//! Everything else is collected through these points, which do nothing unless
//! a fuller build overrides them.

use async_trait::async_trait;
use sqlx::PgPool;

use schemashift_core::{Realm, Result};

use crate::options::InspectOptions;

/// Auxiliary collections filled after the base inspection. Each point receives
/// the realm built so far.
#[async_trait]
pub trait InspectHooks: Send + Sync {
    async fn inspect_views(
        &self,
        _pool: &PgPool,
        _realm: &mut Realm,
        _opts: &InspectOptions,
    ) -> Result<()> {
        Ok(())
    }

    async fn inspect_funcs(
        &self,
        _pool: &PgPool,
        _realm: &mut Realm,
        _opts: &InspectOptions,
    ) -> Result<()> {
        Ok(())
    }

    /// Types other than enums (domains, composites, ...).
    async fn inspect_types(
        &self,
        _pool: &PgPool,
        _realm: &mut Realm,
        _opts: &InspectOptions,
    ) -> Result<()> {
        Ok(())
    }

    /// Schema objects such as sequences and policies.
    async fn inspect_objects(
        &self,
        _pool: &PgPool,
        _realm: &mut Realm,
        _opts: &InspectOptions,
    ) -> Result<()> {
        Ok(())
    }

    async fn inspect_triggers(
        &self,
        _pool: &PgPool,
        _realm: &mut Realm,
        _opts: &InspectOptions,
    ) -> Result<()> {
        Ok(())
    }

    /// Dependencies between objects.
    async fn inspect_deps(
        &self,
        _pool: &PgPool,
        _realm: &mut Realm,
        _opts: &InspectOptions,
    ) -> Result<()> {
        Ok(())
    }

    /// Database-level objects (extensions, event triggers, ...).
    async fn inspect_realm_objects(
        &self,
        _pool: &PgPool,
        _realm: &mut Realm,
        _opts: &InspectOptions,
    ) -> Result<()> {
        Ok(())
    }
}

/// Hooks of the restricted build: every point is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommunityInspect;

impl InspectHooks for CommunityInspect {}
