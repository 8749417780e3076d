//! Resolution, diffing and lowering of realm snapshots.
//!
//! Every build-specific behavior goes through a [`Capabilities`] table and
//! every object kind through a [`KindRegistry`], both chosen when the
//! [`Engine`] is built.

use std::sync::Arc;

pub mod diff;
pub mod export;
pub mod hooks;
pub mod kinds;
pub mod lower;
pub mod order;
pub mod resolve;

pub use diff::{DiffOptions, Differ};
pub use export::export_document;
pub use hooks::{Capabilities, Community, ExtensionPoint, Stage};
pub use kinds::{EnumKind, KindRegistry, ModifyPolicy, ObjectKindHandler};
pub use lower::{Plan, PlannedChange, Planner};
pub use resolve::{ResolveSummary, Resolver};

/// Capability table and kind registry shared by the resolver, differ and
/// planner of one build flavor.
#[derive(Clone)]
pub struct Engine {
    capabilities: Arc<dyn Capabilities>,
    kinds: KindRegistry,
}

impl Engine {
    pub fn new(capabilities: Arc<dyn Capabilities>, kinds: KindRegistry) -> Self {
        Self {
            capabilities,
            kinds,
        }
    }

    /// The restricted build: default hooks, enums only.
    pub fn community() -> Self {
        Self::new(Arc::new(Community), KindRegistry::community())
    }

    pub fn capabilities(&self) -> &dyn Capabilities {
        self.capabilities.as_ref()
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::clone(&self.capabilities))
    }

    pub fn differ(&self) -> Differ {
        Differ::new(Arc::clone(&self.capabilities), self.kinds.clone())
    }

    pub fn planner(&self) -> Planner {
        Planner::new(Arc::clone(&self.capabilities), self.kinds.clone())
    }
}
