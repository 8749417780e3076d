//! Capability table.
//!
//! Every build-specific behavior is a named extension point with a default.
//! The engine always calls the point; a build flavor decides which points are
//! wired to real logic by overriding the matching [`Capabilities`] method.

use std::fmt;

use tracing::warn;

use schemashift_core::{
    Change, Document, Error, FeatureDecl, Object, Realm, Result, Schema, Table, TableChange, View,
};

use crate::lower::PlannedChange;
use crate::order;

/// Names of all extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtensionPoint {
    TableAttrDiff,
    ViewAttrChanges,
    FuncDiff,
    TriggerDiff,
    RealmObjectDiff,
    DetectRenames,
    LowerTableAttrs,
    LowerView,
    LowerFunc,
    LowerProc,
    LowerTrigger,
    LowerRealmObject,
    ConvertDomains,
    ConvertSequences,
    ConvertPolicies,
    ConvertExtensions,
    ConvertEventTriggers,
    ConvertAggregates,
    NormalizeRealm,
    VerifyChanges,
    SortChanges,
    DetachCycles,
    SchemaObjectsSpec,
    RealmObjectsSpec,
    InspectViews,
    InspectFuncs,
    InspectTypes,
    InspectObjects,
    InspectTriggers,
    InspectDeps,
    InspectRealmObjects,
}

/// Pipeline stage an extension point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Diff,
    Lower,
    Convert,
    Pipeline,
    Export,
    Inspect,
}

impl ExtensionPoint {
    pub const ALL: [ExtensionPoint; 31] = [
        ExtensionPoint::TableAttrDiff,
        ExtensionPoint::ViewAttrChanges,
        ExtensionPoint::FuncDiff,
        ExtensionPoint::TriggerDiff,
        ExtensionPoint::RealmObjectDiff,
        ExtensionPoint::DetectRenames,
        ExtensionPoint::LowerTableAttrs,
        ExtensionPoint::LowerView,
        ExtensionPoint::LowerFunc,
        ExtensionPoint::LowerProc,
        ExtensionPoint::LowerTrigger,
        ExtensionPoint::LowerRealmObject,
        ExtensionPoint::ConvertDomains,
        ExtensionPoint::ConvertSequences,
        ExtensionPoint::ConvertPolicies,
        ExtensionPoint::ConvertExtensions,
        ExtensionPoint::ConvertEventTriggers,
        ExtensionPoint::ConvertAggregates,
        ExtensionPoint::NormalizeRealm,
        ExtensionPoint::VerifyChanges,
        ExtensionPoint::SortChanges,
        ExtensionPoint::DetachCycles,
        ExtensionPoint::SchemaObjectsSpec,
        ExtensionPoint::RealmObjectsSpec,
        ExtensionPoint::InspectViews,
        ExtensionPoint::InspectFuncs,
        ExtensionPoint::InspectTypes,
        ExtensionPoint::InspectObjects,
        ExtensionPoint::InspectTriggers,
        ExtensionPoint::InspectDeps,
        ExtensionPoint::InspectRealmObjects,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExtensionPoint::TableAttrDiff => "table_attr_diff",
            ExtensionPoint::ViewAttrChanges => "view_attr_changes",
            ExtensionPoint::FuncDiff => "func_diff",
            ExtensionPoint::TriggerDiff => "trigger_diff",
            ExtensionPoint::RealmObjectDiff => "realm_object_diff",
            ExtensionPoint::DetectRenames => "detect_renames",
            ExtensionPoint::LowerTableAttrs => "lower_table_attrs",
            ExtensionPoint::LowerView => "lower_view",
            ExtensionPoint::LowerFunc => "lower_func",
            ExtensionPoint::LowerProc => "lower_proc",
            ExtensionPoint::LowerTrigger => "lower_trigger",
            ExtensionPoint::LowerRealmObject => "lower_realm_object",
            ExtensionPoint::ConvertDomains => "convert_domains",
            ExtensionPoint::ConvertSequences => "convert_sequences",
            ExtensionPoint::ConvertPolicies => "convert_policies",
            ExtensionPoint::ConvertExtensions => "convert_extensions",
            ExtensionPoint::ConvertEventTriggers => "convert_event_triggers",
            ExtensionPoint::ConvertAggregates => "convert_aggregates",
            ExtensionPoint::NormalizeRealm => "normalize_realm",
            ExtensionPoint::VerifyChanges => "verify_changes",
            ExtensionPoint::SortChanges => "sort_changes",
            ExtensionPoint::DetachCycles => "detach_cycles",
            ExtensionPoint::SchemaObjectsSpec => "schema_objects_spec",
            ExtensionPoint::RealmObjectsSpec => "realm_objects_spec",
            ExtensionPoint::InspectViews => "inspect_views",
            ExtensionPoint::InspectFuncs => "inspect_funcs",
            ExtensionPoint::InspectTypes => "inspect_types",
            ExtensionPoint::InspectObjects => "inspect_objects",
            ExtensionPoint::InspectTriggers => "inspect_triggers",
            ExtensionPoint::InspectDeps => "inspect_deps",
            ExtensionPoint::InspectRealmObjects => "inspect_realm_objects",
        }
    }

    pub fn stage(self) -> Stage {
        use ExtensionPoint::*;
        match self {
            TableAttrDiff | ViewAttrChanges | FuncDiff | TriggerDiff | RealmObjectDiff
            | DetectRenames => Stage::Diff,
            LowerTableAttrs | LowerView | LowerFunc | LowerProc | LowerTrigger
            | LowerRealmObject => Stage::Lower,
            ConvertDomains | ConvertSequences | ConvertPolicies | ConvertExtensions
            | ConvertEventTriggers | ConvertAggregates => Stage::Convert,
            NormalizeRealm | VerifyChanges | SortChanges | DetachCycles => Stage::Pipeline,
            SchemaObjectsSpec | RealmObjectsSpec => Stage::Export,
            InspectViews | InspectFuncs | InspectTypes | InspectObjects | InspectTriggers
            | InspectDeps | InspectRealmObjects => Stage::Inspect,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build-specific behavior, one method per [`ExtensionPoint`].
///
/// Defaults are the restricted-build behavior: diff and lowering points add
/// nothing, conversion guards reject any declaration of the feature they
/// guard, and ordering delegates to [`order::sort_changes`].
pub trait Capabilities: Send + Sync {
    /// Flavor name reported in logs.
    fn name(&self) -> &str {
        "community"
    }

    /// Whether this flavor wires `point` to real logic.
    fn provides(&self, _point: ExtensionPoint) -> bool {
        false
    }

    /// Extra attribute changes between two versions of a table.
    fn table_attr_diff(&self, _from: &Table, _to: &Table) -> Result<Vec<TableChange>> {
        Ok(Vec::new())
    }

    /// Extra attribute changes between two versions of a view. A non-empty
    /// result turns the pair into a modified view.
    fn view_attr_changes(&self, _from: &View, _to: &View) -> Vec<TableChange> {
        Vec::new()
    }

    /// Changes to functions and procedures of a schema.
    fn func_diff(&self, _from: &Schema, _to: &Schema) -> Result<Vec<Change>> {
        Ok(Vec::new())
    }

    /// Changes to the triggers of a table present on both sides.
    fn trigger_diff(&self, _schema: &str, _from: &Table, _to: &Table) -> Result<Vec<Change>> {
        Ok(Vec::new())
    }

    /// Changes to database-level objects (extensions, roles, ...).
    fn realm_object_diff(&self, _from: &Realm, _to: &Realm) -> Result<Vec<Change>> {
        Ok(Vec::new())
    }

    /// Rewrite drop/add pairs into renames.
    fn detect_renames(&self, changes: Vec<Change>) -> Vec<Change> {
        changes
    }

    fn lower_table_attrs(&self, _change: &Change) -> Result<Vec<PlannedChange>> {
        Ok(Vec::new())
    }

    fn lower_view(&self, _change: &Change) -> Result<Vec<PlannedChange>> {
        Ok(Vec::new())
    }

    fn lower_func(&self, _change: &Change) -> Result<Vec<PlannedChange>> {
        Ok(Vec::new())
    }

    fn lower_proc(&self, _change: &Change) -> Result<Vec<PlannedChange>> {
        Ok(Vec::new())
    }

    fn lower_trigger(&self, _change: &Change) -> Result<Vec<PlannedChange>> {
        Ok(Vec::new())
    }

    fn lower_realm_object(&self, _change: &Change) -> Result<Vec<PlannedChange>> {
        Ok(Vec::new())
    }

    /// Declaration conversions. Each returns the objects built from `decls`;
    /// the resolver attaches them once every check has passed.
    fn convert_domains(&self, decls: &[FeatureDecl], _realm: &Realm) -> Result<Vec<Object>> {
        reject_declared("domains", decls, ExtensionPoint::ConvertDomains)
    }

    fn convert_sequences(&self, decls: &[FeatureDecl], _realm: &Realm) -> Result<Vec<Object>> {
        reject_declared("sequences", decls, ExtensionPoint::ConvertSequences)
    }

    fn convert_policies(&self, decls: &[FeatureDecl], _realm: &Realm) -> Result<Vec<Object>> {
        reject_declared("policies", decls, ExtensionPoint::ConvertPolicies)
    }

    fn convert_extensions(&self, decls: &[FeatureDecl], _realm: &Realm) -> Result<Vec<Object>> {
        reject_declared("extensions", decls, ExtensionPoint::ConvertExtensions)
    }

    fn convert_event_triggers(&self, decls: &[FeatureDecl], _realm: &Realm) -> Result<Vec<Object>> {
        reject_declared("event triggers", decls, ExtensionPoint::ConvertEventTriggers)
    }

    fn convert_aggregates(&self, decls: &[FeatureDecl], _realm: &Realm) -> Result<Vec<Object>> {
        reject_declared("aggregates", decls, ExtensionPoint::ConvertAggregates)
    }

    /// Final touch on a realm after resolution.
    fn normalize_realm(&self, _realm: &mut Realm) -> Result<()> {
        Ok(())
    }

    /// Refuse change sets this flavor cannot apply safely.
    fn verify_changes(&self, _changes: &[Change]) -> Result<()> {
        Ok(())
    }

    fn sort_changes(&self, changes: Vec<Change>) -> Vec<Change> {
        order::sort_changes(changes)
    }

    /// Split changes that take part in a dependency cycle.
    fn detach_cycles(&self, changes: Vec<Change>) -> Result<Vec<Change>> {
        Ok(changes)
    }

    /// Add schema-level declarations beyond enums to an exported document.
    fn schema_objects_spec(&self, _doc: &mut Document, _schema: &Schema) -> Result<()> {
        Ok(())
    }

    /// Add realm-level declarations to an exported document.
    fn realm_objects_spec(&self, _doc: &mut Document, _realm: &Realm) -> Result<()> {
        Ok(())
    }
}

/// The restricted build: every point keeps its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Community;

impl Capabilities for Community {}

fn reject_declared(
    feature: &str,
    decls: &[FeatureDecl],
    point: ExtensionPoint,
) -> Result<Vec<Object>> {
    if decls.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
    warn!(feature, declared = ?names, "declarations rejected by this build");
    Err(Error::unsupported_feature(
        format!("postgres: {feature}"),
        point.as_str(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str) -> FeatureDecl {
        FeatureDecl {
            name: name.to_string(),
            schema: None,
            definition: serde_json::Value::Null,
        }
    }

    #[test]
    fn names_are_unique_and_round_trip() {
        let mut names: Vec<&str> = ExtensionPoint::ALL.iter().map(|p| p.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ExtensionPoint::ALL.len());
        for point in ExtensionPoint::ALL {
            assert_eq!(ExtensionPoint::from_name(point.as_str()), Some(point));
        }
    }

    #[test]
    fn community_guards_name_the_feature() {
        let realm = Realm::default();
        assert_eq!(Community.convert_domains(&[], &realm).unwrap(), Vec::new());

        let err = Community
            .convert_domains(&[decl("email")], &realm)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "postgres: domains are not supported by this build. \
             Use a build that provides the `convert_domains` capability."
        );

        let err = Community
            .convert_event_triggers(&[decl("audit")], &realm)
            .unwrap_err();
        assert!(err.to_string().starts_with("postgres: event triggers"));
    }

    #[test]
    fn community_provides_nothing() {
        assert!(
            ExtensionPoint::ALL
                .into_iter()
                .all(|point| !Community.provides(point))
        );
        assert_eq!(Community.name(), "community");
    }
}
