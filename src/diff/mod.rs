//! Structural diff of two provider schema snapshots
//!
//! Each resource's field tree is flattened into dot-joined paths, then the
//! old and new entries for every path are compared. Only changed fields are
//! kept; a resource appears in the [`SchemaDiff`] only when its presence
//! differs between snapshots or at least one of its fields changed.

pub mod conflicts;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::schema::{FieldSchema, ResourceMap};
pub use conflicts::{
    diff_field_conflict_sets, merge_field_conflict_sets, ConflictKind, ConflictSet,
    FieldConflictSets, FieldConflictSetsDiff, SetOfConflictSets,
};

/// Resource type name to the diff of that resource
pub type SchemaDiff = BTreeMap<String, ResourceDiff>;

/// Presence of a resource in each snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct ResourceConfigDiff {
    pub in_old: bool,
    pub in_new: bool,
}

impl ResourceConfigDiff {
    pub fn is_added(&self) -> bool {
        !self.in_old && self.in_new
    }

    pub fn is_removed(&self) -> bool {
        self.in_old && !self.in_new
    }

    pub fn presence_changed(&self) -> bool {
        self.in_old != self.in_new
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ResourceDiff {
    pub resource_config: ResourceConfigDiff,
    /// Running merge of every changed field's relationship diff
    pub field_sets: FieldConflictSetsDiff,
    pub fields: BTreeMap<String, FieldDiff>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct FieldDiff {
    pub old: Option<FieldSchema>,
    pub new: Option<FieldSchema>,
    pub field_sets: Option<FieldConflictSetsDiff>,
}

impl FieldDiff {
    pub fn is_added(&self) -> bool {
        self.old.is_none() && self.new.is_some()
    }

    pub fn is_removed(&self) -> bool {
        self.old.is_some() && self.new.is_none()
    }
}

/// Compute the diff between two snapshots
pub fn compute_schema_diff(old: &ResourceMap, new: &ResourceMap) -> SchemaDiff {
    let mut schema_diff = SchemaDiff::new();
    let resources: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    for resource in resources {
        let old_resource = old.get(resource);
        let new_resource = new.get(resource);

        let flattened_old = old_resource
            .map(|r| flatten_schema("", &r.schema))
            .unwrap_or_default();
        let flattened_new = new_resource
            .map(|r| flatten_schema("", &r.schema))
            .unwrap_or_default();

        let mut resource_diff = ResourceDiff {
            resource_config: ResourceConfigDiff {
                in_old: old_resource.is_some(),
                in_new: new_resource.is_some(),
            },
            ..ResourceDiff::default()
        };

        let keys: BTreeSet<&String> = flattened_old.keys().chain(flattened_new.keys()).collect();
        for key in keys {
            let old_field = flattened_old.get(key).copied();
            let new_field = flattened_new.get(key).copied();
            if let Some(field_diff) = diff_field(old_field, new_field) {
                if let Some(sets) = &field_diff.field_sets {
                    resource_diff.field_sets.merge(sets);
                }
                resource_diff.fields.insert(key.clone(), field_diff);
            }
        }

        if !resource_diff.fields.is_empty() || resource_diff.resource_config.presence_changed() {
            debug!(
                resource = %resource,
                changed_fields = resource_diff.fields.len(),
                "resource changed"
            );
            schema_diff.insert(resource.clone(), resource_diff);
        }
    }
    schema_diff
}

/// Flatten a field tree into `path -> field`.
///
/// Every field gets an entry. Children are expanded only below composite
/// sub-resource fields, and only here, so a nested field is emitted once at
/// its own path.
pub fn flatten_schema<'a>(
    parent: &str,
    fields: &'a BTreeMap<String, FieldSchema>,
) -> BTreeMap<String, &'a FieldSchema> {
    let mut flattened = BTreeMap::new();
    for (name, field) in fields {
        let key = if parent.is_empty() {
            name.clone()
        } else {
            format!("{parent}.{name}")
        };
        if let Some(block) = field.block() {
            flattened.extend(flatten_schema(&key, &block.schema));
        }
        flattened.insert(key, field);
    }
    flattened
}

/// Compare one flattened path across snapshots; `None` when unchanged
pub fn diff_field(old: Option<&FieldSchema>, new: Option<&FieldSchema>) -> Option<FieldDiff> {
    let field_sets = diff_field_conflict_sets(
        old.and_then(FieldConflictSets::from_field).as_ref(),
        new.and_then(FieldConflictSets::from_field).as_ref(),
    );
    let changed = match (old, new) {
        (None, None) => false,
        (Some(o), Some(n)) => schema_changed(o, n) || field_sets.is_some(),
        _ => true,
    };
    changed.then(|| FieldDiff {
        old: old.cloned(),
        new: new.cloned(),
        field_sets,
    })
}

fn schema_changed(old: &FieldSchema, new: &FieldSchema) -> bool {
    attributes_changed(old, new)
        || elem_changed(old, new)
        || old.funcs.toggled(&new.funcs)
        || conflict_keys_changed(old, new)
}

fn attributes_changed(old: &FieldSchema, new: &FieldSchema) -> bool {
    old.value_type != new.value_type
        || old.config_mode != new.config_mode
        || old.required != new.required
        || old.optional != new.optional
        || old.computed != new.computed
        || old.force_new != new.force_new
        || old.diff_suppress_on_refresh != new.diff_suppress_on_refresh
        || old.default != new.default
        || old.description != new.description
        || old.input_default != new.input_default
        || old.min_items != new.min_items
        || old.max_items != new.max_items
        || old.deprecated != new.deprecated
        || old.sensitive != new.sensitive
}

// Composite children are compared at their own flattened paths.
fn elem_changed(old: &FieldSchema, new: &FieldSchema) -> bool {
    if old.is_composite() != new.is_composite() {
        return true;
    }
    match (old.scalar_elem(), new.scalar_elem()) {
        (Some(o), Some(n)) => schema_changed(o, n),
        (None, None) => false,
        _ => true,
    }
}

fn conflict_keys_changed(old: &FieldSchema, new: &FieldSchema) -> bool {
    let key = |f: &FieldSchema| FieldConflictSets::from_field(f).map(|s| s.key);
    key(old) != key(new)
}
