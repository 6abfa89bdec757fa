//! Missing test and missing documentation detection
//!
//! Both detectors start from the same per-resource view of a [`SchemaDiff`]:
//! the leaf fields a user can set that were added or changed. Test coverage
//! is read from parsed acceptance-test configurations, documentation coverage
//! from resource documentation text. Neither detector can fail.

pub mod docs;
pub mod snippet;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::DetectorConfig;
use crate::corpus::{ResourceConfig, Test};
use crate::diff::SchemaDiff;
use crate::schema::normalize_field_path;

pub use docs::{detect_missing_docs, detect_missing_docs_for_datasources, MissingDocInfo};
pub use snippet::suggested_config;

/// Coverage state of one changed field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangedField {
    /// Absent from the old snapshot
    pub added: bool,
    /// Present in both snapshots with a different definition
    pub changed: bool,
    /// Set by at least one test configuration
    pub tested: bool,
}

/// Field path to coverage state for one resource
pub type ResourceChanges = BTreeMap<String, ChangedField>;

/// A resource with changed fields that no test sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTestInfo {
    pub resource: String,
    /// Sorted field paths
    pub untested_fields: Vec<String>,
    /// Configuration that would exercise every untested field
    pub suggested_test: String,
    /// Tests that configure this resource type, in corpus order
    pub tests: Vec<String>,
}

/// Derive the trackable changed fields of every resource in `diff`.
///
/// Removed fields, output-only fields and composite containers are left
/// out, as are the configured ignored fields and the IAM skip fields on
/// resource types whose name contains `iam`. Resources left with nothing
/// to track are omitted.
pub fn changed_fields(diff: &SchemaDiff, config: &DetectorConfig) -> BTreeMap<String, ResourceChanges> {
    let mut changed = BTreeMap::new();
    for (resource, resource_diff) in diff {
        let is_iam = resource.contains("iam");
        let mut changes = ResourceChanges::new();
        for (field, field_diff) in &resource_diff.fields {
            if config.ignored_fields.iter().any(|f| f == field) {
                continue;
            }
            if is_iam && config.iam_skip_fields.iter().any(|f| f == field) {
                continue;
            }
            let Some(new) = &field_diff.new else {
                continue;
            };
            if new.is_output_only() || new.is_composite() {
                continue;
            }
            let added = field_diff.old.is_none();
            changes.insert(
                field.clone(),
                ChangedField {
                    added,
                    changed: !added,
                    tested: false,
                },
            );
        }
        if !changes.is_empty() {
            changed.insert(resource.clone(), changes);
        }
    }
    changed
}

/// Find changed fields that no test in `tests` sets
pub fn detect_missing_tests(diff: &SchemaDiff, tests: &[Test], config: &DetectorConfig) -> Vec<MissingTestInfo> {
    let changed = changed_fields(diff, config);
    missing_tests_for_changes(changed, tests, config)
}

/// Run the coverage pass over already derived changes
pub fn missing_tests_for_changes(
    mut changed: BTreeMap<String, ResourceChanges>,
    tests: &[Test],
    config: &DetectorConfig,
) -> Vec<MissingTestInfo> {
    let mut tests_by_resource: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for test in tests {
        for step in &test.steps {
            for (resource, instances) in step {
                let Some(changes) = changed.get_mut(resource) else {
                    continue;
                };
                let names = tests_by_resource.entry(resource.clone()).or_default();
                if !names.contains(&test.name) {
                    names.push(test.name.clone());
                }
                for instance in instances.values() {
                    mark_coverage(changes, instance);
                }
            }
        }
    }

    let mut missing = Vec::new();
    for (resource, changes) in changed {
        // BTreeMap keys come out sorted
        let untested: Vec<String> = changes
            .iter()
            .filter(|(_, field)| !field.tested)
            .map(|(path, _)| path.clone())
            .collect();
        if untested.is_empty() {
            continue;
        }
        debug!(resource = %resource, untested = untested.len(), "resource has untested fields");
        missing.push(MissingTestInfo {
            suggested_test: suggested_config(
                &resource,
                &config.snippet_label,
                &untested,
                &config.placeholder_marker,
            ),
            tests: tests_by_resource.remove(&resource).unwrap_or_default(),
            untested_fields: untested,
            resource,
        });
    }
    missing
}

fn mark_coverage(changes: &mut ResourceChanges, instance: &ResourceConfig) {
    let mut paths = Vec::new();
    for (key, value) in instance {
        collect_paths(&normalize_field_path(key), value, &mut paths);
    }
    for path in paths {
        if let Some(field) = changes.get_mut(&path) {
            field.tested = true;
        }
    }
}

// A nested block may arrive either as dot-joined keys or as a JSON object.
fn collect_paths(path: &str, value: &serde_json::Value, paths: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(children) => {
            for (name, child) in children {
                collect_paths(&normalize_field_path(&format!("{path}.{name}")), child, paths);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter().filter(|item| item.is_object()) {
                collect_paths(path, item, paths);
            }
        }
        _ => {}
    }
    paths.push(path.to_string());
}
