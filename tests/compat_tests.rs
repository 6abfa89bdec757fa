//! End-to-end tests for diffing, rule evaluation and coverage detection
//!
//! Snapshots are written to temporary directories and loaded through the
//! same loaders the command line uses.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use schema_compat::config::DetectorConfig;
use schema_compat::schema::ConfigMode;
use schema_compat::diff::{merge_field_conflict_sets, FieldConflictSets};
use schema_compat::{
    compute_breaking_changes, compute_schema_diff, detect_missing_tests, load_resource_map, load_tests,
    FieldSchema, ResourceMap, ResourceSchema, RuleSet, SchemaDiffSummary, ValueType,
};

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn resources(entries: Vec<(&str, ResourceSchema)>) -> ResourceMap {
    entries.into_iter().map(|(name, r)| (name.to_string(), r)).collect()
}

fn optional_string() -> FieldSchema {
    FieldSchema::new(ValueType::String).optional()
}

fn messages(old: &ResourceMap, new: &ResourceMap) -> Vec<String> {
    compute_breaking_changes(&compute_schema_diff(old, new), &RuleSet::default())
        .into_iter()
        .map(|c| c.message)
        .collect()
}

// =============================================================================
// Schema Diff
// =============================================================================

#[test]
fn test_added_and_removed_resources_are_symmetric() {
    let a = resources(vec![("google_a", ResourceSchema::new().field("f", optional_string()))]);
    let b = resources(vec![("google_b", ResourceSchema::new().field("f", optional_string()))]);

    let forward = compute_schema_diff(&a, &b);
    let backward = compute_schema_diff(&b, &a);
    assert!(forward["google_b"].resource_config.is_added());
    assert!(forward["google_a"].resource_config.is_removed());
    assert!(backward["google_b"].resource_config.is_removed());
    assert!(backward["google_a"].resource_config.is_added());
}

#[test]
fn test_identical_snapshots_have_no_diff() {
    let a = resources(vec![(
        "google_a",
        ResourceSchema::new().field("f", optional_string()).field(
            "block",
            FieldSchema::new(ValueType::List)
                .optional()
                .with_block(ResourceSchema::new().field("inner", optional_string())),
        ),
    )]);
    assert!(compute_schema_diff(&a, &a).is_empty());
}

#[test]
fn test_permuted_conflicts_are_unchanged() {
    let mut old_field = optional_string();
    old_field.conflicts_with = vec!["a".into(), "b".into(), "c".into()];
    let mut new_field = optional_string();
    new_field.conflicts_with = vec!["c".into(), "a".into(), "b".into()];

    let old = resources(vec![("google_x", ResourceSchema::new().field("f", old_field.clone()))]);
    let new = resources(vec![("google_x", ResourceSchema::new().field("f", new_field.clone()))]);
    assert!(compute_schema_diff(&old, &new).is_empty());

    let old_key = FieldConflictSets::from_field(&old_field).map(|s| s.key);
    let new_key = FieldConflictSets::from_field(&new_field).map(|s| s.key);
    assert_eq!(old_key, new_key);
}

#[test]
fn test_conflict_set_merge_laws() {
    let mut x_field = optional_string();
    x_field.conflicts_with = vec!["a".into(), "b".into()];
    x_field.required_with = vec!["c".into()];
    let mut y_field = optional_string();
    y_field.exactly_one_of = vec!["d".into(), "e".into()];

    let x = FieldConflictSets::from_field(&x_field);
    let y = FieldConflictSets::from_field(&y_field);

    assert_eq!(merge_field_conflict_sets(x.as_ref(), None).map(|s| s.key), x.as_ref().map(|s| s.key.clone()));
    assert_eq!(
        merge_field_conflict_sets(x.as_ref(), x.as_ref()).map(|s| s.key),
        x.as_ref().map(|s| s.key.clone())
    );
    assert_eq!(
        merge_field_conflict_sets(x.as_ref(), y.as_ref()).map(|s| s.key),
        merge_field_conflict_sets(y.as_ref(), x.as_ref()).map(|s| s.key)
    );
}

#[test]
fn test_snapshot_files_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let old = write(
        dir.path(),
        "old.json",
        r#"{
            "google_x_resource": {"schema": {"field_a": {"type": "string", "optional": true}}},
            "google_gone": {"schema": {"field_a": {"type": "string", "optional": true}}}
        }"#,
    );
    let new = write(
        dir.path(),
        "new.json",
        r#"{
            "google_x_resource": {"schema": {"field_a": {"type": "string", "required": true}}},
            "google_new": {"schema": {}}
        }"#,
    );
    let diff = compute_schema_diff(&load_resource_map(&old).unwrap(), &load_resource_map(&new).unwrap());
    let summary = SchemaDiffSummary::from_diff(&diff);
    assert_eq!(summary.added_resources, vec!["google_new"]);
    assert_eq!(summary.modified_resources, vec!["google_x_resource"]);
    assert_eq!(summary.removed_resources, vec!["google_gone"]);
}

// =============================================================================
// Breaking Changes
// =============================================================================

#[test]
fn test_removed_field_reported_once() {
    let old = resources(vec![(
        "google-x",
        ResourceSchema::new().field("a", optional_string()).field("b", optional_string()),
    )]);
    let new = resources(vec![("google-x", ResourceSchema::new().field("a", optional_string()))]);
    assert_eq!(
        messages(&old, &new),
        vec!["Field `b` within resource `google-x` was either removed or renamed"]
    );
}

#[test]
fn test_optional_to_required_single_message() {
    let expected = vec!["Field `field-a` changed from optional to required on `google-x`"];
    let new = resources(vec![(
        "google-x",
        ResourceSchema::new().field("field-a", FieldSchema::new(ValueType::String).required()),
    )]);

    let optional = resources(vec![("google-x", ResourceSchema::new().field("field-a", optional_string()))]);
    assert_eq!(messages(&optional, &new), expected);

    let optional_computed = resources(vec![(
        "google-x",
        ResourceSchema::new().field("field-a", optional_string().computed()),
    )]);
    assert_eq!(messages(&optional_computed, &new), expected);
}

#[test]
fn test_item_limits() {
    let list = |min: usize, max: usize| {
        let mut field = FieldSchema::new(ValueType::List).optional().with_elem(FieldSchema::new(ValueType::String));
        field.min_items = min;
        field.max_items = max;
        resources(vec![("google-x", ResourceSchema::new().field("items", field))])
    };

    let growing = messages(&list(1, 0), &list(4, 0));
    assert_eq!(growing, vec!["Field `items` MinItems went from 1 to 4 on `google-x`"]);

    let shrinking = messages(&list(0, 20), &list(0, 2));
    assert_eq!(shrinking, vec!["Field `items` MaxItems went from 20 to 2 on `google-x`"]);

    let from_unset = messages(&list(0, 0), &list(2, 2));
    assert_eq!(from_unset.len(), 2);
    assert!(from_unset.iter().any(|m| m.contains("MinItems went from unset to 2")));
    assert!(from_unset.iter().any(|m| m.contains("MaxItems went from unset to 2")));
}

#[test]
fn test_config_mode_attr_subfield() {
    let attr_block = |description: &str, children: &[&str]| {
        let mut block = ResourceSchema::new();
        for child in children {
            block = block.field(*child, optional_string());
        }
        let mut field = FieldSchema::new(ValueType::List)
            .optional()
            .with_description(description)
            .with_block(block);
        field.config_mode = ConfigMode::Attr;
        resources(vec![("google-x", ResourceSchema::new().field("block", field))])
    };

    // Children are compared at their own paths, so a new subfield alone
    // leaves the parent unchanged and the rule has nothing to inspect.
    let old = attr_block("x", &["a"]);
    let diff = compute_schema_diff(&old, &attr_block("x", &["a", "b"]));
    let fields: Vec<&str> = diff["google-x"].fields.keys().map(String::as_str).collect();
    assert_eq!(fields, vec!["block.b"]);
    assert!(messages(&old, &attr_block("x", &["a", "b"])).is_empty());

    // Once the parent itself changes the subfield is reported.
    assert_eq!(
        messages(&old, &attr_block("y", &["a", "b"])),
        vec!["Field `block` gained a subfield `b` when it has SchemaConfigModeAttr on `google-x`"]
    );
}

#[test]
fn test_removed_resource_single_message() {
    let old = resources(vec![(
        "google-x",
        ResourceSchema::new().field("a", optional_string()).field("b", optional_string()),
    )]);
    let changes = compute_breaking_changes(&compute_schema_diff(&old, &ResourceMap::new()), &RuleSet::default());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].message, "Resource `google-x` was either removed or renamed");
    assert!(changes[0].field.is_none());
    assert!(changes[0]
        .documentation_reference
        .ends_with("#resource-map-resource-removal-or-rename"));
}

#[test]
fn test_rule_identifiers_unique_across_tiers() {
    let identifiers = RuleSet::default().identifiers();
    let unique: HashSet<&str> = identifiers.iter().copied().collect();
    assert_eq!(unique.len(), identifiers.len());
}

// =============================================================================
// Coverage
// =============================================================================

#[test]
fn test_uncovered_resource_snippet() {
    let old = resources(vec![(
        "uncovered_resource",
        ResourceSchema::new().field(
            "field_two",
            FieldSchema::new(ValueType::List)
                .optional()
                .with_block(ResourceSchema::new().field("field_three", FieldSchema::new(ValueType::Int).optional())),
        ),
    )]);
    let new = resources(vec![(
        "uncovered_resource",
        ResourceSchema::new().field("field_one", optional_string()).field(
            "field_two",
            FieldSchema::new(ValueType::List)
                .optional()
                .with_block(ResourceSchema::new().field("field_three", optional_string())),
        ),
    )]);
    let diff = compute_schema_diff(&old, &new);

    let missing = detect_missing_tests(&diff, &[], &DetectorConfig::default());
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].resource, "uncovered_resource");
    assert_eq!(missing[0].untested_fields, vec!["field_one", "field_two.field_three"]);
    assert!(missing[0].tests.is_empty());
    assert_eq!(
        missing[0].suggested_test,
        r#"resource "uncovered_resource" "primary" {
  field_one = # value needed
  field_two {
    field_three = # value needed
  }
}
"#
    );
}

#[test]
fn test_missing_tests_from_corpus_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "covered.json",
        r#"{"name": "TestAccCovered", "steps": [{"covered_resource": {"primary": {"field_one": "a"}}}]}"#,
    );
    write(dir.path(), "broken.json", "{");
    let (tests, errors) = load_tests(dir.path());
    assert_eq!(errors.len(), 1);

    let new = resources(vec![
        ("covered_resource", ResourceSchema::new().field("field_one", optional_string())),
        (
            "partly_covered",
            ResourceSchema::new().field("field_one", optional_string()).field("field_two", optional_string()),
        ),
    ]);
    let diff = compute_schema_diff(&ResourceMap::new(), &new);
    let missing = detect_missing_tests(&diff, &tests, &DetectorConfig::default());
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].resource, "partly_covered");
    assert_eq!(missing[0].untested_fields, vec!["field_one", "field_two"]);
}
