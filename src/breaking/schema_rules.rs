//! Resource structure rules

use std::collections::BTreeSet;

use super::{BreakingChange, MessageContext, Replacements, RuleInfo};
use crate::diff::ResourceDiff;

/// Rule over a whole resource diff; may fire once per field
#[derive(Debug, Clone)]
pub struct ResourceSchemaRule {
    pub info: RuleInfo,
    /// Returns the offending fields with their template replacements
    pub is_rule_break: fn(&ResourceDiff) -> Vec<(String, Replacements)>,
}

impl ResourceSchemaRule {
    pub fn check(&self, resource: &str, diff: &ResourceDiff, docs_base_url: &str) -> Vec<BreakingChange> {
        (self.is_rule_break)(diff)
            .into_iter()
            .map(|(field, replacements)| {
                self.info.breaking_change(
                    &MessageContext { resource, field: Some(&field) },
                    &replacements,
                    docs_base_url,
                )
            })
            .collect()
    }
}

pub fn resource_schema_rules() -> Vec<ResourceSchemaRule> {
    vec![REMOVING_A_FIELD, ADDING_EXACTLY_ONE_OF]
}

pub const REMOVING_A_FIELD: ResourceSchemaRule = ResourceSchemaRule {
    info: RuleInfo {
        name: "Removing or Renaming an field",
        definition: "In terraform fields should be retained whenever possible. A removable of an field will result in a configuration breakage wherever a dependency on that field exists. Renaming or Removing a field are functionally equivalent in terms of configuration breakages.",
        template: "Field {{field}} within resource {{resource}} was either removed or renamed",
        identifier: "resource-schema-field-removal-or-rename",
    },
    is_rule_break: removing_a_field,
};

fn removing_a_field(diff: &ResourceDiff) -> Vec<(String, Replacements)> {
    diff.fields
        .iter()
        .filter(|(_, field_diff)| field_diff.is_removed())
        .map(|(field, _)| (field.clone(), Replacements::new()))
        .collect()
}

pub const ADDING_EXACTLY_ONE_OF: ResourceSchemaRule = ResourceSchemaRule {
    info: RuleInfo {
        name: "Adding an existing field to an exactly-one-of group",
        definition: "Adding a field that already existed to an ExactlyOneOf group, or creating a new group out of existing fields, rejects configurations that set none or several of the grouped fields. Only fields added in the same change may join such a group.",
        template: "Field {{field}} within resource {{resource}} was added to exactly one of",
        identifier: "resource-schema-field-addition-to-exactly-one-of",
    },
    is_rule_break: adding_exactly_one_of,
};

fn adding_exactly_one_of(diff: &ResourceDiff) -> Vec<(String, Replacements)> {
    let exactly_one_of = |side: Option<&crate::diff::FieldConflictSets>| -> BTreeSet<String> {
        side.and_then(|s| s.exactly_one_of.as_ref())
            .map(|s| s.fields().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    };
    let old_fields = exactly_one_of(diff.field_sets.old.as_ref());
    let new_fields = exactly_one_of(diff.field_sets.new.as_ref());

    new_fields
        .difference(&old_fields)
        .filter(|field| {
            diff.fields
                .get(field.as_str())
                .is_some_and(|field_diff| field_diff.old.is_some())
        })
        .map(|field| (field.clone(), Replacements::new()))
        .collect()
}
