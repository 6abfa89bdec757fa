//! Field attribute rules
//!
//! Only evaluated when a field exists in both snapshots; additions and
//! removals belong to the resource structure rules.

use super::{BreakingChange, MessageContext, Replacements, RuleInfo};
use crate::diff::FieldDiff;
use crate::schema::{ConfigMode, FieldSchema};

/// Rule over the old and new definition of a single field
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub info: RuleInfo,
    /// `None` for rules that cannot be detected from the schema alone
    pub is_rule_break: Option<fn(&FieldSchema, &FieldSchema) -> Option<Replacements>>,
}

impl FieldRule {
    pub fn check(
        &self,
        resource: &str,
        field: &str,
        diff: &FieldDiff,
        docs_base_url: &str,
    ) -> Option<BreakingChange> {
        let is_rule_break = self.is_rule_break?;
        let (old, new) = (diff.old.as_ref()?, diff.new.as_ref()?);
        let replacements = is_rule_break(old, new)?;
        Some(self.info.breaking_change(
            &MessageContext { resource, field: Some(field) },
            &replacements,
            docs_base_url,
        ))
    }

    pub fn undetectable(&self) -> bool {
        self.is_rule_break.is_none()
    }
}

pub fn field_rules() -> Vec<FieldRule> {
    vec![
        CHANGING_TYPE,
        BECOMING_REQUIRED,
        BECOMING_COMPUTED_ONLY,
        OPTIONAL_COMPUTED_TO_OPTIONAL,
        DEFAULT_MODIFICATION,
        GROWING_MIN,
        SHRINKING_MAX,
        REMOVING_DIFF_SUPPRESS,
        ADDING_SUBFIELD_TO_CONFIG_MODE_ATTR,
        CHANGING_FIELD_DATA_FORMAT,
    ]
}

pub const CHANGING_FIELD_DATA_FORMAT: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Changing field data format",
        definition: "Modification of the data format (either by the API or manually) will cause a diff in subsequent plans if that field is not Computed. This results in a breakage. API breaking changes are out of scope with respect to provider responsibility but we may make changes in response to API breakages in some instances to provide more customer stability.",
        template: "",
        identifier: "field-changing-data-format",
    },
    is_rule_break: None,
};

pub const CHANGING_TYPE: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Changing Field Type",
        definition: "While certain Field Type migrations may be supported at a technical level, it's a practice that we highly discourage. We see little value for these transitions vs the risk they impose.",
        template: "Field {{field}} changed from {{oldType}} to {{newType}} on {{resource}}",
        identifier: "field-changing-type",
    },
    is_rule_break: Some(changing_type),
};

fn changing_type(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    if old.value_type != new.value_type {
        return Some(vec![
            ("oldType", old.value_type.to_string()),
            ("newType", new.value_type.to_string()),
        ]);
    }
    let (old_elem, new_elem) = (old.scalar_elem()?, new.scalar_elem()?);
    if old_elem.value_type != new_elem.value_type {
        return Some(vec![
            ("oldType", format!("{}.{}", old.value_type, old_elem.value_type)),
            ("newType", format!("{}.{}", new.value_type, new_elem.value_type)),
        ]);
    }
    None
}

pub const BECOMING_REQUIRED: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Field becoming Required Field",
        definition: "A field cannot become required as existing configs may not have this field defined. Thus, breaking configs in sequential plan or applies. If you are adding Required to a field so a block won't remain empty, this can cause two issues. First if it's a singular nested field the block may gain more fields later and it's not clear whether the field is actually required so it may be misinterpreted by future contributors. Second if users are defining empty blocks in existing configurations this change will break them. Consider these points in admittance of this type of change.",
        template: "Field {{field}} changed from optional to required on {{resource}}",
        identifier: "field-optional-to-required",
    },
    is_rule_break: Some(becoming_required),
};

fn becoming_required(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    (!old.required && new.required).then(Vec::new)
}

pub const BECOMING_COMPUTED_ONLY: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Becoming a Computed only Field",
        definition: "While a field can go from Optional to Optional+Computed it cannot go from Required or Optional to only Computed. This transition would effectively make the field read-only thus breaking configs in sequential plan or applies where this field is defined in a configuration.",
        template: "Field {{field}} became Computed only on {{resource}}",
        identifier: "field-becoming-computed",
    },
    is_rule_break: Some(becoming_computed_only),
};

fn becoming_computed_only(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    (!old.is_output_only() && new.is_output_only()).then(Vec::new)
}

pub const OPTIONAL_COMPUTED_TO_OPTIONAL: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Optional and Computed to Optional",
        definition: "A field cannot go from Computed + Optional to Optional. On a sequential `apply` the terraform state will have the previously computed value. The value won't be present in the config, thus ultimately causing a diff.",
        template: "Field {{field}} transitioned from optional+computed to optional {{resource}}",
        identifier: "field-oc-to-c",
    },
    is_rule_break: Some(optional_computed_to_optional),
};

fn optional_computed_to_optional(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    (old.computed && old.optional && new.optional && !new.computed).then(Vec::new)
}

pub const DEFAULT_MODIFICATION: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Adding or Changing a Default Value",
        definition: "Adding a default value where one was not previously declared can work in a very limited subset of scenarios but is an all around 'not good' practice to engage in. Changing a default value will absolutely cause a breakage. The mechanism of break for both scenarios is current terraform deployments now gain a diff with sequential applies where the diff is the new or changed default value.",
        template: "Field {{field}} default value changed from {{oldDefault}} to {{newDefault}} on {{resource}}",
        identifier: "field-changing-default-value",
    },
    is_rule_break: Some(default_modification),
};

fn default_modification(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    let show = |value: &Option<serde_json::Value>| match value {
        Some(v) => v.to_string(),
        None => "unset".to_string(),
    };
    (old.default != new.default).then(|| {
        vec![
            ("oldDefault", show(&old.default)),
            ("newDefault", show(&new.default)),
        ]
    })
}

fn show_items(items: usize) -> String {
    if items == 0 {
        "unset".to_string()
    } else {
        items.to_string()
    }
}

pub const GROWING_MIN: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Growing Minimum Items",
        definition: "MinItems cannot grow. Otherwise existing terraform configurations that don't satisfy this rule will break.",
        template: "Field {{field}} MinItems went from {{oldMin}} to {{newMin}} on {{resource}}",
        identifier: "field-growing-min",
    },
    is_rule_break: Some(growing_min),
};

fn growing_min(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    (old.min_items < new.min_items).then(|| {
        vec![
            ("oldMin", show_items(old.min_items)),
            ("newMin", show_items(new.min_items)),
        ]
    })
}

pub const SHRINKING_MAX: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Shrinking Maximum Items",
        definition: "MaxItems cannot shrink. Otherwise existing terraform configurations that don't satisfy this rule will break.",
        template: "Field {{field}} MaxItems went from {{oldMax}} to {{newMax}} on {{resource}}",
        identifier: "field-shrinking-max",
    },
    is_rule_break: Some(shrinking_max),
};

// An unset MaxItems is unbounded, so any new limit shrinks it.
fn shrinking_max(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    (old.max_items > new.max_items || (old.max_items == 0 && new.max_items > 0)).then(|| {
        vec![
            ("oldMax", show_items(old.max_items)),
            ("newMax", show_items(new.max_items)),
        ]
    })
}

pub const REMOVING_DIFF_SUPPRESS: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Removing Diff Suppress Function",
        definition: "Diff suppress functions cannot be removed. Otherwise terraform configurations that previously had no diffs would show diffs.",
        template: "Field {{field}} lost its diff suppress function on {{resource}}",
        identifier: "field-removing-diff-suppress",
    },
    is_rule_break: Some(removing_diff_suppress),
};

fn removing_diff_suppress(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    (old.funcs.diff_suppress && !new.funcs.diff_suppress).then(Vec::new)
}

pub const ADDING_SUBFIELD_TO_CONFIG_MODE_ATTR: FieldRule = FieldRule {
    info: RuleInfo {
        name: "Adding a subfield to a SchemaConfigModeAttr field",
        definition: "Subfields cannot be added to fields with SchemaConfigModeAttr because they will be treated as required even if optional.",
        template: "Field {{field}} gained a subfield {{subfield}} when it has SchemaConfigModeAttr on {{resource}}",
        identifier: "field-adding-subfield-to-config-mode-attr",
    },
    is_rule_break: Some(adding_subfield_to_config_mode_attr),
};

fn adding_subfield_to_config_mode_attr(old: &FieldSchema, new: &FieldSchema) -> Option<Replacements> {
    if new.config_mode != ConfigMode::Attr {
        return None;
    }
    let (old_block, new_block) = (old.block()?, new.block()?);
    new_block
        .schema
        .keys()
        .find(|subfield| !old_block.schema.contains_key(*subfield))
        .map(|subfield| vec![("subfield", format!("`{subfield}`"))])
}
