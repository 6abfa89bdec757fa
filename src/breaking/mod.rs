//! Breaking-change rule engine
//!
//! Rules are grouped in three tiers, evaluated per resource of a
//! [`SchemaDiff`]:
//!
//! 1. resource presence ([`resource_rules`])
//! 2. resource structure ([`schema_rules`])
//! 3. field attributes ([`field_rules`])
//!
//! A resource that was added or removed as a whole only goes through the
//! first tier. Rules never fail; a comparison that does not apply yields no
//! message.
//!
//! The rule table is plain data held by a [`RuleSet`], so callers may drop or
//! substitute rules without touching global state.

pub mod field_rules;
pub mod resource_rules;
pub mod schema_rules;

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::config::RulesConfig;
use crate::diff::SchemaDiff;
pub use field_rules::FieldRule;
pub use resource_rules::ResourceConfigRule;
pub use schema_rules::ResourceSchemaRule;

/// Default base of rule documentation anchors
pub const DEFAULT_DOCS_BASE_URL: &str =
    "https://googlecloudplatform.github.io/magic-modules/develop/breaking-changes/breaking-changes";

/// Placeholder substitutions for a rule's message template
pub type Replacements = Vec<(&'static str, String)>;

/// One detected breaking change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakingChange {
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub documentation_reference: String,
    #[serde(skip)]
    pub rule_template: &'static str,
    #[serde(skip)]
    pub rule_name: &'static str,
    #[serde(skip)]
    pub rule_definition: &'static str,
}

/// Name and documentation shared by every rule kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    pub name: &'static str,
    pub definition: &'static str,
    pub template: &'static str,
    pub identifier: &'static str,
}

/// Where a rule fired
pub(crate) struct MessageContext<'a> {
    pub resource: &'a str,
    pub field: Option<&'a str>,
}

impl RuleInfo {
    /// Fill the template and attach documentation for a single violation
    pub(crate) fn breaking_change(
        &self,
        ctx: &MessageContext<'_>,
        replacements: &[(&'static str, String)],
        docs_base_url: &str,
    ) -> BreakingChange {
        let mut message = self
            .template
            .replace("{{resource}}", &format!("`{}`", ctx.resource));
        if let Some(field) = ctx.field {
            message = message.replace("{{field}}", &format!("`{field}`"));
        }
        for (placeholder, value) in replacements {
            message = message.replace(&format!("{{{{{placeholder}}}}}"), value);
        }
        debug!(rule = self.identifier, resource = ctx.resource, "rule fired");
        BreakingChange {
            resource: ctx.resource.to_string(),
            field: ctx.field.map(str::to_string),
            message,
            documentation_reference: format!(
                "{}#{}",
                docs_base_url.trim_end_matches('/'),
                self.identifier
            ),
            rule_template: self.template,
            rule_name: self.name,
            rule_definition: self.definition,
        }
    }
}

/// Immutable rule table consumed by [`compute_breaking_changes`]
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub resource_config_rules: Vec<ResourceConfigRule>,
    pub resource_schema_rules: Vec<ResourceSchemaRule>,
    pub field_rules: Vec<FieldRule>,
    pub docs_base_url: String,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            resource_config_rules: resource_rules::resource_config_rules(),
            resource_schema_rules: schema_rules::resource_schema_rules(),
            field_rules: field_rules::field_rules(),
            docs_base_url: DEFAULT_DOCS_BASE_URL.to_string(),
        }
    }
}

impl RuleSet {
    /// Default table adjusted by configuration
    pub fn from_config(config: &RulesConfig) -> Self {
        let disabled: Vec<&str> = config.disabled.iter().map(String::as_str).collect();
        Self {
            docs_base_url: config.docs_base_url.clone(),
            ..Self::default()
        }
        .without(&disabled)
    }

    /// Drop every rule whose identifier is listed
    pub fn without(mut self, identifiers: &[&str]) -> Self {
        let drop: HashSet<&str> = identifiers.iter().copied().collect();
        self.resource_config_rules
            .retain(|r| !drop.contains(r.info.identifier));
        self.resource_schema_rules
            .retain(|r| !drop.contains(r.info.identifier));
        self.field_rules.retain(|r| !drop.contains(r.info.identifier));
        self
    }

    /// Metadata for every rule, tier by tier
    pub fn rules(&self) -> impl Iterator<Item = &RuleInfo> {
        self.resource_config_rules
            .iter()
            .map(|r| &r.info)
            .chain(self.resource_schema_rules.iter().map(|r| &r.info))
            .chain(self.field_rules.iter().map(|r| &r.info))
    }

    pub fn identifiers(&self) -> Vec<&'static str> {
        self.rules().map(|r| r.identifier).collect()
    }

    /// Markdown catalog of the rules, for contributor documentation
    pub fn catalog_markdown(&self) -> String {
        let mut out = String::from("# Breaking change rules\n");
        let tiers: [(&str, Vec<(&RuleInfo, bool)>); 3] = [
            (
                "Resource map",
                self.resource_config_rules.iter().map(|r| (&r.info, true)).collect(),
            ),
            (
                "Resource schema",
                self.resource_schema_rules.iter().map(|r| (&r.info, true)).collect(),
            ),
            (
                "Field",
                self.field_rules
                    .iter()
                    .map(|r| (&r.info, !r.undetectable()))
                    .collect(),
            ),
        ];
        for (title, rules) in tiers {
            out.push_str(&format!("\n## {title}\n"));
            for (info, detectable) in rules {
                out.push_str(&format!("\n### {} <a name=\"{}\"></a>\n\n", info.name, info.identifier));
                out.push_str(info.definition);
                out.push('\n');
                if !detectable {
                    out.push_str("\n_Not detected automatically._\n");
                }
            }
        }
        out
    }
}

/// Evaluate every rule in `rules` against `schema_diff`
pub fn compute_breaking_changes(schema_diff: &SchemaDiff, rules: &RuleSet) -> Vec<BreakingChange> {
    let mut breaking_changes = Vec::new();
    for (resource, resource_diff) in schema_diff {
        let config = &resource_diff.resource_config;
        for rule in &rules.resource_config_rules {
            breaking_changes.extend(rule.check(resource, config, &rules.docs_base_url));
        }
        if config.presence_changed() {
            // Whole-resource additions and removals only go through the presence tier.
            continue;
        }

        for rule in &rules.resource_schema_rules {
            breaking_changes.extend(rule.check(resource, resource_diff, &rules.docs_base_url));
        }

        for (field, field_diff) in &resource_diff.fields {
            for rule in &rules.field_rules {
                breaking_changes.extend(rule.check(resource, field, field_diff, &rules.docs_base_url));
            }
        }
    }
    debug!(count = breaking_changes.len(), "breaking changes computed");
    breaking_changes
}
