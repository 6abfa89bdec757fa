//! Resource presence rules

use super::{BreakingChange, MessageContext, RuleInfo};
use crate::diff::ResourceConfigDiff;

/// Rule over a resource's presence in the two snapshots
#[derive(Debug, Clone)]
pub struct ResourceConfigRule {
    pub info: RuleInfo,
    pub is_rule_break: fn(&ResourceConfigDiff) -> bool,
}

impl ResourceConfigRule {
    pub fn check(
        &self,
        resource: &str,
        diff: &ResourceConfigDiff,
        docs_base_url: &str,
    ) -> Option<BreakingChange> {
        (self.is_rule_break)(diff).then(|| {
            self.info.breaking_change(
                &MessageContext { resource, field: None },
                &[],
                docs_base_url,
            )
        })
    }
}

pub fn resource_config_rules() -> Vec<ResourceConfigRule> {
    vec![REMOVING_A_RESOURCE]
}

pub const REMOVING_A_RESOURCE: ResourceConfigRule = ResourceConfigRule {
    info: RuleInfo {
        name: "Removing or Renaming an Resource",
        definition: "In terraform resources should be retained whenever possible. A removable of an resource will result in a configuration breakage wherever a dependency on that resource exists. Renaming or Removing a resources are functionally equivalent in terms of configuration breakages.",
        template: "Resource {{resource}} was either removed or renamed",
        identifier: "resource-map-resource-removal-or-rename",
    },
    is_rule_break: removing_a_resource,
};

fn removing_a_resource(diff: &ResourceConfigDiff) -> bool {
    diff.is_removed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removing_a_resource() {
        let cases = [
            (ResourceConfigDiff { in_old: true, in_new: false }, true),
            (ResourceConfigDiff { in_old: false, in_new: true }, false),
            (ResourceConfigDiff { in_old: true, in_new: true }, false),
        ];
        for (diff, want) in cases {
            let got = REMOVING_A_RESOURCE.check("google-x", &diff, "https://docs");
            assert_eq!(got.is_some(), want, "{diff:?}");
        }
        let change = REMOVING_A_RESOURCE
            .check("google-x", &ResourceConfigDiff { in_old: true, in_new: false }, "https://docs")
            .unwrap();
        assert_eq!(change.message, "Resource `google-x` was either removed or renamed");
        assert_eq!(
            change.documentation_reference,
            "https://docs#resource-map-resource-removal-or-rename"
        );
    }
}
