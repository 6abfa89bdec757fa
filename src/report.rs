//! Report shapes handed to the command line

use serde::{Deserialize, Serialize};

use crate::breaking::BreakingChange;
use crate::diff::SchemaDiff;

/// Resource-level summary of a diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiffSummary {
    #[serde(rename = "AddedResources", default)]
    pub added_resources: Vec<String>,
    #[serde(rename = "ModifiedResources", default)]
    pub modified_resources: Vec<String>,
    #[serde(rename = "RemovedResources", default)]
    pub removed_resources: Vec<String>,
}

impl SchemaDiffSummary {
    /// Bucket every resource in the diff; each list comes out sorted
    pub fn from_diff(diff: &SchemaDiff) -> Self {
        let mut summary = Self::default();
        for (resource, resource_diff) in diff {
            let config = &resource_diff.resource_config;
            let bucket = if config.is_added() {
                &mut summary.added_resources
            } else if config.is_removed() {
                &mut summary.removed_resources
            } else {
                &mut summary.modified_resources
            };
            bucket.push(resource.clone());
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.added_resources.is_empty() && self.modified_resources.is_empty() && self.removed_resources.is_empty()
    }
}

/// Every resource present in the diff, sorted
pub fn changed_resources(diff: &SchemaDiff) -> Vec<String> {
    diff.keys().cloned().collect()
}

/// One message per line
pub fn render_breaking_text(changes: &[BreakingChange]) -> String {
    changes.iter().map(|c| format!("{}\n", c.message)).collect()
}

/// Serialize any report as JSON
pub fn render_json<T: Serialize + ?Sized>(report: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
}
