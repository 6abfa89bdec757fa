//! Service labels for changed resources
//!
//! Labels come from an enrolled-teams mapping:
//!
//! ```yaml
//! service/google-x:
//!   resources:
//!   - google_x_.*
//! ```
//!
//! Each resource pattern must match a whole resource name.

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Prefix shared by every service label
pub const SERVICE_LABEL_PREFIX: &str = "service/";

#[derive(Debug, Deserialize)]
struct LabelEntry {
    #[serde(default)]
    resources: Vec<String>,
}

/// Compiled label → resource pattern mapping
#[derive(Debug, Clone, Default)]
pub struct ServiceLabeler {
    labels: Vec<(String, Vec<Regex>)>,
}

impl ServiceLabeler {
    /// Parse and compile an enrolled-teams YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let entries: BTreeMap<String, Option<LabelEntry>> = serde_yaml::from_str(content)?;
        let mut labels = Vec::with_capacity(entries.len());
        for (label, entry) in entries {
            let patterns = entry
                .map(|e| e.resources)
                .unwrap_or_default()
                .iter()
                .map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            labels.push((label, patterns));
        }
        debug!(labels = labels.len(), "compiled label mapping");
        Ok(Self { labels })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Labels whose patterns match any of `resources`, sorted
    pub fn labels_for<S: AsRef<str>>(&self, resources: &[S]) -> Vec<String> {
        let mut matched = BTreeSet::new();
        for resource in resources {
            for (label, patterns) in &self.labels {
                if patterns.iter().any(|p| p.is_match(resource.as_ref())) {
                    matched.insert(label.clone());
                }
            }
        }
        matched.into_iter().collect()
    }

    /// The full label set to apply, or `None` when nothing should change.
    ///
    /// An item that already carries a service label keeps its labels as
    /// they are. Otherwise the new labels are added to the existing ones.
    pub fn labels_for_update<S: AsRef<str>>(&self, resources: &[S], existing: &[String]) -> Option<Vec<String>> {
        if existing.iter().any(|l| l.starts_with(SERVICE_LABEL_PREFIX)) {
            return None;
        }
        let new_labels = self.labels_for(resources);
        if new_labels.is_empty() {
            return None;
        }
        let all: BTreeSet<String> = existing.iter().cloned().chain(new_labels).collect();
        Some(all.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENROLLED_TEAMS: &str = "
service/google-x:
  resources:
  - google_x_resource
service/google-y:
  resources:
  - google_y_.*
  - google_shared
service/empty:
";

    #[test]
    fn test_labels_for() {
        let labeler = ServiceLabeler::from_yaml(ENROLLED_TEAMS).unwrap();
        assert!(labeler.labels_for(&["google_z_resource"]).is_empty());
        // Patterns match whole names only
        assert!(labeler.labels_for(&["google_x_resource2"]).is_empty());
        assert_eq!(
            labeler.labels_for(&["google_y_a", "google_x_resource", "google_y_b"]),
            vec!["service/google-x", "service/google-y"]
        );
    }

    #[test]
    fn test_labels_for_update() {
        let labeler = ServiceLabeler::from_yaml(ENROLLED_TEAMS).unwrap();
        assert_eq!(
            labeler.labels_for_update(&["google_x_resource"], &["override-breaking-change".to_string()]),
            Some(vec!["override-breaking-change".to_string(), "service/google-x".to_string()])
        );
        assert_eq!(
            labeler.labels_for_update(&["google_x_resource"], &["service/google-z".to_string()]),
            None
        );
        assert_eq!(labeler.labels_for_update(&["google_q"], &[]), None);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ServiceLabeler::from_yaml("service/bad:\n  resources:\n  - \"google_(\"\n").unwrap_err();
        assert!(matches!(err, crate::error::CompatError::Pattern(_)));
    }
}
