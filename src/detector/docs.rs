//! Documentation coverage for newly added fields

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

use super::{changed_fields, ResourceChanges};
use crate::config::DetectorConfig;
use crate::corpus::ResourceDocs;
use crate::diff::SchemaDiff;
use crate::detector::snippet::suggested_config;

const IAM_SUFFIXES: [&str; 4] = ["_iam_policy", "_iam_binding", "_iam_member", "_iam_audit_config"];

/// A resource whose documentation does not mention some new fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDocInfo {
    pub resource: String,
    /// Documentation entry that was searched, if one exists
    pub doc: Option<String>,
    /// Sorted field paths
    pub undocumented_fields: Vec<String>,
    pub suggested_snippet: String,
}

/// Find new fields whose name does not appear in the resource's documentation.
///
/// A resource with no documentation at all reports every new field.
pub fn detect_missing_docs(diff: &SchemaDiff, docs: &ResourceDocs, config: &DetectorConfig) -> Vec<MissingDocInfo> {
    let mut missing = Vec::new();
    for (resource, changes) in added_fields(diff, config) {
        let doc = find_doc(&resource, docs, config);
        let body = doc.map(|(_, text)| strip_doc_body(text)).unwrap_or_default();
        let words = DocWords::new(&body);
        let undocumented: Vec<String> = changes
            .into_keys()
            .filter(|path| !words.mentions(path))
            .collect();
        if undocumented.is_empty() {
            continue;
        }
        debug!(resource = %resource, undocumented = undocumented.len(), "resource has undocumented fields");
        missing.push(missing_doc(resource, doc.map(|(name, _)| name.to_string()), undocumented, config));
    }
    missing
}

/// Report every new field of a resource that has no documentation entry.
///
/// Data source pages are not parsed; only their existence is checked.
pub fn detect_missing_docs_for_datasources(
    diff: &SchemaDiff,
    docs: &ResourceDocs,
    config: &DetectorConfig,
) -> Vec<MissingDocInfo> {
    added_fields(diff, config)
        .into_iter()
        .filter(|(resource, _)| find_doc(resource, docs, config).is_none())
        .map(|(resource, changes)| {
            let fields = changes.into_keys().collect();
            missing_doc(resource, None, fields, config)
        })
        .collect()
}

fn missing_doc(resource: String, doc: Option<String>, fields: Vec<String>, config: &DetectorConfig) -> MissingDocInfo {
    MissingDocInfo {
        suggested_snippet: suggested_config(&resource, &config.snippet_label, &fields, &config.placeholder_marker),
        undocumented_fields: fields,
        doc,
        resource,
    }
}

fn added_fields(diff: &SchemaDiff, config: &DetectorConfig) -> BTreeMap<String, ResourceChanges> {
    let mut changed = changed_fields(diff, config);
    for changes in changed.values_mut() {
        changes.retain(|_, field| field.added);
    }
    changed.retain(|_, changes| !changes.is_empty());
    changed
}

/// Candidate documentation names for a resource, most specific first.
///
/// IAM policy, binding and member resources share one `_iam` page.
fn doc_names(resource: &str, prefix: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut push = |name: &str| {
        names.push(name.to_string());
        if let Some(short) = name.strip_prefix(prefix).filter(|_| !prefix.is_empty()) {
            names.push(short.to_string());
        }
    };
    push(resource);
    for suffix in IAM_SUFFIXES {
        if let Some(base) = resource.strip_suffix(suffix) {
            push(&format!("{base}_iam"));
        }
    }
    names
}

fn find_doc<'a>(resource: &str, docs: &'a ResourceDocs, config: &DetectorConfig) -> Option<(&'a str, &'a str)> {
    doc_names(resource, &config.docs_resource_prefix)
        .into_iter()
        .find_map(|name| docs.get_key_value(&name))
        .map(|(name, text)| (name.as_str(), text.as_str()))
}

/// Remove front matter, HTML comments and fenced example code
pub fn strip_doc_body(text: &str) -> String {
    static FRONT_MATTER: OnceLock<Regex> = OnceLock::new();
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    static FENCES: OnceLock<Regex> = OnceLock::new();

    let patterns = [
        FRONT_MATTER.get_or_init(|| Regex::new(r"(?s)\A---\r?\n.*?\n---\r?\n").unwrap()),
        COMMENTS.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap()),
        FENCES.get_or_init(|| Regex::new(r"(?s)```.*?```").unwrap()),
    ];
    let mut body = text.to_string();
    for pattern in patterns {
        body = pattern.replace_all(&body, "").into_owned();
    }
    body
}

/// Identifier words of a documentation body, in page order
struct DocWords<'a> {
    words: Vec<&'a str>,
}

impl<'a> DocWords<'a> {
    fn new(body: &'a str) -> Self {
        let words = body
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Every segment of a dot-joined path appears as a whole word, each
    /// after the previous one, so `block.name` needs a `block` mention
    /// followed by a `name` mention.
    fn mentions(&self, path: &str) -> bool {
        let mut rest = self.words.as_slice();
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            match rest.iter().position(|w| *w == segment) {
                Some(pos) => rest = &rest[pos + 1..],
                None => return false,
            }
        }
        true
    }
}
