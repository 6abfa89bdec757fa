//! Inputs supplied by collaborators
//!
//! Snapshots, parsed acceptance tests and resource documentation arrive as
//! files produced by other tools. Snapshot loading fails as a whole; corpus
//! loading is per item: a bad file is logged, recorded as a [`CorpusError`]
//! and skipped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CompatError, CorpusError, Result};
use crate::schema::ResourceMap;

/// Attribute path to the literal value configured in a test
pub type ResourceConfig = BTreeMap<String, serde_json::Value>;

/// Resource type to resource label to configuration
pub type Step = BTreeMap<String, BTreeMap<String, ResourceConfig>>;

/// Resource type to documentation text
pub type ResourceDocs = BTreeMap<String, String>;

/// A parsed acceptance test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TestFile {
    Many(Vec<Test>),
    One(Test),
}

/// Load a schema snapshot from a JSON file
pub fn load_resource_map(path: &Path) -> Result<ResourceMap> {
    let content = fs::read_to_string(path)?;
    let map: ResourceMap = serde_json::from_str(&content)?;
    debug!(path = %path.display(), resources = map.len(), "loaded schema snapshot");
    Ok(map)
}

/// Load every `*.json` test file under `dir`
pub fn load_tests(dir: &Path) -> (Vec<Test>, Vec<CorpusError>) {
    let mut tests = Vec::new();
    let mut errors = Vec::new();
    for path in corpus_files(dir, &["json"], &mut errors) {
        let parsed = fs::read_to_string(&path)
            .map_err(CompatError::from)
            .and_then(|content| serde_json::from_str::<TestFile>(&content).map_err(CompatError::from));
        match parsed {
            Ok(TestFile::Many(many)) => tests.extend(many),
            Ok(TestFile::One(one)) => tests.push(one),
            Err(source) => record(&mut errors, CorpusError { path, source }),
        }
    }
    debug!(tests = tests.len(), errors = errors.len(), "loaded test corpus");
    (tests, errors)
}

/// Load resource documentation under `dir`, keyed by file name without extension
pub fn load_docs(dir: &Path) -> (ResourceDocs, Vec<CorpusError>) {
    let mut docs = ResourceDocs::new();
    let mut errors = Vec::new();
    for path in corpus_files(dir, &["markdown", "md"], &mut errors) {
        let Some(name) = doc_resource_name(&path) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(content) => {
                docs.insert(name, content);
            }
            Err(e) => record(&mut errors, CorpusError { path, source: e.into() }),
        }
    }
    (docs, errors)
}

fn doc_resource_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = [".html.markdown", ".markdown", ".md"]
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))?;
    Some(name.to_string())
}

fn corpus_files(dir: &Path, extensions: &[&str], errors: &mut Vec<CorpusError>) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                let matches = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| extensions.contains(&e));
                if entry.file_type().is_file() && matches {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                record(errors, CorpusError { path, source: e.into() });
            }
        }
    }
    files
}

fn record(errors: &mut Vec<CorpusError>, error: CorpusError) {
    warn!(path = %error.path.display(), error = %error.source, "skipping unreadable corpus item");
    errors.push(error);
}
