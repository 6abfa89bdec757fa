//! Schema Compatibility Analyzer
//!
//! Compares two snapshots of an infrastructure provider's resource schemas
//! and reports what changed, which changes break existing users, and which
//! new fields lack test or documentation coverage.
//!
//! ## Features
//!
//! - **Structural Diffing**: Nested fields are flattened to dot-joined paths
//! - **Conflict Sets**: Sibling constraints compare by canonical key, not order
//! - **Breaking-Change Rules**: Resource, structural and per-field rule tiers
//! - **Coverage Detection**: Untested and undocumented fields with suggested snippets
//! - **Service Labels**: Changed resources mapped to owning teams
//!
//! ## Data Flow
//!
//! ```text
//! old.json ─┐
//!           ├─> compute_schema_diff ─> SchemaDiff ─┬─> compute_breaking_changes
//! new.json ─┘                                      ├─> detect_missing_tests
//!                                                  ├─> detect_missing_docs
//!                                                  └─> SchemaDiffSummary / labels
//! ```

pub mod breaking;
pub mod config;
pub mod corpus;
pub mod detector;
pub mod diff;
pub mod error;
pub mod labels;
pub mod report;
pub mod schema;

pub use breaking::{compute_breaking_changes, BreakingChange, RuleSet};
pub use config::{CompatConfig, OutputFormat};
pub use corpus::{load_docs, load_resource_map, load_tests, ResourceDocs, Test};
pub use detector::{
    changed_fields, detect_missing_docs, detect_missing_docs_for_datasources, detect_missing_tests,
    MissingDocInfo, MissingTestInfo,
};
pub use diff::{compute_schema_diff, FieldDiff, ResourceDiff, SchemaDiff};
pub use error::{CompatError, CorpusError, Result};
pub use labels::ServiceLabeler;
pub use report::{changed_resources, SchemaDiffSummary};
pub use schema::{FieldSchema, ResourceMap, ResourceSchema, ValueType};
