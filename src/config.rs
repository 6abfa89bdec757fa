//! Configuration for the compatibility analyzer
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-compat.toml)
//! - Environment variables (SCHEMA_COMPAT_*)
//!
//! ## Example config file (schema-compat.toml):
//! ```toml
//! [rules]
//! docs_base_url = "https://example.com/breaking-changes"
//! disabled = ["field-changing-default-value"]
//!
//! [detector]
//! ignored_fields = ["project"]
//! iam_skip_fields = ["condition"]
//! placeholder_marker = "# value needed"
//! snippet_label = "primary"
//! docs_resource_prefix = "google_"
//!
//! [output]
//! format = "json"
//! pretty = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::breaking::DEFAULT_DOCS_BASE_URL;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompatConfig {
    /// Breaking-change rule settings
    #[serde(default)]
    pub rules: RulesConfig,

    /// Missing test / missing docs detector settings
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Rule table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Base URL that rule identifiers are appended to as anchors
    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,

    /// Rule identifiers to leave out of the table
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Fields never tracked on any resource
    #[serde(default = "default_ignored_fields")]
    pub ignored_fields: Vec<String>,

    /// Fields not tracked on IAM resources
    #[serde(default = "default_iam_skip_fields")]
    pub iam_skip_fields: Vec<String>,

    /// Text that replaces placeholder values in suggested snippets
    #[serde(default = "default_placeholder_marker")]
    pub placeholder_marker: String,

    /// Label of the resource block in suggested snippets
    #[serde(default = "default_snippet_label")]
    pub snippet_label: String,

    /// Provider prefix that documentation file names may omit
    #[serde(default = "default_docs_resource_prefix")]
    pub docs_resource_prefix: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Default value functions
fn default_docs_base_url() -> String {
    DEFAULT_DOCS_BASE_URL.to_string()
}

fn default_ignored_fields() -> Vec<String> {
    vec!["project".to_string()]
}

fn default_iam_skip_fields() -> Vec<String> {
    vec!["condition".to_string()]
}

fn default_placeholder_marker() -> String {
    "# value needed".to_string()
}

fn default_snippet_label() -> String {
    "primary".to_string()
}

fn default_docs_resource_prefix() -> String {
    "google_".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            docs_base_url: default_docs_base_url(),
            disabled: Vec::new(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ignored_fields: default_ignored_fields(),
            iam_skip_fields: default_iam_skip_fields(),
            placeholder_marker: default_placeholder_marker(),
            snippet_label: default_snippet_label(),
            docs_resource_prefix: default_docs_resource_prefix(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            pretty: true,
        }
    }
}

impl CompatConfig {
    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-compat.toml",
            ".schema-compat.toml",
            "config/schema-compat.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schema-compat", "schema-compat") {
            let xdg_config = config_dir.config_dir().join("schema-compat.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_COMPAT_RULES__DOCS_BASE_URL etc.
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_COMPAT")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("rules.disabled")
                .with_list_parse_key("detector.ignored_fields")
                .with_list_parse_key("detector.iam_skip_fields")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Render the configuration as a TOML document
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = self
            .to_toml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
