//! Provider resource schema types
//!
//! A [`ResourceMap`] is one snapshot of a provider: resource type name to the
//! tree of fields that resource exposes. Snapshots are produced by an external
//! loader and handed to the differ as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resource type name to resource schema
pub type ResourceMap = BTreeMap<String, ResourceSchema>;

/// Value kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Invalid,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    Set,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Invalid => "invalid",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Map => "map",
            ValueType::Set => "set",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a nested field may be written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigMode {
    #[default]
    Auto,
    Block,
    /// Nested object written with attribute syntax; every subfield is
    /// treated as required by configurations that set the attribute.
    Attr,
}

/// Presence of the opaque functions attached to a field.
///
/// Only presence is tracked. Two present functions always compare equal,
/// so a changed function body is never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BehaviorFuncs {
    pub diff_suppress: bool,
    pub default_func: bool,
    pub state_func: bool,
    pub set_hash: bool,
    pub validate: bool,
}

impl BehaviorFuncs {
    /// True when any slot went present to absent or absent to present
    pub fn toggled(&self, other: &BehaviorFuncs) -> bool {
        self != other
    }
}

/// Element schema of a collection field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Elem {
    /// Scalar container, e.g. a list of strings
    Schema(Box<FieldSchema>),
    /// Composite sub-resource with its own child fields
    Resource(ResourceSchema),
}

/// A resource, or a nested composite block, with its child fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceSchema {
    #[serde(default)]
    pub schema: BTreeMap<String, FieldSchema>,
}

impl ResourceSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from `(name, field)` pairs
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldSchema)>,
        S: Into<String>,
    {
        Self {
            schema: fields.into_iter().map(|(name, f)| (name.into(), f)).collect(),
        }
    }

    /// Add a field, builder style
    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.schema.insert(name.into(), field);
        self
    }
}

/// Definition of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub config_mode: ConfigMode,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub diff_suppress_on_refresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub input_default: String,
    pub min_items: usize,
    pub max_items: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deprecated: String,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exactly_one_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub at_least_one_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_with: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<Elem>,
    pub funcs: BehaviorFuncs,
}

impl FieldSchema {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Self::default()
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Nest a composite sub-resource under this field
    pub fn with_block(mut self, block: ResourceSchema) -> Self {
        self.elem = Some(Elem::Resource(block));
        self
    }

    /// Set a scalar element schema
    pub fn with_elem(mut self, elem: FieldSchema) -> Self {
        self.elem = Some(Elem::Schema(Box::new(elem)));
        self
    }

    /// Child fields when this field is a composite sub-resource
    pub fn block(&self) -> Option<&ResourceSchema> {
        match &self.elem {
            Some(Elem::Resource(r)) => Some(r),
            _ => None,
        }
    }

    /// Element schema when this field is a scalar container
    pub fn scalar_elem(&self) -> Option<&FieldSchema> {
        match &self.elem {
            Some(Elem::Schema(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.block().is_some()
    }

    /// Computed without being optional; cannot be set from configuration
    pub fn is_output_only(&self) -> bool {
        self.computed && !self.optional
    }
}

/// Strip list-index placeholder segments from a dot-joined field path.
///
/// `block.0.child` and `block.child` name the same field.
pub fn normalize_field_path(path: &str) -> String {
    path.split('.')
        .filter(|part| !part.is_empty() && !part.bytes().all(|b| b.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(".")
}
