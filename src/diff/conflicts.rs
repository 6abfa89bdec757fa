//! Canonical conflict-relationship sets
//!
//! A field may declare four kinds of relationships with its siblings
//! (conflicts-with, exactly-one-of, at-least-one-of, required-with). Each
//! declared list is one [`ConflictSet`]. Every level carries a canonical key
//! that is a total function of the set contents, so two bundles are
//! semantically equal exactly when their keys are byte-identical.
//!
//! Key components are length-prefixed (`<len>:<text>`) before joining, which
//! keeps the encoding injective even when a field path contains one of the
//! separator characters.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{normalize_field_path, FieldSchema};

const FIELD_SEPARATOR: &str = ",";
const CONFLICT_SET_SEPARATOR: &str = ";";
const CONFLICT_KIND_SEPARATOR: &str = "/";

fn encode(part: &str) -> String {
    format!("{}:{}", part.len(), part)
}

fn join_encoded<'a>(parts: impl IntoIterator<Item = &'a str>, separator: &str) -> String {
    parts.into_iter().map(encode).collect::<Vec<_>>().join(separator)
}

/// The four relationship kinds, in canonical key order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    ConflictsWith,
    ExactlyOneOf,
    AtLeastOneOf,
    RequiredWith,
}

impl ConflictKind {
    pub const ALL: [ConflictKind; 4] = [
        ConflictKind::ConflictsWith,
        ConflictKind::ExactlyOneOf,
        ConflictKind::AtLeastOneOf,
        ConflictKind::RequiredWith,
    ];

    fn raw_field_names(self, field: &FieldSchema) -> &[String] {
        match self {
            ConflictKind::ConflictsWith => &field.conflicts_with,
            ConflictKind::ExactlyOneOf => &field.exactly_one_of,
            ConflictKind::AtLeastOneOf => &field.at_least_one_of,
            ConflictKind::RequiredWith => &field.required_with,
        }
    }
}

/// Fields that jointly participate in one relationship instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictSet {
    pub fields: BTreeSet<String>,
    pub key: String,
}

impl ConflictSet {
    /// Build from a raw relationship list; `None` when the list names no fields
    pub fn from_raw_field_names<S: AsRef<str>>(raw: &[S]) -> Option<Self> {
        let fields: BTreeSet<String> = raw
            .iter()
            .map(|f| normalize_field_path(f.as_ref()))
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            return None;
        }
        let key = join_encoded(fields.iter().map(String::as_str), FIELD_SEPARATOR);
        Some(Self { fields, key })
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }
}

/// Deduplicated conflict sets of a single relationship kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetOfConflictSets {
    /// Keyed by [`ConflictSet::key`], so identical sets coalesce
    pub sets: BTreeMap<String, ConflictSet>,
    pub key: String,
}

impl SetOfConflictSets {
    pub fn from_conflict_set(set: ConflictSet) -> Self {
        let mut sets = BTreeMap::new();
        sets.insert(set.key.clone(), set);
        let key = Self::compute_key(&sets);
        Self { sets, key }
    }

    fn compute_key(sets: &BTreeMap<String, ConflictSet>) -> String {
        join_encoded(sets.keys().map(String::as_str), CONFLICT_SET_SEPARATOR)
    }

    /// Union `other` into this collection
    pub fn merge(&mut self, other: &SetOfConflictSets) {
        for (key, set) in &other.sets {
            self.sets.entry(key.clone()).or_insert_with(|| set.clone());
        }
        self.key = Self::compute_key(&self.sets);
    }

    /// Every field named by any set in the collection
    pub fn fields(&self) -> BTreeSet<&str> {
        self.sets
            .values()
            .flat_map(|s| s.fields.iter().map(String::as_str))
            .collect()
    }
}

fn merge_sets(
    base: Option<&SetOfConflictSets>,
    other: Option<&SetOfConflictSets>,
) -> Option<SetOfConflictSets> {
    match (base, other) {
        (None, None) => None,
        (Some(s), None) | (None, Some(s)) => Some(s.clone()),
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            merged.merge(b);
            Some(merged)
        }
    }
}

/// All four relationship kinds declared by one field (or rolled up across a resource)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConflictSets {
    pub conflicts_with: Option<SetOfConflictSets>,
    pub exactly_one_of: Option<SetOfConflictSets>,
    pub at_least_one_of: Option<SetOfConflictSets>,
    pub required_with: Option<SetOfConflictSets>,
    pub key: String,
}

impl FieldConflictSets {
    /// Canonical relationship bundle for a field; `None` when it declares none
    pub fn from_field(field: &FieldSchema) -> Option<Self> {
        let mut kinds = ConflictKind::ALL.iter().map(|kind| {
            ConflictSet::from_raw_field_names(kind.raw_field_names(field))
                .map(SetOfConflictSets::from_conflict_set)
        });
        let mut fcs = Self {
            conflicts_with: kinds.next().flatten(),
            exactly_one_of: kinds.next().flatten(),
            at_least_one_of: kinds.next().flatten(),
            required_with: kinds.next().flatten(),
            key: String::new(),
        };
        if fcs.is_empty() {
            return None;
        }
        fcs.refresh_key();
        Some(fcs)
    }

    pub fn get(&self, kind: ConflictKind) -> Option<&SetOfConflictSets> {
        match kind {
            ConflictKind::ConflictsWith => self.conflicts_with.as_ref(),
            ConflictKind::ExactlyOneOf => self.exactly_one_of.as_ref(),
            ConflictKind::AtLeastOneOf => self.at_least_one_of.as_ref(),
            ConflictKind::RequiredWith => self.required_with.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ConflictKind::ALL.iter().all(|k| self.get(*k).is_none())
    }

    fn refresh_key(&mut self) {
        let parts: Vec<String> = ConflictKind::ALL
            .iter()
            .map(|k| self.get(*k).map(|s| s.key.clone()).unwrap_or_default())
            .collect();
        self.key = join_encoded(parts.iter().map(String::as_str), CONFLICT_KIND_SEPARATOR);
    }

    /// Union every relationship kind of `other` into this bundle
    pub fn merge(&mut self, other: Option<&FieldConflictSets>) {
        let Some(other) = other else {
            return;
        };
        self.conflicts_with = merge_sets(self.conflicts_with.as_ref(), other.conflicts_with.as_ref());
        self.exactly_one_of = merge_sets(self.exactly_one_of.as_ref(), other.exactly_one_of.as_ref());
        self.at_least_one_of = merge_sets(self.at_least_one_of.as_ref(), other.at_least_one_of.as_ref());
        self.required_with = merge_sets(self.required_with.as_ref(), other.required_with.as_ref());
        self.refresh_key();
    }
}

/// Merge two optional bundles. Total, commutative and idempotent.
pub fn merge_field_conflict_sets(
    a: Option<&FieldConflictSets>,
    b: Option<&FieldConflictSets>,
) -> Option<FieldConflictSets> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (Some(x), Some(y)) => {
            let mut merged = x.clone();
            merged.merge(Some(y));
            Some(merged)
        }
    }
}

/// Old and new relationship bundles of a field whose relationships changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct FieldConflictSetsDiff {
    pub old: Option<FieldConflictSets>,
    pub new: Option<FieldConflictSets>,
}

impl FieldConflictSetsDiff {
    /// Fold another diff into this one, side by side
    pub fn merge(&mut self, other: &FieldConflictSetsDiff) {
        self.old = merge_field_conflict_sets(self.old.as_ref(), other.old.as_ref());
        self.new = merge_field_conflict_sets(self.new.as_ref(), other.new.as_ref());
    }

    pub fn is_empty(&self) -> bool {
        self.old.is_none() && self.new.is_none()
    }
}

/// `None` when both sides are absent or their keys match
pub fn diff_field_conflict_sets(
    old: Option<&FieldConflictSets>,
    new: Option<&FieldConflictSets>,
) -> Option<FieldConflictSetsDiff> {
    match (old, new) {
        (None, None) => None,
        (Some(o), Some(n)) if o.key == n.key => None,
        _ => Some(FieldConflictSetsDiff {
            old: old.cloned(),
            new: new.cloned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;

    fn field_with_conflicts(conflicts: &[&str]) -> FieldSchema {
        FieldSchema {
            conflicts_with: conflicts.iter().map(|s| s.to_string()).collect(),
            ..FieldSchema::new(ValueType::String)
        }
    }

    #[test]
    fn test_empty_list_has_no_set() {
        let empty: [&str; 0] = [];
        assert!(ConflictSet::from_raw_field_names(&empty).is_none());
        assert!(FieldConflictSets::from_field(&FieldSchema::default()).is_none());
    }

    #[test]
    fn test_conflict_set_dedupes_and_strips_placeholders() {
        let set = ConflictSet::from_raw_field_names(&["b.0.c", "a", "b.c", "a"]).unwrap();
        assert_eq!(set.fields.len(), 2);
        assert!(set.contains("b.c"));
        assert_eq!(set.key, "1:a,3:b.c");
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = FieldConflictSets::from_field(&field_with_conflicts(&["x", "y", "z"])).unwrap();
        let b = FieldConflictSets::from_field(&field_with_conflicts(&["z", "x", "y"])).unwrap();
        assert_eq!(a.key, b.key);
        assert!(diff_field_conflict_sets(Some(&a), Some(&b)).is_none());
    }

    #[test]
    fn test_separator_inside_field_name_does_not_collide() {
        let joined = ConflictSet::from_raw_field_names(&["a,b"]).unwrap();
        let split = ConflictSet::from_raw_field_names(&["a", "b"]).unwrap();
        assert_ne!(joined.key, split.key);
    }

    #[test]
    fn test_kinds_are_distinguished() {
        let conflicts = field_with_conflicts(&["a"]);
        let exactly = FieldSchema {
            exactly_one_of: vec!["a".to_string()],
            ..FieldSchema::default()
        };
        let a = FieldConflictSets::from_field(&conflicts).unwrap();
        let b = FieldConflictSets::from_field(&exactly).unwrap();
        assert_ne!(a.key, b.key);
        assert!(diff_field_conflict_sets(Some(&a), Some(&b)).is_some());
    }

    #[test]
    fn test_merge_laws() {
        let x = FieldConflictSets::from_field(&field_with_conflicts(&["a", "b"])).unwrap();
        let y = FieldConflictSets::from_field(&FieldSchema {
            conflicts_with: vec!["c".to_string()],
            required_with: vec!["d".to_string(), "e".to_string()],
            ..FieldSchema::default()
        })
        .unwrap();

        assert_eq!(merge_field_conflict_sets(Some(&x), None).unwrap().key, x.key);
        assert_eq!(merge_field_conflict_sets(Some(&x), Some(&x)).unwrap().key, x.key);

        let xy = merge_field_conflict_sets(Some(&x), Some(&y)).unwrap();
        let yx = merge_field_conflict_sets(Some(&y), Some(&x)).unwrap();
        assert_eq!(xy.key, yx.key);
        assert_eq!(xy.conflicts_with.as_ref().unwrap().sets.len(), 2);
        assert!(xy.required_with.is_some());
        assert!(merge_field_conflict_sets(None, None).is_none());
    }

    #[test]
    fn test_identical_sets_from_different_fields_coalesce() {
        let a = FieldConflictSets::from_field(&field_with_conflicts(&["a", "b"])).unwrap();
        let b = FieldConflictSets::from_field(&field_with_conflicts(&["b", "a"])).unwrap();
        let merged = merge_field_conflict_sets(Some(&a), Some(&b)).unwrap();
        assert_eq!(merged.conflicts_with.unwrap().sets.len(), 1);
    }

    #[test]
    fn test_diff_merge_is_total() {
        let x = FieldConflictSets::from_field(&field_with_conflicts(&["a"])).unwrap();
        let mut diff = FieldConflictSetsDiff::default();
        diff.merge(&FieldConflictSetsDiff {
            old: None,
            new: Some(x.clone()),
        });
        diff.merge(&FieldConflictSetsDiff::default());
        assert!(diff.old.is_none());
        assert_eq!(diff.new.unwrap().key, x.key);
    }
}
