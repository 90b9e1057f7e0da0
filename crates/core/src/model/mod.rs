//! Core data model: symbol records and the sets they are collected into.
//!
//! A [`SymbolSet`] maps each symbol name to exactly one [`SymbolRecord`].
//! Sets are built once (by an extractor, the codec, or a filter) through a
//! [`SymbolSetBuilder`] and never mutated afterwards.

use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Names that are link-time artifacts rather than API; both backends drop them.
pub const IGNORED_NAMES: &[&str] = &["_init", "_fini", "__bss_start", "_end", "_edata"];

/// Linker-visible kind of a symbol.
///
/// Serialized as the bare type string (`FUNC`, `OBJECT`, or the raw code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SymbolKind {
    Func,
    Object,
    /// Type code the flat backend could not translate (e.g. `U` for an
    /// undefined reference, which carries no type in POSIX `nm` output).
    Raw(String),
}

impl SymbolKind {
    pub fn as_str(&self) -> &str {
        match self {
            SymbolKind::Func => "FUNC",
            SymbolKind::Object => "OBJECT",
            SymbolKind::Raw(code) => code,
        }
    }
}

impl From<String> for SymbolKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "FUNC" => SymbolKind::Func,
            "OBJECT" => SymbolKind::Object,
            _ => SymbolKind::Raw(value),
        }
    }
}

impl From<SymbolKind> for String {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Raw(code) => code,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One symbol observed in a library.
///
/// Field order is the canonical serialization order; see `services::codec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub is_defined: bool,
    /// Byte size, only ever present for `OBJECT` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// `file(member)` label, only present for static-archive extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl SymbolRecord {
    pub fn function(name: impl Into<String>, is_defined: bool) -> Self {
        Self { name: name.into(), kind: SymbolKind::Func, is_defined, size: None, origin: None }
    }

    pub fn object(name: impl Into<String>, is_defined: bool, size: Option<u64>) -> Self {
        Self { name: name.into(), kind: SymbolKind::Object, is_defined, size, origin: None }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// True when a `@version` suffix is part of the name.
    pub fn is_versioned(&self) -> bool {
        self.name.contains('@')
    }

    /// Compare every ABI-relevant field, i.e. everything except `origin`.
    pub fn same_abi(&self, other: &SymbolRecord) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.is_defined == other.is_defined
            && self.size == other.size
    }
}

impl fmt::Display for SymbolRecord {
    /// Canonical single-line JSON form, shared by the codec and the reports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&line)
    }
}

/// How to resolve two definitions of the same name from different
/// translation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Keep the earlier definition and log a warning.
    #[default]
    FirstWins,
    /// Fail with [`DuplicateDefinition`].
    Strict,
}

/// Linkage strength of a candidate record; weak definitions never conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Strong,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("symbol `{name}` is defined in both {first} and {second}")]
pub struct DuplicateDefinition {
    pub name: String,
    pub first: String,
    pub second: String,
}

/// Pick the surviving record when two candidates share a name.
///
/// A defined candidate beats an undefined one in either order; otherwise the
/// earlier candidate is kept.
pub fn merge_candidates(earlier: SymbolRecord, later: SymbolRecord) -> SymbolRecord {
    if later.is_defined && !earlier.is_defined {
        later
    } else {
        earlier
    }
}

/// Immutable name-keyed collection of symbol records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSet {
    records: BTreeMap<String, SymbolRecord>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder(policy: MergePolicy) -> SymbolSetBuilder {
        SymbolSetBuilder::new(policy)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SymbolRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Records in name order.
    pub fn iter(&self) -> btree_map::Values<'_, String, SymbolRecord> {
        self.records.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn into_records(self) -> Vec<SymbolRecord> {
        self.records.into_values().collect()
    }
}

impl FromIterator<SymbolRecord> for SymbolSet {
    /// Collects records, resolving repeated names with [`merge_candidates`].
    fn from_iter<I: IntoIterator<Item = SymbolRecord>>(iter: I) -> Self {
        let mut records: BTreeMap<String, SymbolRecord> = BTreeMap::new();
        for record in iter {
            match records.entry(record.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    let earlier = slot.get().clone();
                    slot.insert(merge_candidates(earlier, record));
                }
            }
        }
        Self { records }
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = &'a SymbolRecord;
    type IntoIter = btree_map::Values<'a, String, SymbolRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

/// Accumulates candidate records and applies the merge policy as names repeat.
#[derive(Debug)]
pub struct SymbolSetBuilder {
    policy: MergePolicy,
    records: BTreeMap<String, (SymbolRecord, Binding)>,
}

impl SymbolSetBuilder {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy, records: BTreeMap::new() }
    }

    pub fn insert(&mut self, record: SymbolRecord) -> Result<(), DuplicateDefinition> {
        self.insert_with_binding(record, Binding::Strong)
    }

    pub fn insert_with_binding(
        &mut self,
        record: SymbolRecord,
        binding: Binding,
    ) -> Result<(), DuplicateDefinition> {
        let mut slot = match self.records.entry(record.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert((record, binding));
                return Ok(());
            }
            Entry::Occupied(slot) => slot,
        };

        let (earlier, earlier_binding) = slot.get();
        if *earlier == record {
            return Ok(());
        }

        let conflicting = earlier.is_defined
            && record.is_defined
            && *earlier_binding == Binding::Strong
            && binding == Binding::Strong;
        if conflicting {
            let duplicate = DuplicateDefinition {
                name: record.name.clone(),
                first: describe_origin(earlier),
                second: describe_origin(&record),
            };
            match self.policy {
                MergePolicy::Strict => return Err(duplicate),
                MergePolicy::FirstWins => {
                    tracing::warn!(
                        symbol = %duplicate.name,
                        kept = %duplicate.first,
                        dropped = %duplicate.second,
                        "duplicate definition, keeping the first"
                    );
                }
            }
        }

        let (earlier, earlier_binding) = slot.get().clone();
        let keep_later = record.is_defined && !earlier.is_defined;
        let merged = merge_candidates(earlier, record);
        let merged_binding = if keep_later { binding } else { earlier_binding };
        slot.insert((merged, merged_binding));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> SymbolSet {
        SymbolSet {
            records: self
                .records
                .into_iter()
                .map(|(name, (record, _binding))| (name, record))
                .collect(),
        }
    }
}

fn describe_origin(record: &SymbolRecord) -> String {
    record.origin.clone().unwrap_or_else(|| "<unknown>".to_string())
}
