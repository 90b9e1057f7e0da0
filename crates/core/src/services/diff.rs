use serde::Serialize;

use crate::model::{SymbolRecord, SymbolSet};

/// Partitions of two symbol sets compared by name.
///
/// Every name appears in exactly one of the four lists: names only in `old`
/// are `removed`, names only in `new` are `added`, and names in both are
/// `changed` when any field besides `origin` differs and `common` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolDiff {
    pub added: Vec<SymbolRecord>,
    pub removed: Vec<SymbolRecord>,
    /// `(old, new)` pairs.
    pub changed: Vec<(SymbolRecord, SymbolRecord)>,
    /// `(old, new)` pairs; may still differ in `origin`.
    pub common: Vec<(SymbolRecord, SymbolRecord)>,
}

/// Three-way verdict of a comparison, with a stable process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOutcome {
    Identical,
    /// Different, but no existing client can break (only additions, or
    /// attribute changes under names-only comparison).
    Compatible,
    Breaking,
}

impl DiffOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            DiffOutcome::Identical => 0,
            DiffOutcome::Compatible => 2,
            DiffOutcome::Breaking => 3,
        }
    }
}

pub fn diff(old: &SymbolSet, new: &SymbolSet) -> SymbolDiff {
    let mut result = SymbolDiff::default();
    for old_sym in old {
        match new.get(&old_sym.name) {
            None => result.removed.push(old_sym.clone()),
            Some(new_sym) if old_sym.same_abi(new_sym) => {
                result.common.push((old_sym.clone(), new_sym.clone()))
            }
            Some(new_sym) => result.changed.push((old_sym.clone(), new_sym.clone())),
        }
    }
    result.added = new.iter().filter(|sym| !old.contains(&sym.name)).cloned().collect();
    result
}

impl SymbolDiff {
    /// Removals always break; attribute changes break unless only names are
    /// being compared. Additions never break.
    pub fn is_abi_breaking(&self, names_only: bool) -> bool {
        !self.removed.is_empty() || (!names_only && !self.changed.is_empty())
    }

    pub fn is_different(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }

    pub fn outcome(&self, names_only: bool) -> DiffOutcome {
        if self.is_abi_breaking(names_only) {
            DiffOutcome::Breaking
        } else if self.is_different() {
            DiffOutcome::Compatible
        } else {
            DiffOutcome::Identical
        }
    }

    /// Drop additions, keeping only what can break existing clients.
    pub fn without_added(mut self) -> Self {
        self.added.clear();
        self
    }
}
