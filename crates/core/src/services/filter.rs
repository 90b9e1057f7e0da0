//! Pure partition functions over symbol sets.
//!
//! Every filter returns `(matching, non_matching)` as new sets; the input is
//! never modified. Filters compose by feeding one side into the next.

use std::str::FromStr;

use regex::Regex;

use crate::config::StdlibConfig;
use crate::model::{SymbolRecord, SymbolSet};
use crate::services::demangle::{split_version, strip_macho_underscore, Demangler};

/// Split `set` by `predicate`.
pub fn partition<F>(set: &SymbolSet, predicate: F) -> (SymbolSet, SymbolSet)
where
    F: Fn(&SymbolRecord) -> bool,
{
    let (matching, rest): (Vec<SymbolRecord>, Vec<SymbolRecord>) =
        set.iter().cloned().partition(|record| predicate(record));
    (matching.into_iter().collect(), rest.into_iter().collect())
}

pub fn defined(set: &SymbolSet) -> (SymbolSet, SymbolSet) {
    partition(set, |r| r.is_defined)
}

pub fn undefined(set: &SymbolSet) -> (SymbolSet, SymbolSet) {
    partition(set, |r| !r.is_defined)
}

pub fn versioned(set: &SymbolSet) -> (SymbolSet, SymbolSet) {
    partition(set, SymbolRecord::is_versioned)
}

pub fn unversioned(set: &SymbolSet) -> (SymbolSet, SymbolSet) {
    partition(set, |r| !r.is_versioned())
}

pub fn stdlib(set: &SymbolSet, matcher: &StdlibMatcher<'_>) -> (SymbolSet, SymbolSet) {
    partition(set, |r| matcher.is_stdlib(r))
}

/// Prefixes the demangler puts in front of the entity a special symbol
/// belongs to (`typeinfo for std::exception`).
const SPECIAL_NAME_PREFIXES: &[&str] = &[
    "construction vtable for ",
    "covariant return thunk to ",
    "guard variable for ",
    "non-virtual thunk to ",
    "reference temporary for ",
    "TLS init function for ",
    "TLS wrapper function for ",
    "typeinfo name for ",
    "typeinfo for ",
    "virtual thunk to ",
    "vtable for ",
    "VTT for ",
];

/// Decides whether a symbol is owned by the C++ standard library.
pub struct StdlibMatcher<'a> {
    config: &'a StdlibConfig,
    demangler: &'a dyn Demangler,
}

impl<'a> StdlibMatcher<'a> {
    pub fn new(config: &'a StdlibConfig, demangler: &'a dyn Demangler) -> Self {
        Self { config, demangler }
    }

    pub fn is_stdlib(&self, record: &SymbolRecord) -> bool {
        let (base, version) = split_version(&record.name);
        if let Some(version) = version {
            let runtime = self.config.runtime_versions.iter().any(|tag| version.starts_with(tag));
            if runtime {
                return record.is_defined;
            }
        }

        let base = strip_macho_underscore(base);
        let demangled = self.demangler.demangle(base);
        let qualified = qualified_name(demangled.as_deref().unwrap_or(base));
        let starts = entity_starts(qualified);
        self.config
            .prefixes
            .iter()
            .any(|prefix| starts.iter().any(|start| start.starts_with(prefix.as_str())))
    }
}

fn qualified_name(mut name: &str) -> &str {
    while let Some(rest) = SPECIAL_NAME_PREFIXES.iter().find_map(|p| name.strip_prefix(p)) {
        name = rest;
    }
    name
}

/// Candidate starts of the entity name. Template functions demangle with
/// their return type first (`void std::foo<int>(int)`), so every position
/// after a top-level space before the parameter list is a candidate too.
fn entity_starts(name: &str) -> Vec<&str> {
    let head_len = name.find('(').unwrap_or(name.len());
    let mut starts = vec![name];
    let mut depth = 0usize;
    for (idx, ch) in name[..head_len].char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ' ' if depth == 0 => starts.push(&name[idx + 1..]),
            _ => {}
        }
    }
    starts
}

/// The named filter pipelines offered by `sym-check filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Stdlib,
    StdlibVersioned,
    StdlibUnversioned,
    Defined,
    Undefined,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        FilterKind::Stdlib,
        FilterKind::StdlibVersioned,
        FilterKind::StdlibUnversioned,
        FilterKind::Defined,
        FilterKind::Undefined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Stdlib => "stdlib",
            FilterKind::StdlibVersioned => "stdlib-versioned",
            FilterKind::StdlibUnversioned => "stdlib-unversioned",
            FilterKind::Defined => "defined",
            FilterKind::Undefined => "undefined",
        }
    }

    /// Apply the pipeline and return the selected records.
    pub fn apply(self, set: &SymbolSet, matcher: &StdlibMatcher<'_>) -> SymbolSet {
        match self {
            FilterKind::Stdlib => stdlib(set, matcher).0,
            FilterKind::StdlibVersioned => versioned(&stdlib(set, matcher).0).0,
            FilterKind::StdlibUnversioned => unversioned(&stdlib(set, matcher).0).0,
            FilterKind::Defined => defined(set).0,
            FilterKind::Undefined => undefined(set).0,
        }
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or_else(|| {
            let known: Vec<&str> = FilterKind::ALL.iter().map(|k| k.as_str()).collect();
            format!("Invalid filter '{s}' (expected one of: {})", known.join(", "))
        })
    }
}

/// Selects symbols whose name matches any of a list of regular expressions.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<Regex>,
}

impl PatternMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns =
            patterns.into_iter().map(|p| Regex::new(p.as_ref())).collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Match against the raw name and its display form.
    pub fn is_match(&self, record: &SymbolRecord, demangler: &dyn Demangler) -> bool {
        let display = demangler.display_name(&record.name);
        self.patterns.iter().any(|re| re.is_match(&record.name) || re.is_match(&display))
    }

    pub fn select(&self, set: &SymbolSet, demangler: &dyn Demangler) -> SymbolSet {
        partition(set, |r| self.is_match(r, demangler)).0
    }
}
