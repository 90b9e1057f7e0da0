use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use symcheck_core::services::codec;
use symcheck_core::services::demangle::ItaniumDemangler;
use symcheck_core::services::filter::{FilterKind, StdlibMatcher};
use symcheck_core::services::input::ensure_rewritable;

use crate::{demangler, write_output, Session};

/// Where `sym-check filter` writes its result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterTarget {
    #[default]
    Stdout,
    File(PathBuf),
    /// Overwrite the input symbol list.
    InPlace,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub target: FilterTarget,
    pub names_only: bool,
    /// Demangle names; only meaningful with `names_only`.
    pub demangle: bool,
}

/// Apply a named filter pipeline to a library or symbol list.
pub fn filter_command(
    session: &Session,
    kind: FilterKind,
    input: &Path,
    options: &FilterOptions,
) -> Result<()> {
    // Rejected before any extraction runs.
    if options.target == FilterTarget::InPlace {
        ensure_rewritable(input).context("--inplace requires a symbol list input")?;
    }

    let symbols = session.load(input, None)?;
    let matcher = StdlibMatcher::new(&session.config.stdlib, &ItaniumDemangler);
    let selected = kind.apply(&symbols, &matcher);
    tracing::debug!(
        filter = kind.as_str(),
        kept = selected.len(),
        dropped = symbols.len() - selected.len(),
        "filtered"
    );

    let text = if options.names_only {
        codec::encode_names(&selected, demangler(options.demangle))
    } else {
        codec::encode(&selected)
    };
    let output = match &options.target {
        FilterTarget::Stdout => None,
        FilterTarget::File(path) => Some(path.as_path()),
        FilterTarget::InPlace => Some(input),
    };
    write_output(&text, output)
}
