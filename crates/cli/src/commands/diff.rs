use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use symcheck_core::services::demangle::ItaniumDemangler;
use symcheck_core::services::diff::{diff, DiffOutcome};
use symcheck_core::services::filter::{self, StdlibMatcher};
use symcheck_core::services::input::STDIN_PATH;
use symcheck_core::services::report::{render_report, ReportOptions};

use crate::{demangler, write_output, Session};

#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    pub output: Option<PathBuf>,
    pub names_only: bool,
    pub removed_only: bool,
    pub only_stdlib: bool,
    pub demangle: bool,
    pub show_common: bool,
    /// Treat a compatible difference as a break.
    pub strict: bool,
}

/// Compare two libraries or symbol lists, write the report, and return the
/// verdict that decides the exit code.
pub fn diff_command(
    session: &Session,
    old: &Path,
    new: &Path,
    options: &DiffOptions,
) -> Result<DiffOutcome> {
    if old == Path::new(STDIN_PATH) && new == Path::new(STDIN_PATH) {
        bail!("Only one of the two inputs can be read from standard input");
    }

    let mut old_symbols = session.load(old, None)?;
    let mut new_symbols = session.load(new, None)?;
    if options.only_stdlib {
        let matcher = StdlibMatcher::new(&session.config.stdlib, &ItaniumDemangler);
        old_symbols = filter::stdlib(&old_symbols, &matcher).0;
        new_symbols = filter::stdlib(&new_symbols, &matcher).0;
    }

    let mut result = diff(&old_symbols, &new_symbols);
    if options.removed_only {
        result = result.without_added();
    }

    let report_options =
        ReportOptions { names_only: options.names_only, show_common: options.show_common };
    let report = render_report(&result, &report_options, demangler(options.demangle));
    write_output(&report, options.output.as_deref())?;

    let outcome = match result.outcome(options.names_only) {
        DiffOutcome::Compatible if options.strict => DiffOutcome::Breaking,
        outcome => outcome,
    };
    tracing::debug!(
        added = result.added.len(),
        removed = result.removed.len(),
        changed = result.changed.len(),
        ?outcome,
        "diff complete"
    );
    Ok(outcome)
}
