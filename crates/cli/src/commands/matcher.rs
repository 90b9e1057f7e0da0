use std::path::Path;

use anyhow::{Context, Result};
use symcheck_core::services::filter::PatternMatcher;

use crate::{demangler, write_output, Session};

/// Print every symbol matching one of `patterns`. Returns whether any did.
pub fn match_command(
    session: &Session,
    input: &Path,
    patterns: &[String],
    demangle: bool,
) -> Result<bool> {
    let matcher = PatternMatcher::new(patterns).context("Invalid symbol pattern")?;
    let symbols = session.load(input, None)?;
    let demangler = demangler(demangle);
    let matches = matcher.select(&symbols, demangler);

    let mut text = String::new();
    for name in matches.names() {
        text.push_str(&demangler.display_name(name));
        text.push('\n');
    }
    write_output(&text, None)?;

    if !matches.is_empty() {
        eprintln!("{} matching symbols found", matches.len());
    }
    Ok(!matches.is_empty())
}
