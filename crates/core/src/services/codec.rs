//! Stable textual form of a symbol set.
//!
//! One canonical JSON record per line, lines sorted lexicographically, so
//! snapshots checked into version control diff minimally between runs.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{SymbolKind, SymbolRecord, SymbolSet};
use crate::services::demangle::Demangler;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("line {line}: invalid symbol record: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: empty symbol name")]
    EmptyName { line: usize },
    #[error("line {line}: duplicate symbol `{name}`")]
    DuplicateName { line: usize, name: String },
    #[error("line {line}: `{name}` has a size but is not an OBJECT")]
    UnexpectedSize { line: usize, name: String },
}

/// Encode `set`, one sorted record per line with a trailing newline.
pub fn encode(set: &SymbolSet) -> String {
    let mut lines: Vec<String> = set.iter().map(SymbolRecord::to_string).collect();
    lines.sort();
    join_lines(lines)
}

/// Names only, sorted; for humans, not for [`decode`].
pub fn encode_names(set: &SymbolSet, demangler: &dyn Demangler) -> String {
    let mut lines: Vec<String> =
        set.names().map(|name| demangler.display_name(name).into_owned()).collect();
    lines.sort();
    join_lines(lines)
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Decode text produced by [`encode`]. Blank lines are ignored.
pub fn decode(text: &str) -> Result<SymbolSet, CodecError> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let record: SymbolRecord =
            serde_json::from_str(raw).map_err(|source| CodecError::Record { line, source })?;
        if record.name.is_empty() {
            return Err(CodecError::EmptyName { line });
        }
        if record.size.is_some() && record.kind != SymbolKind::Object {
            return Err(CodecError::UnexpectedSize { line, name: record.name });
        }
        if !seen.insert(record.name.clone()) {
            return Err(CodecError::DuplicateName { line, name: record.name });
        }
        records.push(record);
    }
    Ok(records.into_iter().collect())
}
