use std::path::{Path, PathBuf};

use crate::model::{Binding, MergePolicy, SymbolKind, SymbolRecord, SymbolSet, IGNORED_NAMES};
use crate::services::extract::{run_tool, ExtractError, SymbolExtractor};

const TOOL: &str = "readelf";

/// Readelf-backed extractor that parses `--wide --symbols` dumps.
///
/// Shared objects contribute their single `.dynsym` table. Static archives
/// contribute one `.symtab` per member, merged by name under `merge_policy`.
pub struct ReadelfExtractor {
    tool: PathBuf,
    static_lib: bool,
    merge_policy: MergePolicy,
}

impl ReadelfExtractor {
    pub fn new(tool: impl Into<PathBuf>, static_lib: bool, merge_policy: MergePolicy) -> Self {
        Self { tool: tool.into(), static_lib, merge_policy }
    }
}

impl SymbolExtractor for ReadelfExtractor {
    fn extract(&self, library: &Path) -> Result<SymbolSet, ExtractError> {
        let output = run_tool(&self.tool, &["--wide", "--symbols"], library)?;
        parse_readelf_output(&output, self.static_lib, self.merge_policy)
    }

    fn name(&self) -> &'static str {
        TOOL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableKind {
    Symtab,
    Dynsym,
}

/// One symbol table section: its origin label (archives only) and entry lines.
struct SymbolTable<'a> {
    origin: Option<String>,
    entries: &'a [&'a str],
}

/// Parse the full stdout of `readelf --wide --symbols`.
pub fn parse_readelf_output(
    output: &str,
    static_lib: bool,
    merge_policy: MergePolicy,
) -> Result<SymbolSet, ExtractError> {
    let lines: Vec<&str> = output.lines().collect();
    let tables = split_into_tables(&lines, static_lib)?;
    tracing::debug!(tables = tables.len(), static_lib, "parsed readelf symbol tables");

    let mut builder = SymbolSet::builder(merge_policy);
    for table in &tables {
        for line in table.entries {
            if let Some((record, binding)) = parse_symbol_line(line, table.origin.as_deref())? {
                builder.insert_with_binding(record, binding)?;
            }
        }
    }
    Ok(builder.finish())
}

fn split_into_tables<'a>(
    lines: &'a [&'a str],
    static_lib: bool,
) -> Result<Vec<SymbolTable<'a>>, ExtractError> {
    let wanted = if static_lib { TableKind::Symtab } else { TableKind::Dynsym };
    let mut tables = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some((kind, count)) = parse_table_header(line) else {
            continue;
        };
        if kind != wanted {
            tracing::trace!(line = %line, "skipping symbol table");
            continue;
        }
        // The header is followed by a column-title line, then `count` entries.
        let start = idx + 2;
        let Some(end) = start.checked_add(count).filter(|end| *end <= lines.len()) else {
            return Err(ExtractError::malformed(
                TOOL,
                format!("table declares {count} entries but output ends early"),
                *line,
            ));
        };
        let origin = if static_lib { Some(member_label(lines, idx)?) } else { None };
        tables.push(SymbolTable { origin, entries: &lines[start..end] });
    }

    match (static_lib, tables.len()) {
        (_, 0) => Err(ExtractError::malformed(
            TOOL,
            if static_lib { "no .symtab tables found" } else { "no .dynsym table found" },
            "",
        )),
        (false, n) if n > 1 => Err(ExtractError::malformed(
            TOOL,
            format!("expected exactly one .dynsym table, found {n}"),
            "",
        )),
        _ => Ok(tables),
    }
}

/// Match `Symbol table '.dynsym' contains 12 entries:`.
fn parse_table_header(line: &str) -> Option<(TableKind, usize)> {
    let rest = line.trim_end().strip_prefix("Symbol table '")?;
    let (section, rest) = rest.split_once('\'')?;
    let kind = match section.trim_start_matches('.') {
        "symtab" => TableKind::Symtab,
        "dynsym" => TableKind::Dynsym,
        _ => return None,
    };
    let (count, tail) = rest.strip_prefix(" contains ")?.split_once(' ')?;
    if !matches!(tail, "entries:" | "entry:") {
        return None;
    }
    Some((kind, count.parse().ok()?))
}

/// The `File: lib.a(member.o)` marker sits within the two lines above a table.
fn member_label(lines: &[&str], header_idx: usize) -> Result<String, ExtractError> {
    lines[header_idx.saturating_sub(2)..header_idx]
        .iter()
        .rev()
        .find_map(|line| parse_file_marker(line))
        .ok_or_else(|| {
            ExtractError::malformed(
                TOOL,
                "archive symbol table without a preceding File: marker",
                lines[header_idx],
            )
        })
}

fn parse_file_marker(line: &str) -> Option<String> {
    let rest = line.trim_end().strip_prefix("File: ")?;
    let (file, member) = rest.strip_suffix(')')?.split_once('(')?;
    if file.is_empty() || member.is_empty() {
        return None;
    }
    Some(format!("{file}({member})"))
}

/// Parse one table entry:
/// `Num: Value Size Type Bind Vis Ndx Name [(version)]`.
fn parse_symbol_line(
    line: &str,
    origin: Option<&str>,
) -> Result<Option<(SymbolRecord, Binding)>, ExtractError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(None);
    }
    if !(7..=9).contains(&parts.len()) {
        return Err(ExtractError::malformed(
            TOOL,
            format!("expected 7-9 fields, found {}", parts.len()),
            line,
        ));
    }
    // Seven fields means an unnamed entry (null symbol, section symbols).
    if parts.len() == 7 {
        return Ok(None);
    }

    let name = parts[7];
    let kind = match parts[3] {
        "FUNC" => SymbolKind::Func,
        "OBJECT" => SymbolKind::Object,
        "NOTYPE" | "FILE" => return Ok(None),
        other => {
            return Err(ExtractError::malformed(
                TOOL,
                format!("unexpected symbol type {other}"),
                line,
            ))
        }
    };
    if IGNORED_NAMES.contains(&name) {
        return Ok(None);
    }

    let size = match kind {
        SymbolKind::Object => Some(parse_size(parts[2]).ok_or_else(|| {
            ExtractError::malformed(TOOL, format!("invalid size {}", parts[2]), line)
        })?),
        _ => None,
    };
    let binding = if parts[4] == "WEAK" { Binding::Weak } else { Binding::Strong };
    let record = SymbolRecord {
        name: name.to_string(),
        kind,
        is_defined: parts[6] != "UND",
        size,
        origin: origin.map(str::to_string),
    };
    Ok(Some((record, binding)))
}

/// Sizes are decimal, except very large ones which readelf prints as `0x...`.
fn parse_size(field: &str) -> Option<u64> {
    match field.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => field.parse().ok(),
    }
}
