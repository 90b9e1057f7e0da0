use std::path::{Path, PathBuf};

use crate::model::{Binding, MergePolicy, SymbolKind, SymbolRecord, SymbolSet, IGNORED_NAMES};
use crate::services::extract::{run_tool, ExtractError, SymbolExtractor};

const TOOL: &str = "nm";

/// Local (non-exported) type codes; such symbols are never part of the ABI.
const LOCAL_CODES: &[&str] = &["t", "b", "r", "d", "w"];

/// nm-backed extractor that parses `-P -g` (POSIX, external only) listings.
pub struct NmExtractor {
    tool: PathBuf,
    static_lib: bool,
    merge_policy: MergePolicy,
}

impl NmExtractor {
    pub fn new(tool: impl Into<PathBuf>, static_lib: bool, merge_policy: MergePolicy) -> Self {
        Self { tool: tool.into(), static_lib, merge_policy }
    }
}

impl SymbolExtractor for NmExtractor {
    fn extract(&self, library: &Path) -> Result<SymbolSet, ExtractError> {
        let output = run_tool(&self.tool, &["-P", "-g"], library)?;
        parse_nm_output(&output, self.static_lib, self.merge_policy)
    }

    fn name(&self) -> &'static str {
        TOOL
    }
}

/// Parse the full stdout of `nm -P -g`.
///
/// Lines are `name type [value [size]]`. Archive listings interleave
/// `lib.a[member.o]:` headers, which label the records that follow when
/// `static_lib` is set.
pub fn parse_nm_output(
    output: &str,
    static_lib: bool,
    merge_policy: MergePolicy,
) -> Result<SymbolSet, ExtractError> {
    let mut builder = SymbolSet::builder(merge_policy);
    let mut origin: Option<String> = None;

    for line in output.lines() {
        let bits: Vec<&str> = line.split_whitespace().collect();
        if bits.len() < 2 {
            if let Some(member) = bits.first().and_then(|b| parse_member_header(b)) {
                if static_lib {
                    origin = Some(member);
                }
            } else if !line.trim().is_empty() {
                tracing::trace!(line, "discarding nm line");
            }
            continue;
        }

        let name = bits[0].replace("@@", "@");
        let code = bits[1];
        if LOCAL_CODES.contains(&code) || IGNORED_NAMES.contains(&name.as_str()) {
            continue;
        }

        let kind = match code {
            "T" | "W" => SymbolKind::Func,
            "B" | "D" | "R" | "V" | "S" => SymbolKind::Object,
            other => SymbolKind::Raw(other.to_string()),
        };
        let size = match (&kind, bits.get(3)) {
            (SymbolKind::Object, Some(field)) => Some(
                u64::from_str_radix(field, 16).map_err(|_| {
                    ExtractError::malformed(TOOL, format!("invalid size {field}"), line)
                })?,
            ),
            _ => None,
        };
        let binding = if matches!(code, "W" | "V" | "v") { Binding::Weak } else { Binding::Strong };

        let record = SymbolRecord {
            name,
            kind,
            is_defined: !code.eq_ignore_ascii_case("u"),
            size,
            origin: origin.clone(),
        };
        builder.insert_with_binding(record, binding)?;
    }

    tracing::debug!(symbols = builder.len(), static_lib, "parsed nm listing");
    Ok(builder.finish())
}

/// Turn `lib.a[member.o]:` into `lib.a(member.o)`.
fn parse_member_header(field: &str) -> Option<String> {
    let (file, member) = field.strip_suffix("]:")?.split_once('[')?;
    if file.is_empty() || member.is_empty() {
        return None;
    }
    Some(format!("{file}({member})"))
}
