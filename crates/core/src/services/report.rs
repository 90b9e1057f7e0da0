use std::fmt::Write;

use crate::model::SymbolRecord;
use crate::services::demangle::Demangler;
use crate::services::diff::SymbolDiff;

pub const VERDICT_MATCH: &str = "Symbols match.";
pub const VERDICT_ADDED: &str = "Symbols added.";
pub const VERDICT_BREAKAGE: &str = "ABI BREAKAGE: SYMBOLS ADDED OR REMOVED!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Print names without records; attribute changes are not reported.
    pub names_only: bool,
    /// Include the `Common symbols:` block.
    pub show_common: bool,
}

/// Render `diff` as the human-readable report, ending in a verdict line.
pub fn render_report(diff: &SymbolDiff, options: &ReportOptions, demangler: &dyn Demangler) -> String {
    let names_only = options.names_only;
    let display = |sym: &SymbolRecord| demangler.display_name(&sym.name).into_owned();
    let mut out = String::new();

    for sym in &diff.added {
        push_entry(&mut out, "Symbol added", &display(sym), sym, names_only);
    }
    if !diff.added.is_empty() && names_only {
        out.push('\n');
    }
    for sym in &diff.removed {
        push_entry(&mut out, "SYMBOL REMOVED", &display(sym), sym, names_only);
    }
    if !diff.removed.is_empty() && names_only {
        out.push('\n');
    }
    if !names_only {
        for (old_sym, new_sym) in &diff.changed {
            let _ = write!(
                out,
                "SYMBOL CHANGED: {}\n    OLD SYMBOL: {old_sym}\n    NEW SYMBOL: {new_sym}\n\n",
                display(old_sym)
            );
        }
    }

    if options.show_common && !diff.common.is_empty() {
        out.push_str("Common symbols:\n");
        for (old_sym, new_sym) in &diff.common {
            let _ = writeln!(out, "{}", display(old_sym));
            if !names_only {
                let _ = writeln!(out, "    {old_sym}");
                if old_sym != new_sym {
                    let _ = writeln!(out, "    {new_sym}");
                }
            }
        }
    }

    let abi_break = diff.is_abi_breaking(names_only);
    if abi_break || !diff.added.is_empty() {
        out.push_str("Summary\n");
        let _ = writeln!(out, "    Added:   {}", diff.added.len());
        let _ = writeln!(out, "    Removed: {}", diff.removed.len());
        if !names_only {
            let _ = writeln!(out, "    Changed: {}", diff.changed.len());
        }
        out.push_str(if abi_break { VERDICT_BREAKAGE } else { VERDICT_ADDED });
    } else {
        out.push_str(VERDICT_MATCH);
    }
    out.push('\n');
    out
}

fn push_entry(out: &mut String, label: &str, name: &str, sym: &SymbolRecord, names_only: bool) {
    let _ = writeln!(out, "{label}: {name}");
    if !names_only {
        let _ = write!(out, "    {sym}\n\n");
    }
}
