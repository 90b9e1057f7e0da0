use std::path::{Path, PathBuf};

use anyhow::Result;
use symcheck_core::services::codec;
use symcheck_core::services::demangle::{ItaniumDemangler, NoDemangle};
use symcheck_core::services::filter::{self, StdlibMatcher};

use crate::{write_output, Session};

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Write here instead of stdout.
    pub output: Option<PathBuf>,
    pub names_only: bool,
    pub only_stdlib: bool,
    pub defined_only: bool,
    /// `Some(true)` for `--static`, `Some(false)` for `--shared`.
    pub static_lib: Option<bool>,
}

/// Extract the symbol set of `library` and write it as a symbol list.
pub fn extract_command(session: &Session, library: &Path, options: &ExtractOptions) -> Result<()> {
    let mut symbols = session.load(library, options.static_lib)?;
    if options.only_stdlib {
        let matcher = StdlibMatcher::new(&session.config.stdlib, &ItaniumDemangler);
        symbols = filter::stdlib(&symbols, &matcher).0;
    }
    if options.defined_only {
        symbols = filter::defined(&symbols).0;
    }
    tracing::debug!(symbols = symbols.len(), library = %library.display(), "extracted");

    let text = if options.names_only {
        codec::encode_names(&symbols, &NoDemangle)
    } else {
        codec::encode(&symbols)
    };
    write_output(&text, options.output.as_deref())
}
