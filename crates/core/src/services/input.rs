//! Loading a symbol set from either a library or a saved snapshot.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use goblin::Hint;
use thiserror::Error;

use crate::config::ToolConfig;
use crate::model::SymbolSet;
use crate::services::codec::{self, CodecError};
use crate::services::extract::{extract_symbols, is_static_archive_path, ExtractError, ToolLocator};
use crate::services::scratch::ScratchDir;

/// Input path that stands for standard input.
pub const STDIN_PATH: &str = "-";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to identify {path}: {message}")]
    Sniff { path: PathBuf, message: String },
    #[error("Invalid symbol list {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// What a file on disk turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    SharedLibrary,
    StaticArchive,
    SymbolList,
}

/// Classify `path` by its magic bytes.
pub fn sniff_input(path: &Path) -> Result<InputKind, LoadError> {
    let io_err = |source| LoadError::Io { path: path.to_path_buf(), source };
    let mut file = fs::File::open(path).map_err(io_err)?;
    let mut magic = [0u8; 16];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..]).map_err(io_err)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if magic[..filled].starts_with(b"!<arch>\n") {
        return Ok(InputKind::StaticArchive);
    }
    if filled < magic.len() {
        return Ok(InputKind::SymbolList);
    }

    let hint = goblin::peek_bytes(&magic)
        .map_err(|e| LoadError::Sniff { path: path.to_path_buf(), message: e.to_string() })?;
    Ok(match hint {
        Hint::Archive => InputKind::StaticArchive,
        Hint::Unknown(_) => InputKind::SymbolList,
        _ => InputKind::SharedLibrary,
    })
}

/// True when `path` is a binary the extractors should read.
pub fn is_library_file(path: &Path) -> Result<bool, LoadError> {
    Ok(sniff_input(path)? != InputKind::SymbolList)
}

/// Reject inputs that cannot be overwritten with a filtered symbol list.
pub fn ensure_rewritable(path: &Path) -> Result<(), LoadError> {
    if path == Path::new(STDIN_PATH) {
        return Err(LoadError::InvalidInput("standard input cannot be rewritten in place".into()));
    }
    if is_library_file(path)? {
        return Err(LoadError::InvalidInput(format!(
            "{} is a library file, not a symbol list",
            path.display()
        )));
    }
    Ok(())
}

/// Read a saved symbol list.
pub fn read_symbol_file(path: &Path) -> Result<SymbolSet, LoadError> {
    let body = fs::read_to_string(path)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    codec::decode(&body).map_err(|source| LoadError::Decode { path: path.to_path_buf(), source })
}

/// Load a symbol set from a library (extracting it) or a saved symbol list.
///
/// `-` reads standard input, spooled through `scratch` so the external tool
/// can be given a path. `static_lib` overrides archive detection.
pub fn load_symbols(
    input: &Path,
    static_lib: Option<bool>,
    config: &ToolConfig,
    locator: &ToolLocator,
    scratch: &ScratchDir,
) -> Result<SymbolSet, LoadError> {
    let path = if input == Path::new(STDIN_PATH) {
        scratch
            .spool("stdin", &mut io::stdin().lock())
            .map_err(|source| LoadError::Io { path: input.to_path_buf(), source })?
    } else {
        input.to_path_buf()
    };

    match sniff_input(&path)? {
        InputKind::SymbolList => {
            tracing::debug!(path = %input.display(), "loading symbol list");
            read_symbol_file(&path)
        }
        kind => {
            let static_lib = static_lib.or_else(|| {
                // Spooled stdin has no extension to go by.
                (input == Path::new(STDIN_PATH)).then_some(kind == InputKind::StaticArchive)
            });
            let static_lib = static_lib.unwrap_or_else(|| is_static_archive_path(&path));
            tracing::debug!(path = %input.display(), static_lib, "extracting symbols");
            Ok(extract_symbols(&path, Some(static_lib), locator, config)?)
        }
    }
}
