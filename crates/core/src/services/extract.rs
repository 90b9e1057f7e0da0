use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use thiserror::Error;

use crate::config::ToolConfig;
use crate::model::{DuplicateDefinition, SymbolSet};
use crate::services::backends::{NmExtractor, ReadelfExtractor};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Library not found at {0}")]
    MissingLibrary(PathBuf),
    #[error("{tool} failed on {library}: {message}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    ToolInvocation {
        tool: String,
        library: PathBuf,
        message: String,
        stdout: String,
        stderr: String,
    },
    #[error("Malformed {tool} output: {message}: `{line}`")]
    MalformedOutput { tool: &'static str, message: String, line: String },
    #[error("No symbol extraction tool available (looked for {0})")]
    NoToolAvailable(String),
    #[error("Unknown backend '{0}' (expected readelf or nm)")]
    UnknownBackend(String),
    #[error(transparent)]
    DuplicateDefinition(#[from] DuplicateDefinition),
}

impl ExtractError {
    pub(crate) fn malformed(
        tool: &'static str,
        message: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        ExtractError::MalformedOutput { tool, message: message.into(), line: line.into() }
    }
}

/// Trait implemented by extraction backends (readelf, nm).
pub trait SymbolExtractor {
    fn extract(&self, library: &Path) -> Result<SymbolSet, ExtractError>;
    fn name(&self) -> &'static str;
}

/// The two extraction strategies, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Readelf,
    Nm,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Readelf, BackendKind::Nm];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Readelf => "readelf",
            BackendKind::Nm => "nm",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ExtractError> {
        match name {
            "readelf" => Ok(BackendKind::Readelf),
            "nm" => Ok(BackendKind::Nm),
            other => Err(ExtractError::UnknownBackend(other.to_string())),
        }
    }

    /// Environment variable overriding the tool path.
    pub fn env_var(self) -> &'static str {
        match self {
            BackendKind::Readelf => "SYMCHECK_READELF",
            BackendKind::Nm => "SYMCHECK_NM",
        }
    }

    fn executable(self) -> &'static str {
        match (self, cfg!(windows)) {
            (BackendKind::Readelf, false) => "readelf",
            (BackendKind::Readelf, true) => "readelf.exe",
            (BackendKind::Nm, false) => "nm",
            (BackendKind::Nm, true) => "nm.exe",
        }
    }
}

/// Resolves tool executables from config, environment overrides and a search path.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    readelf: Option<PathBuf>,
    nm: Option<PathBuf>,
    forced: Option<String>,
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Locator with config paths only; no env overrides and an empty search path.
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            readelf: config.readelf.clone(),
            nm: config.nm.clone(),
            forced: config.backend.clone(),
            search_path: None,
        }
    }

    /// Locator that also honours `SYMCHECK_READELF`/`SYMCHECK_NM` and `PATH`.
    pub fn from_env(config: &ToolConfig) -> Self {
        let mut locator = Self::new(config);
        for kind in BackendKind::ALL {
            let slot = locator.slot_mut(kind);
            if slot.is_none() {
                *slot = env::var_os(kind.env_var()).filter(|v| !v.is_empty()).map(PathBuf::from);
            }
        }
        locator.search_path = env::var_os("PATH");
        locator
    }

    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    fn slot_mut(&mut self, kind: BackendKind) -> &mut Option<PathBuf> {
        match kind {
            BackendKind::Readelf => &mut self.readelf,
            BackendKind::Nm => &mut self.nm,
        }
    }

    /// Backends to probe, honouring a forced backend from config.
    pub fn candidates(&self) -> Result<Vec<BackendKind>, ExtractError> {
        match &self.forced {
            Some(name) => Ok(vec![BackendKind::from_name(name)?]),
            None => Ok(BackendKind::ALL.to_vec()),
        }
    }

    /// Find the executable for `kind`, or `None` if it is not installed.
    pub fn locate(&self, kind: BackendKind) -> Option<PathBuf> {
        let explicit = match kind {
            BackendKind::Readelf => self.readelf.as_ref(),
            BackendKind::Nm => self.nm.as_ref(),
        };
        if let Some(path) = explicit {
            if path.is_file() {
                return Some(path.clone());
            }
            tracing::debug!(tool = kind.name(), path = %path.display(), "configured tool path missing");
        }
        self.search_path.as_ref().and_then(|paths| find_in_path(paths, kind.executable()))
    }
}

fn find_in_path(paths: &OsString, executable: &str) -> Option<PathBuf> {
    env::split_paths(paths).find_map(|p| {
        let candidate = p.join(executable);
        if candidate.is_file() {
            Some(candidate)
        } else {
            None
        }
    })
}

/// Availability of one backend, as reported by `sym-check backends`.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub name: &'static str,
    pub description: &'static str,
    pub path: Option<PathBuf>,
}

/// Report every backend in probe order and where its tool was found.
pub fn backend_statuses(locator: &ToolLocator) -> Vec<BackendStatus> {
    BackendKind::ALL
        .into_iter()
        .map(|kind| BackendStatus {
            name: kind.name(),
            description: match kind {
                BackendKind::Readelf => "Sectioned symbol tables with per-member archive merging",
                BackendKind::Nm => "Flat POSIX symbol listing (fallback)",
            },
            path: locator.locate(kind),
        })
        .collect()
}

/// A `.a` extension marks a static archive when the caller gives no override.
pub fn is_static_archive_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("a")
}

/// Pick the first available backend: readelf, then nm.
pub fn select_extractor(
    locator: &ToolLocator,
    config: &ToolConfig,
    static_lib: bool,
) -> Result<Box<dyn SymbolExtractor>, ExtractError> {
    let candidates = locator.candidates()?;
    for kind in &candidates {
        let Some(tool) = locator.locate(*kind) else {
            tracing::debug!(tool = kind.name(), "not found");
            continue;
        };
        tracing::debug!(tool = kind.name(), path = %tool.display(), static_lib, "selected backend");
        let extractor: Box<dyn SymbolExtractor> = match kind {
            BackendKind::Readelf => {
                Box::new(ReadelfExtractor::new(tool, static_lib, config.merge_policy))
            }
            BackendKind::Nm => Box::new(NmExtractor::new(tool, static_lib, config.merge_policy)),
        };
        return Ok(extractor);
    }
    let looked_for: Vec<&str> = candidates.iter().map(|k| k.name()).collect();
    Err(ExtractError::NoToolAvailable(looked_for.join(", ")))
}

/// Extract the symbol set of `library`.
///
/// `static_lib` defaults to [`is_static_archive_path`] when not given.
pub fn extract_symbols(
    library: &Path,
    static_lib: Option<bool>,
    locator: &ToolLocator,
    config: &ToolConfig,
) -> Result<SymbolSet, ExtractError> {
    let static_lib = static_lib.unwrap_or_else(|| is_static_archive_path(library));
    let extractor = select_extractor(locator, config, static_lib)?;
    extractor.extract(library)
}

/// Run `tool args... library` and return its stdout.
pub(crate) fn run_tool(tool: &Path, args: &[&str], library: &Path) -> Result<String, ExtractError> {
    if !library.is_file() {
        return Err(ExtractError::MissingLibrary(library.to_path_buf()));
    }
    let invocation_error = |message: String, stdout: String, stderr: String| {
        ExtractError::ToolInvocation {
            tool: tool.display().to_string(),
            library: library.to_path_buf(),
            message,
            stdout,
            stderr,
        }
    };

    let output = Command::new(tool).args(args).arg(library).output().map_err(|e| {
        invocation_error(format!("failed to spawn: {e}"), String::new(), String::new())
    })?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(invocation_error(format!("exited with {}", output.status), stdout, stderr));
    }
    Ok(stdout)
}
