use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MergePolicy;

/// Environment variable naming a config file when none is passed explicitly.
pub const CONFIG_ENV: &str = "SYMCHECK_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config at {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Standard-library ownership rules used by the `stdlib` filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StdlibConfig {
    /// Prefixes matched against the demangled, qualified symbol name.
    pub prefixes: Vec<String>,
    /// Version tags of the C runtime (`@GLIBC_2.2.5`); such symbols belong to
    /// the standard library only when this library defines them.
    pub runtime_versions: Vec<String>,
}

impl Default for StdlibConfig {
    fn default() -> Self {
        let prefixes = [
            "std::",
            "__cxxabiv1::",
            "__gnu_cxx::",
            "operator new",
            "operator delete",
            "__cxa_",
            "__cxxabi",
            "__gxx_personality",
            "__dynamic_cast",
        ];
        Self {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            runtime_versions: vec!["GLIBC".to_string(), "GCC".to_string()],
        }
    }
}

/// Configuration for tool discovery, archive merging and filtering.
///
/// Loaded from JSON or YAML (by file extension); every field has a default so
/// a config only names what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Explicit path to `readelf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readelf: Option<PathBuf>,
    /// Explicit path to `nm`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nm: Option<PathBuf>,
    /// Force a single backend (`readelf` or `nm`) and disable the fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub merge_policy: MergePolicy,
    pub stdlib: StdlibConfig,
}

impl ToolConfig {
    /// Load a config file, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let parsed = if matches!(ext, "yaml" | "yml") {
            serde_yaml::from_str(&body).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&body).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse { path: path.to_path_buf(), message })
    }

    /// Resolve the effective config: the explicit path, then `$SYMCHECK_CONFIG`,
    /// then built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }
}
