//! symcheck-core
//!
//! Core library for extracting, filtering and diffing the exported symbol
//! tables of compiled libraries (shared objects and static archives).
//!
//! This crate defines the symbol model, the extraction backends that drive
//! external inspection tools (`readelf`, `nm`), the on-disk symbol-set codec,
//! and the filter, diff and report services used to detect ABI breakage.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends; the `sym-check` CLI is a thin wrapper around it.

pub mod config;
pub mod model;
pub mod services;

pub use config::{ConfigError, StdlibConfig, ToolConfig};
pub use model::{MergePolicy, SymbolKind, SymbolRecord, SymbolSet};

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
