//! Pluggable symbol-name demangling.
//!
//! Reports and the `stdlib` filter take a `&dyn Demangler`, so tests can
//! inject a fake and frontends can disable demangling entirely.

use std::borrow::Cow;

/// Maps a mangled link-time name to a display name.
pub trait Demangler {
    /// Demangle a bare (unversioned) name, or `None` if it is not mangled or
    /// cannot be decoded.
    fn demangle(&self, name: &str) -> Option<String>;

    /// Display form of a full symbol name: strips a Mach-O leading
    /// underscore and a `@version` suffix before demangling, then re-appends
    /// the suffix. Falls back to the name unchanged.
    fn display_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let (base, version) = split_version(name);
        match self.demangle(strip_macho_underscore(base)) {
            Some(demangled) => match version {
                Some(version) => Cow::Owned(format!("{demangled}@{version}")),
                None => Cow::Owned(demangled),
            },
            None => Cow::Borrowed(name),
        }
    }
}

impl<F> Demangler for F
where
    F: Fn(&str) -> Option<String>,
{
    fn demangle(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Leaves every name as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDemangle;

impl Demangler for NoDemangle {
    fn demangle(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Itanium C++ (and Rust) demangler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItaniumDemangler;

impl Demangler for ItaniumDemangler {
    fn demangle(&self, name: &str) -> Option<String> {
        if name.starts_with("_Z") {
            if let Some(demangled) = try_demangle_cpp(name) {
                return Some(demangled);
            }
        }
        try_demangle_rust(name)
    }
}

#[cfg(feature = "cpp")]
fn try_demangle_cpp(name: &str) -> Option<String> {
    use cpp_demangle::{DemangleOptions, Symbol};

    let symbol = Symbol::new(name).ok()?;
    symbol.demangle(&DemangleOptions::default()).ok()
}

#[cfg(not(feature = "cpp"))]
fn try_demangle_cpp(_name: &str) -> Option<String> {
    None
}

#[cfg(feature = "rust")]
fn try_demangle_rust(name: &str) -> Option<String> {
    rustc_demangle::try_demangle(name).ok().map(|d| format!("{d:#}"))
}

#[cfg(not(feature = "rust"))]
fn try_demangle_rust(_name: &str) -> Option<String> {
    None
}

/// Split `name@VERSION` (or `name@@VERSION`) at the first `@`.
pub fn split_version(name: &str) -> (&str, Option<&str>) {
    match name.split_once('@') {
        Some((base, version)) => (base, Some(version.trim_start_matches('@'))),
        None => (name, None),
    }
}

/// Mach-O prefixes C++ names with an extra underscore (`__Z...`).
pub fn strip_macho_underscore(name: &str) -> &str {
    if name.starts_with("__Z") {
        &name[1..]
    } else {
        name
    }
}
