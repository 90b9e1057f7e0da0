use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Run-scoped temporary directory.
///
/// Acquire one at the start of a run and pass it down explicitly; the
/// directory and everything spooled into it is removed when the value is
/// dropped (success, error return or unwinding) or on [`ScratchDir::close`].
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("sym-check-").tempdir()?;
        tracing::debug!(path = %dir.path().display(), "created scratch dir");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy `reader` into a new file named `name` inside the scratch dir.
    pub fn spool(&self, name: &str, reader: &mut dyn Read) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        let mut file = fs::File::create(&path)?;
        io::copy(reader, &mut file)?;
        Ok(path)
    }

    /// Remove the directory now, surfacing any removal error.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
