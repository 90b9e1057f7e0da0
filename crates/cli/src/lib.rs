use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use symcheck_core::model::SymbolSet;
use symcheck_core::services::demangle::{Demangler, ItaniumDemangler, NoDemangle};
use symcheck_core::services::extract::ToolLocator;
use symcheck_core::services::input::load_symbols;
use symcheck_core::services::scratch::ScratchDir;
use symcheck_core::ToolConfig;
use tracing_subscriber::EnvFilter;

pub mod commands;

/// Exit code after SIGINT, SIGTERM or SIGHUP (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Everything one `sym-check` invocation needs: the resolved config, where
/// the inspection tools live, and a scratch directory removed when the
/// session ends.
#[derive(Debug)]
pub struct Session {
    pub config: ToolConfig,
    pub locator: ToolLocator,
    scratch: ScratchDir,
}

impl Session {
    /// Resolve config from `--config` or the environment and probe `PATH`.
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = ToolConfig::resolve(config_path).context("Failed to load configuration")?;
        let locator = ToolLocator::from_env(&config);
        Self::with_locator(config, locator)
    }

    pub fn with_locator(config: ToolConfig, locator: ToolLocator) -> Result<Self> {
        let scratch = ScratchDir::new().context("Failed to create scratch directory")?;
        Ok(Self { config, locator, scratch })
    }

    /// Extract from a library or decode a saved symbol list; `-` is stdin.
    pub fn load(&self, input: &Path, static_lib: Option<bool>) -> Result<SymbolSet> {
        load_symbols(input, static_lib, &self.config, &self.locator, &self.scratch)
            .with_context(|| format!("Failed to load symbols from {}", input.display()))
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Remove the scratch directory and exit when the process is interrupted.
    ///
    /// Signals end the process without running destructors, so the handler
    /// deletes the directory itself. Installable once per process.
    pub fn remove_scratch_on_interrupt(&self) -> Result<()> {
        let scratch = self.scratch_path().to_path_buf();
        ctrlc::set_handler(move || {
            tracing::debug!(path = %scratch.display(), "interrupted, removing scratch dir");
            if let Err(err) = fs::remove_dir_all(&scratch) {
                tracing::warn!(path = %scratch.display(), "failed to remove scratch dir: {err}");
            }
            process::exit(INTERRUPTED_EXIT_CODE);
        })
        .context("Failed to install interrupt handler")
    }

    pub fn close(self) -> Result<()> {
        self.scratch.close().context("Failed to remove scratch directory")
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when commands run inside tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Write `text` to `output`, or to stdout when no path is given.
pub fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("Failed to write output: {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")
        }
    }
}

/// The demangler selected by a `--demangle` flag.
pub fn demangler(enabled: bool) -> &'static dyn Demangler {
    if enabled {
        &ItaniumDemangler
    } else {
        &NoDemangle
    }
}
