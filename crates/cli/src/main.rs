use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use sym_check::commands::{
    diff_command, extract_command, filter_command, list_backends_command, match_command,
    DiffOptions, ExtractOptions, FilterOptions, FilterTarget,
};
use sym_check::{init_tracing, Session};
use symcheck_core::services::filter::FilterKind;

/// Symbol-table extraction and ABI diffing for shared objects and static archives.
///
/// This CLI is a thin wrapper around `symcheck-core` (exposed in code as
/// `symcheck_core`). Inputs may be libraries, which are handed to `readelf`
/// or `nm`, or symbol lists previously written by `sym-check extract`.
#[derive(Parser, Debug)]
#[command(
    name = "sym-check",
    version,
    about = "Extract, filter and diff library symbol tables",
    long_about = None
)]
struct Cli {
    /// Config file (JSON, or YAML by extension). Defaults to $SYMCHECK_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the symbol table of a library and write it as a symbol list.
    Extract {
        /// Library to read (`-` for stdin).
        library: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only write symbol names.
        #[arg(long, default_value_t = false)]
        names_only: bool,

        /// Only keep symbols owned by the C++ standard library.
        #[arg(long, default_value_t = false)]
        only_stdlib_symbols: bool,

        /// Only keep symbols defined by the library.
        #[arg(long, default_value_t = false)]
        defined_only: bool,

        /// Treat the input as a static archive regardless of its extension.
        #[arg(long = "static", conflicts_with = "shared", default_value_t = false)]
        static_lib: bool,

        /// Treat the input as a shared object regardless of its extension.
        #[arg(long, default_value_t = false)]
        shared: bool,
    },

    /// Compare two libraries or symbol lists.
    ///
    /// Exits 0 when they match, 2 when they differ compatibly (additions
    /// only) and 3 on ABI breakage.
    Diff {
        /// The old library or symbol list.
        old: PathBuf,

        /// The new library or symbol list.
        new: PathBuf,

        /// Report file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compare names only; attribute changes do not break.
        #[arg(long, default_value_t = false)]
        names_only: bool,

        /// Ignore added symbols.
        #[arg(long, default_value_t = false)]
        removed_only: bool,

        /// Only compare symbols owned by the C++ standard library.
        #[arg(long, default_value_t = false)]
        only_stdlib_symbols: bool,

        /// Show demangled names in the report.
        #[arg(long, default_value_t = false)]
        demangle: bool,

        /// Also list symbols present in both inputs.
        #[arg(long, default_value_t = false)]
        show_common: bool,

        /// Exit 3 on any difference, not only on breakage.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Filter a library or symbol list with a named pipeline.
    Filter {
        /// One of: stdlib, stdlib-versioned, stdlib-unversioned, defined, undefined.
        #[arg(value_name = "FILTER")]
        filter: FilterKind,

        /// Library or symbol list (`-` for stdin).
        input: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(short, long, conflicts_with = "inplace")]
        output: Option<PathBuf>,

        /// Rewrite the input symbol list in place.
        #[arg(short, long, default_value_t = false)]
        inplace: bool,

        /// Only write symbol names.
        #[arg(long, default_value_t = false)]
        names_only: bool,

        /// Write demangled names.
        #[arg(long, requires = "names_only", default_value_t = false)]
        demangle: bool,
    },

    /// Print symbols whose name matches any of the given regular expressions.
    ///
    /// Exits 0 when nothing matches and 2 when something does.
    Match {
        /// Library or symbol list (`-` for stdin).
        input: PathBuf,

        /// Regular expressions, matched against raw and demangled names.
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Print demangled names.
        #[arg(long, default_value_t = false)]
        demangle: bool,
    },

    /// List extraction backends and where their tools were found.
    Backends {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = run(cli)?;
    if code != 0 {
        process::exit(code);
    }
    Ok(())
}

/// Run one command and return its exit code. The session's scratch
/// directory is closed here; on an error return it is removed on drop, and
/// on an interrupt by the signal handler.
fn run(cli: Cli) -> Result<i32> {
    let session = Session::open(cli.config.as_deref())?;
    session.remove_scratch_on_interrupt()?;

    let code = match cli.command {
        Command::Extract {
            library,
            output,
            names_only,
            only_stdlib_symbols,
            defined_only,
            static_lib,
            shared,
        } => {
            let options = ExtractOptions {
                output,
                names_only,
                only_stdlib: only_stdlib_symbols,
                defined_only,
                static_lib: match (static_lib, shared) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            extract_command(&session, &library, &options)?;
            0
        }
        Command::Diff {
            old,
            new,
            output,
            names_only,
            removed_only,
            only_stdlib_symbols,
            demangle,
            show_common,
            strict,
        } => {
            let options = DiffOptions {
                output,
                names_only,
                removed_only,
                only_stdlib: only_stdlib_symbols,
                demangle,
                show_common,
                strict,
            };
            diff_command(&session, &old, &new, &options)?.exit_code()
        }
        Command::Filter { filter, input, output, inplace, names_only, demangle } => {
            let target = match (inplace, output) {
                (true, _) => FilterTarget::InPlace,
                (false, Some(path)) => FilterTarget::File(path),
                (false, None) => FilterTarget::Stdout,
            };
            let options = FilterOptions { target, names_only, demangle };
            filter_command(&session, filter, &input, &options)?;
            0
        }
        Command::Match { input, patterns, demangle } => {
            if match_command(&session, &input, &patterns, demangle)? {
                2
            } else {
                0
            }
        }
        Command::Backends { json } => {
            list_backends_command(&session.locator, json)?;
            0
        }
    };

    session.close()?;
    Ok(code)
}
