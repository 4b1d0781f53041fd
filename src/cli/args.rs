//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// gr - run Go programs from source, building only when the source changed
///
/// The first run of a package builds it into a content-addressed cache;
/// later runs with identical source, flags and build environment execute
/// the cached binary directly.
#[derive(Parser, Debug)]
#[command(name = "gr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Cache directory (must be absolute)
    #[arg(long, env = "GR_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "GR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Go toolchain binary
    #[arg(long, env = "GR_GO", value_name = "PATH")]
    pub go: Option<String>,

    /// Extra flag for `go build` (repeatable, order preserved)
    #[arg(short = 'f', long = "build-flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub build_flags: Vec<String>,

    /// Package directory to run, followed by the arguments passed to the
    /// program. Option parsing stops at the package.
    #[arg(
        value_name = "PACKAGE",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<OsString>,
}

impl Cli {
    /// Package directory to run
    pub fn package(&self) -> &Path {
        self.command.first().map(Path::new).unwrap_or(Path::new(""))
    }

    /// Arguments passed to the program, verbatim
    pub fn program_args(&self) -> &[OsString] {
        self.command.get(1..).unwrap_or_default()
    }
}
