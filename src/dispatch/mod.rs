//! Run-or-build dispatch
//!
//! ```text
//! TryRun ──hit──▶ Executed
//!    │
//!   miss
//!    ▼
//! Building ──failure──▶ Reported
//!    │        └─nothing to run──▶ done
//!  installed
//!    ▼
//! TryRunAgain ──▶ Executed | ExecFailed
//! ```
//!
//! The first run attempt is made before anything is built: on a cache hit
//! the process becomes the program without touching the cache at all.

mod launcher;

pub use launcher::{Launcher, ProcessImage};

use crate::cache::{ArtifactCache, BuildOutcome};
use crate::error::{GrError, GrResult};
use crate::fingerprint::{fingerprint, BuildConfig};
use crate::toolchain::Builder;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exit code for every failure of gr itself
pub const INTERNAL_FAILURE: i32 = 255;

/// One request to run a package
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Canonical absolute package directory
    pub package: PathBuf,
    /// Arguments for the program
    pub args: Vec<OsString>,
    /// Build flags and environment
    pub build: BuildConfig,
}

impl Invocation {
    /// Resolve `package` to an absolute directory and bundle the request
    pub fn new(package: &Path, args: Vec<OsString>, build: BuildConfig) -> GrResult<Self> {
        let abs = package.canonicalize().map_err(|source| GrError::PackagePath {
            path: package.to_path_buf(),
            source,
        })?;
        Ok(Self {
            package: abs,
            args,
            build,
        })
    }

    /// Name the program is shown under (`argv[0]`)
    pub fn program_name(&self) -> &OsStr {
        self.package
            .file_name()
            .unwrap_or_else(|| self.package.as_os_str())
    }
}

/// How a dispatch ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The program ran and exited with this code
    Exited(i32),
    /// The build produced no program; nothing was run
    NothingToRun,
}

impl Completion {
    /// Process exit code for this completion
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::NothingToRun => 0,
        }
    }
}

/// Chooses between running a cached program and building it first
pub struct Dispatcher<'a> {
    cache: &'a ArtifactCache,
    builder: &'a dyn Builder,
    launcher: &'a dyn Launcher,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        cache: &'a ArtifactCache,
        builder: &'a dyn Builder,
        launcher: &'a dyn Launcher,
    ) -> Self {
        Self {
            cache,
            builder,
            launcher,
        }
    }

    /// Run the package, building it first on a cache miss.
    ///
    /// With [`ProcessImage`] on Unix this only returns on failure or when
    /// there was nothing to run.
    pub async fn dispatch(&self, invocation: &Invocation) -> GrResult<Completion> {
        let package = &invocation.package;
        let sum = fingerprint(package, &invocation.build)
            .map_err(|e| GrError::checksum(package, e))?;
        let program = self.cache.resolve(package, &sum);
        debug!("Cache path: {}", program.display());

        match self.launch(&program, invocation) {
            Ok(code) => return Ok(Completion::Exited(code)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Cache miss for {}", package.display());
            }
            Err(source) => return Err(GrError::Run { path: program, source }),
        }

        let outcome = self
            .cache
            .ensure_artifact(package, &sum, &invocation.build, self.builder)
            .await
            .map_err(|e| GrError::build(package, e))?;
        if outcome == BuildOutcome::NothingToRun {
            return Ok(Completion::NothingToRun);
        }

        self.launch(&program, invocation)
            .map(Completion::Exited)
            .map_err(|source| GrError::Run { path: program, source })
    }

    fn launch(&self, program: &Path, invocation: &Invocation) -> std::io::Result<i32> {
        debug!("Launching {}", program.display());
        self.launcher
            .launch(program, invocation.program_name(), &invocation.args)
    }
}
