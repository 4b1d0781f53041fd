//! Artifact store
//!
//! Maps (package path, fingerprint) to an executable under the cache root
//! and installs freshly built executables with rename-into-place.

use crate::error::{GrError, GrResult};
use crate::fingerprint::{BuildConfig, Fingerprint};
use crate::toolchain::{BuildRequest, Builder};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Subdirectory of the cache root holding built programs
const PACKAGES_DIR: &str = "pkg";

/// Prefix of in-progress build outputs
const TMP_PREFIX: &str = ".tmp-";

/// Result of [`ArtifactCache::ensure_artifact`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A new executable is now at the resolved path
    Installed,
    /// The build succeeded without producing an executable
    NothingToRun,
}

/// Content-addressed store of built programs
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    /// Open the cache rooted at `root`, which must be absolute
    pub fn new(root: impl Into<PathBuf>) -> GrResult<Self> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(GrError::CacheDirNotAbsolute(root));
        }
        Ok(Self { root })
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every build of one package
    fn package_dir(&self, package: &Path) -> PathBuf {
        let id = hex::encode(&Sha256::digest(package.as_os_str().as_encoded_bytes())[..8]);
        let name = package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        self.root
            .join(PACKAGES_DIR)
            .join(format!("{}-{}", name, id))
    }

    /// Path of the executable for `package` at `fingerprint`.
    ///
    /// Pure; the file may or may not exist.
    pub fn resolve(&self, package: &Path, fingerprint: &Fingerprint) -> PathBuf {
        self.package_dir(package).join(fingerprint.as_str())
    }

    /// Build `package` and install the result at [`resolve`](Self::resolve).
    ///
    /// Called after a run attempt found no executable. Build diagnostics go
    /// straight to the user; failures are not retried.
    pub async fn ensure_artifact(
        &self,
        package: &Path,
        fingerprint: &Fingerprint,
        config: &BuildConfig,
        builder: &dyn Builder,
    ) -> GrResult<BuildOutcome> {
        let target = self.resolve(package, fingerprint);
        let dir = self.package_dir(package);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| GrError::io(format!("creating cache directory {}", dir.display()), e))?;

        // Same directory as the target so the final rename is atomic
        let tmp = dir.join(format!("{}{}", TMP_PREFIX, uuid::Uuid::new_v4()));
        let guard = TempOutput(tmp.clone());

        debug!("Building {} with {} into {}", package.display(), builder.name(), tmp.display());
        builder
            .build(BuildRequest {
                package,
                config,
                output: &tmp,
            })
            .await?;

        if !tmp.is_file() {
            warn!("{} produced no executable, nothing to run", package.display());
            return Ok(BuildOutcome::NothingToRun);
        }

        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|source| GrError::Install {
                path: target.clone(),
                source,
            })?;
        drop(guard);

        info!("Installed {}", target.display());
        Ok(BuildOutcome::Installed)
    }
}

/// Removes an unfinished build output on drop
struct TempOutput(PathBuf);

impl Drop for TempOutput {
    fn drop(&mut self) {
        match fs::remove_file(&self.0) {
            Ok(()) => debug!("Removed partial output {}", self.0.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("Failed to remove {}: {}", self.0.display(), e),
        }
    }
}
