//! Builder trait

use crate::error::GrResult;
use crate::fingerprint::BuildConfig;
use async_trait::async_trait;
use std::path::Path;

/// Inputs for one build of one package
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    /// Absolute package directory
    pub package: &'a Path,
    /// Flags and environment the build runs with
    pub config: &'a BuildConfig,
    /// Where the executable must be written
    pub output: &'a Path,
}

/// External build step
///
/// Implementations pass diagnostics straight through to the user and
/// report failure as [`GrError::BuildFailed`](crate::error::GrError::BuildFailed).
/// A successful build that leaves nothing at `output` means the package
/// produced no program.
#[async_trait]
pub trait Builder: Send + Sync {
    /// Build the package, writing the executable to `request.output`
    async fn build(&self, request: BuildRequest<'_>) -> GrResult<()>;

    /// Human-readable builder name for logs
    fn name(&self) -> &str;
}
