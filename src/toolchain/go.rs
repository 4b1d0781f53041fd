//! `go build` as the build step

use crate::error::{GrError, GrResult};
use crate::toolchain::builder::{BuildRequest, Builder};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Builds packages with the Go toolchain
pub struct GoToolchain {
    program: String,
}

impl GoToolchain {
    /// Use the toolchain binary at `program` (a path or a name on PATH)
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, request: &BuildRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("build")
            .arg("-o")
            .arg(request.output)
            .args(&request.config.flags)
            .arg(".")
            .current_dir(request.package)
            .stdin(Stdio::null())
            // The program's own stdout belongs to the program
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        for (name, value) in &request.config.env {
            match value {
                Some(value) => cmd.env(name, value),
                None => cmd.env_remove(name),
            };
        }
        cmd
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

#[async_trait]
impl Builder for GoToolchain {
    async fn build(&self, request: BuildRequest<'_>) -> GrResult<()> {
        info!("Building {}", request.package.display());
        debug!(
            "Executing: {} build -o {} {:?} .",
            self.program,
            request.output.display(),
            request.config.flags
        );

        let status = self.command(&request).status().await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                GrError::ToolchainNotFound(self.program.clone())
            } else {
                GrError::io(format!("running {} build", self.program), e)
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(GrError::BuildFailed {
                package: request.package.to_path_buf(),
                code: status.code(),
            })
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}
