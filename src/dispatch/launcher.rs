//! Handing control to a built program

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;

/// Starts a cached program
pub trait Launcher: Send + Sync {
    /// Run `program` as `argv0` with `args`, inheriting the environment.
    ///
    /// Returns the program's exit code where the program runs as a child.
    /// Where the current process image is replaced, a return is always an
    /// error. `io::ErrorKind::NotFound` means the program does not exist.
    fn launch(&self, program: &Path, argv0: &OsStr, args: &[OsString]) -> io::Result<i32>;
}

/// Replaces the current process with the program (Unix `execve`).
///
/// Elsewhere, runs the program as a child with inherited stdio and reports
/// its exit code.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessImage;

#[cfg(unix)]
impl Launcher for ProcessImage {
    fn launch(&self, program: &Path, argv0: &OsStr, args: &[OsString]) -> io::Result<i32> {
        use std::os::unix::process::CommandExt;
        use std::process::Command;

        let err = Command::new(program).arg0(argv0).args(args).exec();
        Err(err)
    }
}

#[cfg(not(unix))]
impl Launcher for ProcessImage {
    fn launch(&self, program: &Path, _argv0: &OsStr, args: &[OsString]) -> io::Result<i32> {
        use std::process::{Command, Stdio};

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(status.code().unwrap_or(crate::dispatch::INTERNAL_FAILURE))
    }
}
