//! Build fingerprinting
//!
//! A fingerprint identifies the exact source and build configuration that
//! produce a binary. Same closure contents, flags and build environment =
//! same fingerprint; anything else changes it.

pub mod closure;
pub mod gomod;

pub use closure::{closure_files, find_module_root};
pub use gomod::{GoMod, LocalReplace};

use crate::error::{GrError, GrResult};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::debug;

/// Bumped whenever the hashed record layout changes
const FORMAT_VERSION: &str = "gr-fingerprint-v1";

/// Environment variables that change what `go build` produces
pub const BUILD_ENV_VARS: &[&str] = &[
    "GOOS",
    "GOARCH",
    "GOAMD64",
    "GOARM",
    "GOARM64",
    "GO386",
    "GOMIPS",
    "GOMIPS64",
    "GOPPC64",
    "GORISCV64",
    "GOWASM",
    "GOEXPERIMENT",
    "GOFLAGS",
    "GOTOOLCHAIN",
    "GOROOT",
    "GOPATH",
    "GOPROXY",
    "GOPRIVATE",
    "GONOSUMDB",
    "GOWORK",
    "CGO_ENABLED",
    "CGO_CFLAGS",
    "CGO_CPPFLAGS",
    "CGO_CXXFLAGS",
    "CGO_FFLAGS",
    "CGO_LDFLAGS",
    "CC",
    "CXX",
    "PKG_CONFIG",
    "AR",
];

/// Everything besides source files that determines the build output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Toolchain binary invoked for the build
    pub toolchain: String,
    /// Extra `go build` flags, order preserved
    pub flags: Vec<String>,
    /// Build-relevant environment; `None` = unset
    pub env: BTreeMap<String, Option<String>>,
}

impl BuildConfig {
    /// Capture the build environment from the current process.
    ///
    /// Reads every name in [`BUILD_ENV_VARS`] plus `extra_vars`.
    pub fn from_process_env(
        toolchain: impl Into<String>,
        flags: Vec<String>,
        extra_vars: &[String],
    ) -> Self {
        let env = BUILD_ENV_VARS
            .iter()
            .map(|name| name.to_string())
            .chain(extra_vars.iter().cloned())
            .map(|name| {
                let value = std::env::var(&name).ok();
                (name, value)
            })
            .collect();

        Self {
            toolchain: toolchain.into(),
            flags,
            env,
        }
    }
}

/// Hex-encoded SHA-256 cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of the package at `root` built with `config`
pub fn fingerprint(root: &Path, config: &BuildConfig) -> GrResult<Fingerprint> {
    let files = closure_files(root)?;

    let mut hasher = Sha256::new();
    record(&mut hasher, b'V', FORMAT_VERSION.as_bytes());

    // BTreeSet iteration is sorted by path
    for path in &files {
        let digest = hash_file(path)?;
        record(&mut hasher, b'F', path.as_os_str().as_encoded_bytes());
        record(&mut hasher, b'D', &digest);
    }

    record(&mut hasher, b'T', config.toolchain.as_bytes());
    for flag in &config.flags {
        record(&mut hasher, b'A', flag.as_bytes());
    }
    for (name, value) in &config.env {
        record(&mut hasher, b'E', name.as_bytes());
        match value {
            Some(value) => record(&mut hasher, b'=', value.as_bytes()),
            None => record(&mut hasher, b'-', b""),
        }
    }

    let sum = Fingerprint(hex::encode(hasher.finalize()));
    debug!("Fingerprint of {} over {} files: {}", root.display(), files.len(), sum);
    Ok(sum)
}

/// Tagged, length-prefixed record so distinct inputs never serialize alike
fn record(hasher: &mut Sha256, tag: u8, bytes: &[u8]) {
    hasher.update([tag]);
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// SHA-256 of a file's contents, streamed
fn hash_file(path: &Path) -> GrResult<Vec<u8>> {
    let mut file =
        File::open(path).map_err(|e| GrError::io(format!("reading {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| GrError::io(format!("reading {}", path.display()), e))?;
    Ok(hasher.finalize().to_vec())
}
