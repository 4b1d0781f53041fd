//! Error types for gr
//!
//! All modules use `GrResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gr operations
pub type GrResult<T> = Result<T, GrError>;

/// All errors that can occur in gr
#[derive(Error, Debug)]
pub enum GrError {
    // Configuration errors
    #[error("cache directory is not set")]
    CacheDirNotSet,

    #[error("cache directory {0:?} is not absolute")]
    CacheDirNotAbsolute(PathBuf),

    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("can't find absolute path for package {path}: {source}")]
    PackagePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Fingerprinting errors
    #[error("malformed dependency reference in {descriptor}: {reason}")]
    MalformedDependency { descriptor: PathBuf, reason: String },

    #[error("can't calculate checksum for package {package}: {source}")]
    Checksum {
        package: PathBuf,
        #[source]
        source: Box<GrError>,
    },

    // Build errors
    #[error("go toolchain not found: {0}")]
    ToolchainNotFound(String),

    #[error("failed to build program {package}: {source}")]
    Build {
        package: PathBuf,
        #[source]
        source: Box<GrError>,
    },

    #[error("build of {package} exited with {}", describe_code(.code))]
    BuildFailed { package: PathBuf, code: Option<i32> },

    #[error("failed to install artifact {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Run errors
    #[error("failed to run program {path}: {source}")]
    Run {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

impl GrError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a fingerprinting failure with the package it was computed for
    pub fn checksum(package: impl Into<PathBuf>, source: GrError) -> Self {
        Self::Checksum {
            package: package.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a failure to produce the package's executable
    pub fn build(package: impl Into<PathBuf>, source: GrError) -> Self {
        Self::Build {
            package: package.into(),
            source: Box::new(source),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheDirNotSet => Some("Set GR_CACHE_DIR or pass --cache-dir"),
            Self::CacheDirNotAbsolute(_) => Some("Use an absolute path for the cache directory"),
            Self::ToolchainNotFound(_) => Some("Install Go or point GR_GO at the go binary"),
            Self::Build { source, .. } | Self::Checksum { source, .. } => source.hint(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GrError::CacheDirNotAbsolute(PathBuf::from("cache"));
        assert_eq!(err.to_string(), "cache directory \"cache\" is not absolute");
    }

    #[test]
    fn build_failure_display() {
        let err = GrError::BuildFailed {
            package: PathBuf::from("/src/hello"),
            code: Some(1),
        };
        assert!(err.to_string().contains("/src/hello"));
        assert!(err.to_string().contains("exit code 1"));

        let err = GrError::BuildFailed {
            package: PathBuf::from("/src/hello"),
            code: None,
        };
        assert!(err.to_string().contains("a signal"));
    }

    #[test]
    fn build_wrapper_prefixes_any_cause() {
        let io = GrError::io("creating cache directory /c/pkg", std::io::Error::other("read-only"));
        let err = GrError::build("/src/hello", io);
        assert_eq!(
            err.to_string(),
            "failed to build program /src/hello: IO error: creating cache directory /c/pkg: read-only"
        );

        let err = GrError::build("/src/hello", GrError::ToolchainNotFound("go".to_string()));
        assert_eq!(err.hint(), Some("Install Go or point GR_GO at the go binary"));
    }

    #[test]
    fn error_hint() {
        assert_eq!(
            GrError::CacheDirNotSet.hint(),
            Some("Set GR_CACHE_DIR or pass --cache-dir")
        );
        assert!(GrError::io("x", std::io::Error::other("y")).hint().is_none());
    }
}
