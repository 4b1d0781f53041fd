//! gr - run Go programs from source through a binary cache
//!
//! Fingerprints a package's full source closure and build configuration,
//! runs the cached executable for that fingerprint if it exists, and
//! otherwise builds it once, installs it atomically and runs it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fingerprint;
pub mod toolchain;

pub use error::{GrError, GrResult};
