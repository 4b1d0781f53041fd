//! Content-addressed program cache
//!
//! Every built program lives at
//! `<cache root>/pkg/<package name>-<package path hash>/<fingerprint>`.
//! Entries are immutable once installed: a changed source tree hashes to a
//! different fingerprint and therefore a different file.
//!
//! # Concurrency
//!
//! There is no cross-process lock. Builds write to a uniquely named
//! temporary file next to the final path and rename it into place, so a
//! reader sees either a complete executable or nothing. Two racing builds
//! of the same fingerprint produce equivalent programs and the last rename
//! wins.

pub mod store;

pub use store::{ArtifactCache, BuildOutcome};
