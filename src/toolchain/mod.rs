//! Build step abstraction
//!
//! The cache never compiles anything itself; it hands a package to a
//! [`Builder`] and only looks at the outcome. [`GoToolchain`] is the real
//! implementation, tests substitute their own.

mod builder;
mod go;

pub use builder::{BuildRequest, Builder};
pub use go::GoToolchain;
