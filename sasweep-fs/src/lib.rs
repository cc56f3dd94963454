//! Filesystem abstraction for sasweep.
//!
//! This crate provides:
//! - Filesystem trait for reads and appends
//! - Real and in-memory implementations

pub mod filesystem;

pub use filesystem::{Filesystem, FsError, MockFilesystem, RealFilesystem};
