//! CLI command implementations.

pub mod libraries;
pub mod package;
pub mod sync;
