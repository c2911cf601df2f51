//! dbscribe CLI library.
//!
//! This module exposes internal types for testing purposes.
//! The main entry point is the `dbscribe` binary.

pub mod cli;
pub mod logging;
pub mod run;
pub mod templates;

pub use cli::Args;
