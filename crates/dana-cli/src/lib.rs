//! Dana CLI support library: shared between the `dana` binary and its tests.

pub mod colors;
pub mod config;
pub mod error_chain;
pub mod repl;
