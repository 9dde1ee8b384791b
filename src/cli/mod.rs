//! CLI module for studybuddy
//!
//! Argument parsing and the non-interactive subcommands.

pub mod args;
pub mod commands;

pub use args::{Args, Commands, Verbosity};
