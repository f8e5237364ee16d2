//! fpctl library
//!
//! Argument definitions and the command runner, split from `main` so they
//! can be tested.

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod runner;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use commands::{Commands, SettingsArgs};
pub use runner::{report_error, run};
