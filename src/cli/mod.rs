//! Command-line interface.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, InstallArgs, StatusArgs, UninstallArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
