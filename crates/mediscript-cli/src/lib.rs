//! MediScript CLI library.
//!
//! This library provides the terminal front end for MediScript: configuration
//! and profile management, command execution, output formatting, and the
//! interactive analysis session.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod repl;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
