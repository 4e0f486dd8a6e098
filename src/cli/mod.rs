//! CLI module
//!
//! Command-line interface for the Datadis streams.
//!
//! # Commands
//!
//! - `check` - Test the login credentials
//! - `supplies` - Print supply points
//! - `consumption` - Print consumption data for every supply point

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
