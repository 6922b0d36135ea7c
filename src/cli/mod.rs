//! CLI module for the maniforge tool.
//!
//! This module provides the command-line interface: argument parsing and
//! the text/JSON presentation of validation, plan, capacity and apply results.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
