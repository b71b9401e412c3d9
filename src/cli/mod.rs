//! CLI module for taskpool - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running demo
//! scenarios and inspecting configuration.

pub mod commands;

pub use commands::Cli;
