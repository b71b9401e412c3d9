//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - demo: run a canned scenario against a live pool
//! - config: print the resolved pool configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// taskpool - drive a worker pool from the command line
#[derive(Parser, Debug)]
#[command(name = "taskpool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a demo scenario and print a timeline
    Demo {
        /// Which scenario to run
        #[arg(value_enum, default_value_t = Scenario::Mixed)]
        scenario: Scenario,

        /// How long to let the pool run before shutting it down
        #[arg(short, long, default_value_t = 500)]
        duration_ms: u64,

        /// Override the configured number of worker threads
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Print the resolved configuration as YAML
    Config,
}

/// Canned workloads for the demo command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Immediate, delayed and periodic tasks submitted together
    Mixed,
    /// Slow and fast tasks sharing one serial tag
    Serial,
    /// One periodic task, counted over the run
    Periodic,
}
