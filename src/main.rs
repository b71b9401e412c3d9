use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

mod cli;
mod demo;

use cli::Cli;
use cli::commands::{Commands, Scenario};
use taskpool::PoolConfig;

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskpool")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("taskpool.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &PoolConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Demo {
            scenario,
            duration_ms,
            workers,
        } => handle_demo_command(*scenario, *duration_ms, *workers, cli.is_verbose(), config),
        Commands::Config => handle_config_command(config),
    }
}

fn handle_demo_command(
    scenario: Scenario,
    duration_ms: u64,
    workers: Option<usize>,
    verbose: bool,
    config: &PoolConfig,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(n) = workers {
        config = config.with_worker_threads(n);
    }
    config.validate().context("Invalid pool configuration")?;

    println!(
        "{} {:?} with {} workers for {}ms",
        "Running demo:".green(),
        scenario,
        config.worker_threads,
        duration_ms
    );

    let report = demo::run(scenario, Duration::from_millis(duration_ms), config)?;

    for (at, event) in &report.events {
        println!("  {}  {}", format!("{:>6}ms", at).as_str().dimmed(), event);
    }

    println!("{} {}", "Stats:".cyan(), report.stats);
    if verbose {
        println!("  executed: {}", report.stats.executed());
    }
    if report.stats.panicked > 0 {
        println!("{} {} task(s) panicked", "Warning:".yellow(), report.stats.panicked);
    }
    Ok(())
}

fn handle_config_command(config: &PoolConfig) -> Result<()> {
    info!("Printing resolved configuration");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    println!("{}", "Resolved configuration:".green());
    print!("{}", yaml);
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    let config = PoolConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
