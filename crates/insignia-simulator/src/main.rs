//! insignia-sim: run badge session scenarios from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use insignia_core::BadgeConfig;
use insignia_simulator::{load_scenario, World};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "insignia-sim")]
#[command(about = "Run multi-participant badge session scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and report each participant's converged state
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Badge configuration file (TOML or JSON); overrides the scenario's own
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a badge configuration file
    CheckConfig {
        /// Configuration file (TOML or JSON)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            json,
        } => run(&scenario, config.as_deref(), json),
        Commands::CheckConfig { file } => check_config(&file),
    }
}

fn run(scenario_path: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let scenario = load_scenario(scenario_path)
        .with_context(|| format!("loading scenario {}", scenario_path.display()))?;

    let mut config = match config_path {
        Some(path) => BadgeConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => scenario.config.clone().unwrap_or_default(),
    };
    config.merge_with_env()?;
    config.validate()?;

    let report = World::new(scenario, config).run()?;
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }

    if !report.passed() {
        bail!(
            "{} of {} expectations failed",
            report.failed_count(),
            report.expectations.len()
        );
    }
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = BadgeConfig::load_from_file(path)
        .with_context(|| format!("loading config {}", path.display()))?;
    println!(
        "{}: ok ({} exclusive tiers, {} additive roles, {} toggleable roles)",
        path.display(),
        config.exclusive_tiers.len(),
        config.additive_roles.len(),
        config.toggleable_roles.len()
    );
    Ok(())
}
