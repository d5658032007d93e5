//! Population Arena - command-line tournament runner
//!
//! Usage:
//!   population-arena --strategy-a tit-for-tat --strategy-b always-defect -n 50 -g 2000
//!   population-arena --config run.json --seed 7 --json
//!   population-arena --list-strategies

mod config;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use population_logic::{PopulationSimulation, StrategyRegistry};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigArgs;
use crate::report::{standings, strategy_list, strategy_table, ProgressLogger, RunReport};

#[derive(Parser, Debug)]
#[command(name = "population-arena")]
#[command(about = "Iterated Prisoner's Dilemma between two strategy populations")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Print the built-in strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = StrategyRegistry::with_builtins();

    if cli.list_strategies {
        let strategies = strategy_list(&registry);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&strategies)?);
        } else {
            println!("{}", strategy_table(&strategies));
        }
        return Ok(());
    }

    let config = cli.config.resolve()?;
    info!(
        strategies = ?config.strategies,
        population_size = config.population_size,
        total_games = config.total_games,
        seed = config.seed,
        "Configuration loaded"
    );

    let mut simulation = PopulationSimulation::with_registry(config.clone(), registry);
    simulation.add_observer(Box::new(ProgressLogger::default()));
    simulation
        .initialize()
        .context("Failed to initialize simulation")?;

    let snapshot = simulation
        .run_to_completion()
        .context("Simulation aborted")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&RunReport::new(&config, &snapshot))?
        );
    } else {
        println!("{}", standings(&snapshot));
    }

    Ok(())
}
