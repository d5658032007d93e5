//! Run configuration: optional JSON file plus command-line overrides

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use population_logic::{PairingOrder, SimulationConfig};

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// JSON configuration file (camelCase fields)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// First strategy id
    #[arg(long, value_name = "ID")]
    pub strategy_a: Option<String>,

    /// Second strategy id
    #[arg(long, value_name = "ID")]
    pub strategy_b: Option<String>,

    /// Share of the population playing the first strategy, in [0, 1]
    #[arg(short, long)]
    pub proportion: Option<f64>,

    #[arg(short = 'n', long)]
    pub population_size: Option<u32>,

    #[arg(short = 'g', long)]
    pub total_games: Option<u32>,

    #[arg(long)]
    pub games_per_pairing: Option<u32>,

    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Play pairings in enumeration order instead of shuffled
    #[arg(long)]
    pub sequential: bool,

    /// Report progress every N games
    #[arg(long, value_name = "N")]
    pub progress_interval: Option<u32>,
}

impl ConfigArgs {
    /// Resolve the final configuration
    ///
    /// Starts from the file (or defaults) and applies every flag given on the
    /// command line. Validation is left to the engine.
    pub fn resolve(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                SimulationConfig::from_json(&json)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => SimulationConfig::new("tit-for-tat", "always-defect"),
        };

        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(id) = &self.strategy_a {
            set_strategy(&mut config.strategies, 0, id);
        }
        if let Some(id) = &self.strategy_b {
            set_strategy(&mut config.strategies, 1, id);
        }
        if let Some(p) = self.proportion {
            config.proportion = p;
        }
        if let Some(n) = self.population_size {
            config.population_size = n;
        }
        if let Some(g) = self.total_games {
            config.total_games = g;
        }
        if let Some(g) = self.games_per_pairing {
            config.games_per_pairing = g;
        }
        if let Some(s) = self.seed {
            config.seed = s;
        }
        if self.sequential {
            config.pairing_order = PairingOrder::Sequential;
        }
        if let Some(i) = self.progress_interval {
            config.progress_interval = i;
        }
    }
}

/// Overwrite one strategy slot, padding a short list with empty ids
fn set_strategy(strategies: &mut Vec<String>, slot: usize, id: &str) {
    if strategies.len() <= slot {
        strategies.resize(slot + 1, String::new());
    }
    strategies[slot] = id.to_string();
}
