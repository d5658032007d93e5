//! Console output for a run

use std::fmt::Write as _;

use population_logic::{
    SimulationConfig, SimulationObserver, StatisticsSnapshot, StrategyInfo, StrategyRegistry,
};
use serde::Serialize;
use tracing::info;

/// Logs progress at `info`, at most once per tenth of the run
#[derive(Debug, Default)]
pub struct ProgressLogger {
    last_tenth: u32,
}

impl SimulationObserver for ProgressLogger {
    fn on_progress_update(&mut self, snapshot: &StatisticsSnapshot) {
        let tenth = (snapshot.progress * 10.0).floor() as u32;
        if tenth <= self.last_tenth {
            return;
        }
        self.last_tenth = tenth;

        info!(
            games_played = snapshot.games_played,
            total_games = snapshot.total_games,
            progress = snapshot.progress,
            cooperation_rate = snapshot.outcomes.cooperation_rate(),
            "Progress"
        );
    }
}

/// Final output of `--json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport<'a> {
    pub config: &'a SimulationConfig,
    pub leader: Option<&'a str>,
    pub statistics: &'a StatisticsSnapshot,
}

impl<'a> RunReport<'a> {
    pub fn new(config: &'a SimulationConfig, statistics: &'a StatisticsSnapshot) -> Self {
        Self {
            config,
            leader: statistics.leader(),
            statistics,
        }
    }
}

/// Human-readable standings, best average first
pub fn standings(snapshot: &StatisticsSnapshot) -> String {
    let mut rows: Vec<_> = snapshot.strategy_stats.iter().collect();
    rows.sort_by(|a, b| b.1.average_score.total_cmp(&a.1.average_score));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Games played: {}/{}{}",
        snapshot.games_played,
        snapshot.total_games,
        if snapshot.is_complete { "" } else { " (incomplete)" }
    );
    let _ = writeln!(
        out,
        "{:<24} {:>6} {:>10} {:>9} {:>6} {:>6}",
        "strategy", "agents", "total", "average", "min", "max"
    );
    for (id, stats) in rows {
        let _ = writeln!(
            out,
            "{:<24} {:>6} {:>10} {:>9.2} {:>6} {:>6}",
            id, stats.count, stats.total_score, stats.average_score, stats.min_score, stats.max_score
        );
    }

    let outcomes = &snapshot.outcomes;
    let _ = writeln!(
        out,
        "Outcomes: {} mutual cooperation, {} mutual defection, {} exploitation",
        outcomes.mutual_cooperation, outcomes.mutual_defection, outcomes.exploitation
    );
    let _ = write!(
        out,
        "Leader: {}",
        snapshot.leader().unwrap_or("none (tie)")
    );
    out
}

pub fn strategy_list(registry: &StrategyRegistry) -> Vec<StrategyInfo> {
    registry.iter().map(|s| s.info()).collect()
}

/// One line per strategy: id, then `name: description`
pub fn strategy_table(strategies: &[StrategyInfo]) -> String {
    strategies
        .iter()
        .map(|s| format!("{:<24} {}: {}", s.id, s.name, s.description))
        .collect::<Vec<_>>()
        .join("\n")
}
