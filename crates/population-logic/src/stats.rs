//! Tournament statistics
//!
//! Snapshots are rebuilt from the agent pool with a single pass on every
//! request, so they never alias live engine state. Per-game outcome tallies
//! are kept incrementally by [`StatisticsAggregator`] as games are played.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::agent::AgentPool;
use crate::game::GameResult;
use crate::pairing::{PairingProgress, PairingScheduler};
use crate::strategy::Move;

/// Aggregates for one strategy's share of the population
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyStats {
    pub name: String,
    pub count: u32,
    pub total_score: u64,
    pub average_score: f64,
    pub min_score: u64,
    pub max_score: u64,
}

/// Running tally of game outcomes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeTally {
    pub mutual_cooperation: u32,
    pub mutual_defection: u32,
    /// One side cooperated while the other defected
    pub exploitation: u32,
    /// Sum of both payoffs over every game
    pub total_payoff: u64,
}

impl OutcomeTally {
    pub fn games(&self) -> u32 {
        self.mutual_cooperation + self.mutual_defection + self.exploitation
    }

    /// Share of individual moves that were Cooperate
    pub fn cooperation_rate(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        let cooperations = self.mutual_cooperation as f64 * 2.0 + self.exploitation as f64;
        cooperations / (games as f64 * 2.0)
    }
}

/// Point-in-time readout of a run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub games_played: u32,
    pub total_games: u32,
    /// `games_played / total_games`, within [0, 1]
    pub progress: f64,
    pub is_complete: bool,
    pub strategy_stats: BTreeMap<String, StrategyStats>,
    /// Strategy id → exact score → number of agents holding it
    pub score_distributions: BTreeMap<String, BTreeMap<u64, u32>>,
    pub current_pairing: Option<PairingProgress>,
    pub outcomes: OutcomeTally,
}

impl StatisticsSnapshot {
    /// Strategy with the strictly highest average score
    pub fn leader(&self) -> Option<&str> {
        let mut ranked: Vec<(&str, f64)> = self
            .strategy_stats
            .iter()
            .map(|(id, stats)| (id.as_str(), stats.average_score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        match ranked.as_slice() {
            [] => None,
            [(id, _)] => Some(*id),
            [(id, first), (_, second), ..] => (first > second).then_some(*id),
        }
    }

    /// Sum of `count` over all strategies
    pub fn population(&self) -> u32 {
        self.strategy_stats.values().map(|s| s.count).sum()
    }
}

/// Keeps incremental tallies and builds snapshots
#[derive(Clone, Debug, Default)]
pub struct StatisticsAggregator {
    outcomes: OutcomeTally,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one played game into the running tally
    pub fn record(&mut self, result: &GameResult) {
        match (result.move1, result.move2) {
            (Move::Cooperate, Move::Cooperate) => self.outcomes.mutual_cooperation += 1,
            (Move::Defect, Move::Defect) => self.outcomes.mutual_defection += 1,
            _ => self.outcomes.exploitation += 1,
        }
        self.outcomes.total_payoff += result.total_payoff() as u64;
    }

    pub fn outcomes(&self) -> OutcomeTally {
        self.outcomes
    }

    pub fn reset(&mut self) {
        self.outcomes = OutcomeTally::default();
    }

    /// Build a fresh snapshot from the pool
    ///
    /// # Arguments
    /// * `pool` - Population to aggregate
    /// * `scheduler` - Source of the active pairing's progress, if any;
    ///   a finished run reports the pairing of its final game
    /// * `games_played` / `total_games` - Global progress counters
    /// * `is_complete` - Whether the run has finished or was stopped
    /// * `strategies` - `(id, display name)` of every configured strategy;
    ///   listed strategies appear even with zero agents
    pub fn snapshot(
        &self,
        pool: &AgentPool,
        scheduler: Option<&PairingScheduler>,
        games_played: u32,
        total_games: u32,
        is_complete: bool,
        strategies: &[(String, String)],
    ) -> StatisticsSnapshot {
        let mut strategy_stats: BTreeMap<String, StrategyStats> = strategies
            .iter()
            .map(|(id, name)| {
                let stats = StrategyStats {
                    name: name.clone(),
                    ..StrategyStats::default()
                };
                (id.clone(), stats)
            })
            .collect();
        let mut score_distributions: BTreeMap<String, BTreeMap<u64, u32>> = strategies
            .iter()
            .map(|(id, _)| (id.clone(), BTreeMap::new()))
            .collect();

        for agent in pool.agents() {
            let stats = strategy_stats
                .entry(agent.strategy_id.clone())
                .or_insert_with(|| StrategyStats {
                    name: agent.strategy_id.clone(),
                    ..StrategyStats::default()
                });

            if stats.count == 0 {
                stats.min_score = agent.score;
                stats.max_score = agent.score;
            } else {
                stats.min_score = stats.min_score.min(agent.score);
                stats.max_score = stats.max_score.max(agent.score);
            }
            stats.count += 1;
            stats.total_score += agent.score;

            *score_distributions
                .entry(agent.strategy_id.clone())
                .or_default()
                .entry(agent.score)
                .or_insert(0) += 1;
        }

        for stats in strategy_stats.values_mut() {
            stats.average_score = if stats.count == 0 {
                0.0
            } else {
                stats.total_score as f64 / stats.count as f64
            };
        }

        let progress = if total_games == 0 {
            0.0
        } else {
            (games_played as f64 / total_games as f64).min(1.0)
        };

        StatisticsSnapshot {
            games_played,
            total_games,
            progress,
            is_complete,
            strategy_stats,
            score_distributions,
            current_pairing: scheduler.and_then(|s| {
                if is_complete {
                    s.last_played()
                } else {
                    Some(s.current_progress())
                }
            }),
            outcomes: self.outcomes,
        }
    }
}
