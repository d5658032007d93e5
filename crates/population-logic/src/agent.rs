//! Agent pool: the population of a single run

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::strategy::Exchange;

/// One participant, bound to a single strategy for its lifetime
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: u32,
    pub strategy_id: String,
    pub score: u64,
    pub games_played: u32,
    /// Opponent id → exchanges with that opponent, oldest first
    #[serde(skip)]
    histories: HashMap<u32, Vec<Exchange>>,
}

impl Agent {
    fn new(id: u32, strategy_id: &str) -> Self {
        Self {
            id,
            strategy_id: strategy_id.to_string(),
            score: 0,
            games_played: 0,
            histories: HashMap::new(),
        }
    }

    /// History against one opponent (empty if they never met)
    pub fn history_with(&self, opponent_id: u32) -> &[Exchange] {
        self.histories
            .get(&opponent_id)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Number of distinct opponents met so far
    pub fn opponents_met(&self) -> usize {
        self.histories.len()
    }

    pub(crate) fn record(&mut self, opponent_id: u32, exchange: Exchange, payoff: u8) {
        self.histories.entry(opponent_id).or_default().push(exchange);
        self.score += payoff as u64;
        self.games_played += 1;
    }
}

/// The population, split between exactly two strategies
///
/// Agents `0..k` hold the first strategy and `k..n` the second. An agent's
/// id is its index and never changes during a run.
#[derive(Clone, Debug)]
pub struct AgentPool {
    agents: Vec<Agent>,
}

impl AgentPool {
    /// Build `round(population_size * proportion)` agents of `strategy_a`
    /// followed by the remainder of `strategy_b`.
    pub fn build(
        population_size: u32,
        strategy_a: &str,
        strategy_b: &str,
        proportion: f64,
    ) -> Result<Self> {
        if population_size < 2 {
            return Err(EngineError::config(format!(
                "populationSize must be at least 2, got {}",
                population_size
            )));
        }
        if !proportion.is_finite() || !(0.0..=1.0).contains(&proportion) {
            return Err(EngineError::config(format!(
                "proportion must be within [0, 1], got {}",
                proportion
            )));
        }

        let count_a = share_of(population_size, proportion);
        let agents = (0..population_size)
            .map(|id| {
                let strategy = if id < count_a { strategy_a } else { strategy_b };
                Agent::new(id, strategy)
            })
            .collect();

        Ok(Self { agents })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Agent> {
        self.agents.get(id as usize)
    }

    pub fn strategy_of(&self, id: u32) -> Option<&str> {
        self.get(id).map(|a| a.strategy_id.as_str())
    }

    pub fn agents(&self) -> impl ExactSizeIterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn count_of(&self, strategy_id: &str) -> usize {
        self.agents.iter().filter(|a| a.strategy_id == strategy_id).count()
    }

    /// Sum of every agent's score
    pub fn total_score(&self) -> u64 {
        self.agents.iter().map(|a| a.score).sum()
    }

    /// Two distinct agents, mutably
    pub(crate) fn pair_mut(&mut self, id1: u32, id2: u32) -> Result<(&mut Agent, &mut Agent)> {
        let invalid = EngineError::InvalidPairing { agent1: id1, agent2: id2 };
        let (i, j) = (id1 as usize, id2 as usize);
        if i == j || i >= self.agents.len() || j >= self.agents.len() {
            return Err(invalid);
        }

        if i < j {
            let (left, right) = self.agents.split_at_mut(j);
            Ok((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.agents.split_at_mut(i);
            Ok((&mut right[0], &mut left[j]))
        }
    }
}

/// Agents assigned to the first strategy, rounding half away from zero
pub fn share_of(population_size: u32, proportion: f64) -> u32 {
    let share = (population_size as f64 * proportion).round() as u32;
    share.min(population_size)
}
