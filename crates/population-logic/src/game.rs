//! Game execution engine

use serde::Serialize;
use tracing::debug;

use crate::agent::AgentPool;
use crate::error::Result;
use crate::pairing::Pairing;
use crate::payoff;
use crate::random::SeededRng;
use crate::strategy::{Exchange, Move, StrategyRegistry};

/// Result of a single game between two agents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    /// Global game counter at the time the game was played (0-indexed)
    pub game_index: u32,
    pub pairing_index: usize,
    pub agent1_id: u32,
    pub agent2_id: u32,
    pub move1: Move,
    pub move2: Move,
    pub payoff1: u8,
    pub payoff2: u8,
}

impl GameResult {
    /// Points handed out by this game
    pub fn total_payoff(&self) -> u32 {
        self.payoff1 as u32 + self.payoff2 as u32
    }
}

/// Play one game for a scheduled pairing
///
/// Each agent decides from its own history against the other agent only.
/// Both decisions are made before either history is updated, so the moves
/// are simultaneous.
///
/// # Arguments
/// * `pool` - Population; both agents' scores and histories are updated
/// * `registry` - Strategy lookup for the agents' strategy ids
/// * `pairing` - The active pairing
/// * `game_index` - Global game counter, recorded in the result
/// * `rng` - Per-game RNG; each side gets its own fork
pub fn play_game(
    pool: &mut AgentPool,
    registry: &StrategyRegistry,
    pairing: &Pairing,
    game_index: u32,
    rng: &SeededRng,
) -> Result<GameResult> {
    let id1 = pairing.agent1_index;
    let id2 = pairing.agent2_index;
    let (agent1, agent2) = pool.pair_mut(id1, id2)?;

    let strategy1 = registry.get(&agent1.strategy_id)?;
    let strategy2 = registry.get(&agent2.strategy_id)?;

    // Create per-side RNG (so they don't affect each other)
    let mut rng1 = rng.fork(0);
    let mut rng2 = rng.fork(1);

    let move1 = strategy1.decide(agent1.history_with(id2), &mut rng1);
    let move2 = strategy2.decide(agent2.history_with(id1), &mut rng2);

    let (payoff1, payoff2) = payoff(move1, move2);

    agent1.record(id2, Exchange::new(move1, move2), payoff1);
    agent2.record(id1, Exchange::new(move2, move1), payoff2);

    debug!(
        game_index,
        pairing = pairing.index,
        agent1 = id1,
        agent2 = id2,
        ?move1,
        ?move2,
        payoff1,
        payoff2,
        "Game played"
    );

    Ok(GameResult {
        game_index,
        pairing_index: pairing.index,
        agent1_id: id1,
        agent2_id: id2,
        move1,
        move2,
        payoff1,
        payoff2,
    })
}
