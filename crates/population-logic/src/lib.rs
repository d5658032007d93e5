//! Population Logic for the Prisoner's Dilemma arena
//!
//! Core engine for repeated Iterated Prisoner's Dilemma contests between two
//! populations of strategy-driven agents.
//! This crate is compiled to:
//! - Native (for the `population-arena` host program)
//! - WASM (for the browser presentation layer)

mod agent;
mod error;
mod game;
mod pairing;
mod random;
mod simulation;
mod stats;
mod strategy;

#[cfg(feature = "wasm")]
mod wasm;

pub use agent::{share_of, Agent, AgentPool};
pub use error::{EngineError, Result};
pub use game::{play_game, GameResult};
pub use pairing::{
    cross_population_first, generate_schedule, pairing_count, Advance, Pairing, PairingOrder,
    PairingProgress, PairingScheduler,
};
pub use random::{RandomSource, SeededRng};
pub use simulation::{
    PopulationSimulation, SimulationConfig, SimulationObserver, SimulationState, MAX_POPULATION,
};
pub use stats::{OutcomeTally, StatisticsAggregator, StatisticsSnapshot, StrategyStats};
pub use strategy::{DecisionFn, Exchange, Move, Strategy, StrategyInfo, StrategyRegistry};

/// Per-player payoff when both cooperate
pub const MUTUAL_COOPERATION_PAYOFF: u8 = 3;

/// Per-player payoff when both defect
pub const MUTUAL_DEFECTION_PAYOFF: u8 = 1;

/// Payoff matrix for the Prisoner's Dilemma
/// Returns (score_a, score_b)
pub fn payoff(a: Move, b: Move) -> (u8, u8) {
    match (a, b) {
        (Move::Cooperate, Move::Cooperate) => (MUTUAL_COOPERATION_PAYOFF, MUTUAL_COOPERATION_PAYOFF),
        (Move::Cooperate, Move::Defect) => (0, 5),
        (Move::Defect, Move::Cooperate) => (5, 0),
        (Move::Defect, Move::Defect) => (MUTUAL_DEFECTION_PAYOFF, MUTUAL_DEFECTION_PAYOFF),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVES: [Move; 2] = [Move::Cooperate, Move::Defect];

    #[test]
    fn test_payoff_matrix() {
        assert_eq!(payoff(Move::Cooperate, Move::Cooperate), (3, 3));
        assert_eq!(payoff(Move::Cooperate, Move::Defect), (0, 5));
        assert_eq!(payoff(Move::Defect, Move::Cooperate), (5, 0));
        assert_eq!(payoff(Move::Defect, Move::Defect), (1, 1));
    }

    #[test]
    fn test_payoff_symmetry() {
        for a in MOVES {
            for b in MOVES {
                let (x, y) = payoff(a, b);
                assert_eq!(payoff(b, a), (y, x));
                assert!(x + y <= 10);
            }
        }
    }
}
