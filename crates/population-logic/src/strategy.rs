//! Strategy definitions and the strategy registry

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::random::RandomSource;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    /// The other move
    pub fn flipped(self) -> Self {
        match self {
            Move::Cooperate => Move::Defect,
            Move::Defect => Move::Cooperate,
        }
    }
}

/// One past game from the owning agent's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub own: Move,
    pub opponent: Move,
}

impl Exchange {
    pub fn new(own: Move, opponent: Move) -> Self {
        Self { own, opponent }
    }
}

/// Decision rule: history against one opponent (oldest first) to the next move.
///
/// A plain function pointer, so a rule cannot capture shared mutable state.
pub type DecisionFn = fn(&[Exchange], &mut dyn RandomSource) -> Move;

/// A registered strategy
#[derive(Clone)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub description: String,
    decide: DecisionFn,
}

impl Strategy {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        decide: DecisionFn,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            decide,
        }
    }

    /// Evaluate the strategy for the next game against one opponent
    pub fn decide(&self, history: &[Exchange], rng: &mut dyn RandomSource) -> Move {
        (self.decide)(history, rng)
    }

    /// Serializable metadata (no decision function)
    pub fn info(&self) -> StrategyInfo {
        StrategyInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Descriptive metadata for a strategy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Strategy id → strategy lookup
///
/// Strategies are immutable once registered; ids keep registration order.
#[derive(Clone, Debug, Default)]
pub struct StrategyRegistry {
    strategies: Vec<Strategy>,
}

impl StrategyRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with every built-in strategy
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (id, name, description, decide) in BUILTINS {
            registry.strategies.push(Strategy::new(*id, *name, *description, *decide));
        }
        registry
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        decide: DecisionFn,
    ) -> Result<()> {
        let id = id.into();
        if self.contains(&id) {
            return Err(EngineError::DuplicateStrategy(id));
        }
        self.strategies.push(Strategy::new(id, name, description, decide));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Strategy> {
        self.strategies
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| EngineError::UnknownStrategy(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.strategies.iter().any(|s| s.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(|s| s.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

// ──────────────────────────── Built-in strategies ────────────────────────────

const BUILTINS: &[(&str, &str, &str, DecisionFn)] = &[
    (
        "always-cooperate",
        "Always Cooperate",
        "Always cooperates regardless of what the opponent does.",
        always_cooperate,
    ),
    (
        "always-defect",
        "Always Defect",
        "Always defects regardless of what the opponent does.",
        always_defect,
    ),
    (
        "tit-for-tat",
        "Tit for Tat",
        "Starts by cooperating, then mimics the opponent's previous move.",
        tit_for_tat,
    ),
    (
        "random",
        "Random",
        "Randomly chooses to cooperate or defect.",
        random,
    ),
    (
        "grudger",
        "Grudger",
        "Cooperates until the opponent defects once, then defects forever.",
        grudger,
    ),
    (
        "detective",
        "Detective",
        "Opens with Cooperate, Defect, Cooperate, Cooperate. If the opponent ever \
         retaliated it plays Tit for Tat, otherwise it defects forever.",
        detective,
    ),
    (
        "pavlov",
        "Pavlov",
        "Repeats its last move after a good outcome, switches after a bad one.",
        pavlov,
    ),
    (
        "suspicious-tit-for-tat",
        "Suspicious Tit for Tat",
        "Like Tit for Tat, but starts with defect.",
        suspicious_tit_for_tat,
    ),
    (
        "tit-for-two-tats",
        "Tit for Two Tats",
        "Only retaliates after two consecutive defections.",
        tit_for_two_tats,
    ),
    (
        "gradual",
        "Gradual",
        "Retaliates with increasing severity, then forgives.",
        gradual,
    ),
];

/// Detective's scripted opening
const DETECTIVE_OPENER: [Move; 4] = [Move::Cooperate, Move::Defect, Move::Cooperate, Move::Cooperate];

fn opponent_defections(history: &[Exchange]) -> usize {
    history.iter().filter(|e| e.opponent == Move::Defect).count()
}

fn always_cooperate(_history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    Move::Cooperate
}

fn always_defect(_history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    Move::Defect
}

/// Tit-for-Tat: Copy opponent's last move, start with cooperate
fn tit_for_tat(history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    history.last().map_or(Move::Cooperate, |e| e.opponent)
}

/// Random: fair coin from the injected source
fn random(_history: &[Exchange], rng: &mut dyn RandomSource) -> Move {
    if rng.next_percent() < 50 {
        Move::Cooperate
    } else {
        Move::Defect
    }
}

/// Grudger: Cooperate until opponent defects, then always defect
fn grudger(history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    if opponent_defections(history) > 0 {
        Move::Defect
    } else {
        Move::Cooperate
    }
}

fn detective(history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    if let Some(scripted) = DETECTIVE_OPENER.get(history.len()) {
        return *scripted;
    }

    let opener = &history[..DETECTIVE_OPENER.len()];
    if opponent_defections(opener) > 0 {
        history.last().map_or(Move::Cooperate, |e| e.opponent)
    } else {
        Move::Defect
    }
}

/// Pavlov: Win-stay, lose-switch
/// - If last game was good (3+ points), repeat move
/// - If last game was bad (<3 points), switch move
fn pavlov(history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    let Some(last) = history.last() else {
        return Move::Cooperate;
    };

    let (my_score, _) = crate::payoff(last.own, last.opponent);
    if my_score >= crate::MUTUAL_COOPERATION_PAYOFF {
        last.own
    } else {
        last.own.flipped()
    }
}

/// Suspicious Tit-for-Tat: TFT but start with defect
fn suspicious_tit_for_tat(history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    history.last().map_or(Move::Defect, |e| e.opponent)
}

/// Tit-for-Two-Tats: Only defect if opponent defected twice in a row
fn tit_for_two_tats(history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    if history.len() < 2 {
        return Move::Cooperate;
    }

    let last_two = &history[history.len() - 2..];
    if last_two.iter().all(|e| e.opponent == Move::Defect) {
        Move::Defect
    } else {
        Move::Cooperate
    }
}

/// Gradual: Escalating retaliation
/// After N opponent defections, player should have made N(N+1)/2 total defections
fn gradual(history: &[Exchange], _rng: &mut dyn RandomSource) -> Move {
    let their_defections = opponent_defections(history);
    let my_defections = history.iter().filter(|e| e.own == Move::Defect).count();

    let expected = their_defections * (their_defections + 1) / 2;

    if my_defections < expected {
        Move::Defect
    } else {
        Move::Cooperate
    }
}
