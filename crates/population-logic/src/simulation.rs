//! Simulation controller
//!
//! Owns one run end to end: configuration, agent pool, pairing schedule and
//! counters. Callers step it with [`PopulationSimulation::run_game`] and read
//! [`PopulationSimulation::get_statistics`] between steps.

use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::AgentPool;
use crate::error::{EngineError, Result};
use crate::game::{play_game, GameResult};
use crate::pairing::{cross_population_first, generate_schedule, PairingOrder, PairingScheduler};
use crate::random::SeededRng;
use crate::stats::{StatisticsAggregator, StatisticsSnapshot};
use crate::strategy::StrategyRegistry;

/// Largest population a run accepts
pub const MAX_POPULATION: u32 = 5000;

/// Run configuration
///
/// Deserializes from the presentation layer's camelCase JSON. `strategies`
/// may be a list of ids or an object whose keys are the ids (values ignored).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    #[serde(deserialize_with = "deserialize_strategy_ids")]
    pub strategies: Vec<String>,
    /// Share of the population assigned to the first strategy
    pub proportion: f64,
    pub population_size: u32,
    /// Global stop condition
    pub total_games: u32,
    /// Games per matchup before the scheduler advances
    pub games_per_pairing: u32,
    /// Drives schedule shuffling and randomized strategies
    pub seed: u64,
    pub pairing_order: PairingOrder,
    /// Emit a progress update every N games
    pub progress_interval: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
            proportion: 0.5,
            population_size: 20,
            total_games: 100,
            games_per_pairing: 1,
            seed: 0,
            pairing_order: PairingOrder::default(),
            progress_interval: 1,
        }
    }
}

impl SimulationConfig {
    /// Default configuration pitting two strategies against each other
    pub fn new(strategy_a: impl Into<String>, strategy_b: impl Into<String>) -> Self {
        Self {
            strategies: vec![strategy_a.into(), strategy_b.into()],
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        match self.strategies.as_slice() {
            [a, b] if a == b => {
                return Err(EngineError::config(format!(
                    "strategies must be two distinct ids, got {} twice",
                    a
                )));
            }
            [_, _] => {}
            other => {
                return Err(EngineError::config(format!(
                    "strategies must name exactly two strategies, got {}",
                    other.len()
                )));
            }
        }

        if self.population_size < 2 || self.population_size > MAX_POPULATION {
            return Err(EngineError::config(format!(
                "populationSize must be within [2, {}], got {}",
                MAX_POPULATION, self.population_size
            )));
        }
        if !self.proportion.is_finite() || !(0.0..=1.0).contains(&self.proportion) {
            return Err(EngineError::config(format!(
                "proportion must be within [0, 1], got {}",
                self.proportion
            )));
        }
        if self.total_games == 0 {
            return Err(EngineError::config("totalGames must be at least 1"));
        }
        if self.games_per_pairing == 0 {
            return Err(EngineError::config("gamesPerPairing must be at least 1"));
        }
        if self.progress_interval == 0 {
            return Err(EngineError::config("progressInterval must be at least 1"));
        }

        Ok(())
    }
}

fn deserialize_strategy_ids<'de, D>(deserializer: D) -> core::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StrategyIds;

    impl<'de> Visitor<'de> for StrategyIds {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of strategy ids or an object keyed by strategy id")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> core::result::Result<Self::Value, A::Error> {
            let mut ids = Vec::new();
            while let Some(id) = seq.next_element::<String>()? {
                ids.push(id);
            }
            Ok(ids)
        }

        // Keys keep document order, so the first key is the first strategy
        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> core::result::Result<Self::Value, A::Error> {
            let mut ids = Vec::new();
            while let Some((id, _)) = map.next_entry::<String, IgnoredAny>()? {
                ids.push(id);
            }
            Ok(ids)
        }

        fn visit_unit<E: de::Error>(self) -> core::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StrategyIds)
}

/// Lifecycle of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationState {
    Uninitialized,
    Ready,
    Running,
    Complete,
}

/// Receives run notifications; every method defaults to a no-op
///
/// `on_game_complete` fires exactly once per played game and
/// `on_simulation_complete` exactly once per run.
pub trait SimulationObserver {
    fn on_game_complete(&mut self, _result: &GameResult) {}

    fn on_progress_update(&mut self, _snapshot: &StatisticsSnapshot) {}

    fn on_simulation_complete(&mut self, _snapshot: &StatisticsSnapshot) {}
}

/// State built by `initialize`
#[derive(Clone, Debug)]
struct Run {
    pool: AgentPool,
    scheduler: PairingScheduler,
    /// (id, display name) of both configured strategies
    strategies: Vec<(String, String)>,
}

/// Step-driven population tournament
pub struct PopulationSimulation {
    config: SimulationConfig,
    registry: StrategyRegistry,
    state: SimulationState,
    run: Option<Run>,
    games_played: u32,
    aggregator: StatisticsAggregator,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl PopulationSimulation {
    /// New simulation using the built-in strategies
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_registry(config, StrategyRegistry::with_builtins())
    }

    pub fn with_registry(config: SimulationConfig, registry: StrategyRegistry) -> Self {
        Self {
            config,
            registry,
            state: SimulationState::Uninitialized,
            run: None,
            games_played: 0,
            aggregator: StatisticsAggregator::new(),
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    /// Build the agent pool and pairing schedule from the configuration
    ///
    /// Starts a fresh run from any state. On error the simulation is left
    /// uninitialized.
    pub fn initialize(&mut self) -> Result<()> {
        self.state = SimulationState::Uninitialized;
        self.run = None;
        self.games_played = 0;
        self.aggregator.reset();

        let config = &self.config;
        config.validate()?;

        let strategy_a = self.registry.get(&config.strategies[0])?;
        let strategy_b = self.registry.get(&config.strategies[1])?;

        let pool = AgentPool::build(
            config.population_size,
            &strategy_a.id,
            &strategy_b.id,
            config.proportion,
        )?;

        let pairs = generate_schedule(config.population_size, config.pairing_order, config.seed);
        let pairs = cross_population_first(pairs, &pool);
        let scheduler = PairingScheduler::new(pairs, config.games_per_pairing)?;

        info!(
            strategy_a = %strategy_a.id,
            strategy_b = %strategy_b.id,
            population = config.population_size,
            count_a = pool.count_of(&strategy_a.id),
            pairings = scheduler.len(),
            total_games = config.total_games,
            games_per_pairing = config.games_per_pairing,
            "Simulation initialized"
        );

        let strategies = vec![
            (strategy_a.id.clone(), strategy_a.name.clone()),
            (strategy_b.id.clone(), strategy_b.name.clone()),
        ];
        self.run = Some(Run {
            pool,
            scheduler,
            strategies,
        });
        self.state = SimulationState::Ready;
        Ok(())
    }

    /// Play exactly one game
    ///
    /// Returns `Ok(None)` once the run is complete.
    pub fn run_game(&mut self) -> Result<Option<GameResult>> {
        match self.state {
            SimulationState::Uninitialized => return Err(EngineError::NotInitialized),
            SimulationState::Complete => return Ok(None),
            SimulationState::Ready | SimulationState::Running => {}
        }

        let run = self.run.as_mut().ok_or(EngineError::NotInitialized)?;
        let pairing = *run.scheduler.current_pairing();
        let rng = SeededRng::new(self.config.seed, self.games_played);

        let result = play_game(&mut run.pool, &self.registry, &pairing, self.games_played, &rng)?;
        run.scheduler.advance_game();

        self.games_played += 1;
        self.aggregator.record(&result);
        self.state = SimulationState::Running;

        for observer in &mut self.observers {
            observer.on_game_complete(&result);
        }

        let reached_target = self.games_played >= self.config.total_games;
        if reached_target || self.games_played % self.config.progress_interval == 0 {
            let snapshot = self.get_statistics();
            for observer in &mut self.observers {
                observer.on_progress_update(&snapshot);
            }
        }

        if reached_target {
            self.finish();
        }

        Ok(Some(result))
    }

    /// Step until complete and return the final snapshot
    pub fn run_to_completion(&mut self) -> Result<StatisticsSnapshot> {
        while self.run_game()?.is_some() {}
        Ok(self.get_statistics())
    }

    /// Terminate the run early
    ///
    /// Returns `false` if there was no active run to stop.
    pub fn stop(&mut self) -> bool {
        match self.state {
            SimulationState::Ready | SimulationState::Running => {
                info!(games_played = self.games_played, "Stop requested");
                self.finish();
                true
            }
            SimulationState::Uninitialized | SimulationState::Complete => false,
        }
    }

    fn finish(&mut self) {
        self.state = SimulationState::Complete;
        let snapshot = self.get_statistics();

        info!(
            games_played = snapshot.games_played,
            total_games = snapshot.total_games,
            leader = snapshot.leader().unwrap_or("tie"),
            "Simulation complete"
        );

        for observer in &mut self.observers {
            observer.on_simulation_complete(&snapshot);
        }
    }

    /// Fresh snapshot of the latest committed game
    pub fn get_statistics(&self) -> StatisticsSnapshot {
        let is_complete = self.is_complete();
        match &self.run {
            Some(run) => self.aggregator.snapshot(
                &run.pool,
                Some(&run.scheduler),
                self.games_played,
                self.config.total_games,
                is_complete,
                &run.strategies,
            ),
            None => StatisticsSnapshot {
                total_games: self.config.total_games,
                is_complete,
                ..StatisticsSnapshot::default()
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == SimulationState::Complete
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn pool(&self) -> Option<&AgentPool> {
        self.run.as_ref().map(|r| &r.pool)
    }

    pub fn scheduler(&self) -> Option<&PairingScheduler> {
        self.run.as_ref().map(|r| &r.scheduler)
    }
}

impl fmt::Debug for PopulationSimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopulationSimulation")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("games_played", &self.games_played)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
