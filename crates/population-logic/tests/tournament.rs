//! End-to-end tournament properties through the public API

use std::cell::RefCell;
use std::rc::Rc;

use population_logic::{
    GameResult, Move, PairingOrder, PopulationSimulation, SimulationConfig, SimulationObserver,
    StatisticsSnapshot,
};
use proptest::prelude::*;

/// Collects every GameResult handed to the observer
#[derive(Clone, Default)]
struct GameLog(Rc<RefCell<Vec<GameResult>>>);

impl SimulationObserver for GameLog {
    fn on_game_complete(&mut self, result: &GameResult) {
        self.0.borrow_mut().push(*result);
    }
}

#[derive(Clone, Default)]
struct CompletionLog(Rc<RefCell<Vec<StatisticsSnapshot>>>);

impl SimulationObserver for CompletionLog {
    fn on_simulation_complete(&mut self, snapshot: &StatisticsSnapshot) {
        self.0.borrow_mut().push(snapshot.clone());
    }
}

fn simulation(config: SimulationConfig) -> PopulationSimulation {
    let mut sim = PopulationSimulation::new(config);
    sim.initialize().unwrap();
    sim
}

fn cooperators_against_defectors(total_games: u32) -> PopulationSimulation {
    simulation(SimulationConfig {
        proportion: 0.5,
        population_size: 10,
        total_games,
        games_per_pairing: 1,
        ..SimulationConfig::new("always-cooperate", "always-defect")
    })
}

fn assert_only_exploitation(results: &[GameResult]) {
    for result in results {
        let payoffs = (result.payoff1, result.payoff2);
        assert!(payoffs == (0, 5) || payoffs == (5, 0), "{:?}", result);
    }
}

#[test]
fn five_games_between_cooperators_and_defectors() {
    let mut sim = cooperators_against_defectors(5);
    assert_eq!(sim.scheduler().unwrap().len(), 45);

    let mut results = Vec::new();
    for i in 0..5 {
        assert!(!sim.is_complete(), "complete after {} games", i);
        results.push(sim.run_game().unwrap().unwrap());
    }

    // Reaching totalGames ends the run even though 40 pairings never played
    let stats = sim.get_statistics();
    assert_eq!(stats.games_played, 5);
    assert!(stats.is_complete);
    assert!(sim.is_complete());
    assert_eq!(sim.scheduler().unwrap().passes_completed(), 0);
    assert_only_exploitation(&results);
}

#[test]
fn five_games_into_a_longer_run_stay_incomplete() {
    let mut sim = cooperators_against_defectors(45);

    let results: Vec<_> = (0..5).map(|_| sim.run_game().unwrap().unwrap()).collect();

    let stats = sim.get_statistics();
    assert_eq!(stats.games_played, 5);
    assert!(!stats.is_complete);
    assert_eq!(stats.current_pairing.unwrap().index, 5);
    assert_only_exploitation(&results);
}

#[test]
fn two_agents_play_their_only_pairing_three_times() {
    let log = GameLog::default();
    let mut sim = PopulationSimulation::new(SimulationConfig {
        population_size: 2,
        total_games: 3,
        games_per_pairing: 3,
        ..SimulationConfig::new("tit-for-tat", "always-defect")
    });
    sim.add_observer(Box::new(log.clone()));
    sim.initialize().unwrap();
    assert_eq!(sim.scheduler().unwrap().len(), 1);

    for i in 0..3 {
        assert!(!sim.is_complete(), "complete after {} games", i);
        sim.run_game().unwrap();
    }
    assert!(sim.is_complete());

    let games = log.0.borrow();
    assert_eq!(games.len(), 3);
    assert!(games.iter().all(|g| (g.agent1_id, g.agent2_id) == (0, 1)));

    let stats = sim.get_statistics();
    assert_eq!(stats.strategy_stats["tit-for-tat"].count, 1);
    assert_eq!(stats.strategy_stats["always-defect"].count, 1);
    // The finished run still points at the pairing of its final game
    let last = stats.current_pairing.unwrap();
    assert_eq!((last.games_played, last.total_games), (3, 3));
}

#[test]
fn tit_for_tat_retaliates_only_against_the_defector() {
    let log = GameLog::default();
    let mut sim = PopulationSimulation::new(SimulationConfig {
        population_size: 2,
        total_games: 10,
        games_per_pairing: 10,
        ..SimulationConfig::new("tit-for-tat", "always-defect")
    });
    sim.add_observer(Box::new(log.clone()));
    sim.initialize().unwrap();
    sim.run_to_completion().unwrap();

    let games = log.0.borrow();
    assert_eq!(games[0].move1, Move::Cooperate);
    assert!(games[1..].iter().all(|g| g.move1 == Move::Defect));
}

#[test]
fn statistics_are_idempotent_between_games() {
    let mut sim = simulation(SimulationConfig {
        population_size: 8,
        total_games: 30,
        seed: 3,
        ..SimulationConfig::new("random", "pavlov")
    });
    sim.run_game().unwrap();
    sim.run_game().unwrap();

    assert_eq!(sim.get_statistics(), sim.get_statistics());
}

#[test]
fn snapshots_do_not_alias_engine_state() {
    let mut sim = simulation(SimulationConfig {
        population_size: 4,
        total_games: 10,
        ..SimulationConfig::new("always-cooperate", "always-defect")
    });
    let before = sim.get_statistics();
    sim.run_game().unwrap();

    assert_eq!(before.games_played, 0);
    assert_eq!(before.outcomes.total_payoff, 0);
    assert_ne!(before, sim.get_statistics());
}

#[test]
fn stop_marks_the_run_complete() {
    let completions = CompletionLog::default();
    let mut sim = PopulationSimulation::new(SimulationConfig {
        population_size: 6,
        total_games: 50,
        ..SimulationConfig::new("grudger", "detective")
    });
    sim.add_observer(Box::new(completions.clone()));
    sim.initialize().unwrap();

    for _ in 0..4 {
        sim.run_game().unwrap();
    }
    sim.stop();
    assert!(sim.run_game().unwrap().is_none());

    let finals = completions.0.borrow();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].games_played, 4);
    assert!(finals[0].is_complete);
}

#[test]
fn games_cycle_through_the_schedule_past_one_pass() {
    let log = GameLog::default();
    let mut sim = PopulationSimulation::new(SimulationConfig {
        population_size: 4,
        total_games: 15,
        games_per_pairing: 1,
        pairing_order: PairingOrder::Sequential,
        ..SimulationConfig::new("tit-for-tat", "always-defect")
    });
    sim.add_observer(Box::new(log.clone()));
    sim.initialize().unwrap();
    sim.run_to_completion().unwrap();

    let games = log.0.borrow();
    // 6 pairings: games 6..12 repeat games 0..6 in the same order
    for i in 0..6 {
        assert_eq!(games[i].pairing_index, games[i + 6].pairing_index);
        assert_eq!(games[i].agent1_id, games[i + 6].agent1_id);
        assert_eq!(games[i].agent2_id, games[i + 6].agent2_id);
    }
    assert_eq!(sim.scheduler().unwrap().passes_completed(), 2);
}

fn strategy_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    let ids = [
        "always-cooperate",
        "always-defect",
        "tit-for-tat",
        "random",
        "grudger",
        "detective",
        "pavlov",
    ];
    (0..ids.len(), 0..ids.len() - 1).prop_map(move |(a, b)| {
        let b = if b >= a { b + 1 } else { b };
        (ids[a], ids[b])
    })
}

fn config_strategy() -> impl Strategy<Value = SimulationConfig> {
    (
        strategy_pair(),
        0.0f64..=1.0,
        2u32..16,
        1u32..120,
        1u32..5,
        any::<u64>(),
        prop_oneof![Just(PairingOrder::Shuffled), Just(PairingOrder::Sequential)],
    )
        .prop_map(|((a, b), proportion, population_size, total_games, games_per_pairing, seed, order)| {
            SimulationConfig {
                proportion,
                population_size,
                total_games,
                games_per_pairing,
                seed,
                pairing_order: order,
                ..SimulationConfig::new(a, b)
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scores_equal_payoffs_handed_out(config in config_strategy()) {
        let log = GameLog::default();
        let mut sim = PopulationSimulation::new(config.clone());
        sim.add_observer(Box::new(log.clone()));
        sim.initialize().unwrap();
        let stats = sim.run_to_completion().unwrap();

        let handed_out: u64 = log.0.borrow().iter().map(|g| g.total_payoff() as u64).sum();
        let pool = sim.pool().unwrap();
        prop_assert_eq!(pool.total_score(), handed_out);
        prop_assert_eq!(stats.outcomes.total_payoff, handed_out);

        let summed: u64 = stats.strategy_stats.values().map(|s| s.total_score).sum();
        prop_assert_eq!(summed, handed_out);
        prop_assert_eq!(stats.population(), config.population_size);
        prop_assert_eq!(stats.games_played, config.total_games);
        prop_assert!(stats.is_complete);
    }

    #[test]
    fn games_played_is_monotonic_and_bounded(config in config_strategy()) {
        let mut sim = PopulationSimulation::new(config.clone());
        sim.initialize().unwrap();

        let mut last = 0;
        for _ in 0..config.total_games + 5 {
            sim.run_game().unwrap();
            let played = sim.get_statistics().games_played;
            prop_assert!(played >= last);
            prop_assert!(played <= config.total_games);
            last = played;
        }
        prop_assert_eq!(last, config.total_games);
    }

    #[test]
    fn fresh_initialize_replays_identical_games(config in config_strategy()) {
        let run = |config: &SimulationConfig| {
            let log = GameLog::default();
            let mut sim = PopulationSimulation::new(config.clone());
            sim.add_observer(Box::new(log.clone()));
            sim.initialize().unwrap();
            sim.run_to_completion().unwrap();
            let games = log.0.borrow().clone();
            games
        };

        prop_assert_eq!(run(&config), run(&config));
    }

    #[test]
    fn strategy_counts_follow_proportion(config in config_strategy()) {
        let sim = simulation(config.clone());
        let stats = sim.get_statistics();
        let first = &config.strategies[0];
        let second = &config.strategies[1];

        let expected = (config.population_size as f64 * config.proportion).round() as u32;
        prop_assert_eq!(stats.strategy_stats[first].count, expected);
        prop_assert_eq!(
            stats.strategy_stats[first].count + stats.strategy_stats[second].count,
            config.population_size
        );
    }
}
