//! Deterministic pairing schedule for population tournaments
//!
//! Every unordered pair of agents appears exactly once per pass. The pass
//! order is fixed when the schedule is built: either plain rank order or a
//! seeded Feistel-network permutation of the ranks. Once the last pairing is
//! exhausted the scheduler wraps to the first one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::AgentPool;
use crate::error::{EngineError, Result};
use crate::random::{RandomSource, SeededRng};

/// RNG stream reserved for schedule shuffling
const SCHEDULE_STREAM: u32 = u32::MAX;

/// How the pairs of one pass are ordered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingOrder {
    /// Seeded permutation, reproducible per seed
    #[default]
    Shuffled,
    /// Colexicographic rank order: (0,1), (0,2), (1,2), (0,3), ...
    Sequential,
}

/// A scheduled matchup and its in-progress game counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    /// Position in the schedule
    pub index: usize,
    pub agent1_index: u32,
    pub agent2_index: u32,
    pub games_played: u32,
}

impl Pairing {
    fn new(index: usize, (a, b): (u32, u32)) -> Self {
        Self {
            index,
            agent1_index: a,
            agent2_index: b,
            games_played: 0,
        }
    }

    pub fn is_exhausted(&self, games_per_pairing: u32) -> bool {
        self.games_played >= games_per_pairing
    }
}

/// Progress of the active pairing, as shown to presentation layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingProgress {
    pub index: usize,
    pub agent1_index: u32,
    pub agent2_index: u32,
    pub games_played: u32,
    pub total_games: u32,
}

/// What `advance_game` did to the schedule cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Same pairing plays again
    Continued,
    /// Moved on to the next pairing
    NextPairing,
    /// Last pairing finished; restarted from the first
    Wrapped,
}

/// Steps through the schedule one game at a time
#[derive(Clone, Debug)]
pub struct PairingScheduler {
    pairings: Vec<Pairing>,
    games_per_pairing: u32,
    position: usize,
    passes_completed: u32,
    /// Pairing that received the most recent game, as it stood afterwards
    last_played: Option<PairingProgress>,
}

impl PairingScheduler {
    pub fn new(pairs: Vec<(u32, u32)>, games_per_pairing: u32) -> Result<Self> {
        if games_per_pairing == 0 {
            return Err(EngineError::config("gamesPerPairing must be at least 1"));
        }
        if pairs.is_empty() {
            return Err(EngineError::config("pairing schedule is empty"));
        }

        let pairings = pairs
            .into_iter()
            .enumerate()
            .map(|(index, pair)| Pairing::new(index, pair))
            .collect();

        Ok(Self {
            pairings,
            games_per_pairing,
            position: 0,
            passes_completed: 0,
            last_played: None,
        })
    }

    pub fn current_pairing(&self) -> &Pairing {
        &self.pairings[self.position]
    }

    /// Progress of the pairing the next game will use
    pub fn current_progress(&self) -> PairingProgress {
        self.progress_of(self.current_pairing())
    }

    /// Progress of the pairing that played the latest game
    ///
    /// Unlike `current_progress`, this does not move on once a pairing is
    /// exhausted, so it still describes the final game after a run ends.
    pub fn last_played(&self) -> Option<PairingProgress> {
        self.last_played
    }

    fn progress_of(&self, pairing: &Pairing) -> PairingProgress {
        PairingProgress {
            index: pairing.index,
            agent1_index: pairing.agent1_index,
            agent2_index: pairing.agent2_index,
            games_played: pairing.games_played,
            total_games: self.games_per_pairing,
        }
    }

    /// Count one game for the active pairing, moving on once it is exhausted
    pub fn advance_game(&mut self) -> Advance {
        let games_per_pairing = self.games_per_pairing;
        let current = &mut self.pairings[self.position];
        current.games_played += 1;
        let exhausted = current.is_exhausted(games_per_pairing);
        self.last_played = Some(self.current_progress());

        if !exhausted {
            return Advance::Continued;
        }

        self.position += 1;
        let advance = if self.position == self.pairings.len() {
            self.position = 0;
            self.passes_completed += 1;
            debug!(passes = self.passes_completed, "Pairing schedule wrapped");
            Advance::Wrapped
        } else {
            Advance::NextPairing
        };

        self.pairings[self.position].games_played = 0;
        advance
    }

    pub fn len(&self) -> usize {
        self.pairings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn passes_completed(&self) -> u32 {
        self.passes_completed
    }

    pub fn games_per_pairing(&self) -> u32 {
        self.games_per_pairing
    }

    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }
}

/// Number of unordered pairs for a population: C(n, 2)
pub fn pairing_count(population_size: u32) -> u64 {
    let n = population_size as u64;
    if n < 2 {
        return 0;
    }
    n * (n - 1) / 2
}

/// Enumerate all unordered agent-index pairs once, in the requested order
///
/// Every returned pair is `(a, b)` with `a < b`.
pub fn generate_schedule(population_size: u32, order: PairingOrder, seed: u64) -> Vec<(u32, u32)> {
    let total = pairing_count(population_size) as u32;
    if total == 0 {
        return Vec::new();
    }

    match order {
        PairingOrder::Sequential => (0..total).map(unrank_pair).collect(),
        PairingOrder::Shuffled => {
            let round_keys = derive_feistel_keys(seed);
            (0..total)
                .filter_map(|i| feistel_permute(i, total, &round_keys))
                .map(unrank_pair)
                .collect()
        }
    }
}

/// Stable partition: pairs whose agents hold different strategies go first
pub fn cross_population_first(pairs: Vec<(u32, u32)>, pool: &AgentPool) -> Vec<(u32, u32)> {
    let (mut cross, same): (Vec<_>, Vec<_>) = pairs
        .into_iter()
        .partition(|&(a, b)| pool.strategy_of(a) != pool.strategy_of(b));
    cross.extend(same);
    cross
}

// ──────────────────────────── Internal helpers ────────────────────────────

/// Integer ceiling square root
fn isqrt_ceil(n: u32) -> u32 {
    if n <= 1 {
        return n;
    }
    // Newton's method for floor(sqrt(n))
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    if (x as u64) * (x as u64) == n as u64 {
        x
    } else {
        x + 1
    }
}

/// Feistel round function: mixes `input` with `key`, result in [0, modulus).
fn feistel_round_fn(input: u32, key: u64, modulus: u32) -> u32 {
    (((input as u64).wrapping_mul(key | 1).wrapping_add(key >> 32)) >> 16) as u32 % modulus
}

/// Derive 6 Feistel round keys from the run seed
fn derive_feistel_keys(seed: u64) -> [u64; 6] {
    let mut rng = SeededRng::new(seed, SCHEDULE_STREAM);
    let mut keys = [0u64; 6];
    for k in &mut keys {
        *k = rng.next_u64();
    }
    keys
}

/// Bijective permutation on [0, domain_size) via a Feistel network with cycle-walking.
fn feistel_permute(idx: u32, domain_size: u32, round_keys: &[u64; 6]) -> Option<u32> {
    if domain_size <= 1 {
        return Some(0);
    }
    let half = isqrt_ceil(domain_size);

    let mut val = idx;
    for _ in 0..1000 {
        let mut left = val / half;
        let mut right = val % half;

        for (i, &key) in round_keys.iter().enumerate() {
            if i % 2 == 0 {
                right = (right + feistel_round_fn(left, key, half)) % half;
            } else {
                left = (left + feistel_round_fn(right, key, half)) % half;
            }
        }

        val = left * half + right;
        if val < domain_size {
            return Some(val);
        }
    }
    None
}

/// Colexicographic combination unranking: rank → (a, b) with a < b.
///
/// rank = C(b,2) + a = b*(b−1)/2 + a
fn unrank_pair(rank: u32) -> (u32, u32) {
    // Estimate b via integer floor(sqrt(1 + 8·rank))
    let val = 1u64 + 8 * rank as u64;
    let mut s = val;
    let mut t = (s + 1) / 2;
    while t < s {
        s = t;
        t = (s + val / s) / 2;
    }
    let mut b = ((1 + s) / 2) as u32;

    while b > 0 && b * (b - 1) / 2 > rank {
        b -= 1;
    }
    while (b + 1) * b / 2 <= rank {
        b += 1;
    }

    let a = rank - b * (b - 1) / 2;
    (a, b)
}
