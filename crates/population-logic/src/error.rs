//! Engine error codes

/// Errors raised by the population tournament engine.
///
/// Every fallible operation returns these synchronously to its caller.
/// The engine never retries or swallows them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Population size, proportion, strategy list or game counts are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A strategy id is not present in the registry.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// A strategy id was registered twice.
    #[error("strategy already registered: {0}")]
    DuplicateStrategy(String),

    /// A pairing referenced agents that do not exist (or the same agent twice).
    #[error("invalid pairing: {agent1} vs {agent2}")]
    InvalidPairing {
        agent1: u32,
        agent2: u32,
    },

    /// `run_game` was called before `initialize`.
    #[error("simulation has not been initialized")]
    NotInitialized,
}

impl EngineError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        EngineError::InvalidConfiguration(message.into())
    }
}

/// Result alias used across the engine
pub type Result<T> = core::result::Result<T, EngineError>;
