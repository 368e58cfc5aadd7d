//! Error taxonomy for rule violations, malformed input, and engine failures.
//!
//! Every rejection is returned before the single mutation point, so a caller
//! receiving any of these errors can rely on the session being unchanged.

use thiserror::Error;

use crate::state::{Actor, TurnState};

/// Malformed input detected before any rule is evaluated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("judgement reach must be non-negative (got {0})")]
    NegativeReach(i64),
    #[error("action content must not be empty")]
    EmptyContent,
    #[error("platform '{0}' is not part of this session")]
    UnknownPlatform(String),
    #[error("actor '{0}' is not recognized")]
    UnknownActor(String),
}

/// A request refused by the turn rules. No state was mutated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("{actor} acted out of turn (session is {state})")]
    OutOfTurn { actor: Actor, state: TurnState },
    #[error("{actor} already acted in round {round}")]
    DuplicateAction { round: u32, actor: Actor },
    #[error("round {round} is already closed")]
    RoundClosed { round: u32 },
    #[error("action was already resolved")]
    AlreadyResolved,
    #[error("session has ended")]
    SessionEnded,
    #[error("round {round} is still open")]
    RoundStillOpen { round: u32 },
    #[error("reaction '{reaction}' is not valid for {actor}")]
    InvalidReaction { actor: Actor, reaction: String },
    #[error("tool '{0}' is not in the catalog")]
    UnknownTool(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised when session configuration invariants are violated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be between 0 and 100 (got {value})")]
    ScoreOutOfRange { field: &'static str, value: u8 },
    #[error("amplify ratio must be greater than 1.0 (got {0:.2})")]
    AmplifyRatio(f32),
    #[error("round limit must be at least 1")]
    RoundLimit,
    #[error("collapse threshold {collapse} must be below dominance threshold {dominance}")]
    ThresholdOrder { collapse: u8, dominance: u8 },
    #[error("platform name must not be empty")]
    EmptyPlatformName,
    #[error("platform '{0}' is listed more than once")]
    DuplicatePlatform(String),
    #[error("catalog lists tool '{0}' more than once")]
    DuplicateTool(String),
    #[error("catalog could not be parsed: {0}")]
    Catalog(String),
}

/// Failure surfaced by the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("session '{0}' was not found")]
    SessionNotFound(String),
    #[error("{stage} collaborator failed")]
    Collaborator {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl EngineError {
    pub(crate) fn collaborator(stage: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Collaborator {
            stage,
            source: source.into(),
        }
    }

    /// The rule violation behind this error, if any.
    #[must_use]
    pub const fn rule(&self) -> Option<&RuleError> {
        match self {
            Self::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(value: ValidationError) -> Self {
        Self::Rule(RuleError::Validation(value))
    }
}
