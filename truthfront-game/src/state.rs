//! Shared value types describing actors, platforms, rounds, and turn state.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::SCORE_MAX;
use crate::error::{RuleError, ValidationError};
use crate::news::News;

/// Identifier of one game instance.
pub type SessionId = String;

/// The two contestants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    /// Automated disinformation actor; always moves first in a round.
    Ai,
    /// Human fact-checker.
    Player,
}

impl Actor {
    pub const ALL: [Self; 2] = [Self::Ai, Self::Player];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Player => "player",
        }
    }

    /// Reaction mode an actor uses when none is given, if one is implied.
    #[must_use]
    pub const fn implied_reaction(self) -> Option<ReactionMode> {
        match self {
            Self::Ai => Some(ReactionMode::Publish),
            Self::Player => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Actor {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ai" | "agent" => Ok(Self::Ai),
            "player" => Ok(Self::Player),
            other => Err(ValidationError::UnknownActor(other.to_string())),
        }
    }
}

/// How an actor's move treats the contested topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionMode {
    /// The AI's only move: push content out.
    Publish,
    /// Player counters the claim with corrections.
    Clarify,
    /// Player declines to engage.
    Ignore,
    /// Player boosts the claim, which lends the AI credibility as well.
    Amplify,
}

impl ReactionMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Clarify => "clarify",
            Self::Ignore => "ignore",
            Self::Amplify => "amplify",
        }
    }

    /// Whether `actor` may use this mode.
    #[must_use]
    pub const fn allowed_for(self, actor: Actor) -> bool {
        match actor {
            Actor::Ai => matches!(self, Self::Publish),
            Actor::Player => !matches!(self, Self::Publish),
        }
    }

    /// Parse a mode for a specific actor.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidReaction`] for unknown modes or modes the
    /// actor may not use.
    pub fn parse_for(actor: Actor, raw: &str) -> Result<Self, RuleError> {
        let mode = raw.parse::<Self>().map_err(|()| RuleError::InvalidReaction {
            actor,
            reaction: raw.to_string(),
        })?;
        if mode.allowed_for(actor) {
            Ok(mode)
        } else {
            Err(RuleError::InvalidReaction {
                actor,
                reaction: raw.to_string(),
            })
        }
    }
}

impl fmt::Display for ReactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "publish" => Ok(Self::Publish),
            "clarify" => Ok(Self::Clarify),
            "ignore" => Ok(Self::Ignore),
            "amplify" => Ok(Self::Amplify),
            _ => Err(()),
        }
    }
}

/// Qualitative effectiveness label assigned by the judgement provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effectiveness {
    Low,
    Medium,
    High,
}

impl fmt::Display for Effectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A named channel with an audience descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub audience: String,
}

impl Platform {
    #[must_use]
    pub fn new(name: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            audience: audience.into(),
        }
    }
}

/// Immutable per-platform snapshot recorded after a round resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformState {
    /// Round the snapshot was produced in; 0 for the initial values.
    pub round: u32,
    pub player_trust: u8,
    pub ai_trust: u8,
    pub spread_rate: u8,
}

impl PlatformState {
    #[must_use]
    pub const fn initial(player_trust: u8, ai_trust: u8, spread_rate: u8) -> Self {
        Self {
            round: 0,
            player_trust,
            ai_trust,
            spread_rate,
        }
    }

    /// Trust held by the given actor.
    #[must_use]
    pub const fn trust_of(&self, actor: Actor) -> u8 {
        match actor {
            Actor::Ai => self.ai_trust,
            Actor::Player => self.player_trust,
        }
    }

    /// Whether every field lies within `[0, 100]`.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.player_trust <= SCORE_MAX
            && self.ai_trust <= SCORE_MAX
            && self.spread_rate <= SCORE_MAX
    }
}

/// Signed change to one platform, prior to clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDelta {
    pub player_trust: i64,
    pub ai_trust: i64,
    pub spread: i64,
}

impl StateDelta {
    /// Delta attributing `trust` to a single actor.
    #[must_use]
    pub const fn for_actor(actor: Actor, trust: i64, spread: i64) -> Self {
        match actor {
            Actor::Ai => Self {
                player_trust: 0,
                ai_trust: trust,
                spread,
            },
            Actor::Player => Self {
                player_trust: trust,
                ai_trust: 0,
                spread,
            },
        }
    }

    /// Trust change for the given actor.
    #[must_use]
    pub const fn trust_of(&self, actor: Actor) -> i64 {
        match actor {
            Actor::Ai => self.ai_trust,
            Actor::Player => self.player_trust,
        }
    }
}

/// Turn-order state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingAiAction,
    AwaitingPlayerAction,
    /// Both actors have acted; the next round has not been opened yet.
    Resolved,
    SessionComplete,
}

impl TurnState {
    /// Actor whose move is expected, if any.
    #[must_use]
    pub const fn expected_actor(self) -> Option<Actor> {
        match self {
            Self::AwaitingAiAction => Some(Actor::Ai),
            Self::AwaitingPlayerAction => Some(Actor::Player),
            Self::Resolved | Self::SessionComplete => None,
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AwaitingAiAction => "awaiting_ai_action",
            Self::AwaitingPlayerAction => "awaiting_player_action",
            Self::Resolved => "resolved",
            Self::SessionComplete => "session_complete",
        };
        f.write_str(label)
    }
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Ongoing,
    Completed,
    Aborted,
}

/// Why a session stopped accepting actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EndReason {
    RoundLimit { rounds: u32 },
    TrustCollapse { actor: Actor, platform: String },
    TrustDominance { actor: Actor, platform: String },
    Abandoned,
}

/// One complete exchange on a single news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub news: News,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_modes_are_actor_specific() {
        assert_eq!(
            ReactionMode::parse_for(Actor::Player, "Amplify"),
            Ok(ReactionMode::Amplify)
        );
        assert_eq!(
            ReactionMode::parse_for(Actor::Ai, "publish"),
            Ok(ReactionMode::Publish)
        );
        assert!(matches!(
            ReactionMode::parse_for(Actor::Ai, "clarify"),
            Err(RuleError::InvalidReaction { .. })
        ));
        assert!(matches!(
            ReactionMode::parse_for(Actor::Player, "publish"),
            Err(RuleError::InvalidReaction { .. })
        ));
        assert!(matches!(
            ReactionMode::parse_for(Actor::Player, "retweet"),
            Err(RuleError::InvalidReaction { .. })
        ));
    }

    #[test]
    fn actor_parsing_accepts_legacy_agent_label() {
        assert_eq!("AI".parse::<Actor>(), Ok(Actor::Ai));
        assert_eq!("agent".parse::<Actor>(), Ok(Actor::Ai));
        assert_eq!("player".parse::<Actor>(), Ok(Actor::Player));
        assert!("gm".parse::<Actor>().is_err());
    }

    #[test]
    fn deltas_attribute_to_one_actor() {
        let delta = StateDelta::for_actor(Actor::Ai, -10, 15);
        assert_eq!(delta.trust_of(Actor::Ai), -10);
        assert_eq!(delta.trust_of(Actor::Player), 0);
        assert_eq!(delta.spread, 15);
    }

    #[test]
    fn turn_state_names_expected_actor() {
        assert_eq!(
            TurnState::AwaitingAiAction.expected_actor(),
            Some(Actor::Ai)
        );
        assert_eq!(TurnState::Resolved.expected_actor(), None);
        let json = serde_json::to_string(&TurnState::AwaitingPlayerAction).unwrap();
        assert_eq!(json, "\"awaiting_player_action\"");
    }
}
