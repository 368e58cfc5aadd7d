//! Actions, tool usages, and resolved action records.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{RuleError, ValidationError};
use crate::state::{Actor, Effectiveness, PlatformState, ReactionMode, StateDelta};

/// Inline capacity for tools attached to one action.
pub type ToolUsageList = SmallVec<[ToolUsage; 4]>;

/// What happened to a tool when its action resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Not yet resolved.
    Pending,
    /// First use by this actor: base effect applied.
    Applied,
    /// Already applied earlier in the session: recorded, zero effect.
    Repeat,
    /// Not in the catalog: recorded, zero effect.
    Unknown,
    /// Catalogued for the other actor: recorded, zero effect.
    Ineligible,
    /// Not yet unlocked this round: recorded, zero effect.
    Locked,
}

/// One tool attached to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUsage {
    pub tool_name: String,
    pub trust_effect: i64,
    pub spread_effect: i64,
    pub outcome: ToolOutcome,
}

impl ToolUsage {
    #[must_use]
    pub fn pending(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            trust_effect: 0,
            spread_effect: 0,
            outcome: ToolOutcome::Pending,
        }
    }

    /// Whether the base effect was applied by this usage.
    #[must_use]
    pub const fn applied(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Applied)
    }
}

/// Outcome assigned to an action by the external judgement provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    /// Audience reached. Signed so malformed input can be rejected.
    pub reach: i64,
    pub raw_trust_delta: i64,
    pub raw_spread_delta: i64,
    pub effectiveness: Effectiveness,
    #[serde(default)]
    pub simulated_comments: Vec<String>,
}

impl Judgement {
    #[must_use]
    pub const fn new(
        reach: i64,
        raw_trust_delta: i64,
        raw_spread_delta: i64,
        effectiveness: Effectiveness,
    ) -> Self {
        Self {
            reach,
            raw_trust_delta,
            raw_spread_delta,
            effectiveness,
            simulated_comments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.simulated_comments = comments;
        self
    }

    /// Reject malformed judgements.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeReach`] when reach is below zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reach < 0 {
            return Err(ValidationError::NegativeReach(self.reach));
        }
        Ok(())
    }
}

/// Bounded outcome written back onto an action. Write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub reach: u64,
    /// Combined trust/spread change before clamping.
    pub delta: StateDelta,
    pub effectiveness: Effectiveness,
    pub tools: ToolUsageList,
}

impl Resolution {
    /// Trust change attributed to the acting party.
    #[must_use]
    pub const fn trust_change(&self, actor: Actor) -> i64 {
        self.delta.trust_of(actor)
    }

    #[must_use]
    pub const fn spread_change(&self) -> i64 {
        self.delta.spread
    }
}

/// One actor's move within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub round: u32,
    pub actor: Actor,
    pub platform: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    pub reaction: ReactionMode,
    #[serde(default)]
    pub tools: ToolUsageList,
    #[serde(default)]
    resolution: Option<Resolution>,
}

impl Action {
    /// Build an unresolved action, checking the reaction mode and content.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidReaction`] when the mode does not suit the
    /// actor and [`ValidationError::EmptyContent`] for blank content.
    pub fn new(
        round: u32,
        actor: Actor,
        platform: impl Into<String>,
        content: impl Into<String>,
        reaction: ReactionMode,
    ) -> Result<Self, RuleError> {
        if !reaction.allowed_for(actor) {
            return Err(RuleError::InvalidReaction {
                actor,
                reaction: reaction.to_string(),
            });
        }
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        Ok(Self {
            round,
            actor,
            platform: platform.into(),
            title: String::new(),
            content,
            reaction,
            tools: ToolUsageList::new(),
            resolution: None,
        })
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attach a tool; resolution decides its effect.
    pub fn push_tool(&mut self, tool_name: impl Into<String>) {
        self.tools.push(ToolUsage::pending(tool_name));
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    #[must_use]
    pub const fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Record the resolution. Write-once.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::AlreadyResolved`] if a resolution is present.
    pub fn attach(&mut self, resolution: Resolution) -> Result<(), RuleError> {
        if self.resolution.is_some() {
            return Err(RuleError::AlreadyResolved);
        }
        self.tools = resolution.tools.clone();
        self.resolution = Some(resolution);
        Ok(())
    }
}

/// A resolved action as stored in session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,
    pub reach: u64,
    pub trust_change: StateDelta,
    pub spread_change: i64,
    pub effectiveness: Effectiveness,
    pub simulated_comments: Vec<String>,
    /// Platform snapshot produced by this action.
    pub state_after: PlatformState,
}

impl ActionRecord {
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.action.actor
    }

    #[must_use]
    pub const fn round(&self) -> u32 {
        self.action.round
    }
}

/// Result handed back to the caller after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub record: ActionRecord,
    pub turn_state: crate::state::TurnState,
    pub round: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_rejects_mismatched_reaction_and_blank_content() {
        assert!(matches!(
            Action::new(1, Actor::Ai, "Facebook", "text", ReactionMode::Amplify),
            Err(RuleError::InvalidReaction { .. })
        ));
        assert_eq!(
            Action::new(1, Actor::Player, "Facebook", "  ", ReactionMode::Clarify),
            Err(RuleError::Validation(ValidationError::EmptyContent))
        );
    }

    #[test]
    fn attach_is_write_once() {
        let mut action =
            Action::new(1, Actor::Ai, "Facebook", "claim", ReactionMode::Publish).unwrap();
        let resolution = Resolution {
            reach: 10,
            delta: StateDelta::for_actor(Actor::Ai, 3, 4),
            effectiveness: Effectiveness::Low,
            tools: ToolUsageList::new(),
        };
        action.attach(resolution.clone()).unwrap();
        assert!(action.is_resolved());
        assert_eq!(action.attach(resolution), Err(RuleError::AlreadyResolved));
        assert_eq!(action.resolution().unwrap().trust_change(Actor::Ai), 3);
    }

    #[test]
    fn judgement_validation_rejects_negative_reach() {
        let judgement = Judgement::new(-1, 0, 0, Effectiveness::Low);
        assert_eq!(
            judgement.validate(),
            Err(ValidationError::NegativeReach(-1))
        );
        assert!(Judgement::new(0, 0, 0, Effectiveness::High).validate().is_ok());
    }
}
