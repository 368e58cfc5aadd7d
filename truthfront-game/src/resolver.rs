//! Pure score resolution for a single action.
//!
//! The resolver combines tool base effects with the judgement's raw deltas,
//! attributes the result to the right trust fields, and returns a bounded
//! [`Resolution`]. It never touches session state; the caller appends the
//! resulting delta to the ledger and marks tools as applied.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::action::{Action, Judgement, Resolution, ToolOutcome, ToolUsage, ToolUsageList};
use crate::config::ScoringPolicy;
use crate::error::RuleError;
use crate::numbers::scale_by_ratio;
use crate::state::{Actor, ReactionMode, StateDelta};
use crate::tools::ToolEffectRegistry;

/// An (actor, tool) pair whose base effect has been spent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppliedTool {
    pub actor: Actor,
    pub tool: String,
}

/// Session-wide record of spent tool effects.
pub type AppliedTools = BTreeSet<AppliedTool>;

/// Read-only inputs the resolver needs beyond the action itself.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub registry: &'a ToolEffectRegistry,
    pub applied: &'a AppliedTools,
    pub policy: &'a ScoringPolicy,
}

/// Compute the bounded outcome of `action` under `judgement`.
///
/// # Errors
///
/// Returns [`RuleError::AlreadyResolved`] for resolved actions,
/// [`RuleError::InvalidReaction`] when the mode does not suit the actor, and
/// a validation error for malformed judgements.
pub fn resolve_action(
    action: &Action,
    judgement: &Judgement,
    ctx: ResolveContext<'_>,
) -> Result<Resolution, RuleError> {
    if action.is_resolved() {
        return Err(RuleError::AlreadyResolved);
    }
    if !action.reaction.allowed_for(action.actor) {
        return Err(RuleError::InvalidReaction {
            actor: action.actor,
            reaction: action.reaction.to_string(),
        });
    }
    judgement.validate()?;

    let (tools, tool_trust, tool_spread) = resolve_tools(action, ctx);
    let trust = tool_trust.saturating_add(judgement.raw_trust_delta);
    let spread = tool_spread.saturating_add(judgement.raw_spread_delta);
    let delta = attribute(action.actor, action.reaction, trust, spread, ctx.policy);
    let reach = u64::try_from(judgement.reach).unwrap_or_default();

    log::debug!(
        "resolved {} {} on {} round {}: trust {:+}/{:+} spread {:+}",
        action.actor,
        action.reaction,
        action.platform,
        action.round,
        delta.player_trust,
        delta.ai_trust,
        delta.spread
    );

    Ok(Resolution {
        reach,
        delta,
        effectiveness: judgement.effectiveness,
        tools,
    })
}

fn resolve_tools(action: &Action, ctx: ResolveContext<'_>) -> (ToolUsageList, i64, i64) {
    let mut seen_here: HashSet<&str> = HashSet::new();
    let mut trust = 0_i64;
    let mut spread = 0_i64;
    let mut resolved = ToolUsageList::new();

    for usage in &action.tools {
        let name = usage.tool_name.as_str();
        let effect = ctx.registry.effect_for(name);
        let key = AppliedTool {
            actor: action.actor,
            tool: name.to_string(),
        };
        let outcome = if !effect.known {
            ToolOutcome::Unknown
        } else if !effect.applicable_to.admits(action.actor) {
            ToolOutcome::Ineligible
        } else if action.round < effect.available_from_round {
            ToolOutcome::Locked
        } else if ctx.applied.contains(&key) || !seen_here.insert(name) {
            ToolOutcome::Repeat
        } else {
            ToolOutcome::Applied
        };

        let (trust_effect, spread_effect) = if matches!(outcome, ToolOutcome::Applied) {
            (
                i64::from(effect.trust_effect),
                i64::from(effect.spread_effect),
            )
        } else {
            (0, 0)
        };
        if matches!(
            outcome,
            ToolOutcome::Unknown | ToolOutcome::Ineligible | ToolOutcome::Locked
        ) {
            log::warn!(
                "{} tool '{name}' has no effect in round {} ({outcome:?})",
                action.actor,
                action.round
            );
        }
        trust = trust.saturating_add(trust_effect);
        spread = spread.saturating_add(spread_effect);
        resolved.push(ToolUsage {
            tool_name: usage.tool_name.clone(),
            trust_effect,
            spread_effect,
            outcome,
        });
    }

    (resolved, trust, spread)
}

/// Route the combined trust change to the right fields.
///
/// Amplify raises both actors by the magnitude of the combined trust, with
/// the AI's share scaled by the policy ratio.
#[must_use]
pub fn attribute(
    actor: Actor,
    reaction: ReactionMode,
    trust: i64,
    spread: i64,
    policy: &ScoringPolicy,
) -> StateDelta {
    match reaction {
        ReactionMode::Amplify => {
            let magnitude = trust.saturating_abs();
            StateDelta {
                player_trust: magnitude,
                ai_trust: scale_by_ratio(magnitude, policy.amplify_ratio),
                spread,
            }
        }
        ReactionMode::Publish | ReactionMode::Clarify | ReactionMode::Ignore => {
            StateDelta::for_actor(actor, trust, spread)
        }
    }
}
