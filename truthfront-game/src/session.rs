//! The session aggregate root.
//!
//! [`GameSession`] owns every piece of mutable game state. [`GameSession::submit`]
//! is the single point where an action becomes history; every other method
//! either reads, stages tools, or moves the scheduler.
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::io;
use std::sync::Arc;
use twox_hash::XxHash64;

use crate::action::{Action, ActionRecord, ActionResult, Judgement, ToolOutcome};
use crate::config::SessionConfig;
use crate::constants::{
    LOG_ACTION_RESOLVED_PREFIX, LOG_ROUND_COMPLETED, LOG_ROUND_OPENED, LOG_SESSION_ABORTED,
    LOG_SESSION_COMPLETED, LOG_SESSION_STARTED, LOG_TOOLS_DISCARDED_PREFIX,
    LOG_TOOL_APPLIED_PREFIX, LOG_TOOL_IGNORED_PREFIX, LOG_TOOL_REPEAT_PREFIX,
    LOG_TOOL_STAGED_PREFIX,
};
use crate::error::{ConfigError, RuleError, ValidationError};
use crate::ledger::PlatformLedger;
use crate::news::News;
use crate::resolver::{AppliedTool, AppliedTools, ResolveContext, resolve_action};
use crate::scheduler::RoundScheduler;
use crate::state::{
    Actor, EndReason, Platform, PlatformState, ReactionMode, SessionId, SessionStatus, TurnState,
};
use crate::tools::ToolEffectRegistry;

/// Tools staged by each actor for their next action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedTools {
    #[serde(default)]
    pub ai: Vec<String>,
    #[serde(default)]
    pub player: Vec<String>,
}

impl StagedTools {
    #[must_use]
    pub fn of(&self, actor: Actor) -> &[String] {
        match actor {
            Actor::Ai => &self.ai,
            Actor::Player => &self.player,
        }
    }

    fn of_mut(&mut self, actor: Actor) -> &mut Vec<String> {
        match actor {
            Actor::Ai => &mut self.ai,
            Actor::Player => &mut self.player,
        }
    }
}

/// Serializable snapshot of a whole session, as stored by a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: SessionId,
    pub config: SessionConfig,
    pub scheduler: RoundScheduler,
    pub ledger: PlatformLedger,
    #[serde(default)]
    pub records: Vec<ActionRecord>,
    #[serde(default)]
    pub applied_tools: AppliedTools,
    #[serde(default)]
    pub staged: StagedTools,
    /// Stable event keys in the order they happened.
    #[serde(default)]
    pub events: Vec<String>,
}

/// One platform as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformView {
    pub platform: Platform,
    pub state: PlatformState,
}

/// Read-only view of a session for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    pub session_id: SessionId,
    pub round: u32,
    pub turn_state: TurnState,
    pub status: SessionStatus,
    /// News item of the most recent round.
    pub news: Option<News>,
    pub platforms: Vec<PlatformView>,
    /// Tools the next actor may use in the round they will act in.
    pub available_tools: Vec<String>,
    pub staged: StagedTools,
    pub end_reason: Option<EndReason>,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    state: SessionState,
    registry: Arc<ToolEffectRegistry>,
}

impl GameSession {
    /// Start a session with round 1 opened on `news`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn start(
        id: impl Into<SessionId>,
        config: SessionConfig,
        news: News,
        registry: Arc<ToolEffectRegistry>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let platforms = config.resolve_platforms();
        let ledger = PlatformLedger::new(&platforms, config.initial_state());
        let scheduler = RoundScheduler::start(news, config.end);
        let state = SessionState {
            id: id.into(),
            config,
            scheduler,
            ledger,
            records: Vec::new(),
            applied_tools: AppliedTools::new(),
            staged: StagedTools::default(),
            events: vec![LOG_SESSION_STARTED.to_string(), LOG_ROUND_OPENED.to_string()],
        };
        log::debug!(
            "session {} started with {} platforms",
            state.id,
            platforms.len()
        );
        Ok(Self { state, registry })
    }

    /// Rehydrate a stored session.
    #[must_use]
    pub const fn from_state(state: SessionState, registry: Arc<ToolEffectRegistry>) -> Self {
        Self { state, registry }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.state.id
    }

    #[must_use]
    pub const fn snapshot(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.state.config
    }

    #[must_use]
    pub fn registry(&self) -> &ToolEffectRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn ledger(&self) -> &PlatformLedger {
        &self.state.ledger
    }

    #[must_use]
    pub const fn scheduler(&self) -> &RoundScheduler {
        &self.state.scheduler
    }

    #[must_use]
    pub fn records(&self) -> &[ActionRecord] {
        &self.state.records
    }

    #[must_use]
    pub fn events(&self) -> &[String] {
        &self.state.events
    }

    #[must_use]
    pub const fn turn_state(&self) -> TurnState {
        self.state.scheduler.state()
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.state.scheduler.status()
    }

    #[must_use]
    pub fn current_round(&self) -> u32 {
        self.state.scheduler.current_round()
    }

    /// Whether the next round is waiting for a news item.
    #[must_use]
    pub fn needs_news(&self) -> bool {
        self.turn_state() == TurnState::Resolved
    }

    /// Build an action for the current round without changing the session.
    ///
    /// Tools staged by `actor` come first, followed by `tools`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownPlatform`], [`RuleError::InvalidReaction`]
    /// or [`ValidationError::EmptyContent`] for malformed drafts.
    pub fn draft_action(
        &self,
        actor: Actor,
        platform: &str,
        title: &str,
        content: &str,
        reaction: ReactionMode,
        tools: &[&str],
    ) -> Result<Action, RuleError> {
        if self.state.ledger.platform(platform).is_none() {
            return Err(ValidationError::UnknownPlatform(platform.to_string()).into());
        }
        let mut action = Action::new(self.current_round(), actor, platform, content, reaction)?
            .with_title(title);
        for staged in self.state.staged.of(actor) {
            action.push_tool(staged.as_str());
        }
        for tool in tools {
            action.push_tool(*tool);
        }
        Ok(action)
    }

    /// Check everything about `action` that does not need a judgement.
    ///
    /// # Errors
    ///
    /// Returns, in order of precedence, `SessionEnded`, `AlreadyResolved`,
    /// `RoundClosed`, `DuplicateAction`, `OutOfTurn`, `InvalidReaction`, or
    /// an unknown-platform validation error.
    pub fn check_submission(&self, action: &Action) -> Result<(), RuleError> {
        let scheduler = &self.state.scheduler;
        if scheduler.is_complete() {
            return Err(RuleError::SessionEnded);
        }
        if action.is_resolved() {
            return Err(RuleError::AlreadyResolved);
        }
        scheduler.expect_open(action.round)?;
        if self
            .state
            .records
            .iter()
            .any(|record| record.round() == action.round && record.actor() == action.actor)
        {
            return Err(RuleError::DuplicateAction {
                round: action.round,
                actor: action.actor,
            });
        }
        scheduler.expect_turn(action.actor)?;
        if !action.reaction.allowed_for(action.actor) {
            return Err(RuleError::InvalidReaction {
                actor: action.actor,
                reaction: action.reaction.to_string(),
            });
        }
        self.state.ledger.current(&action.platform)?;
        Ok(())
    }

    /// Resolve `action` under `judgement` and append it to history.
    ///
    /// Nothing changes when an error is returned.
    ///
    /// # Errors
    ///
    /// Any [`RuleError`] from [`Self::check_submission`] or the resolver.
    pub fn submit(
        &mut self,
        mut action: Action,
        judgement: &Judgement,
    ) -> Result<ActionResult, RuleError> {
        self.check_submission(&action)?;
        let resolution = resolve_action(
            &action,
            judgement,
            ResolveContext {
                registry: &self.registry,
                applied: &self.state.applied_tools,
                policy: &self.state.config.scoring,
            },
        )?;
        let delta = resolution.delta;
        let reach = resolution.reach;
        action.attach(resolution)?;

        let actor = action.actor;
        let round = action.round;
        let state_after = self.state.ledger.apply(&action.platform, round, delta)?;

        for usage in &action.tools {
            let prefix = match usage.outcome {
                ToolOutcome::Applied => {
                    self.state.applied_tools.insert(AppliedTool {
                        actor,
                        tool: usage.tool_name.clone(),
                    });
                    LOG_TOOL_APPLIED_PREFIX
                }
                ToolOutcome::Repeat => LOG_TOOL_REPEAT_PREFIX,
                ToolOutcome::Pending
                | ToolOutcome::Unknown
                | ToolOutcome::Ineligible
                | ToolOutcome::Locked => LOG_TOOL_IGNORED_PREFIX,
            };
            self.state.events.push(format!("{prefix}{actor}"));
        }
        self.state.staged.of_mut(actor).clear();
        self.state
            .events
            .push(format!("{LOG_ACTION_RESOLVED_PREFIX}{actor}"));

        let record = ActionRecord {
            reach,
            trust_change: delta,
            spread_change: delta.spread,
            effectiveness: judgement.effectiveness,
            simulated_comments: judgement.simulated_comments.clone(),
            state_after,
            action,
        };
        self.state.records.push(record.clone());

        self.state.scheduler.record_resolved(actor);
        if actor == Actor::Player {
            self.state.events.push(LOG_ROUND_COMPLETED.to_string());
            if let Some(reason) = self.state.scheduler.conclude(&self.state.ledger) {
                log::debug!("session {} completed: {reason:?}", self.state.id);
                self.state.events.push(LOG_SESSION_COMPLETED.to_string());
            }
        }

        Ok(ActionResult {
            record,
            turn_state: self.turn_state(),
            round: self.current_round(),
        })
    }

    /// Stage `tool` for `actor`'s next action.
    ///
    /// Names outside the catalog are staged too; resolution records them as
    /// [`ToolOutcome::Unknown`] with no effect.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::SessionEnded`] after completion.
    pub fn use_tool(&mut self, actor: Actor, tool: &str) -> Result<(), RuleError> {
        if self.state.scheduler.is_complete() {
            return Err(RuleError::SessionEnded);
        }
        let tool = match self.registry.get(tool) {
            Some(known) => known.name.clone(),
            None => {
                log::warn!("session {}: {actor} staged unknown tool '{tool}'", self.state.id);
                tool.to_string()
            }
        };
        let staged = self.state.staged.of_mut(actor);
        if !staged.contains(&tool) {
            staged.push(tool);
            self.state
                .events
                .push(format!("{LOG_TOOL_STAGED_PREFIX}{actor}"));
        }
        Ok(())
    }

    /// Drop `actor`'s staged tools, returning them.
    pub fn discard_pending(&mut self, actor: Actor) -> Vec<String> {
        let discarded = std::mem::take(self.state.staged.of_mut(actor));
        if !discarded.is_empty() {
            self.state
                .events
                .push(format!("{LOG_TOOLS_DISCARDED_PREFIX}{actor}"));
        }
        discarded
    }

    /// Open the next round on `news`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RoundStillOpen`] or [`RuleError::SessionEnded`].
    pub fn open_next_round(&mut self, news: News) -> Result<u32, RuleError> {
        let round = self.state.scheduler.open_round(news)?;
        self.state.events.push(LOG_ROUND_OPENED.to_string());
        log::debug!("session {} opened round {round}", self.state.id);
        Ok(round)
    }

    /// End the session early.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::SessionEnded`] if it already ended.
    pub fn abandon(&mut self) -> Result<(), RuleError> {
        self.state.scheduler.abandon()?;
        self.state.events.push(LOG_SESSION_ABORTED.to_string());
        Ok(())
    }

    #[must_use]
    pub fn current_state(&self) -> StateView {
        let scheduler = &self.state.scheduler;
        let round = scheduler.current_round();
        let next_move = match scheduler.state() {
            TurnState::Resolved => Some((Actor::Ai, round.saturating_add(1))),
            state => state.expected_actor().map(|actor| (actor, round)),
        };
        let available_tools = next_move
            .map(|(actor, round)| {
                self.registry
                    .available_for(actor, round)
                    .into_iter()
                    .map(|tool| tool.name.clone())
                    .collect()
            })
            .unwrap_or_default();
        StateView {
            session_id: self.state.id.clone(),
            round,
            turn_state: scheduler.state(),
            status: scheduler.status(),
            news: scheduler.rounds().last().map(|r| r.news.clone()),
            platforms: self
                .state
                .ledger
                .latest_all()
                .into_iter()
                .map(|(platform, state)| PlatformView { platform, state })
                .collect(),
            available_tools,
            staged: self.state.staged.clone(),
            end_reason: scheduler.end_reason().cloned(),
        }
    }

    /// Player actions from rounds before `round`, oldest first.
    #[must_use]
    pub fn player_actions_before(&self, round: u32) -> Vec<&ActionRecord> {
        self.state
            .records
            .iter()
            .filter(|record| record.actor() == Actor::Player && record.round() < round)
            .collect()
    }

    /// The AI's action from the round before `round`, if any.
    #[must_use]
    pub fn previous_ai_feedback(&self, round: u32) -> Option<&ActionRecord> {
        let previous = round.checked_sub(1)?;
        self.state
            .records
            .iter()
            .find(|record| record.actor() == Actor::Ai && record.round() == previous)
    }

    /// Hash of the canonical JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if the snapshot cannot be encoded.
    pub fn fingerprint(&self) -> Result<u64, serde_json::Error> {
        let mut sink = HashSink(XxHash64::with_seed(0));
        serde_json::to_writer(&mut sink, &self.state)?;
        Ok(sink.0.finish())
    }
}

/// Feeds serialized bytes straight into a hasher.
struct HashSink(XxHash64);

impl io::Write for HashSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::Veracity;
    use crate::state::Effectiveness;

    fn session() -> GameSession {
        let config = SessionConfig::seeded(7).with_platforms(vec![
            Platform::new("Facebook", "young"),
            Platform::new("Instagram", "middle-aged"),
        ]);
        GameSession::start(
            "game_test",
            config,
            News::new("Miracle cure", "claims", Veracity::False),
            Arc::new(ToolEffectRegistry::default_catalog()),
        )
        .unwrap()
    }

    fn judgement(trust: i64, spread: i64) -> Judgement {
        Judgement::new(100, trust, spread, Effectiveness::Medium)
    }

    #[test]
    fn facebook_round_updates_only_the_acting_party() {
        let mut session = session();
        let action = session
            .draft_action(Actor::Ai, "Facebook", "t", "claim", ReactionMode::Publish, &["情緒刺激"])
            .unwrap();
        let result = session.submit(action, &judgement(-10, 15)).unwrap();
        let state = result.record.state_after;
        assert_eq!((state.ai_trust, state.player_trust, state.spread_rate), (40, 50, 25));
        assert_eq!(result.turn_state, TurnState::AwaitingPlayerAction);
        assert_eq!(
            session.ledger().current("Instagram").unwrap(),
            PlatformState::initial(50, 50, 0)
        );
    }

    #[test]
    fn rejections_leave_state_untouched() {
        let mut session = session();
        let before = session.fingerprint().unwrap();
        let early = Action::new(1, Actor::Player, "Facebook", "fix", ReactionMode::Clarify).unwrap();
        assert!(matches!(
            session.submit(early, &judgement(1, 1)),
            Err(RuleError::OutOfTurn { .. })
        ));
        let elsewhere = Action::new(1, Actor::Ai, "Myspace", "claim", ReactionMode::Publish).unwrap();
        assert!(session.submit(elsewhere, &judgement(1, 1)).is_err());
        let negative = Action::new(1, Actor::Ai, "Facebook", "claim", ReactionMode::Publish).unwrap();
        assert!(session
            .submit(negative, &Judgement::new(-1, 0, 0, Effectiveness::Low))
            .is_err());
        assert_eq!(session.fingerprint().unwrap(), before);
    }

    #[test]
    fn fingerprint_tracks_state_changes() {
        let mut session = session();
        let first = session.fingerprint().unwrap();
        let bytes = serde_json::to_vec(session.snapshot()).unwrap();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        assert_eq!(first, hasher.finish());

        session.use_tool(Actor::Player, "Podcast").unwrap();
        assert_ne!(session.fingerprint().unwrap(), first);
    }

    #[test]
    fn duplicate_actions_are_rejected() {
        let mut session = session();
        let action = Action::new(1, Actor::Ai, "Facebook", "claim", ReactionMode::Publish).unwrap();
        session.submit(action.clone(), &judgement(0, 0)).unwrap();
        assert_eq!(
            session.submit(action, &judgement(0, 0)),
            Err(RuleError::DuplicateAction {
                round: 1,
                actor: Actor::Ai
            })
        );
    }

    #[test]
    fn staged_tools_merge_into_drafts_and_clear_on_submit() {
        let mut session = session();
        session.use_tool(Actor::Ai, "情緒刺激").unwrap();
        session.use_tool(Actor::Ai, "情緒刺激").unwrap();
        assert_eq!(session.snapshot().staged.ai, vec!["情緒刺激".to_string()]);
        let action = session
            .draft_action(Actor::Ai, "Facebook", "", "claim", ReactionMode::Publish, &[])
            .unwrap();
        assert_eq!(action.tools.len(), 1);
        session.submit(action, &judgement(0, 0)).unwrap();
        assert!(session.snapshot().staged.ai.is_empty());
    }

    #[test]
    fn unknown_staged_tools_resolve_without_effect() {
        let mut session = session();
        session.use_tool(Actor::Ai, "Mind Control").unwrap();
        session.use_tool(Actor::Ai, "情緒刺激").unwrap();
        assert_eq!(
            session.snapshot().staged.ai,
            vec!["Mind Control".to_string(), "情緒刺激".to_string()]
        );
        let action = session
            .draft_action(Actor::Ai, "Facebook", "", "claim", ReactionMode::Publish, &[])
            .unwrap();
        assert_eq!(action.tools.len(), 2);
        let result = session.submit(action, &judgement(0, 0)).unwrap();

        let tools = &result.record.action.tools;
        let unknown = tools
            .iter()
            .find(|usage| usage.tool_name == "Mind Control")
            .unwrap();
        assert_eq!(unknown.outcome, ToolOutcome::Unknown);
        assert_eq!((unknown.trust_effect, unknown.spread_effect), (0, 0));
        let known = tools.iter().find(|usage| usage.tool_name == "情緒刺激").unwrap();
        assert_eq!(known.outcome, ToolOutcome::Applied);
        assert!(session.snapshot().staged.ai.is_empty());
    }

    #[test]
    fn discarding_staged_tools_keeps_platform_state() {
        let mut session = session();
        let ledger_before = session.ledger().clone();
        session.use_tool(Actor::Player, "Podcast").unwrap();
        assert_eq!(session.discard_pending(Actor::Player), vec!["Podcast".to_string()]);
        assert_eq!(session.ledger(), &ledger_before);
        assert!(session.discard_pending(Actor::Player).is_empty());
    }

    #[test]
    fn history_queries_follow_rounds() {
        let mut session = session();
        for round in 1..=2 {
            if round > 1 {
                session
                    .open_next_round(News::new("next", "body", Veracity::Partial))
                    .unwrap();
            }
            let ai = session
                .draft_action(Actor::Ai, "Facebook", "", "claim", ReactionMode::Publish, &[])
                .unwrap();
            session.submit(ai, &judgement(-1, 2)).unwrap();
            let player = session
                .draft_action(Actor::Player, "Facebook", "", "fix", ReactionMode::Clarify, &[])
                .unwrap();
            session.submit(player, &judgement(2, -1)).unwrap();
        }
        assert_eq!(session.player_actions_before(2).len(), 1);
        assert_eq!(session.player_actions_before(3).len(), 2);
        assert_eq!(session.previous_ai_feedback(2).map(ActionRecord::round), Some(1));
        assert!(session.previous_ai_feedback(1).is_none());
        assert!(session.needs_news());
    }
}
