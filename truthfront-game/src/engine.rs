//! Engine facade over sessions, collaborators, and storage.
//!
//! Every operation takes the session's lock and then runs
//! load → collaborators → resolve → save while holding it. A rejected
//! operation never reaches `save`, so stored snapshots only ever move forward.
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::action::{Action, ActionRecord, ActionResult, Judgement};
use crate::config::SessionConfig;
use crate::error::{EngineError, RuleError, ValidationError};
use crate::news::News;
use crate::result::ResultSummary;
use crate::seed::session_id_for;
use crate::session::{GameSession, SessionState, StateView};
use crate::state::{Actor, Platform, PlatformState, ReactionMode, SessionId};
use crate::tools::ToolEffectRegistry;

/// Source of news items for new rounds.
pub trait ContentGenerator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce the news item for the next round.
    ///
    /// # Errors
    ///
    /// Returns an error if no item can be produced.
    fn next_news(&self, category: Option<&str>) -> Result<News, Self::Error>;
}

/// External assessment of how an action landed.
pub trait JudgementProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Judge a proposed action.
    ///
    /// # Errors
    ///
    /// Returns an error if the judgement cannot be produced.
    fn judge(&self, request: &JudgementRequest<'_>) -> Result<Judgement, Self::Error>;
}

/// Durable storage of session snapshots.
pub trait Repository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    fn load(&self, id: &str) -> Result<Option<SessionState>, Self::Error>;

    /// Store a session, replacing any earlier snapshot with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    fn save(&self, state: &SessionState) -> Result<(), Self::Error>;
}

impl<T: ContentGenerator + ?Sized> ContentGenerator for Arc<T> {
    type Error = T::Error;

    fn next_news(&self, category: Option<&str>) -> Result<News, Self::Error> {
        (**self).next_news(category)
    }
}

impl<T: JudgementProvider + ?Sized> JudgementProvider for Arc<T> {
    type Error = T::Error;

    fn judge(&self, request: &JudgementRequest<'_>) -> Result<Judgement, Self::Error> {
        (**self).judge(request)
    }
}

impl<T: Repository + ?Sized> Repository for Arc<T> {
    type Error = T::Error;

    fn load(&self, id: &str) -> Result<Option<SessionState>, Self::Error> {
        (**self).load(id)
    }

    fn save(&self, state: &SessionState) -> Result<(), Self::Error> {
        (**self).save(state)
    }
}

/// Everything a judgement provider sees about a proposed action.
#[derive(Debug, Clone)]
pub struct JudgementRequest<'a> {
    pub action: &'a Action,
    pub platform: &'a Platform,
    pub news: Option<&'a News>,
    /// Platform state before the action.
    pub current: PlatformState,
    pub history: &'a [PlatformState],
    /// The AI's action from the previous round.
    pub previous_ai: Option<&'a ActionRecord>,
    /// Player actions from earlier rounds.
    pub prior_player_actions: Vec<&'a ActionRecord>,
}

/// Caller-facing description of a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub actor: Actor,
    pub platform: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    /// Reaction mode name; the AI may omit it.
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    /// Round the caller believes is open; defaults to the current round.
    #[serde(default)]
    pub round: Option<u32>,
}

impl ActionRequest {
    #[must_use]
    pub fn new(actor: Actor, platform: &str, content: &str) -> Self {
        Self {
            actor,
            platform: platform.to_string(),
            title: String::new(),
            content: content.to_string(),
            reaction: None,
            tools: Vec::new(),
            round: None,
        }
    }

    #[must_use]
    pub fn ai(platform: &str, content: &str) -> Self {
        Self::new(Actor::Ai, platform, content)
    }

    #[must_use]
    pub fn player(platform: &str, content: &str, reaction: &str) -> Self {
        Self {
            reaction: Some(reaction.to_string()),
            ..Self::new(Actor::Player, platform, content)
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub const fn in_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    fn reaction_for(&self, actor: Actor) -> Result<ReactionMode, RuleError> {
        match self.reaction.as_deref() {
            Some(raw) => ReactionMode::parse_for(actor, raw),
            None => actor.implied_reaction().ok_or(RuleError::InvalidReaction {
                actor,
                reaction: String::new(),
            }),
        }
    }
}

/// Main engine for running sessions.
pub struct GameEngine<C, J, R>
where
    C: ContentGenerator,
    J: JudgementProvider,
    R: Repository,
{
    content: C,
    judge: J,
    repository: R,
    registry: Arc<ToolEffectRegistry>,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    started: AtomicU64,
}

impl<C, J, R> GameEngine<C, J, R>
where
    C: ContentGenerator,
    J: JudgementProvider,
    R: Repository,
{
    pub fn new(content: C, judge: J, repository: R, registry: Arc<ToolEffectRegistry>) -> Self {
        Self {
            content,
            judge,
            repository,
            registry,
            locks: Mutex::new(HashMap::new()),
            started: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ToolEffectRegistry {
        &self.registry
    }

    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Start a session and store its first snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for invalid configuration and
    /// [`EngineError::Collaborator`] when news or storage fail.
    pub fn start_session(&self, config: SessionConfig) -> Result<SessionId, EngineError> {
        config.validate()?;
        let id = self.fresh_id(config.seed)?;
        let lock = self.lock_for(&id);
        let _guard = lock.lock();

        let news = self
            .content
            .next_news(config.news_category.as_deref())
            .map_err(|err| EngineError::collaborator("content", err))?;
        let session = GameSession::start(id.clone(), config, news, Arc::clone(&self.registry))?;
        self.store(&session)?;
        log::debug!("engine started session {id}");
        Ok(id)
    }

    /// Resolve one move and store the new snapshot.
    ///
    /// A player move that does not end the session opens the next round with
    /// fresh news in the same save. If news cannot be fetched then, the
    /// session stays resolved and the next AI move retries the fetch. The
    /// judgement provider is only consulted for moves that pass every rule
    /// check.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Rule`] for rejected moves,
    /// [`EngineError::SessionNotFound`] for unknown ids, and
    /// [`EngineError::Collaborator`] when a collaborator fails.
    pub fn submit_action(
        &self,
        id: &str,
        request: &ActionRequest,
    ) -> Result<ActionResult, EngineError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock();
        let mut session = self.fetch(id)?;

        if session.scheduler().is_complete() {
            return Err(RuleError::SessionEnded.into());
        }
        let actor = request.actor;
        if actor == Actor::Ai && session.needs_news() {
            let news = self
                .content
                .next_news(session.config().news_category.as_deref())
                .map_err(|err| EngineError::collaborator("content", err))?;
            session.open_next_round(news)?;
        }

        let tools: Vec<&str> = request.tools.iter().map(String::as_str).collect();
        let mut action = session.draft_action(
            actor,
            &request.platform,
            &request.title,
            &request.content,
            request.reaction_for(actor)?,
            &tools,
        )?;
        if let Some(round) = request.round {
            action.round = round;
        }
        session.check_submission(&action)?;

        let judgement = {
            let judgement_request = judgement_request(&session, &action)?;
            self.judge
                .judge(&judgement_request)
                .map_err(|err| EngineError::collaborator("judgement", err))?
        };
        let mut result = session.submit(action, &judgement)?;
        if actor == Actor::Player && session.needs_news() {
            match self
                .content
                .next_news(session.config().news_category.as_deref())
            {
                Ok(news) => {
                    result.round = session.open_next_round(news)?;
                    result.turn_state = session.turn_state();
                }
                Err(err) => {
                    log::warn!("session {id} stays resolved, news unavailable: {err}");
                }
            }
        }
        self.store(&session)?;
        Ok(result)
    }

    /// Stage a tool for an actor's next move.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Rule`] for ended sessions. Unknown tool names are
    /// staged and resolve with no effect.
    pub fn use_tool(&self, id: &str, actor: Actor, tool: &str) -> Result<(), EngineError> {
        self.mutate(id, |session| session.use_tool(actor, tool))
    }

    /// Drop an actor's staged tools.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown sessions or storage failures.
    pub fn discard_pending(&self, id: &str, actor: Actor) -> Result<Vec<String>, EngineError> {
        self.mutate(id, |session| Ok(session.discard_pending(actor)))
    }

    /// Current view of a session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for unknown ids.
    pub fn get_state(&self, id: &str) -> Result<StateView, EngineError> {
        self.read(id, |session| session.current_state())
    }

    /// Full stored snapshot of a session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for unknown ids.
    pub fn snapshot(&self, id: &str) -> Result<SessionState, EngineError> {
        self.read(id, |session| session.snapshot().clone())
    }

    /// End a session, abandoning it if still running, and summarize it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for unknown ids.
    pub fn end_session(&self, id: &str) -> Result<ResultSummary, EngineError> {
        self.mutate(id, |session| {
            if !session.scheduler().is_complete() {
                session.abandon()?;
            }
            Ok(ResultSummary::from_session(session))
        })
    }

    /// Summary of a session in its current state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for unknown ids.
    pub fn result(&self, id: &str) -> Result<ResultSummary, EngineError> {
        self.read(id, ResultSummary::from_session)
    }

    fn read<T>(&self, id: &str, f: impl FnOnce(&GameSession) -> T) -> Result<T, EngineError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock();
        let session = self.fetch(id)?;
        Ok(f(&session))
    }

    fn mutate<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut GameSession) -> Result<T, RuleError>,
    ) -> Result<T, EngineError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock();
        let mut session = self.fetch(id)?;
        let value = f(&mut session)?;
        self.store(&session)?;
        Ok(value)
    }

    /// Load a session while its lock is held.
    ///
    /// A missing id drops its lock entry so lookups of unknown ids do not
    /// grow the lock table.
    fn fetch(&self, id: &str) -> Result<GameSession, EngineError> {
        let state = self
            .repository
            .load(id)
            .map_err(|err| EngineError::collaborator("repository", err))?;
        let Some(state) = state else {
            self.forget_lock(id);
            return Err(EngineError::SessionNotFound(id.to_string()));
        };
        Ok(GameSession::from_state(state, Arc::clone(&self.registry)))
    }

    fn store(&self, session: &GameSession) -> Result<(), EngineError> {
        self.repository
            .save(session.snapshot())
            .map_err(|err| EngineError::collaborator("repository", err))
    }

    fn fresh_id(&self, seed: u64) -> Result<SessionId, EngineError> {
        loop {
            let ordinal = self.started.fetch_add(1, Ordering::Relaxed);
            let id = session_id_for(seed, ordinal);
            let taken = self
                .repository
                .load(&id)
                .map_err(|err| EngineError::collaborator("repository", err))?
                .is_some();
            if !taken {
                return Ok(id);
            }
        }
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    /// Remove `id`'s lock unless another caller is still holding or waiting on it.
    fn forget_lock(&self, id: &str) {
        let mut locks = self.locks.lock();
        // One reference in the table plus the caller's own.
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) <= 2) {
            locks.remove(id);
        }
    }
}

fn judgement_request<'a>(
    session: &'a GameSession,
    action: &'a Action,
) -> Result<JudgementRequest<'a>, EngineError> {
    let ledger = session.ledger();
    let platform = ledger
        .platform(&action.platform)
        .ok_or_else(|| ValidationError::UnknownPlatform(action.platform.clone()))?;
    Ok(JudgementRequest {
        action,
        platform,
        news: session
            .scheduler()
            .active_round()
            .map(|round| &round.news),
        current: ledger.current(&action.platform)?,
        history: ledger.history(&action.platform),
        previous_ai: session.previous_ai_feedback(action.round),
        prior_player_actions: session.player_actions_before(action.round),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRepository;
    use crate::news::NewsDeck;
    use crate::state::{Effectiveness, TurnState};
    use std::convert::Infallible;

    struct FixedJudge(i64, i64);

    impl JudgementProvider for FixedJudge {
        type Error = Infallible;

        fn judge(&self, _request: &JudgementRequest<'_>) -> Result<Judgement, Self::Error> {
            Ok(Judgement::new(10, self.0, self.1, Effectiveness::Medium))
        }
    }

    fn engine() -> GameEngine<NewsDeck, FixedJudge, MemoryRepository> {
        GameEngine::new(
            NewsDeck::with_default_deck(3),
            FixedJudge(-2, 3),
            MemoryRepository::default(),
            Arc::new(ToolEffectRegistry::default_catalog()),
        )
    }

    #[test]
    fn session_ids_are_unique_and_prefixed() {
        let engine = engine();
        let a = engine.start_session(SessionConfig::seeded(1)).unwrap();
        let b = engine.start_session(SessionConfig::seeded(1)).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("game_"));
        assert_eq!(engine.repository().len(), 2);
    }

    #[test]
    fn player_move_opens_the_next_round() {
        let engine = engine();
        let id = engine.start_session(SessionConfig::seeded(4)).unwrap();
        engine
            .submit_action(&id, &ActionRequest::ai("Facebook", "claim"))
            .unwrap();
        let result = engine
            .submit_action(&id, &ActionRequest::player("Facebook", "fix", "clarify"))
            .unwrap();
        assert_eq!(result.record.round(), 1);
        assert_eq!(result.round, 2);
        assert_eq!(result.turn_state, TurnState::AwaitingAiAction);

        let view = engine.get_state(&id).unwrap();
        assert_eq!(view.round, 2);
        assert_eq!(view.turn_state, TurnState::AwaitingAiAction);
        assert!(view.news.is_some());

        let result = engine
            .submit_action(&id, &ActionRequest::ai("Thread", "again"))
            .unwrap();
        assert_eq!(result.round, 2);
        assert_eq!(result.turn_state, TurnState::AwaitingPlayerAction);
    }

    #[test]
    fn unknown_ids_do_not_grow_the_lock_table() {
        let engine = engine();
        let id = engine.start_session(SessionConfig::seeded(4)).unwrap();
        let baseline = engine.locks.lock().len();
        for i in 0..64 {
            let missing = format!("game_missing_{i}");
            assert!(engine.get_state(&missing).is_err());
            assert!(engine.use_tool(&missing, Actor::Ai, "Deepfake").is_err());
            assert!(
                engine
                    .submit_action(&missing, &ActionRequest::ai("Facebook", "claim"))
                    .is_err()
            );
        }
        assert_eq!(engine.locks.lock().len(), baseline);
        assert!(engine.locks.lock().contains_key(&id));
    }

    #[test]
    fn rejected_requests_are_not_stored() {
        let engine = engine();
        let id = engine.start_session(SessionConfig::seeded(4)).unwrap();
        let before = engine.snapshot(&id).unwrap();
        let err = engine
            .submit_action(&id, &ActionRequest::player("Facebook", "fix", "publish"))
            .unwrap_err();
        assert!(matches!(err.rule(), Some(RuleError::InvalidReaction { .. })));
        assert_eq!(engine.snapshot(&id).unwrap(), before);
        assert!(matches!(
            engine.get_state("game_missing"),
            Err(EngineError::SessionNotFound(_))
        ));
    }
}
