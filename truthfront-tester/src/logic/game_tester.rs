use anyhow::{Context, Result, bail};
use std::sync::Arc;

use truthfront_game::{
    ActionRequest, Actor, EndConditions, GameEngine, MemoryRepository, NewsDeck, ResultSummary,
    SessionConfig, SessionState, ToolEffectRegistry, TurnState,
};

use super::judge::SeededJudge;
use super::policy::GameplayStrategy;

pub type Expectation = fn(&SimulationSummary) -> Result<()>;

type TesterEngine = GameEngine<NewsDeck, SeededJudge, MemoryRepository>;

/// How one scripted session is configured and judged.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub round_limit: u32,
    /// Largest raw trust delta the judge may hand out.
    pub judge_scale: i64,
    pub end: EndConditions,
    /// Submit out-of-turn moves each step and require that they bounce.
    pub check_rejections: bool,
    pub expectations: Vec<Expectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            round_limit: 5,
            judge_scale: 10,
            end: EndConditions::default(),
            check_rejections: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_round_limit(mut self, rounds: u32) -> Self {
        self.round_limit = rounds;
        self
    }

    #[must_use]
    pub const fn with_judge_scale(mut self, scale: i64) -> Self {
        self.judge_scale = scale;
        self
    }

    #[must_use]
    pub const fn with_end(mut self, end: EndConditions) -> Self {
        self.end = end;
        self
    }

    #[must_use]
    pub const fn with_rejection_checks(mut self) -> Self {
        self.check_rejections = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// Everything observed while running one plan on one seed.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub session_id: String,
    pub steps: usize,
    pub rejected_moves: usize,
    pub violations: Vec<String>,
    pub final_state: SessionState,
    pub result: ResultSummary,
}

impl SimulationSummary {
    #[must_use]
    pub fn ended(&self) -> bool {
        self.final_state.scheduler.is_complete()
    }
}

#[derive(Debug, Clone)]
pub struct GameTester {
    registry: Arc<ToolEffectRegistry>,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub fn new(registry: Arc<ToolEffectRegistry>, verbose: bool) -> Self {
        Self { registry, verbose }
    }

    #[must_use]
    pub fn try_new(verbose: bool) -> Self {
        Self::new(Arc::new(ToolEffectRegistry::default_catalog()), verbose)
    }

    /// Play `plan` on `seed` through the public engine API until the session ends.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let engine: TesterEngine = GameEngine::new(
            NewsDeck::with_default_deck(seed),
            SeededJudge::new(seed, plan.judge_scale),
            MemoryRepository::new(),
            Arc::clone(&self.registry),
        );
        let mut config = SessionConfig::seeded(seed).with_round_limit(plan.round_limit);
        config.end.collapse_threshold = plan.end.collapse_threshold;
        config.end.dominance_threshold = plan.end.dominance_threshold;
        let id = engine
            .start_session(config)
            .context("failed to start session")?;

        let mut policy = plan.strategy.create_policy(seed);
        let mut violations = Vec::new();
        let mut rejected_moves = 0;
        let mut steps = 0;
        let max_steps = usize::try_from(plan.round_limit)
            .unwrap_or(usize::MAX)
            .saturating_mul(2)
            .saturating_add(2);

        loop {
            let view = engine.get_state(&id)?;
            if view.turn_state == TurnState::SessionComplete {
                break;
            }
            if steps >= max_steps {
                bail!("session {id} still running after {steps} moves");
            }
            let actor = match view.turn_state {
                TurnState::AwaitingPlayerAction => Actor::Player,
                _ => Actor::Ai,
            };
            let before = engine.snapshot(&id)?;

            if plan.check_rejections {
                rejected_moves += send_bad_moves(&engine, &id, actor, &before, &mut violations)?;
            }

            let request = policy.next_move(actor, &view);
            let result = engine
                .submit_action(&id, &request)
                .with_context(|| format!("{} move rejected: {request:?}", policy.name()))?;
            let after = engine.snapshot(&id)?;
            violations.extend(check_step(&before, &after));
            steps += 1;

            if self.verbose {
                let state = result.record.state_after;
                println!(
                    "    round {} {} on {}: player {} ai {} spread {}",
                    result.record.round(),
                    actor,
                    result.record.action.platform,
                    state.player_trust,
                    state.ai_trust,
                    state.spread_rate
                );
            }
        }

        let result = engine.end_session(&id)?;
        let final_state = engine.snapshot(&id)?;
        Ok(SimulationSummary {
            seed,
            strategy: plan.strategy,
            session_id: id,
            steps,
            rejected_moves,
            violations,
            final_state,
            result,
        })
    }
}

/// Fire a move for the wrong actor and a stale-round move; both must bounce
/// without changing the stored snapshot.
fn send_bad_moves(
    engine: &TesterEngine,
    id: &str,
    actor: Actor,
    before: &SessionState,
    violations: &mut Vec<String>,
) -> Result<usize> {
    let platform = before
        .ledger
        .platforms()
        .next()
        .map(|platform| platform.name.clone())
        .unwrap_or_default();
    let wrong = match actor {
        Actor::Ai => ActionRequest::player(&platform, "offside", "clarify"),
        Actor::Player => ActionRequest::ai(&platform, "offside"),
    };
    let stale = ActionRequest::new(actor, &platform, "offside")
        .in_round(before.scheduler.current_round().saturating_sub(1));
    let stale = if actor == Actor::Player {
        ActionRequest {
            reaction: Some("ignore".to_string()),
            ..stale
        }
    } else {
        stale
    };

    let mut rejected = 0;
    for request in [wrong, stale] {
        if engine.submit_action(id, &request).is_ok() {
            violations.push(format!("bad move accepted: {request:?}"));
        } else {
            rejected += 1;
        }
        if &engine.snapshot(id)? != before {
            violations.push(format!("rejected move changed session {id}"));
        }
    }
    Ok(rejected)
}

/// Invariants that must hold across every accepted move.
#[must_use]
pub fn check_step(before: &SessionState, after: &SessionState) -> Vec<String> {
    let mut violations = Vec::new();

    if after.ledger.total_snapshots() != before.ledger.total_snapshots() + 1 {
        violations.push(format!(
            "expected exactly one new snapshot, saw {} -> {}",
            before.ledger.total_snapshots(),
            after.ledger.total_snapshots()
        ));
    }
    if after.records.len() != before.records.len() + 1 {
        violations.push("expected exactly one new action record".to_string());
    }
    if !after.ledger.all_snapshots().all(|state| state.is_bounded()) {
        violations.push("snapshot outside [0, 100]".to_string());
    }
    for platform in before.ledger.platforms() {
        let old = before.ledger.history(&platform.name);
        let new = after.ledger.history(&platform.name);
        if !new.starts_with(old) {
            violations.push(format!("history of {} was rewritten", platform.name));
        }
    }

    let rounds = after.scheduler.rounds();
    if rounds.windows(2).any(|pair| pair[1].number <= pair[0].number) {
        violations.push("round numbers are not increasing".to_string());
    }
    if rounds.iter().filter(|round| !round.completed).count() > 1 {
        violations.push("more than one open round".to_string());
    }
    for record in &after.records {
        let same = after
            .records
            .iter()
            .filter(|other| other.round() == record.round() && other.actor() == record.actor())
            .count();
        if same > 1 {
            violations.push(format!(
                "{} acted {same} times in round {}",
                record.actor(),
                record.round()
            ));
        }
    }

    violations
}
