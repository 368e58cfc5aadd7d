use anyhow::{Result, ensure};
use std::collections::HashSet;

use truthfront_game::{EndConditions, EndReason, ReactionMode, SessionStatus};

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};

/// A named simulation plan the logic tester can run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const SCENARIOS: [(&str, &str); 6] = [
    ("smoke", "Smoke Test"),
    ("full-session", "Full Session to Round Limit"),
    ("amplify-pressure", "Amplify Always Favors the AI"),
    ("tool-cycle", "Tools Apply Once per Actor"),
    ("rejection-guard", "Rejected Moves Leave State Untouched"),
    ("threshold-endings", "Trust Thresholds End Sessions"),
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = name.to_lowercase();
    let (_, title) = SCENARIOS.iter().find(|(k, _)| *k == key)?;
    let plan = match key.as_str() {
        "smoke" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_round_limit(3)
            .with_expectation(completed_expectation),
        "full-session" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_round_limit(8)
            .with_end(EndConditions::open_ended())
            .with_expectation(round_limit_expectation),
        "amplify-pressure" => SimulationPlan::new(GameplayStrategy::Amplifier)
            .with_round_limit(6)
            .with_end(EndConditions::open_ended())
            .with_expectation(amplify_expectation),
        "tool-cycle" => SimulationPlan::new(GameplayStrategy::ToolHeavy)
            .with_round_limit(6)
            .with_end(EndConditions::open_ended())
            .with_expectation(tool_cycle_expectation),
        "rejection-guard" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_round_limit(4)
            .with_rejection_checks()
            .with_expectation(rejection_expectation),
        "threshold-endings" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_round_limit(40)
            .with_judge_scale(45)
            .with_expectation(completed_expectation)
            .with_expectation(threshold_expectation),
        _ => return None,
    };
    Some(TestScenario::simulation(*title, plan))
}

fn completed_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.ended(), "session should have ended");
    ensure!(
        summary.result.status == SessionStatus::Completed,
        "session should complete on its own, got {:?}",
        summary.result.status
    );
    ensure!(
        summary.result.end_reason != Some(EndReason::Abandoned),
        "completed session reported abandonment"
    );
    Ok(())
}

fn round_limit_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    let limit = summary.final_state.config.end.round_limit.unwrap_or_default();
    ensure!(
        summary.result.end_reason == Some(EndReason::RoundLimit { rounds: limit }),
        "expected round limit ending, got {:?}",
        summary.result.end_reason
    );
    ensure!(
        summary.result.rounds_completed == limit,
        "completed {} of {limit} rounds",
        summary.result.rounds_completed
    );
    ensure!(
        summary.result.actions == usize::try_from(limit)? * 2,
        "expected two actions per round, saw {}",
        summary.result.actions
    );
    Ok(())
}

fn amplify_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut amplified = 0;
    for record in &summary.final_state.records {
        if record.action.reaction != ReactionMode::Amplify {
            continue;
        }
        amplified += 1;
        let delta = record.trust_change;
        ensure!(
            delta.ai_trust > delta.player_trust || (delta.ai_trust == 0 && delta.player_trust == 0),
            "round {} amplify gave player {} and ai {}",
            record.round(),
            delta.player_trust,
            delta.ai_trust
        );
        ensure!(
            delta.player_trust >= 0,
            "amplify lowered player trust in round {}",
            record.round()
        );
    }
    ensure!(amplified > 0, "no amplify moves were played");
    Ok(())
}

fn tool_cycle_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut seen = HashSet::new();
    for record in &summary.final_state.records {
        for usage in record.action.tools.iter().filter(|usage| usage.applied()) {
            ensure!(
                seen.insert((record.actor(), usage.tool_name.clone())),
                "{} applied {} twice",
                record.actor(),
                usage.tool_name
            );
        }
    }
    ensure!(
        summary.result.player_tools_applied > 0 && summary.result.ai_tools_applied > 0,
        "both actors should apply at least one tool"
    );
    Ok(())
}

fn rejection_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.rejected_moves == summary.steps * 2,
        "{} of {} bad moves were rejected",
        summary.rejected_moves,
        summary.steps * 2
    );
    Ok(())
}

fn threshold_expectation(summary: &SimulationSummary) -> Result<()> {
    let end = &summary.final_state.config.end;
    let ledger = &summary.final_state.ledger;
    match &summary.result.end_reason {
        Some(EndReason::TrustCollapse { actor, platform }) => {
            let trust = ledger.current(platform)?.trust_of(*actor);
            let floor = end.collapse_threshold.unwrap_or_default();
            ensure!(
                trust <= floor,
                "{actor} collapse on {platform} reported at trust {trust}"
            );
        }
        Some(EndReason::TrustDominance { actor, platform }) => {
            let trust = ledger.current(platform)?.trust_of(*actor);
            let ceiling = end.dominance_threshold.unwrap_or(u8::MAX);
            ensure!(
                trust >= ceiling,
                "{actor} dominance on {platform} reported at trust {trust}"
            );
        }
        Some(EndReason::RoundLimit { .. }) => {
            for (platform, state) in ledger.latest_all() {
                for trust in [state.player_trust, state.ai_trust] {
                    ensure!(
                        end.collapse_threshold.is_none_or(|floor| trust > floor)
                            && end.dominance_threshold.is_none_or(|ceiling| trust < ceiling),
                        "{} crossed a threshold without ending the session",
                        platform.name
                    );
                }
            }
        }
        other => anyhow::bail!("unexpected ending {other:?}"),
    }
    Ok(())
}
