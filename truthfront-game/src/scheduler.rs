//! Turn-order state machine.
//!
//! ```text
//! AwaitingAiAction -> AwaitingPlayerAction -> Resolved -> AwaitingAiAction
//!                                                      \-> SessionComplete
//! ```
//!
//! The scheduler alone decides when a session ends; the resolver never sees
//! that decision.
use serde::{Deserialize, Serialize};

use crate::config::EndConditions;
use crate::error::RuleError;
use crate::ledger::PlatformLedger;
use crate::news::News;
use crate::state::{Actor, EndReason, Round, SessionStatus, TurnState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScheduler {
    state: TurnState,
    status: SessionStatus,
    rounds: Vec<Round>,
    end: EndConditions,
    #[serde(default)]
    end_reason: Option<EndReason>,
}

impl RoundScheduler {
    /// Open round 1 on `news` and wait for the AI.
    #[must_use]
    pub fn start(news: News, end: EndConditions) -> Self {
        Self {
            state: TurnState::AwaitingAiAction,
            status: SessionStatus::Ongoing,
            rounds: vec![Round {
                number: 1,
                news,
                completed: false,
            }],
            end,
            end_reason: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub const fn end_reason(&self) -> Option<&EndReason> {
        self.end_reason.as_ref()
    }

    #[must_use]
    pub const fn end_conditions(&self) -> &EndConditions {
        &self.end
    }

    #[must_use]
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Number of the most recent round.
    #[must_use]
    pub fn current_round(&self) -> u32 {
        self.rounds.last().map_or(0, |round| round.number)
    }

    /// The round currently accepting actions, if any.
    #[must_use]
    pub fn active_round(&self) -> Option<&Round> {
        self.rounds.last().filter(|round| !round.completed)
    }

    #[must_use]
    pub fn completed_rounds(&self) -> u32 {
        let completed = self.rounds.iter().filter(|round| round.completed).count();
        u32::try_from(completed).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.state, TurnState::SessionComplete)
    }

    /// Check that `actor` may act now.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::SessionEnded`] once the session is complete and
    /// [`RuleError::OutOfTurn`] when another move is expected.
    pub fn expect_turn(&self, actor: Actor) -> Result<(), RuleError> {
        if self.is_complete() {
            return Err(RuleError::SessionEnded);
        }
        if self.state.expected_actor() == Some(actor) {
            Ok(())
        } else {
            Err(RuleError::OutOfTurn {
                actor,
                state: self.state,
            })
        }
    }

    /// Check that `round` is the open round.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RoundClosed`] for completed or superseded rounds.
    pub fn expect_open(&self, round: u32) -> Result<(), RuleError> {
        match self.active_round() {
            Some(open) if open.number == round => Ok(()),
            _ => Err(RuleError::RoundClosed { round }),
        }
    }

    /// Advance after `actor`'s action resolved.
    pub(crate) fn record_resolved(&mut self, actor: Actor) {
        match actor {
            Actor::Ai => self.state = TurnState::AwaitingPlayerAction,
            Actor::Player => {
                if let Some(round) = self.rounds.last_mut() {
                    round.completed = true;
                }
                self.state = TurnState::Resolved;
            }
        }
    }

    /// Decide whether a resolved round ends the session.
    ///
    /// Only acts in the `Resolved` state. Returns the reason when the session
    /// ended.
    pub(crate) fn conclude(&mut self, ledger: &PlatformLedger) -> Option<EndReason> {
        if self.state != TurnState::Resolved {
            return None;
        }
        let reason = self
            .threshold_reason(ledger)
            .or_else(|| self.round_limit_reason())?;
        self.finish(SessionStatus::Completed, reason.clone());
        Some(reason)
    }

    /// Open the next round on `news`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::SessionEnded`] after completion and
    /// [`RuleError::RoundStillOpen`] while a round is unresolved.
    pub(crate) fn open_round(&mut self, news: News) -> Result<u32, RuleError> {
        if self.is_complete() {
            return Err(RuleError::SessionEnded);
        }
        if let Some(open) = self.active_round() {
            return Err(RuleError::RoundStillOpen { round: open.number });
        }
        let number = self.current_round().saturating_add(1);
        self.rounds.push(Round {
            number,
            news,
            completed: false,
        });
        self.state = TurnState::AwaitingAiAction;
        Ok(number)
    }

    /// End the session on request.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::SessionEnded`] if it already ended.
    pub(crate) fn abandon(&mut self) -> Result<(), RuleError> {
        if self.is_complete() {
            return Err(RuleError::SessionEnded);
        }
        self.finish(SessionStatus::Aborted, EndReason::Abandoned);
        Ok(())
    }

    fn finish(&mut self, status: SessionStatus, reason: EndReason) {
        self.state = TurnState::SessionComplete;
        self.status = status;
        self.end_reason = Some(reason);
    }

    fn threshold_reason(&self, ledger: &PlatformLedger) -> Option<EndReason> {
        let latest = ledger.latest_all();
        if let Some(collapse) = self.end.collapse_threshold {
            for (platform, state) in &latest {
                for actor in Actor::ALL {
                    if state.trust_of(actor) <= collapse {
                        return Some(EndReason::TrustCollapse {
                            actor,
                            platform: platform.name.clone(),
                        });
                    }
                }
            }
        }
        if let Some(dominance) = self.end.dominance_threshold {
            for (platform, state) in &latest {
                for actor in Actor::ALL {
                    if state.trust_of(actor) >= dominance {
                        return Some(EndReason::TrustDominance {
                            actor,
                            platform: platform.name.clone(),
                        });
                    }
                }
            }
        }
        None
    }

    fn round_limit_reason(&self) -> Option<EndReason> {
        let limit = self.end.round_limit?;
        let rounds = self.completed_rounds();
        (rounds >= limit).then_some(EndReason::RoundLimit { rounds })
    }
}
