//! End-of-session result calculation
use serde::{Deserialize, Serialize};

use crate::numbers::i64_to_f64;
use crate::session::{GameSession, PlatformView};
use crate::state::{Actor, EndReason, SessionId, SessionStatus};

/// Which side finished ahead on average trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    /// The fact-checker holds more trust
    Player,
    /// The disinformation actor holds more trust
    Ai,
    /// Averages are equal
    Tied,
}

impl Standing {
    #[must_use]
    pub const fn leader(self) -> Option<Actor> {
        match self {
            Self::Player => Some(Actor::Player),
            Self::Ai => Some(Actor::Ai),
            Self::Tied => None,
        }
    }
}

impl std::fmt::Display for Standing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Standing::Player => write!(f, "player"),
            Standing::Ai => write!(f, "ai"),
            Standing::Tied => write!(f, "tied"),
        }
    }
}

/// Summary of a session for display once it ends (or at any point before).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub end_reason: Option<EndReason>,
    pub rounds_completed: u32,
    pub actions: usize,
    pub platforms: Vec<PlatformView>,
    pub average_player_trust: f64,
    pub average_ai_trust: f64,
    pub average_spread: f64,
    pub standing: Standing,
    /// Sum of judged reach per actor.
    pub player_reach: u64,
    pub ai_reach: u64,
    /// Distinct tool effects each actor spent.
    pub player_tools_applied: usize,
    pub ai_tools_applied: usize,
}

impl ResultSummary {
    #[must_use]
    pub fn from_session(session: &GameSession) -> Self {
        let snapshot = session.snapshot();
        let platforms: Vec<PlatformView> = snapshot
            .ledger
            .latest_all()
            .into_iter()
            .map(|(platform, state)| PlatformView { platform, state })
            .collect();

        let average = |pick: fn(&PlatformView) -> u8| -> f64 {
            if platforms.is_empty() {
                return 0.0;
            }
            let total: i64 = platforms.iter().map(|view| i64::from(pick(view))).sum();
            let count = i64::try_from(platforms.len()).unwrap_or(i64::MAX);
            i64_to_f64(total) / i64_to_f64(count)
        };
        let average_player_trust = average(|view| view.state.player_trust);
        let average_ai_trust = average(|view| view.state.ai_trust);
        let average_spread = average(|view| view.state.spread_rate);

        let standing = match average_player_trust.partial_cmp(&average_ai_trust) {
            Some(std::cmp::Ordering::Greater) => Standing::Player,
            Some(std::cmp::Ordering::Less) => Standing::Ai,
            _ => Standing::Tied,
        };

        let reach_of = |actor: Actor| -> u64 {
            snapshot
                .records
                .iter()
                .filter(|record| record.actor() == actor)
                .fold(0_u64, |acc, record| acc.saturating_add(record.reach))
        };
        let tools_of = |actor: Actor| -> usize {
            snapshot
                .applied_tools
                .iter()
                .filter(|applied| applied.actor == actor)
                .count()
        };

        Self {
            session_id: snapshot.id.clone(),
            status: session.status(),
            end_reason: session.scheduler().end_reason().cloned(),
            rounds_completed: session.scheduler().completed_rounds(),
            actions: snapshot.records.len(),
            platforms,
            average_player_trust,
            average_ai_trust,
            average_spread,
            standing,
            player_reach: reach_of(Actor::Player),
            ai_reach: reach_of(Actor::Ai),
            player_tools_applied: tools_of(Actor::Player),
            ai_tools_applied: tools_of(Actor::Ai),
        }
    }

    /// One-line headline for reports.
    #[must_use]
    pub fn headline(&self) -> String {
        let reason = match &self.end_reason {
            Some(EndReason::RoundLimit { rounds }) => format!("round limit after {rounds}"),
            Some(EndReason::TrustCollapse { actor, platform }) => {
                format!("{actor} trust collapsed on {platform}")
            }
            Some(EndReason::TrustDominance { actor, platform }) => {
                format!("{actor} dominated {platform}")
            }
            Some(EndReason::Abandoned) => "abandoned".to_string(),
            None => "in progress".to_string(),
        };
        format!(
            "{} ({reason}): player {:.1} vs ai {:.1}",
            self.standing, self.average_player_trust, self.average_ai_trust
        )
    }
}
