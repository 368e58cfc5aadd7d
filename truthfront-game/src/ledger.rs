//! Append-only per-platform trust and spread history.
//!
//! The ledger never edits a recorded snapshot. Each `apply` appends exactly
//! one new row for exactly one platform, clamping every field independently
//! into `[0, 100]`.
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::numbers::saturating_score;
use crate::state::{Actor, Platform, PlatformState, StateDelta};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PlatformHistory {
    platform: Platform,
    snapshots: Vec<PlatformState>,
}

/// Per-platform state history for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformLedger {
    initial: PlatformState,
    entries: Vec<PlatformHistory>,
}

impl PlatformLedger {
    /// Ledger for `platforms` with every platform starting at `initial`.
    #[must_use]
    pub fn new(platforms: &[Platform], initial: PlatformState) -> Self {
        let entries = platforms
            .iter()
            .map(|platform| PlatformHistory {
                platform: platform.clone(),
                snapshots: Vec::new(),
            })
            .collect();
        Self { initial, entries }
    }

    /// Platforms in session order.
    pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
        self.entries.iter().map(|entry| &entry.platform)
    }

    #[must_use]
    pub fn platform(&self, name: &str) -> Option<&Platform> {
        self.entry(name).map(|entry| &entry.platform)
    }

    /// Latest snapshot for a platform, or the initial values if none resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownPlatform`] for names outside the session.
    pub fn current(&self, platform: &str) -> Result<PlatformState, ValidationError> {
        let entry = self
            .entry(platform)
            .ok_or_else(|| ValidationError::UnknownPlatform(platform.to_string()))?;
        Ok(entry.snapshots.last().copied().unwrap_or(self.initial))
    }

    /// Append the snapshot produced by `delta`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownPlatform`] for names outside the session.
    pub fn apply(
        &mut self,
        platform: &str,
        round: u32,
        delta: StateDelta,
    ) -> Result<PlatformState, ValidationError> {
        let initial = self.initial;
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.platform.name == platform)
            .ok_or_else(|| ValidationError::UnknownPlatform(platform.to_string()))?;
        let previous = entry.snapshots.last().copied().unwrap_or(initial);
        let next = PlatformState {
            round,
            player_trust: saturating_score(previous.player_trust, delta.player_trust),
            ai_trust: saturating_score(previous.ai_trust, delta.ai_trust),
            spread_rate: saturating_score(previous.spread_rate, delta.spread),
        };
        entry.snapshots.push(next);
        Ok(next)
    }

    /// Single-actor form: `trust` goes to `actor`, `spread` to the platform.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownPlatform`] for names outside the session.
    pub fn apply_for(
        &mut self,
        platform: &str,
        round: u32,
        actor: Actor,
        trust: i64,
        spread: i64,
    ) -> Result<PlatformState, ValidationError> {
        self.apply(platform, round, StateDelta::for_actor(actor, trust, spread))
    }

    /// Every snapshot recorded for a platform, oldest first.
    #[must_use]
    pub fn history(&self, platform: &str) -> &[PlatformState] {
        self.entry(platform)
            .map_or(&[][..], |entry| entry.snapshots.as_slice())
    }

    /// Latest state of every platform in session order.
    #[must_use]
    pub fn latest_all(&self) -> Vec<(Platform, PlatformState)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.platform.clone(),
                    entry.snapshots.last().copied().unwrap_or(self.initial),
                )
            })
            .collect()
    }

    /// Total number of snapshots recorded across all platforms.
    #[must_use]
    pub fn total_snapshots(&self) -> usize {
        self.entries.iter().map(|entry| entry.snapshots.len()).sum()
    }

    /// Iterate every snapshot, including the implicit initial one per platform.
    pub fn all_snapshots(&self) -> impl Iterator<Item = &PlatformState> {
        self.entries
            .iter()
            .flat_map(|entry| std::iter::once(&self.initial).chain(entry.snapshots.iter()))
    }

    #[must_use]
    pub const fn initial(&self) -> PlatformState {
        self.initial
    }

    fn entry(&self, name: &str) -> Option<&PlatformHistory> {
        self.entries.iter().find(|entry| entry.platform.name == name)
    }
}
