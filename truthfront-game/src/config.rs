//! Session configuration and its validation.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{
    DEFAULT_AMPLIFY_RATIO, DEFAULT_AUDIENCES, DEFAULT_COLLAPSE_THRESHOLD,
    DEFAULT_DOMINANCE_THRESHOLD, DEFAULT_INITIAL_SPREAD, DEFAULT_INITIAL_TRUST,
    DEFAULT_PLATFORM_NAMES, SCORE_MAX,
};
use crate::error::ConfigError;
use crate::seed::shuffle_with_seed;
use crate::state::{Platform, PlatformState};

/// Numeric policy applied by the action resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Multiplier on the AI's share of an amplify reaction; must exceed 1.0
    /// so the AI gains strictly more than the player.
    #[serde(default = "ScoringPolicy::default_amplify_ratio")]
    pub amplify_ratio: f32,
}

impl ScoringPolicy {
    const fn default_amplify_ratio() -> f32 {
        DEFAULT_AMPLIFY_RATIO
    }

    /// Validate the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AmplifyRatio`] when the ratio is not a finite
    /// value above 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.amplify_ratio.is_finite() || self.amplify_ratio <= 1.0 {
            return Err(ConfigError::AmplifyRatio(self.amplify_ratio));
        }
        Ok(())
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            amplify_ratio: Self::default_amplify_ratio(),
        }
    }
}

/// Conditions under which the scheduler ends a session after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndConditions {
    /// Maximum number of rounds; open-ended when absent.
    #[serde(default)]
    pub round_limit: Option<u32>,
    /// A trust at or below this value on any platform ends the session.
    #[serde(default = "EndConditions::default_collapse")]
    pub collapse_threshold: Option<u8>,
    /// A trust at or above this value on any platform ends the session.
    #[serde(default = "EndConditions::default_dominance")]
    pub dominance_threshold: Option<u8>,
}

impl EndConditions {
    #[allow(clippy::unnecessary_wraps)]
    const fn default_collapse() -> Option<u8> {
        Some(DEFAULT_COLLAPSE_THRESHOLD)
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_dominance() -> Option<u8> {
        Some(DEFAULT_DOMINANCE_THRESHOLD)
    }

    /// No automatic end beyond an optional round limit.
    #[must_use]
    pub const fn open_ended() -> Self {
        Self {
            round_limit: None,
            collapse_threshold: None,
            dominance_threshold: None,
        }
    }

    /// Validate thresholds and the round limit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero round limit, thresholds above 100,
    /// or a collapse threshold not below the dominance threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_limit == Some(0) {
            return Err(ConfigError::RoundLimit);
        }
        for (field, value) in [
            ("collapse_threshold", self.collapse_threshold),
            ("dominance_threshold", self.dominance_threshold),
        ] {
            if let Some(value) = value {
                check_score(field, value)?;
            }
        }
        if let (Some(collapse), Some(dominance)) = (self.collapse_threshold, self.dominance_threshold)
            && collapse >= dominance
        {
            return Err(ConfigError::ThresholdOrder {
                collapse,
                dominance,
            });
        }
        Ok(())
    }
}

impl Default for EndConditions {
    fn default() -> Self {
        Self {
            round_limit: None,
            collapse_threshold: Self::default_collapse(),
            dominance_threshold: Self::default_dominance(),
        }
    }
}

/// Everything needed to start a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_trust")]
    pub player_initial_trust: u8,
    #[serde(default = "SessionConfig::default_trust")]
    pub ai_initial_trust: u8,
    #[serde(default = "SessionConfig::default_spread")]
    pub initial_spread: u8,
    /// Explicit platforms; when empty the default trio is used with
    /// audiences shuffled by the session seed.
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub end: EndConditions,
    #[serde(default)]
    pub scoring: ScoringPolicy,
    /// Category passed to the content generator for every round.
    #[serde(default)]
    pub news_category: Option<String>,
    #[serde(default)]
    pub seed: u64,
}

impl SessionConfig {
    const fn default_trust() -> u8 {
        DEFAULT_INITIAL_TRUST
    }

    const fn default_spread() -> u8 {
        DEFAULT_INITIAL_SPREAD
    }

    /// Default configuration with the given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_round_limit(mut self, rounds: u32) -> Self {
        self.end.round_limit = Some(rounds);
        self
    }

    #[must_use]
    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Load configuration from JSON, filling defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_score("player_initial_trust", self.player_initial_trust)?;
        check_score("ai_initial_trust", self.ai_initial_trust)?;
        check_score("initial_spread", self.initial_spread)?;
        self.end.validate()?;
        self.scoring.validate()?;
        let mut seen = HashSet::new();
        for platform in &self.platforms {
            if platform.name.trim().is_empty() {
                return Err(ConfigError::EmptyPlatformName);
            }
            if !seen.insert(platform.name.as_str()) {
                return Err(ConfigError::DuplicatePlatform(platform.name.clone()));
            }
        }
        Ok(())
    }

    /// Platforms for the session, generating the default set when none given.
    #[must_use]
    pub fn resolve_platforms(&self) -> Vec<Platform> {
        if !self.platforms.is_empty() {
            return self.platforms.clone();
        }
        let mut audiences = DEFAULT_AUDIENCES.to_vec();
        shuffle_with_seed(&mut audiences, self.seed, b"audience");
        DEFAULT_PLATFORM_NAMES
            .iter()
            .zip(audiences)
            .map(|(name, audience)| Platform::new(*name, audience))
            .collect()
    }

    /// Snapshot every platform starts from.
    #[must_use]
    pub const fn initial_state(&self) -> PlatformState {
        PlatformState::initial(
            self.player_initial_trust,
            self.ai_initial_trust,
            self.initial_spread,
        )
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_initial_trust: DEFAULT_INITIAL_TRUST,
            ai_initial_trust: DEFAULT_INITIAL_TRUST,
            initial_spread: DEFAULT_INITIAL_SPREAD,
            platforms: Vec::new(),
            end: EndConditions::default(),
            scoring: ScoringPolicy::default(),
            news_category: None,
            seed: 0,
        }
    }
}

const fn check_score(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if value > SCORE_MAX {
        return Err(ConfigError::ScoreOutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.player_initial_trust, 50);
        assert_eq!(cfg.ai_initial_trust, 50);
        assert_eq!(cfg.initial_spread, 0);
        assert_eq!(cfg.end.round_limit, None);
        assert!((cfg.scoring.amplify_ratio - 1.5).abs() < f32::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn json_fills_missing_fields() {
        let cfg = SessionConfig::from_json(r#"{ "ai_initial_trust": 60, "end": { "round_limit": 5 } }"#)
            .unwrap();
        assert_eq!(cfg.ai_initial_trust, 60);
        assert_eq!(cfg.player_initial_trust, 50);
        assert_eq!(cfg.end.round_limit, Some(5));
        assert_eq!(cfg.end.collapse_threshold, Some(0));
        assert_eq!(cfg.end.dominance_threshold, Some(100));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut cfg = SessionConfig::default();
        cfg.player_initial_trust = 101;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ScoreOutOfRange {
                field: "player_initial_trust",
                value: 101
            })
        );

        let mut cfg = SessionConfig::default();
        cfg.scoring.amplify_ratio = 1.0;
        assert_eq!(cfg.validate(), Err(ConfigError::AmplifyRatio(1.0)));

        let cfg = SessionConfig::default().with_round_limit(0);
        assert_eq!(cfg.validate(), Err(ConfigError::RoundLimit));

        let mut cfg = SessionConfig::default();
        cfg.end.collapse_threshold = Some(60);
        cfg.end.dominance_threshold = Some(40);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));

        let cfg = SessionConfig::default().with_platforms(vec![
            Platform::new("Facebook", "a"),
            Platform::new("Facebook", "b"),
        ]);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicatePlatform("Facebook".to_string()))
        );
    }

    #[test]
    fn default_platforms_shuffle_audiences_per_seed() {
        let a = SessionConfig::seeded(5).resolve_platforms();
        let b = SessionConfig::seeded(5).resolve_platforms();
        assert_eq!(a, b);
        let names: Vec<_> = a.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Facebook", "Instagram", "Thread"]);
        let mut audiences: Vec<_> = a.iter().map(|p| p.audience.clone()).collect();
        audiences.sort();
        let mut expected: Vec<_> = DEFAULT_AUDIENCES.iter().map(ToString::to_string).collect();
        expected.sort();
        assert_eq!(audiences, expected);
    }

    #[test]
    fn explicit_platforms_are_kept() {
        let platforms = vec![Platform::new("Forum", "hobbyists")];
        let cfg = SessionConfig::default().with_platforms(platforms.clone());
        assert_eq!(cfg.resolve_platforms(), platforms);
    }
}
