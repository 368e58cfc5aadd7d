//! Tool catalog: base trust/spread effects and which actors may use them.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::TOOL_FIRST_ROUND;
use crate::error::{ConfigError, RuleError};
use crate::state::Actor;

/// Which actors a tool is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Applicability {
    Player,
    Ai,
    Both,
}

impl Applicability {
    #[must_use]
    pub const fn admits(self, actor: Actor) -> bool {
        match self {
            Self::Both => true,
            Self::Player => matches!(actor, Actor::Player),
            Self::Ai => matches!(actor, Actor::Ai),
        }
    }
}

/// Static catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub trust_effect: i32,
    #[serde(default)]
    pub spread_effect: i32,
    pub applicable_to: Applicability,
    #[serde(default = "default_available_from_round")]
    pub available_from_round: u32,
    #[serde(default)]
    pub description: String,
}

const fn default_available_from_round() -> u32 {
    TOOL_FIRST_ROUND
}

impl Tool {
    #[must_use]
    pub fn new(
        name: &str,
        trust_effect: i32,
        spread_effect: i32,
        applicable_to: Applicability,
    ) -> Self {
        Self {
            name: name.to_string(),
            trust_effect,
            spread_effect,
            applicable_to,
            available_from_round: TOOL_FIRST_ROUND,
            description: String::new(),
        }
    }

    #[must_use]
    pub const fn unlocked_from(mut self, round: u32) -> Self {
        self.available_from_round = round;
        self
    }

    #[must_use]
    pub fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Whether the tool is unlocked in the given round.
    #[must_use]
    pub const fn unlocked_in(&self, round: u32) -> bool {
        round >= self.available_from_round
    }
}

/// Resolved lookup result. Unknown names resolve to a zero effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolEffect {
    pub trust_effect: i32,
    pub spread_effect: i32,
    pub applicable_to: Applicability,
    pub available_from_round: u32,
    pub known: bool,
}

impl ToolEffect {
    const UNKNOWN: Self = Self {
        trust_effect: 0,
        spread_effect: 0,
        applicable_to: Applicability::Both,
        available_from_round: TOOL_FIRST_ROUND,
        known: false,
    };
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    tools: Vec<Tool>,
}

/// Read-only table mapping tool names to their base effects.
#[derive(Debug, Clone, Default)]
pub struct ToolEffectRegistry {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolEffectRegistry {
    /// Build a registry, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateTool`] when a name appears twice.
    pub fn new(tools: Vec<Tool>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (position, tool) in tools.iter().enumerate() {
            if index.insert(tool.name.clone(), position).is_some() {
                return Err(ConfigError::DuplicateTool(tool.name.clone()));
            }
        }
        Ok(Self { tools, index })
    }

    /// Load a catalog from JSON shaped as `{ "tools": [...] }`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Catalog`] for malformed JSON and
    /// [`ConfigError::DuplicateTool`] for repeated names.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|err| ConfigError::Catalog(err.to_string()))?;
        Self::new(file.tools)
    }

    /// The built-in catalog.
    #[must_use]
    pub fn default_catalog() -> Self {
        let tools = vec![
            Tool::new("Podcast", 5, 0, Applicability::Player)
                .described("Long-form explainer that rebuilds audience trust."),
            Tool::new("AI", 2, 0, Applicability::Player)
                .described("Assistant-drafted rebuttal."),
            Tool::new("AgeRadar", 0, 0, Applicability::Player)
                .described("Reveals which audience segment is reacting."),
            Tool::new("NewsLink", 0, 0, Applicability::Player)
                .described("Attaches a link to the original report."),
            Tool::new("Fact Check", 4, -6, Applicability::Player)
                .described("Third-party verification that slows sharing."),
            Tool::new("情緒刺激", 0, 10, Applicability::Ai)
                .described("Emotionally charged framing that boosts sharing."),
            Tool::new("Bot Swarm", 0, 8, Applicability::Ai)
                .unlocked_from(2)
                .described("Coordinated accounts reposting the claim."),
            Tool::new("Deepfake", -2, 12, Applicability::Ai)
                .unlocked_from(3)
                .described("Fabricated media; spreads fast but costs credibility."),
        ];
        let index: HashMap<String, usize> = tools
            .iter()
            .enumerate()
            .map(|(position, tool)| (tool.name.clone(), position))
            .collect();
        debug_assert_eq!(index.len(), tools.len(), "duplicate name in built-in catalog");
        Self { tools, index }
    }

    /// Exact-match lookup degrading to a zero effect for unknown names.
    #[must_use]
    pub fn effect_for(&self, name: &str) -> ToolEffect {
        self.get(name).map_or(ToolEffect::UNKNOWN, |tool| ToolEffect {
            trust_effect: tool.trust_effect,
            spread_effect: tool.spread_effect,
            applicable_to: tool.applicable_to,
            available_from_round: tool.available_from_round,
            known: true,
        })
    }

    /// Strict lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownTool`] when the name is not catalogued.
    pub fn lookup(&self, name: &str) -> Result<&Tool, RuleError> {
        self.get(name)
            .ok_or_else(|| RuleError::UnknownTool(name.to_string()))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).and_then(|&i| self.tools.get(i))
    }

    /// Tools the actor may use in the given round, in catalog order.
    #[must_use]
    pub fn available_for(&self, actor: Actor, round: u32) -> Vec<&Tool> {
        self.tools
            .iter()
            .filter(|tool| tool.applicable_to.admits(actor) && tool.unlocked_in(round))
            .collect()
    }

    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tools_degrade_to_zero_effect() {
        let registry = ToolEffectRegistry::default_catalog();
        let effect = registry.effect_for("Mind Control");
        assert!(!effect.known);
        assert_eq!((effect.trust_effect, effect.spread_effect), (0, 0));
        assert_eq!(
            registry.lookup("Mind Control"),
            Err(RuleError::UnknownTool("Mind Control".to_string()))
        );
    }

    #[test]
    fn built_in_catalog_passes_validation() {
        let registry = ToolEffectRegistry::default_catalog();
        assert_eq!(registry.len(), 8);
        let rebuilt = ToolEffectRegistry::new(registry.tools().to_vec()).unwrap();
        assert_eq!(rebuilt.tools(), registry.tools());
        for tool in registry.tools() {
            assert_eq!(registry.get(&tool.name), Some(tool));
        }
    }

    #[test]
    fn lookup_is_exact_match() {
        let registry = ToolEffectRegistry::default_catalog();
        assert!(registry.effect_for("Podcast").known);
        assert!(!registry.effect_for("podcast").known);
        let effect = registry.effect_for("情緒刺激");
        assert_eq!((effect.trust_effect, effect.spread_effect), (0, 10));
        assert_eq!(effect.applicable_to, Applicability::Ai);
    }

    #[test]
    fn availability_respects_actor_and_unlock_round() {
        let registry = ToolEffectRegistry::default_catalog();
        let names = |actor, round| {
            registry
                .available_for(actor, round)
                .into_iter()
                .map(|tool| tool.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Actor::Ai, 1), vec!["情緒刺激"]);
        assert_eq!(names(Actor::Ai, 3), vec!["情緒刺激", "Bot Swarm", "Deepfake"]);
        assert!(names(Actor::Player, 1).contains(&"Podcast"));
        assert!(!names(Actor::Player, 5).contains(&"Deepfake"));
    }

    #[test]
    fn catalog_from_json_applies_defaults_and_rejects_duplicates() {
        let json = r#"{ "tools": [
            { "name": "Rumor Mill", "spread_effect": 4, "applicable_to": "ai" },
            { "name": "Hotline", "trust_effect": 3, "applicable_to": "both", "available_from_round": 2 }
        ] }"#;
        let registry = ToolEffectRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 2);
        let rumor = registry.get("Rumor Mill").unwrap();
        assert_eq!(rumor.trust_effect, 0);
        assert_eq!(rumor.available_from_round, 1);
        assert!(registry.get("Hotline").unwrap().applicable_to.admits(Actor::Ai));

        let dup = r#"{ "tools": [
            { "name": "X", "applicable_to": "ai" },
            { "name": "X", "applicable_to": "player" }
        ] }"#;
        assert_eq!(
            ToolEffectRegistry::from_json(dup).unwrap_err(),
            ConfigError::DuplicateTool("X".to_string())
        );
        assert!(matches!(
            ToolEffectRegistry::from_json("not json"),
            Err(ConfigError::Catalog(_))
        ));
    }
}
