use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use truthfront_game::{ActionRequest, Actor, StateView};

/// Policy interface for automated play.
pub trait SessionPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Build the move for whichever actor the session is waiting on.
    fn next_move(&mut self, actor: Actor, view: &StateView) -> ActionRequest;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    /// Random platforms, mixed reactions, occasional tools
    Balanced,
    /// Player always amplifies
    Amplifier,
    /// Player always clarifies with every tool it can use
    FactChecker,
    /// Both sides attach every unlocked tool on every move
    ToolHeavy,
}

impl GameplayStrategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Balanced => "Balanced",
            GameplayStrategy::Amplifier => "Amplifier",
            GameplayStrategy::FactChecker => "Fact Checker",
            GameplayStrategy::ToolHeavy => "Tool Heavy",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn SessionPolicy + Send> {
        Box::new(ScriptedPolicy {
            strategy: self,
            rng: ChaCha20Rng::seed_from_u64(seed),
        })
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct ScriptedPolicy {
    strategy: GameplayStrategy,
    rng: ChaCha20Rng,
}

impl ScriptedPolicy {
    fn pick_platform(&mut self, view: &StateView) -> String {
        view.platforms
            .choose(&mut self.rng)
            .map(|platform| platform.platform.name.clone())
            .unwrap_or_default()
    }

    fn pick_tools(&mut self, view: &StateView) -> Vec<String> {
        match self.strategy {
            GameplayStrategy::ToolHeavy => view.available_tools.clone(),
            GameplayStrategy::Balanced | GameplayStrategy::Amplifier => view
                .available_tools
                .choose(&mut self.rng)
                .filter(|_| self.rng.gen_bool(0.4))
                .cloned()
                .into_iter()
                .collect(),
            GameplayStrategy::FactChecker => Vec::new(),
        }
    }

    fn player_reaction(&mut self) -> &'static str {
        match self.strategy {
            GameplayStrategy::Amplifier => "amplify",
            GameplayStrategy::FactChecker | GameplayStrategy::ToolHeavy => "clarify",
            GameplayStrategy::Balanced => ["clarify", "ignore", "amplify"]
                .choose(&mut self.rng)
                .copied()
                .unwrap_or("clarify"),
        }
    }
}

impl SessionPolicy for ScriptedPolicy {
    fn name(&self) -> &'static str {
        self.strategy.label()
    }

    fn next_move(&mut self, actor: Actor, view: &StateView) -> ActionRequest {
        let platform = self.pick_platform(view);
        let mut tools = self.pick_tools(view);
        let request = match actor {
            Actor::Ai => {
                let headline = view
                    .news
                    .as_ref()
                    .map_or_else(|| "Breaking".to_string(), |news| news.title.clone());
                ActionRequest::ai(&platform, &format!("Shocking: {headline}"))
                    .with_title(&headline)
            }
            Actor::Player => {
                if self.strategy == GameplayStrategy::FactChecker {
                    tools.clone_from(&view.available_tools);
                }
                let reaction = self.player_reaction();
                ActionRequest::player(&platform, "Here is what the record shows.", reaction)
            }
        };
        ActionRequest { tools, ..request }
    }
}
