//! Centralized balance and tuning constants for Truthfront game logic.
//!
//! These values define the deterministic math for the core rules. Keeping
//! them together ensures that scoring can only be adjusted via code changes
//! reviewed in version control.

// Event log keys -----------------------------------------------------------
pub(crate) const LOG_SESSION_STARTED: &str = "log.session.started";
pub(crate) const LOG_SESSION_COMPLETED: &str = "log.session.completed";
pub(crate) const LOG_SESSION_ABORTED: &str = "log.session.aborted";
pub(crate) const LOG_ROUND_OPENED: &str = "log.round.opened";
pub(crate) const LOG_ROUND_COMPLETED: &str = "log.round.completed";
pub(crate) const LOG_ACTION_RESOLVED_PREFIX: &str = "log.action.resolved.";
pub(crate) const LOG_TOOL_APPLIED_PREFIX: &str = "log.tool.applied.";
pub(crate) const LOG_TOOL_REPEAT_PREFIX: &str = "log.tool.repeat.";
pub(crate) const LOG_TOOL_IGNORED_PREFIX: &str = "log.tool.ignored.";
pub(crate) const LOG_TOOL_STAGED_PREFIX: &str = "log.tool.staged.";
pub(crate) const LOG_TOOLS_DISCARDED_PREFIX: &str = "log.tools.discarded.";

// Score bounds -------------------------------------------------------------
pub(crate) const SCORE_MIN: u8 = 0;
pub(crate) const SCORE_MAX: u8 = 100;

// Session defaults ---------------------------------------------------------
pub(crate) const DEFAULT_INITIAL_TRUST: u8 = 50;
pub(crate) const DEFAULT_INITIAL_SPREAD: u8 = 0;
pub(crate) const DEFAULT_AMPLIFY_RATIO: f32 = 1.5;
pub(crate) const DEFAULT_COLLAPSE_THRESHOLD: u8 = 0;
pub(crate) const DEFAULT_DOMINANCE_THRESHOLD: u8 = 100;
pub(crate) const DEFAULT_PLATFORM_NAMES: [&str; 3] = ["Facebook", "Instagram", "Thread"];
pub(crate) const DEFAULT_AUDIENCES: [&str; 3] = ["年輕族群", "中年族群", "老年族群"];
pub(crate) const SESSION_ID_PREFIX: &str = "game_";

// Tool catalog -------------------------------------------------------------
pub(crate) const TOOL_FIRST_ROUND: u32 = 1;
