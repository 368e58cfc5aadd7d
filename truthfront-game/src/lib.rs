//! Truthfront Game Engine
//!
//! Platform-agnostic core rules for Truthfront, a trust contest between an
//! automated disinformation actor and a human fact-checker across social
//! platforms. This crate owns the round/turn state machine and score
//! resolution; news, judgements, and storage are injected collaborators.

pub mod action;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod news;
pub mod numbers;
pub mod resolver;
pub mod result;
pub mod scheduler;
pub mod seed;
pub mod session;
pub mod state;
pub mod tools;

// Re-export commonly used types
pub use action::{
    Action, ActionRecord, ActionResult, Judgement, Resolution, ToolOutcome, ToolUsage,
    ToolUsageList,
};
pub use config::{EndConditions, ScoringPolicy, SessionConfig};
pub use engine::{
    ActionRequest, ContentGenerator, GameEngine, JudgementProvider, JudgementRequest, Repository,
};
pub use error::{ConfigError, EngineError, RuleError, ValidationError};
pub use ledger::PlatformLedger;
pub use memory::MemoryRepository;
pub use news::{News, NewsData, NewsDeck, NewsError, Veracity};
pub use resolver::{AppliedTool, AppliedTools, ResolveContext, attribute, resolve_action};
pub use result::{ResultSummary, Standing};
pub use scheduler::RoundScheduler;
pub use seed::{derive_stream_seed, session_id_for};
pub use session::{GameSession, PlatformView, SessionState, StagedTools, StateView};
pub use state::{
    Actor, Effectiveness, EndReason, Platform, PlatformState, ReactionMode, Round, SessionId,
    SessionStatus, StateDelta, TurnState,
};
pub use tools::{Applicability, Tool, ToolEffect, ToolEffectRegistry};
