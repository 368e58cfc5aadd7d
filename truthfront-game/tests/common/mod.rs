#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

use truthfront_game::{
    ContentGenerator, Effectiveness, GameEngine, Judgement, JudgementProvider, JudgementRequest,
    MemoryRepository, News, NewsDeck, Platform, SessionConfig, ToolEffectRegistry, Veracity,
};

#[derive(Debug, Error)]
#[error("judge offline")]
pub struct JudgeOffline;

/// Judge that replays queued judgements and falls back to a fixed one.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    queue: Mutex<VecDeque<Judgement>>,
    calls: Mutex<usize>,
    offline: Mutex<bool>,
}

impl ScriptedJudge {
    pub fn push(&self, judgement: Judgement) {
        self.queue.lock().push_back(judgement);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }
}

impl JudgementProvider for ScriptedJudge {
    type Error = JudgeOffline;

    fn judge(&self, _request: &JudgementRequest<'_>) -> Result<Judgement, Self::Error> {
        if *self.offline.lock() {
            return Err(JudgeOffline);
        }
        *self.calls.lock() += 1;
        Ok(self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Judgement::new(10, 1, 1, Effectiveness::Low)))
    }
}

#[derive(Debug, Error)]
#[error("newsroom closed")]
pub struct NewsroomClosed;

/// Content generator that can be switched off mid-session.
#[derive(Debug)]
pub struct SwitchableNews {
    deck: NewsDeck,
    closed: Mutex<bool>,
}

impl SwitchableNews {
    pub fn new(seed: u64) -> Self {
        Self {
            deck: NewsDeck::with_default_deck(seed),
            closed: Mutex::new(false),
        }
    }

    pub fn close(&self, closed: bool) {
        *self.closed.lock() = closed;
    }
}

impl ContentGenerator for SwitchableNews {
    type Error = NewsroomClosed;

    fn next_news(&self, category: Option<&str>) -> Result<News, Self::Error> {
        if *self.closed.lock() {
            return Err(NewsroomClosed);
        }
        self.deck.draw(category).map_err(|_| NewsroomClosed)
    }
}

pub type TestEngine = GameEngine<Arc<SwitchableNews>, Arc<ScriptedJudge>, MemoryRepository>;

pub struct Harness {
    pub engine: TestEngine,
    pub judge: Arc<ScriptedJudge>,
    pub news: Arc<SwitchableNews>,
}

pub fn harness(seed: u64) -> Harness {
    let judge = Arc::new(ScriptedJudge::default());
    let news = Arc::new(SwitchableNews::new(seed));
    let engine = GameEngine::new(
        Arc::clone(&news),
        Arc::clone(&judge),
        MemoryRepository::new(),
        Arc::new(ToolEffectRegistry::default_catalog()),
    );
    Harness {
        engine,
        judge,
        news,
    }
}

pub fn trio_config(seed: u64) -> SessionConfig {
    SessionConfig::seeded(seed).with_platforms(vec![
        Platform::new("Facebook", "年輕族群"),
        Platform::new("Instagram", "中年族群"),
        Platform::new("Thread", "老年族群"),
    ])
}

pub fn headline() -> News {
    News::new("Miracle cure", "A post claims lemon water cures flu.", Veracity::False)
}
