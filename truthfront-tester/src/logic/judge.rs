use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::convert::Infallible;

use truthfront_game::{
    Effectiveness, Judgement, JudgementProvider, JudgementRequest, derive_stream_seed,
};

const COMMENTS: [&str; 6] = [
    "Is there a source for this?",
    "Sharing with my family group.",
    "This was debunked last week.",
    "Finally someone says it!",
    "Reported as misleading.",
    "Can anyone confirm?",
];

/// Deterministic stand-in for the external judgement service.
///
/// Every judgement is derived from the session seed and the action's round,
/// actor, and platform, so replaying a seed replays every judgement.
#[derive(Debug, Clone, Copy)]
pub struct SeededJudge {
    seed: u64,
    scale: i64,
}

impl SeededJudge {
    #[must_use]
    pub const fn new(seed: u64, scale: i64) -> Self {
        Self { seed, scale }
    }

    #[must_use]
    pub fn judgement_for(&self, round: u32, actor: &str, platform: &str) -> Judgement {
        let tag = format!("judge:{round}:{actor}:{platform}");
        let mut rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(self.seed, tag.as_bytes()));
        let scale = self.scale.max(1);
        let trust = rng.gen_range(-scale..=scale);
        let spread = rng.gen_range(-(scale / 2)..=scale);
        let effectiveness = match trust.unsigned_abs() * 3 / scale.unsigned_abs() {
            0 => Effectiveness::Low,
            1 => Effectiveness::Medium,
            _ => Effectiveness::High,
        };
        let comments = (0..rng.gen_range(0..3))
            .map(|_| COMMENTS[rng.gen_range(0..COMMENTS.len())].to_string())
            .collect();
        Judgement::new(rng.gen_range(0..2_000), trust, spread, effectiveness).with_comments(comments)
    }
}

impl JudgementProvider for SeededJudge {
    type Error = Infallible;

    fn judge(&self, request: &JudgementRequest<'_>) -> Result<Judgement, Self::Error> {
        let action = request.action;
        Ok(self.judgement_for(action.round, action.actor.as_str(), &action.platform))
    }
}
