use proptest::prelude::*;
use std::sync::Arc;

use truthfront_game::{
    Actor, Effectiveness, EndConditions, GameSession, Judgement, News, Platform, PlatformLedger,
    PlatformState, ReactionMode, SessionConfig, StateDelta, ToolEffectRegistry, TurnState,
    Veracity,
};

const PLATFORMS: [&str; 3] = ["Facebook", "Instagram", "Thread"];
const PLAYER_REACTIONS: [ReactionMode; 3] = [
    ReactionMode::Clarify,
    ReactionMode::Ignore,
    ReactionMode::Amplify,
];
const TOOLS: [&str; 5] = ["Podcast", "情緒刺激", "Bot Swarm", "Deepfake", "Unlisted"];

fn expected(previous: u8, delta: i64) -> u8 {
    let value = i64::from(previous).saturating_add(delta).clamp(0, 100);
    u8::try_from(value).unwrap()
}

fn session(seed: u64) -> GameSession {
    let mut config = SessionConfig::seeded(seed)
        .with_platforms(PLATFORMS.iter().map(|name| Platform::new(*name, "all")).collect());
    config.end = EndConditions::open_ended();
    GameSession::start(
        "game_prop",
        config,
        News::new("t", "b", Veracity::Partial),
        Arc::new(ToolEffectRegistry::default_catalog()),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn ledger_clamps_every_field_independently(
        deltas in prop::collection::vec((any::<i64>(), any::<i64>(), any::<i64>()), 1..40),
    ) {
        let platforms = [Platform::new("Facebook", "all")];
        let mut ledger = PlatformLedger::new(&platforms, PlatformState::initial(50, 50, 0));
        let mut previous = ledger.current("Facebook").unwrap();
        for (round, (player, ai, spread)) in (1_u32..).zip(deltas) {
            let next = ledger
                .apply("Facebook", round, StateDelta { player_trust: player, ai_trust: ai, spread })
                .unwrap();
            prop_assert!(next.is_bounded());
            prop_assert_eq!(next.player_trust, expected(previous.player_trust, player));
            prop_assert_eq!(next.ai_trust, expected(previous.ai_trust, ai));
            prop_assert_eq!(next.spread_rate, expected(previous.spread_rate, spread));
            previous = next;
        }
        prop_assert_eq!(ledger.history("Facebook").len(), ledger.total_snapshots());
    }

    #[test]
    fn random_sessions_keep_history_consistent(
        seed in any::<u64>(),
        moves in prop::collection::vec(
            (0_usize..3, -250_i64..250, -250_i64..250, 0_usize..3, prop::option::of(0_usize..5)),
            1..40,
        ),
    ) {
        let mut session = session(seed);
        let mut snapshots = 0_usize;
        for (platform, trust, spread, reaction, tool) in moves {
            if session.needs_news() {
                let before = session.current_round();
                let opened = session
                    .open_next_round(News::new("next", "b", Veracity::True))
                    .unwrap();
                prop_assert!(opened > before);
            }
            let actor = session.turn_state().expected_actor().unwrap();
            let mode = match actor {
                Actor::Ai => ReactionMode::Publish,
                Actor::Player => PLAYER_REACTIONS[reaction],
            };
            let tools: Vec<&str> = tool.map(|index| TOOLS[index]).into_iter().collect();
            let action = session
                .draft_action(actor, PLATFORMS[platform], "", "move", mode, &tools)
                .unwrap();
            let judgement = Judgement::new(1, trust, spread, Effectiveness::Medium);
            session.submit(action.clone(), &judgement).unwrap();
            snapshots += 1;

            let before = session.fingerprint().unwrap();
            prop_assert!(session.submit(action, &judgement).is_err());
            prop_assert_eq!(session.fingerprint().unwrap(), before);
        }

        let snapshot = session.snapshot();
        prop_assert!(snapshot.ledger.all_snapshots().all(PlatformState::is_bounded));
        prop_assert_eq!(snapshot.ledger.total_snapshots(), snapshots);
        let open = snapshot.scheduler.rounds().iter().filter(|round| !round.completed).count();
        prop_assert!(open <= 1);
        let numbers: Vec<u32> = snapshot.scheduler.rounds().iter().map(|round| round.number).collect();
        prop_assert!(numbers.windows(2).all(|pair| pair[1] == pair[0] + 1));
        for round in &numbers {
            for actor in Actor::ALL {
                let count = snapshot
                    .records
                    .iter()
                    .filter(|record| record.round() == *round && record.actor() == actor)
                    .count();
                prop_assert!(count <= 1);
            }
        }
        prop_assert_ne!(session.turn_state(), TurnState::SessionComplete);
    }
}
