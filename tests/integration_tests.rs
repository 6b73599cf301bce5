//! Integration tests for the engagement core
//!
//! These tests verify end-to-end functionality across the engines: message
//! and voice awards, daily streaks, point/XP conversion, shop purchases,
//! quest progress, anti-nuke lockdowns, and lost-update protection under
//! concurrent mutation.

use chrono::{Duration, Utc};
use guildpulse::{
    AdminAction, AntiNukeConfig, AntiNukeDetector, Clock, CoreError, EconomyConfig, LedgerEngine,
    ManualClock, MemoryStore, NewQuest, QuestAction, QuestEngine, QuestKind, ShopEngine,
};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

struct TestCore {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    ledger: Arc<LedgerEngine>,
    shop: Arc<ShopEngine>,
    quests: Arc<QuestEngine>,
    detector: Arc<AntiNukeDetector>,
}

/// Wire up every engine over one shared store and a manual clock.
fn create_test_core() -> TestCore {
    let store = Arc::new(MemoryStore::new());
    let manual = Arc::new(ManualClock::new(Utc::now()));
    let clock = manual.clone() as Arc<dyn Clock>;

    let ledger = Arc::new(
        LedgerEngine::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            EconomyConfig::default(),
        )
        .with_rng_seed(42),
    );
    let shop = Arc::new(ShopEngine::new(Arc::clone(&store), Arc::clone(&clock)));
    let quests = Arc::new(QuestEngine::new(Arc::clone(&store), Arc::clone(&clock)));
    let detector = Arc::new(AntiNukeDetector::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        AntiNukeConfig::default(),
    ));

    TestCore {
        store,
        clock: manual,
        ledger,
        shop,
        quests,
        detector,
    }
}

/// Earn an exact balance through repeated voice awards.
async fn fund(core: &TestCore, user_id: &str, target: u64) {
    let mut earned = 0u64;
    while earned + 10 <= target {
        let award = core.ledger.award_voice_points(user_id, 600).await.unwrap();
        earned += award.earned;
    }
    assert!(
        earned == target,
        "funding helper only supports multiples of 10"
    );
}

// ============================================================================
// Economy Flows
// ============================================================================

mod economy {
    use super::*;

    #[tokio::test]
    async fn test_message_cooldown_across_simulated_time() {
        let core = create_test_core();

        let first = core.ledger.award_message_points("alice").await.unwrap();
        assert!((1..=5).contains(&first.earned));

        let blocked = core.ledger.award_message_points("alice").await.unwrap();
        assert!(blocked.cooldown);
        assert_eq!(blocked.earned, 0);

        core.clock.advance(Duration::seconds(61));
        let third = core.ledger.award_message_points("alice").await.unwrap();
        assert!(!third.cooldown);
        assert!((1..=5).contains(&third.earned));
    }

    #[tokio::test]
    async fn test_daily_streak_grows_and_breaks() {
        let core = create_test_core();

        let day1 = core.ledger.claim_daily("alice").await.unwrap();
        assert!(day1.claimed);
        assert_eq!((day1.streak, day1.points), (1, 100));

        assert!(!core.ledger.claim_daily("alice").await.unwrap().claimed);

        core.clock.advance(Duration::hours(25));
        let day2 = core.ledger.claim_daily("alice").await.unwrap();
        assert_eq!((day2.streak, day2.points), (2, 110));

        core.clock.advance(Duration::hours(25));
        let day3 = core.ledger.claim_daily("alice").await.unwrap();
        assert_eq!((day3.streak, day3.points), (3, 120));

        // A 49h absence resets the streak before it increments.
        core.clock.advance(Duration::hours(49));
        let broken = core.ledger.claim_daily("alice").await.unwrap();
        assert_eq!((broken.streak, broken.points), (1, 100));
    }

    #[tokio::test]
    async fn test_earn_convert_level_up_flow() {
        let core = create_test_core();
        fund(&core, "alice", 450).await;

        let conversion = core.ledger.convert_points_to_xp("alice", 400).await.unwrap();
        assert_eq!(conversion.new_xp, 400);
        assert_eq!(conversion.new_level, 2);
        assert!(conversion.leveled_up);

        let account = core.ledger.account("alice").await.unwrap();
        assert_eq!(account.points, 50);
        assert_eq!(account.level, 2);

        // A second small conversion stays within level 2.
        let conversion = core.ledger.convert_points_to_xp("alice", 50).await.unwrap();
        assert_eq!(conversion.new_level, 2);
        assert!(!conversion.leveled_up);
    }
}

// ============================================================================
// Shop Flows
// ============================================================================

mod shop {
    use super::*;
    use guildpulse::ItemEffect;

    #[tokio::test]
    async fn test_buy_use_and_inventory_flow() {
        let core = create_test_core();
        fund(&core, "alice", 1000).await;

        let purchase = core.shop.buy("alice", "xp_booster").await.unwrap();
        assert_eq!(purchase.balance, 500);

        let lines = core.shop.inventory("alice").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!((lines[0].item_id.as_str(), lines[0].count), ("xp_booster", 1));

        let outcome = core.shop.use_item("alice", "xp_booster").await.unwrap();
        assert!(matches!(outcome.effect, ItemEffect::TimedBuff { .. }));

        assert!(core.shop.inventory("alice").await.unwrap().is_empty());

        let account = core.ledger.account("alice").await.unwrap();
        assert_eq!(account.active_buffs.len(), 1);
        assert_eq!(account.active_buffs[0].source_item_id, "xp_booster");
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_no_trace() {
        let core = create_test_core();
        fund(&core, "alice", 490).await;

        let result = core.shop.buy("alice", "xp_booster").await;
        assert!(matches!(result, Err(CoreError::InsufficientFunds { .. })));

        let account = core.ledger.account("alice").await.unwrap();
        assert_eq!(account.points, 490);
        assert!(account.inventory.is_empty());
    }

    #[tokio::test]
    async fn test_use_unowned_item_fails_cleanly() {
        let core = create_test_core();
        fund(&core, "alice", 100).await;

        let result = core.shop.use_item("alice", "vip_role").await;
        assert!(matches!(result, Err(CoreError::ItemNotOwned(_))));
    }
}

// ============================================================================
// Quest Flows
// ============================================================================

mod quests {
    use super::*;

    fn message_action() -> QuestAction {
        QuestAction {
            kind: QuestKind::Message,
            target_id: None,
        }
    }

    #[tokio::test]
    async fn test_quest_completes_once_per_day_and_pays_out() {
        let core = create_test_core();
        core.quests
            .create_quest(NewQuest {
                title: "Say three things".to_string(),
                kind: QuestKind::Message,
                target_id: None,
                required_count: 3,
                reward_points: 75,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        for _ in 0..2 {
            let completed = core
                .quests
                .process_progress("alice", &message_action())
                .await
                .unwrap();
            assert!(completed.is_empty());
        }

        let completed = core
            .quests
            .process_progress("alice", &message_action())
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].reward_points, 75);

        // Fourth call the same day is idempotent.
        let completed = core
            .quests
            .process_progress("alice", &message_action())
            .await
            .unwrap();
        assert!(completed.is_empty());

        let account = core.ledger.account("alice").await.unwrap();
        assert_eq!(account.points, 75);

        // Next day the count restarts from zero.
        core.clock.advance(Duration::days(1));
        let completed = core
            .quests
            .process_progress("alice", &message_action())
            .await
            .unwrap();
        assert!(completed.is_empty());
    }

    #[tokio::test]
    async fn test_two_quests_complete_in_one_call() {
        let core = create_test_core();
        for title in ["First message", "Still chatting"] {
            core.quests
                .create_quest(NewQuest {
                    title: title.to_string(),
                    kind: QuestKind::Message,
                    target_id: None,
                    required_count: 1,
                    reward_points: 20,
                    created_by: "admin".to_string(),
                })
                .await
                .unwrap();
        }

        let completed = core
            .quests
            .process_progress("alice", &message_action())
            .await
            .unwrap();
        assert_eq!(completed.len(), 2);

        // Both rewards land in one transaction.
        let account = core.ledger.account("alice").await.unwrap();
        assert_eq!(account.points, 40);
    }
}

// ============================================================================
// Anti-Nuke Flows
// ============================================================================

mod antinuke {
    use super::*;

    #[tokio::test]
    async fn test_burst_triggers_lockdown_then_short_circuits() {
        let core = create_test_core();

        // Three dangerous actions inside ten seconds.
        for (i, action) in [
            AdminAction::ChannelDelete,
            AdminAction::ChannelDelete,
            AdminAction::RoleDelete,
        ]
        .into_iter()
        .enumerate()
        {
            let outcome = core
                .detector
                .check_action("raider", action, "burst")
                .await
                .unwrap();
            if i < 2 {
                assert!(!outcome.should_lockdown);
            } else {
                assert!(outcome.should_lockdown);
                assert_eq!(outcome.action_count, 3);
            }
            core.clock.advance(Duration::seconds(5));
        }

        let state = core.detector.status().await.unwrap();
        assert!(state.active);
        assert_eq!(state.initiated_by.as_deref(), Some("SYSTEM"));

        // Any user's next action short-circuits while locked.
        let outcome = core
            .detector
            .check_action("bystander", AdminAction::MemberBan, "")
            .await
            .unwrap();
        assert!(outcome.should_lockdown);
        assert_eq!(outcome.action_count, 0);
    }

    #[tokio::test]
    async fn test_unlock_resumes_normal_counting() {
        let core = create_test_core();
        core.detector.lockdown("drill", "mod_1").await.unwrap();
        core.detector.unlock("mod_1").await.unwrap();

        let outcome = core
            .detector
            .check_action("raider", AdminAction::ChannelDelete, "")
            .await
            .unwrap();
        assert!(!outcome.should_lockdown);
        assert_eq!(outcome.action_count, 1);
    }

    #[tokio::test]
    async fn test_slow_destruction_never_triggers() {
        let core = create_test_core();

        for _ in 0..6 {
            let outcome = core
                .detector
                .check_action("careful_admin", AdminAction::ChannelDelete, "cleanup")
                .await
                .unwrap();
            assert!(!outcome.should_lockdown);
            core.clock.advance(Duration::seconds(31));
        }
        assert!(!core.detector.status().await.unwrap().active);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_message_awards_lose_no_updates() {
        let core = create_test_core();

        // Establish the account, then move outside the cooldown so exactly
        // one of the racing awards is eligible.
        let first = core.ledger.award_message_points("alice").await.unwrap();
        core.clock.advance(Duration::seconds(61));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = Arc::clone(&core.ledger);
            handles.push(tokio::spawn(async move {
                ledger.award_message_points("alice").await.unwrap()
            }));
        }

        let results = futures::future::join_all(handles).await;
        let awards: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();

        let winners: Vec<_> = awards.iter().filter(|a| !a.cooldown).collect();
        assert_eq!(winners.len(), 1, "exactly one award outside the cooldown");

        let account = core.ledger.account("alice").await.unwrap();
        assert_eq!(
            account.points,
            first.earned + winners[0].earned,
            "final balance matches sequential execution"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_voice_awards_all_land() {
        let core = create_test_core();

        // Five writers: each can lose to at most four rivals, which stays
        // inside the engine's commit retry budget.
        let mut handles = Vec::new();
        for _ in 0..5 {
            let ledger = Arc::clone(&core.ledger);
            handles.push(tokio::spawn(async move {
                ledger.award_voice_points("alice", 600).await.unwrap()
            }));
        }
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        let account = core.ledger.account("alice").await.unwrap();
        assert_eq!(account.points, 50);
        assert_eq!(account.total_voice_seconds, 3000);
    }
}

// ============================================================================
// End-to-End
// ============================================================================

#[tokio::test]
async fn test_full_member_journey() {
    let core = create_test_core();

    // Day one: chat, claim the daily, grind voice.
    core.ledger.award_message_points("alice").await.unwrap();
    let daily = core.ledger.claim_daily("alice").await.unwrap();
    assert_eq!(daily.points, 100);
    core.ledger.award_voice_points("alice", 18_000).await.unwrap(); // +300

    let account = core.ledger.account("alice").await.unwrap();
    assert!(account.points >= 401);

    // Convert some into XP, then spend the rest on a mystery box.
    core.ledger.convert_points_to_xp("alice", 100).await.unwrap();
    core.shop.buy("alice", "mystery_box").await.unwrap();
    let outcome = core.shop.use_item("alice", "mystery_box").await.unwrap();
    assert!(outcome.message.contains("Mystery Box"));

    // Meanwhile a raid starts and gets locked down.
    for _ in 0..3 {
        core.detector
            .check_action("raider", AdminAction::WebhookDelete, "")
            .await
            .unwrap();
    }
    assert!(core.detector.status().await.unwrap().active);

    // The raid never touched alice's ledger.
    let account = core.ledger.account("alice").await.unwrap();
    assert_eq!(account.xp, 100);
    assert_eq!(account.level, 1);
}
