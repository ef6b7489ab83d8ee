//! Order sync state machine, hooks and reconciliation sweep

mod support;

use std::sync::{Arc, Mutex};

use chrono::Duration;
use recreviews_common::testing::Clock;
use recreviews_core::{ConfigStore, OrderEventHandler, ScheduledSweep, SweepGuard};
use recreviews_domain::constants::{
    OPTION_LAST_SYNC, OPTION_SYNC_LOCK, PATH_OAUTH_TOKEN, PATH_ORDERS, PATH_ORDER_STATUS,
};
use recreviews_domain::{
    ApiError, OrderSyncRecord, SweepOutcome, SweepSkip, SweepSummary, SyncState,
};
use serde_json::json;
use support::{order, sent_record, Harness};

fn linked() -> Harness {
    let h = Harness::new();
    h.link("access-1", Duration::hours(1));
    h
}

#[tokio::test]
async fn created_order_gets_a_fresh_record() {
    let h = linked();
    h.orders.insert(order(1, 2, None));

    h.engine.on_order_created(1).await.unwrap();

    assert_eq!(h.orders.record(1), Some(OrderSyncRecord::new()));
}

#[tokio::test]
async fn created_order_is_ignored_while_unlinked() {
    let h = Harness::new();
    h.orders.insert(order(1, 2, None));

    h.engine.on_order_created(1).await.unwrap();

    assert!(h.orders.record(1).is_none());
}

#[tokio::test]
async fn created_hook_keeps_existing_record() {
    let h = linked();
    h.orders.insert(order(1, 2, Some(sent_record())));

    h.engine.on_order_created(1).await.unwrap();

    assert_eq!(h.orders.record(1).unwrap().state, SyncState::Sent);
    assert!(h.orders.saves().is_empty());
}

#[tokio::test]
async fn created_hook_tolerates_unknown_order() {
    let h = linked();
    assert!(h.engine.on_order_created(404).await.is_ok());
}

#[tokio::test]
async fn sweep_sends_waiting_order() {
    // Order with two lines, dashboard accepts
    let h = linked();
    h.orders.insert(order(1, 2, Some(OrderSyncRecord::new())));
    h.orders.set_locale(7, "de_DE");
    h.transport.accept_always(PATH_ORDERS);

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Ran(SweepSummary { sent: 1, ..SweepSummary::default() }));
    let record = h.orders.record(1).unwrap();
    assert_eq!(record.state, SyncState::Sent);
    assert_eq!(record.sent_at, Some(h.clock.now()));

    let push = &h.transport.calls(PATH_ORDERS)[0];
    assert_eq!(push.access_token.as_deref(), Some("access-1"));
    assert_eq!(push.params["order"]["reference"], "1");
    assert_eq!(push.params["order"]["order_date"], "2024-04-30 08:15:00");
    assert_eq!(push.params["order"]["products"].as_array().unwrap().len(), 2);
    assert_eq!(push.params["order"]["products"][0]["image"], "https://shop.test/placeholder.png");
    assert_eq!(push.params["order"]["products"][0]["currency"], "EUR");
    assert_eq!(push.params["customer"]["lang"], "de");
    assert_eq!(push.params["customer"]["gender"], json!(null));
}

#[tokio::test]
async fn sweep_ignores_order_without_products() {
    let h = linked();
    h.orders.insert(order(1, 0, Some(OrderSyncRecord::new())));
    h.transport.accept_always(PATH_ORDERS);

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Ran(SweepSummary { ignored: 1, ..SweepSummary::default() }));
    let record = h.orders.record(1).unwrap();
    assert_eq!(record.state, SyncState::NotSent);
    assert!(record.ignore);
    assert!(h.transport.calls(PATH_ORDERS).is_empty());

    // Never selected again
    h.engine.reconcile().await.unwrap();
    assert!(h.transport.calls(PATH_ORDERS).is_empty());
}

#[tokio::test]
async fn rate_limited_push_leaves_order_and_continues() {
    let h = linked();
    h.orders.insert(order(1, 1, Some(OrderSyncRecord::new())));
    h.orders.insert(order(2, 1, Some(OrderSyncRecord::new())));
    h.transport.respond(PATH_ORDERS, Err(ApiError::RateLimited));
    h.transport.respond_json(PATH_ORDERS, json!({ "result": true }));

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(
        outcome,
        SweepOutcome::Ran(SweepSummary { sent: 1, failed: 1, ..SweepSummary::default() })
    );
    assert_eq!(h.orders.record(1), Some(OrderSyncRecord::new()));
    assert_eq!(h.orders.record(2).unwrap().state, SyncState::Sent);

    // Ascending id order: order 1 hit the rate limit
    let pushes = h.transport.calls(PATH_ORDERS);
    assert_eq!(pushes[0].params["order"]["reference"], "1");
    assert_eq!(pushes[1].params["order"]["reference"], "2");
}

#[tokio::test]
async fn rejected_or_forbidden_push_is_a_failure() {
    let h = linked();
    h.orders.insert(order(1, 1, Some(OrderSyncRecord::new())));
    h.orders.insert(order(2, 1, Some(OrderSyncRecord::new())));
    h.transport.respond_json(PATH_ORDERS, json!({ "result": false }));
    h.transport.respond(PATH_ORDERS, Ok(recreviews_core::ApiResponse::Forbidden));

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Ran(SweepSummary { failed: 2, ..SweepSummary::default() }));
    assert!(h.orders.saves().is_empty());
}

#[tokio::test]
async fn ignored_orders_are_never_selected() {
    let h = linked();
    let mut ignored = OrderSyncRecord::new();
    ignored.mark_ignored().unwrap();
    h.orders.insert(order(1, 2, Some(ignored)));
    h.transport.accept_always(PATH_ORDERS);
    h.transport.accept_always(PATH_ORDER_STATUS);

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Ran(SweepSummary::default()));
    assert_eq!(h.transport.total_calls(), 0);
    assert!(h.engine.display_info(1).await.unwrap().is_none());
}

#[tokio::test]
async fn completed_hook_validates_sent_order() {
    let h = linked();
    h.orders.insert(order(1, 2, Some(sent_record())));
    h.transport.accept_always(PATH_ORDER_STATUS);

    h.engine.on_order_completed(1).await.unwrap();

    let record = h.orders.record(1).unwrap();
    assert_eq!(record.state, SyncState::Valid);
    assert_eq!(record.valid_at, Some(h.clock.now()));
    assert_eq!(
        h.transport.calls(PATH_ORDER_STATUS)[0].params,
        json!({ "order": { "reference": "1", "validStatus": true } })
    );
}

#[tokio::test]
async fn completed_hook_skips_unsent_order() {
    let h = linked();
    h.orders.insert(order(1, 2, Some(OrderSyncRecord::new())));
    h.transport.accept_always(PATH_ORDER_STATUS);

    h.engine.on_order_completed(1).await.unwrap();

    assert_eq!(h.orders.record(1).unwrap().state, SyncState::NotSent);
    assert!(h.transport.calls(PATH_ORDER_STATUS).is_empty());
}

#[tokio::test]
async fn completed_hook_failure_is_swallowed() {
    let h = linked();
    h.orders.insert(order(1, 2, Some(sent_record())));
    h.transport.respond(PATH_ORDER_STATUS, Err(ApiError::Server));

    assert!(h.engine.on_order_completed(1).await.is_ok());
    assert_eq!(h.orders.record(1).unwrap().state, SyncState::Sent);
}

#[tokio::test]
async fn sweep_retries_completion_for_completed_orders() {
    let h = linked();
    h.orders.insert(order(1, 2, Some(sent_record())));
    h.orders.insert(order(2, 2, Some(sent_record())));
    h.orders.set_status(1, "completed");
    h.transport.accept_always(PATH_ORDER_STATUS);

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Ran(SweepSummary { completed: 1, ..SweepSummary::default() }));
    assert_eq!(h.orders.record(1).unwrap().state, SyncState::Valid);
    assert_eq!(h.orders.record(2).unwrap().state, SyncState::Sent);
}

#[tokio::test]
async fn valid_orders_are_terminal() {
    let h = linked();
    let mut valid = sent_record();
    valid.mark_valid(h.clock.now()).unwrap();
    h.orders.insert(order(1, 2, Some(valid)));
    h.orders.set_status(1, "completed");
    h.transport.accept_always(PATH_ORDER_STATUS);
    h.transport.accept_always(PATH_ORDERS);

    h.engine.on_order_completed(1).await.unwrap();
    h.engine.reconcile().await.unwrap();

    assert_eq!(h.orders.record(1).unwrap(), valid);
    assert_eq!(h.transport.total_calls(), 0);
}

#[tokio::test]
async fn sweep_states_only_advance_one_step() {
    let h = linked();
    h.orders.insert(order(1, 1, Some(OrderSyncRecord::new())));
    h.orders.set_status(1, "completed");
    h.transport.accept_always(PATH_ORDERS);
    h.transport.accept_always(PATH_ORDER_STATUS);

    // Completed pass runs first, so a NotSent order is only sent this sweep
    h.engine.reconcile().await.unwrap();
    assert_eq!(h.orders.record(1).unwrap().state, SyncState::Sent);

    h.engine.reconcile().await.unwrap();
    assert_eq!(h.orders.record(1).unwrap().state, SyncState::Valid);
}

#[tokio::test]
async fn sweep_requires_authentication() {
    let h = Harness::new();
    h.orders.insert(order(1, 1, Some(OrderSyncRecord::new())));

    let outcome = h.engine.run_sweep().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Skipped(SweepSkip::NotAuthenticated));
    assert_eq!(h.transport.total_calls(), 0);
    assert!(!h.config.contains(OPTION_LAST_SYNC));
}

#[tokio::test]
async fn sweep_records_last_run_and_releases_lock() {
    let h = linked();

    h.engine.reconcile().await.unwrap();

    let last = h.engine.last_run().await.unwrap().unwrap();
    assert_eq!(last.last_run_at, h.clock.now());
    assert!(!h.config.contains(OPTION_SYNC_LOCK));
}

#[tokio::test]
async fn held_lock_skips_sweep() {
    let h = linked();
    let until = (h.clock.now() + Duration::minutes(5)).timestamp().to_string();
    h.config.seed(OPTION_SYNC_LOCK, &until);

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Skipped(SweepSkip::AlreadyRunning));
    assert_eq!(h.config.value(OPTION_SYNC_LOCK), Some(until));
}

#[tokio::test]
async fn stale_lock_is_reclaimed() {
    let h = linked();
    let expired = (h.clock.now() - Duration::minutes(1)).timestamp().to_string();
    h.config.seed(OPTION_SYNC_LOCK, &expired);

    let outcome = h.engine.reconcile().await.unwrap();

    assert!(matches!(outcome, SweepOutcome::Ran(_)));
    assert!(!h.config.contains(OPTION_SYNC_LOCK));
}

#[tokio::test]
async fn expired_token_refresh_failure_aborts_sweep() {
    let h = linked();
    h.clock.advance(Duration::hours(2));
    h.orders.insert(order(1, 1, Some(OrderSyncRecord::new())));

    let err = h.engine.reconcile().await.unwrap_err();

    assert!(err.is_auth());
    assert!(h.transport.calls(PATH_ORDERS).is_empty());
}

#[tokio::test]
async fn checkout_language_overrides_locale() {
    let h = linked();
    h.orders.insert(order(1, 1, Some(OrderSyncRecord::new())));
    h.orders.set_locale(7, "de_DE");
    h.transport.accept_always(PATH_ORDERS);

    h.engine.on_checkout_review(7, "it-IT,it;q=0.9").await.unwrap();
    h.engine.reconcile().await.unwrap();

    assert_eq!(h.orders.language(7).as_deref(), Some("it"));
    assert_eq!(h.transport.calls(PATH_ORDERS)[0].params["customer"]["lang"], "it");
}

#[tokio::test]
async fn checkout_language_skips_guests_and_blank_headers() {
    let h = linked();

    h.engine.capture_language(0, "fr-FR").await.unwrap();
    h.engine.capture_language(7, "").await.unwrap();

    assert!(h.orders.language(0).is_none());
    assert!(h.orders.language(7).is_none());
}

#[tokio::test]
async fn pending_counts_exclude_ignored() {
    let h = linked();
    let mut ignored = OrderSyncRecord::new();
    ignored.mark_ignored().unwrap();
    h.orders.insert(order(1, 1, Some(OrderSyncRecord::new())));
    h.orders.insert(order(2, 1, Some(ignored)));
    h.orders.insert(order(3, 1, Some(sent_record())));

    assert_eq!(h.engine.count_pending(SyncState::NotSent).await.unwrap(), 1);
    assert_eq!(h.engine.count_pending(SyncState::Sent).await.unwrap(), 1);
    assert_eq!(h.engine.count_pending(SyncState::Valid).await.unwrap(), 0);
}

#[tokio::test]
async fn display_info_requires_link() {
    let h = Harness::new();
    h.orders.insert(order(1, 1, Some(sent_record())));
    assert!(h.engine.display_info(1).await.unwrap().is_none());

    h.link("access-1", Duration::hours(1));
    assert_eq!(h.engine.display_info(1).await.unwrap(), Some(sent_record()));
}

#[tokio::test]
async fn lock_option_is_plain_unix_seconds() {
    let h = linked();
    let config: &dyn ConfigStore = h.config.as_ref();
    assert!(config.insert_if_absent(OPTION_SYNC_LOCK, "not-a-number").await.unwrap());

    // An unparsable lock value is treated as stale
    assert!(matches!(h.engine.reconcile().await.unwrap(), SweepOutcome::Ran(_)));
}

/// Make every order push take `minutes` of mock time.
fn slow_pushes(h: &Harness, minutes: i64) {
    let clock = h.clock.clone();
    h.transport.on_request(move |request| {
        if request.path == PATH_ORDERS {
            clock.advance(Duration::minutes(minutes));
        }
    });
}

fn bearers(h: &Harness, path: &str) -> Vec<String> {
    h.transport.calls(path).into_iter().filter_map(|call| call.access_token).collect()
}

#[tokio::test]
async fn token_expiring_mid_sweep_is_refreshed_before_next_push() {
    let h = Harness::new();
    h.link("access-1", Duration::minutes(15));
    for id in 1..=4 {
        h.orders.insert(order(id, 1, Some(OrderSyncRecord::new())));
    }
    h.transport.accept_always(PATH_ORDERS);
    h.transport.respond_json(
        PATH_OAUTH_TOKEN,
        json!({ "token_type": "Bearer", "access_token": "access-2", "expires_in": 3600 }),
    );
    slow_pushes(&h, 10);

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Ran(SweepSummary { sent: 4, ..SweepSummary::default() }));
    assert_eq!(bearers(&h, PATH_ORDERS), ["access-1", "access-1", "access-2", "access-2"]);
    assert_eq!(h.transport.calls(PATH_OAUTH_TOKEN).len(), 1);
}

#[tokio::test]
async fn mid_sweep_refresh_failure_aborts_remaining_pushes() {
    let h = Harness::new();
    h.link("access-1", Duration::minutes(15));
    for id in 1..=3 {
        h.orders.insert(order(id, 1, Some(OrderSyncRecord::new())));
    }
    h.transport.accept_always(PATH_ORDERS);
    h.transport.respond(PATH_OAUTH_TOKEN, Err(ApiError::Server));
    slow_pushes(&h, 10);

    let err = h.engine.reconcile().await.unwrap_err();

    assert!(err.is_auth());
    assert_eq!(h.transport.calls(PATH_ORDERS).len(), 2);
    assert_eq!(h.orders.record(3).unwrap().state, SyncState::NotSent);
    assert!(!h.config.contains(OPTION_LAST_SYNC));
    assert!(!h.config.contains(OPTION_SYNC_LOCK));
}

#[tokio::test]
async fn long_sweep_keeps_its_lock_fresh() {
    let h = Harness::new();
    h.link("access-1", Duration::hours(2));
    for id in 1..=5 {
        h.orders.insert(order(id, 1, Some(OrderSyncRecord::new())));
    }
    h.transport.accept_always(PATH_ORDERS);

    let held_while_pushing = Arc::new(Mutex::new(Vec::new()));
    let (clock, config, held) = (h.clock.clone(), h.config.clone(), Arc::clone(&held_while_pushing));
    h.transport.on_request(move |request| {
        if request.path != PATH_ORDERS {
            return;
        }
        clock.advance(Duration::minutes(4));
        let held_until = config.value(OPTION_SYNC_LOCK).and_then(|v| v.parse::<i64>().ok());
        held.lock().unwrap().push(held_until.is_some_and(|until| until > clock.unix_seconds()));
    });

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Ran(SweepSummary { sent: 5, ..SweepSummary::default() }));
    assert_eq!(*held_while_pushing.lock().unwrap(), [true; 5]);
    assert!(!h.config.contains(OPTION_SYNC_LOCK));
}

#[tokio::test]
async fn sweep_stops_when_lock_is_reclaimed() {
    let h = linked();
    for id in 1..=3 {
        h.orders.insert(order(id, 1, Some(OrderSyncRecord::new())));
    }
    h.transport.accept_always(PATH_ORDERS);
    let config = h.config.clone();
    h.transport.on_request(move |_| config.seed(OPTION_SYNC_LOCK, "9999999999"));

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(
        outcome,
        SweepOutcome::Ran(SweepSummary { sent: 1, interrupted: true, ..SweepSummary::default() })
    );
    assert_eq!(h.transport.calls(PATH_ORDERS).len(), 1);
    assert_eq!(h.orders.record(2).unwrap().state, SyncState::NotSent);
    assert_eq!(h.config.value(OPTION_SYNC_LOCK).as_deref(), Some("9999999999"));
    assert!(!h.config.contains(OPTION_LAST_SYNC));
}

#[tokio::test]
async fn renewed_lease_turns_away_second_sweep() {
    let h = linked();
    let first = SweepGuard::new(h.config.clone(), Arc::new(h.clock.clone()), 600);
    let second = SweepGuard::new(h.config.clone(), Arc::new(h.clock.clone()), 600);

    let mut lease = first.acquire().await.unwrap().unwrap();
    h.clock.advance(Duration::minutes(8));
    assert!(lease.renew().await.unwrap());
    h.clock.advance(Duration::minutes(8));

    assert!(second.acquire().await.unwrap().is_none());
    lease.release().await.unwrap();
    assert!(!h.config.contains(OPTION_SYNC_LOCK));
}

#[tokio::test]
async fn lapsed_lease_cannot_renew_after_reclaim() {
    let h = linked();
    let first = SweepGuard::new(h.config.clone(), Arc::new(h.clock.clone()), 600);
    let second = SweepGuard::new(h.config.clone(), Arc::new(h.clock.clone()), 600);

    let mut lapsed = first.acquire().await.unwrap().unwrap();
    h.clock.advance(Duration::minutes(11));
    let reclaimed = second.acquire().await.unwrap().unwrap();

    assert!(!lapsed.renew().await.unwrap());
    lapsed.release().await.unwrap();
    assert!(h.config.contains(OPTION_SYNC_LOCK));

    reclaimed.release().await.unwrap();
    assert!(!h.config.contains(OPTION_SYNC_LOCK));
}
