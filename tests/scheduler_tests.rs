mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use score_sync::config::FetcherConfig;
use score_sync::cooldown::CooldownTracker;
use score_sync::model::fixture::MatchStatus;
use score_sync::scheduler::ScoreScheduler;
use score_sync::store::{MatchStore, SqliteStore};
use score_sync::sync::SyncEngine;

use support::{FakeProvider, seed_match};

struct Harness {
    provider: Arc<FakeProvider>,
    store: Arc<SqliteStore>,
    cooldown: Arc<CooldownTracker>,
    scheduler: ScoreScheduler,
}

fn fetcher(spacing: Duration) -> FetcherConfig {
    FetcherConfig {
        enabled: true,
        window_days: 2,
        include_active: true,
        min_interval: TimeDelta::minutes(30),
        max_teams_per_run: 9,
        spacing,
        cron: "0 * * * * *".to_string(),
    }
}

fn harness(config: FetcherConfig, subscribed: &[i64]) -> Harness {
    let provider = Arc::new(FakeProvider::new());
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    for (i, team_id) in subscribed.iter().enumerate() {
        store.subscribe(&format!("fan{i}@example.com"), *team_id).unwrap();
    }
    let cooldown = Arc::new(CooldownTracker::new(config.min_interval));
    let engine = SyncEngine::new(provider.clone(), store.clone());
    let scheduler = ScoreScheduler::new(config, engine, store.clone(), cooldown.clone());
    Harness { provider, store, cooldown, scheduler }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 20, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn fetches_only_teams_out_of_cooldown() {
    let h = harness(fetcher(Duration::ZERO), &[1, 2]);
    let t1_last = now() - TimeDelta::minutes(10);
    h.cooldown.mark_fetched(1, t1_last);

    let report = h.scheduler.tick(now(), &CancellationToken::new()).await;

    assert_eq!(h.provider.called_teams(), vec![2]);
    assert_eq!(report.fetched, 1);
    assert_eq!(h.cooldown.last_fetched(2), Some(now()));
    assert_eq!(h.cooldown.last_fetched(1), Some(t1_last));
}

#[tokio::test]
async fn batch_is_capped_per_tick() {
    let teams: Vec<i64> = (1..=50).collect();
    let h = harness(fetcher(Duration::ZERO), &teams);

    let report = h.scheduler.tick(now(), &CancellationToken::new()).await;

    assert_eq!(report.selected, 9);
    assert_eq!(h.provider.calls().len(), 9);
    assert_eq!(h.cooldown.len(), 9);

    // the next tick picks up teams not yet fetched
    let report = h.scheduler.tick(now(), &CancellationToken::new()).await;
    assert_eq!(report.fetched, 9);
    assert_eq!(h.cooldown.len(), 18);
}

#[tokio::test]
async fn one_failing_team_does_not_abort_the_batch() {
    let h = harness(fetcher(Duration::ZERO), &[10, 20, 30]);
    let a = seed_match(&h.store, 100, MatchStatus::Live, None, None);
    let c = seed_match(&h.store, 300, MatchStatus::Live, None, None);
    h.provider.respond(10, r#"{"matches": [{"id": 100, "status": "FINISHED", "score": {"fullTime": {"home": 1, "away": 0}}}]}"#);
    h.provider.fail(20, 500);
    h.provider.respond(30, r#"{"matches": [{"id": 300, "status": "FINISHED", "score": {"fullTime": {"home": 0, "away": 2}}}]}"#);

    let report = h.scheduler.tick(now(), &CancellationToken::new()).await;

    let mut called = h.provider.called_teams();
    called.sort();
    assert_eq!(called, vec![10, 20, 30]);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.updated, 2);

    let a = h.store.find_by_external_id(a.external_id.unwrap()).unwrap().unwrap();
    let c = h.store.find_by_external_id(c.external_id.unwrap()).unwrap().unwrap();
    assert_eq!(a.status, MatchStatus::Finished);
    assert_eq!(c.away_score, Some(2));

    // a failed fetch leaves the team eligible for the next tick
    assert!(h.cooldown.last_fetched(20).is_none());
    assert!(h.cooldown.is_eligible(20, now()));
}

#[tokio::test]
async fn zero_updates_still_resets_cooldown() {
    let h = harness(fetcher(Duration::ZERO), &[7]);

    let report = h.scheduler.tick(now(), &CancellationToken::new()).await;

    assert_eq!(report.fetched, 1);
    assert_eq!(report.updated, 0);
    assert!(!h.cooldown.is_eligible(7, now() + TimeDelta::minutes(29)));
}

#[tokio::test]
async fn disabled_scheduler_does_nothing() {
    let mut config = fetcher(Duration::ZERO);
    config.enabled = false;
    let h = harness(config, &[1, 2, 3]);

    let report = h.scheduler.tick(now(), &CancellationToken::new()).await;

    assert_eq!(report, Default::default());
    assert!(h.provider.calls().is_empty());
}

#[tokio::test]
async fn no_subscriptions_means_no_calls() {
    let h = harness(fetcher(Duration::ZERO), &[]);

    let report = h.scheduler.tick(now(), &CancellationToken::new()).await;

    assert_eq!(report.selected, 0);
    assert!(h.provider.calls().is_empty());
}

#[tokio::test]
async fn shared_window_starts_today_in_utc() {
    let h = harness(fetcher(Duration::ZERO), &[1, 2]);

    h.scheduler.tick(now(), &CancellationToken::new()).await;

    let from = NaiveDate::from_ymd_opt(2025, 9, 20).unwrap();
    let to = NaiveDate::from_ymd_opt(2025, 9, 22).unwrap();
    for call in h.provider.calls() {
        assert_eq!(call.from, from);
        assert_eq!(call.to, Some(to));
        assert!(call.include_live);
    }
}

#[tokio::test]
async fn calls_are_spaced_by_pacing_interval() {
    let spacing = Duration::from_millis(60);
    let h = harness(fetcher(spacing), &[1, 2, 3]);

    h.scheduler.tick(now(), &CancellationToken::new()).await;

    let calls = h.provider.calls();
    assert_eq!(calls.len(), 3);
    for pair in calls.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(gap >= spacing, "calls only {gap:?} apart");
    }
}

#[tokio::test]
async fn cancellation_during_pacing_drops_rest_of_batch() {
    let h = harness(fetcher(Duration::from_secs(30)), &[1, 2, 3]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = h.scheduler.tick(now(), &cancel).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.interrupted);
    assert_eq!(report.fetched, 1);
    assert_eq!(h.provider.calls().len(), 1);
    assert_eq!(h.cooldown.len(), 1);
}

#[test]
fn duplicate_subscriptions_are_collapsed() {
    let h = harness(fetcher(Duration::ZERO), &[]);
    let batch = h.scheduler.select_batch(&[4, 4, 5, 4, 5], now());

    let mut sorted = batch.clone();
    sorted.sort();
    assert_eq!(sorted, vec![4, 5]);
}
