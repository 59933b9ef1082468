mod support;

use score_sync::model::fixture::MatchStatus;
use score_sync::store::{MatchStore, SqliteStore, SubscriptionRegistry};

use support::{kickoff, seed_match};

#[test]
fn subscriptions_are_idempotent_and_listed_once_per_team() {
    let store = SqliteStore::open_in_memory().unwrap();

    assert!(store.subscribe("a@example.com", 65).unwrap());
    assert!(!store.subscribe("a@example.com", 65).unwrap());
    assert!(store.subscribe("b@example.com", 65).unwrap());
    assert!(store.subscribe("b@example.com", 66).unwrap());

    let mut ids = store.list_active_team_ids().unwrap();
    ids.sort();
    assert_eq!(ids, vec![65, 66]);

    assert!(store.unsubscribe("b@example.com", 66).unwrap());
    assert_eq!(store.list_active_team_ids().unwrap(), vec![65]);
}

#[test]
fn save_assigns_id_then_updates_in_place() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut m = seed_match(&store, 777, MatchStatus::Scheduled, None, None);
    assert!(m.id.is_some());

    m.status = MatchStatus::Live;
    m.home_score = Some(1);
    m.home_team_id = 999;
    store.save(&m).unwrap();

    let stored = store.find_by_external_id(777).unwrap().unwrap();
    assert_eq!(stored.id, m.id);
    assert_eq!(stored.status, MatchStatus::Live);
    assert_eq!(stored.home_score, Some(1));
    // teams and kickoff are fixed after insert
    assert_eq!(stored.home_team_id, 65);
    assert_eq!(stored.kickoff_at, kickoff());
}

#[test]
fn missing_external_id_returns_none() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.find_by_external_id(1).unwrap().is_none());
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = std::env::temp_dir().join(format!("score-sync-{}", std::process::id())).join("nested");
    let path = dir.join("scores.db");
    let _ = std::fs::remove_dir_all(&dir);

    let store = SqliteStore::open(&path).expect("store opens");
    store.subscribe("fan@example.com", 65).unwrap();

    assert!(path.exists());
    assert_eq!(store.list_active_team_ids().unwrap(), vec![65]);
    drop(store);
    let _ = std::fs::remove_dir_all(dir.parent().unwrap());
}
