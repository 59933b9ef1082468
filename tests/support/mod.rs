#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use score_sync::error::ProviderError;
use score_sync::football_data::MatchProvider;
use score_sync::model::TeamId;
use score_sync::model::fixture::{MatchRecord, MatchStatus};
use score_sync::store::{MatchStore, SqliteStore};

pub const EMPTY_MATCHES: &str = r#"{"matches": []}"#;

pub fn load_sample() -> String {
    std::fs::read_to_string("tests/sample_matches.json").expect("failed to read sample_matches.json")
}

#[derive(Debug, Clone)]
pub struct Call {
    pub team_id: TeamId,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub include_live: bool,
    pub at: Instant,
}

enum Reply {
    Body(String),
    Status(u16),
}

/// Provider double that replays canned bodies per team and records every call.
#[derive(Default)]
pub struct FakeProvider {
    replies: Mutex<HashMap<TeamId, Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, team_id: TeamId, body: impl Into<String>) {
        self.replies.lock().unwrap().insert(team_id, Reply::Body(body.into()));
    }

    pub fn fail(&self, team_id: TeamId, status: u16) {
        self.replies.lock().unwrap().insert(team_id, Reply::Status(status));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_teams(&self) -> Vec<TeamId> {
        self.calls().iter().map(|c| c.team_id).collect()
    }
}

impl MatchProvider for FakeProvider {
    fn fetch_team_window(
        &self,
        team_id: TeamId,
        from: NaiveDate,
        to: Option<NaiveDate>,
        include_live: bool,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(Call { team_id, from, to, include_live, at: Instant::now() });
        match self.replies.lock().unwrap().get(&team_id) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(ProviderError::Status { status: *status, body: "boom".to_string() }),
            None => Ok(EMPTY_MATCHES.to_string()),
        }
    }
}

pub fn kickoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 20, 14, 0, 0).unwrap()
}

/// Insert a scheduled match with the given external id and return it as stored.
pub fn seed_match(
    store: &SqliteStore,
    external_id: i64,
    status: MatchStatus,
    home_score: Option<i32>,
    away_score: Option<i32>,
) -> MatchRecord {
    let record = MatchRecord {
        id: None,
        external_id: Some(external_id),
        home_team_id: 65,
        away_team_id: 66,
        kickoff_at: kickoff(),
        venue: Some("Etihad Stadium".to_string()),
        status,
        home_score,
        away_score,
        competition: Some("Premier League".to_string()),
    };
    store.save(&record).expect("seed match")
}
