use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TeamId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
        }
    }

    /// Map a provider status string onto the lifecycle set.
    /// Statuses outside it (postponed, cancelled, ...) yield `None`.
    pub fn from_provider(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" | "TIMED" => Some(MatchStatus::Scheduled),
            "IN_PLAY" | "PAUSED" | "LIVE" | "EXTRA_TIME" | "PENALTY_SHOOTOUT" => Some(MatchStatus::Live),
            "FINISHED" | "AWARDED" => Some(MatchStatus::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "live" => Ok(MatchStatus::Live),
            "finished" => Ok(MatchStatus::Finished),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

/// A stored match. Home, away and kickoff are fixed once the row exists;
/// only status and scores move afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Local row id, `None` until first saved.
    pub id: Option<i64>,
    pub external_id: Option<i64>,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub kickoff_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub status: MatchStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub competition: Option<String>,
}

/// Mutable fields observed for one match in a provider payload.
/// `None` means "not provided" and never clears a stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchUpdate {
    pub status: Option<MatchStatus>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl MatchRecord {
    /// Merge the mutable fields of `update` into this record.
    /// Returns whether anything changed.
    pub fn apply(&mut self, update: &MatchUpdate) -> bool {
        let mut changed = false;
        if let Some(status) = update.status {
            if self.status != status {
                self.status = status;
                changed = true;
            }
        }
        if let Some(home) = update.home_score {
            if self.home_score != Some(home) {
                self.home_score = Some(home);
                changed = true;
            }
        }
        if let Some(away) = update.away_score {
            if self.away_score != Some(away) {
                self.away_score = Some(away);
                changed = true;
            }
        }
        changed
    }
}
