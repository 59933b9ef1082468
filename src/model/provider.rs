use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::model::fixture::{MatchStatus, MatchUpdate};

/// One match as returned by the provider's `/matches` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMatch {
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub utc_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub competition: Option<Competition>,
    #[serde(default, deserialize_with = "lenient")]
    pub home_team: Option<ProviderTeam>,
    #[serde(default, deserialize_with = "lenient")]
    pub away_team: Option<ProviderTeam>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<Score>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTeam {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub tla: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub full_time: Option<ScorePair>,
    // Some feeds put the pair directly on the score object
    pub home: Option<i32>,
    pub away: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePair {
    pub home: Option<i32>,
    pub away: Option<i32>,
}

impl ProviderMatch {
    /// Mutable fields carried by this record, full-time score preferred.
    pub fn update(&self) -> MatchUpdate {
        let status = self.status.as_deref().and_then(MatchStatus::from_provider);
        let (mut home, mut away) = (None, None);
        if let Some(score) = &self.score {
            if let Some(ft) = &score.full_time {
                home = ft.home;
                away = ft.away;
            }
            home = home.or(score.home);
            away = away.or(score.away);
        }
        MatchUpdate { status, home_score: home, away_score: away }
    }

    pub fn competition_name(&self) -> Option<&str> {
        self.competition.as_ref().and_then(|c| c.name.as_deref())
    }
}

// A field that fails to decode reads as absent instead of dropping the record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Decode a matches document.
///
/// Records are decoded one by one. Only a record whose `id` is not an integer
/// is dropped; any other malformed field is read as absent.
pub fn parse_matches(body: &str) -> Result<Vec<ProviderMatch>, ParseError> {
    let root: Value = serde_json::from_str(body)?;
    let items = root
        .get("matches")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingMatches)?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match ProviderMatch::deserialize(item) {
            Ok(m) => out.push(m),
            Err(e) => debug!(error = %e, "Skipping undecodable match record"),
        }
    }
    Ok(out)
}
