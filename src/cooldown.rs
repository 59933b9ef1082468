use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use crate::model::TeamId;

/// Process-local record of when each team was last fetched successfully.
///
/// Entries live for the life of the process; a restart makes every team
/// eligible again. Concurrent writers for the same team are last-write-wins.
#[derive(Debug)]
pub struct CooldownTracker {
    min_interval: TimeDelta,
    last_fetch: DashMap<TeamId, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new(min_interval: TimeDelta) -> Self {
        Self { min_interval, last_fetch: DashMap::new() }
    }

    pub fn min_interval(&self) -> TimeDelta {
        self.min_interval
    }

    /// True if `team_id` was never fetched or its cooldown has fully elapsed at `now`.
    pub fn is_eligible(&self, team_id: TeamId, now: DateTime<Utc>) -> bool {
        match self.last_fetch.get(&team_id) {
            None => true,
            Some(last) => now - *last >= self.min_interval,
        }
    }

    pub fn mark_fetched(&self, team_id: TeamId, now: DateTime<Utc>) {
        self.last_fetch.insert(team_id, now);
    }

    pub fn last_fetched(&self, team_id: TeamId) -> Option<DateTime<Utc>> {
        self.last_fetch.get(&team_id).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.last_fetch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_fetch.is_empty()
    }

    /// Copy of the current map, for status reporting.
    pub fn snapshot(&self) -> HashMap<TeamId, DateTime<Utc>> {
        self.last_fetch.iter().map(|entry| (*entry.key(), *entry.value())).collect()
    }
}
