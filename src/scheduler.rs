use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::FetcherConfig;
use crate::cooldown::CooldownTracker;
use crate::model::TeamId;
use crate::store::SubscriptionRegistry;
use crate::sync::SyncEngine;

/// Outcome of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Teams chosen for this tick after cooldown filtering and the batch cap.
    pub selected: usize,
    /// Teams whose fetch succeeded, including ones with nothing to update.
    pub fetched: usize,
    pub updated: usize,
    pub failed: usize,
    /// Cancelled during a pacing pause; the rest of the batch was dropped.
    pub interrupted: bool,
}

/// Periodic score refresher for subscribed teams.
///
/// Each tick picks a bounded batch of teams that are out of cooldown and
/// syncs them one at a time, pausing between calls to stay under the
/// provider's calls-per-minute budget.
pub struct ScoreScheduler {
    config: FetcherConfig,
    engine: SyncEngine,
    registry: Arc<dyn SubscriptionRegistry>,
    cooldown: Arc<CooldownTracker>,
}

impl ScoreScheduler {
    pub fn new(
        config: FetcherConfig,
        engine: SyncEngine,
        registry: Arc<dyn SubscriptionRegistry>,
        cooldown: Arc<CooldownTracker>,
    ) -> Self {
        Self { config, engine, registry, cooldown }
    }

    pub fn cooldown(&self) -> &Arc<CooldownTracker> {
        &self.cooldown
    }

    /// Distinct eligible teams at `now`, capped at the per-tick maximum.
    pub fn select_batch(&self, team_ids: &[TeamId], now: DateTime<Utc>) -> Vec<TeamId> {
        let mut seen = HashSet::new();
        team_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| self.cooldown.is_eligible(*id, now))
            .take(self.config.max_teams_per_run)
            .collect()
    }

    /// Shared `[today, today + window_days]` window for a tick at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        let from = now.date_naive();
        let to = from
            .checked_add_days(Days::new(u64::from(self.config.window_days)))
            .unwrap_or(NaiveDate::MAX);
        (from, to)
    }

    /// Run one tick at `now`. Never fails: per-team errors are logged and counted.
    pub async fn tick(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> TickReport {
        let mut report = TickReport::default();
        if !self.config.enabled || cancel.is_cancelled() {
            return report;
        }

        let registry = Arc::clone(&self.registry);
        let team_ids = match tokio::task::spawn_blocking(move || registry.list_active_team_ids()).await {
            Ok(Ok(ids)) => ids,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to list subscribed teams");
                return report;
            }
            Err(e) => {
                error!(error = %e, "Subscription lookup task failed");
                return report;
            }
        };
        if team_ids.is_empty() {
            debug!("No subscribed teams, skipping tick");
            return report;
        }

        let batch = self.select_batch(&team_ids, now);
        if batch.is_empty() {
            debug!(subscribed = team_ids.len(), "All teams within cooldown, skipping tick");
            return report;
        }
        report.selected = batch.len();

        let (from, to) = self.window(now);
        let include_live = self.config.include_active;

        for (i, &team_id) in batch.iter().enumerate() {
            if i > 0 && !self.config.spacing.is_zero() {
                tokio::select! {
                    _ = sleep(self.config.spacing) => {}
                    _ = cancel.cancelled() => {
                        info!(remaining = batch.len() - i, "Pacing interrupted, dropping rest of batch");
                        report.interrupted = true;
                        break;
                    }
                }
            }

            let engine = self.engine.clone();
            let result =
                tokio::task::spawn_blocking(move || engine.sync_team_window(team_id, from, Some(to), include_live))
                    .await;
            match result {
                Ok(Ok(updated)) => {
                    report.fetched += 1;
                    report.updated += updated;
                    self.cooldown.mark_fetched(team_id, now);
                }
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(team_id, error = %e, "Team sync failed");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(team_id, error = %e, "Team sync task failed");
                }
            }
        }

        info!(
            fetched = report.fetched,
            updated = report.updated,
            failed = report.failed,
            interrupted = report.interrupted,
            "Score update tick finished"
        );
        report
    }
}
