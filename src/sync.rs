use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::error::{ProviderError, StoreError};
use crate::football_data::MatchProvider;
use crate::model::TeamId;
use crate::model::provider::{ProviderMatch, parse_matches};
use crate::store::MatchStore;

/// Refreshes status and scores of matches already stored locally.
///
/// Matches the provider reports that are not stored yet are ignored here;
/// they enter the store through [`crate::onboarding::Onboarding`].
#[derive(Clone)]
pub struct SyncEngine {
    provider: Arc<dyn MatchProvider>,
    matches: Arc<dyn MatchStore>,
}

impl SyncEngine {
    pub fn new(provider: Arc<dyn MatchProvider>, matches: Arc<dyn MatchStore>) -> Self {
        Self { provider, matches }
    }

    /// Fetch one team's window and merge it. Returns the number of rows changed.
    ///
    /// Only provider failures are returned as errors. A blank or malformed
    /// payload counts as zero updates.
    #[instrument(level = "info", skip(self, to))]
    pub fn sync_team_window(
        &self,
        team_id: TeamId,
        from: NaiveDate,
        to: Option<NaiveDate>,
        include_live: bool,
    ) -> Result<usize, ProviderError> {
        let body = self.provider.fetch_team_window(team_id, from, to, include_live)?;
        if body.trim().is_empty() {
            info!(team_id, "No content in matches payload");
            return Ok(0);
        }

        let records = match parse_matches(&body) {
            Ok(records) => records,
            Err(e) => {
                warn!(team_id, error = %e, "Failed to parse matches payload");
                return Ok(0);
            }
        };

        let updated = self.merge(team_id, &records);
        debug!(team_id, records = records.len(), updated, "Merged matches payload");
        Ok(updated)
    }

    fn merge(&self, team_id: TeamId, records: &[ProviderMatch]) -> usize {
        let mut updated = 0;
        for record in records {
            let Some(external_id) = record.id else {
                debug!(team_id, "Skipping match record without id");
                continue;
            };
            match self.merge_one(external_id, record) {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(team_id, external_id, error = %e, "Failed to merge match; abandoning payload");
                    break;
                }
            }
        }
        updated
    }

    fn merge_one(&self, external_id: i64, record: &ProviderMatch) -> Result<bool, StoreError> {
        let Some(mut existing) = self.matches.find_by_external_id(external_id)? else {
            return Ok(false);
        };
        if !existing.apply(&record.update()) {
            return Ok(false);
        }
        self.matches.save(&existing)?;
        Ok(true)
    }
}
