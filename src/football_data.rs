use chrono::NaiveDate;
use tracing::{error, info_span, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::TeamId;
use crate::model::window::SyncWindow;

/// Result cap requested per call.
const RESULT_LIMIT: &str = "200";

/// Source of raw match payloads for a team.
pub trait MatchProvider: Send + Sync {
    /// Fetch the raw matches document for `team_id` between `from` and `to`.
    /// The window is clamped to the provider's maximum span before the call.
    fn fetch_team_window(
        &self,
        team_id: TeamId,
        from: NaiveDate,
        to: Option<NaiveDate>,
        include_live: bool,
    ) -> Result<String, ProviderError>;
}

/// Blocking client for the football-data.org v4 API.
#[derive(Clone)]
pub struct FootballData {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    max_window_days: u32,
    statuses_upcoming: String,
    statuses_active: String,
}

impl FootballData {
    pub fn new(config: &ProviderConfig) -> Self {
        // Non-2xx responses come back as Ok so the body can be reported
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            max_window_days: config.max_window_days,
            statuses_upcoming: config.statuses_upcoming.clone(),
            statuses_active: config.statuses_active.clone(),
        }
    }

    pub fn window(&self, from: NaiveDate, to: Option<NaiveDate>) -> SyncWindow {
        SyncWindow::bounded(from, to, self.max_window_days)
    }

    pub fn statuses(&self, include_live: bool) -> &str {
        if include_live { &self.statuses_active } else { &self.statuses_upcoming }
    }
}

impl MatchProvider for FootballData {
    #[instrument(level = "info", skip(self, to))]
    fn fetch_team_window(
        &self,
        team_id: TeamId,
        from: NaiveDate,
        to: Option<NaiveDate>,
        include_live: bool,
    ) -> Result<String, ProviderError> {
        let window = self.window(from, to);
        let url = format!("{}/teams/{}/matches", self.base_url, team_id);
        let response_result = {
            let _span = info_span!("football_data_fetch", url = %url, to = %window.to).entered();
            self.agent
                .get(&url)
                .header("X-Auth-Token", self.token.as_str())
                .header("Accept", "application/json")
                .query("dateFrom", window.from.to_string())
                .query("dateTo", window.to.to_string())
                .query("status", self.statuses(include_live))
                .query("limit", RESULT_LIMIT)
                .query("sort", "utcDate")
                .call()
        };

        let response = response_result.map_err(|e| {
            error!(error = %e, url = %url, "Request to football-data failed");
            ProviderError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string().map_err(|e| {
            error!(error = %e, "Failed to read football-data response body");
            ProviderError::Transport(e.to_string())
        })?;

        if !(200..300).contains(&status) {
            warn!(status, body = %body, "football-data returned non-success status");
            return Err(ProviderError::Status { status, body });
        }
        Ok(body)
    }
}
