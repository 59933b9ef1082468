use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::error::SyncError;
use crate::football_data::MatchProvider;
use crate::model::TeamId;
use crate::model::fixture::{MatchRecord, MatchStatus};
use crate::model::provider::{ProviderMatch, ProviderTeam, parse_matches};
use crate::model::team::TeamRecord;
use crate::store::{MatchStore, TeamStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingReport {
    pub teams_upserted: usize,
    pub matches_created: usize,
    /// Records without an id, kickoff or both team ids.
    pub skipped: usize,
}

/// Explicit registration of a team's fixtures.
///
/// Creates team rows and match rows on first observation. Matches that
/// already exist are left alone; keeping them fresh is the sync engine's job.
pub struct Onboarding {
    provider: Arc<dyn MatchProvider>,
    matches: Arc<dyn MatchStore>,
    teams: Arc<dyn TeamStore>,
}

impl Onboarding {
    pub fn new(provider: Arc<dyn MatchProvider>, matches: Arc<dyn MatchStore>, teams: Arc<dyn TeamStore>) -> Self {
        Self { provider, matches, teams }
    }

    #[instrument(level = "info", skip(self, to))]
    pub fn register_team_window(
        &self,
        team_id: TeamId,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<OnboardingReport, SyncError> {
        let body = self.provider.fetch_team_window(team_id, from, to, true)?;
        let mut report = OnboardingReport::default();
        if body.trim().is_empty() {
            return Ok(report);
        }

        let mut seen_teams: HashSet<TeamId> = HashSet::new();
        for record in parse_matches(&body)? {
            let (Some(external_id), Some(kickoff_at), Some(home), Some(away)) =
                (record.id, record.utc_date, record.home_team.as_ref(), record.away_team.as_ref())
            else {
                report.skipped += 1;
                continue;
            };
            let (Some(home_id), Some(away_id)) = (home.id, away.id) else {
                report.skipped += 1;
                continue;
            };

            for team in [home, away] {
                if let Some(id) = team.id {
                    if seen_teams.insert(id) {
                        self.upsert_team(id, team, &record)?;
                        report.teams_upserted += 1;
                    }
                }
            }

            if self.matches.find_by_external_id(external_id)?.is_some() {
                continue;
            }
            let update = record.update();
            let created = MatchRecord {
                id: None,
                external_id: Some(external_id),
                home_team_id: home_id,
                away_team_id: away_id,
                kickoff_at,
                venue: record.venue.clone(),
                status: update.status.unwrap_or(MatchStatus::Scheduled),
                home_score: update.home_score,
                away_score: update.away_score,
                competition: record.competition_name().map(str::to_string),
            };
            self.matches.save(&created)?;
            debug!(external_id, home_id, away_id, "Registered match");
            report.matches_created += 1;
        }

        info!(
            team_id,
            teams = report.teams_upserted,
            matches = report.matches_created,
            skipped = report.skipped,
            "Onboarding finished"
        );
        Ok(report)
    }

    fn upsert_team(&self, id: TeamId, team: &ProviderTeam, record: &ProviderMatch) -> Result<(), SyncError> {
        let existing = self.teams.find_team(id)?;
        // A team plays in several competitions; keep the first league seen
        let league = existing
            .as_ref()
            .and_then(|t| t.league.clone())
            .or_else(|| record.competition_name().map(str::to_string));
        let name = team
            .name
            .clone()
            .or_else(|| existing.as_ref().map(|t| t.name.clone()))
            .unwrap_or_else(|| format!("Team {id}"));
        self.teams.save_team(&TeamRecord {
            id,
            name,
            short_name: team.short_name.clone(),
            tla: team.tla.clone(),
            league,
            external_ref: Some(id.to_string()),
        })?;
        Ok(())
    }
}
