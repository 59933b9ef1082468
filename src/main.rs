use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use score_sync::config::Config;
use score_sync::cooldown::CooldownTracker;
use score_sync::driver::run_scheduled;
use score_sync::football_data::{FootballData, MatchProvider};
use score_sync::model::TeamId;
use score_sync::onboarding::Onboarding;
use score_sync::scheduler::ScoreScheduler;
use score_sync::store::{MatchStore, SqliteStore, SubscriptionRegistry, TeamStore};
use score_sync::sync::SyncEngine;

type Error = Box<dyn std::error::Error + Send + Sync>;

const USAGE: &str = "usage: score-sync [run | tick | register <team-id>...]";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_current_span(false)
        .with_span_list(false)
        .with_target(false)
        .with_ansi(false)
        .try_init();

    let config = Config::from_env()?;
    let store = Arc::new(SqliteStore::open(&config.database_path)?);
    let provider: Arc<dyn MatchProvider> = Arc::new(FootballData::new(&config.provider));
    let matches: Arc<dyn MatchStore> = store.clone();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("register") => {
            let teams: Arc<dyn TeamStore> = store.clone();
            let onboarding = Arc::new(Onboarding::new(provider, matches, teams));
            register(onboarding, &args[1..]).await
        }
        Some("tick") => {
            let scheduler = build_scheduler(&config, provider, matches, store);
            let report = scheduler.tick(Utc::now(), &CancellationToken::new()).await;
            info!(?report, "Single tick finished");
            Ok(())
        }
        None | Some("run") => {
            let scheduler = Arc::new(build_scheduler(&config, provider, matches, store));
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "Failed to listen for ctrl-c");
                }
            };
            run_scheduled(scheduler, &config.fetcher.cron, shutdown).await?;
            Ok(())
        }
        Some(other) => Err(format!("unknown command {other:?}\n{USAGE}").into()),
    }
}

fn build_scheduler(
    config: &Config,
    provider: Arc<dyn MatchProvider>,
    matches: Arc<dyn MatchStore>,
    registry: Arc<SqliteStore>,
) -> ScoreScheduler {
    let registry: Arc<dyn SubscriptionRegistry> = registry;
    let engine = SyncEngine::new(provider, matches);
    let cooldown = Arc::new(CooldownTracker::new(config.fetcher.min_interval));
    ScoreScheduler::new(config.fetcher.clone(), engine, registry, cooldown)
}

async fn register(onboarding: Arc<Onboarding>, raw_ids: &[String]) -> Result<(), Error> {
    if raw_ids.is_empty() {
        return Err(USAGE.into());
    }
    let ids = raw_ids
        .iter()
        .map(|raw| raw.parse::<TeamId>().map_err(|e| format!("invalid team id {raw:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    let today = Utc::now().date_naive();
    for team_id in ids {
        let onboarding = Arc::clone(&onboarding);
        match tokio::task::spawn_blocking(move || onboarding.register_team_window(team_id, today, None)).await? {
            Ok(report) => info!(team_id, ?report, "Registered team fixtures"),
            Err(e) => error!(team_id, error = %e, "Failed to register team fixtures"),
        }
    }
    Ok(())
}
