use thiserror::Error;

/// Failure talking to the match-data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider request failed: {0}")]
    Transport(String),
}

/// Payload did not have the expected shape.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no `matches` array")]
    MissingMatches,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Invalid configuration. Fatal at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must not be {what}")]
    OutOfRange { key: &'static str, what: &'static str },

    #[error("invalid cron cadence {expr:?}: {reason}")]
    Cadence { expr: String, reason: String },
}

/// Errors surfaced by flows that must report both fetch and storage failures.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure starting or stopping the cron driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("job scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}
