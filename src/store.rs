use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::model::TeamId;
use crate::model::fixture::{MatchRecord, MatchStatus};
use crate::model::team::TeamRecord;

/// Match rows keyed by the provider's external id.
pub trait MatchStore: Send + Sync {
    fn find_by_external_id(&self, external_id: i64) -> Result<Option<MatchRecord>, StoreError>;

    /// Insert when `record.id` is `None`, otherwise update in place.
    /// Returns the record as stored, with its local id.
    fn save(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError>;
}

pub trait TeamStore: Send + Sync {
    fn find_team(&self, id: TeamId) -> Result<Option<TeamRecord>, StoreError>;

    fn save_team(&self, team: &TeamRecord) -> Result<(), StoreError>;
}

/// Supplies the teams users are currently subscribed to.
pub trait SubscriptionRegistry: Send + Sync {
    fn list_active_team_ids(&self) -> Result<Vec<TeamId>, StoreError>;
}

/// SQLite-backed store for teams, subscriptions and matches.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = path.as_ref();
        if let Some(parent) = db_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }
        }
        let conn = Connection::open(db_path)?;
        for (pragma, value) in [("journal_mode", "WAL"), ("synchronous", "NORMAL")] {
            if let Err(e) = conn.pragma_update(None, pragma, value) {
                warn!(pragma, value, error = %e, "Failed to set sqlite pragma");
            }
        }
        info!(path = %db_path.display(), "Opened sqlite store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Subscribe `user_email` to `team_id`. Returns false if the pair already existed.
    pub fn subscribe(&self, user_email: &str, team_id: TeamId) -> Result<bool, StoreError> {
        let changed = self.conn()?.execute(
            "INSERT OR IGNORE INTO subscription(user_email, team_id) VALUES (?1, ?2)",
            params![user_email, team_id],
        )?;
        Ok(changed > 0)
    }

    pub fn unsubscribe(&self, user_email: &str, team_id: TeamId) -> Result<bool, StoreError> {
        let changed = self.conn()?.execute(
            "DELETE FROM subscription WHERE user_email = ?1 AND team_id = ?2",
            params![user_email, team_id],
        )?;
        Ok(changed > 0)
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS team (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            short_name TEXT,
            tla TEXT,
            league TEXT,
            external_ref TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS subscription (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_email TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_email, team_id)
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            kickoff_at TEXT NOT NULL,
            venue TEXT,
            status TEXT NOT NULL DEFAULT 'scheduled',
            home_score INTEGER,
            away_score INTEGER,
            external_id INTEGER UNIQUE,
            competition TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_matches_kickoff ON matches(kickoff_at);
        "#,
    )?;
    Ok(())
}

/// Columns as read from sqlite, before decoding text fields.
struct MatchRow {
    id: i64,
    external_id: Option<i64>,
    home_team_id: i64,
    away_team_id: i64,
    kickoff_at: String,
    venue: Option<String>,
    status: String,
    home_score: Option<i32>,
    away_score: Option<i32>,
    competition: Option<String>,
}

const MATCH_COLUMNS: &str =
    "id, external_id, home_team_id, away_team_id, kickoff_at, venue, status, home_score, away_score, competition";

impl MatchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            home_team_id: row.get(2)?,
            away_team_id: row.get(3)?,
            kickoff_at: row.get(4)?,
            venue: row.get(5)?,
            status: row.get(6)?,
            home_score: row.get(7)?,
            away_score: row.get(8)?,
            competition: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<MatchRecord, StoreError> {
        let kickoff_at = DateTime::parse_from_rfc3339(&self.kickoff_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Corrupt(format!("match {} kickoff_at: {e}", self.id)))?;
        let status = self
            .status
            .parse::<MatchStatus>()
            .map_err(|e| StoreError::Corrupt(format!("match {}: {e}", self.id)))?;
        Ok(MatchRecord {
            id: Some(self.id),
            external_id: self.external_id,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            kickoff_at,
            venue: self.venue,
            status,
            home_score: self.home_score,
            away_score: self.away_score,
            competition: self.competition,
        })
    }
}

impl MatchStore for SqliteStore {
    fn find_by_external_id(&self, external_id: i64) -> Result<Option<MatchRecord>, StoreError> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE external_id = ?1");
        let row = self
            .conn()?
            .query_row(&sql, params![external_id], MatchRow::from_row)
            .optional()?;
        row.map(MatchRow::into_record).transpose()
    }

    /// Updates touch status and scores only; teams and kickoff are fixed at insert.
    fn save(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError> {
        let conn = self.conn()?;
        let mut saved = record.clone();
        match record.id {
            Some(id) => {
                conn.execute(
                    "UPDATE matches SET status = ?1, home_score = ?2, away_score = ?3 WHERE id = ?4",
                    params![record.status.as_str(), record.home_score, record.away_score, id],
                )?;
            }
            None => {
                conn.execute(
                    r#"
                    INSERT INTO matches(home_team_id, away_team_id, kickoff_at, venue, status, home_score, away_score, external_id, competition)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        record.home_team_id,
                        record.away_team_id,
                        record.kickoff_at.to_rfc3339(),
                        record.venue,
                        record.status.as_str(),
                        record.home_score,
                        record.away_score,
                        record.external_id,
                        record.competition,
                    ],
                )?;
                saved.id = Some(conn.last_insert_rowid());
            }
        }
        Ok(saved)
    }
}

impl TeamStore for SqliteStore {
    fn find_team(&self, id: TeamId) -> Result<Option<TeamRecord>, StoreError> {
        let team = self
            .conn()?
            .query_row(
                "SELECT id, name, short_name, tla, league, external_ref FROM team WHERE id = ?1",
                params![id],
                |row| {
                    Ok(TeamRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        short_name: row.get(2)?,
                        tla: row.get(3)?,
                        league: row.get(4)?,
                        external_ref: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(team)
    }

    fn save_team(&self, team: &TeamRecord) -> Result<(), StoreError> {
        self.conn()?.execute(
            r#"
            INSERT INTO team(id, name, short_name, tla, league, external_ref)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name=excluded.name,
                short_name=excluded.short_name,
                tla=excluded.tla,
                league=excluded.league,
                external_ref=excluded.external_ref
            "#,
            params![team.id, team.name, team.short_name, team.tla, team.league, team.external_ref],
        )?;
        Ok(())
    }
}

impl SubscriptionRegistry for SqliteStore {
    fn list_active_team_ids(&self) -> Result<Vec<TeamId>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT team_id FROM subscription ORDER BY team_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, TeamId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
