//! Database module for `SQLite` storage (saved drafts, dispatch history)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use uuid::Uuid;

use crate::models::{DispatchOutcome, DispatchTarget, Draft, MediaRef, OutcomeStatus, PlatformId};
use crate::paths;

/// One stored outcome together with the dispatch it belonged to
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    /// Draft that was dispatched
    pub draft_id: Uuid,
    /// What happened
    pub outcome: DispatchOutcome,
    /// When the dispatch finished
    pub dispatched_at: DateTime<Utc>,
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the default location
    pub fn open() -> Result<Self> {
        Self::open_path(&paths::database_path()?)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// In-memory database, for tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory().context("Failed to open database")?,
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS drafts (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                platforms TEXT NOT NULL,
                media_json TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS dispatch_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                draft_id TEXT NOT NULL,
                platform TEXT,
                status TEXT NOT NULL,
                detail_json TEXT NOT NULL,
                dispatched_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_drafts_updated_at ON drafts(updated_at);
            CREATE INDEX IF NOT EXISTS idx_dispatch_log_dispatched_at ON dispatch_log(dispatched_at);
            ",
        )?;

        Ok(())
    }

    // ==================== Drafts ====================

    /// Insert or update a draft
    pub fn save_draft(&self, draft: &Draft) -> Result<()> {
        let media_json = serde_json::to_string(&draft.media)?;
        self.conn.execute(
            r"INSERT INTO drafts (id, text, platforms, media_json, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(id) DO UPDATE SET
                   text = excluded.text,
                   platforms = excluded.platforms,
                   media_json = excluded.media_json,
                   updated_at = excluded.updated_at",
            params![
                draft.id.to_string(),
                draft.text,
                platforms_to_str(&draft.platforms),
                media_json,
                draft.created_at.to_rfc3339(),
                draft.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All drafts, most recently edited first
    pub fn get_drafts(&self) -> Result<Vec<Draft>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, text, platforms, media_json, created_at, updated_at
             FROM drafts ORDER BY updated_at DESC",
        )?;

        let drafts = stmt.query_map([], Self::row_to_draft)?;
        drafts.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// A single draft
    pub fn get_draft(&self, id: Uuid) -> Result<Option<Draft>> {
        self.conn
            .query_row(
                "SELECT id, text, platforms, media_json, created_at, updated_at
                 FROM drafts WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_draft,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find a draft by full id or unique id prefix
    pub fn find_draft(&self, id_or_prefix: &str) -> Result<Option<Draft>> {
        if let Ok(id) = Uuid::parse_str(id_or_prefix) {
            return self.get_draft(id);
        }

        let mut matches: Vec<Draft> = self
            .get_drafts()?
            .into_iter()
            .filter(|d| d.id.to_string().starts_with(id_or_prefix))
            .collect();

        match matches.len() {
            1 => Ok(matches.pop()),
            0 => Ok(None),
            n => anyhow::bail!("Draft id prefix '{id_or_prefix}' is ambiguous ({n} matches)"),
        }
    }

    /// Delete a draft. Returns whether it existed.
    pub fn delete_draft(&self, id: Uuid) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM drafts WHERE id = ?1", params![id.to_string()])?;
        Ok(count > 0)
    }

    fn row_to_draft(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draft> {
        let media_json: String = row.get(3)?;
        let media: Vec<MediaRef> =
            serde_json::from_str(&media_json).map_err(|e| conversion_error(3, e))?;

        Ok(Draft {
            id: parse_uuid(row, 0)?,
            text: row.get(1)?,
            platforms: platforms_from_str(&row.get::<_, String>(2)?),
            media,
            created_at: parse_time(row, 4)?,
            updated_at: parse_time(row, 5)?,
        })
    }

    // ==================== Dispatch log ====================

    /// Append the outcomes of one dispatch
    pub fn record_outcomes(&self, draft_id: Uuid, outcomes: &[DispatchOutcome]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare(
            r"INSERT INTO dispatch_log (draft_id, platform, status, detail_json, dispatched_at)
               VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for outcome in outcomes {
            let detail = serde_json::to_string(&outcome.status)?;
            stmt.execute(params![
                draft_id.to_string(),
                outcome.platform().map(|p| p.as_str()),
                outcome.status.label(),
                detail,
                now,
            ])?;
        }

        Ok(())
    }

    /// Most recent outcomes first
    pub fn recent_outcomes(&self, limit: usize) -> Result<Vec<DispatchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT draft_id, platform, detail_json, dispatched_at
             FROM dispatch_log ORDER BY id DESC LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = stmt.query_map(params![limit], |row| {
            let platform: Option<String> = row.get(1)?;
            let target = match platform {
                Some(p) => DispatchTarget::Platform(
                    p.parse::<PlatformId>().map_err(|e| conversion_error(1, e))?,
                ),
                None => DispatchTarget::Draft,
            };
            let detail: String = row.get(2)?;
            let status: OutcomeStatus =
                serde_json::from_str(&detail).map_err(|e| conversion_error(2, e))?;

            Ok(DispatchRecord {
                draft_id: parse_uuid(row, 0)?,
                outcome: DispatchOutcome { target, status },
                dispatched_at: parse_time(row, 3)?,
            })
        })?;

        records.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn platforms_to_str(platforms: &[PlatformId]) -> String {
    platforms
        .iter()
        .map(PlatformId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn platforms_from_str(s: &str) -> Vec<PlatformId> {
    let mut platforms: Vec<PlatformId> = Vec::new();
    for platform in s.split(',').filter_map(|p| p.parse().ok()) {
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    platforms
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_uuid(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&row.get::<_, String>(column)?).map_err(|e| conversion_error(column, e))
}

fn parse_time(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&row.get::<_, String>(column)?)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FailureKind, MediaKind};
    use crate::validation::ValidationError;
    use tempfile::tempdir;

    #[test]
    fn test_database_init_twice() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        drop(Database::open_path(&path).unwrap());
        let db = Database::open_path(&path).unwrap();
        assert!(db.get_drafts().unwrap().is_empty());
    }

    #[test]
    fn test_draft_crud() {
        let db = Database::open_in_memory().unwrap();

        let mut draft = Draft::new("Hello #world")
            .with_platforms([PlatformId::Instagram, PlatformId::Twitter])
            .with_media(MediaRef::new("/tmp/cat.mp4", MediaKind::Video));
        db.save_draft(&draft).unwrap();

        let loaded = db.get_draft(draft.id).unwrap().unwrap();
        assert_eq!(loaded.text, "Hello #world");
        assert_eq!(loaded.platforms, vec![PlatformId::Instagram, PlatformId::Twitter]);
        assert_eq!(loaded.media, draft.media);

        draft.set_text("Edited text");
        db.save_draft(&draft).unwrap();
        let drafts = db.get_drafts().unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, "Edited text");

        assert!(db.delete_draft(draft.id).unwrap());
        assert!(!db.delete_draft(draft.id).unwrap());
        assert_eq!(db.get_draft(draft.id).unwrap(), None);
    }

    #[test]
    fn test_find_draft_by_prefix() {
        let db = Database::open_in_memory().unwrap();
        let draft = Draft::new("prefix lookup");
        db.save_draft(&draft).unwrap();

        let id = draft.id.to_string();
        assert_eq!(db.find_draft(&id[..8]).unwrap().map(|d| d.id), Some(draft.id));
        assert_eq!(db.find_draft(&id).unwrap().map(|d| d.id), Some(draft.id));
        assert_eq!(db.find_draft("zzzz").unwrap(), None);
    }

    #[test]
    fn test_stored_platforms_are_deduplicated() {
        let db = Database::open_in_memory().unwrap();
        let mut draft = Draft::new("twice over");
        draft.platforms = vec![PlatformId::Twitter, PlatformId::Facebook, PlatformId::Twitter];
        db.save_draft(&draft).unwrap();

        let loaded = db.get_draft(draft.id).unwrap().unwrap();
        assert_eq!(loaded.platforms, vec![PlatformId::Twitter, PlatformId::Facebook]);
        assert_eq!(
            platforms_from_str("twitter,bogus,twitter,instagram"),
            vec![PlatformId::Twitter, PlatformId::Instagram]
        );
    }

    #[test]
    fn test_dispatch_log() {
        let db = Database::open_in_memory().unwrap();
        let draft_id = Uuid::new_v4();
        let outcomes = vec![
            DispatchOutcome::skipped(PlatformId::Instagram, ValidationError::MissingRequiredMedia),
            DispatchOutcome::succeeded(PlatformId::Twitter, Some("42".to_string())),
            DispatchOutcome::failed(PlatformId::Facebook, FailureKind::ServerError(503)),
        ];
        db.record_outcomes(draft_id, &outcomes).unwrap();
        db.record_outcomes(draft_id, &[DispatchOutcome::rejected(ValidationError::TooShort)])
            .unwrap();

        let records = db.recent_outcomes(10).unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.draft_id == draft_id));
        assert_eq!(
            records[0].outcome,
            DispatchOutcome::rejected(ValidationError::TooShort)
        );
        let oldest: Vec<_> = records[1..].iter().rev().map(|r| r.outcome.clone()).collect();
        assert_eq!(oldest, outcomes);

        assert_eq!(db.recent_outcomes(2).unwrap().len(), 2);
    }
}
