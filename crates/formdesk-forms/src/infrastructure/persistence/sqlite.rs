//! SQLite-backed repositories
//!
//! One connection guarded by a mutex; every call runs on the blocking pool.
//! Duplicate content is rejected by the `UNIQUE(content_hash)` constraint so
//! the check and the insert are a single statement.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::domain::aggregates::{FormSchema, Submission, SubmissionData};
use crate::intake::ContentHash;
use crate::ports::{RepoResult, RepositoryError, SchemaRepository, SubmissionRepository};

const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS form_submissions (
    id           TEXT PRIMARY KEY,
    data         TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_form_submissions_created_at ON form_submissions (created_at);

CREATE TABLE IF NOT EXISTS form_schemas (
    name        TEXT PRIMARY KEY,
    description TEXT,
    definition  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#;

const SUBMISSION_COLUMNS: &str = "id, data, created_at, updated_at";

/// SQLite store implementing both repository ports.
#[derive(Clone)]
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Open (or create) a database file and apply migrations.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> RepoResult<Self> {
        let conn = Connection::open(path).map_err(storage)?;
        conn.busy_timeout(busy_timeout).map_err(storage)?;
        conn.pragma_update_and_check(None, "journal_mode", "wal", |_| Ok(()))
            .map_err(storage)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(storage)?)
    }

    fn with_connection(conn: Connection) -> RepoResult<Self> {
        conn.execute_batch(MIGRATIONS).map_err(storage)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn run<T, F>(&self, f: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> RepoResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| RepositoryError::Storage(format!("blocking task failed: {e}")))?
    }
}

fn storage(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    // Fixed precision keeps lexical order equal to time order.
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Serialization(format!("bad timestamp '{raw}': {e}")))
}

struct SubmissionRow {
    id: String,
    data: String,
    created_at: String,
    updated_at: String,
}

impl SubmissionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            data: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    fn into_submission(self) -> RepoResult<Submission> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Serialization(format!("bad id '{}': {e}", self.id)))?;
        let data: SubmissionData = serde_json::from_str(&self.data)?;
        Ok(Submission {
            id,
            data,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn query_submissions(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> RepoResult<Vec<Submission>> {
    let mut stmt = conn.prepare(sql).map_err(storage)?;
    let rows = stmt
        .query_map(args, SubmissionRow::read)
        .map_err(storage)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(storage)?;
    rows.into_iter().map(SubmissionRow::into_submission).collect()
}

#[async_trait]
impl SubmissionRepository for SqliteRepository {
    async fn insert(&self, submission: &Submission, fingerprint: &ContentHash) -> RepoResult<()> {
        let data = serde_json::to_string(&submission.data)?;
        let id = submission.id.to_string();
        let hash = fingerprint.as_str().to_string();
        let created_at = timestamp(&submission.created_at);
        let updated_at = timestamp(&submission.updated_at);

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO form_submissions (id, data, content_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, data, hash, created_at, updated_at],
            )
            .map_err(|err| match err.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => {
                    RepositoryError::Conflict(format!("content hash {hash} already stored"))
                }
                _ => storage(err),
            })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &Uuid) -> RepoResult<Option<Submission>> {
        let id = id.to_string();
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM form_submissions WHERE id = ?1"),
                params![id],
                SubmissionRow::read,
            )
            .optional()
            .map_err(storage)?
            .map(SubmissionRow::into_submission)
            .transpose()
        })
        .await
    }

    async fn find_by_fingerprint(&self, fingerprint: &ContentHash) -> RepoResult<Option<Submission>> {
        let hash = fingerprint.as_str().to_string();
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM form_submissions WHERE content_hash = ?1"),
                params![hash],
                SubmissionRow::read,
            )
            .optional()
            .map_err(storage)?
            .map(SubmissionRow::into_submission)
            .transpose()
        })
        .await
    }

    async fn find_all(&self) -> RepoResult<Vec<Submission>> {
        self.run(|conn| {
            query_submissions(
                conn,
                &format!("SELECT {SUBMISSION_COLUMNS} FROM form_submissions ORDER BY created_at DESC, rowid DESC"),
                [],
            )
        })
        .await
    }

    async fn find_page(&self, offset: usize, limit: usize) -> RepoResult<Vec<Submission>> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| {
            query_submissions(
                conn,
                &format!(
                    "SELECT {SUBMISSION_COLUMNS} FROM form_submissions
                     ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
                ),
                params![limit, offset],
            )
        })
        .await
    }

    async fn count(&self) -> RepoResult<u64> {
        self.run(|conn| {
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM form_submissions", [], |row| row.get(0))
                .map_err(storage)?;
            Ok(n.max(0) as u64)
        })
        .await
    }
}

#[async_trait]
impl SchemaRepository for SqliteRepository {
    async fn upsert(&self, schema: &FormSchema) -> RepoResult<FormSchema> {
        let definition = serde_json::to_string(schema)?;
        let name = schema.name.clone();
        let description = schema.description.clone();
        let now = timestamp(&Utc::now());

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO form_schemas (name, description, definition, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(name) DO UPDATE SET
                     description = excluded.description,
                     definition = excluded.definition,
                     updated_at = excluded.updated_at",
                params![name, description, definition, now],
            )
            .map_err(storage)?;
            Ok(())
        })
        .await?;

        Ok(schema.clone())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<FormSchema>> {
        let name = name.to_string();
        self.run(move |conn| {
            let definition: Option<String> = conn
                .query_row("SELECT definition FROM form_schemas WHERE name = ?1", params![name], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(storage)?;
            definition
                .map(|raw| serde_json::from_str(&raw).map_err(RepositoryError::from))
                .transpose()
        })
        .await
    }

    async fn list(&self) -> RepoResult<Vec<FormSchema>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare("SELECT definition FROM form_schemas ORDER BY created_at DESC, rowid DESC")
                .map_err(storage)?;
            let definitions = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(storage)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage)?;
            definitions
                .iter()
                .map(|raw| serde_json::from_str(raw).map_err(RepositoryError::from))
                .collect()
        })
        .await
    }
}
