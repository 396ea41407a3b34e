use crate::dataset::Dataset;
use crate::schema::{Department, Issue, NewsItem};
use crate::source::{DataSource, IssueSubmitter, SourceError, SubmissionError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::de::DeserializeOwned;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

/// SQLite-backed store. Rows keep first-insertion order through their rowid.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SourceError> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;
        Ok(Self { conn })
    }

    pub fn seed(&self, dataset: &Dataset) -> Result<(), SourceError> {
        for department in &dataset.departments {
            self.upsert_department(department)?;
        }
        for issue in &dataset.issues {
            self.upsert_issue(issue)?;
        }
        for item in &dataset.news {
            self.upsert_news(item)?;
        }
        info!(
            issues = dataset.issues.len(),
            departments = dataset.departments.len(),
            news = dataset.news.len(),
            "seeded sqlite store"
        );
        Ok(())
    }

    pub fn upsert_issue(&self, issue: &Issue) -> Result<(), SourceError> {
        let record_json = serde_json::to_string(issue)?;
        let reported_at = issue
            .reported_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| issue.reported_at.unix_timestamp().to_string());

        self.conn.execute(
            r#"
            INSERT INTO issues
              (id, category, priority, status, department_id, reported_at, record_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
              category=excluded.category,
              priority=excluded.priority,
              status=excluded.status,
              department_id=excluded.department_id,
              reported_at=excluded.reported_at,
              record_json=excluded.record_json
            "#,
            params![
                issue.id,
                issue.category.as_str(),
                issue.priority.as_str(),
                issue.status.as_str(),
                issue.department_id,
                reported_at,
                record_json
            ],
        )?;
        Ok(())
    }

    pub fn upsert_department(&self, department: &Department) -> Result<(), SourceError> {
        let record_json = serde_json::to_string(department)?;
        self.conn.execute(
            r#"
            INSERT INTO departments (id, name, kind, record_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
              name=excluded.name,
              kind=excluded.kind,
              record_json=excluded.record_json
            "#,
            params![
                department.id,
                department.name,
                department.kind.as_str(),
                record_json
            ],
        )?;
        Ok(())
    }

    pub fn upsert_news(&self, item: &NewsItem) -> Result<(), SourceError> {
        let record_json = serde_json::to_string(item)?;
        self.conn.execute(
            r#"
            INSERT INTO news (id, kind, department_id, record_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
              kind=excluded.kind,
              department_id=excluded.department_id,
              record_json=excluded.record_json
            "#,
            params![item.id, item.kind.as_str(), item.department_id, record_json],
        )?;
        Ok(())
    }

    pub fn issue_exists(&self, id: &str) -> Result<bool, SourceError> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM issues WHERE id = ?1", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// True when no issue, department or news row has been stored yet.
    pub fn is_empty(&self) -> Result<bool, SourceError> {
        for table in ["issues", "departments", "news"] {
            let count: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            if count > 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn list_records<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, SourceError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT record_json FROM {table} ORDER BY rowid"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        debug!(table, count = records.len(), "listed records");
        Ok(records)
    }
}

fn init(conn: &Connection) -> Result<(), SourceError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS issues (
          id TEXT PRIMARY KEY,
          category TEXT NOT NULL,
          priority TEXT NOT NULL,
          status TEXT NOT NULL,
          department_id TEXT,
          reported_at TEXT NOT NULL,
          record_json TEXT NOT NULL,
          inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_issues_category ON issues(category);

        CREATE TABLE IF NOT EXISTS departments (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          kind TEXT NOT NULL,
          record_json TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS news (
          id TEXT PRIMARY KEY,
          kind TEXT NOT NULL,
          department_id TEXT,
          record_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_news_kind ON news(kind);
        "#,
    )?;
    Ok(())
}

impl DataSource for SqliteStore {
    fn list_issues(&self) -> Result<Vec<Issue>, SourceError> {
        self.list_records("issues")
    }

    fn list_departments(&self) -> Result<Vec<Department>, SourceError> {
        self.list_records("departments")
    }

    fn list_news(&self) -> Result<Vec<NewsItem>, SourceError> {
        self.list_records("news")
    }
}

impl IssueSubmitter for SqliteStore {
    async fn submit_issue(&self, issue: &Issue) -> Result<(), SubmissionError> {
        let exists = self
            .issue_exists(&issue.id)
            .map_err(|err| SubmissionError::Unavailable(err.to_string()))?;
        if exists {
            return Err(SubmissionError::Rejected(format!(
                "issue id {} already exists",
                issue.id
            )));
        }
        self.upsert_issue(issue).map_err(submission_error)
    }
}

/// Busy and locked databases clear up on their own; anything else is final.
fn submission_error(err: SourceError) -> SubmissionError {
    match &err {
        SourceError::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            SubmissionError::Unavailable(err.to_string())
        }
        _ => SubmissionError::Rejected(err.to_string()),
    }
}
