use anyhow::Result;
use civic_core::config::AppConfig;
use civic_core::db::SqliteStore;
use civic_core::schema::{Department, Issue, NewsItem};
use civic_core::{DataSource, Dataset, IssueSubmitter, MemorySource, SourceError, SubmissionError};
use std::path::Path;
use tracing::info;

/// The data source selected by configuration.
pub enum Store {
    Memory(MemorySource),
    Sqlite(SqliteStore),
}

impl Store {
    /// SQLite when a database path is configured, otherwise an in-memory copy
    /// of `data_dir` (or the built-in sample city). A database with no rows in
    /// any table is seeded with the same dataset; stored rows are never touched.
    pub fn open(config: &AppConfig, data_dir: Option<&Path>) -> Result<Self> {
        let dataset = || match data_dir {
            Some(dir) => Dataset::load_from_dir(dir),
            None => Dataset::builtin(),
        };

        match &config.storage.db_path {
            Some(path) => {
                let store = SqliteStore::open(path)?;
                if store.is_empty()? {
                    info!(path = %path.display(), "empty database, seeding sample data");
                    store.seed(&dataset()?)?;
                }
                Ok(Store::Sqlite(store))
            }
            None => Ok(Store::Memory(MemorySource::new(dataset()?))),
        }
    }
}

impl DataSource for Store {
    fn list_issues(&self) -> Result<Vec<Issue>, SourceError> {
        match self {
            Store::Memory(source) => source.list_issues(),
            Store::Sqlite(source) => source.list_issues(),
        }
    }

    fn list_departments(&self) -> Result<Vec<Department>, SourceError> {
        match self {
            Store::Memory(source) => source.list_departments(),
            Store::Sqlite(source) => source.list_departments(),
        }
    }

    fn list_news(&self) -> Result<Vec<NewsItem>, SourceError> {
        match self {
            Store::Memory(source) => source.list_news(),
            Store::Sqlite(source) => source.list_news(),
        }
    }
}

impl IssueSubmitter for Store {
    async fn submit_issue(&self, issue: &Issue) -> Result<(), SubmissionError> {
        match self {
            Store::Memory(source) => source.submit_issue(issue).await,
            Store::Sqlite(source) => source.submit_issue(issue).await,
        }
    }
}
