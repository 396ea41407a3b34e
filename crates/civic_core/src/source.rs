use crate::dataset::Dataset;
use crate::schema::{Department, Issue, NewsItem};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored record is not valid json: {0}")]
    Record(#[from] serde_json::Error),
}

/// Failure of the external write that stores a new issue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("submission timed out after {0:?}")]
    TimedOut(Duration),
    #[error("submission service unavailable: {0}")]
    Unavailable(String),
    #[error("submission rejected: {0}")]
    Rejected(String),
}

impl SubmissionError {
    /// Transient failures may succeed when attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SubmissionError::TimedOut(_) | SubmissionError::Unavailable(_)
        )
    }
}

/// Read side of the data boundary. Every call returns an ordered snapshot.
pub trait DataSource {
    fn list_issues(&self) -> Result<Vec<Issue>, SourceError>;
    fn list_departments(&self) -> Result<Vec<Department>, SourceError>;
    fn list_news(&self) -> Result<Vec<NewsItem>, SourceError>;

    fn snapshot(&self) -> Result<Dataset, SourceError> {
        Ok(Dataset {
            issues: self.list_issues()?,
            departments: self.list_departments()?,
            news: self.list_news()?,
        })
    }
}

/// Write side of the data boundary: persists a freshly built issue.
pub trait IssueSubmitter {
    fn submit_issue(&self, issue: &Issue) -> impl Future<Output = Result<(), SubmissionError>>;
}

impl<T: IssueSubmitter + ?Sized> IssueSubmitter for &T {
    fn submit_issue(&self, issue: &Issue) -> impl Future<Output = Result<(), SubmissionError>> {
        (**self).submit_issue(issue)
    }
}

/// Collections held in memory; submitted issues are appended in order.
#[derive(Debug, Default)]
pub struct MemorySource {
    issues: Mutex<Vec<Issue>>,
    departments: Vec<Department>,
    news: Vec<NewsItem>,
}

impl MemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            issues: Mutex::new(dataset.issues),
            departments: dataset.departments,
            news: dataset.news,
        }
    }

    fn issues(&self) -> MutexGuard<'_, Vec<Issue>> {
        self.issues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Dataset> for MemorySource {
    fn from(dataset: Dataset) -> Self {
        Self::new(dataset)
    }
}

impl DataSource for MemorySource {
    fn list_issues(&self) -> Result<Vec<Issue>, SourceError> {
        Ok(self.issues().clone())
    }

    fn list_departments(&self) -> Result<Vec<Department>, SourceError> {
        Ok(self.departments.clone())
    }

    fn list_news(&self) -> Result<Vec<NewsItem>, SourceError> {
        Ok(self.news.clone())
    }
}

impl IssueSubmitter for MemorySource {
    async fn submit_issue(&self, issue: &Issue) -> Result<(), SubmissionError> {
        let mut issues = self.issues();
        if issues.iter().any(|existing| existing.id == issue.id) {
            return Err(SubmissionError::Rejected(format!(
                "issue id {} already exists",
                issue.id
            )));
        }
        issues.push(issue.clone());
        Ok(())
    }
}
