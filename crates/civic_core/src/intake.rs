use crate::schema::{Issue, IssueCategory, IssueDraft, IssuePriority, IssueStatus, Location};
use crate::source::{IssueSubmitter, SubmissionError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

pub const ANONYMOUS_REPORTER: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every field of a draft that failed validation, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid report ({})", render_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|error| error.field).collect()
    }
}

fn render_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// A draft whose required fields are present and whose tags are recognized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub priority: IssuePriority,
    pub is_anonymous: bool,
    pub images: Vec<String>,
    pub location: Option<Location>,
    pub reported_by: Option<String>,
}

pub fn validate_draft(draft: &IssueDraft) -> Result<ValidDraft, ValidationError> {
    let mut errors = Vec::new();

    let title = draft.title.trim();
    if title.is_empty() {
        errors.push(FieldError {
            field: "title",
            reason: "must not be empty".to_string(),
        });
    }

    let description = draft.description.trim();
    if description.is_empty() {
        errors.push(FieldError {
            field: "description",
            reason: "must not be empty".to_string(),
        });
    }

    let category = draft.category.parse::<IssueCategory>().map_err(|err| {
        errors.push(FieldError {
            field: "category",
            reason: err.to_string(),
        })
    });

    let priority = draft.priority.parse::<IssuePriority>().map_err(|err| {
        errors.push(FieldError {
            field: "priority",
            reason: err.to_string(),
        })
    });

    match (category, priority) {
        (Ok(category), Ok(priority)) if errors.is_empty() => Ok(ValidDraft {
            title: title.to_string(),
            description: description.to_string(),
            category,
            priority,
            is_anonymous: draft.is_anonymous,
            images: draft
                .images
                .iter()
                .map(|image| image.trim())
                .filter(|image| !image.is_empty())
                .map(str::to_string)
                .collect(),
            location: draft.location.clone(),
            reported_by: draft
                .reported_by
                .as_deref()
                .map(str::trim)
                .filter(|reporter| !reporter.is_empty())
                .map(str::to_string),
        }),
        _ => Err(ValidationError { errors }),
    }
}

/// Turns a validated draft into a newly reported issue.
pub fn build_issue(draft: ValidDraft, id: String, reported_at: OffsetDateTime) -> Issue {
    let reported_by = match (draft.is_anonymous, draft.reported_by) {
        (false, Some(reporter)) => reporter,
        _ => ANONYMOUS_REPORTER.to_string(),
    };

    Issue {
        id,
        title: draft.title,
        description: draft.description,
        category: draft.category,
        priority: draft.priority,
        status: IssueStatus::Reported,
        location: draft.location.unwrap_or_else(Location::unspecified),
        images: draft.images,
        is_anonymous: draft.is_anonymous,
        reported_by,
        reported_at,
        upvotes: 0,
        assigned_to: None,
        department_id: None,
        estimated_resolution: None,
        actual_resolution: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakePolicy {
    /// Upper bound for a single submission attempt.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 1,
        }
    }
}

pub struct ReportIntake<S> {
    submitter: S,
    policy: IntakePolicy,
}

impl<S: IssueSubmitter> ReportIntake<S> {
    pub fn new(submitter: S, policy: IntakePolicy) -> Self {
        Self { submitter, policy }
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    pub fn policy(&self) -> IntakePolicy {
        self.policy
    }

    /// Validates `draft` and hands the resulting issue to the submitter.
    ///
    /// Nothing is sent when validation fails. Timeouts and unavailability are
    /// retried up to `max_retries` times; rejections are returned at once.
    pub async fn submit(&self, draft: &IssueDraft) -> Result<Issue, IntakeError> {
        let valid = validate_draft(draft)?;
        let issue = build_issue(
            valid,
            Uuid::new_v4().to_string(),
            OffsetDateTime::now_utc(),
        );

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let pending = self.submitter.submit_issue(&issue);
            let outcome = match tokio::time::timeout(self.policy.timeout, pending).await {
                Ok(result) => result,
                Err(_) => Err(SubmissionError::TimedOut(self.policy.timeout)),
            };

            match outcome {
                Ok(()) => {
                    info!(id = %issue.id, category = %issue.category, attempt, "issue reported");
                    return Ok(issue);
                }
                Err(err) if err.is_transient() && attempt <= self.policy.max_retries => {
                    warn!(id = %issue.id, attempt, error = %err, "submission failed, retrying");
                }
                Err(err) => {
                    warn!(id = %issue.id, attempt, error = %err, "submission failed");
                    return Err(IntakeError::Submission(err));
                }
            }
        }
    }
}
