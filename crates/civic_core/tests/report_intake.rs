use civic_core::intake::{IntakeError, IntakePolicy, ReportIntake};
use civic_core::schema::{
    Issue, IssueCategory, IssueDraft, IssuePriority, IssueStatus, Location,
};
use civic_core::{DataSource, Dataset, IssueSubmitter, MemorySource, SubmissionError};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fails with the queued errors first, then stores every issue it is given.
#[derive(Default)]
struct ScriptedSubmitter {
    failures: Mutex<VecDeque<SubmissionError>>,
    stall: Option<Duration>,
    calls: AtomicUsize,
    stored: Mutex<Vec<Issue>>,
}

impl ScriptedSubmitter {
    fn failing(failures: Vec<SubmissionError>) -> Self {
        Self {
            failures: Mutex::new(failures.into()),
            ..Self::default()
        }
    }

    fn stalling(delay: Duration) -> Self {
        Self {
            stall: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IssueSubmitter for ScriptedSubmitter {
    async fn submit_issue(&self, issue: &Issue) -> Result<(), SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.stored.lock().unwrap().push(issue.clone());
        Ok(())
    }
}

fn pothole_draft() -> IssueDraft {
    IssueDraft {
        title: "Pothole".to_string(),
        description: "Big one".to_string(),
        category: "pothole".to_string(),
        priority: "high".to_string(),
        ..IssueDraft::default()
    }
}

#[tokio::test]
async fn accepted_draft_becomes_reported_issue() {
    let intake = ReportIntake::new(ScriptedSubmitter::default(), IntakePolicy::default());
    let issue = intake.submit(&pothole_draft()).await.expect("submission succeeds");

    assert!(!issue.id.is_empty());
    assert_eq!(issue.category, IssueCategory::Pothole);
    assert_eq!(issue.priority, IssuePriority::High);
    assert_eq!(issue.status, IssueStatus::Reported);
    assert_eq!(issue.upvotes, 0);
    assert_eq!(issue.location, Location::unspecified());
    assert_eq!(intake.submitter().stored.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_draft_is_never_sent() {
    let intake = ReportIntake::new(ScriptedSubmitter::default(), IntakePolicy::default());
    let mut draft = pothole_draft();
    draft.title.clear();

    match intake.submit(&draft).await {
        Err(IntakeError::Validation(err)) => assert_eq!(err.fields(), vec!["title"]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(intake.submitter().calls(), 0);
}

#[tokio::test]
async fn transient_failure_is_retried_once() {
    let submitter =
        ScriptedSubmitter::failing(vec![SubmissionError::Unavailable("503".to_string())]);
    let intake = ReportIntake::new(submitter, IntakePolicy::default());

    intake.submit(&pothole_draft()).await.expect("second attempt succeeds");
    assert_eq!(intake.submitter().calls(), 2);
}

#[tokio::test]
async fn retry_budget_is_bounded() {
    let submitter = ScriptedSubmitter::failing(vec![
        SubmissionError::Unavailable("503".to_string()),
        SubmissionError::Unavailable("503".to_string()),
    ]);
    let intake = ReportIntake::new(submitter, IntakePolicy::default());

    match intake.submit(&pothole_draft()).await {
        Err(IntakeError::Submission(SubmissionError::Unavailable(_))) => {}
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert_eq!(intake.submitter().calls(), 2);
    assert!(intake.submitter().stored.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rejection_is_not_retried() {
    let submitter =
        ScriptedSubmitter::failing(vec![SubmissionError::Rejected("quota".to_string())]);
    let intake = ReportIntake::new(submitter, IntakePolicy::default());

    let err = intake.submit(&pothole_draft()).await.unwrap_err();
    assert!(matches!(
        err,
        IntakeError::Submission(SubmissionError::Rejected(_))
    ));
    assert_eq!(intake.submitter().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_submission_times_out() {
    let policy = IntakePolicy {
        timeout: Duration::from_millis(200),
        max_retries: 1,
    };
    let intake = ReportIntake::new(ScriptedSubmitter::stalling(Duration::from_secs(60)), policy);

    match intake.submit(&pothole_draft()).await {
        Err(IntakeError::Submission(SubmissionError::TimedOut(after))) => {
            assert_eq!(after, Duration::from_millis(200));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(intake.submitter().calls(), 2);
}

#[tokio::test]
async fn memory_source_lists_submitted_issue_last() {
    let source = MemorySource::new(Dataset::builtin().unwrap());
    let intake = ReportIntake::new(source, IntakePolicy::default());

    let issue = intake.submit(&pothole_draft()).await.unwrap();
    let issues = intake.submitter().list_issues().unwrap();
    assert_eq!(issues.len(), 4);
    assert_eq!(issues.last(), Some(&issue));
}
