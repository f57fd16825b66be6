//! The per-record submission pipeline.
//!
//! Records are pulled from the ledger export one at a time, in producer
//! order, and either submitted as a new worklog or skipped. Skips are
//! counted and reported in batches; fatal conditions abort the whole run.

use std::collections::HashMap;

use thiserror::Error;

use crate::conflict::find_conflict;
use crate::ledger::{LedgerError, LocalRecord};
use crate::service::{
    Issue, IssueDirectory, NewWorklog, RemoteWorklog, ServiceError, Timesheet, TicketPrompt,
};
use crate::ticket::{TicketKey, ticket_from_tags};
use crate::window::SyncWindow;

/// Fatal conditions that abort a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The ledger export produced a malformed record.
    #[error("malformed ledger export: {0}")]
    Ledger(#[from] LedgerError),

    /// A remote request or the prompt transport failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The actor may not log work against a resolved ticket. Treated as
    /// a configuration problem needing operator attention, not a skip.
    #[error("no permission to log work on {ticket}")]
    PermissionDenied { ticket: TicketKey },
}

/// Why a record was left out of the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record is still being tracked.
    Ongoing,
    /// The record does not fall entirely within the sync window.
    OutOfRange,
    /// The record overlaps an already-submitted worklog.
    Conflict,
    /// No ticket key was found in the tags or provided interactively.
    TicketUnresolved,
    /// The issue behind the resolved ticket could not be looked up.
    IssueLookup,
}

/// Terminal state of one record's trip through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Submitted(TicketKey),
    Skipped(SkipReason),
}

/// Totals for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub submitted: usize,
    pub ignored: usize,
}

/// Drives local records through filter, conflict check, ticket
/// resolution, permission check, and submission.
pub struct SyncEngine<'a, T, I, P> {
    timesheet: &'a T,
    issues: &'a I,
    prompt: P,
    window: SyncWindow,
    existing: Vec<RemoteWorklog>,
    issue_cache: HashMap<TicketKey, Issue>,
    permission_cache: HashMap<TicketKey, bool>,
    ignored_since_flush: usize,
    report: SyncReport,
}

impl<'a, T, I, P> SyncEngine<'a, T, I, P>
where
    T: Timesheet,
    I: IssueDirectory,
    P: TicketPrompt,
{
    /// Creates an engine for one run over `window`, checking conflicts
    /// against `existing`, the worklogs already submitted in that window.
    pub fn new(
        timesheet: &'a T,
        issues: &'a I,
        prompt: P,
        window: SyncWindow,
        existing: Vec<RemoteWorklog>,
    ) -> Self {
        Self {
            timesheet,
            issues,
            prompt,
            window,
            existing,
            issue_cache: HashMap::new(),
            permission_cache: HashMap::new(),
            ignored_since_flush: 0,
            report: SyncReport::default(),
        }
    }

    /// Consumes the ledger export in producer order and submits whatever
    /// passes the pipeline. A malformed record aborts the run.
    pub async fn run(
        &mut self,
        records: impl IntoIterator<Item = Result<LocalRecord, LedgerError>>,
    ) -> Result<SyncReport, SyncError> {
        for record in records {
            let record = record?;
            self.process(&record).await?;
        }
        self.flush_ignored();
        Ok(self.report)
    }

    async fn process(&mut self, record: &LocalRecord) -> Result<Outcome, SyncError> {
        let Some(span) = record.span() else {
            tracing::debug!(id = record.id, "skipping ongoing record");
            return Ok(self.skip(SkipReason::Ongoing));
        };

        if !self.window.contains(&span) {
            tracing::debug!(id = record.id, "skipping record outside the sync window");
            return Ok(self.skip(SkipReason::OutOfRange));
        }

        tracing::info!(
            id = record.id,
            start = %span.start,
            end = %span.end,
            tags = ?record.tags,
            "considering record"
        );

        if let Some(conflict) = find_conflict(&span, &self.existing) {
            tracing::warn!(
                id = record.id,
                issue = %conflict.issue_key,
                started = %conflict.started,
                finished = %conflict.finished(),
                "ignoring record, conflicts with an existing worklog"
            );
            return Ok(self.skip(SkipReason::Conflict));
        }

        let Some(ticket) = self.resolve_ticket(record)? else {
            tracing::warn!(id = record.id, "no ticket matched to record");
            return Ok(self.skip(SkipReason::TicketUnresolved));
        };

        let issue = match self.lookup_issue(&ticket).await {
            Ok(issue) => issue,
            Err(err) => {
                tracing::warn!(ticket = %ticket, error = %err, "issue lookup failed, skipping record");
                return Ok(self.skip(SkipReason::IssueLookup));
            }
        };

        if !self.lookup_permission(&ticket).await? {
            return Err(SyncError::PermissionDenied { ticket });
        }

        let worklog = NewWorklog {
            issue_id: issue.id,
            issue_key: issue.key.clone(),
            started: span.start,
            seconds: span.duration_seconds(),
        };
        self.timesheet.submit(&worklog).await?;

        self.flush_ignored();
        self.report.submitted += 1;
        tracing::info!(
            issue = %issue.key,
            summary = %issue.summary,
            seconds = worklog.seconds,
            "worklog submitted"
        );
        Ok(Outcome::Submitted(issue.key))
    }

    /// Resolves a ticket from the tags, falling back to one interactive
    /// request. Interactive input is uppercased before validation; input
    /// that still fails abandons the record rather than retrying.
    fn resolve_ticket(&mut self, record: &LocalRecord) -> Result<Option<TicketKey>, SyncError> {
        if let Some(ticket) = ticket_from_tags(&record.tags) {
            return Ok(Some(ticket));
        }
        let Some(answer) = self.prompt.request_ticket(record)? else {
            return Ok(None);
        };
        Ok(TicketKey::parse(answer.trim().to_uppercase()).ok())
    }

    async fn lookup_issue(&mut self, ticket: &TicketKey) -> Result<Issue, ServiceError> {
        if let Some(issue) = self.issue_cache.get(ticket) {
            return Ok(issue.clone());
        }
        let issue = self.issues.issue(ticket).await?;
        self.issue_cache.insert(ticket.clone(), issue.clone());
        Ok(issue)
    }

    async fn lookup_permission(&mut self, ticket: &TicketKey) -> Result<bool, ServiceError> {
        if let Some(allowed) = self.permission_cache.get(ticket) {
            return Ok(*allowed);
        }
        tracing::info!(ticket = %ticket, "checking permissions for issue");
        let allowed = self.issues.can_log_work(ticket).await?;
        self.permission_cache.insert(ticket.clone(), allowed);
        Ok(allowed)
    }

    fn skip(&mut self, reason: SkipReason) -> Outcome {
        self.ignored_since_flush += 1;
        self.report.ignored += 1;
        Outcome::Skipped(reason)
    }

    /// Reports skips accumulated since the last submission, then resets.
    fn flush_ignored(&mut self) {
        if self.ignored_since_flush > 0 {
            tracing::info!(count = self.ignored_since_flush, "ignored ledger record(s)");
        }
        self.ignored_since_flush = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::VecDeque;

    use chrono::{DateTime, TimeZone, Utc};

    fn instant(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    fn window() -> SyncWindow {
        SyncWindow {
            begin: instant(8, 0, 0),
            until: instant(15, 0, 0),
        }
    }

    fn record(id: u64, tags: &[&str]) -> LocalRecord {
        LocalRecord {
            id,
            start: instant(10, 9, 0),
            end: Some(instant(10, 11, 0)),
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    fn ticket(key: &str) -> TicketKey {
        TicketKey::parse(key).unwrap()
    }

    fn service_failure() -> ServiceError {
        ServiceError::new(std::io::Error::other("remote unavailable"))
    }

    #[derive(Default)]
    struct FakeTimesheet {
        submitted: RefCell<Vec<NewWorklog>>,
        searches: RefCell<usize>,
    }

    impl Timesheet for FakeTimesheet {
        async fn worklogs_between(
            &self,
            _from: DateTime<Utc>,
            _until: DateTime<Utc>,
        ) -> Result<Vec<RemoteWorklog>, ServiceError> {
            *self.searches.borrow_mut() += 1;
            Ok(Vec::new())
        }

        async fn submit(&self, worklog: &NewWorklog) -> Result<(), ServiceError> {
            self.submitted.borrow_mut().push(worklog.clone());
            Ok(())
        }
    }

    struct FakeDirectory {
        issue_lookups: RefCell<usize>,
        permission_lookups: RefCell<usize>,
        allow_work: bool,
        fail_issue_lookup: bool,
        fail_permission_lookup: bool,
    }

    impl Default for FakeDirectory {
        fn default() -> Self {
            Self {
                issue_lookups: RefCell::new(0),
                permission_lookups: RefCell::new(0),
                allow_work: true,
                fail_issue_lookup: false,
                fail_permission_lookup: false,
            }
        }
    }

    impl IssueDirectory for FakeDirectory {
        async fn issue(&self, key: &TicketKey) -> Result<Issue, ServiceError> {
            *self.issue_lookups.borrow_mut() += 1;
            if self.fail_issue_lookup {
                return Err(service_failure());
            }
            Ok(Issue {
                id: 10_000,
                key: key.clone(),
                summary: "Fix the flux capacitor".to_string(),
            })
        }

        async fn can_log_work(&self, _key: &TicketKey) -> Result<bool, ServiceError> {
            *self.permission_lookups.borrow_mut() += 1;
            if self.fail_permission_lookup {
                return Err(service_failure());
            }
            Ok(self.allow_work)
        }
    }

    /// Replays canned answers; panics if asked more often than scripted.
    #[derive(Default)]
    struct ScriptedPrompt {
        answers: RefCell<VecDeque<Option<String>>>,
        asked: RefCell<usize>,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[Option<&str>]) -> Self {
            Self {
                answers: RefCell::new(
                    answers
                        .iter()
                        .map(|answer| answer.map(ToString::to_string))
                        .collect(),
                ),
                asked: RefCell::new(0),
            }
        }
    }

    impl TicketPrompt for &ScriptedPrompt {
        fn request_ticket(
            &mut self,
            _record: &LocalRecord,
        ) -> Result<Option<String>, ServiceError> {
            *self.asked.borrow_mut() += 1;
            Ok(self
                .answers
                .borrow_mut()
                .pop_front()
                .expect("prompt asked more often than scripted"))
        }
    }

    fn ok(record: LocalRecord) -> Result<LocalRecord, LedgerError> {
        Ok(record)
    }

    #[tokio::test]
    async fn clean_record_is_submitted() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let report = engine.run([ok(record(1, &["CSD-42", "pairing"]))]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 1, ignored: 0 });
        let submitted = timesheet.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].issue_key, ticket("CSD-42"));
        assert_eq!(submitted[0].started, instant(10, 9, 0));
        assert_eq!(submitted[0].seconds, 7200);
        assert_eq!(*prompt.asked.borrow(), 0);
    }

    #[tokio::test]
    async fn conflicting_record_is_skipped() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();
        let existing = vec![RemoteWorklog {
            issue_key: "CSD-7".to_string(),
            started: instant(10, 10, 0),
            seconds: 1800,
        }];
        let mut engine = SyncEngine::new(&timesheet, &directory, &prompt, window(), existing);

        let report = engine.run([ok(record(1, &["CSD-42"]))]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 0, ignored: 1 });
        assert!(timesheet.submitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn ongoing_record_never_reaches_the_network() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let ongoing = LocalRecord {
            id: 1,
            start: instant(10, 9, 0),
            end: None,
            tags: Vec::new(),
        };
        let report = engine.run([ok(ongoing)]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 0, ignored: 1 });
        assert_eq!(*prompt.asked.borrow(), 0);
        assert_eq!(*directory.issue_lookups.borrow(), 0);
        assert!(timesheet.submitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_record_is_skipped() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let early = LocalRecord {
            id: 1,
            start: instant(7, 9, 0),
            end: Some(instant(7, 10, 0)),
            tags: vec!["CSD-42".to_string()],
        };
        let report = engine.run([ok(early)]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 0, ignored: 1 });
        assert!(timesheet.submitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn prompted_ticket_is_uppercased_and_used() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::answering(&[Some("csd-7")]);
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let report = engine.run([ok(record(1, &["untagged"]))]).await.unwrap();

        assert_eq!(report.submitted, 1);
        assert_eq!(*prompt.asked.borrow(), 1);
        assert_eq!(timesheet.submitted.borrow()[0].issue_key, ticket("CSD-7"));
    }

    #[tokio::test]
    async fn invalid_prompt_answer_abandons_the_record() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::answering(&[Some("not-a-ticket")]);
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let report = engine.run([ok(record(1, &["untagged"]))]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 0, ignored: 1 });
        assert_eq!(*prompt.asked.borrow(), 1);
        assert!(timesheet.submitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn declined_prompt_abandons_the_record() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::answering(&[None]);
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let report = engine.run([ok(record(1, &["untagged"]))]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 0, ignored: 1 });
    }

    #[tokio::test]
    async fn missing_permission_aborts_the_run() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory {
            allow_work: false,
            ..FakeDirectory::default()
        };
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let err = engine.run([ok(record(1, &["CSD-42"]))]).await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::PermissionDenied { ref ticket } if ticket.as_str() == "CSD-42"
        ));
        assert!(timesheet.submitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn failed_issue_lookup_is_a_skip() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory {
            fail_issue_lookup: true,
            ..FakeDirectory::default()
        };
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let report = engine.run([ok(record(1, &["CSD-42"]))]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 0, ignored: 1 });
        assert!(timesheet.submitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn failed_permission_lookup_aborts_the_run() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory {
            fail_permission_lookup: true,
            ..FakeDirectory::default()
        };
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let err = engine.run([ok(record(1, &["CSD-42"]))]).await.unwrap_err();
        assert!(matches!(err, SyncError::Service(_)));
    }

    #[tokio::test]
    async fn issue_and_permission_lookups_are_memoized_per_ticket() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let first = LocalRecord {
            id: 1,
            start: instant(9, 9, 0),
            end: Some(instant(9, 10, 0)),
            tags: vec!["CSD-42".to_string()],
        };
        let second = LocalRecord {
            id: 2,
            start: instant(10, 9, 0),
            end: Some(instant(10, 10, 0)),
            tags: vec!["CSD-42".to_string()],
        };
        let report = engine.run([ok(first), ok(second)]).await.unwrap();

        assert_eq!(report.submitted, 2);
        assert_eq!(*directory.issue_lookups.borrow(), 1);
        assert_eq!(*directory.permission_lookups.borrow(), 1);
    }

    #[tokio::test]
    async fn second_run_over_unchanged_remote_state_submits_nothing() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();

        let mut first = SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());
        let report = first.run([ok(record(1, &["CSD-42"]))]).await.unwrap();
        assert_eq!(report.submitted, 1);

        // The worklog created by the first run is now part of the window.
        let created = timesheet.submitted.borrow()[0].clone();
        let existing = vec![RemoteWorklog {
            issue_key: created.issue_key.to_string(),
            started: created.started,
            seconds: created.seconds,
        }];

        let mut second = SyncEngine::new(&timesheet, &directory, &prompt, window(), existing);
        let report = second.run([ok(record(1, &["CSD-42"]))]).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 0, ignored: 1 });
        assert_eq!(timesheet.submitted.borrow().len(), 1);
    }

    #[tokio::test]
    async fn malformed_ledger_record_aborts_the_run() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let records = [
            ok(record(1, &["CSD-42"])),
            crate::ledger::parse_record("{not json"),
        ];
        let err = engine.run(records).await.unwrap_err();
        assert!(matches!(err, SyncError::Ledger(_)));
    }

    #[tokio::test]
    async fn records_are_processed_in_producer_order() {
        let timesheet = FakeTimesheet::default();
        let directory = FakeDirectory::default();
        let prompt = ScriptedPrompt::default();
        let mut engine =
            SyncEngine::new(&timesheet, &directory, &prompt, window(), Vec::new());

        let earlier = LocalRecord {
            id: 1,
            start: instant(9, 9, 0),
            end: Some(instant(9, 10, 0)),
            tags: vec!["INT-1".to_string()],
        };
        let later = LocalRecord {
            id: 2,
            start: instant(11, 9, 0),
            end: Some(instant(11, 10, 0)),
            tags: vec!["INT-2".to_string()],
        };
        // Producer order is preserved even when it is not chronological.
        engine.run([ok(later.clone()), ok(earlier.clone())]).await.unwrap();

        let submitted = timesheet.submitted.borrow();
        assert_eq!(submitted[0].started, later.start);
        assert_eq!(submitted[1].started, earlier.start);
    }
}
