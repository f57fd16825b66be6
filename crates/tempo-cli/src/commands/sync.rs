//! The synchronization run: resolve the window, then reconcile and
//! submit the ledger export.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use tempo_core::engine::{SyncEngine, SyncReport};
use tempo_core::service::Timesheet;
use tempo_core::window::{self, SyncWindow};
use tempo_jira::Client;

use crate::Config;
use crate::prompt::StdinPrompt;
use crate::remote::JiraRemote;
use crate::timew::LedgerExport;

/// Runs one synchronization over the configured Jira instance.
pub fn run(
    config: &Config,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<SyncReport> {
    let client = Client::new(config.credentials()).context("failed to create Jira client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime.block_on(run_async(&client, from, until))
}

async fn run_async(
    client: &Client,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<SyncReport> {
    let until = until.unwrap_or_else(|| {
        tracing::info!("no end date provided, defaulting to the current time");
        Utc::now()
    });

    let remote = JiraRemote::new(client);

    let window = match from {
        Some(begin) => SyncWindow { begin, until },
        None => {
            tracing::info!("no start date provided, defaulting to the date of last submission");
            window::resolve_window(&remote, None, until)
                .await
                .context("please provide a --from date")?
        }
    };

    tracing::info!(
        begin = %window.begin,
        until = %window.until,
        "checking for existing submissions in range"
    );
    let existing = remote
        .worklogs_between(window.begin, window.until)
        .await
        .context("failed to fetch existing worklogs")?;
    tracing::info!(count = existing.len(), "existing submissions found");
    for worklog in &existing {
        tracing::debug!(
            issue = %worklog.issue_key,
            started = %worklog.started,
            finished = %worklog.finished(),
            "existing worklog"
        );
    }

    let mut export = LedgerExport::spawn()?;
    let mut engine = SyncEngine::new(&remote, &remote, StdinPrompt, window, existing);

    tracing::info!(begin = %window.begin, until = %window.until, "submitting range");
    let report = engine.run(&mut export).await?;
    export.finish()?;

    Ok(report)
}
