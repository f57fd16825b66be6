//! Streaming records from the `timew export` subprocess.

use std::io::{BufRead, BufReader, Lines};
use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::{Context, Result};

use tempo_core::ledger::{self, LedgerError, LocalRecord};

/// A running `timew export`, consumed once, front to back.
///
/// Records come out in the exporter's order; the engine relies on that
/// ordering for its interleaved skip/submission reporting.
pub struct LedgerExport {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

impl LedgerExport {
    /// Spawns `timew export` and prepares to stream its records.
    pub fn spawn() -> Result<Self> {
        let mut child = Command::new("timew")
            .arg("export")
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to start timew export")?;

        let stdout = child
            .stdout
            .take()
            .context("failed to capture timew stdout")?;

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Reaps the exporter after the stream is drained.
    pub fn finish(mut self) -> Result<()> {
        let status = self
            .child
            .wait()
            .context("failed to wait for timew export")?;
        if !status.success() {
            return Err(anyhow::anyhow!("timew export exited with status {status}"));
        }
        Ok(())
    }
}

impl Iterator for LedgerExport {
    type Item = Result<LocalRecord, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            let Some(payload) = ledger::record_payload(&line) else {
                continue;
            };
            return Some(ledger::parse_record(payload));
        }
    }
}
