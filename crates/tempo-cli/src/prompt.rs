//! Interactive ticket prompting on the controlling terminal.

use std::io::{self, BufRead, Write};

use tempo_core::ledger::LocalRecord;
use tempo_core::service::{ServiceError, TicketPrompt};

/// Asks the operator for a ticket key over stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl TicketPrompt for StdinPrompt {
    fn request_ticket(&mut self, record: &LocalRecord) -> Result<Option<String>, ServiceError> {
        let mut stdout = io::stdout().lock();
        writeln!(
            stdout,
            "No ticket id found within the tags for record @{}.",
            record.id
        )
        .map_err(ServiceError::new)?;
        writeln!(stdout, "Tags: {}", record.tags.join(", ")).map_err(ServiceError::new)?;
        write!(stdout, "Please provide a valid ticket ID: ").map_err(ServiceError::new)?;
        stdout.flush().map_err(ServiceError::new)?;

        let mut answer = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(ServiceError::new)?;
        if read == 0 {
            // Stream closed; nothing more to ask.
            return Ok(None);
        }

        let answer = answer.trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(answer.to_string()))
        }
    }
}
