//! Core domain logic for the Tempo uploader.
//!
//! This crate contains the reconciliation engine that turns local
//! Timewarrior records into remote Tempo worklogs:
//! - Interval model: half-open spans and overlap arithmetic
//! - Ledger: the `timew export` record format and its strict parser
//! - Window: the expanding lookback search for the sync range
//! - Engine: the per-record submission pipeline with skip accounting
//!
//! All remote services and interactive prompting reach the engine through
//! the traits in [`service`], so the whole pipeline runs against scripted
//! collaborators in tests.

pub mod conflict;
pub mod engine;
pub mod interval;
pub mod ledger;
pub mod service;
pub mod ticket;
pub mod window;

pub use engine::{Outcome, SkipReason, SyncEngine, SyncError, SyncReport};
pub use interval::Span;
pub use ledger::{LedgerError, LocalRecord};
pub use service::{Issue, IssueDirectory, NewWorklog, RemoteWorklog, ServiceError, Timesheet, TicketPrompt};
pub use ticket::{InvalidTicket, TicketKey, ticket_from_tags};
pub use window::{SyncWindow, WindowError, resolve_window};
