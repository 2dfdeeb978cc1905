//! Patient communication lifecycle engine.
//!
//! This crate owns the moving parts of the communication pipeline:
//!
//! - [`CommunicationStore`] / [`PatientRecords`] — capability traits over
//!   the persisted communication records and the clinical lookups they
//!   reference. Implementations live in `dentiq-db` (Postgres) and
//!   [`memory`] (in-memory, for tests).
//! - [`delivery`] — channel adapters: SMTP email, HTTP SMS gateway, and the
//!   in-app staff notification sink.
//! - [`Dispatcher`] — drives a single record through its status transition
//!   (`scheduled -> sent | failed`).
//! - [`Processor`] — single-pass batch processing of due records, designed
//!   for an external periodic trigger.
//! - [`Scheduler`] — the schedule operation (validation, content
//!   generation, immediate dispatch when already due).
//! - [`CancellationCoordinator`] — idempotent bulk cancellation keyed by
//!   appointment.

pub mod cancellation;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod processor;
pub mod records;
pub mod scheduler;
pub mod store;

pub use cancellation::{CancellationCoordinator, CancellationReport};
pub use delivery::email::{EmailConfig, Mailer, SmtpMailer};
pub use delivery::inapp::NotificationSink;
pub use delivery::sms::{HttpSmsGateway, SmsConfig, SmsGateway};
pub use dispatcher::Dispatcher;
pub use error::CommsError;
pub use processor::{DispatchOutcome, ProcessReport, Processor, DUE_BATCH_SIZE};
pub use records::PatientRecords;
pub use scheduler::{ScheduleCommand, Scheduler};
pub use store::{CommunicationStore, NewCommunication};
