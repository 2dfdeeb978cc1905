//! Repository layer.
//!
//! Each repository owns a pool handle and implements one of the capability
//! traits from `dentiq-comms`, so the lifecycle engine never sees sqlx
//! directly.

pub mod clinical_records;
pub mod communication_store;
pub mod staff_notification_sink;

pub use clinical_records::PgPatientRecords;
pub use communication_store::PgCommunicationStore;
pub use staff_notification_sink::PgNotificationSink;
