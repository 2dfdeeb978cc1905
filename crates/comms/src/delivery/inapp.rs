//! In-app notification sink.
//!
//! `app`-channel communications are delivered to a configured staff
//! recipient (not the patient) as an internal notification carrying a
//! summary of the record. The durable Postgres sink lives in `dentiq-db`;
//! tests use a recording fake.

use async_trait::async_trait;

use dentiq_core::types::EntityId;

use super::DeliveryError;

/// Stores an internal notification addressed to a staff member.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_staff(
        &self,
        recipient: EntityId,
        title: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}
