//! Postgres implementation of the in-app [`NotificationSink`].
//!
//! `app`-channel communications land in the `staff_notifications` table,
//! where the back-office notification bell reads them.

use async_trait::async_trait;
use uuid::Uuid;

use dentiq_comms::delivery::DeliveryError;
use dentiq_comms::NotificationSink;
use dentiq_core::types::EntityId;

use crate::DbPool;

/// Staff notification persistence backed by Postgres.
pub struct PgNotificationSink {
    pool: DbPool,
}

impl PgNotificationSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn notify_staff(
        &self,
        recipient: EntityId,
        title: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        sqlx::query(
            "INSERT INTO staff_notifications (id, recipient_id, title, body) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(recipient)
        .bind(title)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| DeliveryError::Sink(e.to_string()))?;

        tracing::debug!(recipient = %recipient, "Staff notification stored");
        Ok(())
    }
}
