//! Postgres implementation of the [`CommunicationStore`] capability.
//!
//! Every status transition is a conditional update guarded by
//! `status = 'scheduled'`; `rows_affected` tells the caller whether the
//! transition happened or the record had already reached a terminal state.

use async_trait::async_trait;
use uuid::Uuid;

use dentiq_comms::error::CommsResult;
use dentiq_comms::{CommunicationStore, NewCommunication};
use dentiq_core::comms::CommunicationRecord;
use dentiq_core::types::{EntityId, Timestamp};

use crate::models::communication::CommunicationRow;
use crate::DbPool;

/// Column list for `communications` queries.
const COLUMNS: &str = "id, patient_id, communication_type, channel, content, scheduled_for, \
     status, sent_at, error_message, treatment_plan_id, appointment_id, created_at, updated_at";

/// Communication record persistence backed by Postgres.
pub struct PgCommunicationStore {
    pool: DbPool,
}

impl PgCommunicationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunicationStore for PgCommunicationStore {
    async fn create(&self, draft: NewCommunication) -> CommsResult<CommunicationRecord> {
        let query = format!(
            "INSERT INTO communications \
             (id, patient_id, communication_type, channel, content, scheduled_for, status, \
              treatment_plan_id, appointment_id) \
             VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', $7, $8) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommunicationRow>(&query)
            .bind(Uuid::now_v7())
            .bind(draft.patient_id)
            .bind(draft.communication_type.as_str())
            .bind(draft.channel.as_str())
            .bind(&draft.content)
            .bind(draft.scheduled_for)
            .bind(draft.treatment_plan_id)
            .bind(draft.appointment_id)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn get(&self, id: EntityId) -> CommsResult<Option<CommunicationRecord>> {
        let query = format!("SELECT {COLUMNS} FROM communications WHERE id = $1");
        let row = sqlx::query_as::<_, CommunicationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CommunicationRecord::try_from).transpose()
    }

    async fn list_due_before(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> CommsResult<Vec<CommunicationRecord>> {
        let query = format!(
            "SELECT {COLUMNS} FROM communications \
             WHERE status = 'scheduled' AND scheduled_for <= $1 \
             ORDER BY scheduled_for ASC, created_at ASC \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, CommunicationRow>(&query)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(CommunicationRecord::try_from)
            .collect()
    }

    async fn list_for_patient(
        &self,
        patient_id: EntityId,
        limit: i64,
    ) -> CommsResult<Vec<CommunicationRecord>> {
        let query = format!(
            "SELECT {COLUMNS} FROM communications \
             WHERE patient_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, CommunicationRow>(&query)
            .bind(patient_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(CommunicationRecord::try_from)
            .collect()
    }

    async fn mark_sent(&self, id: EntityId, sent_at: Timestamp) -> CommsResult<bool> {
        let result = sqlx::query(
            "UPDATE communications \
             SET status = 'sent', sent_at = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(&self, id: EntityId, error_message: &str) -> CommsResult<bool> {
        let result = sqlx::query(
            "UPDATE communications \
             SET status = 'failed', error_message = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cancel_by_appointment(&self, appointment_id: EntityId) -> CommsResult<Vec<EntityId>> {
        let ids: Vec<EntityId> = sqlx::query_scalar(
            "UPDATE communications \
             SET status = 'cancelled', updated_at = NOW() \
             WHERE appointment_id = $1 AND status = 'scheduled' \
             RETURNING id",
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
