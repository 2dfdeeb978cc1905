//! Postgres implementation of the [`PatientRecords`] capability.

use async_trait::async_trait;

use dentiq_comms::error::CommsResult;
use dentiq_comms::PatientRecords;
use dentiq_core::content::{AppointmentSnapshot, PatientSnapshot, TreatmentPlanSnapshot};
use dentiq_core::types::EntityId;

use crate::models::clinical::{AppointmentRow, PatientRow, TreatmentPlanRow};
use crate::DbPool;

/// Clinical entity lookups backed by Postgres.
pub struct PgPatientRecords {
    pool: DbPool,
}

impl PgPatientRecords {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRecords for PgPatientRecords {
    async fn patient(&self, id: EntityId) -> CommsResult<Option<PatientSnapshot>> {
        let row = sqlx::query_as::<_, PatientRow>(
            "SELECT id, first_name, email, phone FROM patients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PatientSnapshot::from))
    }

    async fn appointment(&self, id: EntityId) -> CommsResult<Option<AppointmentSnapshot>> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            "SELECT a.id, a.scheduled_at, s.full_name AS practitioner_name \
             FROM appointments a \
             LEFT JOIN staff s ON s.id = a.practitioner_id \
             WHERE a.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AppointmentSnapshot::from))
    }

    async fn treatment_plan(&self, id: EntityId) -> CommsResult<Option<TreatmentPlanSnapshot>> {
        let row = sqlx::query_as::<_, TreatmentPlanRow>(
            "SELECT id, title, description FROM treatment_plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TreatmentPlanSnapshot::from))
    }

    async fn mark_plan_notified(&self, id: EntityId) -> CommsResult<()> {
        sqlx::query(
            "UPDATE treatment_plans \
             SET last_notified_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
