//! Row model for the `communications` table.
//!
//! Status, type, and channel are stored as TEXT (with CHECK constraints in
//! the schema) and parsed into the closed domain enums at the repository
//! boundary, so an out-of-band row corruption surfaces as an explicit error
//! rather than a silent fallthrough.

use sqlx::FromRow;

use dentiq_comms::CommsError;
use dentiq_core::comms::CommunicationRecord;
use dentiq_core::types::{EntityId, Timestamp};

/// A row from the `communications` table.
#[derive(Debug, Clone, FromRow)]
pub struct CommunicationRow {
    pub id: EntityId,
    pub patient_id: EntityId,
    pub communication_type: String,
    pub channel: String,
    pub content: String,
    pub scheduled_for: Timestamp,
    pub status: String,
    pub sent_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub treatment_plan_id: Option<EntityId>,
    pub appointment_id: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CommunicationRow> for CommunicationRecord {
    type Error = CommsError;

    fn try_from(row: CommunicationRow) -> Result<Self, Self::Error> {
        Ok(CommunicationRecord {
            id: row.id,
            patient_id: row.patient_id,
            communication_type: row.communication_type.parse().map_err(CommsError::Internal)?,
            channel: row.channel.parse().map_err(CommsError::Internal)?,
            content: row.content,
            scheduled_for: row.scheduled_for,
            status: row.status.parse().map_err(CommsError::Internal)?,
            sent_at: row.sent_at,
            error_message: row.error_message,
            treatment_plan_id: row.treatment_plan_id,
            appointment_id: row.appointment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
