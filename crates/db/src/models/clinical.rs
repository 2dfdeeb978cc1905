//! Row models for the clinical entities communications reference.

use sqlx::FromRow;

use dentiq_core::content::{AppointmentSnapshot, PatientSnapshot, TreatmentPlanSnapshot};
use dentiq_core::types::{EntityId, Timestamp};

/// Contact fields from the `patients` table.
#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub id: EntityId,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<PatientRow> for PatientSnapshot {
    fn from(row: PatientRow) -> Self {
        PatientSnapshot {
            id: row.id,
            first_name: row.first_name,
            email: row.email,
            phone: row.phone,
        }
    }
}

/// Scheduling fields from the `appointments` table, with the assigned
/// practitioner's name joined in.
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentRow {
    pub id: EntityId,
    pub scheduled_at: Timestamp,
    pub practitioner_name: Option<String>,
}

impl From<AppointmentRow> for AppointmentSnapshot {
    fn from(row: AppointmentRow) -> Self {
        AppointmentSnapshot {
            id: row.id,
            scheduled_at: row.scheduled_at,
            practitioner_name: row.practitioner_name,
        }
    }
}

/// Title/description fields from the `treatment_plans` table.
#[derive(Debug, Clone, FromRow)]
pub struct TreatmentPlanRow {
    pub id: EntityId,
    pub title: String,
    pub description: Option<String>,
}

impl From<TreatmentPlanRow> for TreatmentPlanSnapshot {
    fn from(row: TreatmentPlanRow) -> Self {
        TreatmentPlanSnapshot {
            id: row.id,
            title: row.title,
            description: row.description,
        }
    }
}
