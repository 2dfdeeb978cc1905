//! Capability trait over the clinical entities communications reference.

use async_trait::async_trait;

use dentiq_core::content::{AppointmentSnapshot, PatientSnapshot, TreatmentPlanSnapshot};
use dentiq_core::types::EntityId;

use crate::error::CommsResult;

/// Read-only lookups of patients, appointments, and treatment plans, plus
/// the one piece of write-back bookkeeping the dispatcher performs.
///
/// Lookup misses are `Ok(None)`, never errors: a missing upstream record
/// must not block message creation or dispatch.
#[async_trait]
pub trait PatientRecords: Send + Sync {
    async fn patient(&self, id: EntityId) -> CommsResult<Option<PatientSnapshot>>;

    async fn appointment(&self, id: EntityId) -> CommsResult<Option<AppointmentSnapshot>>;

    async fn treatment_plan(&self, id: EntityId) -> CommsResult<Option<TreatmentPlanSnapshot>>;

    /// Record that a notification tied to this treatment plan was sent.
    /// Best-effort from the dispatcher's point of view; a failure here never
    /// rolls back the communication's own `sent` status.
    async fn mark_plan_notified(&self, id: EntityId) -> CommsResult<()>;
}
