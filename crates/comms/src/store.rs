//! Capability trait over the persisted communication records.
//!
//! Injected explicitly into the dispatcher, processor, scheduler, and
//! cancellation coordinator rather than reached through a global client, so
//! tests substitute the in-memory implementation in [`crate::memory`].

use async_trait::async_trait;

use dentiq_core::comms::{Channel, CommunicationRecord, CommunicationType};
use dentiq_core::types::{EntityId, Timestamp};

use crate::error::CommsResult;

/// Draft for a new communication record. Status is always `scheduled` at
/// creation; `id`, `created_at`, and `updated_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCommunication {
    pub patient_id: EntityId,
    pub communication_type: CommunicationType,
    pub channel: Channel,
    pub content: String,
    pub scheduled_for: Timestamp,
    pub treatment_plan_id: Option<EntityId>,
    pub appointment_id: Option<EntityId>,
}

/// Persistence operations for communication records.
///
/// All status transitions are conditional on `status = scheduled`
/// (compare-and-set), so duplicate or concurrent triggers are harmless:
/// the `mark_*` methods return `false` instead of erroring when the record
/// has already reached a terminal state.
#[async_trait]
pub trait CommunicationStore: Send + Sync {
    /// Persist a new record in `scheduled` status and return it.
    async fn create(&self, draft: NewCommunication) -> CommsResult<CommunicationRecord>;

    /// Fetch a single record by id.
    async fn get(&self, id: EntityId) -> CommsResult<Option<CommunicationRecord>>;

    /// List records still in `scheduled` status with `scheduled_for <=
    /// cutoff`, ordered by due time ascending (then creation time, for a
    /// deterministic batch), bounded by `limit`.
    async fn list_due_before(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> CommsResult<Vec<CommunicationRecord>>;

    /// List a patient's communications, newest first, bounded by `limit`.
    async fn list_for_patient(
        &self,
        patient_id: EntityId,
        limit: i64,
    ) -> CommsResult<Vec<CommunicationRecord>>;

    /// Transition `scheduled -> sent`, setting `sent_at`.
    ///
    /// Returns `true` if the record transitioned, `false` if it was no
    /// longer in `scheduled` status (no-op).
    async fn mark_sent(&self, id: EntityId, sent_at: Timestamp) -> CommsResult<bool>;

    /// Transition `scheduled -> failed`, setting `error_message` (caller is
    /// expected to have truncated it). Same no-op semantics as `mark_sent`.
    async fn mark_failed(&self, id: EntityId, error_message: &str) -> CommsResult<bool>;

    /// Cancel every record tied to `appointment_id` that is still in
    /// `scheduled` status, in a single conditional bulk update. Returns the
    /// ids actually affected; calling twice yields an empty set the second
    /// time.
    async fn cancel_by_appointment(&self, appointment_id: EntityId) -> CommsResult<Vec<EntityId>>;
}
