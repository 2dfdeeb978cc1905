//! Bulk cancellation keyed by appointment.
//!
//! A single conditional update (`status = cancelled WHERE appointment_id =
//! $1 AND status = scheduled`) is the whole operation; the condition itself
//! is the concurrency guard, so there is no fetch-then-check-then-update
//! race and repeated calls are harmless.

use std::sync::Arc;

use serde::Serialize;

use dentiq_core::types::EntityId;

use crate::error::CommsResult;
use crate::store::CommunicationStore;

/// Outcome of a bulk cancellation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationReport {
    pub cancelled_count: usize,
    pub cancelled_ids: Vec<EntityId>,
}

/// Cancels still-pending communications when their appointment is cancelled.
pub struct CancellationCoordinator {
    store: Arc<dyn CommunicationStore>,
}

impl CancellationCoordinator {
    pub fn new(store: Arc<dyn CommunicationStore>) -> Self {
        Self { store }
    }

    /// Cancel every `scheduled` communication tied to the appointment.
    ///
    /// Idempotent: a second call returns `cancelled_count = 0`. Records
    /// already `sent` or `failed` are never touched.
    pub async fn cancel_by_appointment(
        &self,
        appointment_id: EntityId,
    ) -> CommsResult<CancellationReport> {
        let cancelled_ids = self.store.cancel_by_appointment(appointment_id).await?;

        if !cancelled_ids.is_empty() {
            tracing::info!(
                appointment_id = %appointment_id,
                cancelled = cancelled_ids.len(),
                "Cancelled pending communications for appointment"
            );
        }

        Ok(CancellationReport {
            cancelled_count: cancelled_ids.len(),
            cancelled_ids,
        })
    }
}
