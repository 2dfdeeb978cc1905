//! Due-communication processor.
//!
//! [`Processor::process_due`] is a single pass over the due batch, designed
//! to be invoked by an external periodic trigger (cron hitting the
//! `process-scheduled` endpoint). There is no internal sleep or loop:
//! "retry" means the next trigger naturally picks up whatever is still in
//! `scheduled` status.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use dentiq_core::types::EntityId;

use crate::dispatcher::Dispatcher;
use crate::error::CommsResult;
use crate::store::CommunicationStore;

/// Maximum number of due records handled per invocation. Bounds the cost of
/// one processing pass; anything beyond the batch waits for the next trigger.
pub const DUE_BATCH_SIZE: i64 = 50;

/// Per-record outcome of a processing pass.
#[derive(Debug, Serialize)]
pub struct DispatchOutcome {
    pub id: EntityId,
    pub success: bool,
}

/// Result of one processing pass.
#[derive(Debug, Serialize)]
pub struct ProcessReport {
    pub processed: usize,
    pub results: Vec<DispatchOutcome>,
}

/// Processes due communications in bounded, sequential batches.
pub struct Processor {
    store: Arc<dyn CommunicationStore>,
    dispatcher: Arc<Dispatcher>,
}

impl Processor {
    pub fn new(store: Arc<dyn CommunicationStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Fetch up to [`DUE_BATCH_SIZE`] due records and dispatch each one.
    ///
    /// Dispatch is sequential to bound load on the external channel
    /// providers and keep ordering deterministic for the audit trail. A
    /// failure on one record never aborts the rest of the batch.
    pub async fn process_due(&self) -> CommsResult<ProcessReport> {
        let due = self.store.list_due_before(Utc::now(), DUE_BATCH_SIZE).await?;

        let mut results = Vec::with_capacity(due.len());
        for record in &due {
            let success = match self.dispatcher.dispatch(record).await {
                Ok(success) => success,
                Err(e) => {
                    tracing::error!(
                        communication_id = %record.id,
                        error = %e,
                        "Dispatch failed, continuing with batch"
                    );
                    false
                }
            };
            results.push(DispatchOutcome {
                id: record.id,
                success,
            });
        }

        if !results.is_empty() {
            tracing::info!(processed = results.len(), "Processed due communications");
        }

        Ok(ProcessReport {
            processed: results.len(),
            results,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::email::Mailer;
    use crate::delivery::inapp::NotificationSink;
    use crate::delivery::sms::SmsGateway;
    use crate::memory::{
        InMemoryRecords, InMemoryStore, RecordingMailer, RecordingSink, RecordingSmsGateway,
    };
    use crate::records::PatientRecords;
    use crate::store::NewCommunication;
    use chrono::Duration;
    use dentiq_core::comms::{Channel, CommunicationStatus, CommunicationType};
    use dentiq_core::content::PatientSnapshot;
    use uuid::Uuid;

    fn engine() -> (Arc<InMemoryStore>, Arc<InMemoryRecords>, Processor) {
        let store = Arc::new(InMemoryStore::new());
        let records = Arc::new(InMemoryRecords::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store) as Arc<dyn CommunicationStore>,
            Arc::clone(&records) as Arc<dyn PatientRecords>,
            Some(Arc::new(RecordingMailer::new()) as Arc<dyn Mailer>),
            Some(Arc::new(RecordingSmsGateway::new()) as Arc<dyn SmsGateway>),
            Arc::new(RecordingSink::new()) as Arc<dyn NotificationSink>,
            Some(Uuid::now_v7()),
        ));
        let processor = Processor::new(Arc::clone(&store) as Arc<dyn CommunicationStore>, dispatcher);
        (store, records, processor)
    }

    fn patient(email: Option<&str>) -> PatientSnapshot {
        PatientSnapshot {
            id: Uuid::now_v7(),
            first_name: Some("Ana".to_string()),
            email: email.map(str::to_string),
            phone: None,
        }
    }

    async fn schedule_email(
        store: &InMemoryStore,
        patient_id: Uuid,
        minutes_from_now: i64,
    ) -> dentiq_core::comms::CommunicationRecord {
        store
            .create(NewCommunication {
                patient_id,
                communication_type: CommunicationType::FollowUp,
                channel: Channel::Email,
                content: "hello".to_string(),
                scheduled_for: Utc::now() + Duration::minutes(minutes_from_now),
                treatment_plan_id: None,
                appointment_id: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn future_records_are_not_picked_up() {
        let (store, records, processor) = engine();
        let p = patient(Some("a@example.com"));
        records.insert_patient(p.clone());
        let record = schedule_email(&store, p.id, 5).await;

        let report = processor.process_due().await.unwrap();
        assert_eq!(report.processed, 0);

        let current = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(current.status, CommunicationStatus::Scheduled);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let (store, records, processor) = engine();
        let ok = patient(Some("ok@example.com"));
        let broken = patient(None); // email channel with no address -> failed
        records.insert_patient(ok.clone());
        records.insert_patient(broken.clone());
        let first = schedule_email(&store, broken.id, -10).await;
        let second = schedule_email(&store, ok.id, -5).await;

        let report = processor.process_due().await.unwrap();
        assert_eq!(report.processed, 2);

        // Earliest due first.
        assert_eq!(report.results[0].id, first.id);
        assert!(!report.results[0].success);
        assert_eq!(report.results[1].id, second.id);
        assert!(report.results[1].success);

        let sent = store.get(second.id).await.unwrap().unwrap();
        assert_eq!(sent.status, CommunicationStatus::Sent);
    }

    #[tokio::test]
    async fn second_pass_finds_nothing_left() {
        let (store, records, processor) = engine();
        let p = patient(Some("a@example.com"));
        records.insert_patient(p.clone());
        schedule_email(&store, p.id, -1).await;

        let first = processor.process_due().await.unwrap();
        assert_eq!(first.processed, 1);

        let second = processor.process_due().await.unwrap();
        assert_eq!(second.processed, 0);
    }
}
