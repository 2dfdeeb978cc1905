//! The schedule operation.
//!
//! Validates the request, resolves the patient (a missing patient rejects
//! the call; a missing optional appointment/plan only degrades the content
//! to a generic template), generates content when the caller supplied none,
//! creates the record, and dispatches immediately when it is already due.

use std::sync::Arc;

use chrono::Utc;

use dentiq_core::comms::{Channel, CommunicationRecord, CommunicationType};
use dentiq_core::content;
use dentiq_core::types::{EntityId, Timestamp};

use crate::dispatcher::Dispatcher;
use crate::error::{CommsError, CommsResult};
use crate::records::PatientRecords;
use crate::store::{CommunicationStore, NewCommunication};

/// A validated scheduling request.
#[derive(Debug, Clone)]
pub struct ScheduleCommand {
    pub patient_id: EntityId,
    pub communication_type: CommunicationType,
    pub channel: Channel,
    pub scheduled_for: Timestamp,
    pub treatment_plan_id: Option<EntityId>,
    pub appointment_id: Option<EntityId>,
    pub custom_message: Option<String>,
}

/// Creates communication records and triggers immediate dispatch when due.
pub struct Scheduler {
    store: Arc<dyn CommunicationStore>,
    records: Arc<dyn PatientRecords>,
    dispatcher: Arc<Dispatcher>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn CommunicationStore>,
        records: Arc<dyn PatientRecords>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            store,
            records,
            dispatcher,
        }
    }

    /// Schedule a communication, returning the record in its current state.
    ///
    /// When `scheduled_for` is now or in the past, dispatch happens inline;
    /// the dispatcher's own re-fetch guard resolves the race with a
    /// concurrent processor pass, so the worst case is a harmless no-op.
    pub async fn schedule(&self, command: ScheduleCommand) -> CommsResult<CommunicationRecord> {
        let patient = self
            .records
            .patient(command.patient_id)
            .await?
            .ok_or(CommsError::NotFound {
                entity: "Patient",
                id: command.patient_id,
            })?;

        let appointment = match command.appointment_id {
            Some(id) => self.records.appointment(id).await?,
            None => None,
        };
        let treatment_plan = match command.treatment_plan_id {
            Some(id) => self.records.treatment_plan(id).await?,
            None => None,
        };

        let content = match command
            .custom_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
        {
            Some(message) => message.to_string(),
            None => content::generate(
                command.communication_type,
                &patient,
                appointment.as_ref(),
                treatment_plan.as_ref(),
            ),
        };

        let record = self
            .store
            .create(NewCommunication {
                patient_id: command.patient_id,
                communication_type: command.communication_type,
                channel: command.channel,
                content,
                scheduled_for: command.scheduled_for,
                treatment_plan_id: command.treatment_plan_id,
                appointment_id: command.appointment_id,
            })
            .await?;

        tracing::info!(
            communication_id = %record.id,
            patient_id = %record.patient_id,
            channel = %record.channel,
            communication_type = %record.communication_type,
            scheduled_for = %record.scheduled_for,
            "Communication scheduled"
        );

        if record.scheduled_for <= Utc::now() {
            if let Err(e) = self.dispatcher.dispatch(&record).await {
                // The record exists and will be retried by the next
                // processor pass; the schedule call itself still succeeds.
                tracing::error!(
                    communication_id = %record.id,
                    error = %e,
                    "Immediate dispatch failed"
                );
            }
            if let Some(current) = self.store.get(record.id).await? {
                return Ok(current);
            }
        }

        Ok(record)
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
    use assert_matches::assert_matches;
    use chrono::Duration;
    use dentiq_core::comms::CommunicationStatus;
    use dentiq_core::content::{AppointmentSnapshot, PatientSnapshot};
    use uuid::Uuid;

    fn engine() -> (Arc<InMemoryStore>, Arc<InMemoryRecords>, Scheduler) {
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
        let scheduler = Scheduler::new(
            Arc::clone(&store) as Arc<dyn CommunicationStore>,
            Arc::clone(&records) as Arc<dyn PatientRecords>,
            dispatcher,
        );
        (store, records, scheduler)
    }

    fn patient() -> PatientSnapshot {
        PatientSnapshot {
            id: Uuid::now_v7(),
            first_name: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            phone: Some("+15550100".to_string()),
        }
    }

    fn command(patient_id: Uuid, minutes_from_now: i64) -> ScheduleCommand {
        ScheduleCommand {
            patient_id,
            communication_type: CommunicationType::FollowUp,
            channel: Channel::Email,
            scheduled_for: Utc::now() + Duration::minutes(minutes_from_now),
            treatment_plan_id: None,
            appointment_id: None,
            custom_message: None,
        }
    }

    #[tokio::test]
    async fn future_schedule_creates_scheduled_record() {
        let (_, records, scheduler) = engine();
        let p = patient();
        records.insert_patient(p.clone());

        let record = scheduler.schedule(command(p.id, 5)).await.unwrap();
        assert_eq!(record.status, CommunicationStatus::Scheduled);
        assert!(record.sent_at.is_none());
        assert!(!record.content.is_empty());
    }

    #[tokio::test]
    async fn due_schedule_dispatches_immediately() {
        let (_, records, scheduler) = engine();
        let p = patient();
        records.insert_patient(p.clone());

        let record = scheduler.schedule(command(p.id, 0)).await.unwrap();
        assert_eq!(record.status, CommunicationStatus::Sent);
        assert!(record.sent_at.is_some());
    }

    #[tokio::test]
    async fn unknown_patient_is_rejected() {
        let (_, _, scheduler) = engine();
        let err = scheduler.schedule(command(Uuid::now_v7(), 5)).await.unwrap_err();
        assert_matches!(err, CommsError::NotFound { entity: "Patient", .. });
    }

    #[tokio::test]
    async fn custom_message_wins_over_generation() {
        let (_, records, scheduler) = engine();
        let p = patient();
        records.insert_patient(p.clone());

        let mut cmd = command(p.id, 5);
        cmd.custom_message = Some("Bring your old retainer.".to_string());
        let record = scheduler.schedule(cmd).await.unwrap();
        assert_eq!(record.content, "Bring your old retainer.");
    }

    #[tokio::test]
    async fn missing_appointment_falls_back_to_generic_content() {
        let (_, records, scheduler) = engine();
        let p = patient();
        records.insert_patient(p.clone());

        let mut cmd = command(p.id, 5);
        cmd.communication_type = CommunicationType::AppointmentReminder;
        cmd.appointment_id = Some(Uuid::now_v7()); // not in the records store
        let record = scheduler.schedule(cmd).await.unwrap();
        assert!(record.content.contains("upcoming dental appointment"));
    }

    #[tokio::test]
    async fn known_appointment_enriches_content() {
        let (_, records, scheduler) = engine();
        let p = patient();
        records.insert_patient(p.clone());
        let appt = AppointmentSnapshot {
            id: Uuid::now_v7(),
            scheduled_at: Utc::now() + Duration::days(2),
            practitioner_name: Some("Dr. Okafor".to_string()),
        };
        records.insert_appointment(appt.clone());

        let mut cmd = command(p.id, 5);
        cmd.communication_type = CommunicationType::AppointmentReminder;
        cmd.appointment_id = Some(appt.id);
        let record = scheduler.schedule(cmd).await.unwrap();
        assert!(record.content.contains("Dr. Okafor"));
        assert_eq!(record.appointment_id, Some(appt.id));
    }
}
