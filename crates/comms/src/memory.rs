//! In-memory implementations of the capability traits.
//!
//! Test support: the unit and integration suites (here and in `dentiq-api`)
//! run the full lifecycle against these fakes, so no test needs a live
//! database, SMTP server, or SMS provider. Locks are short-lived and never
//! held across an await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use dentiq_core::comms::{CommunicationRecord, CommunicationStatus};
use dentiq_core::content::{AppointmentSnapshot, PatientSnapshot, TreatmentPlanSnapshot};
use dentiq_core::types::{EntityId, Timestamp};

use crate::delivery::email::Mailer;
use crate::delivery::inapp::NotificationSink;
use crate::delivery::sms::SmsGateway;
use crate::delivery::DeliveryError;
use crate::error::{CommsError, CommsResult};
use crate::records::PatientRecords;
use crate::store::{CommunicationStore, NewCommunication};

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

/// Hash-map-backed [`CommunicationStore`] with the same CAS semantics as the
/// Postgres implementation.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<EntityId, CommunicationRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunicationStore for InMemoryStore {
    async fn create(&self, draft: NewCommunication) -> CommsResult<CommunicationRecord> {
        let now = Utc::now();
        let record = CommunicationRecord {
            id: Uuid::now_v7(),
            patient_id: draft.patient_id,
            communication_type: draft.communication_type,
            channel: draft.channel,
            content: draft.content,
            scheduled_for: draft.scheduled_for,
            status: CommunicationStatus::Scheduled,
            sent_at: None,
            error_message: None,
            treatment_plan_id: draft.treatment_plan_id,
            appointment_id: draft.appointment_id,
            created_at: now,
            updated_at: now,
        };
        self.records
            .lock()
            .expect("lock poisoned")
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: EntityId) -> CommsResult<Option<CommunicationRecord>> {
        Ok(self.records.lock().expect("lock poisoned").get(&id).cloned())
    }

    async fn list_due_before(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> CommsResult<Vec<CommunicationRecord>> {
        let records = self.records.lock().expect("lock poisoned");
        let mut due: Vec<CommunicationRecord> = records
            .values()
            .filter(|r| r.is_due(cutoff))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.scheduled_for
                .cmp(&b.scheduled_for)
                .then(a.created_at.cmp(&b.created_at))
        });
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn list_for_patient(
        &self,
        patient_id: EntityId,
        limit: i64,
    ) -> CommsResult<Vec<CommunicationRecord>> {
        let records = self.records.lock().expect("lock poisoned");
        let mut result: Vec<CommunicationRecord> = records
            .values()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit.max(0) as usize);
        Ok(result)
    }

    async fn mark_sent(&self, id: EntityId, sent_at: Timestamp) -> CommsResult<bool> {
        let mut records = self.records.lock().expect("lock poisoned");
        match records.get_mut(&id) {
            Some(record) if record.status == CommunicationStatus::Scheduled => {
                record.status = CommunicationStatus::Sent;
                record.sent_at = Some(sent_at);
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(&self, id: EntityId, error_message: &str) -> CommsResult<bool> {
        let mut records = self.records.lock().expect("lock poisoned");
        match records.get_mut(&id) {
            Some(record) if record.status == CommunicationStatus::Scheduled => {
                record.status = CommunicationStatus::Failed;
                record.error_message = Some(error_message.to_string());
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_by_appointment(&self, appointment_id: EntityId) -> CommsResult<Vec<EntityId>> {
        let mut records = self.records.lock().expect("lock poisoned");
        let now = Utc::now();
        let mut cancelled = Vec::new();
        for record in records.values_mut() {
            if record.appointment_id == Some(appointment_id)
                && record.status == CommunicationStatus::Scheduled
            {
                record.status = CommunicationStatus::Cancelled;
                record.updated_at = now;
                cancelled.push(record.id);
            }
        }
        cancelled.sort();
        Ok(cancelled)
    }
}

// ---------------------------------------------------------------------------
// InMemoryRecords
// ---------------------------------------------------------------------------

/// Hash-map-backed [`PatientRecords`].
#[derive(Default)]
pub struct InMemoryRecords {
    patients: Mutex<HashMap<EntityId, PatientSnapshot>>,
    appointments: Mutex<HashMap<EntityId, AppointmentSnapshot>>,
    treatment_plans: Mutex<HashMap<EntityId, TreatmentPlanSnapshot>>,
    notified_plans: Mutex<Vec<EntityId>>,
    fail_plan_notified: AtomicBool,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_patient(&self, patient: PatientSnapshot) {
        self.patients
            .lock()
            .expect("lock poisoned")
            .insert(patient.id, patient);
    }

    pub fn insert_appointment(&self, appointment: AppointmentSnapshot) {
        self.appointments
            .lock()
            .expect("lock poisoned")
            .insert(appointment.id, appointment);
    }

    pub fn insert_treatment_plan(&self, plan: TreatmentPlanSnapshot) {
        self.treatment_plans
            .lock()
            .expect("lock poisoned")
            .insert(plan.id, plan);
    }

    /// Plans that received a `mark_plan_notified` call.
    pub fn notified_plans(&self) -> Vec<EntityId> {
        self.notified_plans.lock().expect("lock poisoned").clone()
    }

    /// Make subsequent `mark_plan_notified` calls fail.
    pub fn fail_plan_notified(&self, fail: bool) {
        self.fail_plan_notified.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PatientRecords for InMemoryRecords {
    async fn patient(&self, id: EntityId) -> CommsResult<Option<PatientSnapshot>> {
        Ok(self.patients.lock().expect("lock poisoned").get(&id).cloned())
    }

    async fn appointment(&self, id: EntityId) -> CommsResult<Option<AppointmentSnapshot>> {
        Ok(self
            .appointments
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn treatment_plan(&self, id: EntityId) -> CommsResult<Option<TreatmentPlanSnapshot>> {
        Ok(self
            .treatment_plans
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn mark_plan_notified(&self, id: EntityId) -> CommsResult<()> {
        if self.fail_plan_notified.load(Ordering::SeqCst) {
            return Err(CommsError::Internal(
                "treatment plan bookkeeping unavailable".to_string(),
            ));
        }
        self.notified_plans.lock().expect("lock poisoned").push(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording channel fakes
// ---------------------------------------------------------------------------

/// Records every email instead of sending it; optionally fails on demand.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    failure: Mutex<Option<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(to, subject, body)` tuples in send order.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().expect("lock poisoned") = Some(message.to_string());
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        if let Some(message) = self.failure.lock().expect("lock poisoned").clone() {
            return Err(DeliveryError::Smtp(message));
        }
        self.sent.lock().expect("lock poisoned").push((
            to.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Records every SMS instead of sending it; optionally fails on demand.
#[derive(Default)]
pub struct RecordingSmsGateway {
    sent: Mutex<Vec<(String, String)>>,
    failure: Mutex<Option<String>>,
}

impl RecordingSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(phone, body)` tuples in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().expect("lock poisoned") = Some(message.to_string());
    }
}

#[async_trait]
impl SmsGateway for RecordingSmsGateway {
    async fn send(&self, phone: &str, body: &str) -> Result<(), DeliveryError> {
        if let Some(message) = self.failure.lock().expect("lock poisoned").clone() {
            return Err(DeliveryError::Gateway(message));
        }
        self.sent
            .lock()
            .expect("lock poisoned")
            .push((phone.to_string(), body.to_string()));
        Ok(())
    }
}

/// Records staff notifications instead of persisting them.
#[derive(Default)]
pub struct RecordingSink {
    notes: Mutex<Vec<(EntityId, String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(recipient, title, body)` tuples in delivery order.
    pub fn notes(&self) -> Vec<(EntityId, String, String)> {
        self.notes.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify_staff(
        &self,
        recipient: EntityId,
        title: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        self.notes.lock().expect("lock poisoned").push((
            recipient,
            title.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dentiq_core::comms::{Channel, CommunicationType};

    fn draft(appointment_id: Option<EntityId>, minutes_from_now: i64) -> NewCommunication {
        NewCommunication {
            patient_id: Uuid::now_v7(),
            communication_type: CommunicationType::AppointmentReminder,
            channel: Channel::Email,
            content: "reminder".to_string(),
            scheduled_for: Utc::now() + Duration::minutes(minutes_from_now),
            treatment_plan_id: None,
            appointment_id,
        }
    }

    #[tokio::test]
    async fn mark_sent_is_a_noop_on_terminal_records() {
        let store = InMemoryStore::new();
        let record = store.create(draft(None, -1)).await.unwrap();

        assert!(store.mark_failed(record.id, "boom").await.unwrap());
        // Already failed: neither mark succeeds, state is unchanged.
        assert!(!store.mark_sent(record.id, Utc::now()).await.unwrap());
        assert!(!store.mark_failed(record.id, "again").await.unwrap());

        let current = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(current.status, CommunicationStatus::Failed);
        assert_eq!(current.error_message.as_deref(), Some("boom"));
        assert!(current.sent_at.is_none());
    }

    #[tokio::test]
    async fn cancel_by_appointment_is_idempotent() {
        let store = InMemoryStore::new();
        let appointment_id = Uuid::now_v7();
        store.create(draft(Some(appointment_id), 10)).await.unwrap();
        store.create(draft(Some(appointment_id), 20)).await.unwrap();

        let first = store.cancel_by_appointment(appointment_id).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = store.cancel_by_appointment(appointment_id).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn cancellation_skips_terminal_records() {
        let store = InMemoryStore::new();
        let appointment_id = Uuid::now_v7();
        let sent = store.create(draft(Some(appointment_id), -1)).await.unwrap();
        store.mark_sent(sent.id, Utc::now()).await.unwrap();
        let pending = store.create(draft(Some(appointment_id), 10)).await.unwrap();

        let cancelled = store.cancel_by_appointment(appointment_id).await.unwrap();
        assert_eq!(cancelled, vec![pending.id]);

        let untouched = store.get(sent.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, CommunicationStatus::Sent);
    }

    #[tokio::test]
    async fn list_due_before_excludes_future_and_non_scheduled() {
        let store = InMemoryStore::new();
        let due = store.create(draft(None, -5)).await.unwrap();
        let _future = store.create(draft(None, 5)).await.unwrap();
        let failed = store.create(draft(None, -10)).await.unwrap();
        store.mark_failed(failed.id, "boom").await.unwrap();

        let listed = store.list_due_before(Utc::now(), 50).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, due.id);
    }

    #[tokio::test]
    async fn list_due_before_orders_earliest_first_and_respects_limit() {
        let store = InMemoryStore::new();
        let later = store.create(draft(None, -1)).await.unwrap();
        let earliest = store.create(draft(None, -30)).await.unwrap();
        let middle = store.create(draft(None, -10)).await.unwrap();

        let listed = store.list_due_before(Utc::now(), 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, earliest.id);
        assert_eq!(listed[1].id, middle.id);
        assert!(listed.iter().all(|r| r.id != later.id));
    }
}
