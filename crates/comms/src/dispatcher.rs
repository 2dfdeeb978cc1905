//! Communication dispatcher.
//!
//! [`Dispatcher::dispatch`] drives one record through its status transition:
//! re-fetch (idempotence guard), channel delivery, then a conditional
//! `scheduled -> sent | failed` update. A record that has already reached a
//! terminal state is skipped without side effects, which makes the
//! dispatcher safe against overlapping processor passes and the immediate
//! dispatch path racing a cron trigger.

use std::sync::Arc;

use chrono::Utc;

use dentiq_core::comms::{
    truncate_error, Channel, CommunicationRecord, CommunicationStatus, CommunicationType,
};
use dentiq_core::content::PatientSnapshot;
use dentiq_core::types::EntityId;

use crate::delivery::email::Mailer;
use crate::delivery::inapp::NotificationSink;
use crate::delivery::sms::SmsGateway;
use crate::error::CommsResult;
use crate::records::PatientRecords;
use crate::store::CommunicationStore;

/// Drives individual communication records through delivery.
pub struct Dispatcher {
    store: Arc<dyn CommunicationStore>,
    records: Arc<dyn PatientRecords>,
    mailer: Option<Arc<dyn Mailer>>,
    sms: Option<Arc<dyn SmsGateway>>,
    sink: Arc<dyn NotificationSink>,
    /// Staff member that receives `app`-channel notifications. Configured,
    /// not hardcoded; when absent, `app`-channel records fail with a
    /// descriptive error.
    app_recipient: Option<EntityId>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn CommunicationStore>,
        records: Arc<dyn PatientRecords>,
        mailer: Option<Arc<dyn Mailer>>,
        sms: Option<Arc<dyn SmsGateway>>,
        sink: Arc<dyn NotificationSink>,
        app_recipient: Option<EntityId>,
    ) -> Self {
        Self {
            store,
            records,
            mailer,
            sms,
            sink,
            app_recipient,
        }
    }

    /// Dispatch a single record, returning whether delivery succeeded.
    ///
    /// A record that is no longer `scheduled` (handled concurrently) is an
    /// idempotent no-op and counts as success. Channel failures are captured
    /// on the record as a terminal `failed` status with a bounded error
    /// message and reported as `Ok(false)`; only store/lookup errors
    /// propagate as `Err`.
    pub async fn dispatch(&self, record: &CommunicationRecord) -> CommsResult<bool> {
        let Some(current) = self.store.get(record.id).await? else {
            tracing::warn!(
                communication_id = %record.id,
                "Communication record disappeared before dispatch"
            );
            return Ok(false);
        };

        if current.status != CommunicationStatus::Scheduled {
            tracing::debug!(
                communication_id = %current.id,
                status = %current.status,
                "Communication already handled, skipping dispatch"
            );
            return Ok(true);
        }

        let outcome = match self.records.patient(current.patient_id).await? {
            Some(patient) => self.deliver(&current, &patient).await,
            None => Err("patient record not found".to_string()),
        };

        match outcome {
            Ok(()) => {
                let transitioned = self.store.mark_sent(current.id, Utc::now()).await?;
                if transitioned {
                    tracing::info!(
                        communication_id = %current.id,
                        channel = %current.channel,
                        communication_type = %current.communication_type,
                        "Communication sent"
                    );

                    // Bookkeeping only; the notification itself succeeded.
                    if let Some(plan_id) = current.treatment_plan_id {
                        if let Err(e) = self.records.mark_plan_notified(plan_id).await {
                            tracing::warn!(
                                communication_id = %current.id,
                                treatment_plan_id = %plan_id,
                                error = %e,
                                "Failed to update treatment plan notification timestamp"
                            );
                        }
                    }
                }
                Ok(true)
            }
            Err(message) => {
                let message = truncate_error(&message);
                self.store.mark_failed(current.id, &message).await?;
                tracing::warn!(
                    communication_id = %current.id,
                    channel = %current.channel,
                    error = %message,
                    "Communication delivery failed"
                );
                Ok(false)
            }
        }
    }

    /// Attempt delivery on the record's channel. The returned error string
    /// becomes the record's `error_message`.
    async fn deliver(
        &self,
        record: &CommunicationRecord,
        patient: &PatientSnapshot,
    ) -> Result<(), String> {
        match record.channel {
            Channel::App => {
                let Some(recipient) = self.app_recipient else {
                    return Err("no staff recipient configured for app notifications".to_string());
                };
                let body = format!(
                    "Patient communication ({}): {}",
                    record.communication_type, record.content
                );
                self.sink
                    .notify_staff(recipient, subject(record.communication_type), &body)
                    .await
                    .map_err(|e| e.to_string())
            }

            Channel::Email => {
                let Some(to) = patient.email.as_deref().filter(|e| !e.trim().is_empty()) else {
                    return Err("patient has no email address on file".to_string());
                };
                let Some(mailer) = &self.mailer else {
                    return Err("email delivery is not configured".to_string());
                };
                mailer
                    .send(to, subject(record.communication_type), &record.content)
                    .await
                    .map_err(|e| e.to_string())
            }

            Channel::Sms => {
                let Some(phone) = patient.phone.as_deref().filter(|p| !p.trim().is_empty())
                else {
                    return Err("patient has no phone number on file".to_string());
                };
                let Some(sms) = &self.sms else {
                    return Err("SMS delivery is not configured".to_string());
                };
                sms.send(phone, &record.content)
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }
}

/// Subject line / notification title per communication type.
fn subject(communication_type: CommunicationType) -> &'static str {
    match communication_type {
        CommunicationType::AppointmentReminder => "Appointment reminder",
        CommunicationType::TreatmentInfo => "Your treatment plan",
        CommunicationType::PostTreatment => "Post-treatment care",
        CommunicationType::Education => "Dental health tip",
        CommunicationType::FollowUp => "Checking in",
        CommunicationType::AppointmentCancellation => "Appointment cancelled",
        CommunicationType::NewPatientWelcome => "Welcome to the clinic",
        CommunicationType::ProfileUpdate => "Profile updated",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
