//! Message content generation.
//!
//! [`generate`] is a pure function from a communication type plus entity
//! snapshots to the message text stored on the record at creation time.
//! Lookups of the linked appointment/treatment plan happen in the caller;
//! a missing optional snapshot always falls back to a generic template, so
//! a broken upstream reference can never block message creation.

use crate::comms::CommunicationType;
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Entity snapshots
// ---------------------------------------------------------------------------

/// Contact-relevant view of a patient record.
#[derive(Debug, Clone)]
pub struct PatientSnapshot {
    pub id: EntityId,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Scheduling view of an appointment record.
#[derive(Debug, Clone)]
pub struct AppointmentSnapshot {
    pub id: EntityId,
    pub scheduled_at: Timestamp,
    pub practitioner_name: Option<String>,
}

/// Title/description view of a treatment plan.
#[derive(Debug, Clone)]
pub struct TreatmentPlanSnapshot {
    pub id: EntityId,
    pub title: String,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate the message text for a communication.
///
/// Never fails and never returns an empty string. Personalization uses the
/// patient's first name when present, otherwise a generic salutation.
pub fn generate(
    communication_type: CommunicationType,
    patient: &PatientSnapshot,
    appointment: Option<&AppointmentSnapshot>,
    treatment_plan: Option<&TreatmentPlanSnapshot>,
) -> String {
    let greeting = greeting(patient);

    match communication_type {
        CommunicationType::AppointmentReminder => match appointment {
            Some(appt) => {
                let when = format_appointment_time(appt.scheduled_at);
                match &appt.practitioner_name {
                    Some(practitioner) => format!(
                        "{greeting}, this is a reminder of your dental appointment on {when} \
                         with {practitioner}. Please arrive 10 minutes early, and contact the \
                         clinic if you need to reschedule."
                    ),
                    None => format!(
                        "{greeting}, this is a reminder of your dental appointment on {when}. \
                         Please arrive 10 minutes early, and contact the clinic if you need to \
                         reschedule."
                    ),
                }
            }
            None => format!(
                "{greeting}, this is a reminder that you have an upcoming dental appointment \
                 with us. Please contact the clinic to confirm the exact time."
            ),
        },

        CommunicationType::AppointmentCancellation => match appointment {
            Some(appt) => {
                let when = format_appointment_time(appt.scheduled_at);
                format!(
                    "{greeting}, your dental appointment on {when} has been cancelled. \
                     Please contact the clinic to arrange a new time."
                )
            }
            None => format!(
                "{greeting}, one of your dental appointments has been cancelled. \
                 Please contact the clinic to arrange a new time."
            ),
        },

        CommunicationType::TreatmentInfo => match treatment_plan {
            Some(plan) => {
                let details = plan
                    .description
                    .as_deref()
                    .unwrap_or("Your dental team will share more details at your next visit.");
                format!(
                    "{greeting}, here is some information about your treatment plan \
                     \"{}\": {details}",
                    plan.title
                )
            }
            None => format!(
                "{greeting}, your dental team has prepared treatment information for you. \
                 Please contact the clinic or check your patient portal for details."
            ),
        },

        CommunicationType::PostTreatment => format!(
            "{greeting}, we hope you are recovering well after your recent treatment. \
             Avoid hard or very hot food for the next 24 hours, and contact the clinic \
             right away if you notice persistent pain, swelling, or bleeding."
        ),

        CommunicationType::Education => format!(
            "{greeting}, a tip from your dental team: brush twice a day for two minutes, \
             floss daily, and replace your toothbrush every three months to keep your \
             smile healthy."
        ),

        CommunicationType::FollowUp => format!(
            "{greeting}, we are checking in after your recent visit. If you have any \
             questions or lingering discomfort, please reply or call the clinic and we \
             will be happy to help."
        ),

        CommunicationType::NewPatientWelcome => format!(
            "{greeting}, welcome to the clinic! Your patient profile is set up. You can \
             book appointments, view treatment plans, and message our team through the \
             patient portal at any time."
        ),

        CommunicationType::ProfileUpdate => format!(
            "{greeting}, your patient profile was recently updated. If you did not \
             request this change, please contact the clinic."
        ),
    }
}

/// Salutation used at the start of every generated message.
fn greeting(patient: &PatientSnapshot) -> String {
    match patient.first_name.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(name) => format!("Hi {name}"),
        None => "Hello".to_string(),
    }
}

/// Human-readable appointment time, e.g. `Monday 2 March 2026 at 14:30`.
fn format_appointment_time(at: Timestamp) -> String {
    at.format("%A %-d %B %Y at %H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
