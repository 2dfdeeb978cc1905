//! Communication record entity, closed enumerations, and status state machine.
//!
//! The string forms of [`CommunicationType`], [`Channel`], and
//! [`CommunicationStatus`] must match the values stored in the
//! `communications` table CHECK constraints and the wire format of the
//! scheduling API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Timestamp};

/// Maximum length of a persisted delivery error message.
pub const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Truncate a delivery error to [`MAX_ERROR_MESSAGE_LEN`] characters.
pub fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        message.to_string()
    } else {
        message.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
    }
}

// ---------------------------------------------------------------------------
// Closed enumerations
// ---------------------------------------------------------------------------

/// The kind of message being sent to (or about) a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationType {
    AppointmentReminder,
    TreatmentInfo,
    PostTreatment,
    Education,
    FollowUp,
    AppointmentCancellation,
    NewPatientWelcome,
    ProfileUpdate,
}

impl CommunicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppointmentReminder => "appointment_reminder",
            Self::TreatmentInfo => "treatment_info",
            Self::PostTreatment => "post_treatment",
            Self::Education => "education",
            Self::FollowUp => "follow_up",
            Self::AppointmentCancellation => "appointment_cancellation",
            Self::NewPatientWelcome => "new_patient_welcome",
            Self::ProfileUpdate => "profile_update",
        }
    }
}

impl FromStr for CommunicationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appointment_reminder" => Ok(Self::AppointmentReminder),
            "treatment_info" => Ok(Self::TreatmentInfo),
            "post_treatment" => Ok(Self::PostTreatment),
            "education" => Ok(Self::Education),
            "follow_up" => Ok(Self::FollowUp),
            "appointment_cancellation" => Ok(Self::AppointmentCancellation),
            "new_patient_welcome" => Ok(Self::NewPatientWelcome),
            "profile_update" => Ok(Self::ProfileUpdate),
            other => Err(format!("unknown communication type: {other}")),
        }
    }
}

impl fmt::Display for CommunicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery mechanism for a communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    App,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::App => "app",
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "app" => Ok(Self::App),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status state machine
// ---------------------------------------------------------------------------

/// Lifecycle status of a communication record.
///
/// `Scheduled` is the only state with outgoing transitions; `Sent`, `Failed`,
/// and `Cancelled` are terminal. All mutation paths enforce this with a
/// conditional update (`WHERE status = 'scheduled'`), so duplicate or
/// concurrent triggers degrade to no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStatus {
    Scheduled,
    Sent,
    Failed,
    Cancelled,
}

impl CommunicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the status permits no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scheduled)
    }

    /// Returns the set of valid target statuses reachable from `self`.
    pub fn valid_transitions(&self) -> &'static [CommunicationStatus] {
        match self {
            Self::Scheduled => &[Self::Sent, Self::Failed, Self::Cancelled],
            Self::Sent | Self::Failed | Self::Cancelled => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(&self, to: CommunicationStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl FromStr for CommunicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown communication status: {other}")),
        }
    }
}

impl fmt::Display for CommunicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CommunicationRecord
// ---------------------------------------------------------------------------

/// The persisted unit representing one scheduled or sent patient message.
///
/// Records are never deleted; terminal records remain as the audit trail.
/// Exactly one of `sent_at` / `error_message` is populated once the status
/// leaves `scheduled`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationRecord {
    pub id: EntityId,
    pub patient_id: EntityId,
    #[serde(rename = "type")]
    pub communication_type: CommunicationType,
    pub channel: Channel,
    pub content: String,
    pub scheduled_for: Timestamp,
    pub status: CommunicationStatus,
    pub sent_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub treatment_plan_id: Option<EntityId>,
    pub appointment_id: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CommunicationRecord {
    /// Whether the record is due at `now` and still eligible for dispatch.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status == CommunicationStatus::Scheduled && self.scheduled_for <= now
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn scheduled_to_sent() {
        assert!(CommunicationStatus::Scheduled.can_transition(CommunicationStatus::Sent));
    }

    #[test]
    fn scheduled_to_failed() {
        assert!(CommunicationStatus::Scheduled.can_transition(CommunicationStatus::Failed));
    }

    #[test]
    fn scheduled_to_cancelled() {
        assert!(CommunicationStatus::Scheduled.can_transition(CommunicationStatus::Cancelled));
    }

    #[test]
    fn sent_has_no_transitions() {
        assert!(CommunicationStatus::Sent.valid_transitions().is_empty());
    }

    #[test]
    fn failed_has_no_transitions() {
        assert!(CommunicationStatus::Failed.valid_transitions().is_empty());
    }

    #[test]
    fn cancelled_has_no_transitions() {
        assert!(CommunicationStatus::Cancelled.valid_transitions().is_empty());
    }

    #[test]
    fn sent_to_scheduled_invalid() {
        assert!(!CommunicationStatus::Sent.can_transition(CommunicationStatus::Scheduled));
    }

    #[test]
    fn scheduled_is_not_terminal() {
        assert!(!CommunicationStatus::Scheduled.is_terminal());
    }

    #[test]
    fn every_other_status_is_terminal() {
        assert!(CommunicationStatus::Sent.is_terminal());
        assert!(CommunicationStatus::Failed.is_terminal());
        assert!(CommunicationStatus::Cancelled.is_terminal());
    }

    // -----------------------------------------------------------------------
    // Due check
    // -----------------------------------------------------------------------

    fn record(status: CommunicationStatus, scheduled_for: Timestamp) -> CommunicationRecord {
        let now = chrono::Utc::now();
        CommunicationRecord {
            id: uuid::Uuid::now_v7(),
            patient_id: uuid::Uuid::now_v7(),
            communication_type: CommunicationType::FollowUp,
            channel: Channel::Email,
            content: "Checking in.".to_string(),
            scheduled_for,
            status,
            sent_at: None,
            error_message: None,
            treatment_plan_id: None,
            appointment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn scheduled_record_is_due_once_time_arrives() {
        let now = chrono::Utc::now();
        assert!(record(CommunicationStatus::Scheduled, now - chrono::Duration::minutes(1)).is_due(now));
        assert!(record(CommunicationStatus::Scheduled, now).is_due(now));
        assert!(!record(CommunicationStatus::Scheduled, now + chrono::Duration::minutes(1)).is_due(now));
    }

    #[test]
    fn terminal_records_are_never_due() {
        let now = chrono::Utc::now();
        let past = now - chrono::Duration::hours(1);
        assert!(!record(CommunicationStatus::Sent, past).is_due(now));
        assert!(!record(CommunicationStatus::Failed, past).is_due(now));
        assert!(!record(CommunicationStatus::Cancelled, past).is_due(now));
    }

    // -----------------------------------------------------------------------
    // String round-trips
    // -----------------------------------------------------------------------

    #[test]
    fn communication_type_round_trip() {
        let all = [
            CommunicationType::AppointmentReminder,
            CommunicationType::TreatmentInfo,
            CommunicationType::PostTreatment,
            CommunicationType::Education,
            CommunicationType::FollowUp,
            CommunicationType::AppointmentCancellation,
            CommunicationType::NewPatientWelcome,
            CommunicationType::ProfileUpdate,
        ];
        for t in all {
            assert_eq!(t.as_str().parse::<CommunicationType>().unwrap(), t);
        }
    }

    #[test]
    fn channel_round_trip() {
        for c in [Channel::Email, Channel::Sms, Channel::App] {
            assert_eq!(c.as_str().parse::<Channel>().unwrap(), c);
        }
    }

    #[test]
    fn status_round_trip() {
        let all = [
            CommunicationStatus::Scheduled,
            CommunicationStatus::Sent,
            CommunicationStatus::Failed,
            CommunicationStatus::Cancelled,
        ];
        for s in all {
            assert_eq!(s.as_str().parse::<CommunicationStatus>().unwrap(), s);
        }
    }

    #[test]
    fn unknown_strings_are_rejected() {
        assert!("push".parse::<Channel>().is_err());
        assert!("spam".parse::<CommunicationType>().is_err());
        assert!("pending".parse::<CommunicationStatus>().is_err());
    }

    #[test]
    fn type_serializes_snake_case() {
        let json = serde_json::to_string(&CommunicationType::AppointmentReminder).unwrap();
        assert_eq!(json, "\"appointment_reminder\"");
    }

    // -----------------------------------------------------------------------
    // Error truncation
    // -----------------------------------------------------------------------

    #[test]
    fn short_error_is_unchanged() {
        assert_eq!(truncate_error("boom"), "boom");
    }

    #[test]
    fn long_error_is_truncated_to_limit() {
        let long = "x".repeat(MAX_ERROR_MESSAGE_LEN + 100);
        let truncated = truncate_error(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_MESSAGE_LEN);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_MESSAGE_LEN + 1);
        let truncated = truncate_error(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_MESSAGE_LEN);
    }
}
