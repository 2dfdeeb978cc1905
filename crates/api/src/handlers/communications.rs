//! Handlers for the `/communications` resource.
//!
//! Scheduling and cancellation return a `{ "success": true, ... }` envelope;
//! reads return a plain `{ "data": ... }` envelope. Channel delivery failures
//! are not HTTP errors: they surface as `failed` records in the response body.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use dentiq_comms::{CancellationReport, CommsError, ProcessReport, ScheduleCommand};
use dentiq_core::comms::{Channel, CommunicationRecord, CommunicationType};
use dentiq_core::types::{EntityId, Timestamp};

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, SuccessResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body for `POST /communications`.
///
/// Required fields are modelled as `Option` so a missing field surfaces as a
/// 400 with a field list, not a deserialization rejection.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[validate(required)]
    pub patient_id: Option<EntityId>,
    #[serde(rename = "type")]
    #[validate(required)]
    pub communication_type: Option<CommunicationType>,
    #[validate(required)]
    pub channel: Option<Channel>,
    #[validate(required)]
    pub scheduled_for: Option<Timestamp>,
    pub treatment_plan_id: Option<EntityId>,
    pub appointment_id: Option<EntityId>,
    pub custom_message: Option<String>,
}

/// Body for `POST /communications/cancel-by-appointment`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub appointment_id: Option<EntityId>,
}

/// Response for `POST /communications/cancel-by-appointment`.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: CancellationReport,
}

/// Query parameters for `GET /communications`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub patient_id: Option<EntityId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
}

/// Maximum page size for communication listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for communication listing.
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/communications
///
/// Schedule a communication for a patient. Records due now or in the past are
/// dispatched immediately; the returned record reflects the post-dispatch
/// state (`sent` or `failed`), not the transient `scheduled` one.
pub async fn schedule_communication(
    State(state): State<AppState>,
    Json(input): Json<ScheduleRequest>,
) -> AppResult<Json<SuccessResponse<CommunicationRecord>>> {
    input.validate()?;

    let (Some(patient_id), Some(communication_type), Some(channel), Some(scheduled_for)) = (
        input.patient_id,
        input.communication_type,
        input.channel,
        input.scheduled_for,
    ) else {
        // Unreachable after validate(), but avoids unwrap.
        return Err(AppError::BadRequest("Missing required fields".into()));
    };

    let record = state
        .scheduler
        .schedule(ScheduleCommand {
            patient_id,
            communication_type,
            channel,
            scheduled_for,
            treatment_plan_id: input.treatment_plan_id,
            appointment_id: input.appointment_id,
            custom_message: input.custom_message,
        })
        .await?;

    Ok(Json(SuccessResponse::new(record)))
}

/// GET /api/v1/communications/process-scheduled
///
/// Dispatch all communications that are due. Intended to be hit by an
/// external cron; safe to call concurrently because status transitions are
/// conditional updates. Returns a per-record outcome report.
pub async fn process_scheduled(
    State(state): State<AppState>,
) -> AppResult<Json<ProcessReport>> {
    let report = state.processor.process_due().await?;
    Ok(Json(report))
}

/// POST /api/v1/communications/cancel-by-appointment
///
/// Cancel every still-pending communication tied to an appointment.
/// Idempotent: repeat calls report zero cancellations.
pub async fn cancel_by_appointment(
    State(state): State<AppState>,
    Json(input): Json<CancelRequest>,
) -> AppResult<Json<CancelResponse>> {
    let appointment_id = input.appointment_id.ok_or_else(|| {
        AppError::BadRequest("Missing required field: appointmentId".into())
    })?;

    let report = state.cancellation.cancel_by_appointment(appointment_id).await?;

    Ok(Json(CancelResponse {
        success: true,
        report,
    }))
}

/// GET /api/v1/communications/{id}
///
/// Fetch a single communication record.
pub async fn get_communication(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<CommunicationRecord>>> {
    let record = state
        .store
        .get(id)
        .await?
        .ok_or(CommsError::NotFound {
            entity: "Communication",
            id,
        })?;

    Ok(Json(DataResponse::new(record)))
}

/// GET /api/v1/communications?patientId={id}
///
/// List a patient's communications, newest first.
pub async fn list_communications(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<DataResponse<Vec<CommunicationRecord>>>> {
    let patient_id = params.patient_id.ok_or_else(|| {
        AppError::BadRequest("Missing required query parameter: patientId".into())
    })?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let records = state.store.list_for_patient(patient_id, limit).await?;

    Ok(Json(DataResponse::new(records)))
}
