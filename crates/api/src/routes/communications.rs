//! Route definitions for the `/communications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::communications;
use crate::state::AppState;

/// Routes mounted at `/communications`.
///
/// ```text
/// POST   /                        -> schedule_communication
/// GET    /                        -> list_communications
/// GET    /process-scheduled       -> process_scheduled
/// POST   /cancel-by-appointment   -> cancel_by_appointment
/// GET    /{id}                    -> get_communication
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(communications::schedule_communication)
                .get(communications::list_communications),
        )
        .route(
            "/process-scheduled",
            get(communications::process_scheduled),
        )
        .route(
            "/cancel-by-appointment",
            post(communications::cancel_by_appointment),
        )
        .route("/{id}", get(communications::get_communication))
}
