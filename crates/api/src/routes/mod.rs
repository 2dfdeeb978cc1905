pub mod communications;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /communications                           schedule (POST), list by patient (GET)
/// /communications/process-scheduled        dispatch due communications (GET)
/// /communications/cancel-by-appointment    cancel pending for an appointment (POST)
/// /communications/{id}                      fetch a single record (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/communications", communications::router())
}
