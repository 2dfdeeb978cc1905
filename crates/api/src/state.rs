use std::sync::Arc;

use dentiq_comms::{CancellationCoordinator, CommunicationStore, Processor, Scheduler};

use crate::config::ServerConfig;

/// Shared application state, cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<dyn CommunicationStore>,
    pub scheduler: Arc<Scheduler>,
    pub processor: Arc<Processor>,
    pub cancellation: Arc<CancellationCoordinator>,
}
