use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use dentiq_api::config::ServerConfig;
use dentiq_api::router::build_app_router;
use dentiq_api::state::AppState;
use dentiq_comms::memory::{
    InMemoryRecords, InMemoryStore, RecordingMailer, RecordingSink, RecordingSmsGateway,
};
use dentiq_comms::{
    CancellationCoordinator, CommunicationStore, Dispatcher, Mailer, NotificationSink,
    PatientRecords, Processor, Scheduler, SmsGateway,
};
use dentiq_core::content::PatientSnapshot;
use dentiq_core::types::EntityId;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(app_notify_staff_id: Option<EntityId>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        app_notify_staff_id,
    }
}

/// A fully wired application over in-memory fakes, with handles for seeding
/// fixtures and asserting on delivery side effects.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub records: Arc<InMemoryRecords>,
    pub mailer: Arc<RecordingMailer>,
    pub sms: Arc<RecordingSmsGateway>,
    pub sink: Arc<RecordingSink>,
    pub staff_id: EntityId,
}

/// Build the full application router with the production middleware stack,
/// backed by in-memory store/records and recording channel fakes.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let records = Arc::new(InMemoryRecords::new());
    let mailer = Arc::new(RecordingMailer::new());
    let sms = Arc::new(RecordingSmsGateway::new());
    let sink = Arc::new(RecordingSink::new());
    let staff_id = Uuid::now_v7();

    let config = test_config(Some(staff_id));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&store) as Arc<dyn CommunicationStore>,
        Arc::clone(&records) as Arc<dyn PatientRecords>,
        Some(Arc::clone(&mailer) as Arc<dyn Mailer>),
        Some(Arc::clone(&sms) as Arc<dyn SmsGateway>),
        Arc::clone(&sink) as Arc<dyn NotificationSink>,
        Some(staff_id),
    ));
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&store) as Arc<dyn CommunicationStore>,
        Arc::clone(&records) as Arc<dyn PatientRecords>,
        Arc::clone(&dispatcher),
    ));
    let processor = Arc::new(Processor::new(
        Arc::clone(&store) as Arc<dyn CommunicationStore>,
        Arc::clone(&dispatcher),
    ));
    let cancellation = Arc::new(CancellationCoordinator::new(
        Arc::clone(&store) as Arc<dyn CommunicationStore>,
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::clone(&store) as Arc<dyn CommunicationStore>,
        scheduler,
        processor,
        cancellation,
    };

    let app = build_app_router(state, &config);

    TestApp {
        app,
        store,
        records,
        mailer,
        sms,
        sink,
        staff_id,
    }
}

/// Seed a patient with both email and phone, returning the id.
pub fn seed_patient(records: &InMemoryRecords) -> EntityId {
    let id = Uuid::now_v7();
    records.insert_patient(PatientSnapshot {
        id,
        first_name: Some("Alice".into()),
        email: Some("alice@example.com".into()),
        phone: Some("+15550100".into()),
    });
    id
}

/// Send a GET request to the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body to the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
