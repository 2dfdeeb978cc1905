use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dentiq_api::config::ServerConfig;
use dentiq_api::router::build_app_router;
use dentiq_api::state::AppState;
use dentiq_comms::{
    CancellationCoordinator, CommunicationStore, Dispatcher, EmailConfig, HttpSmsGateway, Mailer,
    NotificationSink, PatientRecords, Processor, Scheduler, SmsConfig, SmsGateway, SmtpMailer,
};
use dentiq_db::repositories::{PgCommunicationStore, PgNotificationSink, PgPatientRecords};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dentiq_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = dentiq_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    dentiq_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    dentiq_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Persistence ---
    let store: Arc<dyn CommunicationStore> = Arc::new(PgCommunicationStore::new(pool.clone()));
    let records: Arc<dyn PatientRecords> = Arc::new(PgPatientRecords::new(pool.clone()));
    let sink: Arc<dyn NotificationSink> = Arc::new(PgNotificationSink::new(pool.clone()));

    // --- Delivery channels ---
    // Unconfigured channels stay usable for scheduling; dispatch records a
    // failed outcome instead of erroring at the HTTP layer.
    let mailer: Option<Arc<dyn Mailer>> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!("SMTP mailer configured");
            Some(Arc::new(SmtpMailer::new(email_config)))
        }
        None => {
            tracing::warn!("SMTP not configured; email communications will be marked failed");
            None
        }
    };

    let sms: Option<Arc<dyn SmsGateway>> = match SmsConfig::from_env() {
        Some(sms_config) => {
            let gateway =
                HttpSmsGateway::new(sms_config).expect("Failed to build SMS gateway client");
            tracing::info!("SMS gateway configured");
            Some(Arc::new(gateway))
        }
        None => {
            tracing::warn!("SMS gateway not configured; sms communications will be marked failed");
            None
        }
    };

    if config.app_notify_staff_id.is_none() {
        tracing::warn!(
            "APP_NOTIFY_STAFF_ID not set; app communications will be marked failed"
        );
    }

    // --- Lifecycle engine ---
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&store),
        Arc::clone(&records),
        mailer,
        sms,
        sink,
        config.app_notify_staff_id,
    ));
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&store),
        Arc::clone(&records),
        Arc::clone(&dispatcher),
    ));
    let processor = Arc::new(Processor::new(
        Arc::clone(&store),
        Arc::clone(&dispatcher),
    ));
    let cancellation = Arc::new(CancellationCoordinator::new(Arc::clone(&store)));

    // --- App state & router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        scheduler,
        processor,
        cancellation,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
