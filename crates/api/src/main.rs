use std::net::SocketAddr;
use std::sync::Arc;

use passage_core::notifier::AnomalyNotifier;
use passage_core::SessionService;
use passage_events::{LogNotifier, WebhookNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use passage_api::config::ServerConfig;
use passage_api::router::build_app_router;
use passage_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "passage_api=debug,passage_core=debug,passage_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        algorithm = ?config.tokens.algorithm,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = passage_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    passage_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    passage_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Anomaly notifier ---
    let notifier: Arc<dyn AnomalyNotifier> = match &config.webhook_url {
        Some(url) => {
            let webhook =
                WebhookNotifier::new(url.as_str()).expect("Failed to build webhook client");
            tracing::info!(url = %webhook.url(), "Anomalies delivered by webhook");
            Arc::new(webhook)
        }
        None => {
            tracing::info!("WEBHOOK_URL not set, anomalies are only logged");
            Arc::new(LogNotifier)
        }
    };

    // --- Session service ---
    let hasher = config
        .hash
        .hasher()
        .expect("Invalid refresh hash parameters");
    let sessions = SessionService::new(
        Arc::new(passage_db::PgSessionStore::new(pool.clone())),
        notifier,
        config.tokens.clone(),
        hasher,
    );

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sessions: Arc::new(sessions),
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

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
