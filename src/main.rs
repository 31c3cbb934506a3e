use learn_portal::{
    ApiState, AppState, HttpLearningApi, SessionHub,
    client::ApiClient,
    config::{AppConfig, Env},
    create_router,
    session::SessionEvent,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, builds the backend client and serves
/// the shell.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production settings)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "learn_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Shell starting in {:?} mode", config.env);

    // 3. Backend access
    let client = ApiClient::from_config(&config)
        .expect("FATAL: Failed to build the HTTP client for the learning API.");
    tracing::info!(api = %client.base_url(), "learning API configured");
    let api = Arc::new(HttpLearningApi::new(client)) as ApiState;

    // 4. Session notifications: one subscriber that records every change.
    let sessions = SessionHub::default();
    let mut events = sessions.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignedIn { user_id, role }) => {
                    tracing::info!(user_id = ?user_id, role = ?role, "session started");
                }
                Ok(SessionEvent::SignedOut) => tracing::info!("session ended"),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "session events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        api,
        config,
        sessions,
    });

    // 5. Serve
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.unwrap();
}
