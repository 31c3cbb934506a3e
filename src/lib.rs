use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session, navigation guard and backend access.
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod session;

// Domain types, content walking and view states.
pub mod models;
pub mod sequencer;
pub mod views;

pub mod handlers;

// Route groups (Public, Authenticated, Instructor).
pub mod routes;
use routes::{authenticated, instructor, public};

// --- Public Re-exports ---

pub use api::{ApiState, HttpLearningApi, LearningApi};
pub use client::ApiClient;
pub use config::AppConfig;
pub use session::{Session, SessionHub};

/// AppState
///
/// The single container shared by every request: the backend seam, the loaded
/// configuration and the session event hub.
#[derive(Clone)]
pub struct AppState {
    /// Backend access. `HttpLearningApi` in production, stubs in tests.
    pub api: ApiState,
    pub config: AppConfig,
    /// Sign-in / sign-out notifications.
    pub sessions: SessionHub,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for ApiState {
    fn from_ref(app_state: &AppState) -> ApiState {
        app_state.api.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for SessionHub {
    fn from_ref(app_state: &AppState) -> SessionHub {
        app_state.sessions.clone()
    }
}

/// create_router
///
/// Assembles every route group behind the route guard, then wraps the result in
/// the request-id and tracing stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // The guard runs on every navigation, whatever the method.
    let base_router = Router::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(instructor::instructor_routes())
        .layer(middleware::from_fn(guard::route_guard))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one navigation, correlated by the generated `x-request-id`. The
/// query string is left out since it can carry `from=` paths and search terms.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
