use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Pages that work for anonymous users. The guard still runs on them: `/login`
/// and `/register` bounce a signed-in user to the dashboard.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check. Never touches the backend.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Landing view: navigation plus the course catalog.
        .route("/", get(handlers::home))
        // GET/POST /login
        // The POST stores the session cookies and continues to `from` (or /dashboard).
        .route("/login", get(handlers::login_page).post(handlers::login))
        // GET/POST /register
        .route("/register", get(handlers::register_page).post(handlers::register))
        // POST /logout
        // Clears every credential cookie and lands on /login.
        .route("/logout", post(handlers::logout))
        // GET /enrollments
        .route("/enrollments", get(handlers::enrollments))
}
