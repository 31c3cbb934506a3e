use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Everything below the protected prefixes. The route guard has already sent
/// anonymous users to `/login?from=<path>` before any of these handlers run.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/dashboard", get(handlers::dashboard))
        // --- Catalog ---
        // GET /courses?query=&level=&category=&minPrice=&maxPrice=
        // Filters the fetched catalog locally.
        .route("/courses", get(handlers::list_courses))
        // GET /courses/search
        // Same filters, forwarded to the backend search.
        .route("/courses/search", get(handlers::search_courses))
        .route("/courses/recommendations", get(handlers::recommendations))
        .route("/courses/{id}", get(handlers::course_detail))
        // POST /courses/{id}/enroll
        // Redirects into the learn view on success.
        .route("/courses/{id}/enroll", post(handlers::enroll))
        // --- Learning ---
        // GET /courses/{id}/learn?module=&item=
        .route("/courses/{id}/learn", get(handlers::learn))
        .route(
            "/courses/{id}/content/{content_id}/complete",
            post(handlers::complete_content),
        )
        .route("/courses/{id}/modules", get(handlers::list_modules))
        .route("/courses/{id}/assessments", get(handlers::list_assessments))
        .route(
            "/courses/{id}/assessments/{assessment_id}",
            get(handlers::get_assessment),
        )
        .route(
            "/courses/{id}/assessments/{assessment_id}/submit",
            post(handlers::submit_assessment),
        )
        // --- Community ---
        .route(
            "/courses/{id}/discussions",
            get(handlers::list_threads).post(handlers::create_thread),
        )
        .route(
            "/courses/{id}/discussions/{thread_id}/replies",
            post(handlers::add_reply),
        )
        .route(
            "/courses/{id}/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        // --- Progress & Certificates ---
        // GET /courses/{id}/progress?studentId=
        .route("/courses/{id}/progress", get(handlers::progress))
        // GET /courses/{id}/certificate
        // Completion is checked before the certificate is requested.
        .route("/courses/{id}/certificate", get(handlers::certificate))
        // --- Profile ---
        .route(
            "/profile",
            get(handlers::profile).put(handlers::update_profile),
        )
        .route("/profile/badges", get(handlers::badges))
}
