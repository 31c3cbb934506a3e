use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Instructor Router Module
///
/// Course authoring and oversight. Every handler here extracts
/// `InstructorContext`, so a session whose role is not `instructor` gets a 403
/// before anything is sent to the backend.
pub fn instructor_routes() -> Router<AppState> {
    Router::new()
        // POST /courses
        // Multipart creation (title, description, level, category, outcomes, tags, thumbnail).
        .route("/courses", post(handlers::create_course))
        // POST /courses/{id}/modules
        // New modules are appended (order = count + 1).
        .route("/courses/{id}/modules", post(handlers::create_module))
        // POST /courses/{id}/modules/reorder
        // Swaps a module with its neighbour; a no-op at either end.
        .route(
            "/courses/{id}/modules/reorder",
            post(handlers::reorder_modules),
        )
        .route(
            "/courses/{id}/modules/{module_id}",
            delete(handlers::delete_module),
        )
        .route(
            "/courses/{id}/modules/{module_id}/content",
            post(handlers::create_content),
        )
        .route(
            "/courses/{id}/modules/{module_id}/content/{content_id}",
            delete(handlers::delete_content),
        )
        .route("/courses/{id}/assessments", post(handlers::create_assessment))
        .route(
            "/courses/{id}/assessments/{assessment_id}",
            delete(handlers::delete_assessment),
        )
        .route(
            "/courses/{id}/assessments/{assessment_id}/grade/{submission_id}",
            post(handlers::grade_submission),
        )
        // GET /courses/{id}/analytics?timeRange=week|month|year
        .route("/courses/{id}/analytics", get(handlers::analytics))
}
