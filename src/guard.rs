use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::session::Session;

/// Navigation targets that require a credential.
pub const PROTECTED_PREFIXES: [&str; 3] = ["/dashboard", "/courses", "/profile"];

/// Views only meaningful to anonymous users.
pub const AUTH_ONLY_WHEN_ABSENT: [&str; 2] = ["/login", "/register"];

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// GuardDecision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// The login redirect for `path`, remembering where the user was headed.
pub fn login_redirect(path: &str) -> String {
    format!("{LOGIN_PATH}?from={path}")
}

/// evaluate
///
/// Pure function of (path, credential presence); it keeps no memory between
/// calls and is evaluated on every navigation.
pub fn evaluate(path: &str, has_credential: bool) -> GuardDecision {
    if is_protected(path) && !has_credential {
        return GuardDecision::Redirect(login_redirect(path));
    }
    if AUTH_ONLY_WHEN_ABSENT.contains(&path) && has_credential {
        return GuardDecision::Redirect(DASHBOARD_PATH.to_string());
    }
    GuardDecision::Allow
}

/// route_guard
///
/// Middleware applied to the whole shell. Reads the session once, stores it in
/// the request extensions for `SessionContext`, and answers redirects with
/// `303 See Other` so form posts land on a GET.
pub async fn route_guard(mut request: Request, next: Next) -> Response {
    let session = Session::from_headers(request.headers());
    let path = request.uri().path().to_string();

    match evaluate(&path, session.is_authenticated()) {
        GuardDecision::Allow => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardDecision::Redirect(target) => {
            tracing::debug!(%path, %target, "navigation redirected");
            Redirect::to(&target).into_response()
        }
    }
}
