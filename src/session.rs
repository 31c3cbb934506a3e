use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::dangerous::insecure_decode;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::broadcast;

use crate::{fetch::FetchState, models::Role};

/// Cookie names of the credential store.
pub const TOKEN_COOKIE: &str = "token";
pub const ROLE_COOKIE: &str = "role";
pub const USER_ID_COOKIE: &str = "user_id";

/// Session
///
/// The shell's belief about who is navigating. Built from the request cookies;
/// nothing here is verified. The backend enforces authorization on every call
/// that matters, so a forged cookie only changes what the shell *shows*.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    token: Option<String>,
    role: Option<Role>,
    user_id: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(token: impl Into<String>, role: Option<Role>, user_id: Option<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
            role,
            user_id: user_id.filter(|id| !id.is_empty()),
        }
    }

    /// Reads the credential cookies. Never fails: anything unreadable is
    /// treated as absent, which makes the user anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = read_cookie(headers, TOKEN_COOKIE).filter(|t| !t.is_empty());
        let Some(token) = token else {
            return Self::anonymous();
        };
        Self {
            token: Some(token.to_string()),
            role: read_cookie(headers, ROLE_COOKIE).and_then(Role::parse),
            user_id: read_cookie(headers, USER_ID_COOKIE)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Role is only meaningful while a token is present.
    pub fn role(&self) -> Option<Role> {
        self.token.as_ref().and(self.role)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.token.as_ref().and(self.user_id.as_deref())
    }

    pub fn is_instructor(&self) -> bool {
        self.role() == Some(Role::Instructor)
    }

    /// Display claims carried by the token, when it happens to be a JWT.
    pub fn identity(&self) -> Option<IdentityClaims> {
        self.token.as_deref().and_then(decode_identity)
    }
}

/// IdentityClaims
///
/// Claims the shell reads for display purposes only (greeting, avatar seed).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct IdentityClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exp: Option<u64>,
}

/// Decodes the token payload without checking the signature or expiry.
/// Tokens that are not JWTs (or use an algorithm family we cannot parse) yield `None`.
pub fn decode_identity(token: &str) -> Option<IdentityClaims> {
    match insecure_decode::<IdentityClaims>(token) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!(error = %e, "token is not a readable JWT");
            None
        }
    }
}

/// Looks a cookie up across every `Cookie` header of the request.
fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().trim_matches('"'))
        })
}

// --- Credential writes ---

fn cookie(name: &str, value: &str, max_age: Option<i64>, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Characters that would break the `Set-Cookie` grammar are rejected rather than escaped.
fn is_cookie_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\'))
}

/// `Set-Cookie` values storing a new session. No Max-Age is set: the backend
/// token's own expiry decides how long the credential is worth anything.
pub fn session_cookies(session: &Session, secure: bool) -> Vec<String> {
    let mut cookies = Vec::new();
    if let Some(token) = session.token().filter(|t| is_cookie_safe(t)) {
        cookies.push(cookie(TOKEN_COOKIE, token, None, secure));
    }
    if let Some(role) = session.role() {
        cookies.push(cookie(ROLE_COOKIE, role.as_str(), None, secure));
    }
    if let Some(user_id) = session.user_id().filter(|id| is_cookie_safe(id)) {
        cookies.push(cookie(USER_ID_COOKIE, user_id, None, secure));
    }
    cookies
}

/// `Set-Cookie` values that remove token, role and the cached identity.
pub fn cleared_cookies(secure: bool) -> Vec<String> {
    [TOKEN_COOKIE, ROLE_COOKIE, USER_ID_COOKIE]
        .into_iter()
        .map(|name| cookie(name, "", Some(0), secure))
        .collect()
}

// --- Extractor ---

/// SessionContext
///
/// The one place handlers get the session from. The route guard stores the
/// session it evaluated in the request extensions, so a request is read once and
/// every consumer sees the same value. Outside the guard (unit tests, nested
/// routers) it falls back to parsing the cookies directly.
#[derive(Debug, Clone)]
pub struct SessionContext(pub Session);

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(SessionContext(session.clone()));
        }
        Ok(SessionContext(Session::from_headers(&parts.headers)))
    }
}

/// InstructorContext
///
/// Session of a caller whose stored role is `instructor`. Course management
/// handlers take this instead of `SessionContext`; anyone else gets a 403 with
/// the usual failed region state. The backend still has the final say.
#[derive(Debug, Clone)]
pub struct InstructorContext(pub Session);

impl<S> FromRequestParts<S> for InstructorContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<FetchState<()>>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(SessionContext(session)) = SessionContext::from_request_parts(parts, state).await;
        if !session.is_instructor() {
            return Err((
                StatusCode::FORBIDDEN,
                Json(FetchState::failed("Only instructors can manage courses")),
            ));
        }
        Ok(InstructorContext(session))
    }
}

// --- Subscribe / notify ---

/// SessionEvent
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn {
        user_id: Option<String>,
        role: Option<Role>,
    },
    SignedOut,
}

/// SessionHub
///
/// Broadcasts every sign-in and sign-out so interested parties react to one
/// authoritative change instead of polling cookies.
#[derive(Clone, Debug)]
pub struct SessionHub {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers received the event. Zero subscribers is fine.
    pub fn publish(&self, event: SessionEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn reads_token_and_role_from_cookies() {
        let session = Session::from_headers(&headers("theme=dark; token=abc.def; role=instructor"));
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("abc.def"));
        assert_eq!(session.role(), Some(Role::Instructor));
        assert!(session.is_instructor());
    }

    #[test]
    fn missing_or_empty_token_is_anonymous() {
        assert!(!Session::from_headers(&HeaderMap::new()).is_authenticated());
        let session = Session::from_headers(&headers("token=; role=student"));
        assert!(!session.is_authenticated());
        assert_eq!(session.role(), None);
    }

    #[test]
    fn role_without_token_is_ignored() {
        let session = Session::new("", Some(Role::Instructor), Some("u1".into()));
        assert_eq!(session.role(), None);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn unknown_role_degrades_to_none() {
        let session = Session::from_headers(&headers("token=t; role=admin"));
        assert!(session.is_authenticated());
        assert_eq!(session.role(), None);
    }

    #[test]
    fn identity_is_read_without_signature_check() {
        let claims = serde_json::json!({ "sub": "42", "email": "ada@example.com", "exp": 1 });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap();

        let identity = Session::new(token, None, None).identity().unwrap();
        assert_eq!(identity.sub.as_deref(), Some("42"));
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn opaque_token_has_no_identity() {
        assert!(Session::new("opaque-token", None, None).identity().is_none());
    }

    #[test]
    fn cleared_cookies_expire_every_credential() {
        let cookies = cleared_cookies(false);
        assert_eq!(cookies.len(), 3);
        for name in [TOKEN_COOKIE, ROLE_COOKIE, USER_ID_COOKIE] {
            assert!(
                cookies
                    .iter()
                    .any(|c| c.starts_with(&format!("{name}=;")) && c.contains("Max-Age=0"))
            );
        }
    }

    #[test]
    fn unsafe_cookie_values_are_not_written() {
        let session = Session::new("tok", Some(Role::Student), Some("a;b".into()));
        let cookies = session_cookies(&session, true);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.ends_with("; Secure")));
    }

    #[tokio::test]
    async fn hub_delivers_events_to_subscribers() {
        let hub = SessionHub::default();
        assert_eq!(hub.publish(SessionEvent::SignedOut), 0);

        let mut rx = hub.subscribe();
        assert_eq!(hub.publish(SessionEvent::SignedOut), 1);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::SignedOut);
    }
}
