use reqwest::{Method, RequestBuilder, Response, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
    session::Session,
};

/// ApiClient
///
/// The only way the shell talks to the learning API. Every request is built by
/// `request()`, which attaches the bearer token whenever the session carries one,
/// so no call site can forget (or invent) the header.
///
/// No retries and no explicit timeout: a failed call surfaces once.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, accept_invalid_certs: bool) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> ApiResult<Self> {
        Self::new(&config.api_base_url, config.accept_invalid_certs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API path (`/api/Courses` → `https://host/api/Courses`).
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and turns non-2xx answers into `ApiError::Status`.
    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "api call finished");

        if status.is_success() {
            return Ok(response);
        }
        // The body is only used for the log line; losing it is fine.
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await.map_err(ApiError::Transport)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, session: &Session, path: &str) -> ApiResult<T> {
        let response = self.send(self.request(Method::GET, path, session)).await?;
        Self::decode(response).await
    }

    pub async fn get_json_with_query<T, Q>(
        &self,
        session: &Session,
        path: &str,
        query: &Q,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path, session).query(query);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// GET whose body is irrelevant; only the status counts.
    pub async fn check(&self, session: &Session, path: &str) -> ApiResult<()> {
        self.send(self.request(Method::GET, path, session)).await?;
        Ok(())
    }

    pub async fn post_json<B, T>(&self, session: &Session, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path, session).json(body);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// POST with a JSON body whose response body is ignored.
    pub async fn post_json_unit<B>(&self, session: &Session, path: &str, body: &B) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path, session).json(body);
        self.send(builder).await?;
        Ok(())
    }

    /// POST without a body (completion marks, enrollments by path).
    pub async fn post_empty(&self, session: &Session, path: &str) -> ApiResult<()> {
        self.send(self.request(Method::POST, path, session)).await?;
        Ok(())
    }

    pub async fn put_json<B, T>(&self, session: &Session, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path, session).json(body);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, session: &Session, path: &str) -> ApiResult<()> {
        self.send(self.request(Method::DELETE, path, session)).await?;
        Ok(())
    }

    /// POST a multipart form. The response body is ignored.
    pub async fn post_multipart(&self, session: &Session, path: &str, form: Form) -> ApiResult<()> {
        let builder = self.request(Method::POST, path, session).multipart(form);
        self.send(builder).await?;
        Ok(())
    }
}
