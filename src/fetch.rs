use serde::Serialize;
use std::future::Future;
use tokio::{sync::oneshot, task::JoinSet};

use crate::error::ApiResult;

/// FetchState
///
/// The lifecycle of one view region's data: it is either waiting, loaded, or
/// carries the single human-readable message shown in the region's error banner.
/// Serialized as `{"status": "loaded", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum FetchState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> FetchState<T> {
    /// Folds a call result into the region state. Transport, status and decode
    /// failures all collapse into `context`; the cause goes to the log only.
    pub fn from_result(result: ApiResult<T>, context: &str) -> Self {
        match result {
            Ok(value) => FetchState::Loaded(value),
            Err(e) => {
                tracing::warn!(error = %e, "{context}");
                FetchState::Failed(context.to_string())
            }
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        FetchState::Failed(message.into())
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchState<U> {
        match self {
            FetchState::Idle => FetchState::Idle,
            FetchState::Loading => FetchState::Loading,
            FetchState::Loaded(value) => FetchState::Loaded(f(value)),
            FetchState::Failed(message) => FetchState::Failed(message),
        }
    }
}

/// ViewScope
///
/// Owns the in-flight requests of one view. Dropping the scope (the view is torn
/// down, or the navigation future is dropped because the browser went away)
/// aborts every request still running, so no late response lands anywhere.
#[derive(Default)]
pub struct ViewScope {
    tasks: JoinSet<()>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `fut` inside the scope and hands back the slot its output lands in.
    pub fn spawn<T, F>(&mut self, fut: F) -> Pending<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.tasks.spawn(async move {
            // The receiver may be gone already; nothing to do then.
            let _ = tx.send(fut.await);
        });
        Pending { rx }
    }

    /// Requests that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}

/// Pending
///
/// Output slot of a request spawned in a `ViewScope`.
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Pending<T> {
    /// `None` when the request was aborted before producing a value.
    pub async fn wait(self) -> Option<T> {
        self.rx.await.ok()
    }
}

impl<T> Pending<FetchState<T>> {
    /// Waits for a region state; an aborted request reads as a failed region.
    pub async fn settle(self, context: &str) -> FetchState<T> {
        self.wait()
            .await
            .unwrap_or_else(|| FetchState::failed(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use reqwest::StatusCode;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    };

    #[test]
    fn every_failure_class_collapses_to_context() {
        let status: FetchState<u8> = FetchState::from_result(
            Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                body: "nope".into(),
            }),
            "Failed to fetch reviews",
        );
        let decode: FetchState<u8> =
            FetchState::from_result(Err(ApiError::Decode("bad".into())), "Failed to fetch reviews");

        assert_eq!(status, FetchState::Failed("Failed to fetch reviews".into()));
        assert_eq!(status, decode);
    }

    #[test]
    fn serializes_with_status_tag() {
        let loaded = serde_json::to_value(FetchState::Loaded(vec![1, 2])).unwrap();
        assert_eq!(loaded, serde_json::json!({ "status": "loaded", "data": [1, 2] }));

        let failed = serde_json::to_value(FetchState::<u8>::failed("boom")).unwrap();
        assert_eq!(failed, serde_json::json!({ "status": "failed", "data": "boom" }));
    }

    #[tokio::test]
    async fn scope_delivers_results() {
        let mut scope = ViewScope::new();
        let a = scope.spawn(async { 1 });
        let b = scope.spawn(async { "two" });
        assert_eq!(a.wait().await, Some(1));
        assert_eq!(b.wait().await, Some("two"));
    }

    #[tokio::test]
    async fn dropping_scope_aborts_in_flight_requests() {
        let landed = Arc::new(AtomicBool::new(false));
        let flag = landed.clone();

        let mut scope = ViewScope::new();
        let pending = scope.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(scope.in_flight(), 1);
        drop(scope);

        assert_eq!(pending.wait().await, None);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!landed.load(Ordering::SeqCst));
    }
}
