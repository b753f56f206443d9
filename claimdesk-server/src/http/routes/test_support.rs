//! Router fixtures shared by the route tests

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

use claimdesk_core::{AccessToken, Backend, MemoryBackend};

use crate::http::server::{build_router, AppState};
use crate::session::COOKIE_NAME;

pub(crate) struct TestApp {
    pub app: Router,
    pub backend: Arc<MemoryBackend>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        let backend = Arc::new(MemoryBackend::demo().await);
        let state = Arc::new(AppState::new(backend.clone() as Arc<dyn Backend>, false));
        let app = build_router(state.clone(), Duration::from_secs(5));
        Self { app, backend, state }
    }

    /// Sign the demo account in directly against the backend
    pub async fn sign_in(&self) -> AccessToken {
        self.backend
            .sign_in("demo@example.com", "demo")
            .await
            .unwrap()
            .access_token
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub(crate) fn cookie(token: &AccessToken) -> String {
    format!("{}={}", COOKIE_NAME, token.as_str())
}

pub(crate) async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub(crate) fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}
