#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use promptdash_api::config::ServerConfig;
use promptdash_api::router::build_app_router;
use promptdash_api::state::AppState;
use promptdash_worker::ManualScheduler;

/// Build a test `ServerConfig` with safe defaults and seeded scoring.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        scoring_seed: Some(7),
        ..ServerConfig::default()
    }
}

/// The application plus the scheduler holding its pending completions.
pub struct TestApp {
    pub router: Router,
    pub scheduler: Arc<ManualScheduler>,
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response<Body> {
        send(self.router.clone(), Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str) -> Response<Body> {
        send(self.router.clone(), Method::POST, uri, None).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        send(self.router.clone(), Method::POST, uri, Some(body)).await
    }

    /// Fire every pending completion.
    pub async fn complete_jobs(&self) -> usize {
        self.scheduler.run_pending().await
    }
}

/// Build the full application router with the production middleware stack
/// and a manual scheduler, so completions fire only when a test asks.
pub fn build_test_app() -> TestApp {
    let scheduler = Arc::new(ManualScheduler::new());
    let state = AppState::new(test_config(), scheduler.clone());
    let router = build_app_router(state).expect("test config is valid");
    TestApp { router, scheduler }
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
