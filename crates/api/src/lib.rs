//! Alert Intake API Server
//!
//! Receives alert-manager webhook batches and republishes each qualifying
//! alert as an event on the message bus.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod cli;
pub mod error;
pub mod forwarder;
mod routes;
pub mod telemetry;

use forwarder::AlertForwarder;

/// Application state shared across handlers
pub struct AppState {
    /// Normalize/publish pipeline
    pub forwarder: Arc<AlertForwarder>,
    /// Prometheus recorder, when installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(forwarder: AlertForwarder) -> Self {
        Self {
            forwarder: Arc::new(forwarder),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/alert", post(routes::intake::receive_alerts))
        .route("/health", get(health_handler))
        .route("/metrics", get(routes::prometheus::render))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Serve until the listener fails
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening for alerts on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::Normalizer;
    use axum::{body::Body, http::StatusCode};
    use event_publisher::MemoryPublisher;
    use tower::ServiceExt;

    fn app() -> Router {
        let forwarder = AlertForwarder::new(Normalizer::default(), Arc::new(MemoryPublisher::new()));
        create_router(Arc::new(AppState::new(forwarder)))
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = app().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_alert_route_is_post_only() {
        let response = app().oneshot(get("/alert")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
