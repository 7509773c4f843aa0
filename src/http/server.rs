//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request id, tracing, timeout, limits, panic capture)
//! - Serve on a bound listener until shutdown is signalled

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath, State},
    http::{HeaderName, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::health::health;
use crate::http::relay::relay_handler;
use crate::lifecycle::StartupError;
use crate::observability::metrics;
use crate::schedule::{get_schedule, OcmClient};
use crate::upstream::UpstreamClient;

const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub upstream: UpstreamClient,
    pub base_url: Url,
    pub ocm: OcmClient,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let upstream = UpstreamClient::new(&config)?;
        let base_url = Url::parse(&config.upstream.base_url)?;
        let ocm = OcmClient::new(upstream.clone(), base_url.clone(), config.schedule.window_days);

        Ok(Self {
            config: Arc::new(config),
            upstream,
            base_url,
            ocm,
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let state = AppState::new(config)?;
        let config = state.config.clone();
        let router = build_router(state);
        Ok(Self { router, config })
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns once `shutdown` fires and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            relay_enabled = self.config.security.relay_enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/getSchedule", post(get_schedule));
    if config.security.relay_enabled {
        router = router
            .route("/relay", any(relay_handler))
            .route("/relay/{*path}", any(relay_handler));
    }

    let request_id = HeaderName::from_static(X_REQUEST_ID);
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn_with_state(
            config.timeouts.request(),
            enforce_deadline,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size));

    router
        .fallback(not_found)
        .with_state(state)
        .layer(middleware)
}

/// Bound the whole request. On expiry the handler future is dropped, which
/// cancels any in-flight upstream call, and the caller gets a JSON 504.
async fn enforce_deadline(
    State(deadline): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => GatewayError::DeadlineExceeded.into_response(),
    }
}

async fn not_found() -> GatewayError {
    GatewayError::NotFound
}

/// Convert a handler panic into a 500; the server keeps running.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    GatewayError::Internal(detail).into_response()
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn test_router(mutate: impl FnOnce(&mut GatewayConfig)) -> Router {
        let mut config = GatewayConfig::default();
        // Nothing listens here; handlers that reach upstream fail fast.
        config.upstream.base_url = "http://127.0.0.1:9".into();
        mutate(&mut config);
        HttpServer::new(config).unwrap().router()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_ok() {
        let response = test_router(|_| {})
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = test_router(|_| {})
            .oneshot(
                Request::get("/health")
                    .header(X_REQUEST_ID, "caller-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get(X_REQUEST_ID).unwrap(), "caller-supplied");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let response = test_router(|_| {})
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Not found");
    }

    #[tokio::test]
    async fn test_relay_disabled_is_404() {
        let response = test_router(|c| c.security.relay_enabled = false)
            .oneshot(Request::get("/relay/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_schedule_rejects_malformed_body() {
        let response = test_router(|_| {})
            .oneshot(
                Request::post("/getSchedule")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let response = test_router(|c| c.security.max_body_size = 16)
            .oneshot(
                Request::post("/getSchedule")
                    .header("content-length", "64")
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_deadline_yields_json_504() {
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(middleware::from_fn_with_state(
                Duration::from_millis(50),
                enforce_deadline,
            ));

        let response = router
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json_body(response).await["error"], "Request timed out");
    }

    #[tokio::test]
    async fn test_relay_chunked_body_over_limit_is_413() {
        // No content-length, so the limit is enforced while buffering.
        let response = test_router(|c| c.security.max_body_size = 16)
            .oneshot(
                Request::post("/relay/api")
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Internal server error");
    }
}
