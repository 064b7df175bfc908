//! HTTP surface: a landing page at `/` and the scrape endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::{ExporterError, ExporterResult};
use crate::metrics::Exposition;

#[derive(Clone)]
pub struct HttpState {
    exposition: Exposition,
    metrics_path: Arc<str>,
    content_type: Arc<str>,
}

impl HttpState {
    pub fn new(exposition: Exposition, metrics_path: &str) -> Self {
        let content_type = exposition.content_type();
        Self {
            exposition,
            metrics_path: metrics_path.into(),
            content_type: content_type.into(),
        }
    }
}

/// Build the application router
pub fn build_router(state: HttpState, request_timeout: Duration) -> Router {
    let metrics_path = state.metrics_path.to_string();

    Router::new()
        .route("/", get(root_handler))
        .route(&metrics_path, get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)),
        )
        .with_state(state)
}

async fn root_handler(State(state): State<HttpState>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>Nginx Log Exporter</title></head>
<body>
<h1>Nginx Log Exporter</h1>
<p><a href="{path}">Metrics</a></p>
</body>
</html>
"#,
        path = state.metrics_path
    ))
}

async fn metrics_handler(State(state): State<HttpState>) -> Response {
    match state.exposition.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, state.content_type.to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to render metrics: {}", e),
            )
                .into_response()
        }
    }
}

pub async fn bind(addr: SocketAddr) -> ExporterResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ExporterError::Bind { addr, source })
}

/// Serve until `cancel` fires, then drain in-flight requests.
pub async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) -> ExporterResult<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(ExporterError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::parser::{Country, Method, ParsedRequest};
    use crate::pipeline::PipelineStats;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router(path: &str) -> (Router, Arc<Aggregator>) {
        let aggregator = Arc::new(Aggregator::new());
        let stats = Arc::new(PipelineStats::new());
        let exposition = Exposition::new(Arc::clone(&aggregator), stats).unwrap();
        let router = build_router(HttpState::new(exposition, path), Duration::from_secs(5));
        (router, aggregator)
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_links_to_metrics_path() {
        let (router, _) = router("/custom/stats");
        let (status, content_type, body) = get_body(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains("<title>Nginx Log Exporter</title>"));
        assert!(body.contains(r#"<a href="/custom/stats">"#));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_exposition() {
        let (router, aggregator) = router("/metrics");
        aggregator.record(&ParsedRequest {
            country: Country::Code("FR".into()),
            domain: "example.org".to_string(),
            method: Method::Post,
            status_code: 201,
            duration_seconds: 0.75,
        });

        let (status, content_type, body) = get_body(router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert!(body.contains(
            r#"nginx_requests_total{code="201",country="FR",domain="example.org",method="POST"} 1"#
        ));
        assert!(body.contains("nginx_requests_duration_count 1"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (router, _) = router("/metrics");
        let (status, _, _) = get_body(router, "/other").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let (router, _) = router("/metrics");
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, router, cancel.clone()));
        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let first = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = first.local_addr().unwrap();
        let err = bind(addr).await.unwrap_err();
        assert!(matches!(err, ExporterError::Bind { .. }));
    }
}
