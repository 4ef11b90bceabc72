//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "pitchside_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "pitchside_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "pitchside_http_requests_in_flight";

    // Live state metrics
    pub const PREWARM_RUNS_TOTAL: &str = "pitchside_prewarm_runs_total";
    pub const PREWARM_SNAPSHOTS_BUILT: &str = "pitchside_prewarm_snapshots_built_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a completed prewarm run.
pub fn record_prewarm_run(outcome: &str, snapshots_built: u32) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::PREWARM_RUNS_TOTAL, &labels).increment(1);
    counter!(names::PREWARM_SNAPSHOTS_BUILT).increment(snapshots_built as u64);
}

static VIDEO_ID_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/videos/[a-zA-Z0-9_-]+").unwrap());

/// Sanitize path for metrics labels (bound cardinality).
fn sanitize_path(path: &str) -> String {
    VIDEO_ID_SEGMENT
        .replace_all(path, "/videos/:video_id")
        .to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/videos/abc123-def456/live"),
            "/api/videos/:video_id/live"
        );
        assert_eq!(
            sanitize_path("/api/videos/vid_9/live/prime"),
            "/api/videos/:video_id/live/prime"
        );
        assert_eq!(sanitize_path("/health"), "/health");
    }
}
