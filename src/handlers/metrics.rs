use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusHandle;

pub fn describe_metrics() {
    describe_counter!(
        "judge_requests_total",
        "Backend requests by endpoint and outcome"
    );
    describe_histogram!(
        "judge_request_duration_ms",
        "Backend request duration in milliseconds"
    );
    describe_counter!(
        "session_rejections_total",
        "Run/submit attempts rejected before dispatch"
    );
    describe_counter!(
        "cache_invalidations_total",
        "Aggregates marked stale, by aggregate"
    );
    describe_counter!(
        "auth_expirations_total",
        "Credentials cleared after the backend rejected them"
    );
}

/// Renders collected metrics in the Prometheus text format.
pub fn render_metrics(handle: &PrometheusHandle) -> String {
    handle.run_upkeep();
    handle.render()
}
