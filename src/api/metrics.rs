//! Prometheus metrics endpoint and HTTP request tracking middleware.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const USERS_TOTAL: &str = "hbnb_users_total";
pub const PLACES_TOTAL: &str = "hbnb_places_total";
pub const REVIEWS_TOTAL: &str = "hbnb_reviews_total";
pub const AMENITIES_TOTAL: &str = "hbnb_amenities_total";

/// Install the global Prometheus recorder. Call once at startup.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests received"
    );
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_gauge!(USERS_TOTAL, "Number of registered users");
    describe_gauge!(PLACES_TOTAL, "Number of listed places");
    describe_gauge!(REVIEWS_TOTAL, "Number of reviews");
    describe_gauge!(AMENITIES_TOTAL, "Number of amenities");

    Ok(handle)
}

/// GET /metrics - Prometheus text format, no authentication
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_gauge_metrics(&state).await;

    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (
            StatusCode::NOT_FOUND,
            "Metrics are disabled".to_string(),
        ),
    }
}

/// Refresh entity-count gauges from storage
async fn update_gauge_metrics(state: &AppState) {
    for (gauge_name, table) in [
        (USERS_TOTAL, "users"),
        (PLACES_TOTAL, "places"),
        (REVIEWS_TOTAL, "reviews"),
        (AMENITIES_TOTAL, "amenities"),
    ] {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        if let Ok(count) = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&state.db).await {
            gauge!(gauge_name).set(count as f64);
        }
    }
}

/// Records `http_requests_total` and `http_request_duration_seconds`,
/// labelled by method and matched route template.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    // Use the route template (e.g. /places/:id) to keep label cardinality low
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}
