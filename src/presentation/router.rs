// Router - Routes, body limits and tower-http middleware
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and the text fields next to the file
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.settings.server.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let cors = cors_layer(&state.settings.server.cors_origins);

    let plant_routes = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/analyze-auto", post(handlers::analyze_auto))
        .route("/analyze-v2", post(handlers::analyze_v2))
        .route("/compare", post(handlers::compare))
        .route("/test", get(handlers::plant_test))
        .route("/growth-insight", post(handlers::growth_insight))
        .route("/update-growth", post(handlers::update_growth))
        .route("/growth-insight-v2", get(handlers::growth_insight_v2))
        .route("/monthly-data-analysis", get(handlers::monthly_data_analysis));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health))
        .route("/api/detect", post(handlers::detect))
        .route("/api/cleanup", delete(handlers::cleanup))
        .nest("/api/plant", plant_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
