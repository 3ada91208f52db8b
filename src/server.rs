//! Router assembly.
//!
//! Kept apart from `main` so tests can drive the exact same routes in-process.

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::errors::AppError;
use crate::handlers::{self, AppState};
use crate::openapi::ApiDoc;

/// Serves the generated OpenAPI document.
async fn serve_openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page embeds the Swagger UI and loads the document served by
/// `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Broker API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Builds the application router.
///
/// `POST /contact` is rate limited per client IP unless
/// `config.rate_limit_per_second` is zero. The client IP is read from
/// `X-Forwarded-For`/`Forwarded` and falls back to the peer address, so the
/// router must be served with `into_make_service_with_connect_info`.
///
/// Refusals from the limiter and from the body size limit use the same
/// `{detail}` JSON body as every other error.
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;
    let max_body_bytes = config.max_body_bytes;

    let mut contact: Router<Arc<AppState>> =
        Router::new().route("/contact", post(handlers::create_lead));

    if let Some(period) = config.rate_limit_replenish_interval() {
        let governor_conf = GovernorConfigBuilder::default()
            .period(period)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .error_handler(|e| AppError::from(e).into_response())
            .finish();
        match governor_conf {
            Some(conf) => {
                tracing::debug!(
                    "Rate limit on /contact: {}/s, burst {}",
                    config.rate_limit_per_second,
                    config.rate_limit_burst
                );
                contact = contact.layer(GovernorLayer {
                    config: Arc::new(conf),
                });
            }
            None => tracing::error!("Invalid rate limit configuration, limiter disabled"),
        }
    }

    Router::new()
        .route("/", get(handlers::root))
        .route("/test", get(handlers::test_db))
        .route("/schema", get(handlers::get_schema))
        .route("/leads", get(handlers::list_leads))
        // API Documentation
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.json", get(serve_openapi_spec))
        .merge(contact)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
