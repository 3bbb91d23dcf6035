//! Route configuration and setup.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use vigil_core::constants::API_PREFIX;
use vigil_core::Config;

use crate::api_doc::ApiDoc;
use crate::auth::middleware::auth_middleware;
use crate::error::error_details_middleware;
use crate::handlers;
use crate::state::AppState;

/// Slack on top of the upload limit for multipart framing and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state.config);

    let protected = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.jwt.clone(),
        auth_middleware,
    ));

    let body_limit = usize::try_from(state.config.max_upload_size_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let app = public_routes()
        .nest(API_PREFIX, protected)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            error_details_middleware,
        ))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/videos/{token}", get(handlers::delivery::deliver_video))
        .route(
            "/api/openapi.json",
            get(|| async { Json(<ApiDoc as utoipa::OpenApi>::openapi()) }),
        )
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/videos", post(handlers::video_upload::upload_video))
        .route("/videos/{id}", get(handlers::video_get::get_video))
        .route(
            "/videos/{id}/check-in",
            post(handlers::check_in::check_in),
        )
        .route(
            "/videos/{id}/check-ins",
            get(handlers::check_in::list_check_ins),
        )
        .route("/storage", get(handlers::storage::get_storage_usage))
        .route("/me/push-token", put(handlers::push_token::set_push_token))
}

fn setup_cors(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    }
}
