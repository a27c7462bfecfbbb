//! Route configuration and setup

use crate::auth::{auth_middleware, JwtService};
use crate::constants::{API_PREFIX, ASSETS_MOUNT, MULTIPART_OVERHEAD_BYTES, OPENAPI_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, put},
    Json, Router,
};
use reelhouse_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config);
    let jwt = Arc::new(JwtService::new(config.jwt_secret(), config.jwt_issuer()));

    // Protected routes (require a valid bearer token)
    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        jwt,
        auth_middleware,
    ));

    // Uploads are streamed; the ingestion service enforces per-kind ceilings.
    // This outer limit only bounds the raw body including multipart framing.
    let body_limit = usize::try_from(
        config
            .max_video_size_bytes()
            .max(config.max_thumbnail_size_bytes()),
    )
    .unwrap_or(usize::MAX)
    .saturating_add(MULTIPART_OVERHEAD_BYTES);

    tracing::info!(
        body_limit_bytes = body_limit,
        assets_root = %config.assets_root().display(),
        "Routes configured"
    );

    let app = public_routes()
        .merge(protected_routes)
        .with_state(state)
        .nest_service(ASSETS_MOUNT, ServeDir::new(config.assets_root()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Setup CORS configuration
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
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    }
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            OPENAPI_PATH,
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

/// Upload routes; PUT and POST are equivalent.
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/videos/{{media_id}}/video", API_PREFIX),
            put(handlers::video_upload::upload_video).post(handlers::video_upload::upload_video),
        )
        .route(
            &format!("{}/videos/{{media_id}}/thumbnail", API_PREFIX),
            put(handlers::thumbnail_upload::upload_thumbnail)
                .post(handlers::thumbnail_upload::upload_thumbnail),
        )
}
